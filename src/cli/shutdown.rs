use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels `cancelation` on Ctrl-C. Returns as soon as the token is cancelled for any reason, so
/// it never outlives the screen it guards.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::detect_shutdown;

    #[tokio::test]
    async fn test_returns_once_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        detect_shutdown(token).await;
    }
}
