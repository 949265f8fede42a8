use anyhow::Result;

/// Taps, the ticker and signal handling all share one thread, so nothing in the tracker needs
/// to be `Send`.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
