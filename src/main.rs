use anyhow::Result;
use journeytrack::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    });
    // A stdin read may still be parked on the blocking pool.
    runtime.shutdown_background();
    result
}
