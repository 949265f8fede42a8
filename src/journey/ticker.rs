use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::utils::clock::Clock;

use super::{
    controller::{TimerFrame, TripController},
    storage::kv_storage::KeyValueStore,
};

/// How often the timer screen is redrawn.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Anything able to show the timer screen.
#[cfg_attr(test, mockall::automock)]
pub trait TimerView {
    fn render(&mut self, frame: &TimerFrame) -> Result<()>;
}

/// Periodically redraws the timer screen from persisted state. It never writes to the store, so
/// it can run next to taps without coordination. A tap, from this process or another one, is
/// picked up on the next tick.
pub struct ElapsedTicker<K> {
    controller: Arc<TripController<K>>,
    view: Box<dyn TimerView>,
    shutdown: CancellationToken,
    tick_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl<K: KeyValueStore> ElapsedTicker<K> {
    pub fn new(
        controller: Arc<TripController<K>>,
        view: Box<dyn TimerView>,
        shutdown: CancellationToken,
        tick_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            controller,
            view,
            shutdown,
            tick_interval,
            time_provider,
        }
    }

    /// Executes the refresh loop until the owning screen cancels it.
    pub async fn run(mut self) -> Result<()> {
        let mut tick_point = self.time_provider.instant();
        loop {
            tick_point += self.tick_interval;

            if let Err(e) = self.controller.refresh().await {
                error!("Failed to reload journeys {:?}", e)
            }
            let frame = self
                .controller
                .timer_frame(self.time_provider.epoch_millis());
            if let Err(e) = self.view.render(&frame) {
                error!("Failed to render timer {:?}", e)
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Timer screen closed, ticker stopped");
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(tick_point) => ()
            }
        }
    }
}
