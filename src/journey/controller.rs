use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::{
    trip::{contrast_text_color, elapsed_seconds, is_trip_complete, phase_color, Color, CommuteKind},
    utils::time::format_clock,
};

use super::{
    display::DisplayJourney,
    storage::{journey_store::JourneyStore, kv_storage::KeyValueStore},
    Journey, JourneyId,
};

/// A trip that is underway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTrip {
    pub journey_id: JourneyId,
    pub kind: CommuteKind,
    pub tap_count: usize,
    /// Epoch milliseconds of the latest tap, where the current leg started.
    pub leg_start: i64,
}

impl ActiveTrip {
    pub fn color(&self) -> Color {
        phase_color(self.kind, self.tap_count)
    }
}

/// What happened after a tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// Trip goes on with a new phase shown in the given color.
    Continue(Color),
    /// The tap was the final one. Holds the sealed journey.
    Complete(Journey),
}

/// Everything the timer screen draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFrame {
    pub elapsed: String,
    pub background: Color,
    pub text: Color,
}

/// Operations a front-end performs. All state is re-read from the store on every call, so any
/// number of screens can share one controller.
pub struct TripController<K> {
    store: JourneyStore<K>,
}

impl<K: KeyValueStore> TripController<K> {
    pub fn new(store: JourneyStore<K>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &JourneyStore<K> {
        &self.store
    }

    /// Reloads journeys so taps recorded by another process are taken into account.
    pub async fn refresh(&self) -> Result<()> {
        self.store.refresh().await
    }

    /// The trip that taps currently go to, if any.
    pub fn active_trip(&self) -> Option<ActiveTrip> {
        let (kind, journey_id) = self.store.resume_state()?;
        let timestamps = self.store.timestamps(journey_id);
        Some(ActiveTrip {
            journey_id,
            kind,
            tap_count: timestamps.len(),
            leg_start: *timestamps.last()?,
        })
    }

    /// Continues the trip in progress or starts a new one of `requested` kind. Starting records
    /// the first tap right away. A resumed trip keeps its own kind whatever was requested.
    pub async fn start_or_resume_trip(&self, requested: CommuteKind, now: i64) -> Result<ActiveTrip> {
        self.store.refresh().await?;
        if let Some(trip) = self.active_trip() {
            info!(
                "Resuming {} journey {} after {} taps",
                trip.kind, trip.journey_id, trip.tap_count
            );
            return Ok(trip);
        }

        if requested == CommuteKind::None {
            bail!("No trip is in progress, a commute kind is needed to start one");
        }

        let journey_id = self.seal_stale_journey().await?;
        self.store
            .append_timestamp(journey_id, requested, now)
            .await?;
        info!("Started {requested} journey {journey_id}");

        let journey = self.store.load_journey(journey_id);
        Ok(ActiveTrip {
            journey_id,
            kind: journey.commute_kind,
            tap_count: journey.tap_count(),
            leg_start: journey.timestamps.last().copied().unwrap_or(now),
        })
    }

    /// Marks a leg boundary at `now`. Without a trip in progress the tap starts one of `kind`.
    pub async fn record_tap(&self, kind: CommuteKind, now: i64) -> Result<TapOutcome> {
        self.store.refresh().await?;
        let Some(trip) = self.active_trip() else {
            let trip = self.start_or_resume_trip(kind, now).await?;
            return Ok(TapOutcome::Continue(trip.color()));
        };

        if kind != CommuteKind::None && kind != trip.kind {
            debug!(
                "Tap for {kind} goes to the {} journey in progress",
                trip.kind
            );
        }

        let tap_count = trip.tap_count + 1;
        self.store
            .append_timestamp(trip.journey_id, trip.kind, now)
            .await?;

        if is_trip_complete(trip.kind, tap_count) {
            self.store.finalize_and_advance(trip.journey_id).await?;
            let journey = self.store.load_journey(trip.journey_id);
            info!(
                "Journey {} complete in {}",
                journey.id,
                journey.total_duration()
            );
            Ok(TapOutcome::Complete(journey))
        } else {
            debug!("Journey {} is at tap {tap_count}", trip.journey_id);
            Ok(TapOutcome::Continue(phase_color(trip.kind, tap_count)))
        }
    }

    /// Time spent in the current leg as `HH:MM:SS`.
    pub fn elapsed_display(&self, now: i64) -> String {
        let leg_start = self.active_trip().map_or(now, |trip| trip.leg_start);
        format_clock(elapsed_seconds(now, leg_start))
    }

    pub fn timer_frame(&self, now: i64) -> TimerFrame {
        let (background, leg_start) = match self.active_trip() {
            Some(trip) => (trip.color(), trip.leg_start),
            None => (phase_color(CommuteKind::None, 0), now),
        };
        TimerFrame {
            elapsed: format_clock(elapsed_seconds(now, leg_start)),
            background,
            text: contrast_text_color(background),
        }
    }

    /// Sealed journeys ready for display, most recent first.
    pub fn journey_list(&self) -> Vec<DisplayJourney> {
        self.store
            .list_journeys()
            .iter()
            .map(DisplayJourney::from_journey)
            .collect()
    }

    /// Seals the current journey if it holds taps but can't be continued. That is a journey with
    /// its final tap left behind when the process stops before sealing, or one whose commute kind
    /// was lost. Returns the id a new trip should use.
    async fn seal_stale_journey(&self) -> Result<JourneyId> {
        let current = self.store.load_journey(self.store.current_id());
        if current.tap_count() == 0 {
            return Ok(current.id);
        }
        if current.is_complete() {
            warn!("Journey {} was complete but never sealed", current.id);
        } else {
            warn!(
                "Journey {} has {} taps but no usable commute kind",
                current.id,
                current.tap_count()
            );
        }
        self.store.finalize_and_advance(current.id).await
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        journey::{
            storage::{
                journey_store::JourneyStore,
                key::StoreKey,
                kv_storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoredValue},
            },
            Journey, JourneyId,
        },
        trip::{Color, CommuteKind},
        utils::logging::TEST_LOGGING,
    };

    use super::{ActiveTrip, TapOutcome, TimerFrame, TripController};

    fn controller(kv: &MemoryKeyValueStore) -> TripController<&MemoryKeyValueStore> {
        TripController::new(JourneyStore::new(kv))
    }

    #[tokio::test]
    async fn test_motorcycle_journey() -> Result<()> {
        *TEST_LOGGING;
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);

        let outcome = controller.record_tap(CommuteKind::Motorcycle, 0).await?;
        assert_eq!(outcome, TapOutcome::Continue(Color::BLUE));
        assert_eq!(kv.read_int(&StoreKey::commute(JourneyId(0)), 0), 2);
        assert_eq!(kv.read_text(&StoreKey::timestamps(JourneyId(0)), ""), "0");

        let outcome = controller.record_tap(CommuteKind::Motorcycle, 2000).await?;
        assert_eq!(outcome, TapOutcome::Continue(Color::YELLOW));
        assert_eq!(
            kv.read_text(&StoreKey::timestamps(JourneyId(0)), ""),
            "0,2000"
        );

        let outcome = controller.record_tap(CommuteKind::Motorcycle, 5000).await?;
        let expected = Journey {
            id: JourneyId(0),
            commute_kind: CommuteKind::Motorcycle,
            timestamps: vec![0, 2000, 5000],
        };
        assert_eq!(outcome, TapOutcome::Complete(expected.clone()));
        assert_eq!(
            kv.read_text(&StoreKey::timestamps(JourneyId(0)), ""),
            "0,2000,5000"
        );
        assert_eq!(controller.store().current_id(), JourneyId(1));
        assert_eq!(controller.store().list_journeys(), vec![expected]);
        assert_eq!(controller.active_trip(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_cycle_needs_four_taps() -> Result<()> {
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);

        let colors = [Color::YELLOW, Color::BLUE, Color::YELLOW];
        for (index, color) in colors.into_iter().enumerate() {
            let outcome = controller
                .record_tap(CommuteKind::Cycle, index as i64 * 1000)
                .await?;
            assert_eq!(outcome, TapOutcome::Continue(color));
            assert_eq!(
                controller.store().resume_state(),
                Some((CommuteKind::Cycle, JourneyId(0)))
            );
        }

        let outcome = controller.record_tap(CommuteKind::Cycle, 3000).await?;
        assert!(matches!(outcome, TapOutcome::Complete(journey) if journey.tap_count() == 4));
        assert_eq!(controller.store().resume_state(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_start_records_first_tap() -> Result<()> {
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);

        let trip = controller
            .start_or_resume_trip(CommuteKind::Cycle, 1000)
            .await?;

        assert_eq!(
            trip,
            ActiveTrip {
                journey_id: JourneyId(0),
                kind: CommuteKind::Cycle,
                tap_count: 1,
                leg_start: 1000,
            }
        );
        assert_eq!(controller.active_trip(), Some(trip));
        Ok(())
    }

    #[tokio::test]
    async fn test_resume_keeps_stored_kind() -> Result<()> {
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);
        controller
            .start_or_resume_trip(CommuteKind::Motorcycle, 0)
            .await?;
        controller.record_tap(CommuteKind::Motorcycle, 500).await?;

        let trip = controller
            .start_or_resume_trip(CommuteKind::Cycle, 900)
            .await?;

        assert_eq!(trip.kind, CommuteKind::Motorcycle);
        assert_eq!(trip.tap_count, 2);
        assert_eq!(trip.leg_start, 500);
        assert_eq!(controller.store().timestamps(JourneyId(0)), vec![0, 500]);

        let outcome = controller.record_tap(CommuteKind::Cycle, 1000).await?;
        assert!(matches!(outcome, TapOutcome::Complete(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_without_kind_fails() -> Result<()> {
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);

        assert!(controller
            .start_or_resume_trip(CommuteKind::None, 0)
            .await
            .is_err());
        assert!(controller.record_tap(CommuteKind::None, 0).await.is_err());
        assert_eq!(kv.get(&StoreKey::timestamps(JourneyId(0))), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_unsealed_complete_journey_is_sealed_on_start() -> Result<()> {
        *TEST_LOGGING;
        let kv = MemoryKeyValueStore::new();
        kv.put(&StoreKey::commute(JourneyId(0)), StoredValue::Int(2))
            .await?;
        kv.put(
            &StoreKey::timestamps(JourneyId(0)),
            StoredValue::Text("0,1000,2000".into()),
        )
        .await?;
        let controller = controller(&kv);

        let trip = controller
            .start_or_resume_trip(CommuteKind::Cycle, 10_000)
            .await?;

        assert_eq!(trip.journey_id, JourneyId(1));
        assert_eq!(controller.store().current_id(), JourneyId(1));
        assert_eq!(controller.store().list_journeys().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_journey_with_lost_kind_is_sealed_on_start() -> Result<()> {
        *TEST_LOGGING;
        let kv = MemoryKeyValueStore::new();
        kv.put(&StoreKey::commute(JourneyId(0)), StoredValue::Int(9))
            .await?;
        kv.put(
            &StoreKey::timestamps(JourneyId(0)),
            StoredValue::Text("0,1000".into()),
        )
        .await?;
        let controller = controller(&kv);

        let trip = controller
            .start_or_resume_trip(CommuteKind::Motorcycle, 5000)
            .await?;

        assert_eq!(
            trip,
            ActiveTrip {
                journey_id: JourneyId(1),
                kind: CommuteKind::Motorcycle,
                tap_count: 1,
                leg_start: 5000,
            }
        );
        assert_eq!(controller.active_trip(), Some(trip));
        assert_eq!(controller.store().timestamps(JourneyId(0)), vec![0, 1000]);

        let outcome = controller.record_tap(CommuteKind::Motorcycle, 6000).await?;
        assert_eq!(outcome, TapOutcome::Continue(Color::YELLOW));
        Ok(())
    }

    #[tokio::test]
    async fn test_taps_from_another_process() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("journeys.json");
        let ride = TripController::new(JourneyStore::new(
            FileKeyValueStore::open(path.clone()).await?,
        ));
        let tap = TripController::new(JourneyStore::new(FileKeyValueStore::open(path).await?));

        ride.start_or_resume_trip(CommuteKind::Motorcycle, 0).await?;
        let outcome = tap.record_tap(CommuteKind::Motorcycle, 1000).await?;
        assert_eq!(outcome, TapOutcome::Continue(Color::YELLOW));

        ride.refresh().await?;
        assert_eq!(ride.timer_frame(1000).background, Color::YELLOW);

        let outcome = ride.record_tap(CommuteKind::Motorcycle, 2000).await?;
        assert_eq!(
            outcome,
            TapOutcome::Complete(Journey {
                id: JourneyId(0),
                commute_kind: CommuteKind::Motorcycle,
                timestamps: vec![0, 1000, 2000],
            })
        );
        tap.refresh().await?;
        assert_eq!(tap.active_trip(), None);
        assert_eq!(tap.store().current_id(), JourneyId(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_finishing_a_journey_sealed_too_early() -> Result<()> {
        *TEST_LOGGING;
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);
        controller.record_tap(CommuteKind::Motorcycle, 0).await?;
        controller.store().finalize_and_advance(JourneyId(0)).await?;

        let trip = controller
            .start_or_resume_trip(CommuteKind::Cycle, 100)
            .await?;
        assert_eq!(trip.journey_id, JourneyId(0));

        controller.record_tap(CommuteKind::Motorcycle, 200).await?;
        let outcome = controller.record_tap(CommuteKind::Motorcycle, 300).await?;

        assert!(matches!(outcome, TapOutcome::Complete(journey) if journey.id == JourneyId(0)));
        assert_eq!(controller.store().current_id(), JourneyId(1));
        assert_eq!(controller.active_trip(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_elapsed_display() -> Result<()> {
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);

        assert_eq!(controller.elapsed_display(50_000), "00:00:00");

        controller.record_tap(CommuteKind::Cycle, 1_000).await?;
        assert_eq!(controller.elapsed_display(62_999), "00:01:01");

        controller.record_tap(CommuteKind::Cycle, 70_000).await?;
        assert_eq!(controller.elapsed_display(70_500), "00:00:00");
        assert_eq!(controller.elapsed_display(3_670_000), "01:00:00");
        Ok(())
    }

    #[tokio::test]
    async fn test_timer_frame() -> Result<()> {
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);

        assert_eq!(
            controller.timer_frame(0),
            TimerFrame {
                elapsed: "00:00:00".into(),
                background: Color::DARK_GRAY,
                text: Color::WHITE,
            }
        );

        controller.record_tap(CommuteKind::Cycle, 0).await?;
        assert_eq!(
            controller.timer_frame(5_000),
            TimerFrame {
                elapsed: "00:00:05".into(),
                background: Color::YELLOW,
                text: Color::BLACK,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_journey_list() -> Result<()> {
        let kv = MemoryKeyValueStore::new();
        let controller = controller(&kv);
        for timestamp in [0, 1000, 2000] {
            controller
                .record_tap(CommuteKind::Motorcycle, timestamp)
                .await?;
        }
        controller.record_tap(CommuteKind::Cycle, 5000).await?;

        let journeys = controller.journey_list();

        assert_eq!(journeys.len(), 1);
        assert_eq!(journeys[0].kind, CommuteKind::Motorcycle);
        assert_eq!(journeys[0].legs.len(), 3);
        assert_eq!(journeys[0].total_duration, "00:00:02");
        Ok(())
    }

    #[tokio::test]
    async fn test_trip_survives_restart() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("journeys.json");

        {
            let store = FileKeyValueStore::open(path.clone()).await?;
            let controller = TripController::new(JourneyStore::new(store));
            controller
                .start_or_resume_trip(CommuteKind::Cycle, 0)
                .await?;
            controller.record_tap(CommuteKind::Cycle, 1000).await?;
        }

        let store = FileKeyValueStore::open(path).await?;
        let controller = TripController::new(JourneyStore::new(store));

        assert_eq!(
            controller.store().resume_state(),
            Some((CommuteKind::Cycle, JourneyId(0)))
        );
        let trip = controller
            .start_or_resume_trip(CommuteKind::Motorcycle, 2000)
            .await?;
        assert_eq!(trip.tap_count, 2);
        assert_eq!(trip.color(), Color::BLUE);
        Ok(())
    }
}
