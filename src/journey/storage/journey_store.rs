use std::cmp::Ordering;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::{
    journey::{Journey, JourneyId},
    trip::CommuteKind,
};

use super::{
    key::StoreKey,
    kv_storage::{KeyValueStore, StoredValue},
    timestamps::{decode_timestamps, encode_timestamps},
};

/// Journey operations composed on top of a [KeyValueStore].
pub struct JourneyStore<K> {
    storage: K,
}

impl<K: KeyValueStore> JourneyStore<K> {
    pub fn new(storage: K) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    /// Reloads state written by other processes sharing the storage.
    pub async fn refresh(&self) -> Result<()> {
        self.storage.refresh().await
    }

    /// Id of the journey that taps are currently recorded into.
    pub fn current_id(&self) -> JourneyId {
        let raw = self.storage.read_int(&StoreKey::CurrentId, 0);
        u64::try_from(raw).map(JourneyId).unwrap_or_else(|_| {
            warn!("Stored journey id {raw} is negative, starting from 0");
            JourneyId::default()
        })
    }

    pub fn commute_kind(&self, id: JourneyId) -> CommuteKind {
        CommuteKind::from_code(
            self.storage
                .read_int(&StoreKey::commute(id), CommuteKind::None.code()),
        )
    }

    pub fn timestamps(&self, id: JourneyId) -> Vec<i64> {
        decode_timestamps(&self.storage.read_text(&StoreKey::timestamps(id), ""))
    }

    pub fn load_journey(&self, id: JourneyId) -> Journey {
        Journey {
            id,
            commute_kind: self.commute_kind(id),
            timestamps: self.timestamps(id),
        }
    }

    /// Records a tap at `now` for `journey_id`. The commute kind is only written while the journey
    /// doesn't have one yet, so the kind of the first tap sticks.
    pub async fn append_timestamp(
        &self,
        journey_id: JourneyId,
        kind: CommuteKind,
        now: i64,
    ) -> Result<()> {
        if kind != CommuteKind::None && self.commute_kind(journey_id) == CommuteKind::None {
            self.storage
                .put(&StoreKey::commute(journey_id), StoredValue::Int(kind.code()))
                .await?;
        }

        let mut timestamps = self.timestamps(journey_id);
        timestamps.push(now);
        self.storage
            .put(
                &StoreKey::timestamps(journey_id),
                StoredValue::Text(encode_timestamps(&timestamps)),
            )
            .await?;

        debug!(
            "Journey {journey_id} now has {} timestamps",
            timestamps.len()
        );
        Ok(())
    }

    /// Seals `journey_id` and makes the following id active. Returns the id that is active
    /// afterwards.
    ///
    /// Sealing a journey that is already sealed leaves the counter untouched, so the counter
    /// advances exactly once per journey.
    pub async fn finalize_and_advance(&self, journey_id: JourneyId) -> Result<JourneyId> {
        let current = self.current_id();
        match journey_id.cmp(&current) {
            Ordering::Equal => {
                let next = current.next();
                self.storage
                    .put(&StoreKey::CurrentId, StoredValue::Int(i64::try_from(next.0)?))
                    .await?;
                info!("Journey {journey_id} sealed, journey {next} is active");
                Ok(next)
            }
            Ordering::Less => {
                warn!("Journey {journey_id} was already sealed, journey {current} stays active");
                Ok(current)
            }
            Ordering::Greater => {
                bail!("Journey {journey_id} can't be sealed while journey {current} is active")
            }
        }
    }

    /// All sealed journeys, most recent first.
    pub fn list_journeys(&self) -> Vec<Journey> {
        let current = self.current_id();
        (0..current.0)
            .rev()
            .map(|id| self.load_journey(JourneyId(id)))
            .collect()
    }

    /// Finds the trip that should be continued instead of starting a new one.
    ///
    /// That is the active journey when it has started but isn't complete. Failing that, the last
    /// sealed journey if it was sealed before reaching its final tap, which happens when the
    /// process dies mid-trip.
    pub fn resume_state(&self) -> Option<(CommuteKind, JourneyId)> {
        let current = self.current_id();
        if let Some(state) = self.in_progress(current) {
            return Some(state);
        }

        let previous = current.previous()?;
        let state = self.in_progress(previous)?;
        debug!("Journey {previous} was sealed before its final tap");
        Some(state)
    }

    fn in_progress(&self, id: JourneyId) -> Option<(CommuteKind, JourneyId)> {
        let journey = self.load_journey(id);
        journey
            .is_in_progress()
            .then_some((journey.commute_kind, id))
    }
}
