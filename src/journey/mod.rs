//! Journeys and everything needed to record them.
//!
//! - [storage] persists journeys as flat key-value pairs.
//! - [controller::TripController] is what a front-end talks to.
//! - [ticker::ElapsedTicker] refreshes the timer screen while a trip is underway.

pub mod controller;
pub mod display;
pub mod storage;
pub mod ticker;

use std::fmt::Display;

use crate::trip::{self, CommuteKind};

/// Identifies one commute attempt. Ids increase by one per completed journey and are never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct JourneyId(pub u64);

impl JourneyId {
    pub fn next(self) -> Self {
        JourneyId(self.0 + 1)
    }

    /// Id of the journey sealed right before this one.
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).map(JourneyId)
    }
}

impl Display for JourneyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One completed or in-progress commute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub id: JourneyId,
    pub commute_kind: CommuteKind,
    /// Epoch milliseconds of every tap, in tap order.
    pub timestamps: Vec<i64>,
}

impl Journey {
    pub fn tap_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_complete(&self) -> bool {
        trip::is_trip_complete(self.commute_kind, self.tap_count())
    }

    /// A journey that has started but hasn't reached its final tap. Journeys without a known
    /// commute kind can't be continued and never count as in progress.
    pub fn is_in_progress(&self) -> bool {
        self.commute_kind
            .completion_threshold()
            .is_some_and(|threshold| (1..threshold).contains(&self.tap_count()))
    }

    pub fn total_duration(&self) -> String {
        trip::total_duration(&self.timestamps)
    }
}
