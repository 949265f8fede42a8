use std::fmt::Display;

use chrono::{Local, TimeZone};

use crate::{trip::CommuteKind, utils::time::format_timestamp_in};

use super::{Journey, JourneyId};

/// One labelled leg boundary of a journey card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegDisplay {
    pub label: String,
    /// Local time of the tap, or `N/A` when the tap never happened.
    pub time: String,
}

/// A journey prepared for the records screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayJourney {
    pub id: JourneyId,
    pub kind: CommuteKind,
    pub legs: Vec<LegDisplay>,
    pub total_duration: String,
}

impl DisplayJourney {
    pub fn from_journey(journey: &Journey) -> Self {
        Self::from_journey_in(journey, &Local)
    }

    /// Pairs every leg label of the journey's kind with the tap at the same position. Taps the
    /// kind has no label for are listed by number.
    pub fn from_journey_in<Tz: TimeZone>(journey: &Journey, zone: &Tz) -> Self
    where
        Tz::Offset: Display,
    {
        let labels = journey.commute_kind.leg_labels();
        let legs = (0..labels.len().max(journey.timestamps.len()))
            .map(|index| LegDisplay {
                label: labels
                    .get(index)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| format!("Tap {}", index + 1)),
                time: format_timestamp_in(journey.timestamps.get(index).copied(), zone),
            })
            .collect();

        Self {
            id: journey.id,
            kind: journey.commute_kind,
            legs,
            total_duration: journey.total_duration(),
        }
    }
}
