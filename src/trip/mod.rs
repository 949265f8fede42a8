//! Trip state machine. Everything here is a pure function of the commute kind and the number of
//! taps recorded for the current journey, so the phase can be re-derived at any moment from
//! persisted state.
//!
//! Tap counts are 1-indexed: starting a trip records the first tap automatically, so a trip that
//! is underway always has `tap_count >= 1`.

pub mod color;

use std::fmt::Display;

use clap::ValueEnum;
use tracing::warn;

use crate::utils::time::format_clock;

pub use color::{contrast_text_color, Color};

/// Shown instead of a duration when there is nothing to measure.
pub const NOT_AVAILABLE: &str = "N/A";

const MOTORCYCLE_PHASES: [Color; 3] = [Color::BLUE, Color::YELLOW, Color::RED];
const CYCLE_PHASES: [Color; 4] = [Color::YELLOW, Color::BLUE, Color::YELLOW, Color::RED];

const MOTORCYCLE_LEGS: [&str; 3] = [
    "Riding Started",
    "Riding Finished / Walking Started",
    "Walking Finished",
];
const CYCLE_LEGS: [&str; 4] = [
    "Walking Started",
    "Walking Finished / Riding Started",
    "Riding Finished / Walking Started",
    "Walking Finished",
];

/// The kind of commute. Fixed on the first tap of a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum CommuteKind {
    /// Journey has not started yet.
    #[default]
    #[value(skip)]
    None,
    Cycle,
    Motorcycle,
}

impl CommuteKind {
    /// Integer code used by the persisted layout.
    pub fn code(self) -> i64 {
        match self {
            CommuteKind::None => 0,
            CommuteKind::Cycle => 1,
            CommuteKind::Motorcycle => 2,
        }
    }

    /// Unknown codes are read as [CommuteKind::None], i.e. "not started".
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => CommuteKind::None,
            1 => CommuteKind::Cycle,
            2 => CommuteKind::Motorcycle,
            other => {
                warn!("Unknown commute code {other}, treating journey as not started");
                CommuteKind::None
            }
        }
    }

    /// Number of taps that complete a journey of this kind.
    pub fn completion_threshold(self) -> Option<usize> {
        match self {
            CommuteKind::None => None,
            CommuteKind::Cycle => Some(CYCLE_PHASES.len()),
            CommuteKind::Motorcycle => Some(MOTORCYCLE_PHASES.len()),
        }
    }

    /// Background colors of each phase, in tap order.
    pub fn phases(self) -> &'static [Color] {
        match self {
            CommuteKind::None => &[],
            CommuteKind::Cycle => &CYCLE_PHASES,
            CommuteKind::Motorcycle => &MOTORCYCLE_PHASES,
        }
    }

    /// Describes what each tap of this kind of journey marks.
    pub fn leg_labels(self) -> &'static [&'static str] {
        match self {
            CommuteKind::None => &[],
            CommuteKind::Cycle => &CYCLE_LEGS,
            CommuteKind::Motorcycle => &MOTORCYCLE_LEGS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CommuteKind::None => "Unknown",
            CommuteKind::Cycle => "Cycle",
            CommuteKind::Motorcycle => "Motorcycle",
        }
    }
}

impl Display for CommuteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Background color for a journey of `kind` after `tap_count` taps. Counts past the end of the
/// palette stay on its last color.
pub fn phase_color(kind: CommuteKind, tap_count: usize) -> Color {
    let phases = kind.phases();
    if tap_count == 0 || phases.is_empty() {
        return Color::DARK_GRAY;
    }
    phases[tap_count.min(phases.len()) - 1]
}

pub fn is_trip_complete(kind: CommuteKind, tap_count: usize) -> bool {
    kind.completion_threshold()
        .is_some_and(|threshold| tap_count >= threshold)
}

/// Whole seconds between `leg_start` and `now`, both in epoch milliseconds. Saturates for
/// timestamps too far apart to subtract.
pub fn elapsed_seconds(now: i64, leg_start: i64) -> i64 {
    now.saturating_sub(leg_start) / 1000
}

/// Time between the first and the last tap as `HH:MM:SS`. Hours wrap at a day, the same way
/// journey cards have always shown it.
pub fn total_duration(timestamps: &[i64]) -> String {
    let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
        return NOT_AVAILABLE.into();
    };
    let total_seconds = elapsed_seconds(*last, *first);
    format_clock(total_seconds % (24 * 3600))
}
