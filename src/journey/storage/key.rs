use std::fmt::Display;

use crate::journey::JourneyId;

/// Field of a single journey stored under its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JourneyField {
    Commute,
    Timestamps,
}

/// Typed address of a stored value. The [Display] output is the exact key written to storage:
/// `id`, `{id}_commute` and `{id}_timestamps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Id of the journey that is currently being recorded.
    CurrentId,
    Journey { id: JourneyId, field: JourneyField },
}

impl StoreKey {
    pub fn commute(id: JourneyId) -> Self {
        StoreKey::Journey {
            id,
            field: JourneyField::Commute,
        }
    }

    pub fn timestamps(id: JourneyId) -> Self {
        StoreKey::Journey {
            id,
            field: JourneyField::Timestamps,
        }
    }
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::CurrentId => write!(f, "id"),
            StoreKey::Journey {
                id,
                field: JourneyField::Commute,
            } => write!(f, "{id}_commute"),
            StoreKey::Journey {
                id,
                field: JourneyField::Timestamps,
            } => write!(f, "{id}_timestamps"),
        }
    }
}
