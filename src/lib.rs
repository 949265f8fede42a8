//! Tap-driven tracker for multi-leg commutes. Every tap marks a leg boundary, the current phase
//! is shown as a color, and finished journeys are kept in a small key-value store next to the
//! logs.
//!

pub mod cli;
pub mod fs;
pub mod journey;
pub mod trip;
pub mod utils;
