//!  Storage is organized through [journey_store::JourneyStore] on top of a
//!  [kv_storage::KeyValueStore].
//!  The basic idea is:
//!   - There is a flat map of keys to integers or strings.
//!   - `id` holds the journey currently being recorded.
//!   - Every journey keeps its commute kind and its comma separated taps under `{id}_commute` and
//!     `{id}_timestamps`.

pub mod journey_store;
pub mod key;
pub mod kv_storage;
pub mod timestamps;
