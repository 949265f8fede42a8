//! Encoding of a journey's taps: comma separated epoch milliseconds without leading or trailing
//! separators. A journey without taps is an empty string.

use tracing::warn;

pub fn encode_timestamps(timestamps: &[i64]) -> String {
    timestamps
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Decodes a stored timestamp list. Empty pieces are ignored and malformed ones are skipped, so a
/// damaged value never prevents a journey from loading.
pub fn decode_timestamps(encoded: &str) -> Vec<i64> {
    encoded
        .split(',')
        .filter(|v| !v.is_empty())
        .filter_map(|v| match v.trim().parse::<i64>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping malformed timestamp {v:?}: {e}");
                None
            }
        })
        .collect()
}
