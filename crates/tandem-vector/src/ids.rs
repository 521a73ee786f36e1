//! ID assignment strategies.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// How IDs are produced for a new batch of vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum IdStrategy {
    /// Sequential numbers starting at the store's current vector count.
    ///
    /// Reads the count and writes later without a lock, so concurrent
    /// batches may receive identical IDs.
    #[default]
    VectorCount,
    /// Sequential numbers reserved atomically by the backend.
    Reserved,
    /// A time-ordered UUIDv7 per vector.
    Uuid,
}

/// Returns `count` decimal IDs starting at `start`.
pub(crate) fn sequential_ids(start: u64, count: usize) -> Vec<String> {
    (start..start + count as u64).map(|id| id.to_string()).collect()
}

/// Returns `count` fresh UUIDv7 IDs.
pub(crate) fn uuid_ids(count: usize) -> Vec<String> {
    (0..count).map(|_| Uuid::now_v7().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn sequential_ids_are_strictly_increasing() {
        let ids = sequential_ids(42, 3);
        assert_eq!(ids, ["42", "43", "44"]);
        assert!(sequential_ids(7, 0).is_empty());
    }

    #[test]
    fn strategy_parses_kebab_case() {
        assert_eq!(
            IdStrategy::from_str("vector-count").unwrap(),
            IdStrategy::VectorCount
        );
        assert_eq!(IdStrategy::Reserved.to_string(), "reserved");
        assert_eq!(IdStrategy::default(), IdStrategy::VectorCount);
    }
}
