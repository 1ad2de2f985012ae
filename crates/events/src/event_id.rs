// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    fmt,
    hash::{DefaultHasher, Hash, Hasher},
};

/// Content address of an event. Two events with the same kind and payload share an id, which is
/// what the bus deduplicates on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

impl EventId {
    /// Id for a payload of the given event kind. The kind is mixed in so that two variants
    /// carrying equal payloads never collide.
    pub fn of<T: Hash>(kind: &str, payload: &T) -> Self {
        let mut std_hasher = DefaultHasher::new();
        payload.hash(&mut std_hasher);
        let digest = Sha256::new()
            .chain_update(kind.as_bytes())
            .chain_update(std_hasher.finish().to_le_bytes())
            .finalize();
        EventId(digest.into())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bs58::encode(&self.0).into_string();
        write!(f, "evt:{}", &encoded[..encoded.len().min(8)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_separates_equal_payloads() {
        assert_eq!(EventId::of("A", &7u64), EventId::of("A", &7u64));
        assert_ne!(EventId::of("A", &7u64), EventId::of("B", &7u64));
    }

    #[test]
    fn display_is_short() {
        let shown = EventId::of("A", &1u8).to_string();
        assert!(shown.starts_with("evt:"));
        assert_eq!(shown.len(), 12);
    }
}
