use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable 32-byte identity of any actor on the ledger: airlines, passengers,
/// oracles and the contract operator. The ledger never interprets the bytes;
/// callers are expected to bring their own key-management scheme.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId([u8; 32]);

impl ActorId {
    pub fn new(bytes: [u8; 32]) -> Self {
        ActorId(bytes)
    }

    /// Derive an identity from an arbitrary seed string. Used by tests and
    /// the demo binary to get reproducible actors.
    pub fn from_seed(seed: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        ActorId(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Truncated hex form for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_hex())
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.short_hex())
    }
}
