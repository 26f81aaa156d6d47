use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock instant recorded in commit signatures.
///
/// Milliseconds since the UNIX epoch. Ordering is numeric; history walks use
/// it to sort commits newest-first and to break merge-base ties.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub unix_ms: u64,
}

impl Timestamp {
    pub const fn from_millis(unix_ms: u64) -> Self {
        Self { unix_ms }
    }

    /// Current wall-clock time. A clock set before the epoch reads as zero.
    pub fn now() -> Self {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self { unix_ms }
    }

    pub const fn zero() -> Self {
        Self { unix_ms: 0 }
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms)", self.unix_ms)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.unix_ms / 1000, self.unix_ms % 1000)
    }
}
