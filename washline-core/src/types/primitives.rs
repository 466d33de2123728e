use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Milliseconds in one minute.
pub const MINUTE_MS: u64 = 60_000;

/// Converts a whole-minute duration to milliseconds.
pub fn minutes_to_ms(minutes: u32) -> u64 {
    u64::from(minutes) * MINUTE_MS
}

/// Stable 1-based index of a machine in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(pub usize);

impl MachineId {
    pub fn from_index(index: usize) -> Self {
        MachineId(index + 1)
    }
}

impl std::fmt::Display for MachineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
