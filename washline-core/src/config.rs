//! Pool configuration.

/// Machine count used when none is configured.
pub const DEFAULT_MACHINES: usize = 10;

/// Deployment-time settings for an allocator. The machine count cannot be
/// changed once the allocator is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of interchangeable machines (N).
    pub machines: usize,
    /// Maximum number of completed requester ids remembered. `None` keeps all.
    pub completed_capacity: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            machines: DEFAULT_MACHINES,
            completed_capacity: None,
        }
    }
}

impl PoolConfig {
    pub fn new(machines: usize) -> Self {
        Self {
            machines,
            ..Self::default()
        }
    }

    pub fn with_completed_capacity(mut self, capacity: usize) -> Self {
        self.completed_capacity = Some(capacity);
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.machines == 0 {
            return Err("machines must be greater than 0".into());
        }
        if self.completed_capacity == Some(0) {
            return Err("completed_capacity must be greater than 0 when set".into());
        }
        Ok(())
    }
}
