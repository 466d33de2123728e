//! High-level client that pairs the allocation service with a clock.
//! The HTTP server and the simulator both delegate to this.

use crate::clock::{Clock, SystemClock};
use crate::config::PoolConfig;
use crate::error::AllocationError;
use crate::service::{AllocationService, PoolStatusView, RequesterStatus, SubmitOutcome};
use crate::types::Timestamp;

/// The main entry point for the allocator. Each call reads the clock once and
/// uses that instant for the whole operation.
///
/// Not internally synchronized: callers sharing one client across tasks wrap
/// it in a single mutex so that reconcile-then-act never interleaves.
pub struct AllocationClient {
    service: AllocationService,
    clock: Box<dyn Clock + Send + Sync>,
}

impl AllocationClient {
    /// Create a client backed by the system clock.
    pub fn new(config: &PoolConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: &PoolConfig, clock: impl Clock + Send + Sync + 'static) -> Self {
        Self {
            service: AllocationService::new(config),
            clock: Box::new(clock),
        }
    }

    /// Submit a request, returning the outcome and the instant it was taken at.
    pub fn submit(
        &mut self,
        requester_id: &str,
        duration_minutes: u32,
    ) -> Result<(SubmitOutcome, Timestamp), AllocationError> {
        let now = self.clock.now();
        let outcome = self.service.submit(requester_id, duration_minutes, now)?;
        Ok((outcome, now))
    }

    pub fn pool_status(&mut self) -> (PoolStatusView, Timestamp) {
        let now = self.clock.now();
        (self.service.pool_status(now), now)
    }

    pub fn requester_status(&mut self, requester_id: &str) -> (RequesterStatus, Timestamp) {
        let now = self.clock.now();
        (self.service.requester_status(requester_id, now), now)
    }

    /// Reconcile without answering a query. Used by the background tick.
    pub fn reconcile(&mut self) -> Vec<String> {
        let now = self.clock.now();
        self.service.reconcile(now)
    }

    pub fn service(&self) -> &AllocationService {
        &self.service
    }
}

impl Default for AllocationClient {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}
