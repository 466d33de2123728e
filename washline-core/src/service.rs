use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::completed::CompletedSet;
use crate::config::PoolConfig;
use crate::error::AllocationError;
use crate::pool::ResourcePool;
use crate::types::{minutes_to_ms, Assignment, MachineId, Request, SlotView, Timestamp};
use crate::wait_list::WaitList;

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// A machine was free and is now held by the requester.
    Assigned {
        machine_id: MachineId,
        duration_minutes: u32,
        assigned_at: Timestamp,
    },
    /// Every machine was busy. The estimate is only present when this request
    /// was the first to join an empty queue.
    Queued { estimated_wait_minutes: Option<u32> },
}

/// Advisory wait reported for the head of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitEstimate {
    pub waiting_minutes: u32,
    pub available_at: Timestamp,
}

impl WaitEstimate {
    fn at(now: Timestamp, waiting_minutes: u32) -> Self {
        Self {
            waiting_minutes,
            available_at: now.saturating_add(minutes_to_ms(waiting_minutes)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// 1-based position in the wait-list
    pub position: usize,
    pub request: Request,
    /// Only set for the head of the queue
    pub estimate: Option<WaitEstimate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatusView {
    pub machines: Vec<SlotView>,
    pub queue: Vec<QueueEntry>,
}

/// Where a requester currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequesterStatus {
    Assigned {
        assignment: Assignment,
    },
    Queued {
        position: usize,
        request: Request,
        estimate: Option<WaitEstimate>,
    },
    Completed {
        requester_id: String,
    },
    Unknown {
        requester_id: String,
    },
}

/// Owns the pool, the wait-list and the completion record. Every entry point
/// reconciles against `now` before doing anything else.
#[derive(Debug, Clone)]
pub struct AllocationService {
    pool: ResourcePool,
    wait_list: WaitList,
    completed: CompletedSet,
}

impl AllocationService {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            pool: ResourcePool::new(config.machines),
            wait_list: WaitList::new(),
            completed: CompletedSet::with_capacity_limit(config.completed_capacity),
        }
    }

    /// Expire due assignments, promote waiting requesters, and record the
    /// expired ids as completed. Returns the ids that expired.
    pub fn reconcile(&mut self, now: Timestamp) -> Vec<String> {
        let expired = self.pool.reconcile(now, &mut self.wait_list);
        if !expired.is_empty() {
            debug!(count = expired.len(), "Reconciliation reclaimed machines");
            self.completed.extend(expired.iter().cloned());
        }
        expired
    }

    /// Assign a free machine or join the wait-list.
    pub fn submit(
        &mut self,
        requester_id: &str,
        duration_minutes: u32,
        now: Timestamp,
    ) -> Result<SubmitOutcome, AllocationError> {
        if requester_id.is_empty() {
            return Err(AllocationError::EmptyRequesterId);
        }
        if duration_minutes == 0 {
            return Err(AllocationError::ZeroDuration);
        }

        self.reconcile(now);

        if self.pool.find(requester_id).is_some()
            || self.wait_list.position_of(requester_id).is_some()
        {
            return Err(AllocationError::AlreadyActive {
                requester_id: requester_id.to_string(),
            });
        }

        let request = Request::new(requester_id, duration_minutes, now);
        if let Some(machine_id) = self.pool.try_assign_immediately(request.clone(), now) {
            info!(
                requester_id,
                machine_id = %machine_id,
                duration_minutes,
                "Machine assigned"
            );
            return Ok(SubmitOutcome::Assigned {
                machine_id,
                duration_minutes,
                assigned_at: now,
            });
        }

        // Estimated from the pool as it stood before this request joined.
        let estimate = self
            .wait_list
            .is_empty()
            .then(|| self.pool.estimated_wait_minutes());
        self.wait_list.enqueue(request);
        info!(
            requester_id,
            position = self.wait_list.len(),
            "All machines busy, request queued"
        );

        Ok(SubmitOutcome::Queued {
            estimated_wait_minutes: estimate,
        })
    }

    /// Full machine occupancy plus the ordered wait-list. Only the head of
    /// the queue carries a wait estimate.
    pub fn pool_status(&mut self, now: Timestamp) -> PoolStatusView {
        self.reconcile(now);

        let estimate = self.head_estimate(now);
        let queue = self
            .wait_list
            .iter()
            .enumerate()
            .map(|(i, request)| QueueEntry {
                position: i + 1,
                request: request.clone(),
                estimate: if i == 0 { estimate } else { None },
            })
            .collect();

        PoolStatusView {
            machines: self.pool.snapshot(),
            queue,
        }
    }

    /// Looks the requester up in machines, then the wait-list, then the
    /// completion record. First match wins.
    pub fn requester_status(&mut self, requester_id: &str, now: Timestamp) -> RequesterStatus {
        self.reconcile(now);

        if let Some(assignment) = self.pool.find(requester_id) {
            return RequesterStatus::Assigned {
                assignment: assignment.clone(),
            };
        }

        if let Some(position) = self.wait_list.position_of(requester_id) {
            if let Some(request) = self.wait_list.iter().nth(position - 1) {
                let estimate = if position == 1 {
                    self.head_estimate(now)
                } else {
                    None
                };
                return RequesterStatus::Queued {
                    position,
                    request: request.clone(),
                    estimate,
                };
            }
        }

        if self.completed.contains(requester_id) {
            return RequesterStatus::Completed {
                requester_id: requester_id.to_string(),
            };
        }

        RequesterStatus::Unknown {
            requester_id: requester_id.to_string(),
        }
    }

    fn head_estimate(&self, now: Timestamp) -> Option<WaitEstimate> {
        self.wait_list
            .peek_head()
            .map(|_| WaitEstimate::at(now, self.pool.estimated_wait_minutes()))
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn queued_count(&self) -> usize {
        self.wait_list.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}
