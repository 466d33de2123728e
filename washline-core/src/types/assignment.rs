use serde::{Deserialize, Serialize};

use super::{minutes_to_ms, MachineId, Timestamp};

/// A pending demand for a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Caller-chosen identifier (e.g. a user name)
    pub requester_id: String,
    /// Requested exclusive-use length in minutes
    pub duration_minutes: u32,
    /// When the request was submitted
    pub arrived_at: Timestamp,
}

impl Request {
    pub fn new(requester_id: impl Into<String>, duration_minutes: u32, now: Timestamp) -> Self {
        Self {
            requester_id: requester_id.into(),
            duration_minutes,
            arrived_at: now,
        }
    }
}

/// A request bound to a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub requester_id: String,
    pub duration_minutes: u32,
    pub arrived_at: Timestamp,
    /// The machine holding this assignment
    pub machine_id: MachineId,
    /// When the machine was handed over
    pub assigned_at: Timestamp,
}

impl Assignment {
    pub fn new(request: Request, machine_id: MachineId, now: Timestamp) -> Self {
        Self {
            requester_id: request.requester_id,
            duration_minutes: request.duration_minutes,
            arrived_at: request.arrived_at,
            machine_id,
            assigned_at: now,
        }
    }

    /// Instant at which the usage period ends (assignedAt + duration).
    /// Saturates at the end of time rather than wrapping.
    pub fn due_at(&self) -> Timestamp {
        self.assigned_at
            .saturating_add(minutes_to_ms(self.duration_minutes))
    }

    /// An assignment is expired only once `now` is strictly past its due time.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.due_at() < now
    }
}

/// One machine and its current occupant, as reported by status queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub machine_id: MachineId,
    pub assignment: Option<Assignment>,
}
