use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use washline_core::service::{PoolStatusView, RequesterStatus, SubmitOutcome, WaitEstimate};
use washline_core::types::{Assignment, Timestamp};

// ─── Time Formatting ────────────────────────────────────────────────────────

pub const UNDISPLAYABLE_TIME: &str = "--:--";

/// Renders instants as 12-hour clock strings ("04:05 PM") in a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct TimeFormatter {
    offset: FixedOffset,
}

impl TimeFormatter {
    pub fn new(utc_offset_minutes: i32) -> Result<Self, String> {
        utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                format!(
                    "Invalid UTC offset {} minutes. Must be within ±1439",
                    utc_offset_minutes
                )
            })
    }

    /// Instants outside chrono's range render as `--:--` and are logged.
    pub fn format(&self, ts: Timestamp) -> String {
        match i64::try_from(ts).ok().and_then(DateTime::from_timestamp_millis) {
            Some(dt) => dt.with_timezone(&self.offset).format("%I:%M %p").to_string(),
            None => {
                tracing::warn!(timestamp_ms = ts, "Instant outside the displayable range");
                UNDISPLAYABLE_TIME.to_string()
            }
        }
    }
}

// ─── Request Types ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AssignMachineRequest {
    pub user_name: String,
    /// Requested usage in minutes
    pub wash_time: u32,
}

impl AssignMachineRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_name.trim().is_empty() {
            return Err("user_name is required".to_string());
        }
        if self.wash_time == 0 {
            return Err("wash_time must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct UserStatusQuery {
    #[serde(default)]
    pub user_name: String,
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub machines: usize,
    pub active: usize,
    pub queued: usize,
    pub completed: usize,
}

#[derive(Debug, Serialize)]
pub struct AssignMachineResponse {
    /// "assigned" or "queued"
    pub outcome: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_time: Option<u32>,
}

impl AssignMachineResponse {
    pub fn from_outcome(user_name: &str, outcome: &SubmitOutcome, time: &TimeFormatter) -> Self {
        match outcome {
            SubmitOutcome::Assigned {
                machine_id,
                duration_minutes,
                assigned_at,
            } => {
                let from = time.format(*assigned_at);
                Self {
                    outcome: "assigned",
                    message: format!(
                        "Assigned machine {} to user {} for {} minutes from {}",
                        machine_id, user_name, duration_minutes, from
                    ),
                    machine_id: Some(machine_id.0),
                    assigned_at: Some(from),
                    waiting_time: None,
                }
            }
            SubmitOutcome::Queued {
                estimated_wait_minutes,
            } => Self {
                outcome: "queued",
                message: match estimated_wait_minutes {
                    Some(w) => format!("Added to queue. Waiting time is {} minutes", w),
                    None => "Added to queue".to_string(),
                },
                machine_id: None,
                assigned_at: None,
                waiting_time: *estimated_wait_minutes,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MachineInfo {
    pub machine_id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wash_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueuedUserInfo {
    pub position: usize,
    pub user_name: String,
    pub wash_time: u32,
    pub arrived_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_available_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub machines: Vec<MachineInfo>,
    pub queue: Vec<QueuedUserInfo>,
}

impl StatusResponse {
    pub fn from_view(view: &PoolStatusView, time: &TimeFormatter) -> Self {
        let machines = view
            .machines
            .iter()
            .map(|slot| match &slot.assignment {
                Some(a) => MachineInfo {
                    machine_id: slot.machine_id.0,
                    user_name: Some(a.requester_id.clone()),
                    wash_time: Some(a.duration_minutes),
                    arrived_at: Some(time.format(a.arrived_at)),
                    assigned_at: Some(time.format(a.assigned_at)),
                    done_at: Some(time.format(a.due_at())),
                },
                None => MachineInfo {
                    machine_id: slot.machine_id.0,
                    user_name: None,
                    wash_time: None,
                    arrived_at: None,
                    assigned_at: None,
                    done_at: None,
                },
            })
            .collect();

        let queue = view
            .queue
            .iter()
            .map(|entry| QueuedUserInfo {
                position: entry.position,
                user_name: entry.request.requester_id.clone(),
                wash_time: entry.request.duration_minutes,
                arrived_at: time.format(entry.request.arrived_at),
                waiting_time: entry.estimate.map(|e| e.waiting_minutes),
                machine_available_at: entry.estimate.map(|e| time.format(e.available_at)),
            })
            .collect();

        Self { machines, queue }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct UserStatusResponse {
    pub user_name: String,
    /// "assigned", "queued", "completed" or "not_found"
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wash_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_available_at: Option<String>,
}

impl UserStatusResponse {
    pub fn from_status(status: &RequesterStatus, time: &TimeFormatter) -> Self {
        match status {
            RequesterStatus::Assigned { assignment } => Self::assigned(assignment, time),
            RequesterStatus::Queued {
                position,
                request,
                estimate,
            } => {
                let (waiting_time, machine_available_at) = split_estimate(estimate, time);
                Self {
                    user_name: request.requester_id.clone(),
                    status: "queued",
                    message: format!("You are in Queue position {}", position),
                    position: Some(*position),
                    wash_time: Some(request.duration_minutes),
                    arrived_at: Some(time.format(request.arrived_at)),
                    waiting_time,
                    machine_available_at,
                    ..Self::default()
                }
            }
            RequesterStatus::Completed { requester_id } => Self {
                user_name: requester_id.clone(),
                status: "completed",
                message: "Wash successful. Pick up your clothes".to_string(),
                ..Self::default()
            },
            RequesterStatus::Unknown { requester_id } => Self {
                user_name: requester_id.clone(),
                status: "not_found",
                message: "User not found".to_string(),
                ..Self::default()
            },
        }
    }

    fn assigned(assignment: &Assignment, time: &TimeFormatter) -> Self {
        Self {
            user_name: assignment.requester_id.clone(),
            status: "assigned",
            message: format!("You are assigned to machine {}", assignment.machine_id),
            machine_id: Some(assignment.machine_id.0),
            wash_time: Some(assignment.duration_minutes),
            arrived_at: Some(time.format(assignment.arrived_at)),
            assigned_at: Some(time.format(assignment.assigned_at)),
            ..Self::default()
        }
    }
}

fn split_estimate(
    estimate: &Option<WaitEstimate>,
    time: &TimeFormatter,
) -> (Option<u32>, Option<String>) {
    match estimate {
        Some(e) => (Some(e.waiting_minutes), Some(time.format(e.available_at))),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_twelve_hour_clock_at_offset() {
        let ist = TimeFormatter::new(330).unwrap();
        assert_eq!(ist.format(1_700_000_000_000), "03:43 AM");

        let utc = TimeFormatter::new(0).unwrap();
        assert_eq!(utc.format(1_700_000_000_000), "10:13 PM");

        let west = TimeFormatter::new(-300).unwrap();
        assert_eq!(west.format(1_700_000_000_000), "05:13 PM");
    }

    #[test]
    fn test_out_of_range_instant_uses_placeholder() {
        let time = TimeFormatter::new(330).unwrap();
        assert_eq!(time.format(u64::MAX), UNDISPLAYABLE_TIME);
        assert_eq!(time.format(i64::MAX as u64), UNDISPLAYABLE_TIME);
    }

    #[test]
    fn test_rejects_offset_outside_a_day() {
        assert!(TimeFormatter::new(1439).is_ok());
        assert!(TimeFormatter::new(-1439).is_ok());
        assert!(TimeFormatter::new(1440).is_err());
        assert!(TimeFormatter::new(-1440).is_err());
        assert!(TimeFormatter::new(i32::MAX).is_err());
    }
}
