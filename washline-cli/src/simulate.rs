//! Offline replay of a scripted scenario against a manual clock.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use washline_core::client::AllocationClient;
use washline_core::clock::ManualClock;
use washline_core::config::PoolConfig;
use washline_core::service::{PoolStatusView, RequesterStatus, SubmitOutcome};
use washline_core::types::MINUTE_MS;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub machines: usize,
    #[serde(default)]
    pub completed_capacity: Option<usize>,
    pub events: Vec<ScenarioEvent>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioEvent {
    /// Minutes since the start of the scenario. Must not decrease.
    pub at_minute: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Submit {
        requester_id: String,
        duration_minutes: u32,
    },
    Status,
    RequesterStatus {
        requester_id: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    Submitted(SubmitOutcome),
    Rejected(String),
    Status(PoolStatusView),
    RequesterStatus(RequesterStatus),
}

#[derive(Debug, Serialize)]
pub struct Step {
    pub at_minute: u64,
    pub result: StepResult,
}

/// Replays every event in order. Timestamps in the output are milliseconds
/// since the start of the scenario.
pub fn run_scenario(scenario: &Scenario) -> anyhow::Result<Vec<Step>> {
    let mut config = PoolConfig::new(scenario.machines);
    config.completed_capacity = scenario.completed_capacity;
    config.validate().map_err(anyhow::Error::msg)?;

    let clock = ManualClock::new(0);
    let mut client = AllocationClient::with_clock(&config, clock.clone());
    let mut last_minute = 0;
    let mut steps = Vec::with_capacity(scenario.events.len());

    for (i, event) in scenario.events.iter().enumerate() {
        if event.at_minute < last_minute {
            bail!(
                "events[{}]: at_minute {} is earlier than the previous event ({})",
                i,
                event.at_minute,
                last_minute
            );
        }
        let Some(at) = event.at_minute.checked_mul(MINUTE_MS) else {
            bail!(
                "events[{}]: at_minute {} is too far in the future",
                i,
                event.at_minute
            );
        };
        last_minute = event.at_minute;
        clock.set(at);

        let result = match &event.action {
            Action::Submit {
                requester_id,
                duration_minutes,
            } => match client.submit(requester_id, *duration_minutes) {
                Ok((outcome, _)) => StepResult::Submitted(outcome),
                Err(e) => StepResult::Rejected(e.to_string()),
            },
            Action::Status => StepResult::Status(client.pool_status().0),
            Action::RequesterStatus { requester_id } => {
                StepResult::RequesterStatus(client.requester_status(requester_id).0)
            }
        };
        tracing::debug!(at_minute = event.at_minute, "Scenario step replayed");
        steps.push(Step {
            at_minute: event.at_minute,
            result,
        });
    }

    Ok(steps)
}

pub fn run_from_json(input: &str) -> anyhow::Result<String> {
    let scenario: Scenario = serde_json::from_str(input).context("Invalid scenario JSON")?;
    let steps = run_scenario(&scenario)?;
    Ok(serde_json::to_string_pretty(&steps)?)
}
