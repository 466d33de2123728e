use tracing::{debug, info};

use crate::types::{Assignment, MachineId, Request, SlotView, Timestamp};
use crate::wait_list::WaitList;

/// A fixed set of interchangeable machines, each idle or holding one
/// assignment. Slots are always scanned in ascending machine order.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    slots: Vec<Option<Assignment>>,
}

impl ResourcePool {
    pub fn new(machines: usize) -> Self {
        Self {
            slots: vec![None; machines],
        }
    }

    /// Number of machines (N). Fixed for the life of the pool.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Binds the request to the lowest-numbered idle machine, if any.
    pub fn try_assign_immediately(&mut self, request: Request, now: Timestamp) -> Option<MachineId> {
        let index = self.slots.iter().position(Option::is_none)?;
        let machine_id = MachineId::from_index(index);
        debug!(
            requester_id = %request.requester_id,
            machine_id = %machine_id,
            "Assigning idle machine"
        );
        self.slots[index] = Some(Assignment::new(request, machine_id, now));
        Some(machine_id)
    }

    /// Reclaims every assignment whose usage period has elapsed and promotes
    /// the wait-list head into each freed machine. Returns the requester ids
    /// that expired, in machine order.
    ///
    /// Each slot is visited exactly once, so an assignment promoted during
    /// this call is never re-checked in the same pass.
    pub fn reconcile(&mut self, now: Timestamp, wait_list: &mut WaitList) -> Vec<String> {
        let mut completed = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let expired = matches!(slot, Some(a) if a.is_expired(now));
            if !expired {
                continue;
            }
            let Some(finished) = slot.take() else {
                continue;
            };
            let machine_id = MachineId::from_index(index);
            info!(
                requester_id = %finished.requester_id,
                machine_id = %machine_id,
                due_at = finished.due_at(),
                "Assignment expired, machine reclaimed"
            );
            completed.push(finished.requester_id);

            if let Some(next) = wait_list.dequeue_head() {
                info!(
                    requester_id = %next.requester_id,
                    machine_id = %machine_id,
                    "Promoted from wait-list"
                );
                *slot = Some(Assignment::new(next, machine_id, now));
            }
        }

        completed
    }

    /// Minimum declared duration among active assignments, or 0 when the
    /// pool is idle. Ignores time already served, so it is only an
    /// approximation of when the next machine frees up.
    pub fn estimated_wait_minutes(&self) -> u32 {
        self.slots
            .iter()
            .flatten()
            .map(|a| a.duration_minutes)
            .min()
            .unwrap_or(0)
    }

    pub fn find(&self, requester_id: &str) -> Option<&Assignment> {
        self.slots
            .iter()
            .flatten()
            .find(|a| a.requester_id == requester_id)
    }

    pub fn snapshot(&self) -> Vec<SlotView> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotView {
                machine_id: MachineId::from_index(index),
                assignment: slot.clone(),
            })
            .collect()
    }
}
