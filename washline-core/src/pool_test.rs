#[cfg(test)]
mod tests {
    use crate::pool::ResourcePool;
    use crate::types::{MachineId, Request, MINUTE_MS};
    use crate::wait_list::WaitList;

    const T0: u64 = 1_000_000;

    fn req(id: &str, minutes: u32) -> Request {
        Request::new(id, minutes, T0)
    }

    #[test]
    fn test_assigns_lowest_idle_machine() {
        let mut pool = ResourcePool::new(3);

        assert_eq!(pool.try_assign_immediately(req("a", 10), T0), Some(MachineId(1)));
        assert_eq!(pool.try_assign_immediately(req("b", 10), T0), Some(MachineId(2)));
        assert_eq!(pool.try_assign_immediately(req("c", 10), T0), Some(MachineId(3)));
        assert_eq!(pool.try_assign_immediately(req("d", 10), T0), None);
        assert_eq!(pool.active_count(), 3);
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let mut pool = ResourcePool::new(1);
        let mut waiting = WaitList::new();
        pool.try_assign_immediately(req("a", 10), T0);

        // Exactly at assignedAt + duration: still held
        let due = T0 + 10 * MINUTE_MS;
        assert!(pool.reconcile(due, &mut waiting).is_empty());
        assert_eq!(pool.active_count(), 1);

        // One millisecond later: reclaimed
        assert_eq!(pool.reconcile(due + 1, &mut waiting), vec!["a".to_string()]);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_reconcile_reclaims_exactly_the_expired() {
        let mut pool = ResourcePool::new(3);
        let mut waiting = WaitList::new();
        pool.try_assign_immediately(req("short", 5), T0);
        pool.try_assign_immediately(req("long", 30), T0);
        pool.try_assign_immediately(req("mid", 10), T0);

        let expired = pool.reconcile(T0 + 11 * MINUTE_MS, &mut waiting);
        assert_eq!(expired, vec!["short".to_string(), "mid".to_string()]);
        assert!(pool.find("long").is_some());
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_promotes_head_into_freed_machine() {
        let mut pool = ResourcePool::new(2);
        let mut waiting = WaitList::new();
        pool.try_assign_immediately(req("a", 30), T0);
        pool.try_assign_immediately(req("b", 5), T0);
        waiting.enqueue(req("c", 1));
        waiting.enqueue(req("d", 1));

        let now = T0 + 6 * MINUTE_MS;
        assert_eq!(pool.reconcile(now, &mut waiting), vec!["b".to_string()]);

        let promoted = pool.find("c").expect("head promoted");
        assert_eq!(promoted.machine_id, MachineId(2));
        assert_eq!(promoted.assigned_at, now);
        assert_eq!(waiting.position_of("d"), Some(1));
    }

    #[test]
    fn test_promoted_assignment_not_rechecked_in_same_pass() {
        let mut pool = ResourcePool::new(1);
        let mut waiting = WaitList::new();
        pool.try_assign_immediately(req("a", 1), T0);
        waiting.enqueue(req("b", 1));
        waiting.enqueue(req("c", 1));

        // Far in the future: "a" expires, "b" is promoted with assignedAt = now
        // and must survive this pass; "c" stays queued.
        let now = T0 + 100 * MINUTE_MS;
        assert_eq!(pool.reconcile(now, &mut waiting), vec!["a".to_string()]);
        assert!(pool.find("b").is_some());
        assert_eq!(waiting.len(), 1);
    }

    #[test]
    fn test_due_time_saturates_near_end_of_time() {
        let mut pool = ResourcePool::new(1);
        let mut waiting = WaitList::new();
        let late = (u64::MAX / MINUTE_MS) * MINUTE_MS;
        pool.try_assign_immediately(Request::new("a", 30, late), late);

        assert_eq!(pool.find("a").map(|a| a.due_at()), Some(u64::MAX));
        assert!(pool.reconcile(u64::MAX, &mut waiting).is_empty());
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_estimated_wait_is_minimum_active_duration() {
        let mut pool = ResourcePool::new(3);
        assert_eq!(pool.estimated_wait_minutes(), 0);

        pool.try_assign_immediately(req("a", 15), T0);
        pool.try_assign_immediately(req("b", 5), T0);
        assert_eq!(pool.estimated_wait_minutes(), 5);
    }

    #[test]
    fn test_snapshot_lists_every_machine_in_order() {
        let mut pool = ResourcePool::new(2);
        pool.try_assign_immediately(req("a", 15), T0);

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].machine_id, MachineId(1));
        assert_eq!(
            snapshot[0].assignment.as_ref().map(|a| a.requester_id.as_str()),
            Some("a")
        );
        assert_eq!(snapshot[1].machine_id, MachineId(2));
        assert!(snapshot[1].assignment.is_none());
    }
}
