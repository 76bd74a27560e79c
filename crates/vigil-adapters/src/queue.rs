use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_core::ids::AlertId;
use vigil_ports::error::PortError;
use vigil_ports::outbound::EscalationTimerQueue;
use vigil_ports::types::PendingTimer;

struct HeapEntry(Reverse<DateTime<Utc>>, PendingTimer);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<HeapEntry>,
    cancelled: HashSet<String>,
}

/// Process-local timer queue: a min-heap on fire time. Entries for a
/// cancelled alert stay in the heap and are dropped when they surface;
/// popped entries are gone, so `mark_fired` has nothing left to do.
/// Suits single-process deployments and tests; the SQLite queue is the
/// durable variant.
#[derive(Default)]
pub struct InMemoryTimerQueue {
    state: Mutex<QueueState>,
}

impl InMemoryTimerQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EscalationTimerQueue for InMemoryTimerQueue {
    async fn enqueue(&self, timer: PendingTimer) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.heap.push(HeapEntry(Reverse(timer.fires_at), timer));
        Ok(())
    }

    async fn poll_due(&self, now: DateTime<Utc>) -> Result<Vec<PendingTimer>, PortError> {
        let mut state = self.state.lock().unwrap();
        let mut due = Vec::new();
        loop {
            match state.heap.peek() {
                Some(entry) if entry.1.fires_at <= now => {}
                _ => break,
            }
            if let Some(HeapEntry(_, timer)) = state.heap.pop() {
                if state.cancelled.contains(&timer.alert_id.to_string()) {
                    continue;
                }
                due.push(timer);
            }
        }
        Ok(due)
    }

    async fn cancel_for_alert(&self, alert_id: AlertId) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.cancelled.insert(alert_id.to_string());
        Ok(())
    }

    async fn mark_fired(&self, _id: &str) -> Result<(), PortError> {
        // popping in poll_due already consumed the entry
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_ports::types::TimerKind;

    fn ts(s: &str) -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn timer(alert_id: AlertId, level: u32, fires_at: DateTime<Utc>) -> PendingTimer {
        PendingTimer {
            id: uuid::Uuid::new_v4().to_string(),
            alert_id,
            kind: TimerKind::Escalate { level },
            fires_at,
        }
    }

    #[tokio::test]
    async fn poll_returns_due_entries_in_fire_order() {
        let queue = InMemoryTimerQueue::new();
        let alert_id = AlertId::new();
        queue.enqueue(timer(alert_id, 2, ts("2025-03-10T14:10:00Z"))).await.unwrap();
        queue.enqueue(timer(alert_id, 1, ts("2025-03-10T14:05:00Z"))).await.unwrap();
        queue.enqueue(timer(alert_id, 3, ts("2025-03-10T14:20:00Z"))).await.unwrap();

        let due = queue.poll_due(ts("2025-03-10T14:15:00Z")).await.unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].kind, TimerKind::Escalate { level: 1 });
        assert_eq!(due[1].kind, TimerKind::Escalate { level: 2 });

        // the future entry is still armed
        let later = queue.poll_due(ts("2025-03-10T14:30:00Z")).await.unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].kind, TimerKind::Escalate { level: 3 });
    }

    #[tokio::test]
    async fn popped_entries_do_not_fire_twice() {
        let queue = InMemoryTimerQueue::new();
        let alert_id = AlertId::new();
        queue.enqueue(timer(alert_id, 1, ts("2025-03-10T14:00:00Z"))).await.unwrap();

        let first = queue.poll_due(ts("2025-03-10T14:01:00Z")).await.unwrap();
        assert_eq!(first.len(), 1);
        queue.mark_fired(&first[0].id).await.unwrap();

        let second = queue.poll_due(ts("2025-03-10T14:02:00Z")).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn cancelled_alert_timers_never_surface() {
        let queue = InMemoryTimerQueue::new();
        let cancelled = AlertId::new();
        let live = AlertId::new();
        queue.enqueue(timer(cancelled, 1, ts("2025-03-10T14:00:00Z"))).await.unwrap();
        queue.enqueue(timer(live, 1, ts("2025-03-10T14:00:00Z"))).await.unwrap();

        queue.cancel_for_alert(cancelled).await.unwrap();

        let due = queue.poll_due(ts("2025-03-10T14:01:00Z")).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].alert_id, live);
    }

    #[tokio::test]
    async fn nothing_due_before_fire_time() {
        let queue = InMemoryTimerQueue::new();
        queue
            .enqueue(timer(AlertId::new(), 1, ts("2025-03-10T14:05:00Z")))
            .await
            .unwrap();
        let due = queue.poll_due(ts("2025-03-10T14:04:59Z")).await.unwrap();
        assert!(due.is_empty());
    }
}
