use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use vigil_ports::outbound::{AlertStore, Clock, EscalationTimerQueue, EventPublisher};

use crate::alert_service::AlertService;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Drives time-based escalation: polls the timer queue on an interval
/// and hands every due entry to the service. Timers fire independently
/// of each other; there is no ordering guarantee across alerts.
pub struct EscalationScheduler<S, Q, P>
where
    S: AlertStore,
    Q: EscalationTimerQueue,
    P: EventPublisher,
{
    service: Arc<AlertService<S, Q, P>>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl<S, Q, P> EscalationScheduler<S, Q, P>
where
    S: AlertStore,
    Q: EscalationTimerQueue,
    P: EventPublisher,
{
    pub fn new(service: Arc<AlertService<S, Q, P>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            service,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Runs until `shutdown` flips to true. A failing poll is logged and
    /// retried on the next tick; it never stops the loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = self.clock.now();
                    match self.service.fire_due_timers(now).await {
                        Ok(0) => {}
                        Ok(fired) => tracing::debug!(fired, "escalation timers fired"),
                        Err(err) => tracing::warn!(error = %err, "escalation timer poll failed"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("escalation scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }
}
