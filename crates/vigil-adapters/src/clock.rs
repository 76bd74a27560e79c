use chrono::{DateTime, Utc};

use vigil_ports::outbound::Clock;

/// Wall-clock time. Services take explicit `now` parameters, so this is
/// consumed only at the edges (scheduler loop, HTTP handlers).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
