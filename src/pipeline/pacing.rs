//! Pacing gate: bounds how often the producer attempts the next file.

use std::time::{Duration, Instant};

use super::stop::StopSignal;

/// Gate derived from `publishrate` (files per second). A rate ≤ 0 disables it.
#[derive(Clone, Debug)]
pub struct PacingGate {
    period: Option<Duration>,
    last_attempt: Option<Instant>,
}

impl PacingGate {
    /// Period is `1000 / rate` whole milliseconds; rates above 1000/s round down to no gate.
    pub fn from_rate(rate: f64) -> Self {
        let period = if rate > 0.0 && rate.is_finite() {
            let ms = (1000.0 / rate) as u64;
            (ms > 0).then(|| Duration::from_millis(ms))
        } else {
            None
        };
        Self {
            period,
            last_attempt: None,
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Start the clock: the next attempt is due one period from now. Called when the loop begins.
    pub fn arm(&mut self) {
        if self.period.is_some() {
            self.last_attempt = Some(Instant::now());
        }
    }

    /// Wait until one period has passed since the previous attempt (or since [`Self::arm`]),
    /// then record this attempt. An unarmed gate arms itself on the first call, so even the
    /// first attempt waits a full period. Returns false if `stop` fired while waiting.
    pub fn admit(&mut self, stop: &StopSignal) -> bool {
        let Some(period) = self.period else {
            return true;
        };
        let last = *self.last_attempt.get_or_insert_with(Instant::now);
        let due = last + period;
        let now = Instant::now();
        if now < due && stop.wait_timeout(due - now) {
            return false;
        }
        self.last_attempt = Some(Instant::now());
        true
    }
}
