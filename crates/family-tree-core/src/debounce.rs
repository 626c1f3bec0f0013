//! Trailing-edge debounce on caller-supplied millisecond timestamps.

/// Quiet period before a resize triggers a refit
pub const RESIZE_QUIET_MS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    quiet_ms: u64,
    last_trigger: Option<u64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(RESIZE_QUIET_MS)
    }
}

impl Debouncer {
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            last_trigger: None,
        }
    }

    /// Restart the quiet period.
    pub fn trigger(&mut self, now_ms: u64) {
        self.last_trigger = Some(now_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.last_trigger.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.last_trigger.map(|t| t.saturating_add(self.quiet_ms))
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline() {
            Some(deadline) if now_ms >= deadline => {
                self.last_trigger = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_fires_once_after_quiet_period() {
        let mut d = Debouncer::default();
        d.trigger(0);
        d.trigger(50);
        d.trigger(100);
        assert!(!d.poll(200));
        assert!(d.poll(220));
        assert!(!d.poll(400));
        assert!(!d.is_pending());
    }
}
