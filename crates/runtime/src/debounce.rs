use foundation::time::Millis;

/// Coalesces bursts of triggers into one firing after a quiet period.
///
/// Driven by a logical clock: `trigger` (re)arms the deadline, `poll` fires at
/// most once per armed deadline. The caller does the actual work on firing
/// and reads its inputs at that moment, not at trigger time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    delay_ms: u64,
    deadline: Option<Millis>,
    torn_down: bool,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline: None,
            torn_down: false,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Cancels any pending deadline and arms a new one `delay_ms` from `now`.
    pub fn trigger(&mut self, now: Millis) {
        if self.torn_down {
            return;
        }
        self.deadline = Some(now.saturating_add(self.delay_ms));
    }

    /// Returns `true` exactly once when the armed deadline has passed.
    pub fn poll(&mut self, now: Millis) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Cancels the pending deadline and ignores every later trigger.
    pub fn teardown(&mut self) {
        self.deadline = None;
        self.torn_down = true;
    }
}
