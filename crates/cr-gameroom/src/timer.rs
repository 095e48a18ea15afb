use std::time::Duration;
use tokio::time::Instant;

/// Configuration for the action clock and the pause between hands.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub action_timeout: Duration,
    pub hand_delay: Duration,
    /// Remaining-time thresholds, descending, at which a `timeWarning` fires
    /// for the active player only.
    pub warning_thresholds: [Duration; 2],
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(30),
            hand_delay: Duration::from_secs(3),
            warning_thresholds: [Duration::from_secs(10), Duration::from_secs(5)],
        }
    }
}

/// Tracks one room's action-clock deadline and which warning thresholds
/// have already fired for the current deadline.
#[derive(Debug)]
pub struct ActionTimer {
    config: TimerConfig,
    deadline: Option<Instant>,
    warnings_sent: usize,
}

impl ActionTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            deadline: None,
            warnings_sent: 0,
        }
    }
    pub fn with_defaults() -> Self {
        Self::new(TimerConfig::default())
    }

    /// Arms the clock; cancels any previous deadline.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.config.action_timeout);
        self.warnings_sent = 0;
    }
    /// Cancels the clock on a successful action, a leave, or a disconnect.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.warnings_sent = 0;
    }
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
    pub fn expired(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }
    pub fn remaining_ms(&self) -> Option<u64> {
        self.remaining().map(|d| d.as_millis() as u64)
    }

    /// Returns the next unsent warning threshold that the current remaining
    /// time has crossed, marking it sent so it fires only once per deadline.
    pub fn next_warning_due(&mut self) -> Option<Duration> {
        let remaining = self.remaining()?;
        while self.warnings_sent < self.config.warning_thresholds.len() {
            let threshold = self.config.warning_thresholds[self.warnings_sent];
            if remaining <= threshold {
                self.warnings_sent += 1;
                return Some(threshold);
            }
            break;
        }
        None
    }

    pub fn hand_delay(&self) -> Duration {
        self.config.hand_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disarmed() {
        let timer = ActionTimer::with_defaults();
        assert!(!timer.is_armed());
        assert!(!timer.expired());
    }

    #[test]
    fn arming_sets_a_future_deadline() {
        let mut timer = ActionTimer::with_defaults();
        timer.arm();
        assert!(timer.is_armed());
        assert!(!timer.expired());
        assert!(timer.remaining().unwrap() <= Duration::from_secs(30));
    }

    #[test]
    fn cancel_clears_the_deadline() {
        let mut timer = ActionTimer::with_defaults();
        timer.arm();
        timer.cancel();
        assert!(!timer.is_armed());
    }

    #[test]
    fn each_warning_threshold_fires_at_most_once() {
        let mut timer = ActionTimer::new(TimerConfig {
            action_timeout: Duration::from_millis(20),
            hand_delay: Duration::from_secs(1),
            warning_thresholds: [Duration::from_millis(15), Duration::from_millis(5)],
        });
        timer.arm();
        std::thread::sleep(Duration::from_millis(10));
        let first = timer.next_warning_due();
        assert_eq!(first, Some(Duration::from_millis(15)));
        assert_eq!(timer.next_warning_due(), None);
    }
}
