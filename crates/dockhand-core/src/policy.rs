//! Timeout policy

use dockhand_util::format_duration;
use std::fmt;
use std::time::Duration;

/// Maximum permitted runtime of the child; zero disables enforcement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutPolicy(Duration);

impl TimeoutPolicy {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn disabled() -> Self {
        Self(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.0.is_zero()
    }

    /// The enforced bound, `None` when disabled
    pub fn limit(&self) -> Option<Duration> {
        self.is_enabled().then_some(self.0)
    }
}

impl From<Duration> for TimeoutPolicy {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}

/// Renders in Go duration notation, e.g. `1s` or `500ms`
impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_disabled() {
        assert!(!TimeoutPolicy::disabled().is_enabled());
        assert!(!TimeoutPolicy::new(Duration::ZERO).is_enabled());
        assert_eq!(TimeoutPolicy::default(), TimeoutPolicy::disabled());
        assert_eq!(TimeoutPolicy::disabled().limit(), None);
    }

    #[test]
    fn nonzero_is_enabled() {
        let policy = TimeoutPolicy::from(Duration::from_secs(1));
        assert!(policy.is_enabled());
        assert_eq!(policy.limit(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn display_uses_go_notation() {
        assert_eq!(TimeoutPolicy::new(Duration::from_secs(1)).to_string(), "1s");
        assert_eq!(TimeoutPolicy::new(Duration::from_millis(500)).to_string(), "500ms");
        assert_eq!(TimeoutPolicy::new(Duration::from_secs(90)).to_string(), "1m30s");
    }
}
