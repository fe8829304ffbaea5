use crate::resilience::RetryPolicy;
use std::time::Duration;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    /// Give up on this backend; the caller moves to the next tier, if any.
    Exhausted,
}

/// Retry-then-escalate rules for one query.
///
/// Every failure is treated alike: no error class is exempt from retry, and
/// an explicitly requested backend never escalates.
pub(crate) struct TierPolicy {
    retry: RetryPolicy,
    explicit: bool,
}

impl TierPolicy {
    pub fn auto(retry: RetryPolicy) -> Self {
        Self {
            retry,
            explicit: false,
        }
    }

    pub fn explicit() -> Self {
        Self {
            retry: RetryPolicy::new(0, Duration::ZERO),
            explicit: true,
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn attempts(&self) -> u32 {
        self.retry.attempts()
    }

    /// `attempt` is 0-based.
    pub fn decide(&self, attempt: u32) -> Decision {
        match self.retry.delay_after(attempt) {
            Some(delay) => Decision::Retry { delay },
            None => Decision::Exhausted,
        }
    }
}
