//! Bounded write confirmation.
//!
//! A request is written once, then checked after a delay. A check either
//! confirms it, re-writes and schedules another check, or gives up. The
//! arbiter holds at most one [`PendingRequest`]; a newer request replaces
//! it and any check still scheduled for the old one is ignored.
//!
//! ```text
//! Issued ──delay──► Checking ──┬─► Confirmed
//!                      ▲       ├─► Retrying(n) ──delay──┐
//!                      └───────┼────────────────────────┘
//!                              └─► Abandoned
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::actuator::Level;
use crate::decision::Purpose;
use crate::error::ActuatorError;

/// Identifies one write request for the lifetime of the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Arranges for `VolumeArbiter::on_check` to be called later.
///
/// Implementations must deliver the check on the same serialization domain
/// that calls `handle_event`.
pub trait RetryScheduler: Send + Sync {
    fn schedule(&self, id: RequestId, delay: Duration);

    /// Drop every check not yet delivered.
    fn cancel_all(&self) {}
}

/// Result of one confirmation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The device reports the target level.
    Confirmed(Level),
    /// Not there yet; write again and check later.
    Retry,
    /// Out of retries. Carries the last level actually observed.
    Abandoned(Level),
}

/// The single in-flight write request.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: RequestId,
    pub source_id: String,
    pub purpose: Purpose,
    pub target: Level,
    /// Used to turn the settled level into a percentage.
    pub max_level: Level,
    /// Re-writes issued so far (the first write is not a retry).
    pub retries: u32,
    pub last_observed: Level,
}

impl PendingRequest {
    pub fn new(
        id: RequestId,
        source_id: impl Into<String>,
        purpose: Purpose,
        target: Level,
        max_level: Level,
        level_before: Level,
    ) -> Self {
        Self {
            id,
            source_id: source_id.into(),
            purpose,
            target,
            max_level,
            retries: 0,
            last_observed: level_before,
        }
    }

    /// Fold a re-read into the request and say what happens next.
    ///
    /// A failed read counts as "not confirmed". On `Retry` the retry counter
    /// has already been bumped.
    pub fn record_check(
        &mut self,
        observed: Result<Level, ActuatorError>,
        ceiling: u32,
    ) -> CheckOutcome {
        if let Ok(level) = observed {
            self.last_observed = level;
            if level == self.target {
                return CheckOutcome::Confirmed(level);
            }
        }

        if self.retries < ceiling {
            self.retries += 1;
            CheckOutcome::Retry
        } else {
            CheckOutcome::Abandoned(self.last_observed)
        }
    }
}

/// Scheduler that only records what was asked of it.
///
/// Tests pop scheduled checks and feed them to the arbiter by hand, which
/// keeps timing out of unit tests entirely.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<(RequestId, Duration)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest scheduled check, if any.
    pub fn pop(&self) -> Option<RequestId> {
        self.lock().pop_front().map(|(id, _)| id)
    }

    /// Every scheduled check, oldest first, with its delay.
    pub fn scheduled(&self) -> Vec<(RequestId, Duration)> {
        self.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<(RequestId, Duration)>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RetryScheduler for ManualScheduler {
    fn schedule(&self, id: RequestId, delay: Duration) {
        self.lock().push_back((id, delay));
    }

    fn cancel_all(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target: Level) -> PendingRequest {
        PendingRequest::new(RequestId(1), "s", Purpose::Attenuate, target, 10, 8)
    }

    #[test]
    fn test_confirmed_on_match() {
        let mut req = request(2);
        assert_eq!(req.record_check(Ok(2), 3), CheckOutcome::Confirmed(2));
        assert_eq!(req.retries, 0);
    }

    #[test]
    fn test_retries_until_ceiling_then_abandons() {
        let mut req = request(2);
        for n in 1..=3 {
            assert_eq!(req.record_check(Ok(8), 3), CheckOutcome::Retry);
            assert_eq!(req.retries, n);
        }
        assert_eq!(req.record_check(Ok(7), 3), CheckOutcome::Abandoned(7));
    }

    #[test]
    fn test_failed_read_keeps_last_observed() {
        let mut req = request(2);
        assert_eq!(req.record_check(Ok(5), 0), CheckOutcome::Abandoned(5));

        let mut req = request(2);
        let err = ActuatorError::Read("gone".into());
        assert_eq!(req.record_check(Err(err), 0), CheckOutcome::Abandoned(8));
    }

    #[test]
    fn test_manual_scheduler_fifo_and_cancel() {
        let scheduler = ManualScheduler::new();
        scheduler.schedule(RequestId(1), Duration::from_millis(100));
        scheduler.schedule(RequestId(2), Duration::from_millis(100));
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.pop(), Some(RequestId(1)));

        scheduler.cancel_all();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.pop(), None);
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId(7).to_string(), "req-7");
    }
}
