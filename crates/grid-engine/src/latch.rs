//! One-shot session termination latch.
//!
//! Once a session ends it stays ended: there is no reset and no other
//! path back to a live session. The latch replaces a mutable "running"
//! flag so that termination is a single irreversible decision visible to
//! every holder of the handle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use tracing::{info, warn};

use grid_core::Price;

/// Why the session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EndReason {
    /// The stop-loss fired at this ticker price.
    StopLoss {
        /// Ticker price at the moment the stop fired.
        price: Price,
    },
    /// The operator interrupted the session (ctrl-c).
    Interrupted,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StopLoss { price } => write!(f, "Stop loss fired at {}", price),
            Self::Interrupted => write!(f, "Interrupted by operator"),
        }
    }
}

/// One-shot latch marking a session terminal.
///
/// Thread-safe: share via `Arc<SessionLatch>`.
pub struct SessionLatch {
    /// Ended flag (true = session is terminal).
    ended: AtomicBool,
    /// Timestamp when ended (Unix milliseconds, 0 while live).
    ended_at: AtomicU64,
    /// Reason the session ended.
    reason: RwLock<Option<EndReason>>,
}

impl Default for SessionLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLatch {
    /// Create a new latch in the live state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ended: AtomicBool::new(false),
            ended_at: AtomicU64::new(0),
            reason: RwLock::new(None),
        }
    }

    /// Check whether the session has ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// End the session with a reason.
    ///
    /// The first caller wins; later calls keep the original reason.
    pub fn end(&self, reason: EndReason) {
        // compare_exchange so only one caller records the transition
        if self
            .ended
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time went backwards")
                .as_millis() as u64;
            self.ended_at.store(now, Ordering::SeqCst);

            {
                let mut guard = self.reason.write();
                *guard = Some(reason.clone());
            }

            info!(reason = %reason, "Session ended");
        } else {
            warn!(new_reason = %reason, "Session already ended, ignoring");
        }
    }

    /// When the session ended (Unix milliseconds).
    ///
    /// Returns `None` while the session is live.
    #[must_use]
    pub fn ended_at(&self) -> Option<u64> {
        if self.is_ended() {
            let ts = self.ended_at.load(Ordering::SeqCst);
            if ts > 0 {
                return Some(ts);
            }
        }
        None
    }

    /// Why the session ended.
    ///
    /// Returns `None` while the session is live.
    #[must_use]
    pub fn reason(&self) -> Option<EndReason> {
        if self.is_ended() {
            self.reason.read().clone()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_latch_initially_live() {
        let latch = SessionLatch::new();
        assert!(!latch.is_ended());
        assert!(latch.ended_at().is_none());
        assert!(latch.reason().is_none());
    }

    #[test]
    fn test_latch_end() {
        let latch = SessionLatch::new();
        latch.end(EndReason::Interrupted);

        assert!(latch.is_ended());
        assert!(latch.ended_at().is_some());
        assert_eq!(latch.reason(), Some(EndReason::Interrupted));
    }

    #[test]
    fn test_latch_second_end_keeps_original_reason() {
        let latch = SessionLatch::new();
        latch.end(EndReason::StopLoss {
            price: Price::new(dec!(4)),
        });
        latch.end(EndReason::Interrupted);

        assert_eq!(
            latch.reason(),
            Some(EndReason::StopLoss {
                price: Price::new(dec!(4)),
            })
        );
    }

    #[test]
    fn test_end_reason_display() {
        let reasons = [
            (
                EndReason::StopLoss {
                    price: Price::new(dec!(4)),
                },
                "Stop loss fired at 4",
            ),
            (EndReason::Interrupted, "Interrupted by operator"),
        ];

        for (reason, expected) in reasons {
            assert_eq!(reason.to_string(), expected);
        }
    }
}
