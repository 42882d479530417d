//! Per-call environment: who is calling, and when.

use agora_types::{AccountId, Clock, Timestamp};

/// Caller identity and current time for a single registry call.
///
/// Supplied by the environment on every mutating call. The voting core uses
/// `caller` as the one-vote-per-account key and `now` for time-window gates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: impl Into<AccountId>, now: Timestamp) -> Self {
        Self {
            caller: caller.into(),
            now,
        }
    }

    /// Build a context stamped with the clock's current time.
    pub fn from_clock<C: Clock + ?Sized>(caller: impl Into<AccountId>, clock: &C) -> Self {
        Self::new(caller, clock.now())
    }
}
