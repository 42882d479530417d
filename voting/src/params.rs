//! Time-window parameters for voting sessions.
//!
//! Both windows gate a phase transition: a session may only be opened once the
//! registration window has elapsed since its creation, and only closed once the
//! voting duration has elapsed since it was opened.

use agora_types::Timestamp;
use serde::{Deserialize, Serialize};

/// Default minimum time (seconds) between session creation and opening.
pub const DEFAULT_REGISTRATION_WINDOW_SECS: u64 = 121;

/// Default minimum time (seconds) between opening and closing a session.
pub const DEFAULT_VOTING_DURATION_SECS: u64 = 121;

/// Registry-wide time windows applied to every session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingParams {
    /// Minimum seconds a session stays in the Created phase.
    pub registration_window_secs: u64,
    /// Minimum seconds a session stays in the Open phase.
    pub voting_duration_secs: u64,
}

impl VotingParams {
    pub fn new(registration_window_secs: u64, voting_duration_secs: u64) -> Self {
        Self {
            registration_window_secs,
            voting_duration_secs,
        }
    }

    /// No time gates at all. Useful for simulations and scripted runs.
    pub fn instant() -> Self {
        Self::new(0, 0)
    }

    /// Earliest time a session created at `created_at` may be opened.
    pub fn opens_at(&self, created_at: Timestamp) -> Timestamp {
        created_at.saturating_add(self.registration_window_secs)
    }

    /// Earliest time a session opened at `opened_at` may be closed.
    pub fn closes_at(&self, opened_at: Timestamp) -> Timestamp {
        opened_at.saturating_add(self.voting_duration_secs)
    }
}

impl Default for VotingParams {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRATION_WINDOW_SECS, DEFAULT_VOTING_DURATION_SECS)
    }
}
