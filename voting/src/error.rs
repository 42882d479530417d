use agora_types::{AccountId, SessionId, SessionPhase};
use thiserror::Error;

/// Validation failures for voting calls.
///
/// None of these are transient: the caller has to change the request (or
/// wait for a time window) before trying again. A failed call never leaves
/// partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VotingError {
    #[error("session {0} not found")]
    InvalidSession(SessionId),

    #[error("session is {actual}, operation requires {expected}")]
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },

    #[error("candidate {0} is already registered")]
    DuplicateCandidate(AccountId),

    #[error("candidate {0} is not registered")]
    UnknownCandidate(AccountId),

    #[error("account {0} has already voted in this session")]
    AlreadyVoted(AccountId),

    #[error("time window not elapsed: {elapsed}s of {required}s")]
    TimeWindowNotElapsed { elapsed: u64, required: u64 },

    #[error("no session ids left after {0}")]
    SessionIdsExhausted(SessionId),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl VotingError {
    /// Stable machine-readable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSession(_) => "invalid_session",
            Self::WrongPhase { .. } => "wrong_phase",
            Self::DuplicateCandidate(_) => "duplicate_candidate",
            Self::UnknownCandidate(_) => "unknown_candidate",
            Self::AlreadyVoted(_) => "already_voted",
            Self::TimeWindowNotElapsed { .. } => "time_window_not_elapsed",
            Self::SessionIdsExhausted(_) => "session_ids_exhausted",
            Self::Snapshot(_) => "snapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = VotingError::WrongPhase {
            expected: SessionPhase::Open,
            actual: SessionPhase::Closed,
        };
        assert_eq!(err.to_string(), "session is closed, operation requires open");

        let err = VotingError::TimeWindowNotElapsed {
            elapsed: 60,
            required: 121,
        };
        assert_eq!(err.to_string(), "time window not elapsed: 60s of 121s");
        assert_eq!(err.kind(), "time_window_not_elapsed");

        let err = VotingError::SessionIdsExhausted(SessionId::new(u64::MAX));
        assert_eq!(err.to_string(), format!("no session ids left after {}", u64::MAX));
        assert_eq!(err.kind(), "session_ids_exhausted");
    }
}
