use agora_voting::VotingError;
use thiserror::Error;

use crate::command::CommandError;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Command(#[from] CommandError),

    #[error("error[{kind}]: {0}", kind = .0.kind())]
    Voting(#[from] VotingError),

    #[error("clock error: {0}")]
    Clock(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
