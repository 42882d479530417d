//! Fundamental types for Agora.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identifiers, session identifiers, session phases and timestamps.

pub mod account;
pub mod error;
pub mod session;
pub mod time;

pub use account::AccountId;
pub use error::ParseError;
pub use session::{SessionId, SessionPhase};
pub use time::{Clock, SystemClock, Timestamp};
