//! Voting sessions for Agora.
//!
//! Each session moves through three phases: Created → Open → Closed.
//! Candidates are nominated while Created, every account votes at most once
//! while Open, and the winners (all candidates tied at the maximum tally) are
//! final once Closed. Phase transitions are gated by configurable time windows.
//!
//! The [`SessionRegistry`] owns every session and is the only entry point for
//! callers. It never reads the wall clock: time and caller identity arrive with
//! each call in a [`CallContext`].

pub mod context;
pub mod error;
pub mod params;
pub mod registry;
pub mod session;

pub use context::CallContext;
pub use error::VotingError;
pub use params::{VotingParams, DEFAULT_REGISTRATION_WINDOW_SECS, DEFAULT_VOTING_DURATION_SECS};
pub use registry::{RegistrySnapshot, SessionRegistry};
pub use session::{CandidateTally, SessionView, VotingSession};
