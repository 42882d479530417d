//! Executes parsed commands against a session registry.

use agora_nullables::NullClock;
use agora_types::{AccountId, Clock, SystemClock, Timestamp};
use agora_utils::format_duration;
use agora_voting::{CallContext, SessionRegistry};

use crate::command::{parse_line, Command};
use crate::config::ClockMode;
use crate::error::DaemonError;

/// The clock that stamps every command.
pub enum ScriptClock {
    System(SystemClock),
    Simulated(NullClock),
}

impl ScriptClock {
    pub fn from_mode(mode: ClockMode) -> Self {
        match mode {
            ClockMode::System => Self::System(SystemClock),
            ClockMode::Simulated => Self::Simulated(NullClock::new(0)),
        }
    }

    fn advance(&self, secs: u64) -> Result<(), DaemonError> {
        match self {
            Self::System(_) => Err(DaemonError::Clock(
                "advance requires the simulated clock".to_string(),
            )),
            Self::Simulated(clock) => {
                clock.advance(secs);
                Ok(())
            }
        }
    }
}

impl Clock for ScriptClock {
    fn now(&self) -> Timestamp {
        match self {
            Self::System(clock) => clock.now(),
            Self::Simulated(clock) => clock.now(),
        }
    }
}

/// Owns the registry for the lifetime of a run and answers each command with
/// a single line of output.
pub struct Interpreter {
    registry: SessionRegistry,
    clock: ScriptClock,
}

impl Interpreter {
    pub fn new(registry: SessionRegistry, clock: ScriptClock) -> Self {
        Self { registry, clock }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn context(&self, caller: AccountId) -> CallContext {
        CallContext::from_clock(caller, &self.clock)
    }

    /// Parse and run one script line. Returns `None` for blank or comment lines.
    pub fn execute_line(&self, line: &str) -> Result<Option<String>, DaemonError> {
        match parse_line(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    pub fn execute(&self, command: Command) -> Result<String, DaemonError> {
        let output = match command {
            Command::Create { caller } => {
                let id = self.registry.create_session(&self.context(caller))?;
                format!("session {id} created")
            }
            Command::Nominate {
                caller,
                session,
                candidate,
            } => {
                self.registry
                    .add_candidate(&self.context(caller), session, candidate)?;
                "ok".to_string()
            }
            Command::Open { caller, session } => {
                let ctx = self.context(caller);
                self.registry.open_session(&ctx, session)?;
                let closes_at = self.registry.params().closes_at(ctx.now);
                format!(
                    "session {session} open, closes no earlier than {closes_at} (in {})",
                    format_duration(ctx.now.elapsed_since(closes_at))
                )
            }
            Command::Vote {
                caller,
                session,
                candidate,
            } => {
                self.registry
                    .cast_vote(&self.context(caller), session, &candidate)?;
                "ok".to_string()
            }
            Command::Close { caller, session } => {
                self.registry.close_session(&self.context(caller), session)?;
                format!("session {session} closed")
            }
            Command::Votes { session, candidate } => self
                .registry
                .number_of_votes(session, &candidate)?
                .to_string(),
            Command::Winners { session } => join(self.registry.winners(session)?),
            Command::Candidates { session } => join(self.registry.candidates(session)?),
            Command::Phase { session } => self.registry.phase(session)?.to_string(),
            Command::Show { session } => {
                let view = self.registry.session(session)?;
                serde_json::to_string(&view)
                    .map_err(|e| DaemonError::Serialization(e.to_string()))?
            }
            Command::Sessions => join(self.registry.session_ids()),
            Command::Advance { secs } => {
                self.clock.advance(secs)?;
                format!("now {}", self.clock.now())
            }
            Command::Now => self.clock.now().to_string(),
        };
        Ok(output)
    }
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
