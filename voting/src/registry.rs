//! Session registry: owns every voting session and dispatches calls to them.
//!
//! Each session sits behind its own `RwLock`, so mutations on one session are
//! serialized while different sessions proceed independently. The registry's
//! own lock only guards the id → session map and is held just long enough to
//! look a session up or insert a new one.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use agora_types::{AccountId, SessionId, SessionPhase};
use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::VotingError;
use crate::params::VotingParams;
use crate::session::{SessionView, VotingSession};

type SessionHandle = Arc<RwLock<VotingSession>>;

// Every mutation validates before it writes, so a panic while a lock is held
// cannot leave a half-applied change behind; poisoned locks are safe to reuse.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

struct RegistryInner {
    next_id: SessionId,
    sessions: HashMap<SessionId, SessionHandle>,
}

/// Owns all voting sessions and allocates their identifiers.
///
/// Identifiers are sequential and never reused. Sessions are never removed:
/// closed sessions stay queryable as the audit record of their vote.
pub struct SessionRegistry {
    params: VotingParams,
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new(params: VotingParams) -> Self {
        Self {
            params,
            inner: RwLock::new(RegistryInner {
                next_id: SessionId::FIRST,
                sessions: HashMap::new(),
            }),
        }
    }

    /// The time windows applied to every session.
    pub fn params(&self) -> &VotingParams {
        &self.params
    }

    fn handle(&self, id: SessionId) -> Result<SessionHandle, VotingError> {
        read(&self.inner)
            .sessions
            .get(&id)
            .cloned()
            .ok_or(VotingError::InvalidSession(id))
    }

    fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&VotingSession) -> R,
    ) -> Result<R, VotingError> {
        let handle = self.handle(id)?;
        let session = read(&handle);
        Ok(f(&session))
    }

    fn with_session_mut<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut VotingSession) -> Result<R, VotingError>,
    ) -> Result<R, VotingError> {
        let handle = self.handle(id)?;
        let mut session = write(&handle);
        f(&mut session)
    }

    // ── Commands ─────────────────────────────────────────────────────────

    /// Allocate a new session in the Created phase.
    ///
    /// Fails only once the id space is used up; the last id is never handed
    /// out, so no id is ever reused.
    pub fn create_session(&self, ctx: &CallContext) -> Result<SessionId, VotingError> {
        let mut inner = write(&self.inner);
        let id = inner.next_id;
        let Some(next_id) = id.next() else {
            tracing::warn!(caller = %ctx.caller, "session ids exhausted");
            return Err(VotingError::SessionIdsExhausted(id));
        };
        inner.next_id = next_id;
        inner
            .sessions
            .insert(id, Arc::new(RwLock::new(VotingSession::new(id, ctx.now))));
        tracing::info!(session = %id, caller = %ctx.caller, now = %ctx.now, "session created");
        Ok(id)
    }

    /// Nominate `candidate` for a session that is still Created.
    ///
    /// Any caller may nominate any account, including itself.
    pub fn add_candidate(
        &self,
        ctx: &CallContext,
        id: SessionId,
        candidate: AccountId,
    ) -> Result<(), VotingError> {
        let nominee = candidate.clone();
        self.with_session_mut(id, |session| session.add_candidate(candidate))
            .inspect(|_| {
                tracing::debug!(session = %id, caller = %ctx.caller, candidate = %nominee, "candidate registered");
            })
            .inspect_err(|e| {
                tracing::debug!(session = %id, caller = %ctx.caller, candidate = %nominee, error = %e, "add_candidate rejected");
            })
    }

    /// Open a session for voting once its registration window has elapsed.
    pub fn open_session(&self, ctx: &CallContext, id: SessionId) -> Result<(), VotingError> {
        self.with_session_mut(id, |session| session.open(ctx.now, &self.params))
            .inspect(|_| {
                tracing::info!(session = %id, caller = %ctx.caller, now = %ctx.now, "session opened");
            })
            .inspect_err(|e| {
                tracing::debug!(session = %id, caller = %ctx.caller, error = %e, "open_session rejected");
            })
    }

    /// Cast the caller's single vote in a session.
    pub fn cast_vote(
        &self,
        ctx: &CallContext,
        id: SessionId,
        candidate: &AccountId,
    ) -> Result<(), VotingError> {
        self.with_session_mut(id, |session| session.cast_vote(&ctx.caller, candidate))
            .inspect(|_| {
                tracing::debug!(session = %id, voter = %ctx.caller, candidate = %candidate, "vote recorded");
            })
            .inspect_err(|e| {
                tracing::debug!(session = %id, voter = %ctx.caller, candidate = %candidate, error = %e, "cast_vote rejected");
            })
    }

    /// Close a session once its voting duration has elapsed. Terminal.
    pub fn close_session(&self, ctx: &CallContext, id: SessionId) -> Result<(), VotingError> {
        self.with_session_mut(id, |session| {
            session.close(ctx.now, &self.params)?;
            Ok(session.total_votes())
        })
        .map(|total_votes| {
            tracing::info!(session = %id, caller = %ctx.caller, now = %ctx.now, total_votes, "session closed");
        })
        .inspect_err(|e| {
            tracing::debug!(session = %id, caller = %ctx.caller, error = %e, "close_session rejected");
        })
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Votes received by `candidate` in a session, in any phase.
    pub fn number_of_votes(
        &self,
        id: SessionId,
        candidate: &AccountId,
    ) -> Result<u64, VotingError> {
        self.with_session(id, |session| session.number_of_votes(candidate))
    }

    /// All candidates tied at the maximum tally.
    ///
    /// The result is final only once the session is Closed; for an Open
    /// session it is a live snapshot.
    pub fn winners(&self, id: SessionId) -> Result<BTreeSet<AccountId>, VotingError> {
        self.with_session(id, VotingSession::winners)
    }

    /// Registered candidates in nomination order.
    pub fn candidates(&self, id: SessionId) -> Result<Vec<AccountId>, VotingError> {
        self.with_session(id, |session| session.candidates().to_vec())
    }

    pub fn phase(&self, id: SessionId) -> Result<SessionPhase, VotingError> {
        self.with_session(id, VotingSession::phase)
    }

    pub fn has_voted(&self, id: SessionId, account: &AccountId) -> Result<bool, VotingError> {
        self.with_session(id, |session| session.has_voted(account))
    }

    pub fn total_votes(&self, id: SessionId) -> Result<u64, VotingError> {
        self.with_session(id, VotingSession::total_votes)
    }

    /// Consistent read-only snapshot of one session.
    pub fn session(&self, id: SessionId) -> Result<SessionView, VotingError> {
        self.with_session(id, |session| session.view(&self.params))
    }

    /// Every allocated session id, ascending.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = read(&self.inner).sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        read(&self.inner).sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(VotingParams::default())
    }
}

/// Serializable image of the whole registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub next_id: SessionId,
    pub sessions: Vec<VotingSession>,
}

impl SessionRegistry {
    /// Capture every session. Each session is copied under its own lock, so
    /// every copy is internally consistent.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = read(&self.inner);
        let mut sessions: Vec<VotingSession> = inner
            .sessions
            .values()
            .map(|handle| read(handle).clone())
            .collect();
        sessions.sort_by_key(VotingSession::id);
        RegistrySnapshot {
            next_id: inner.next_id,
            sessions,
        }
    }

    /// Rebuild a registry from a snapshot, rejecting inconsistent data.
    pub fn from_snapshot(
        snapshot: RegistrySnapshot,
        params: VotingParams,
    ) -> Result<Self, VotingError> {
        let mut sessions = HashMap::with_capacity(snapshot.sessions.len());
        for session in snapshot.sessions {
            let id = session.id();
            if id >= snapshot.next_id {
                return Err(VotingError::Snapshot(format!(
                    "session {id} is not below next id {}",
                    snapshot.next_id
                )));
            }
            session.check_invariants().map_err(VotingError::Snapshot)?;
            if sessions
                .insert(id, Arc::new(RwLock::new(session)))
                .is_some()
            {
                return Err(VotingError::Snapshot(format!("duplicate session {id}")));
            }
        }
        Ok(Self {
            params,
            inner: RwLock::new(RegistryInner {
                next_id: snapshot.next_id,
                sessions,
            }),
        })
    }

    /// Serialize the registry to bytes for persistence.
    pub fn save_state(&self) -> Result<Vec<u8>, VotingError> {
        bincode::serialize(&self.snapshot()).map_err(|e| VotingError::Snapshot(e.to_string()))
    }

    /// Restore a registry from bytes produced by [`save_state`](Self::save_state).
    pub fn load_state(data: &[u8], params: VotingParams) -> Result<Self, VotingError> {
        let snapshot: RegistrySnapshot =
            bincode::deserialize(data).map_err(|e| VotingError::Snapshot(e.to_string()))?;
        let registry = Self::from_snapshot(snapshot, params)?;
        tracing::info!(sessions = registry.len(), "registry restored from snapshot");
        Ok(registry)
    }
}
