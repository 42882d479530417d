//! A single voting session and its lifecycle.

use std::collections::{BTreeSet, HashMap, HashSet};

use agora_types::{AccountId, SessionId, SessionPhase, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::VotingError;
use crate::params::VotingParams;

/// Phase plus the timestamps recorded when entering it.
///
/// `opened_at` exists exactly when the session has been opened, `closed_at`
/// exactly when it has been closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum Lifecycle {
    Created,
    Open {
        opened_at: Timestamp,
    },
    Closed {
        opened_at: Timestamp,
        closed_at: Timestamp,
    },
}

impl Lifecycle {
    fn phase(&self) -> SessionPhase {
        match self {
            Self::Created => SessionPhase::Created,
            Self::Open { .. } => SessionPhase::Open,
            Self::Closed { .. } => SessionPhase::Closed,
        }
    }
}

/// One independently tallied voting instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VotingSession {
    id: SessionId,
    created_at: Timestamp,
    lifecycle: Lifecycle,
    /// Registered candidates in nomination order.
    candidates: Vec<AccountId>,
    /// Vote count per candidate. Keys are exactly `candidates`.
    tallies: HashMap<AccountId, u64>,
    /// Accounts that have cast their vote.
    voters: HashSet<AccountId>,
}

impl VotingSession {
    pub fn new(id: SessionId, created_at: Timestamp) -> Self {
        Self {
            id,
            created_at,
            lifecycle: Lifecycle::Created,
            candidates: Vec::new(),
            tallies: HashMap::new(),
            voters: HashSet::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.lifecycle.phase()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn opened_at(&self) -> Option<Timestamp> {
        match self.lifecycle {
            Lifecycle::Created => None,
            Lifecycle::Open { opened_at } | Lifecycle::Closed { opened_at, .. } => Some(opened_at),
        }
    }

    pub fn closed_at(&self) -> Option<Timestamp> {
        match self.lifecycle {
            Lifecycle::Closed { closed_at, .. } => Some(closed_at),
            _ => None,
        }
    }

    /// Fails with `WrongPhase` unless `allows` holds for the current phase.
    fn require_phase(
        &self,
        allows: fn(&SessionPhase) -> bool,
        expected: SessionPhase,
    ) -> Result<(), VotingError> {
        let actual = self.phase();
        if !allows(&actual) {
            return Err(VotingError::WrongPhase { expected, actual });
        }
        Ok(())
    }

    /// Register a candidate. Only allowed while the session is Created.
    pub fn add_candidate(&mut self, candidate: AccountId) -> Result<(), VotingError> {
        self.require_phase(SessionPhase::accepts_candidates, SessionPhase::Created)?;
        if self.tallies.contains_key(&candidate) {
            return Err(VotingError::DuplicateCandidate(candidate));
        }
        self.tallies.insert(candidate.clone(), 0);
        self.candidates.push(candidate);
        Ok(())
    }

    /// Move Created → Open once the registration window has elapsed.
    pub fn open(&mut self, now: Timestamp, params: &VotingParams) -> Result<(), VotingError> {
        self.require_phase(SessionPhase::accepts_candidates, SessionPhase::Created)?;
        let elapsed = self.created_at.elapsed_since(now);
        if !self.created_at.has_expired(params.registration_window_secs, now) {
            return Err(VotingError::TimeWindowNotElapsed {
                elapsed,
                required: params.registration_window_secs,
            });
        }
        self.lifecycle = Lifecycle::Open { opened_at: now };
        Ok(())
    }

    /// Record `voter`'s vote for `candidate`.
    ///
    /// All checks run before anything is written, so a rejected vote leaves
    /// both the voter set and the tallies untouched.
    pub fn cast_vote(
        &mut self,
        voter: &AccountId,
        candidate: &AccountId,
    ) -> Result<(), VotingError> {
        self.require_phase(SessionPhase::accepts_votes, SessionPhase::Open)?;
        if !self.tallies.contains_key(candidate) {
            return Err(VotingError::UnknownCandidate(candidate.clone()));
        }
        if self.voters.contains(voter) {
            return Err(VotingError::AlreadyVoted(voter.clone()));
        }

        self.voters.insert(voter.clone());
        if let Some(count) = self.tallies.get_mut(candidate) {
            *count += 1;
        }
        Ok(())
    }

    /// Move Open → Closed once the voting duration has elapsed.
    pub fn close(&mut self, now: Timestamp, params: &VotingParams) -> Result<(), VotingError> {
        let opened_at = match self.lifecycle {
            Lifecycle::Open { opened_at } => opened_at,
            _ => {
                return Err(VotingError::WrongPhase {
                    expected: SessionPhase::Open,
                    actual: self.phase(),
                })
            }
        };
        if !opened_at.has_expired(params.voting_duration_secs, now) {
            return Err(VotingError::TimeWindowNotElapsed {
                elapsed: opened_at.elapsed_since(now),
                required: params.voting_duration_secs,
            });
        }
        self.lifecycle = Lifecycle::Closed {
            opened_at,
            closed_at: now,
        };
        Ok(())
    }

    /// Votes received by `candidate`. Zero for candidates without votes and
    /// for accounts that were never nominated.
    pub fn number_of_votes(&self, candidate: &AccountId) -> u64 {
        self.tallies.get(candidate).copied().unwrap_or(0)
    }

    /// Every candidate whose tally equals the maximum tally.
    ///
    /// Before any vote is cast every candidate sits at zero and all of them
    /// are returned. Only final once the session is Closed.
    pub fn winners(&self) -> BTreeSet<AccountId> {
        let max_votes = self.tallies.values().copied().max().unwrap_or(0);
        self.tallies
            .iter()
            .filter(|(_, votes)| **votes == max_votes)
            .map(|(candidate, _)| candidate.clone())
            .collect()
    }

    pub fn candidates(&self) -> &[AccountId] {
        &self.candidates
    }

    pub fn has_voted(&self, account: &AccountId) -> bool {
        self.voters.contains(account)
    }

    pub fn voter_count(&self) -> u64 {
        self.voters.len() as u64
    }

    /// Sum of all tallies.
    pub fn total_votes(&self) -> u64 {
        self.tallies
            .values()
            .fold(0u64, |total, votes| total.saturating_add(*votes))
    }

    /// Check the structural invariants of a session restored from a snapshot.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let distinct: HashSet<&AccountId> = self.candidates.iter().collect();
        if distinct.len() != self.candidates.len() {
            return Err(format!("session {}: candidate listed twice", self.id));
        }
        if self.candidates.len() != self.tallies.len()
            || !self.candidates.iter().all(|c| self.tallies.contains_key(c))
        {
            return Err(format!(
                "session {}: candidate list and tallies disagree",
                self.id
            ));
        }
        if self.total_votes() != self.voter_count() {
            return Err(format!(
                "session {}: {} votes tallied but {} voters recorded",
                self.id,
                self.total_votes(),
                self.voter_count()
            ));
        }
        if self.phase() == SessionPhase::Created && !self.voters.is_empty() {
            return Err(format!("session {}: votes recorded before opening", self.id));
        }
        match self.lifecycle {
            Lifecycle::Open { opened_at } if opened_at < self.created_at => {
                Err(format!("session {}: opened before it was created", self.id))
            }
            Lifecycle::Closed {
                opened_at,
                closed_at,
            } if opened_at < self.created_at || closed_at < opened_at => {
                Err(format!("session {}: timestamps out of order", self.id))
            }
            _ => Ok(()),
        }
    }

    /// Read-only snapshot of the session.
    pub fn view(&self, params: &VotingParams) -> SessionView {
        let (opens_at, closes_at) = match self.lifecycle {
            Lifecycle::Created => (Some(params.opens_at(self.created_at)), None),
            Lifecycle::Open { opened_at } => (None, Some(params.closes_at(opened_at))),
            Lifecycle::Closed { .. } => (None, None),
        };
        SessionView {
            id: self.id,
            phase: self.phase(),
            created_at: self.created_at,
            opened_at: self.opened_at(),
            closed_at: self.closed_at(),
            opens_at,
            closes_at,
            tallies: self
                .candidates
                .iter()
                .map(|c| CandidateTally {
                    candidate: c.clone(),
                    votes: self.number_of_votes(c),
                })
                .collect(),
            voter_count: self.voter_count(),
        }
    }
}

/// Votes received by one candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate: AccountId,
    pub votes: u64,
}

/// Consistent, detached copy of a session's observable state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub phase: SessionPhase,
    pub created_at: Timestamp,
    pub opened_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    /// Earliest time the session may be opened (Created only).
    pub opens_at: Option<Timestamp>,
    /// Earliest time the session may be closed (Open only).
    pub closes_at: Option<Timestamp>,
    /// Tallies in nomination order.
    pub tallies: Vec<CandidateTally>,
    pub voter_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> AccountId {
        AccountId::from(name)
    }

    fn params() -> VotingParams {
        VotingParams::new(121, 121)
    }

    fn open_session(candidates: &[&str]) -> VotingSession {
        let mut session = VotingSession::new(SessionId::FIRST, Timestamp::new(1000));
        for c in candidates {
            session.add_candidate(account(c)).unwrap();
        }
        session.open(Timestamp::new(1121), &params()).unwrap();
        session
    }

    // ── Candidate registration ───────────────────────────────────────────

    #[test]
    fn candidates_keep_nomination_order() {
        let mut session = VotingSession::new(SessionId::FIRST, Timestamp::EPOCH);
        for name in ["carol", "alice", "bob"] {
            session.add_candidate(account(name)).unwrap();
        }
        assert_eq!(
            session.candidates(),
            &[account("carol"), account("alice"), account("bob")]
        );
    }

    #[test]
    fn duplicate_candidate_rejected() {
        let mut session = VotingSession::new(SessionId::FIRST, Timestamp::EPOCH);
        session.add_candidate(account("alice")).unwrap();
        assert_eq!(
            session.add_candidate(account("alice")),
            Err(VotingError::DuplicateCandidate(account("alice")))
        );
        assert_eq!(session.candidates().len(), 1);
    }

    #[test]
    fn candidates_frozen_after_open() {
        let mut session = open_session(&["alice"]);
        assert_eq!(
            session.add_candidate(account("bob")),
            Err(VotingError::WrongPhase {
                expected: SessionPhase::Created,
                actual: SessionPhase::Open,
            })
        );
        assert_eq!(session.candidates(), &[account("alice")]);
    }

    // ── Phase transitions ────────────────────────────────────────────────

    #[test]
    fn open_requires_registration_window() {
        let mut session = VotingSession::new(SessionId::FIRST, Timestamp::new(1000));
        assert_eq!(
            session.open(Timestamp::new(1120), &params()),
            Err(VotingError::TimeWindowNotElapsed {
                elapsed: 120,
                required: 121,
            })
        );
        assert_eq!(session.phase(), SessionPhase::Created);
        assert_eq!(session.opened_at(), None);

        session.open(Timestamp::new(1121), &params()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Open);
        assert_eq!(session.opened_at(), Some(Timestamp::new(1121)));
    }

    #[test]
    fn open_twice_is_wrong_phase() {
        let mut session = open_session(&["alice"]);
        assert!(matches!(
            session.open(Timestamp::new(5000), &params()),
            Err(VotingError::WrongPhase { .. })
        ));
        assert_eq!(session.opened_at(), Some(Timestamp::new(1121)));
    }

    #[test]
    fn close_requires_voting_duration() {
        let mut session = open_session(&["alice"]);
        assert_eq!(
            session.close(Timestamp::new(1200), &params()),
            Err(VotingError::TimeWindowNotElapsed {
                elapsed: 79,
                required: 121,
            })
        );
        assert_eq!(session.phase(), SessionPhase::Open);

        session.close(Timestamp::new(1242), &params()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Closed);
        assert_eq!(session.opened_at(), Some(Timestamp::new(1121)));
        assert_eq!(session.closed_at(), Some(Timestamp::new(1242)));
    }

    #[test]
    fn close_before_open_is_wrong_phase() {
        let mut session = VotingSession::new(SessionId::FIRST, Timestamp::EPOCH);
        assert_eq!(
            session.close(Timestamp::new(10_000), &params()),
            Err(VotingError::WrongPhase {
                expected: SessionPhase::Open,
                actual: SessionPhase::Created,
            })
        );
    }

    #[test]
    fn closed_is_terminal() {
        let mut session = open_session(&["alice"]);
        session.close(Timestamp::new(2000), &params()).unwrap();
        assert!(session.open(Timestamp::new(3000), &params()).is_err());
        assert!(session.close(Timestamp::new(3000), &params()).is_err());
        assert!(session.add_candidate(account("bob")).is_err());
        assert_eq!(session.closed_at(), Some(Timestamp::new(2000)));
    }

    // ── Voting ───────────────────────────────────────────────────────────

    #[test]
    fn vote_before_open_is_wrong_phase() {
        let mut session = VotingSession::new(SessionId::FIRST, Timestamp::EPOCH);
        session.add_candidate(account("alice")).unwrap();
        assert!(matches!(
            session.cast_vote(&account("v1"), &account("alice")),
            Err(VotingError::WrongPhase { .. })
        ));
        assert_eq!(session.total_votes(), 0);
    }

    #[test]
    fn vote_for_unknown_candidate_rejected() {
        let mut session = open_session(&["alice"]);
        assert_eq!(
            session.cast_vote(&account("v1"), &account("mallory")),
            Err(VotingError::UnknownCandidate(account("mallory")))
        );
        assert!(!session.has_voted(&account("v1")));
    }

    #[test]
    fn second_vote_rejected_and_tally_moves_once() {
        let mut session = open_session(&["alice", "bob"]);
        session.cast_vote(&account("v1"), &account("alice")).unwrap();
        assert_eq!(
            session.cast_vote(&account("v1"), &account("bob")),
            Err(VotingError::AlreadyVoted(account("v1")))
        );
        assert_eq!(session.number_of_votes(&account("alice")), 1);
        assert_eq!(session.number_of_votes(&account("bob")), 0);
        assert_eq!(session.total_votes(), session.voter_count());
    }

    #[test]
    fn candidate_may_vote() {
        let mut session = open_session(&["alice", "bob"]);
        session.cast_vote(&account("alice"), &account("alice")).unwrap();
        assert_eq!(session.number_of_votes(&account("alice")), 1);
    }

    #[test]
    fn unknown_account_has_zero_votes() {
        let session = open_session(&["alice"]);
        assert_eq!(session.number_of_votes(&account("nobody")), 0);
    }

    // ── Winners ──────────────────────────────────────────────────────────

    #[test]
    fn single_winner() {
        let mut session = open_session(&["alice", "bob"]);
        session.cast_vote(&account("v1"), &account("bob")).unwrap();
        session.cast_vote(&account("v2"), &account("bob")).unwrap();
        session.cast_vote(&account("v3"), &account("alice")).unwrap();
        assert_eq!(session.winners(), BTreeSet::from([account("bob")]));
    }

    #[test]
    fn tie_returns_every_leader() {
        let mut session = open_session(&["a", "b", "c"]);
        for (voter, choice) in [("v1", "c"), ("v2", "a"), ("v3", "a"), ("v4", "b"), ("v5", "b")] {
            session.cast_vote(&account(voter), &account(choice)).unwrap();
        }
        assert_eq!(session.winners(), BTreeSet::from([account("a"), account("b")]));
    }

    #[test]
    fn no_votes_means_everyone_ties_at_zero() {
        let session = open_session(&["a", "b"]);
        assert_eq!(session.winners(), BTreeSet::from([account("a"), account("b")]));
    }

    #[test]
    fn no_candidates_means_no_winners() {
        let session = VotingSession::new(SessionId::FIRST, Timestamp::EPOCH);
        assert!(session.winners().is_empty());
    }

    // ── View / invariants ────────────────────────────────────────────────

    #[test]
    fn view_reports_next_deadline() {
        let mut session = VotingSession::new(SessionId::FIRST, Timestamp::new(1000));
        session.add_candidate(account("alice")).unwrap();
        let view = session.view(&params());
        assert_eq!(view.opens_at, Some(Timestamp::new(1121)));
        assert_eq!(view.closes_at, None);

        session.open(Timestamp::new(1500), &params()).unwrap();
        let view = session.view(&params());
        assert_eq!(view.opens_at, None);
        assert_eq!(view.closes_at, Some(Timestamp::new(1621)));
        assert_eq!(
            view.tallies,
            vec![CandidateTally {
                candidate: account("alice"),
                votes: 0
            }]
        );
    }

    #[test]
    fn tampered_session_fails_invariant_check() {
        let mut session = open_session(&["alice"]);
        session.cast_vote(&account("v1"), &account("alice")).unwrap();
        assert!(session.check_invariants().is_ok());

        session.voters.insert(account("ghost"));
        assert!(session.check_invariants().is_err());
    }

    #[test]
    fn repeated_candidate_fails_invariant_check() {
        let mut session = open_session(&["a", "b"]);
        session.candidates = vec![account("a"), account("a")];
        let err = session.check_invariants().unwrap_err();
        assert!(err.contains("listed twice"), "{err}");
    }
}
