#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use agora_types::{AccountId, SessionId, Timestamp};
use agora_voting::{CallContext, SessionRegistry, VotingParams};

#[derive(Debug, Arbitrary)]
enum Op {
    Create,
    Nominate { session: u8, candidate: u8 },
    Open { session: u8 },
    Vote { session: u8, voter: u8, candidate: u8 },
    Close { session: u8 },
    Advance { secs: u16 },
}

fuzz_target!(|input: (u8, u8, Vec<Op>)| {
    let (registration, voting, ops) = input;
    let registry = SessionRegistry::new(VotingParams::new(registration as u64, voting as u64));
    let mut now = 0u64;

    for op in ops {
        let stamp = Timestamp::new(now);
        let ctx = move |caller: u8| CallContext::new(AccountId::new(format!("acct{caller}")), stamp);
        match op {
            Op::Create => {
                let _ = registry.create_session(&ctx(0));
            }
            Op::Nominate { session, candidate } => {
                let _ = registry.add_candidate(
                    &ctx(0),
                    SessionId::new(session as u64),
                    AccountId::new(format!("cand{candidate}")),
                );
            }
            Op::Open { session } => {
                let _ = registry.open_session(&ctx(0), SessionId::new(session as u64));
            }
            Op::Vote { session, voter, candidate } => {
                let _ = registry.cast_vote(
                    &ctx(voter),
                    SessionId::new(session as u64),
                    &AccountId::new(format!("cand{candidate}")),
                );
            }
            Op::Close { session } => {
                let _ = registry.close_session(&ctx(0), SessionId::new(session as u64));
            }
            Op::Advance { secs } => now += secs as u64,
        }
    }

    // Every session keeps tallies and voters in lockstep.
    for id in registry.session_ids() {
        let view = registry.session(id).expect("listed session exists");
        let total: u64 = view.tallies.iter().map(|t| t.votes).sum();
        assert_eq!(total, view.voter_count);
        if total > 0 {
            assert!(!registry.winners(id).expect("listed session exists").is_empty());
        }
    }
});
