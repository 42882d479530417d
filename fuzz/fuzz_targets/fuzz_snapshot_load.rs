#![no_main]

use libfuzzer_sys::fuzz_target;

use agora_types::Timestamp;
use agora_voting::{CallContext, SessionRegistry, VotingParams};

fuzz_target!(|data: &[u8]| {
    // Restoring arbitrary bytes must either fail cleanly or yield a registry
    // whose sessions all satisfy the tally/voter invariant.
    let Ok(registry) = SessionRegistry::load_state(data, VotingParams::default()) else {
        return;
    };
    let ids = registry.session_ids();
    for &id in &ids {
        let view = registry.session(id).expect("listed session exists");
        let total = view
            .tallies
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.votes));
        assert_eq!(total, view.voter_count);
        let candidates = registry.candidates(id).expect("listed session exists");
        let winners = registry.winners(id).expect("listed session exists");
        assert!(winners.iter().all(|w| candidates.contains(w)));
    }

    // A restored registry never hands out an id it already holds.
    if let Ok(id) = registry.create_session(&CallContext::new("fuzz", Timestamp::EPOCH)) {
        assert!(!ids.contains(&id));
        assert_eq!(registry.len(), ids.len() + 1);
    }
});
