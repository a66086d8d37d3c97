//! Optimistic reaction reconciliation.
//!
//! A reaction toggle is applied to local state immediately, then
//! confirmed with the service. On failure the exact prior collection
//! is restored from a snapshot; the service is the source of truth,
//! so nothing is ever merged with whatever state existed at failure
//! time. While a toggle for a symbol is in flight, further toggles of
//! that same symbol are refused; other symbols stay independent.

use std::collections::HashSet;

use shako_types::Reaction;

use crate::api::{ApiClient, ApiResult};

/// Toggle `user`'s reaction with `symbol` in a reaction collection.
///
/// Pure: returns the next collection, leaving the input untouched.
/// Removing the last reactor drops the symbol's entry entirely, and
/// `count` is always recomputed from the reactor list.
pub fn toggle(reactions: &[Reaction], user: &str, symbol: &str) -> Vec<Reaction> {
    let user_has_reacted = reactions
        .iter()
        .find(|r| r.symbol == symbol)
        .map(|r| r.reactors.iter().any(|name| name == user))
        .unwrap_or(false);

    if user_has_reacted {
        reactions
            .iter()
            .filter_map(|r| {
                if r.symbol != symbol {
                    return Some(r.clone());
                }
                let reactors: Vec<String> = r
                    .reactors
                    .iter()
                    .filter(|name| name.as_str() != user)
                    .cloned()
                    .collect();
                if reactors.is_empty() {
                    None
                } else {
                    Some(Reaction {
                        symbol: r.symbol.clone(),
                        count: reactors.len() as i64,
                        reactors,
                    })
                }
            })
            .collect()
    } else if reactions.iter().any(|r| r.symbol == symbol) {
        reactions
            .iter()
            .map(|r| {
                if r.symbol != symbol {
                    return r.clone();
                }
                let mut reactors = r.reactors.clone();
                reactors.push(user.to_string());
                Reaction {
                    symbol: r.symbol.clone(),
                    count: reactors.len() as i64,
                    reactors,
                }
            })
            .collect()
    } else {
        let mut next: Vec<Reaction> = reactions.to_vec();
        next.push(Reaction {
            symbol: symbol.to_string(),
            count: 1,
            reactors: vec![user.to_string()],
        });
        next
    }
}

/// Snapshot of the collection taken before an optimistic toggle.
/// Consumed by exactly one of [`ReactionPanel::settle_ok`] or
/// [`ReactionPanel::settle_err`].
#[derive(Debug)]
pub struct ToggleSnapshot {
    symbol: String,
    prior: Vec<Reaction>,
}

/// Result of attempting an optimistic toggle.
#[derive(Debug)]
pub enum ToggleOutcome {
    /// The optimistic value was applied; send the request, then
    /// settle with the snapshot.
    Applied(ToggleSnapshot),
    /// A toggle for this symbol is still in flight; nothing changed.
    Busy,
}

/// Per-post reaction state: the current (optimistically updated)
/// collection plus the set of symbols with an unsettled request.
///
/// State machine per symbol: Idle -> Pending on `begin_toggle`, then
/// back to Idle via `settle_ok` (optimistic value kept) or
/// `settle_err` (snapshot restored).
#[derive(Debug, Default)]
pub struct ReactionPanel {
    reactions: Vec<Reaction>,
    in_flight: HashSet<String>,
}

impl ReactionPanel {
    /// Build a panel from a service-provided collection, sanitizing
    /// each entry at the boundary.
    pub fn new(reactions: Vec<Reaction>) -> Self {
        Self {
            reactions: reactions.into_iter().map(Reaction::normalize).collect(),
            in_flight: HashSet::new(),
        }
    }

    /// The current collection, optimistic values included.
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Whether a toggle for `symbol` is awaiting confirmation.
    pub fn is_pending(&self, symbol: &str) -> bool {
        self.in_flight.contains(symbol)
    }

    /// Replace the collection wholesale, e.g. after a refetch. Stale
    /// responses overwrite optimistic state last-write-wins.
    pub fn reset(&mut self, reactions: Vec<Reaction>) {
        self.reactions = reactions.into_iter().map(Reaction::normalize).collect();
    }

    /// Apply `user`'s toggle of `symbol` optimistically.
    ///
    /// Refuses the toggle while a request for the same symbol is
    /// unsettled. Otherwise snapshots the prior collection, applies
    /// the toggle and marks the symbol pending.
    pub fn begin_toggle(&mut self, user: &str, symbol: &str) -> ToggleOutcome {
        if self.in_flight.contains(symbol) {
            return ToggleOutcome::Busy;
        }
        let prior = self.reactions.clone();
        self.reactions = toggle(&self.reactions, user, symbol);
        self.in_flight.insert(symbol.to_string());
        ToggleOutcome::Applied(ToggleSnapshot {
            symbol: symbol.to_string(),
            prior,
        })
    }

    /// The service confirmed the toggle: keep the optimistic value.
    pub fn settle_ok(&mut self, snapshot: ToggleSnapshot) {
        self.in_flight.remove(&snapshot.symbol);
    }

    /// The service rejected the toggle: restore the snapshot exactly.
    pub fn settle_err(&mut self, snapshot: ToggleSnapshot) {
        self.in_flight.remove(&snapshot.symbol);
        self.reactions = snapshot.prior;
    }

    /// Full optimistic round trip against the service.
    ///
    /// Returns `Ok(true)` when the toggle was applied and confirmed,
    /// `Ok(false)` when it was refused because the symbol is still
    /// pending, and the service error after rolling back on failure.
    /// No retry is attempted; the caller re-triggers the action.
    pub async fn toggle_remote(
        &mut self,
        api: &ApiClient,
        post_id: &str,
        user: &str,
        symbol: &str,
    ) -> ApiResult<bool> {
        let snapshot = match self.begin_toggle(user, symbol) {
            ToggleOutcome::Applied(snapshot) => snapshot,
            ToggleOutcome::Busy => return Ok(false),
        };
        match api.react(post_id, symbol).await {
            Ok(()) => {
                self.settle_ok(snapshot);
                Ok(true)
            }
            Err(err) => {
                log::warn!("reaction toggle on post {post_id} rejected, rolling back: {err}");
                self.settle_err(snapshot);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(symbol: &str, reactors: &[&str]) -> Reaction {
        Reaction {
            symbol: symbol.to_string(),
            count: reactors.len() as i64,
            reactors: reactors.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn counts_consistent(reactions: &[Reaction]) -> bool {
        reactions
            .iter()
            .all(|r| r.count == r.reactors.len() as i64)
    }

    #[test]
    fn first_reaction_creates_entry() {
        let next = toggle(&[], "alice", "👍");
        assert_eq!(next, vec![reaction("👍", &["alice"])]);
    }

    #[test]
    fn toggling_own_only_reaction_removes_entry() {
        let current = vec![reaction("👍", &["alice"])];
        let next = toggle(&current, "alice", "👍");
        assert!(next.is_empty());
    }

    #[test]
    fn joining_existing_reaction_appends_reactor() {
        let current = vec![reaction("🔥", &["bob"])];
        let next = toggle(&current, "alice", "🔥");
        assert_eq!(next, vec![reaction("🔥", &["bob", "alice"])]);
    }

    #[test]
    fn leaving_shared_reaction_keeps_entry() {
        let current = vec![reaction("🔥", &["bob", "alice", "carol"])];
        let next = toggle(&current, "alice", "🔥");
        assert_eq!(next, vec![reaction("🔥", &["bob", "carol"])]);
    }

    #[test]
    fn other_symbols_are_untouched() {
        let current = vec![reaction("👍", &["bob"]), reaction("❤️", &["alice"])];
        let next = toggle(&current, "alice", "👍");
        assert_eq!(
            next,
            vec![reaction("👍", &["bob", "alice"]), reaction("❤️", &["alice"])]
        );
    }

    #[test]
    fn double_toggle_round_trips() {
        let current = vec![reaction("👍", &["bob"]), reaction("❤️", &["alice"])];
        let once = toggle(&current, "carol", "👍");
        let twice = toggle(&once, "carol", "👍");
        assert_eq!(twice, current);
    }

    #[test]
    fn counts_track_reactor_lists() {
        let mut state = vec![reaction("👍", &["bob"])];
        for (user, symbol) in [
            ("alice", "👍"),
            ("alice", "❤️"),
            ("bob", "👍"),
            ("alice", "👍"),
        ] {
            state = toggle(&state, user, symbol);
            assert!(counts_consistent(&state));
        }
    }

    #[test]
    fn panel_rollback_restores_exact_prior_state() {
        let initial = vec![reaction("👍", &["bob"]), reaction("❤️", &["alice"])];
        let mut panel = ReactionPanel::new(initial.clone());

        let snapshot = match panel.begin_toggle("carol", "👍") {
            ToggleOutcome::Applied(s) => s,
            ToggleOutcome::Busy => panic!("nothing should be pending"),
        };
        assert_ne!(panel.reactions(), initial.as_slice());

        panel.settle_err(snapshot);
        assert_eq!(panel.reactions(), initial.as_slice());
        assert!(!panel.is_pending("👍"));
    }

    #[test]
    fn panel_success_keeps_optimistic_value() {
        let mut panel = ReactionPanel::new(vec![]);
        let snapshot = match panel.begin_toggle("alice", "👍") {
            ToggleOutcome::Applied(s) => s,
            ToggleOutcome::Busy => panic!("nothing should be pending"),
        };
        panel.settle_ok(snapshot);
        assert_eq!(panel.reactions(), &[reaction("👍", &["alice"])]);
        assert!(!panel.is_pending("👍"));
    }

    #[test]
    fn pending_symbol_refuses_second_toggle() {
        let mut panel = ReactionPanel::new(vec![]);
        let snapshot = match panel.begin_toggle("alice", "👍") {
            ToggleOutcome::Applied(s) => s,
            ToggleOutcome::Busy => panic!("nothing should be pending"),
        };
        assert!(panel.is_pending("👍"));
        assert!(matches!(
            panel.begin_toggle("alice", "👍"),
            ToggleOutcome::Busy
        ));
        // The refused toggle left the optimistic state untouched.
        assert_eq!(panel.reactions(), &[reaction("👍", &["alice"])]);
        panel.settle_ok(snapshot);
    }

    #[test]
    fn distinct_symbols_toggle_independently_while_pending() {
        let mut panel = ReactionPanel::new(vec![]);
        let first = match panel.begin_toggle("alice", "👍") {
            ToggleOutcome::Applied(s) => s,
            ToggleOutcome::Busy => panic!("nothing should be pending"),
        };
        let second = match panel.begin_toggle("alice", "❤️") {
            ToggleOutcome::Applied(s) => s,
            ToggleOutcome::Busy => panic!("❤️ must not be blocked by 👍"),
        };
        assert!(panel.is_pending("👍"));
        assert!(panel.is_pending("❤️"));

        // Roll back only the heart; the thumbs-up survives.
        panel.settle_err(second);
        panel.settle_ok(first);
        assert_eq!(panel.reactions(), &[reaction("👍", &["alice"])]);
    }

    #[test]
    fn new_normalizes_untrusted_input() {
        let panel = ReactionPanel::new(vec![Reaction {
            symbol: "👍".to_string(),
            count: 7,
            reactors: vec!["a".into(), "a".into(), "b".into()],
        }]);
        assert_eq!(panel.reactions(), &[reaction("👍", &["a", "b"])]);
    }

    // Property-based tests

    use proptest::prelude::*;

    fn arb_reactions() -> impl Strategy<Value = Vec<Reaction>> {
        let symbols = prop::sample::subsequence(
            vec!["👍", "❤️", "🔥", "😂", "💯"],
            0..=5,
        );
        symbols.prop_flat_map(|symbols| {
            let entries: Vec<_> = symbols
                .into_iter()
                .map(|symbol| {
                    prop::sample::subsequence(
                        vec!["alice", "bob", "carol", "dave"],
                        1..=4,
                    )
                    .prop_map(move |users| Reaction {
                        symbol: symbol.to_string(),
                        count: users.len() as i64,
                        reactors: users.into_iter().map(String::from).collect(),
                    })
                })
                .collect();
            entries
        })
    }

    /// Order-independent form: entries sorted by symbol, reactors
    /// sorted within each entry.
    fn canonical(reactions: &[Reaction]) -> Vec<Reaction> {
        let mut out: Vec<Reaction> = reactions
            .iter()
            .cloned()
            .map(|mut r| {
                r.reactors.sort();
                r
            })
            .collect();
        out.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        out
    }

    proptest! {
        // Toggling the same symbol twice for the same user restores
        // the original collection. A re-added reactor lands at the
        // end of the list, so the comparison is order-independent.
        #[test]
        fn prop_double_toggle_is_identity(
            reactions in arb_reactions(),
            user in prop::sample::select(vec!["alice", "bob", "eve"]),
            symbol in prop::sample::select(vec!["👍", "❤️", "🦀"]),
        ) {
            let once = toggle(&reactions, user, symbol);
            let twice = toggle(&once, user, symbol);
            prop_assert_eq!(canonical(&twice), canonical(&reactions));
        }

        // count == reactors.len() holds for every entry after any
        // toggle, and no symbol appears twice.
        #[test]
        fn prop_toggle_preserves_invariants(
            reactions in arb_reactions(),
            user in prop::sample::select(vec!["alice", "bob", "eve"]),
            symbol in prop::sample::select(vec!["👍", "❤️", "🦀"]),
        ) {
            let next = toggle(&reactions, user, symbol);
            prop_assert!(counts_consistent(&next));
            let mut symbols: Vec<&str> =
                next.iter().map(|r| r.symbol.as_str()).collect();
            symbols.sort_unstable();
            symbols.dedup();
            prop_assert_eq!(symbols.len(), next.len());
            // No empty entries survive a removal.
            prop_assert!(next.iter().all(|r| !r.reactors.is_empty()));
        }

        // Optimistic apply followed by rollback is a no-op on the
        // panel, whatever the starting collection.
        #[test]
        fn prop_rollback_is_exact(
            reactions in arb_reactions(),
            user in prop::sample::select(vec!["alice", "bob", "eve"]),
            symbol in prop::sample::select(vec!["👍", "❤️", "🦀"]),
        ) {
            let mut panel = ReactionPanel::new(reactions);
            let before = panel.reactions().to_vec();
            match panel.begin_toggle(user, symbol) {
                ToggleOutcome::Applied(snapshot) => panel.settle_err(snapshot),
                ToggleOutcome::Busy => {}
            }
            prop_assert_eq!(panel.reactions(), before.as_slice());
        }
    }
}
