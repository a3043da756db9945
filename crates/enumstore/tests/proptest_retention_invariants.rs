//! Property-based invariant tests for the registry mutation paths.
//!
//! These tests verify structural invariants that must hold for any valid inputs:
//!
//! 1. An update containing every seed (id, value) pair is accepted, and the
//!    working set becomes exactly the update, order preserved.
//! 2. An update missing a seed pair is rejected and leaves every observable
//!    piece of state (working set, views, symbol table, load state) unchanged.
//! 3. An update that alters a seed entry's value is rejected the same way.
//! 4. After any accepted update, every view equals the filter of the working
//!    set by its predicate, including index-dependent predicates.
//! 5. Symbols built from seed ids are always accepted; symbols pointing
//!    outside the seed id range are always rejected with the table unchanged.

use enumstore::{Entity, EnumId, EnumsManager, LoadState};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// Ids drawn from a bounded pool so collisions between seed and extras occur.
fn id_strategy() -> impl Strategy<Value = EnumId> {
    prop_oneof![
        (0i64..100).prop_map(EnumId::from),
        "[a-d]{1,3}".prop_map(EnumId::from),
    ]
}

fn entity_strategy() -> impl Strategy<Value = Entity> {
    (id_strategy(), "[A-Za-z]{0,5}").prop_map(|(id, value)| Entity::new(id, value))
}

/// A seed plus a shuffled update that retains every seed entry.
fn seed_and_retaining_update() -> impl Strategy<Value = (Vec<Entity>, Vec<Entity>)> {
    proptest::collection::vec(entity_strategy(), 0..6).prop_flat_map(|seed| {
        let update = {
            let seed = seed.clone();
            proptest::collection::vec(entity_strategy(), 0..6)
                .prop_map(move |extras| {
                    let mut update = seed.clone();
                    update.extend(extras);
                    update
                })
                .prop_shuffle()
        };
        (Just(seed), update)
    })
}

/// A non-empty seed, an index of the entry to drop, and extra entities.
fn seed_with_dropped_entry() -> impl Strategy<Value = (Vec<Entity>, usize, Vec<Entity>)> {
    (
        proptest::collection::vec(entity_strategy(), 1..6),
        any::<prop::sample::Index>(),
        proptest::collection::vec(entity_strategy(), 0..6),
    )
        .prop_map(|(seed, index, extras)| {
            let dropped = index.index(seed.len());
            (seed, dropped, extras)
        })
}

/// Snapshot of everything a rejected update must leave unchanged.
fn observable_state(
    manager: &EnumsManager,
) -> (Vec<Entity>, Vec<(String, Vec<Entity>)>, usize, LoadState) {
    let views = manager.getters();
    let view_contents = views
        .names()
        .into_iter()
        .map(|name| {
            let contents = views.get(&name).unwrap().to_vec();
            (name, contents)
        })
        .collect();
    (
        manager.enums().to_vec(),
        view_contents,
        manager.symbols().len(),
        manager.state(),
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Retaining updates are accepted and preserve order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn retaining_update_is_accepted((seed, update) in seed_and_retaining_update()) {
        let manager = EnumsManager::new(seed);
        manager.update_enums(update.clone()).unwrap();
        prop_assert_eq!(manager.enums().to_vec(), update);
        prop_assert_eq!(manager.state(), LoadState::Empty);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Updates missing a seed pair are rejected without side effects
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dropping_a_seed_entry_is_rejected(
        (seed, dropped, extras) in seed_with_dropped_entry()
    ) {
        let manager = EnumsManager::new(seed.clone());
        manager.set_getter("vowelless", |e, _, _| !e.value.contains('a'));

        let victim = seed[dropped].clone();
        let update: Vec<Entity> = seed
            .iter()
            .chain(extras.iter())
            .filter(|e| !e.matches(&victim))
            .cloned()
            .collect();

        let before = observable_state(&manager);
        prop_assert!(manager.update_enums(update).is_err());
        prop_assert_eq!(observable_state(&manager), before);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Altering a seed entry's value is rejected the same way
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn altering_a_seed_value_is_rejected(
        (seed, altered, extras) in seed_with_dropped_entry()
    ) {
        let manager = EnumsManager::new(seed.clone());

        let victim = seed[altered].clone();
        let mut replacement = victim.clone();
        replacement.value.push('!');
        let update: Vec<Entity> = seed
            .iter()
            .chain(extras.iter())
            .filter(|e| !e.matches(&victim))
            .cloned()
            .chain(std::iter::once(replacement))
            .collect();

        let before = observable_state(&manager);
        prop_assert!(manager.update_enums(update).is_err());
        prop_assert_eq!(observable_state(&manager), before);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Views always equal the predicate filter of the working set
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn views_equal_filter_of_working_set((seed, update) in seed_and_retaining_update()) {
        let manager = EnumsManager::new(seed);
        manager
            .set_getter("named", |e, _, _| !e.value.is_empty())
            .set_getter("even_positions", |_, index, _| index % 2 == 0)
            .set_getter("numeric", |e, _, _| matches!(e.id, EnumId::Num(_)));

        manager.update_enums(update.clone()).unwrap();

        let views = manager.getters();
        let named: Vec<Entity> = update.iter().filter(|e| !e.value.is_empty()).cloned().collect();
        let even: Vec<Entity> = update.iter().step_by(2).cloned().collect();
        let numeric: Vec<Entity> = update
            .iter()
            .filter(|e| matches!(e.id, EnumId::Num(_)))
            .cloned()
            .collect();

        prop_assert_eq!(views.get("named").unwrap().to_vec(), named);
        prop_assert_eq!(views.get("even_positions").unwrap().to_vec(), even);
        prop_assert_eq!(views.get("numeric").unwrap().to_vec(), numeric);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Symbols resolve against seed ids only
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn symbols_from_seed_ids_are_accepted(
        seed in proptest::collection::vec(entity_strategy(), 1..6),
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 1..4)
    ) {
        let manager = EnumsManager::new(seed.clone());
        let symbols: Vec<(String, EnumId)> = picks
            .iter()
            .enumerate()
            .map(|(n, pick)| (format!("sym{n}"), seed[pick.index(seed.len())].id.clone()))
            .collect();
        manager.set_symbols(symbols.clone()).unwrap();
        for (name, id) in symbols {
            prop_assert_eq!(manager.symbol(&name), Some(id));
        }
    }

    #[test]
    fn symbols_outside_seed_ids_are_rejected(
        seed in proptest::collection::vec(entity_strategy(), 0..6),
        bogus in 1_000i64..2_000
    ) {
        // Seed ids are drawn from 0..100 and short [a-d] strings, so a large
        // numeric id can never resolve.
        let manager = EnumsManager::new(seed);
        let err = manager.set_symbols([("ghost", EnumId::from(bogus))]);
        prop_assert!(err.is_err());
        prop_assert!(manager.symbols().is_empty());
    }
}
