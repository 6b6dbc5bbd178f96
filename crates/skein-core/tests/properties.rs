//! Property-based tests for the weft.
//!
//! These verify the frontier laws that convergence rests on:
//!  - Monotonicity: an entry never decreases under any update sequence
//!  - Merge is commutative, associative, and idempotent
//!  - Causal inclusion tracks exactly the updates applied

use proptest::prelude::*;
use skein_core::{AtomId, Weft, NULL_INDEX, NULL_SITE};

fn weft_strategy() -> impl Strategy<Value = Weft> {
    prop::collection::btree_map(0u16..8, 0i32..50, 0..6)
        .prop_map(|entries| Weft::from_entries(entries))
}

fn update_strategy() -> impl Strategy<Value = Vec<(u16, i32)>> {
    prop::collection::vec((0u16..8, 0i32..50), 0..30)
}

proptest! {
    #[test]
    fn weft_merge_is_commutative(a in weft_strategy(), b in weft_strategy()) {
        prop_assert_eq!(a.merged_with(&b), b.merged_with(&a));
    }

    #[test]
    fn weft_merge_is_associative(
        a in weft_strategy(),
        b in weft_strategy(),
        c in weft_strategy()
    ) {
        let left = a.merged_with(&b).merged_with(&c);
        let right = a.merged_with(&b.merged_with(&c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn weft_merge_is_idempotent(a in weft_strategy()) {
        prop_assert_eq!(a.merged_with(&a), a);
    }

    #[test]
    fn weft_empty_is_identity(a in weft_strategy()) {
        let empty = Weft::new();
        prop_assert_eq!(a.merged_with(&empty), a.clone());
        prop_assert_eq!(empty.merged_with(&a), a);
    }

    #[test]
    fn weft_is_monotone(updates in update_strategy()) {
        let mut weft = Weft::new();
        for (site, index) in updates {
            let before = weft.get(site);
            weft.update_site(site, index);
            prop_assert!(weft.get(site) >= before);
            prop_assert!(weft.get(site) >= index);
        }
    }

    #[test]
    fn weft_inclusion_tracks_updates(site in 0u16..8, index in 0i32..50) {
        let mut weft = Weft::new();
        let atom = AtomId::new(site, index);
        prop_assert!(!weft.included(atom));

        weft.update_atom(atom);
        prop_assert!(weft.included(atom));

        // Everything earlier on the same yarn is covered, nothing later.
        prop_assert!(weft.included(AtomId::new(site, 0)));
        prop_assert!(!weft.included(AtomId::new(site, index + 1)));
    }

    #[test]
    fn weft_never_maps_null_site(updates in update_strategy()) {
        let mut weft = Weft::new();
        for (site, index) in updates {
            weft.update_site(site, index);
        }
        weft.update_site(NULL_SITE, 40);
        prop_assert_eq!(weft.get(NULL_SITE), NULL_INDEX);
        prop_assert!(weft.sites().all(|s| s != NULL_SITE));
    }

    #[test]
    fn weft_merge_equals_pairwise_updates(
        a in weft_strategy(),
        b in weft_strategy(),
        c in weft_strategy()
    ) {
        // Folding a and b into c in either order matches folding their merge.
        let mut via_merge = c.clone();
        via_merge.update_weft(&a.merged_with(&b));

        let mut via_updates = c.clone();
        via_updates.update_weft(&a);
        via_updates.update_weft(&b);

        let mut via_updates_rev = c;
        via_updates_rev.update_weft(&b);
        via_updates_rev.update_weft(&a);

        prop_assert_eq!(&via_merge, &via_updates);
        prop_assert_eq!(&via_merge, &via_updates_rev);
    }
}
