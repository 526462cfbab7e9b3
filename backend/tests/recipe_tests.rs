//! Recipe composition tests
//!
//! Covers the component guard pipeline: kind parsing, the polymorphic
//! reference rules, cycle prevention, and graph expansion for sales.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{
    creates_cycle, expand_item_requirements, reachable_recipes, ComponentEdge, ComponentKind,
    ComponentRef, ComponentRefError, ExpansionError,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item_edge(parent: i64, item: i64, qty: &str, loss: &str) -> ComponentEdge {
    ComponentEdge {
        parent_recipe_id: parent,
        kind: ComponentKind::Item,
        component_id: item,
        quantity: dec(qty),
        loss_pct: dec(loss),
    }
}

fn recipe_edge(parent: i64, child: i64, qty: &str) -> ComponentEdge {
    ComponentEdge {
        parent_recipe_id: parent,
        kind: ComponentKind::Recipe,
        component_id: child,
        quantity: dec(qty),
        loss_pct: Decimal::ZERO,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The kind tag is checked before anything else can run
    #[test]
    fn test_invalid_component_kind_rejected() {
        let err = ComponentRef::parse("GARNISH", 1).unwrap_err();
        assert!(matches!(err, ComponentRefError::InvalidKind(_)));

        // Lowercase spellings are not accepted either
        assert!(ComponentRef::parse("item", 1).is_err());
        assert!(ComponentRef::parse("recipe", 1).is_err());
    }

    /// Valid kinds parse into the matching variant
    #[test]
    fn test_component_ref_variants() {
        assert_eq!(ComponentRef::parse("ITEM", 4), Ok(ComponentRef::Item(4)));
        assert_eq!(ComponentRef::parse("RECIPE", 9), Ok(ComponentRef::Recipe(9)));
        assert_eq!(ComponentRef::parse("ITEM", 4).unwrap().kind(), ComponentKind::Item);
        assert_eq!(ComponentRef::parse("ITEM", 4).unwrap().id(), 4);
    }

    /// A recipe can never list itself, directly
    #[test]
    fn test_self_reference_is_cycle() {
        assert!(creates_cycle(&[], 7, 7));
    }

    /// Marinara (1) is inside Lasagna (2); putting Lasagna
    /// back inside Marinara must be rejected
    #[test]
    fn test_two_level_cycle_rejected() {
        // Lasagna -> Marinara exists
        let edges = [(2i64, 1i64)];
        // Marinara -> Lasagna would close the loop
        assert!(creates_cycle(&edges, 1, 2));
        // Marinara -> some other recipe is fine
        assert!(!creates_cycle(&edges, 1, 3));
    }

    /// Transitive chains count: A -> B -> C exists, C -> A is a cycle
    #[test]
    fn test_transitive_cycle_rejected() {
        let edges = [(1i64, 2i64), (2, 3)];
        assert!(creates_cycle(&edges, 3, 1));
        assert!(!creates_cycle(&edges, 3, 4));
    }

    /// Shared sub-recipes (diamonds) are not cycles
    #[test]
    fn test_diamond_is_not_cycle() {
        let edges = [(1i64, 2i64), (1, 3), (2, 4)];
        assert!(!creates_cycle(&edges, 3, 4));
    }

    /// Reachability follows edges outward from the start only
    #[test]
    fn test_reachability_direction() {
        let edges = [(1i64, 2i64), (2, 3)];
        let from_two = reachable_recipes(&edges, 2);
        assert!(from_two.contains(&3));
        assert!(!from_two.contains(&1));
    }

    /// Expansion accumulates the same item across branches
    #[test]
    fn test_expansion_accumulates() {
        let edges = [
            recipe_edge(2, 1, "1"),
            item_edge(1, 10, "0.2", "0"),
            item_edge(2, 10, "0.5", "0"),
        ];
        let totals = expand_item_requirements(&edges, 2, dec("1")).unwrap();
        assert_eq!(totals.get(&10), Some(&dec("0.7")));
    }

    /// Loss percentages gross the requirement up at every level
    #[test]
    fn test_expansion_with_loss() {
        // 20% loss: serving 0.8 requires a full 1.0
        let edges = [item_edge(1, 5, "0.8", "20")];
        let totals = expand_item_requirements(&edges, 1, dec("1")).unwrap();
        assert_eq!(totals.get(&5), Some(&dec("1")));
    }

    /// A corrupted (cyclic) stored graph fails instead of hanging
    #[test]
    fn test_expansion_detects_cycle() {
        let edges = [recipe_edge(1, 2, "1"), recipe_edge(2, 1, "1")];
        assert_eq!(
            expand_item_requirements(&edges, 1, dec("1")),
            Err(ExpansionError::CircularReference(1))
        );
    }

    /// The duplicate-edge invariant key is the full (parent, kind, id) triple
    #[test]
    fn test_duplicate_edge_key() {
        let a = (1i64, ComponentKind::Item, 5i64);
        let b = (1i64, ComponentKind::Recipe, 5i64);
        // Same ids under different kinds are distinct edges
        assert_ne!(a.1, b.1);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating recipe ids
    fn id_strategy() -> impl Strategy<Value = i64> {
        1i64..=40
    }

    /// Strategy for random edge sets over a small id space
    fn edges_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
        prop::collection::vec((id_strategy(), id_strategy()), 0..60)
    }

    /// Build an acyclic edge set by only keeping edges that pass the guard,
    /// exactly the way the service inserts them.
    fn guarded_insert(candidates: &[(i64, i64)]) -> Vec<(i64, i64)> {
        let mut accepted: Vec<(i64, i64)> = Vec::new();
        for &(parent, child) in candidates {
            if !creates_cycle(&accepted, parent, child) {
                accepted.push((parent, child));
            }
        }
        accepted
    }

    /// Whether `edges` contains a cycle, by checking every node for a path
    /// back to itself.
    fn has_cycle(edges: &[(i64, i64)]) -> bool {
        edges
            .iter()
            .any(|&(parent, _)| reachable_recipes(edges, parent).contains(&parent))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Any insertion sequence filtered through the guard leaves the
        /// graph acyclic
        #[test]
        fn prop_guard_preserves_acyclicity(candidates in edges_strategy()) {
            let accepted = guarded_insert(&candidates);
            prop_assert!(!has_cycle(&accepted));
        }

        /// An edge rejected by the guard really would have closed a cycle
        #[test]
        fn prop_rejections_are_justified(candidates in edges_strategy()) {
            let mut accepted: Vec<(i64, i64)> = Vec::new();
            for (parent, child) in candidates {
                if creates_cycle(&accepted, parent, child) {
                    // Self-reference, or the child already reaches the parent
                    let closes_loop = parent == child
                        || reachable_recipes(&accepted, child).contains(&parent);
                    prop_assert!(closes_loop);
                } else {
                    accepted.push((parent, child));
                }
            }
        }

        /// Self-references are always rejected regardless of graph state
        #[test]
        fn prop_self_reference_always_rejected(
            edges in edges_strategy(),
            id in id_strategy()
        ) {
            prop_assert!(creates_cycle(&edges, id, id));
        }

        /// An edge to a node with no outgoing edges never cycles
        #[test]
        fn prop_leaf_target_never_cycles(candidates in edges_strategy(), parent in id_strategy()) {
            let accepted = guarded_insert(&candidates);
            // 1000 appears nowhere in the id space, so it has no out-edges
            prop_assert!(!creates_cycle(&accepted, parent, 1000));
        }

        /// Expansion scales linearly with the sale quantity
        #[test]
        fn prop_expansion_scales(qty in 1i64..=50, per_portion in 1i64..=1000) {
            let per_portion = Decimal::new(per_portion, 2);
            let edges = [ComponentEdge {
                parent_recipe_id: 1,
                kind: ComponentKind::Item,
                component_id: 9,
                quantity: per_portion,
                loss_pct: Decimal::ZERO,
            }];
            let totals = expand_item_requirements(&edges, 1, Decimal::from(qty)).unwrap();
            prop_assert_eq!(totals.get(&9), Some(&(per_portion * Decimal::from(qty))));
        }
    }
}
