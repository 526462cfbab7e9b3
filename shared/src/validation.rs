//! Pure validation routines for the Restaurant Inventory Management Platform
//!
//! These functions hold the structural rules of the domain, most notably
//! the recipe composition cycle check, so they can be exercised without a
//! database. The backend services call them inside the transaction that
//! performs the corresponding write.

use std::collections::{HashMap, HashSet, VecDeque};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{ComponentKind, IndentStatus, PurchaseOrderStatus};

/// Collect every recipe transitively reachable from `start` by following
/// RECIPE-kind component edges `(parent_recipe_id, child_recipe_id)`.
pub fn reachable_recipes(edges: &[(i64, i64)], start: i64) -> HashSet<i64> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for &(parent, child) in edges {
            if parent == node && seen.insert(child) {
                queue.push_back(child);
            }
        }
    }
    seen
}

/// Whether inserting the edge `parent_id -> child_id` would close a cycle
/// in the recipe graph described by `edges`.
///
/// A direct self-reference is a cycle. Otherwise the edge is rejected when
/// `parent_id` is already reachable from `child_id`, i.e. the child (or one
/// of its sub-recipes) depends on the parent.
pub fn creates_cycle(edges: &[(i64, i64)], parent_id: i64, child_id: i64) -> bool {
    if parent_id == child_id {
        return true;
    }
    reachable_recipes(edges, child_id).contains(&parent_id)
}

/// Whether an indent may move from `from` to `to`.
///
/// Submitted -> Processing -> Completed, with Cancelled reachable from any
/// non-terminal status. Terminal statuses accept nothing.
pub fn indent_transition_allowed(from: IndentStatus, to: IndentStatus) -> bool {
    if from.is_terminal() || from == to {
        return false;
    }
    match (from, to) {
        (IndentStatus::Submitted, IndentStatus::Processing) => true,
        (IndentStatus::Submitted, IndentStatus::Completed) => true,
        (IndentStatus::Processing, IndentStatus::Completed) => true,
        (_, IndentStatus::Cancelled) => true,
        _ => false,
    }
}

/// Whether a purchase order may move from `from` to `to`.
///
/// DRAFT -> ORDERED -> PARTIAL -> COMPLETE; ORDERED may complete directly
/// when a single receipt covers everything; CANCELLED is reachable from any
/// non-terminal status.
pub fn po_transition_allowed(from: PurchaseOrderStatus, to: PurchaseOrderStatus) -> bool {
    if from.is_terminal() || from == to {
        return false;
    }
    match (from, to) {
        (PurchaseOrderStatus::Draft, PurchaseOrderStatus::Ordered) => true,
        (PurchaseOrderStatus::Ordered, PurchaseOrderStatus::Partial) => true,
        (PurchaseOrderStatus::Ordered, PurchaseOrderStatus::Complete) => true,
        (PurchaseOrderStatus::Partial, PurchaseOrderStatus::Complete) => true,
        (_, PurchaseOrderStatus::Cancelled) => true,
        _ => false,
    }
}

/// Gross quantity needed to end up with `quantity` after preparation loss.
///
/// `loss_pct` is a percentage in `[0, 100)`; the gross amount is
/// `quantity / (1 - loss_pct / 100)`.
pub fn quantity_with_loss(quantity: Decimal, loss_pct: Decimal) -> Result<Decimal, &'static str> {
    if loss_pct < Decimal::ZERO || loss_pct >= Decimal::from(100) {
        return Err("loss percentage must be in [0, 100)");
    }
    let keep = Decimal::ONE - loss_pct / Decimal::from(100);
    Ok(quantity / keep)
}

/// A recipe component edge as loaded from storage, for graph expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEdge {
    pub parent_recipe_id: i64,
    pub kind: ComponentKind,
    pub component_id: i64,
    pub quantity: Decimal,
    pub loss_pct: Decimal,
}

/// Failures surfaced while expanding a recipe into raw-item requirements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpansionError {
    #[error("circular reference detected at recipe {0}")]
    CircularReference(i64),
    #[error("invalid loss percentage on a component of recipe {0}")]
    InvalidLossPct(i64),
}

/// Expand `quantity` portions of `recipe_id` into total raw-item
/// requirements, walking sub-recipes depth-first and grossing each
/// component up by its loss percentage.
///
/// The component graph is kept acyclic at write time; the path check here
/// turns a corrupted graph into an error instead of a hang.
pub fn expand_item_requirements(
    edges: &[ComponentEdge],
    recipe_id: i64,
    quantity: Decimal,
) -> Result<HashMap<i64, Decimal>, ExpansionError> {
    let mut by_parent: HashMap<i64, Vec<&ComponentEdge>> = HashMap::new();
    for edge in edges {
        by_parent.entry(edge.parent_recipe_id).or_default().push(edge);
    }

    let mut totals = HashMap::new();
    let mut path = Vec::new();
    walk(&by_parent, recipe_id, quantity, &mut totals, &mut path)?;
    Ok(totals)
}

fn walk(
    by_parent: &HashMap<i64, Vec<&ComponentEdge>>,
    recipe_id: i64,
    multiplier: Decimal,
    totals: &mut HashMap<i64, Decimal>,
    path: &mut Vec<i64>,
) -> Result<(), ExpansionError> {
    if path.contains(&recipe_id) {
        return Err(ExpansionError::CircularReference(recipe_id));
    }
    path.push(recipe_id);
    for edge in by_parent.get(&recipe_id).map(Vec::as_slice).unwrap_or(&[]) {
        let gross = quantity_with_loss(multiplier * edge.quantity, edge.loss_pct)
            .map_err(|_| ExpansionError::InvalidLossPct(recipe_id))?;
        match edge.kind {
            ComponentKind::Item => {
                *totals.entry(edge.component_id).or_insert(Decimal::ZERO) += gross;
            }
            ComponentKind::Recipe => {
                walk(by_parent, edge.component_id, gross, totals, path)?;
            }
        }
    }
    path.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn self_reference_is_a_cycle() {
        assert!(creates_cycle(&[], 1, 1));
    }

    #[test]
    fn chain_back_to_origin_is_a_cycle() {
        // A -> B and B -> C exist; C -> A would close the loop.
        let edges = [(1, 2), (2, 3)];
        assert!(creates_cycle(&edges, 3, 1));
    }

    #[test]
    fn unrelated_edge_is_allowed() {
        let edges = [(1, 2), (2, 3)];
        assert!(!creates_cycle(&edges, 3, 4));
    }

    #[test]
    fn diamond_without_back_edge_is_allowed() {
        // A -> B, A -> C, B -> D, C -> D shares D but has no cycle.
        let edges = [(1, 2), (1, 3), (2, 4)];
        assert!(!creates_cycle(&edges, 3, 4));
    }

    #[test]
    fn reachability_is_transitive() {
        let edges = [(1, 2), (2, 3), (3, 4)];
        let reach = reachable_recipes(&edges, 1);
        assert!(reach.contains(&2) && reach.contains(&3) && reach.contains(&4));
        assert!(!reach.contains(&1));
    }

    #[test]
    fn indent_transitions() {
        use IndentStatus::*;
        assert!(indent_transition_allowed(Submitted, Processing));
        assert!(indent_transition_allowed(Processing, Completed));
        assert!(indent_transition_allowed(Submitted, Cancelled));
        assert!(!indent_transition_allowed(Completed, Processing));
        assert!(!indent_transition_allowed(Cancelled, Submitted));
        assert!(!indent_transition_allowed(Processing, Submitted));
    }

    #[test]
    fn po_transitions() {
        use PurchaseOrderStatus::*;
        assert!(po_transition_allowed(Draft, Ordered));
        assert!(po_transition_allowed(Ordered, Partial));
        assert!(po_transition_allowed(Ordered, Complete));
        assert!(po_transition_allowed(Partial, Complete));
        assert!(po_transition_allowed(Draft, Cancelled));
        assert!(!po_transition_allowed(Complete, Ordered));
        assert!(!po_transition_allowed(Draft, Partial));
    }

    #[test]
    fn loss_expansion_math() {
        assert_eq!(quantity_with_loss(dec("90"), dec("10")).unwrap(), dec("100"));
        assert_eq!(quantity_with_loss(dec("5"), dec("0")).unwrap(), dec("5"));
        assert!(quantity_with_loss(dec("1"), dec("100")).is_err());
        assert!(quantity_with_loss(dec("1"), dec("-5")).is_err());
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

    #[test]
    fn expansion_accumulates_through_sub_recipes() {
        // Lasagna (2) uses 1 portion of Marinara (1); Marinara uses 0.2 of
        // item 10; Lasagna also uses 0.5 of item 10 directly.
        let edges = [
            recipe_edge(2, 1, "1"),
            item_edge(1, 10, "0.2", "0"),
            item_edge(2, 10, "0.5", "0"),
        ];
        let totals = expand_item_requirements(&edges, 2, dec("2")).unwrap();
        assert_eq!(totals.get(&10), Some(&dec("1.4")));
    }

    #[test]
    fn expansion_applies_loss_at_each_level() {
        // 10% trim loss on the item: 1 portion needs 0.9 / 0.9 = 1.
        let edges = [item_edge(1, 5, "0.9", "10")];
        let totals = expand_item_requirements(&edges, 1, dec("1")).unwrap();
        assert_eq!(totals.get(&5), Some(&dec("1")));
    }

    #[test]
    fn expansion_detects_corrupted_graph() {
        let edges = [recipe_edge(1, 2, "1"), recipe_edge(2, 1, "1")];
        assert_eq!(
            expand_item_requirements(&edges, 1, dec("1")),
            Err(ExpansionError::CircularReference(1))
        );
    }
}
