//! Domain vocabulary shared across the platform

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stock ledger transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Receiving,
    Adjustment,
    Wastage,
    IndentFulfill,
    Sale,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Receiving => "RECEIVING",
            TransactionType::Adjustment => "ADJUSTMENT",
            TransactionType::Wastage => "WASTAGE",
            TransactionType::IndentFulfill => "INDENT_FULFILL",
            TransactionType::Sale => "SALE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RECEIVING" => Some(TransactionType::Receiving),
            "ADJUSTMENT" => Some(TransactionType::Adjustment),
            "WASTAGE" => Some(TransactionType::Wastage),
            "INDENT_FULFILL" => Some(TransactionType::IndentFulfill),
            "SALE" => Some(TransactionType::Sale),
            _ => None,
        }
    }
}

/// Overall indent (material request) status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentStatus {
    Submitted,
    Processing,
    Completed,
    Cancelled,
}

impl IndentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentStatus::Submitted => "Submitted",
            IndentStatus::Processing => "Processing",
            IndentStatus::Completed => "Completed",
            IndentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Submitted" => Some(IndentStatus::Submitted),
            "Processing" => Some(IndentStatus::Processing),
            "Completed" => Some(IndentStatus::Completed),
            "Cancelled" => Some(IndentStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IndentStatus::Completed | IndentStatus::Cancelled)
    }
}

/// Per-line status within an indent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentItemStatus {
    #[serde(rename = "Pending Issue")]
    PendingIssue,
    #[serde(rename = "Partially Issued")]
    PartiallyIssued,
    #[serde(rename = "Fully Issued")]
    FullyIssued,
    #[serde(rename = "Item Cancelled")]
    Cancelled,
}

impl IndentItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentItemStatus::PendingIssue => "Pending Issue",
            IndentItemStatus::PartiallyIssued => "Partially Issued",
            IndentItemStatus::FullyIssued => "Fully Issued",
            IndentItemStatus::Cancelled => "Item Cancelled",
        }
    }
}

/// Purchase order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseOrderStatus {
    Draft,
    Ordered,
    Partial,
    Complete,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "DRAFT",
            PurchaseOrderStatus::Ordered => "ORDERED",
            PurchaseOrderStatus::Partial => "PARTIAL",
            PurchaseOrderStatus::Complete => "COMPLETE",
            PurchaseOrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(PurchaseOrderStatus::Draft),
            "ORDERED" => Some(PurchaseOrderStatus::Ordered),
            "PARTIAL" => Some(PurchaseOrderStatus::Partial),
            "COMPLETE" => Some(PurchaseOrderStatus::Complete),
            "CANCELLED" => Some(PurchaseOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Complete | PurchaseOrderStatus::Cancelled
        )
    }
}

/// Kind tag of a recipe component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComponentKind {
    Item,
    Recipe,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Item => "ITEM",
            ComponentKind::Recipe => "RECIPE",
        }
    }
}

/// Error produced when a `(component_kind, component_id)` pair cannot be
/// interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComponentRefError {
    #[error("invalid component kind '{0}'")]
    InvalidKind(String),
    #[error("component id must be positive, got {0}")]
    InvalidId(i64),
}

/// A typed polymorphic reference from a recipe to one of its components.
///
/// The target table of `component_id` depends on `component_kind`, so the
/// pair is parsed into a tagged variant before any lookup happens. The kind
/// check therefore always precedes the reference and cycle checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRef {
    Item(i64),
    Recipe(i64),
}

impl ComponentRef {
    pub fn parse(kind: &str, id: i64) -> Result<Self, ComponentRefError> {
        if id <= 0 {
            return Err(ComponentRefError::InvalidId(id));
        }
        match kind {
            "ITEM" => Ok(ComponentRef::Item(id)),
            "RECIPE" => Ok(ComponentRef::Recipe(id)),
            other => Err(ComponentRefError::InvalidKind(other.to_string())),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentRef::Item(_) => ComponentKind::Item,
            ComponentRef::Recipe(_) => ComponentKind::Recipe,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ComponentRef::Item(id) | ComponentRef::Recipe(id) => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_ref_parses_known_kinds() {
        assert_eq!(ComponentRef::parse("ITEM", 3), Ok(ComponentRef::Item(3)));
        assert_eq!(
            ComponentRef::parse("RECIPE", 7),
            Ok(ComponentRef::Recipe(7))
        );
    }

    #[test]
    fn component_ref_rejects_unknown_kind() {
        assert_eq!(
            ComponentRef::parse("GARNISH", 3),
            Err(ComponentRefError::InvalidKind("GARNISH".to_string()))
        );
    }

    #[test]
    fn component_ref_rejects_non_positive_id() {
        assert_eq!(
            ComponentRef::parse("ITEM", 0),
            Err(ComponentRefError::InvalidId(0))
        );
    }

    #[test]
    fn status_round_trips() {
        for s in [
            IndentStatus::Submitted,
            IndentStatus::Processing,
            IndentStatus::Completed,
            IndentStatus::Cancelled,
        ] {
            assert_eq!(IndentStatus::parse(s.as_str()), Some(s));
        }
        for s in [
            PurchaseOrderStatus::Draft,
            PurchaseOrderStatus::Ordered,
            PurchaseOrderStatus::Partial,
            PurchaseOrderStatus::Complete,
            PurchaseOrderStatus::Cancelled,
        ] {
            assert_eq!(PurchaseOrderStatus::parse(s.as_str()), Some(s));
        }
    }
}
