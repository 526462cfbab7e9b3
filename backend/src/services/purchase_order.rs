//! Purchase order service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use shared::{po_transition_allowed, PurchaseOrderStatus};

/// Purchase order service for supplier ordering
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
}

/// Purchase order header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrder {
    pub po_id: i64,
    pub supplier_id: i64,
    pub order_date: NaiveDate,
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase order line joined with item master data
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrderItemView {
    pub po_item_id: i64,
    pub po_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub item_unit: String,
    pub quantity_ordered: Decimal,
    pub unit_price: Decimal,
    pub received_total: Decimal,
}

/// Header plus aggregates, for list views
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrderSummary {
    pub po_id: i64,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub order_date: NaiveDate,
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: String,
    pub item_count: i64,
    pub total_value: Decimal,
}

/// Purchase order with its lines
#[derive(Debug, Serialize)]
pub struct PurchaseOrderWithItems {
    #[serde(flatten)]
    pub purchase_order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItemView>,
}

/// One line of a new purchase order
#[derive(Debug, Deserialize)]
pub struct PoLineInput {
    pub item_id: i64,
    pub quantity_ordered: Decimal,
    pub unit_price: Decimal,
}

/// Input for creating a purchase order
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: i64,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<PoLineInput>,
}

/// Filters for the purchase order listing
#[derive(Debug, Default, Deserialize)]
pub struct PurchaseOrderFilter {
    pub supplier_id: Option<i64>,
    pub status: Option<String>,
}

/// Input for a status change
#[derive(Debug, Deserialize)]
pub struct UpdatePoStatusInput {
    pub status: PurchaseOrderStatus,
}

impl PurchaseOrderService {
    /// Create a new PurchaseOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a draft purchase order with its lines
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithItems> {
        if input.items.is_empty() {
            return Err(AppError::ValidationError(
                "Purchase order must contain at least one item".to_string(),
            ));
        }
        for (i, line) in input.items.iter().enumerate() {
            if line.quantity_ordered <= Decimal::ZERO {
                return Err(AppError::ValidationError(format!(
                    "Ordered quantity must be positive in item row {}",
                    i + 1
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(AppError::ValidationError(format!(
                    "Unit price cannot be negative in item row {}",
                    i + 1
                )));
            }
        }

        let mut tx = self.db.begin().await?;

        let supplier_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM suppliers WHERE supplier_id = $1",
        )
        .bind(input.supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;
        if !supplier_active {
            return Err(AppError::ValidationError(
                "Cannot order from an inactive supplier".to_string(),
            ));
        }

        let item_ids: Vec<i64> = input.items.iter().map(|l| l.item_id).collect();
        let known: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT item_id) FROM items WHERE item_id = ANY($1)",
        )
        .bind(&item_ids)
        .fetch_one(&mut *tx)
        .await?;
        let distinct = {
            let mut ids = item_ids.clone();
            ids.sort_unstable();
            ids.dedup();
            ids.len() as i64
        };
        if known != distinct {
            return Err(AppError::InvalidReference(
                "One or more order lines reference unknown item ids".to_string(),
            ));
        }

        let po = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (supplier_id, order_date, expected_delivery_date, status, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING po_id, supplier_id, order_date, expected_delivery_date, status, notes,
                      created_at, updated_at
            "#,
        )
        .bind(input.supplier_id)
        .bind(input.order_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(input.expected_delivery_date)
        .bind(PurchaseOrderStatus::Draft.as_str())
        .bind(input.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .fetch_one(&mut *tx)
        .await?;

        for line in &input.items {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (po_id, item_id, quantity_ordered, unit_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(po.po_id)
            .bind(line.item_id)
            .bind(line.quantity_ordered)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get_purchase_order(po.po_id).await
    }

    /// List purchase orders matching the given filters
    pub async fn list_purchase_orders(
        &self,
        filter: PurchaseOrderFilter,
    ) -> AppResult<Vec<PurchaseOrderSummary>> {
        let orders = sqlx::query_as::<_, PurchaseOrderSummary>(
            r#"
            SELECT po.po_id, po.supplier_id, s.name AS supplier_name, po.order_date,
                   po.expected_delivery_date, po.status,
                   COUNT(poi.po_item_id) AS item_count,
                   COALESCE(SUM(poi.quantity_ordered * poi.unit_price), 0) AS total_value
            FROM purchase_orders po
            JOIN suppliers s ON po.supplier_id = s.supplier_id
            LEFT JOIN purchase_order_items poi ON po.po_id = poi.po_id
            WHERE ($1::bigint IS NULL OR po.supplier_id = $1)
              AND ($2::text IS NULL OR po.status = $2)
            GROUP BY po.po_id, s.name
            ORDER BY po.order_date DESC, po.po_id DESC
            "#,
        )
        .bind(filter.supplier_id)
        .bind(filter.status.as_deref().filter(|s| !s.trim().is_empty()))
        .fetch_all(&self.db)
        .await?;

        Ok(orders)
    }

    /// Get a purchase order with its lines and received totals
    pub async fn get_purchase_order(&self, po_id: i64) -> AppResult<PurchaseOrderWithItems> {
        let purchase_order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT po_id, supplier_id, order_date, expected_delivery_date, status, notes,
                   created_at, updated_at
            FROM purchase_orders
            WHERE po_id = $1
            "#,
        )
        .bind(po_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let items = sqlx::query_as::<_, PurchaseOrderItemView>(
            r#"
            SELECT poi.po_item_id, poi.po_id, poi.item_id, i.name AS item_name,
                   i.purchase_unit AS item_unit, poi.quantity_ordered, poi.unit_price,
                   COALESCE((SELECT SUM(gi.quantity_received) FROM grn_items gi
                             WHERE gi.po_item_id = poi.po_item_id), 0) AS received_total
            FROM purchase_order_items poi
            JOIN items i ON poi.item_id = i.item_id
            WHERE poi.po_id = $1
            ORDER BY poi.po_item_id
            "#,
        )
        .bind(po_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseOrderWithItems {
            purchase_order,
            items,
        })
    }

    /// Move a purchase order to a new status, validating the transition.
    ///
    /// PARTIAL and COMPLETE are normally set by goods receiving; this
    /// endpoint is how a draft is placed (ORDERED) or an order cancelled.
    pub async fn update_status(
        &self,
        po_id: i64,
        input: UpdatePoStatusInput,
    ) -> AppResult<PurchaseOrder> {
        let current_raw: String =
            sqlx::query_scalar("SELECT status FROM purchase_orders WHERE po_id = $1")
                .bind(po_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;
        let current = PurchaseOrderStatus::parse(&current_raw).ok_or_else(|| {
            AppError::Internal(format!(
                "unknown purchase order status '{}' in storage",
                current_raw
            ))
        })?;

        if !po_transition_allowed(current, input.status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Purchase order cannot move from {} to {}",
                current.as_str(),
                input.status.as_str()
            )));
        }

        let po = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = $1, updated_at = NOW()
            WHERE po_id = $2
            RETURNING po_id, supplier_id, order_date, expected_delivery_date, status, notes,
                      created_at, updated_at
            "#,
        )
        .bind(input.status.as_str())
        .bind(po_id)
        .fetch_one(&self.db)
        .await?;

        Ok(po)
    }
}
