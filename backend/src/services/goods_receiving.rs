//! Goods receiving service: GRN creation with stock postings and purchase
//! order fulfilment tracking

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::stock::StockService;
use shared::{format_grn_number, PurchaseOrderStatus, TransactionType};

/// Goods receiving service
#[derive(Clone)]
pub struct GoodsReceivingService {
    db: PgPool,
}

/// Goods received note header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GoodsReceivedNote {
    pub grn_id: i64,
    pub grn_number: String,
    pub po_id: Option<i64>,
    pub supplier_id: i64,
    pub received_date: NaiveDate,
    pub received_by_user_id: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// GRN line joined with item master data
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GrnItemView {
    pub grn_item_id: i64,
    pub grn_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub po_item_id: Option<i64>,
    pub quantity_ordered_on_po: Option<Decimal>,
    pub quantity_received: Decimal,
    pub unit_price_at_receipt: Decimal,
    pub item_notes: Option<String>,
}

/// GRN with its lines
#[derive(Debug, Serialize)]
pub struct GrnWithItems {
    #[serde(flatten)]
    pub grn: GoodsReceivedNote,
    pub items: Vec<GrnItemView>,
}

/// One received line of a new GRN
#[derive(Debug, Deserialize)]
pub struct GrnLineInput {
    pub item_id: i64,
    pub po_item_id: Option<i64>,
    pub quantity_ordered_on_po: Option<Decimal>,
    pub quantity_received: Decimal,
    pub unit_price_at_receipt: Decimal,
    pub item_notes: Option<String>,
}

/// Input for creating a GRN
#[derive(Debug, Deserialize)]
pub struct CreateGrnInput {
    pub po_id: Option<i64>,
    pub supplier_id: i64,
    pub received_date: Option<NaiveDate>,
    pub received_by_user_id: String,
    pub notes: Option<String>,
    pub items: Vec<GrnLineInput>,
}

/// Filters for the GRN listing
#[derive(Debug, Default, Deserialize)]
pub struct GrnFilter {
    pub po_id: Option<i64>,
    pub supplier_id: Option<i64>,
}

impl GoodsReceivingService {
    /// Create a new GoodsReceivingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a GRN, post RECEIVING stock transactions for every line and,
    /// when a purchase order is linked, recompute its fulfilment status.
    /// Everything happens in one transaction.
    pub async fn create_grn(&self, input: CreateGrnInput) -> AppResult<GrnWithItems> {
        let received_by = input.received_by_user_id.trim().to_string();
        if received_by.is_empty() {
            return Err(AppError::Validation {
                field: "received_by_user_id".to_string(),
                message: "Receiving user is required".to_string(),
            });
        }
        if input.items.is_empty() {
            return Err(AppError::ValidationError(
                "GRN must contain at least one item".to_string(),
            ));
        }
        for (i, line) in input.items.iter().enumerate() {
            if line.quantity_received <= Decimal::ZERO {
                return Err(AppError::ValidationError(format!(
                    "Received quantity must be positive in item row {}",
                    i + 1
                )));
            }
            if line.unit_price_at_receipt < Decimal::ZERO {
                return Err(AppError::ValidationError(format!(
                    "Unit price cannot be negative in item row {}",
                    i + 1
                )));
            }
        }

        let mut tx = self.db.begin().await?;

        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE supplier_id = $1)",
        )
        .bind(input.supplier_id)
        .fetch_one(&mut *tx)
        .await?;
        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        if let Some(po_id) = input.po_id {
            let po = sqlx::query_as::<_, (i64, String)>(
                "SELECT supplier_id, status FROM purchase_orders WHERE po_id = $1 FOR UPDATE",
            )
            .bind(po_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;
            let (po_supplier, status_raw) = po;
            if po_supplier != input.supplier_id {
                return Err(AppError::ValidationError(
                    "GRN supplier does not match the purchase order supplier".to_string(),
                ));
            }
            let status = PurchaseOrderStatus::parse(&status_raw).ok_or_else(|| {
                AppError::Internal(format!(
                    "unknown purchase order status '{}' in storage",
                    status_raw
                ))
            })?;
            if !matches!(
                status,
                PurchaseOrderStatus::Ordered | PurchaseOrderStatus::Partial
            ) {
                return Err(AppError::InvalidStateTransition(format!(
                    "Cannot receive against a {} purchase order",
                    status.as_str()
                )));
            }
        }

        let sequence: i64 = sqlx::query_scalar("SELECT nextval('grn_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let grn_number = format_grn_number(Utc::now(), sequence);

        let grn = sqlx::query_as::<_, GoodsReceivedNote>(
            r#"
            INSERT INTO goods_received_notes
                (grn_number, po_id, supplier_id, received_date, received_by_user_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING grn_id, grn_number, po_id, supplier_id, received_date,
                      received_by_user_id, notes, created_at
            "#,
        )
        .bind(&grn_number)
        .bind(input.po_id)
        .bind(input.supplier_id)
        .bind(input.received_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(&received_by)
        .bind(input.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .fetch_one(&mut *tx)
        .await?;

        for line in &input.items {
            StockService::record_in_tx(
                &mut tx,
                line.item_id,
                line.quantity_received,
                TransactionType::Receiving,
                &received_by,
                None,
                input.po_id,
                Some(&format!("GRN: {}", grn_number)),
            )
            .await?;

            sqlx::query(
                r#"
                INSERT INTO grn_items (grn_id, item_id, po_item_id, quantity_ordered_on_po,
                                       quantity_received, unit_price_at_receipt, item_notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(grn.grn_id)
            .bind(line.item_id)
            .bind(line.po_item_id)
            .bind(line.quantity_ordered_on_po)
            .bind(line.quantity_received)
            .bind(line.unit_price_at_receipt)
            .bind(line.item_notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .execute(&mut *tx)
            .await?;
        }

        if let Some(po_id) = input.po_id {
            // Fulfilled when every PO line has received at least its ordered
            // quantity across all GRNs, this one included.
            let all_fulfilled = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT NOT EXISTS (
                    SELECT 1
                    FROM purchase_order_items poi
                    WHERE poi.po_id = $1
                      AND COALESCE((SELECT SUM(gi.quantity_received) FROM grn_items gi
                                    WHERE gi.po_item_id = poi.po_item_id), 0)
                          < poi.quantity_ordered
                )
                "#,
            )
            .bind(po_id)
            .fetch_one(&mut *tx)
            .await?;

            let new_status = if all_fulfilled {
                PurchaseOrderStatus::Complete
            } else {
                PurchaseOrderStatus::Partial
            };
            sqlx::query("UPDATE purchase_orders SET status = $1, updated_at = NOW() WHERE po_id = $2")
                .bind(new_status.as_str())
                .bind(po_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!("Created GRN {} with {} lines", grn_number, input.items.len());
        self.get_grn(grn.grn_id).await
    }

    /// List GRNs matching the given filters
    pub async fn list_grns(&self, filter: GrnFilter) -> AppResult<Vec<GoodsReceivedNote>> {
        let grns = sqlx::query_as::<_, GoodsReceivedNote>(
            r#"
            SELECT grn_id, grn_number, po_id, supplier_id, received_date,
                   received_by_user_id, notes, created_at
            FROM goods_received_notes
            WHERE ($1::bigint IS NULL OR po_id = $1)
              AND ($2::bigint IS NULL OR supplier_id = $2)
            ORDER BY received_date DESC, grn_id DESC
            "#,
        )
        .bind(filter.po_id)
        .bind(filter.supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(grns)
    }

    /// Get a GRN with its lines
    pub async fn get_grn(&self, grn_id: i64) -> AppResult<GrnWithItems> {
        let grn = sqlx::query_as::<_, GoodsReceivedNote>(
            r#"
            SELECT grn_id, grn_number, po_id, supplier_id, received_date,
                   received_by_user_id, notes, created_at
            FROM goods_received_notes
            WHERE grn_id = $1
            "#,
        )
        .bind(grn_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods received note".to_string()))?;

        let items = sqlx::query_as::<_, GrnItemView>(
            r#"
            SELECT gi.grn_item_id, gi.grn_id, gi.item_id, i.name AS item_name, gi.po_item_id,
                   gi.quantity_ordered_on_po, gi.quantity_received, gi.unit_price_at_receipt,
                   gi.item_notes
            FROM grn_items gi
            JOIN items i ON gi.item_id = i.item_id
            WHERE gi.grn_id = $1
            ORDER BY gi.grn_item_id
            "#,
        )
        .bind(grn_id)
        .fetch_all(&self.db)
        .await?;

        Ok(GrnWithItems { grn, items })
    }
}
