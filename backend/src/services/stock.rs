//! Stock ledger service: append-only transactions and the derived balance

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::{AppError, AppResult};
use crate::services::item::BulkImportResult;
use shared::TransactionType;

/// Expected header of the stock transaction bulk import CSV, in order.
pub const IMPORT_COLUMNS: &[&str] = &[
    "item_id",
    "quantity_change",
    "transaction_type",
    "user_id",
    "related_mrn",
    "related_po_id",
    "notes",
];

/// Stock service for recording and querying inventory movements
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Stock ledger entry. Rows are never mutated after creation; the item's
/// `current_stock` is adjusted in the same transaction as each insert.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTransaction {
    pub transaction_id: i64,
    pub item_id: i64,
    pub quantity_change: Decimal,
    pub transaction_type: String,
    pub user_id: String,
    pub related_mrn: Option<String>,
    pub related_po_id: Option<i64>,
    pub notes: Option<String>,
    pub transaction_date: DateTime<Utc>,
}

/// Ledger entry joined with item master data for list views
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTransactionView {
    pub transaction_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub item_unit: String,
    pub quantity_change: Decimal,
    pub transaction_type: String,
    pub user_id: String,
    pub related_mrn: Option<String>,
    pub related_po_id: Option<i64>,
    pub notes: Option<String>,
    pub transaction_date: DateTime<Utc>,
}

/// Input for recording a stock transaction
#[derive(Debug, Deserialize)]
pub struct RecordTransactionInput {
    pub item_id: i64,
    pub quantity_change: Decimal,
    pub transaction_type: TransactionType,
    pub user_id: Option<String>,
    pub related_mrn: Option<String>,
    pub related_po_id: Option<i64>,
    pub notes: Option<String>,
}

/// One row of the stock transaction bulk import CSV
#[derive(Debug, Deserialize)]
struct CsvTransactionRow {
    item_id: i64,
    quantity_change: Decimal,
    transaction_type: String,
    user_id: Option<String>,
    related_mrn: Option<String>,
    related_po_id: Option<i64>,
    notes: Option<String>,
}

/// Filters for the transaction history listing
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub item_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub user_id: Option<String>,
    pub related_mrn: Option<String>,
    pub related_po_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock transaction in its own database transaction
    pub async fn record_transaction(
        &self,
        input: RecordTransactionInput,
    ) -> AppResult<StockTransaction> {
        let mut tx = self.db.begin().await?;
        let recorded = Self::record_in_tx(
            &mut tx,
            input.item_id,
            input.quantity_change,
            input.transaction_type,
            input.user_id.as_deref().unwrap_or("System"),
            input.related_mrn.as_deref(),
            input.related_po_id,
            input.notes.as_deref(),
        )
        .await?;
        tx.commit().await?;
        Ok(recorded)
    }

    /// Record a stock transaction as part of a caller-owned transaction.
    ///
    /// Used by goods receiving, indent fulfilment and sale recording so the
    /// ledger entry, the stock adjustment and the caller's own writes either
    /// all commit or all roll back.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        item_id: i64,
        quantity_change: Decimal,
        transaction_type: TransactionType,
        user_id: &str,
        related_mrn: Option<&str>,
        related_po_id: Option<i64>,
        notes: Option<&str>,
    ) -> AppResult<StockTransaction> {
        if quantity_change == Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity_change".to_string(),
                message: "Quantity change must be non-zero".to_string(),
            });
        }

        let user_id = user_id.trim();
        let user_id = if user_id.is_empty() { "System" } else { user_id };

        let updated = sqlx::query(
            "UPDATE items SET current_stock = current_stock + $1, updated_at = NOW() WHERE item_id = $2",
        )
        .bind(quantity_change)
        .bind(item_id)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let recorded = sqlx::query_as::<_, StockTransaction>(
            r#"
            INSERT INTO stock_transactions
                (item_id, quantity_change, transaction_type, user_id, related_mrn, related_po_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING transaction_id, item_id, quantity_change, transaction_type, user_id,
                      related_mrn, related_po_id, notes, transaction_date
            "#,
        )
        .bind(item_id)
        .bind(quantity_change)
        .bind(transaction_type.as_str())
        .bind(user_id)
        .bind(related_mrn)
        .bind(related_po_id)
        .bind(notes)
        .fetch_one(&mut **tx)
        .await?;

        Ok(recorded)
    }

    /// Bulk import stock transactions from CSV text.
    ///
    /// Each row is recorded in its own transaction; failures are collected
    /// per row and the batch continues.
    pub async fn bulk_import(&self, csv_text: &str) -> AppResult<BulkImportResult> {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| AppError::ValidationError(e.to_string()))?
            .clone();
        if headers.iter().ne(IMPORT_COLUMNS.iter().copied()) {
            return Err(AppError::ValidationError(format!(
                "Unexpected CSV header; expected: {}",
                IMPORT_COLUMNS.join(",")
            )));
        }

        let mut inserted = 0usize;
        let mut errors = Vec::new();

        for (idx, record) in reader.deserialize::<CsvTransactionRow>().enumerate() {
            let line = idx + 2; // header is line 1
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    errors.push(format!("row {}: {}", line, e));
                    continue;
                }
            };

            let Some(transaction_type) = TransactionType::parse(row.transaction_type.trim())
            else {
                errors.push(format!(
                    "row {}: invalid transaction type '{}'",
                    line, row.transaction_type
                ));
                continue;
            };

            let input = RecordTransactionInput {
                item_id: row.item_id,
                quantity_change: row.quantity_change,
                transaction_type,
                user_id: row.user_id,
                related_mrn: row.related_mrn,
                related_po_id: row.related_po_id,
                notes: row.notes,
            };

            match self.record_transaction(input).await {
                Ok(_) => inserted += 1,
                Err(e) => errors.push(format!("row {}: {}", line, e)),
            }
        }

        Ok(BulkImportResult { inserted, errors })
    }

    /// List stock transactions matching the given filters
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> AppResult<Vec<StockTransactionView>> {
        let transactions = sqlx::query_as::<_, StockTransactionView>(
            r#"
            SELECT st.transaction_id, st.item_id, i.name AS item_name, i.base_unit AS item_unit,
                   st.quantity_change, st.transaction_type, st.user_id, st.notes,
                   st.related_mrn, st.related_po_id, st.transaction_date
            FROM stock_transactions st
            JOIN items i ON st.item_id = i.item_id
            WHERE ($1::bigint IS NULL OR st.item_id = $1)
              AND ($2::text IS NULL OR st.transaction_type = $2)
              AND ($3::text IS NULL OR st.user_id ILIKE '%' || $3 || '%')
              AND ($4::text IS NULL OR st.related_mrn ILIKE '%' || $4 || '%')
              AND ($5::bigint IS NULL OR st.related_po_id = $5)
              AND ($6::date IS NULL OR DATE(st.transaction_date) >= $6)
              AND ($7::date IS NULL OR DATE(st.transaction_date) <= $7)
            ORDER BY st.transaction_date DESC, st.transaction_id DESC
            "#,
        )
        .bind(filter.item_id)
        .bind(filter.transaction_type.map(|t| t.as_str()))
        .bind(filter.user_id.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.related_mrn.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.related_po_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    /// Current stock for an item, recomputed from the ledger.
    ///
    /// The stored `items.current_stock` is maintained incrementally; this
    /// derives the same figure from first principles for reconciliation.
    pub async fn derive_balance(&self, item_id: i64) -> AppResult<Decimal> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE item_id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let balance = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(quantity_change) FROM stock_transactions WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(Decimal::ZERO);

        Ok(balance)
    }
}
