//! Indent (material request) service: MRN generation, creation, status
//! transitions and stock issue against indent lines

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::stock::StockService;
use shared::{
    format_mrn, indent_transition_allowed, IndentItemStatus, IndentStatus, TransactionType,
};

/// Indent service for departmental material requests
#[derive(Clone)]
pub struct IndentService {
    db: PgPool,
}

/// Indent header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Indent {
    pub indent_id: i64,
    pub mrn: String,
    pub requested_by: String,
    pub department: String,
    pub date_required: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    pub date_submitted: DateTime<Utc>,
    pub processed_by_user_id: Option<String>,
    pub date_processed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Indent line joined with item master data
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IndentItemView {
    pub indent_item_id: i64,
    pub indent_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub item_unit: String,
    pub requested_qty: Decimal,
    pub issued_qty: Decimal,
    pub item_status: String,
    pub notes: Option<String>,
}

/// Indent header plus aggregate line count, for list views
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IndentSummary {
    pub indent_id: i64,
    pub mrn: String,
    pub requested_by: String,
    pub department: String,
    pub date_required: NaiveDate,
    pub status: String,
    pub date_submitted: DateTime<Utc>,
    pub item_count: i64,
}

/// Indent with its lines
#[derive(Debug, Serialize)]
pub struct IndentWithItems {
    #[serde(flatten)]
    pub indent: Indent,
    pub items: Vec<IndentItemView>,
}

/// One requested line of a new indent
#[derive(Debug, Deserialize)]
pub struct IndentLineInput {
    pub item_id: i64,
    pub requested_qty: Decimal,
    pub notes: Option<String>,
}

/// Input for creating an indent
#[derive(Debug, Deserialize)]
pub struct CreateIndentInput {
    pub requested_by: String,
    pub department: String,
    pub date_required: NaiveDate,
    pub notes: Option<String>,
    pub items: Vec<IndentLineInput>,
}

/// Filters for the indent listing
#[derive(Debug, Default, Deserialize)]
pub struct IndentFilter {
    pub mrn: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Input for a status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: IndentStatus,
    pub user_id: Option<String>,
}

/// Input for issuing stock against an indent line
#[derive(Debug, Deserialize)]
pub struct IssueItemInput {
    pub quantity: Decimal,
    pub user_id: Option<String>,
}

impl IndentService {
    /// Create a new IndentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an indent and its lines in one transaction.
    ///
    /// The MRN is drawn from a database-owned sequence inside the same
    /// transaction, so it stays unique and monotonic across concurrent
    /// requests and server processes.
    pub async fn create_indent(&self, input: CreateIndentInput) -> AppResult<IndentWithItems> {
        let requested_by = input.requested_by.trim().to_string();
        if requested_by.is_empty() {
            return Err(AppError::Validation {
                field: "requested_by".to_string(),
                message: "Requester is required".to_string(),
            });
        }
        let department = input.department.trim().to_string();
        if department.is_empty() {
            return Err(AppError::Validation {
                field: "department".to_string(),
                message: "Department is required".to_string(),
            });
        }
        if input.items.is_empty() {
            return Err(AppError::ValidationError(
                "Indent must contain at least one item".to_string(),
            ));
        }
        for (i, line) in input.items.iter().enumerate() {
            if line.requested_qty <= Decimal::ZERO {
                return Err(AppError::ValidationError(format!(
                    "Requested quantity must be positive in item row {}",
                    i + 1
                )));
            }
        }

        let mut tx = self.db.begin().await?;

        // Reject dangling item references before touching the header.
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
                "One or more indent items reference unknown item ids".to_string(),
            ));
        }

        let sequence: i64 = sqlx::query_scalar("SELECT nextval('mrn_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let mrn = format_mrn(Utc::now(), sequence);

        let indent = sqlx::query_as::<_, Indent>(
            r#"
            INSERT INTO indents (mrn, requested_by, department, date_required, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING indent_id, mrn, requested_by, department, date_required, status, notes,
                      date_submitted, processed_by_user_id, date_processed, created_at, updated_at
            "#,
        )
        .bind(&mrn)
        .bind(&requested_by)
        .bind(&department)
        .bind(input.date_required)
        .bind(IndentStatus::Submitted.as_str())
        .bind(input.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "MRN"))?;

        for line in &input.items {
            sqlx::query(
                r#"
                INSERT INTO indent_items (indent_id, item_id, requested_qty, item_status, notes)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(indent.indent_id)
            .bind(line.item_id)
            .bind(line.requested_qty)
            .bind(IndentItemStatus::PendingIssue.as_str())
            .bind(line.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!("Created indent {} with {} lines", mrn, input.items.len());
        self.get_indent(indent.indent_id).await
    }

    /// List indents matching the given filters
    pub async fn list_indents(&self, filter: IndentFilter) -> AppResult<Vec<IndentSummary>> {
        let indents = sqlx::query_as::<_, IndentSummary>(
            r#"
            SELECT i.indent_id, i.mrn, i.requested_by, i.department, i.date_required,
                   i.status, i.date_submitted, COUNT(ii.indent_item_id) AS item_count
            FROM indents i
            LEFT JOIN indent_items ii ON i.indent_id = ii.indent_id
            WHERE ($1::text IS NULL OR i.mrn ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR i.department = $2)
              AND ($3::text IS NULL OR i.status = $3)
              AND ($4::date IS NULL OR DATE(i.date_submitted) >= $4)
              AND ($5::date IS NULL OR DATE(i.date_submitted) <= $5)
            GROUP BY i.indent_id
            ORDER BY i.date_submitted DESC, i.indent_id DESC
            "#,
        )
        .bind(filter.mrn.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.department.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.status.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(indents)
    }

    /// Get an indent with its lines
    pub async fn get_indent(&self, indent_id: i64) -> AppResult<IndentWithItems> {
        let indent = sqlx::query_as::<_, Indent>(
            r#"
            SELECT indent_id, mrn, requested_by, department, date_required, status, notes,
                   date_submitted, processed_by_user_id, date_processed, created_at, updated_at
            FROM indents
            WHERE indent_id = $1
            "#,
        )
        .bind(indent_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Indent".to_string()))?;

        let items = sqlx::query_as::<_, IndentItemView>(
            r#"
            SELECT ii.indent_item_id, ii.indent_id, ii.item_id, i.name AS item_name,
                   i.base_unit AS item_unit, ii.requested_qty, ii.issued_qty, ii.item_status,
                   ii.notes
            FROM indent_items ii
            JOIN items i ON ii.item_id = i.item_id
            WHERE ii.indent_id = $1
            ORDER BY ii.indent_item_id
            "#,
        )
        .bind(indent_id)
        .fetch_all(&self.db)
        .await?;

        Ok(IndentWithItems { indent, items })
    }

    /// Move an indent to a new status, validating the transition
    pub async fn update_status(
        &self,
        indent_id: i64,
        input: UpdateStatusInput,
    ) -> AppResult<Indent> {
        let current_raw: String =
            sqlx::query_scalar("SELECT status FROM indents WHERE indent_id = $1")
                .bind(indent_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Indent".to_string()))?;
        let current = IndentStatus::parse(&current_raw).ok_or_else(|| {
            AppError::Internal(format!("unknown indent status '{}' in storage", current_raw))
        })?;

        if !indent_transition_allowed(current, input.status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Indent cannot move from {} to {}",
                current.as_str(),
                input.status.as_str()
            )));
        }

        let processed_by = input
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("System");

        let indent = sqlx::query_as::<_, Indent>(
            r#"
            UPDATE indents
            SET status = $1,
                processed_by_user_id = $2,
                date_processed = CASE WHEN $3 THEN NOW() ELSE date_processed END,
                updated_at = NOW()
            WHERE indent_id = $4
            RETURNING indent_id, mrn, requested_by, department, date_required, status, notes,
                      date_submitted, processed_by_user_id, date_processed, created_at, updated_at
            "#,
        )
        .bind(input.status.as_str())
        .bind(processed_by)
        .bind(input.status.is_terminal())
        .bind(indent_id)
        .fetch_one(&self.db)
        .await?;

        Ok(indent)
    }

    /// Issue stock against one indent line.
    ///
    /// Records an INDENT_FULFILL ledger entry, advances the line status and
    /// moves a Submitted indent into Processing, all in one transaction.
    pub async fn issue_item(
        &self,
        indent_id: i64,
        indent_item_id: i64,
        input: IssueItemInput,
    ) -> AppResult<IndentItemView> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Issue quantity must be positive".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let header = sqlx::query_as::<_, (String, String)>(
            "SELECT mrn, status FROM indents WHERE indent_id = $1 FOR UPDATE",
        )
        .bind(indent_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Indent".to_string()))?;
        let (mrn, status_raw) = header;
        let status = IndentStatus::parse(&status_raw).ok_or_else(|| {
            AppError::Internal(format!("unknown indent status '{}' in storage", status_raw))
        })?;
        if status.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot issue stock against a {} indent",
                status.as_str()
            )));
        }

        let line = sqlx::query_as::<_, (i64, Decimal, Decimal, String)>(
            r#"
            SELECT item_id, requested_qty, issued_qty, item_status
            FROM indent_items
            WHERE indent_item_id = $1 AND indent_id = $2
            FOR UPDATE
            "#,
        )
        .bind(indent_item_id)
        .bind(indent_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Indent item".to_string()))?;
        let (item_id, requested_qty, issued_qty, line_status) = line;

        if line_status == IndentItemStatus::Cancelled.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Cannot issue stock against a cancelled indent line".to_string(),
            ));
        }

        let new_issued = issued_qty + input.quantity;
        if new_issued > requested_qty {
            return Err(AppError::ValidationError(format!(
                "Issuing {} would exceed the requested quantity {}",
                new_issued, requested_qty
            )));
        }

        let user_id = input.user_id.as_deref().unwrap_or("System");
        StockService::record_in_tx(
            &mut tx,
            item_id,
            -input.quantity,
            TransactionType::IndentFulfill,
            user_id,
            Some(&mrn),
            None,
            Some(&format!("Issued against {}", mrn)),
        )
        .await?;

        let new_line_status = if new_issued == requested_qty {
            IndentItemStatus::FullyIssued
        } else {
            IndentItemStatus::PartiallyIssued
        };
        sqlx::query(
            "UPDATE indent_items SET issued_qty = $1, item_status = $2 WHERE indent_item_id = $3",
        )
        .bind(new_issued)
        .bind(new_line_status.as_str())
        .bind(indent_item_id)
        .execute(&mut *tx)
        .await?;

        if status == IndentStatus::Submitted {
            sqlx::query("UPDATE indents SET status = $1, updated_at = NOW() WHERE indent_id = $2")
                .bind(IndentStatus::Processing.as_str())
                .bind(indent_id)
                .execute(&mut *tx)
                .await?;
        }

        let view = sqlx::query_as::<_, IndentItemView>(
            r#"
            SELECT ii.indent_item_id, ii.indent_id, ii.item_id, i.name AS item_name,
                   i.base_unit AS item_unit, ii.requested_qty, ii.issued_qty, ii.item_status,
                   ii.notes
            FROM indent_items ii
            JOIN items i ON ii.item_id = i.item_id
            WHERE ii.indent_item_id = $1
            "#,
        )
        .bind(indent_item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(view)
    }
}
