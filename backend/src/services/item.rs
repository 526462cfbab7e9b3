//! Item master service: CRUD, soft-deactivation, CSV bulk import/export

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use shared::UnitInference;

/// Expected header of the bulk import CSV, in order.
pub const IMPORT_COLUMNS: &[&str] = &[
    "name",
    "base_unit",
    "purchase_unit",
    "category",
    "sub_category",
    "permitted_departments",
    "reorder_point",
    "current_stock",
    "notes",
    "is_active",
];

/// Item service for master data management
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
    inference: Arc<UnitInference>,
}

/// An inventory item. Items are soft-deactivated, never deleted, because
/// the stock ledger and historical documents keep referencing them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub item_id: i64,
    pub name: String,
    pub base_unit: String,
    pub purchase_unit: String,
    pub conversion_factor: Decimal,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub permitted_departments: Option<String>,
    pub reorder_point: Decimal,
    pub current_stock: Decimal,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item
#[derive(Debug, Default, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub base_unit: Option<String>,
    pub purchase_unit: Option<String>,
    pub conversion_factor: Option<Decimal>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub permitted_departments: Option<String>,
    pub reorder_point: Option<Decimal>,
    pub current_stock: Option<Decimal>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for updating an item; absent fields keep their current value
#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub base_unit: Option<String>,
    pub purchase_unit: Option<String>,
    pub conversion_factor: Option<Decimal>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub permitted_departments: Option<String>,
    pub reorder_point: Option<Decimal>,
    pub notes: Option<String>,
}

/// Filters for the item listing
#[derive(Debug, Default, Deserialize)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub include_inactive: Option<bool>,
}

/// Outcome of a CSV bulk import: the batch never aborts on a bad row
#[derive(Debug, Serialize)]
pub struct BulkImportResult {
    pub inserted: usize,
    pub errors: Vec<String>,
}

/// One row of the bulk import CSV
#[derive(Debug, Deserialize)]
struct CsvItemRow {
    name: String,
    base_unit: Option<String>,
    purchase_unit: Option<String>,
    category: Option<String>,
    sub_category: Option<String>,
    permitted_departments: Option<String>,
    reorder_point: Option<Decimal>,
    current_stock: Option<Decimal>,
    notes: Option<String>,
    is_active: Option<String>,
}

fn strip_or_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Coerce the permissive truthy spellings used in import files.
fn parse_flag(value: Option<&str>) -> Result<bool, String> {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(true);
    };
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        other => Err(format!("invalid is_active value '{}'", other)),
    }
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool, inference: Arc<UnitInference>) -> Self {
        Self { db, inference }
    }

    /// Create an item. Units left blank are inferred from the name and
    /// category so staff can add items quickly.
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Item name is required".to_string(),
            });
        }

        let category = strip_or_none(input.category);
        let inferred = self.inference.infer(&name, category.as_deref());
        let base_unit = strip_or_none(input.base_unit).unwrap_or_else(|| inferred.base_unit.clone());
        let purchase_unit = strip_or_none(input.purchase_unit)
            .or_else(|| inferred.purchase_unit.clone())
            .unwrap_or_else(|| base_unit.clone());

        let reorder_point = input.reorder_point.unwrap_or(Decimal::ZERO);
        if reorder_point < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "reorder_point".to_string(),
                message: "Reorder point cannot be negative".to_string(),
            });
        }
        let conversion_factor = input.conversion_factor.unwrap_or(Decimal::ONE);
        if conversion_factor <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "conversion_factor".to_string(),
                message: "Conversion factor must be positive".to_string(),
            });
        }

        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, base_unit, purchase_unit, conversion_factor, category,
                               sub_category, permitted_departments, reorder_point, current_stock,
                               notes, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING item_id, name, base_unit, purchase_unit, conversion_factor, category,
                      sub_category, permitted_departments, reorder_point, current_stock, notes,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&base_unit)
        .bind(&purchase_unit)
        .bind(conversion_factor)
        .bind(&category)
        .bind(strip_or_none(input.sub_category))
        .bind(strip_or_none(input.permitted_departments))
        .bind(reorder_point)
        .bind(input.current_stock.unwrap_or(Decimal::ZERO))
        .bind(strip_or_none(input.notes))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "item name"))?;

        Ok(item)
    }

    /// Update an item's master data; stock is only changed via the ledger
    pub async fn update_item(&self, item_id: i64, input: UpdateItemInput) -> AppResult<Item> {
        let existing = self.get_item(item_id).await?;

        let name = match input.name {
            Some(n) => {
                let n = n.trim().to_string();
                if n.is_empty() {
                    return Err(AppError::Validation {
                        field: "name".to_string(),
                        message: "Item name is required".to_string(),
                    });
                }
                n
            }
            None => existing.name,
        };
        let reorder_point = input.reorder_point.unwrap_or(existing.reorder_point);
        if reorder_point < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "reorder_point".to_string(),
                message: "Reorder point cannot be negative".to_string(),
            });
        }
        let conversion_factor = input.conversion_factor.unwrap_or(existing.conversion_factor);
        if conversion_factor <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "conversion_factor".to_string(),
                message: "Conversion factor must be positive".to_string(),
            });
        }

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = $1, base_unit = $2, purchase_unit = $3, conversion_factor = $4,
                category = $5, sub_category = $6, permitted_departments = $7,
                reorder_point = $8, notes = $9, updated_at = NOW()
            WHERE item_id = $10
            RETURNING item_id, name, base_unit, purchase_unit, conversion_factor, category,
                      sub_category, permitted_departments, reorder_point, current_stock, notes,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(strip_or_none(input.base_unit).unwrap_or(existing.base_unit))
        .bind(strip_or_none(input.purchase_unit).unwrap_or(existing.purchase_unit))
        .bind(conversion_factor)
        .bind(strip_or_none(input.category).or(existing.category))
        .bind(strip_or_none(input.sub_category).or(existing.sub_category))
        .bind(strip_or_none(input.permitted_departments).or(existing.permitted_departments))
        .bind(reorder_point)
        .bind(strip_or_none(input.notes).or(existing.notes))
        .bind(item_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "item name"))?;

        Ok(item)
    }

    /// Get an item by id
    pub async fn get_item(&self, item_id: i64) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(
            r#"
            SELECT item_id, name, base_unit, purchase_unit, conversion_factor, category,
                   sub_category, permitted_departments, reorder_point, current_stock, notes,
                   is_active, created_at, updated_at
            FROM items
            WHERE item_id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// List items matching the given filters
    pub async fn list_items(&self, filter: ItemFilter) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT item_id, name, base_unit, purchase_unit, conversion_factor, category,
                   sub_category, permitted_departments, reorder_point, current_stock, notes,
                   is_active, created_at, updated_at
            FROM items
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR category = $2)
              AND ($3::boolean OR is_active)
            ORDER BY name
            "#,
        )
        .bind(filter.search.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.category.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.include_inactive.unwrap_or(false))
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Soft-deactivate an item
    pub async fn deactivate_item(&self, item_id: i64) -> AppResult<()> {
        self.set_active(item_id, false).await
    }

    /// Reactivate a previously deactivated item
    pub async fn reactivate_item(&self, item_id: i64) -> AppResult<()> {
        self.set_active(item_id, true).await
    }

    async fn set_active(&self, item_id: i64, active: bool) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE items SET is_active = $1, updated_at = NOW() WHERE item_id = $2")
                .bind(active)
                .bind(item_id)
                .execute(&self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }
        Ok(())
    }

    /// Bulk import items from CSV text.
    ///
    /// Each row is validated and inserted independently; failures are
    /// collected per row and reported alongside the success count.
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

        for (idx, record) in reader.deserialize::<CsvItemRow>().enumerate() {
            let line = idx + 2; // header is line 1
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    errors.push(format!("row {}: {}", line, e));
                    continue;
                }
            };

            let is_active = match parse_flag(row.is_active.as_deref()) {
                Ok(flag) => flag,
                Err(e) => {
                    errors.push(format!("row {}: {}", line, e));
                    continue;
                }
            };

            let input = CreateItemInput {
                name: row.name,
                base_unit: row.base_unit,
                purchase_unit: row.purchase_unit,
                category: row.category,
                sub_category: row.sub_category,
                permitted_departments: row.permitted_departments,
                reorder_point: row.reorder_point,
                current_stock: row.current_stock,
                notes: row.notes,
                is_active: Some(is_active),
                ..Default::default()
            };

            match self.create_item(input).await {
                Ok(_) => inserted += 1,
                Err(e) => errors.push(format!("row {}: {}", line, e)),
            }
        }

        Ok(BulkImportResult { inserted, errors })
    }

    /// Export the item master as CSV using the bulk import column layout
    pub async fn export_csv(&self) -> AppResult<String> {
        let items = self
            .list_items(ItemFilter {
                include_inactive: Some(true),
                ..Default::default()
            })
            .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(IMPORT_COLUMNS)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        for item in items {
            writer
                .write_record(&[
                    item.name,
                    item.base_unit,
                    item.purchase_unit,
                    item.category.unwrap_or_default(),
                    item.sub_category.unwrap_or_default(),
                    item.permitted_departments.unwrap_or_default(),
                    item.reorder_point.to_string(),
                    item.current_stock.to_string(),
                    item.notes.unwrap_or_default(),
                    item.is_active.to_string(),
                ])
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
    }
}
