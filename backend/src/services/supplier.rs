//! Supplier master service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Supplier service for vendor master data
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// A vendor. Soft-deactivated like items so purchase history stays intact.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub supplier_id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, message = "Supplier name is required"))]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a supplier; absent fields keep their current value
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Filters for the supplier listing
#[derive(Debug, Default, Deserialize)]
pub struct SupplierFilter {
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
}

fn strip_or_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl SupplierService {
    /// Create a new SupplierService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a supplier
    pub async fn create_supplier(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Supplier name is required".to_string(),
            });
        }

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, contact_person, phone, email, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING supplier_id, name, contact_person, phone, email, address, notes,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(strip_or_none(input.contact_person))
        .bind(strip_or_none(input.phone))
        .bind(strip_or_none(input.email))
        .bind(strip_or_none(input.address))
        .bind(strip_or_none(input.notes))
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "supplier name"))?;

        Ok(supplier)
    }

    /// Update a supplier
    pub async fn update_supplier(
        &self,
        supplier_id: i64,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let existing = self.get_supplier(supplier_id).await?;

        let name = match input.name {
            Some(n) => {
                let n = n.trim().to_string();
                if n.is_empty() {
                    return Err(AppError::Validation {
                        field: "name".to_string(),
                        message: "Supplier name is required".to_string(),
                    });
                }
                n
            }
            None => existing.name,
        };

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $1, contact_person = $2, phone = $3, email = $4, address = $5,
                notes = $6, updated_at = NOW()
            WHERE supplier_id = $7
            RETURNING supplier_id, name, contact_person, phone, email, address, notes,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(strip_or_none(input.contact_person).or(existing.contact_person))
        .bind(strip_or_none(input.phone).or(existing.phone))
        .bind(strip_or_none(input.email).or(existing.email))
        .bind(strip_or_none(input.address).or(existing.address))
        .bind(strip_or_none(input.notes).or(existing.notes))
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "supplier name"))?;

        Ok(supplier)
    }

    /// Get a supplier by id
    pub async fn get_supplier(&self, supplier_id: i64) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            r#"
            SELECT supplier_id, name, contact_person, phone, email, address, notes,
                   is_active, created_at, updated_at
            FROM suppliers
            WHERE supplier_id = $1
            "#,
        )
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// List suppliers matching the given filters
    pub async fn list_suppliers(&self, filter: SupplierFilter) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT supplier_id, name, contact_person, phone, email, address, notes,
                   is_active, created_at, updated_at
            FROM suppliers
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::boolean OR is_active)
            ORDER BY name
            "#,
        )
        .bind(filter.search.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(filter.include_inactive.unwrap_or(false))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    /// Soft-deactivate a supplier
    pub async fn deactivate_supplier(&self, supplier_id: i64) -> AppResult<()> {
        self.set_active(supplier_id, false).await
    }

    /// Reactivate a previously deactivated supplier
    pub async fn reactivate_supplier(&self, supplier_id: i64) -> AppResult<()> {
        self.set_active(supplier_id, true).await
    }

    async fn set_active(&self, supplier_id: i64, active: bool) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE suppliers SET is_active = $1, updated_at = NOW() WHERE supplier_id = $2",
        )
        .bind(active)
        .bind(supplier_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }
}
