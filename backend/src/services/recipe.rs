//! Recipe service: recipe and component registry, the component guard
//! pipeline (kind, reference, unit, cycle), cloning and sale recording
//!
//! `component_id` is polymorphic: its target table depends on
//! `component_kind`, so referential integrity and acyclicity are enforced
//! here, inside the same transaction as every component write.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::{AppError, AppResult};
use crate::services::stock::StockService;
use shared::{
    creates_cycle, expand_item_requirements, ComponentEdge, ComponentKind, ComponentRef,
    ExpansionError, TransactionType,
};

/// Recipe service for menu item composition
#[derive(Clone)]
pub struct RecipeService {
    db: PgPool,
}

/// Recipe header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Recipe {
    pub recipe_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub recipe_type: Option<String>,
    pub default_yield_qty: Decimal,
    pub default_yield_unit: Option<String>,
    pub plating_notes: Option<String>,
    pub tags: serde_json::Value,
    pub version: Option<i32>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Component row joined with the referenced item or sub-recipe name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ComponentView {
    pub id: i64,
    pub parent_recipe_id: i64,
    pub component_kind: String,
    pub component_id: i64,
    pub component_name: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub loss_pct: Decimal,
    pub sort_order: i32,
    pub notes: Option<String>,
}

/// Recipe with its ordered component list
#[derive(Debug, Serialize)]
pub struct RecipeWithComponents {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub components: Vec<ComponentView>,
}

/// One component of a recipe payload
#[derive(Debug, Deserialize)]
pub struct ComponentInput {
    pub component_kind: String,
    pub component_id: i64,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub loss_pct: Option<Decimal>,
    pub sort_order: Option<i32>,
    pub notes: Option<String>,
}

/// Input for creating a recipe
#[derive(Debug, Deserialize)]
pub struct CreateRecipeInput {
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "type")]
    pub recipe_type: Option<String>,
    pub default_yield_qty: Option<Decimal>,
    pub default_yield_unit: Option<String>,
    pub plating_notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub version: Option<i32>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub components: Vec<ComponentInput>,
}

/// Input for updating a recipe; the component list is replaced wholesale
pub type UpdateRecipeInput = CreateRecipeInput;

/// Input for cloning a recipe under a new name
#[derive(Debug, Deserialize)]
pub struct CloneRecipeInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for recording a sale of a recipe
#[derive(Debug, Deserialize)]
pub struct RecordSaleInput {
    pub quantity: Decimal,
    pub user_id: Option<String>,
    pub notes: Option<String>,
}

/// Recorded sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleTransaction {
    pub sale_id: i64,
    pub recipe_id: i64,
    pub quantity: Decimal,
    pub user_id: String,
    pub notes: Option<String>,
    pub sale_date: DateTime<Utc>,
}

/// Filters for the recipe listing
#[derive(Debug, Default, Deserialize)]
pub struct RecipeFilter {
    pub include_inactive: Option<bool>,
    #[serde(rename = "type")]
    pub recipe_type: Option<String>,
}

fn strip_or_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

const RECIPE_COLUMNS: &str = "recipe_id, name, description, is_active, type, default_yield_qty, \
     default_yield_unit, plating_notes, tags, version, effective_from, effective_to, \
     created_at, updated_at";

impl RecipeService {
    /// Create a new RecipeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List recipes with optional type filtering
    pub async fn list_recipes(&self, filter: RecipeFilter) -> AppResult<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE ($1::boolean OR is_active)
              AND ($2::text IS NULL OR type = $2)
            ORDER BY name
            "#
        ))
        .bind(filter.include_inactive.unwrap_or(false))
        .bind(filter.recipe_type.as_deref().filter(|s| !s.trim().is_empty()))
        .fetch_all(&self.db)
        .await?;

        Ok(recipes)
    }

    /// Get a recipe with its ordered component breakdown
    pub async fn get_recipe(&self, recipe_id: i64) -> AppResult<RecipeWithComponents> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE recipe_id = $1"
        ))
        .bind(recipe_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        let components = sqlx::query_as::<_, ComponentView>(
            r#"
            SELECT rc.id, rc.parent_recipe_id, rc.component_kind, rc.component_id,
                   COALESCE(i.name, r.name) AS component_name,
                   rc.quantity, rc.unit, rc.loss_pct, rc.sort_order, rc.notes
            FROM recipe_components rc
            LEFT JOIN items i ON rc.component_kind = 'ITEM' AND rc.component_id = i.item_id
            LEFT JOIN recipes r ON rc.component_kind = 'RECIPE' AND rc.component_id = r.recipe_id
            WHERE rc.parent_recipe_id = $1
            ORDER BY rc.sort_order, rc.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await?;

        Ok(RecipeWithComponents { recipe, components })
    }

    /// Create a recipe and its component rows in one transaction
    pub async fn create_recipe(&self, input: CreateRecipeInput) -> AppResult<RecipeWithComponents> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Recipe name is required".to_string(),
            });
        }
        if input.components.is_empty() {
            return Err(AppError::ValidationError(
                "At least one component is required".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let recipe_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (name, description, is_active, type, default_yield_qty,
                                 default_yield_unit, plating_notes, tags, version,
                                 effective_from, effective_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING recipe_id
            "#,
        )
        .bind(&name)
        .bind(strip_or_none(input.description))
        .bind(input.is_active.unwrap_or(true))
        .bind(strip_or_none(input.recipe_type))
        .bind(input.default_yield_qty.unwrap_or(Decimal::ZERO))
        .bind(strip_or_none(input.default_yield_unit))
        .bind(strip_or_none(input.plating_notes))
        .bind(serde_json::json!(input.tags.unwrap_or_default()))
        .bind(input.version)
        .bind(input.effective_from)
        .bind(input.effective_to)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "recipe name"))?;

        Self::insert_components(&mut tx, recipe_id, &input.components).await?;

        tx.commit().await?;
        tracing::info!("Created recipe '{}' ({})", name, recipe_id);
        self.get_recipe(recipe_id).await
    }

    /// Update a recipe header and replace its component list
    pub async fn update_recipe(
        &self,
        recipe_id: i64,
        input: UpdateRecipeInput,
    ) -> AppResult<RecipeWithComponents> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Recipe name is required".to_string(),
            });
        }
        if input.components.is_empty() {
            return Err(AppError::ValidationError(
                "At least one component is required".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE recipes
            SET name = $1, description = $2, is_active = $3, type = $4, default_yield_qty = $5,
                default_yield_unit = $6, plating_notes = $7, tags = $8, version = $9,
                effective_from = $10, effective_to = $11, updated_at = NOW()
            WHERE recipe_id = $12
            "#,
        )
        .bind(&name)
        .bind(strip_or_none(input.description))
        .bind(input.is_active.unwrap_or(true))
        .bind(strip_or_none(input.recipe_type))
        .bind(input.default_yield_qty.unwrap_or(Decimal::ZERO))
        .bind(strip_or_none(input.default_yield_unit))
        .bind(strip_or_none(input.plating_notes))
        .bind(serde_json::json!(input.tags.unwrap_or_default()))
        .bind(input.version)
        .bind(input.effective_from)
        .bind(input.effective_to)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "recipe name"))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Recipe".to_string()));
        }

        sqlx::query("DELETE FROM recipe_components WHERE parent_recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        Self::insert_components(&mut tx, recipe_id, &input.components).await?;

        tx.commit().await?;
        self.get_recipe(recipe_id).await
    }

    /// Delete a recipe. Blocked while other recipes still reference it as a
    /// sub-recipe; the recipe's own component rows cascade.
    pub async fn delete_recipe(&self, recipe_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let referenced_by: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM recipe_components WHERE component_kind = 'RECIPE' AND component_id = $1",
        )
        .bind(recipe_id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced_by > 0 {
            return Err(AppError::InvalidReference(format!(
                "Recipe is used as a sub-recipe by {} component(s); deletion is blocked",
                referenced_by
            )));
        }

        let deleted = sqlx::query("DELETE FROM recipes WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Recipe".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Duplicate a recipe and its component rows under a new name
    pub async fn clone_recipe(
        &self,
        recipe_id: i64,
        input: CloneRecipeInput,
    ) -> AppResult<RecipeWithComponents> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "New recipe name is required".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let new_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (name, description, is_active, type, default_yield_qty,
                                 default_yield_unit, plating_notes, tags, version,
                                 effective_from, effective_to)
            SELECT $1, COALESCE($2, description), is_active, type, default_yield_qty,
                   default_yield_unit, plating_notes, tags, version,
                   effective_from, effective_to
            FROM recipes
            WHERE recipe_id = $3
            RETURNING recipe_id
            "#,
        )
        .bind(&name)
        .bind(strip_or_none(input.description))
        .bind(recipe_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "recipe name"))?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        // The source passed the guards when it was written; a fresh id
        // cannot introduce a cycle, so rows are copied verbatim.
        sqlx::query(
            r#"
            INSERT INTO recipe_components (parent_recipe_id, component_kind, component_id,
                                           quantity, unit, loss_pct, sort_order, notes)
            SELECT $1, component_kind, component_id, quantity, unit, loss_pct, sort_order, notes
            FROM recipe_components
            WHERE parent_recipe_id = $2
            "#,
        )
        .bind(new_id)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Cloned recipe {} into '{}' ({})", recipe_id, name, new_id);
        self.get_recipe(new_id).await
    }

    /// Record a sale of a recipe and deduct ingredient stock.
    ///
    /// The component graph is expanded into raw-item requirements and one
    /// SALE ledger entry is recorded per leaf item, all in one transaction.
    pub async fn record_sale(
        &self,
        recipe_id: i64,
        input: RecordSaleInput,
    ) -> AppResult<SaleTransaction> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Sale quantity must be positive".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let is_active: bool =
            sqlx::query_scalar("SELECT is_active FROM recipes WHERE recipe_id = $1")
                .bind(recipe_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;
        if !is_active {
            return Err(AppError::ValidationError("Recipe is inactive".to_string()));
        }

        let edges = Self::load_all_edges(&mut tx).await?;
        let totals = expand_item_requirements(&edges, recipe_id, input.quantity).map_err(
            |e| match e {
                ExpansionError::CircularReference(id) => AppError::CircularReference(format!(
                    "circular reference detected during expansion at recipe {}",
                    id
                )),
                other => AppError::ValidationError(other.to_string()),
            },
        )?;

        // Every leaf item must still be active; inactive ingredients mean
        // the recipe needs attention before it can be sold.
        let item_ids: Vec<i64> = totals.keys().copied().collect();
        let inactive: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM items WHERE item_id = ANY($1) AND NOT is_active",
        )
        .bind(&item_ids)
        .fetch_all(&mut *tx)
        .await?;
        if let Some(name) = inactive.first() {
            return Err(AppError::ValidationError(format!(
                "Inactive item component encountered: {}",
                name
            )));
        }

        let user_id = input
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("System");

        let sale = sqlx::query_as::<_, SaleTransaction>(
            r#"
            INSERT INTO sales_transactions (recipe_id, quantity, user_id, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING sale_id, recipe_id, quantity, user_id, notes, sale_date
            "#,
        )
        .bind(recipe_id)
        .bind(input.quantity)
        .bind(user_id)
        .bind(input.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .fetch_one(&mut *tx)
        .await?;

        for (item_id, qty) in &totals {
            StockService::record_in_tx(
                &mut tx,
                *item_id,
                -qty,
                TransactionType::Sale,
                user_id,
                None,
                None,
                Some(&format!("Recipe {} sale", recipe_id)),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(sale)
    }

    /// Validate and insert component rows for `parent_id`.
    ///
    /// Guard order: kind parse, then the polymorphic reference check, then
    /// unit consistency, then the cycle check. An invalid reference must be
    /// rejected before any graph traversal runs. All of it shares the
    /// caller's transaction so no interleaved write can sneak a cycle past
    /// the check.
    async fn insert_components(
        tx: &mut Transaction<'_, Postgres>,
        parent_id: i64,
        components: &[ComponentInput],
    ) -> AppResult<()> {
        for (idx, comp) in components.iter().enumerate() {
            if comp.quantity <= Decimal::ZERO {
                return Err(AppError::ValidationError(format!(
                    "Quantity must be greater than 0 in component row {}",
                    idx + 1
                )));
            }
            let loss_pct = comp.loss_pct.unwrap_or(Decimal::ZERO);
            if loss_pct < Decimal::ZERO || loss_pct >= Decimal::from(100) {
                return Err(AppError::ValidationError(format!(
                    "Loss percentage must be in [0, 100) in component row {}",
                    idx + 1
                )));
            }

            let component = ComponentRef::parse(&comp.component_kind, comp.component_id)?;
            let unit = strip_or_none(comp.unit.clone());

            let unit = match component {
                ComponentRef::Item(item_id) => {
                    let base_unit: String =
                        sqlx::query_scalar("SELECT base_unit FROM items WHERE item_id = $1")
                            .bind(item_id)
                            .fetch_optional(&mut **tx)
                            .await?
                            .ok_or_else(|| {
                                AppError::InvalidReference(format!(
                                    "Component item {} does not exist",
                                    item_id
                                ))
                            })?;
                    match unit {
                        Some(u) if u != base_unit => {
                            return Err(AppError::ValidationError(format!(
                                "Unit mismatch for item component {}: use {}",
                                item_id, base_unit
                            )));
                        }
                        _ => base_unit,
                    }
                }
                ComponentRef::Recipe(child_id) => {
                    if child_id == parent_id {
                        return Err(AppError::ValidationError(
                            "A recipe cannot contain itself".to_string(),
                        ));
                    }
                    let yield_unit: Option<String> = sqlx::query_scalar(
                        "SELECT default_yield_unit FROM recipes WHERE recipe_id = $1",
                    )
                    .bind(child_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or_else(|| {
                        AppError::InvalidReference(format!(
                            "Component recipe {} does not exist",
                            child_id
                        ))
                    })?;

                    let edges = sqlx::query_as::<_, (i64, i64)>(
                        "SELECT parent_recipe_id, component_id FROM recipe_components WHERE component_kind = 'RECIPE'",
                    )
                    .fetch_all(&mut **tx)
                    .await?;
                    if creates_cycle(&edges, parent_id, child_id) {
                        return Err(AppError::CircularReference(format!(
                            "Adding recipe {} to recipe {} would create a circular reference",
                            child_id, parent_id
                        )));
                    }

                    unit.or(yield_unit).ok_or_else(|| {
                        AppError::ValidationError(format!(
                            "Missing unit for recipe component {}",
                            child_id
                        ))
                    })?
                }
            };

            sqlx::query(
                r#"
                INSERT INTO recipe_components (parent_recipe_id, component_kind, component_id,
                                               quantity, unit, loss_pct, sort_order, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(parent_id)
            .bind(component.kind().as_str())
            .bind(component.id())
            .bind(comp.quantity)
            .bind(&unit)
            .bind(loss_pct)
            .bind(comp.sort_order.unwrap_or((idx + 1) as i32))
            .bind(strip_or_none(comp.notes.clone()))
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::on_unique_violation(e, "recipe component"))?;
        }

        Ok(())
    }

    /// Load every component edge, for graph expansion inside a transaction
    async fn load_all_edges(
        tx: &mut Transaction<'_, Postgres>,
    ) -> AppResult<Vec<ComponentEdge>> {
        let rows = sqlx::query_as::<_, (i64, String, i64, Decimal, Decimal)>(
            "SELECT parent_recipe_id, component_kind, component_id, quantity, loss_pct FROM recipe_components",
        )
        .fetch_all(&mut **tx)
        .await?;

        let mut edges = Vec::with_capacity(rows.len());
        for (parent, kind, component_id, quantity, loss_pct) in rows {
            let kind = match kind.as_str() {
                "ITEM" => ComponentKind::Item,
                "RECIPE" => ComponentKind::Recipe,
                other => {
                    return Err(AppError::Internal(format!(
                        "unknown component kind '{}' in storage",
                        other
                    )))
                }
            };
            edges.push(ComponentEdge {
                parent_recipe_id: parent,
                kind,
                component_id,
                quantity,
                loss_pct,
            });
        }
        Ok(edges)
    }
}
