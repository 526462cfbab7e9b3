//! Reporting service for dashboard metrics and low-stock visibility

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_items: i64,
    pub active_items: i64,
    pub low_stock_items: i64,
    pub pending_indents: i64,
    pub open_purchase_orders: i64,
    pub active_recipes: i64,
    pub transactions_last_7_days: i64,
}

/// Active item at or below its reorder point
#[derive(Debug, Serialize, FromRow)]
pub struct LowStockItem {
    pub item_id: i64,
    pub name: String,
    pub base_unit: String,
    pub category: Option<String>,
    pub current_stock: Decimal,
    pub reorder_point: Decimal,
    pub deficit: Decimal,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Collect the headline dashboard numbers
    pub async fn get_dashboard_metrics(&self) -> AppResult<DashboardMetrics> {
        let (total_items, active_items, low_stock_items): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE is_active),
                   COUNT(*) FILTER (WHERE is_active AND current_stock <= reorder_point)
            FROM items
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let pending_indents: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM indents WHERE status IN ('Submitted', 'Processing')",
        )
        .fetch_one(&self.db)
        .await?;

        let open_purchase_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM purchase_orders WHERE status IN ('ORDERED', 'PARTIAL')",
        )
        .fetch_one(&self.db)
        .await?;

        let active_recipes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE is_active")
            .fetch_one(&self.db)
            .await?;

        let transactions_last_7_days: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_transactions WHERE transaction_date >= NOW() - INTERVAL '7 days'",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardMetrics {
            total_items,
            active_items,
            low_stock_items,
            pending_indents,
            open_purchase_orders,
            active_recipes,
            transactions_last_7_days,
        })
    }

    /// Active items at or below their reorder point, worst deficit first
    pub async fn get_low_stock_items(&self) -> AppResult<Vec<LowStockItem>> {
        let items = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT item_id, name, base_unit, category, current_stock, reorder_point,
                   reorder_point - current_stock AS deficit
            FROM items
            WHERE is_active AND current_stock <= reorder_point
            ORDER BY reorder_point - current_stock DESC, name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }
}
