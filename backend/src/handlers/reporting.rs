//! HTTP handlers for reporting endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::reporting::{DashboardMetrics, LowStockItem, ReportingService};
use crate::AppState;

/// Headline dashboard numbers
pub async fn get_dashboard_metrics(
    State(state): State<AppState>,
) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.db);
    let metrics = service.get_dashboard_metrics().await?;
    Ok(Json(metrics))
}

/// Active items at or below their reorder point
pub async fn get_low_stock_report(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LowStockItem>>> {
    let service = ReportingService::new(state.db);
    let items = service.get_low_stock_items().await?;
    Ok(Json(items))
}
