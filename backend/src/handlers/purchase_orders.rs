//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::purchase_order::{
    CreatePurchaseOrderInput, PurchaseOrder, PurchaseOrderFilter, PurchaseOrderService,
    PurchaseOrderSummary, PurchaseOrderWithItems, UpdatePoStatusInput,
};
use crate::AppState;

/// List purchase orders with optional filters
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(filter): Query<PurchaseOrderFilter>,
) -> AppResult<Json<Vec<PurchaseOrderSummary>>> {
    let service = PurchaseOrderService::new(state.db);
    let orders = service.list_purchase_orders(filter).await?;
    Ok(Json(orders))
}

/// Create a draft purchase order with its lines
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.create_purchase_order(input).await?;
    Ok(Json(order))
}

/// Get a purchase order with its lines and received totals
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.get_purchase_order(po_id).await?;
    Ok(Json(order))
}

/// Move a purchase order to a new status
pub async fn update_purchase_order_status(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
    Json(input): Json<UpdatePoStatusInput>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.update_status(po_id, input).await?;
    Ok(Json(order))
}
