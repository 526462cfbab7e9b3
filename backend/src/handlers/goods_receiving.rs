//! HTTP handlers for goods receiving endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::goods_receiving::{
    CreateGrnInput, GoodsReceivedNote, GoodsReceivingService, GrnFilter, GrnWithItems,
};
use crate::AppState;

/// List goods received notes with optional filters
pub async fn list_grns(
    State(state): State<AppState>,
    Query(filter): Query<GrnFilter>,
) -> AppResult<Json<Vec<GoodsReceivedNote>>> {
    let service = GoodsReceivingService::new(state.db);
    let grns = service.list_grns(filter).await?;
    Ok(Json(grns))
}

/// Create a GRN, posting stock and updating the linked purchase order
pub async fn create_grn(
    State(state): State<AppState>,
    Json(input): Json<CreateGrnInput>,
) -> AppResult<Json<GrnWithItems>> {
    let service = GoodsReceivingService::new(state.db);
    let grn = service.create_grn(input).await?;
    Ok(Json(grn))
}

/// Get a GRN with its lines
pub async fn get_grn(
    State(state): State<AppState>,
    Path(grn_id): Path<i64>,
) -> AppResult<Json<GrnWithItems>> {
    let service = GoodsReceivingService::new(state.db);
    let grn = service.get_grn(grn_id).await?;
    Ok(Json(grn))
}
