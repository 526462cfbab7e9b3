//! HTTP handlers for item master endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;

use crate::error::AppResult;
use crate::services::item::{
    BulkImportResult, CreateItemInput, Item, ItemFilter, ItemService, UpdateItemInput,
};
use crate::services::stock::StockService;
use crate::AppState;

/// List items with optional search/category/active filters
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> AppResult<Json<Vec<Item>>> {
    let service = ItemService::new(state.db, state.unit_inference);
    let items = service.list_items(filter).await?;
    Ok(Json(items))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db, state.unit_inference);
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// Get an item by id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db, state.unit_inference);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Update an item's master data
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db, state.unit_inference);
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}

/// Soft-deactivate an item
pub async fn deactivate_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<Json<()>> {
    let service = ItemService::new(state.db, state.unit_inference);
    service.deactivate_item(item_id).await?;
    Ok(Json(()))
}

/// Reactivate a previously deactivated item
pub async fn reactivate_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<Json<()>> {
    let service = ItemService::new(state.db, state.unit_inference);
    service.reactivate_item(item_id).await?;
    Ok(Json(()))
}

/// Bulk import items from a CSV request body
pub async fn import_items(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<BulkImportResult>> {
    let service = ItemService::new(state.db, state.unit_inference);
    let result = service.bulk_import(&body).await?;
    Ok(Json(result))
}

/// Export the item master as CSV
pub async fn export_items(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = ItemService::new(state.db, state.unit_inference);
    let csv = service.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"items.csv\"",
            ),
        ],
        csv,
    ))
}

/// Current stock for an item, recomputed from the ledger
pub async fn get_item_balance(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<Json<Decimal>> {
    let service = StockService::new(state.db);
    let balance = service.derive_balance(item_id).await?;
    Ok(Json(balance))
}
