//! HTTP handlers for the stock transaction ledger

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::item::BulkImportResult;
use crate::services::stock::{
    RecordTransactionInput, StockService, StockTransaction, StockTransactionView,
    TransactionFilter,
};
use crate::AppState;

/// List stock transactions with optional filters
pub async fn list_stock_transactions(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<Vec<StockTransactionView>>> {
    let service = StockService::new(state.db);
    let transactions = service.list_transactions(filter).await?;
    Ok(Json(transactions))
}

/// Record a stock transaction
pub async fn record_stock_transaction(
    State(state): State<AppState>,
    Json(input): Json<RecordTransactionInput>,
) -> AppResult<Json<StockTransaction>> {
    let service = StockService::new(state.db);
    let transaction = service.record_transaction(input).await?;
    Ok(Json(transaction))
}

/// Bulk import stock transactions from a CSV request body
pub async fn import_stock_transactions(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<BulkImportResult>> {
    let service = StockService::new(state.db);
    let result = service.bulk_import(&body).await?;
    Ok(Json(result))
}
