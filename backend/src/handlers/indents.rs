//! HTTP handlers for indent (material request) endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::indent::{
    CreateIndentInput, Indent, IndentFilter, IndentItemView, IndentService, IndentSummary,
    IndentWithItems, IssueItemInput, UpdateStatusInput,
};
use crate::AppState;

/// List indents with optional filters
pub async fn list_indents(
    State(state): State<AppState>,
    Query(filter): Query<IndentFilter>,
) -> AppResult<Json<Vec<IndentSummary>>> {
    let service = IndentService::new(state.db);
    let indents = service.list_indents(filter).await?;
    Ok(Json(indents))
}

/// Create an indent with its lines
pub async fn create_indent(
    State(state): State<AppState>,
    Json(input): Json<CreateIndentInput>,
) -> AppResult<Json<IndentWithItems>> {
    let service = IndentService::new(state.db);
    let indent = service.create_indent(input).await?;
    Ok(Json(indent))
}

/// Get an indent with its lines
pub async fn get_indent(
    State(state): State<AppState>,
    Path(indent_id): Path<i64>,
) -> AppResult<Json<IndentWithItems>> {
    let service = IndentService::new(state.db);
    let indent = service.get_indent(indent_id).await?;
    Ok(Json(indent))
}

/// Move an indent to a new status
pub async fn update_indent_status(
    State(state): State<AppState>,
    Path(indent_id): Path<i64>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<Indent>> {
    let service = IndentService::new(state.db);
    let indent = service.update_status(indent_id, input).await?;
    Ok(Json(indent))
}

/// Issue stock against one indent line
pub async fn issue_indent_item(
    State(state): State<AppState>,
    Path((indent_id, indent_item_id)): Path<(i64, i64)>,
    Json(input): Json<IssueItemInput>,
) -> AppResult<Json<IndentItemView>> {
    let service = IndentService::new(state.db);
    let line = service.issue_item(indent_id, indent_item_id, input).await?;
    Ok(Json(line))
}
