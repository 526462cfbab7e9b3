//! HTTP handlers for category and unit suggestions
//!
//! Uses the external lookup service when configured and falls back to the
//! built-in inference tables otherwise.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::AppState;
use shared::UnitRule;

/// Query parameters for unit suggestions
#[derive(Debug, Deserialize)]
pub struct SuggestUnitsQuery {
    pub name: String,
    pub category: Option<String>,
}

/// Suggest base and purchase units for an item name
pub async fn suggest_units(
    State(state): State<AppState>,
    Query(query): Query<SuggestUnitsQuery>,
) -> AppResult<Json<UnitRule>> {
    if let Some(lookup) = &state.lookup {
        match lookup.suggest_units(&query.name).await {
            Ok(Some(rule)) => return Ok(Json(rule)),
            Ok(None) => {}
            Err(e) => {
                // The heuristic still gives a usable answer when the
                // lookup service is down.
                tracing::warn!("Unit lookup failed, falling back to heuristic: {}", e);
            }
        }
    }

    let rule = state
        .unit_inference
        .infer(&query.name, query.category.as_deref());
    Ok(Json(rule))
}

/// List curated categories from the lookup service; empty when disabled
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    match &state.lookup {
        Some(lookup) => Ok(Json(lookup.list_categories().await?)),
        None => Ok(Json(Vec::new())),
    }
}
