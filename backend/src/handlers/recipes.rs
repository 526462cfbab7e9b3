//! HTTP handlers for recipe and component endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::recipe::{
    CloneRecipeInput, ComponentView, CreateRecipeInput, Recipe, RecipeFilter, RecipeService,
    RecipeWithComponents, RecordSaleInput, SaleTransaction, UpdateRecipeInput,
};
use crate::AppState;

/// List recipes with optional type filtering
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(filter): Query<RecipeFilter>,
) -> AppResult<Json<Vec<Recipe>>> {
    let service = RecipeService::new(state.db);
    let recipes = service.list_recipes(filter).await?;
    Ok(Json(recipes))
}

/// Create a recipe with its components
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<Json<RecipeWithComponents>> {
    let service = RecipeService::new(state.db);
    let recipe = service.create_recipe(input).await?;
    Ok(Json(recipe))
}

/// Get a recipe with its component breakdown
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<Json<RecipeWithComponents>> {
    let service = RecipeService::new(state.db);
    let recipe = service.get_recipe(recipe_id).await?;
    Ok(Json(recipe))
}

/// Get just the component breakdown of a recipe
pub async fn get_recipe_components(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<Json<Vec<ComponentView>>> {
    let service = RecipeService::new(state.db);
    let recipe = service.get_recipe(recipe_id).await?;
    Ok(Json(recipe.components))
}

/// Update a recipe and replace its component list
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(input): Json<UpdateRecipeInput>,
) -> AppResult<Json<RecipeWithComponents>> {
    let service = RecipeService::new(state.db);
    let recipe = service.update_recipe(recipe_id, input).await?;
    Ok(Json(recipe))
}

/// Delete a recipe (blocked while referenced as a sub-recipe)
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<Json<()>> {
    let service = RecipeService::new(state.db);
    service.delete_recipe(recipe_id).await?;
    Ok(Json(()))
}

/// Clone a recipe under a new name
pub async fn clone_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(input): Json<CloneRecipeInput>,
) -> AppResult<Json<RecipeWithComponents>> {
    let service = RecipeService::new(state.db);
    let recipe = service.clone_recipe(recipe_id, input).await?;
    Ok(Json(recipe))
}

/// Record a sale of a recipe and deduct ingredient stock
pub async fn record_recipe_sale(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<Json<SaleTransaction>> {
    let service = RecipeService::new(state.db);
    let sale = service.record_sale(recipe_id, input).await?;
    Ok(Json(sale))
}
