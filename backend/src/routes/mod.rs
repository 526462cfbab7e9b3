//! Route definitions for the Restaurant Inventory Management Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Item master
        .nest("/items", item_routes())
        // Supplier master
        .nest("/suppliers", supplier_routes())
        // Stock ledger
        .nest("/stock-transactions", stock_routes())
        // Indents (material requests)
        .nest("/indents", indent_routes())
        // Purchasing
        .nest("/purchase-orders", purchase_order_routes())
        // Goods receiving
        .nest("/goods-received-notes", goods_receiving_routes())
        // Recipes and components
        .nest("/recipes", recipe_routes())
        // Dashboard and reports
        .nest("/reports", reporting_routes())
        // Category/unit suggestions
        .nest("/suggestions", suggestion_routes())
}

/// Item master routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/import", post(handlers::import_items))
        .route("/export", get(handlers::export_items))
        .route(
            "/:item_id",
            get(handlers::get_item).put(handlers::update_item),
        )
        .route("/:item_id/balance", get(handlers::get_item_balance))
        .route("/:item_id/deactivate", post(handlers::deactivate_item))
        .route("/:item_id/reactivate", post(handlers::reactivate_item))
}

/// Supplier master routes
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier).put(handlers::update_supplier),
        )
        .route(
            "/:supplier_id/deactivate",
            post(handlers::deactivate_supplier),
        )
        .route(
            "/:supplier_id/reactivate",
            post(handlers::reactivate_supplier),
        )
}

/// Stock ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stock_transactions).post(handlers::record_stock_transaction),
        )
        .route("/import", post(handlers::import_stock_transactions))
}

/// Indent routes
fn indent_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_indents).post(handlers::create_indent),
        )
        .route("/:indent_id", get(handlers::get_indent))
        .route("/:indent_id/status", put(handlers::update_indent_status))
        .route(
            "/:indent_id/items/:indent_item_id/issue",
            post(handlers::issue_indent_item),
        )
}

/// Purchase order routes
fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
        )
        .route("/:po_id", get(handlers::get_purchase_order))
        .route("/:po_id/status", put(handlers::update_purchase_order_status))
}

/// Goods receiving routes
fn goods_receiving_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_grns).post(handlers::create_grn))
        .route("/:grn_id", get(handlers::get_grn))
}

/// Recipe routes
fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/:recipe_id",
            get(handlers::get_recipe)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route(
            "/:recipe_id/components",
            get(handlers::get_recipe_components),
        )
        .route("/:recipe_id/clone", post(handlers::clone_recipe))
        .route("/:recipe_id/sale", post(handlers::record_recipe_sale))
}

/// Reporting routes
fn reporting_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard_metrics))
        .route("/low-stock", get(handlers::get_low_stock_report))
}

/// Suggestion routes
fn suggestion_routes() -> Router<AppState> {
    Router::new()
        .route("/units", get(handlers::suggest_units))
        .route("/categories", get(handlers::list_categories))
}
