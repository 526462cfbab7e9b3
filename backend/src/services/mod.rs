//! Business logic services for the Restaurant Inventory Management Platform

pub mod goods_receiving;
pub mod indent;
pub mod item;
pub mod purchase_order;
pub mod recipe;
pub mod reporting;
pub mod stock;
pub mod supplier;

pub use goods_receiving::GoodsReceivingService;
pub use indent::IndentService;
pub use item::ItemService;
pub use purchase_order::PurchaseOrderService;
pub use recipe::RecipeService;
pub use reporting::ReportingService;
pub use stock::StockService;
pub use supplier::SupplierService;
