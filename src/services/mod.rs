pub mod auth_service;
pub mod dashboard;
pub mod inventory_service;
pub mod order_service;
