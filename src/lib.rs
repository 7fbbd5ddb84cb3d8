//! Customer, vendor and rider dashboards for a marketplace whose auth,
//! storage and realtime feed live on a hosted backend platform.

pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notice;
pub mod platform;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
