//! Seams to the hosted backend platform.
//!
//! Authentication, storage, realtime and file hosting are owned by the
//! platform. This crate only talks to them through the traits below, so the
//! dashboards can be driven by the Postgres adapters in production and by
//! in-memory doubles in tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Order, Product, Role, Session};

pub mod realtime;
pub mod sea;
pub mod session;

pub use realtime::{ChangeBroadcaster, ChangeSubscription, PgChangeFeed, SubscriptionError};
pub use sea::SeaOrmPlatform;
pub use session::JwtSessionVerifier;

/// Table holding customer orders on the platform.
pub const ORDERS_TABLE: &str = "orders";

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform unreachable: {0}")]
    Transport(String),

    #[error("rejected by platform: {0}")]
    Rejected(String),

    #[error("invalid data from platform: {0}")]
    InvalidData(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("connection error: {0}")]
    Connection(#[from] sqlx::Error),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Profile attributes stored alongside a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileAttrs {
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn get_session(&self) -> PlatformResult<Option<Session>>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PlatformResult<Session>;
    async fn sign_up(&self, email: &str, password: &str, profile: &ProfileAttrs)
    -> PlatformResult<()>;
    async fn sign_out(&self) -> PlatformResult<()>;
    fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent>;
}

#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// `None` when the user has no profile or an unrecognised role.
    async fn role_of(&self, user_id: Uuid) -> PlatformResult<Option<Role>>;
}

#[async_trait]
pub trait OrderSource: Send + Sync {
    /// All orders owned by `customer_id`, newest first.
    async fn orders_for_customer(&self, customer_id: Uuid) -> PlatformResult<Vec<Order>>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` at `path` and returns the object's public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
    -> PlatformResult<String>;
}

/// Validated product fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub category: String,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_for_vendor(&self, vendor_id: Uuid) -> PlatformResult<Vec<Product>>;
    async fn insert(&self, vendor_id: Uuid, draft: &ProductDraft) -> PlatformResult<Product>;
    /// `None` when no product with `id` belongs to `vendor_id`.
    async fn update(
        &self,
        vendor_id: Uuid,
        id: Uuid,
        draft: &ProductDraft,
    ) -> PlatformResult<Option<Product>>;
    async fn delete(&self, vendor_id: Uuid, id: Uuid) -> PlatformResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Row-level mutation pushed by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, kind: ChangeKind, record: serde_json::Value) -> Self {
        Self {
            table: table.into(),
            kind,
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub table: String,
    pub kind: Option<ChangeKind>,
}

impl ChangeFilter {
    pub fn updates_to(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: Some(ChangeKind::Update),
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table && self.kind.is_none_or(|kind| kind == event.kind)
    }
}

pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, filter: ChangeFilter) -> ChangeSubscription;
    /// Live subscriptions across all filters.
    fn subscriber_count(&self) -> usize;
}

/// The collaborators the customer order dashboard needs.
#[derive(Clone)]
pub struct Platform {
    pub roles: Arc<dyn RoleLookup>,
    pub orders: Arc<dyn OrderSource>,
    pub feed: Arc<dyn ChangeFeed>,
}

impl Platform {
    pub fn new(
        roles: Arc<dyn RoleLookup>,
        orders: Arc<dyn OrderSource>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self { roles, orders, feed }
    }
}
