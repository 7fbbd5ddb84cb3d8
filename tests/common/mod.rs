#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use marketplace_dashboard::{
    models::{Order, OrderStatus, Product, Role, Session},
    platform::{
        AuthEvent, ChangeBroadcaster, IdentityService, ObjectStorage, OrderSource, Platform,
        PlatformError, PlatformResult, ProductDraft, ProductRepository, ProfileAttrs, RoleLookup,
    },
};
use tokio::sync::broadcast;
use uuid::Uuid;

pub fn session(user_id: Uuid) -> Session {
    Session {
        user_id,
        email: Some("someone@example.com".into()),
        access_token: "token".into(),
    }
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn order(customer_id: Uuid, status: OrderStatus, created_at: DateTime<Utc>) -> Order {
    Order {
        id: Uuid::new_v4(),
        customer_id,
        product_name: "Jollof rice".into(),
        price: 2500,
        quantity: 2,
        total_amount: 5000,
        delivery_address: "12 Market Road".into(),
        phone: "+2348000000000".into(),
        status,
        created_at,
        rider_id: None,
    }
}

#[derive(Default)]
pub struct StaticRoles {
    roles: Mutex<HashMap<Uuid, Role>>,
    failing: Mutex<bool>,
}

impl StaticRoles {
    pub fn with(user_id: Uuid, role: Role) -> Self {
        let roles = Self::default();
        roles.set(user_id, role);
        roles
    }

    pub fn set(&self, user_id: Uuid, role: Role) {
        self.roles.lock().unwrap().insert(user_id, role);
    }

    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }
}

#[async_trait]
impl RoleLookup for StaticRoles {
    async fn role_of(&self, user_id: Uuid) -> PlatformResult<Option<Role>> {
        if *self.failing.lock().unwrap() {
            return Err(PlatformError::Transport("roles offline".into()));
        }
        Ok(self.roles.lock().unwrap().get(&user_id).copied())
    }
}

/// Order source whose rows and availability tests control directly.
#[derive(Default)]
pub struct ScriptedOrders {
    rows: Mutex<Vec<Order>>,
    failing: Mutex<bool>,
    calls: AtomicUsize,
}

impl ScriptedOrders {
    pub fn with(rows: Vec<Order>) -> Self {
        let source = Self::default();
        source.set(rows);
        source
    }

    pub fn set(&self, rows: Vec<Order>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderSource for ScriptedOrders {
    async fn orders_for_customer(&self, customer_id: Uuid) -> PlatformResult<Vec<Order>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock().unwrap() {
            return Err(PlatformError::Transport("connection reset".into()));
        }
        let mut rows: Vec<Order> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

pub struct Harness {
    pub roles: Arc<StaticRoles>,
    pub orders: Arc<ScriptedOrders>,
    pub feed: ChangeBroadcaster,
    pub platform: Platform,
}

impl Harness {
    pub fn new(roles: StaticRoles, orders: ScriptedOrders) -> Self {
        let roles = Arc::new(roles);
        let orders = Arc::new(orders);
        let feed = ChangeBroadcaster::new();
        let platform = Platform::new(roles.clone(), orders.clone(), Arc::new(feed.clone()));
        Self {
            roles,
            orders,
            feed,
            platform,
        }
    }
}

#[derive(Default)]
pub struct MemoryProducts {
    items: Mutex<Vec<Product>>,
    failing: Mutex<bool>,
}

impl MemoryProducts {
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn all(&self) -> Vec<Product> {
        self.items.lock().unwrap().clone()
    }

    fn check(&self) -> PlatformResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(PlatformError::Rejected("row-level policy violation".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryProducts {
    async fn list_for_vendor(&self, vendor_id: Uuid) -> PlatformResult<Vec<Product>> {
        self.check()?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.vendor_id == vendor_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, vendor_id: Uuid, draft: &ProductDraft) -> PlatformResult<Product> {
        self.check()?;
        let product = Product {
            id: Uuid::new_v4(),
            vendor_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            stock: draft.stock,
            category: draft.category.clone(),
            image_url: draft.image_url.clone(),
            created_at: Utc::now(),
        };
        self.items.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        vendor_id: Uuid,
        id: Uuid,
        draft: &ProductDraft,
    ) -> PlatformResult<Option<Product>> {
        self.check()?;
        let mut items = self.items.lock().unwrap();
        let product = items
            .iter_mut()
            .find(|p| p.id == id && p.vendor_id == vendor_id);
        Ok(product.map(|p| {
            p.name = draft.name.clone();
            p.description = draft.description.clone();
            p.price = draft.price;
            p.stock = draft.stock;
            p.category = draft.category.clone();
            p.image_url = draft.image_url.clone();
            p.clone()
        }))
    }

    async fn delete(&self, vendor_id: Uuid, id: Uuid) -> PlatformResult<bool> {
        self.check()?;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|p| !(p.id == id && p.vendor_id == vendor_id));
        Ok(items.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> PlatformResult<String> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(format!("https://cdn.example.com/product-images/{path}"))
    }
}

/// Identity service with a fixed set of accounts.
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, (String, Uuid)>>,
    pub sign_ups: Mutex<Vec<(String, ProfileAttrs)>>,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            sign_ups: Mutex::new(Vec::new()),
            current: Mutex::new(None),
            events,
        }
    }

    pub fn add_account(&self, email: &str, password: &str, user_id: Uuid) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user_id));
    }

    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    pub fn current(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn get_session(&self) -> PlatformResult<Option<Session>> {
        Ok(self.current())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> PlatformResult<Session> {
        let account = self.accounts.lock().unwrap().get(email).cloned();
        match account {
            Some((expected, user_id)) if expected == password => {
                let session = session(user_id);
                *self.current.lock().unwrap() = Some(session.clone());
                self.emit(AuthEvent::SignedIn(session.clone()));
                Ok(session)
            }
            _ => Err(PlatformError::Rejected("Invalid login credentials".into())),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        profile: &ProfileAttrs,
    ) -> PlatformResult<()> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(PlatformError::Rejected("User already registered".into()));
        }
        self.sign_ups
            .lock()
            .unwrap()
            .push((email.to_string(), profile.clone()));
        Ok(())
    }

    async fn sign_out(&self) -> PlatformResult<()> {
        *self.current.lock().unwrap() = None;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
