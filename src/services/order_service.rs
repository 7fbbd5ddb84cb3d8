//! Customer order store.
//!
//! Holds one customer's orders split into active and history, newest first,
//! and reloads the whole list whenever the change feed fires.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Order, Role, Session},
    notice::{Notice, Notices},
    platform::{ChangeEvent, OrderSource, Platform, RoleLookup},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderView {
    pub active_orders: Vec<Order>,
    pub order_history: Vec<Order>,
}

impl OrderView {
    /// Splits `orders` by status. Both halves are sorted by creation time,
    /// newest first; orders created at the same instant keep fetch order.
    pub fn partition(mut orders: Vec<Order>) -> Self {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let (active_orders, order_history): (Vec<Order>, Vec<Order>) =
            orders.into_iter().partition(|order| order.status.is_active());
        Self {
            active_orders,
            order_history,
        }
    }

    pub fn len(&self) -> usize {
        self.active_orders.len() + self.order_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct OrderStore {
    roles: Arc<dyn RoleLookup>,
    source: Arc<dyn OrderSource>,
    notices: Notices,
    view: OrderView,
}

impl OrderStore {
    pub fn new(platform: &Platform, notices: Notices) -> Self {
        Self {
            roles: platform.roles.clone(),
            source: platform.orders.clone(),
            notices,
            view: OrderView::default(),
        }
    }

    pub fn view(&self) -> &OrderView {
        &self.view
    }

    pub fn into_view(self) -> OrderView {
        self.view
    }

    pub fn active_orders(&self) -> &[Order] {
        &self.view.active_orders
    }

    pub fn order_history(&self) -> &[Order] {
        &self.view.order_history
    }

    /// Gates the dashboard to customers, then runs the first load.
    pub async fn initialize(&mut self, session: Option<&Session>) -> AppResult<()> {
        let session = self.authorize(session).await?;
        self.load_orders(session).await
    }

    /// Checks that `session` exists and belongs to a customer.
    pub async fn authorize<'a>(&self, session: Option<&'a Session>) -> AppResult<&'a Session> {
        let result = self.check_role(session).await;
        if let Err(err) = &result {
            self.notices.raise_error(err);
        }
        result
    }

    async fn check_role<'a>(&self, session: Option<&'a Session>) -> AppResult<&'a Session> {
        let session = session.ok_or(AppError::AuthRequired)?;
        let role = self
            .roles
            .role_of(session.user_id)
            .await
            .map_err(AppError::LoadError)?;

        match role {
            Some(Role::Customer) => Ok(session),
            Some(Role::Vendor) | Some(Role::Rider) | None => {
                tracing::info!(user_id = %session.user_id, role = ?role, "customer dashboard denied");
                Err(AppError::AccessDenied)
            }
        }
    }

    /// Replaces the view with a fresh fetch. On failure the current view is
    /// kept as is.
    pub async fn load_orders(&mut self, session: &Session) -> AppResult<()> {
        match self.source.orders_for_customer(session.user_id).await {
            Ok(orders) => {
                self.view = OrderView::partition(orders);
                tracing::debug!(
                    customer_id = %session.user_id,
                    active = self.view.active_orders.len(),
                    history = self.view.order_history.len(),
                    "orders loaded"
                );
                Ok(())
            }
            Err(source) => {
                tracing::warn!(customer_id = %session.user_id, error = %source, "order load failed");
                self.notices
                    .raise(Notice::error("Error", format!("Failed to load orders: {source}")));
                Err(AppError::LoadError(source))
            }
        }
    }

    /// Any change to the orders table invalidates the whole view.
    pub async fn on_external_change_notification(
        &mut self,
        session: &Session,
        event: &ChangeEvent,
    ) -> AppResult<()> {
        tracing::debug!(table = %event.table, kind = ?event.kind, "order change received");
        self.load_orders(session).await
    }
}
