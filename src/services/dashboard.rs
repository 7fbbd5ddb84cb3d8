use tokio::{sync::watch, task::JoinHandle};

use crate::{
    error::AppResult,
    models::Session,
    notice::Notices,
    platform::{ChangeFilter, ChangeSubscription, Platform, SubscriptionError},
    services::order_service::{OrderStore, OrderView},
};

pub use crate::platform::ORDERS_TABLE;

/// A customer order dashboard with its live subscription.
///
/// The subscription is taken on [`mount`](Self::mount) and released when the
/// dashboard is unmounted or dropped.
#[derive(Debug)]
pub struct MountedDashboard {
    view: watch::Receiver<OrderView>,
    listener: Option<JoinHandle<()>>,
}

impl MountedDashboard {
    pub async fn mount(session: Session, platform: &Platform, notices: Notices) -> AppResult<Self> {
        // Subscribe before the first load so no update slips in between.
        let subscription = platform.feed.subscribe(ChangeFilter::updates_to(ORDERS_TABLE));

        let mut store = OrderStore::new(platform, notices);
        store.authorize(Some(&session)).await?;
        // A failed first load leaves an empty view; the next event retries.
        if let Err(err) = store.load_orders(&session).await {
            tracing::debug!(error = %err, "first order load failed");
        }

        let (publisher, view) = watch::channel(store.view().clone());
        let listener = tokio::spawn(listen(store, session, subscription, publisher));

        Ok(Self {
            view,
            listener: Some(listener),
        })
    }

    pub fn view(&self) -> OrderView {
        self.view.borrow().clone()
    }

    /// Waits for the next reload. Returns `false` once the listener stopped.
    pub async fn changed(&mut self) -> bool {
        self.view.changed().await.is_ok()
    }

    /// Stops the listener and waits until the subscription is released.
    pub async fn unmount(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            let _ = listener.await;
        }
        tracing::debug!("order dashboard unmounted");
    }
}

impl Drop for MountedDashboard {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

async fn listen(
    mut store: OrderStore,
    session: Session,
    mut subscription: ChangeSubscription,
    publisher: watch::Sender<OrderView>,
) {
    loop {
        let result = match subscription.recv().await {
            Ok(event) => store.on_external_change_notification(&session, &event).await,
            Err(SubscriptionError::Lagged(missed)) => {
                tracing::warn!(missed, "order subscription lagged, reloading");
                store.load_orders(&session).await
            }
            Err(SubscriptionError::Closed) => {
                tracing::info!("change feed closed, stopping order listener");
                break;
            }
        };

        if let Err(err) = result {
            tracing::debug!(error = %err, "reload failed, keeping previous orders");
        }
        publisher.send_replace(store.view().clone());
    }
}
