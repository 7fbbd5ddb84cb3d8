use std::time::Duration;

use sqlx::{PgPool, postgres::PgListener};
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle};

use super::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeKind, ORDERS_TABLE, PlatformResult};

const FEED_CAPACITY: usize = 256;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Tables whose subscribers reload after the feed may have dropped events.
const RESYNC_TABLES: &[&str] = &[ORDERS_TABLE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("subscription lagged behind, {0} events missed")]
    Lagged(u64),
    #[error("change feed closed")]
    Closed,
}

/// A live subscription to the change feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct ChangeSubscription {
    rx: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
}

impl ChangeSubscription {
    pub fn new(rx: broadcast::Receiver<ChangeEvent>, filter: ChangeFilter) -> Self {
        Self { rx, filter }
    }

    /// Next event matching the filter.
    pub async fn recv(&mut self) -> Result<ChangeEvent, SubscriptionError> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    return Err(SubscriptionError::Lagged(missed));
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }
}

/// In-process fan-out of change events to every subscriber.
#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Publishes an empty update for every resynced table so subscribers
    /// reload state they may have missed. Returns total deliveries.
    pub fn resync(&self) -> usize {
        RESYNC_TABLES
            .iter()
            .map(|table| {
                self.publish(ChangeEvent::new(
                    *table,
                    ChangeKind::Update,
                    serde_json::Value::Null,
                ))
            })
            .sum()
    }
}

impl ChangeFeed for ChangeBroadcaster {
    fn subscribe(&self, filter: ChangeFilter) -> ChangeSubscription {
        tracing::debug!(table = %filter.table, kind = ?filter.kind, "change feed subscribed");
        ChangeSubscription::new(self.tx.subscribe(), filter)
    }

    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Change feed backed by Postgres `LISTEN/NOTIFY`.
///
/// The platform's triggers publish JSON payloads of the form
/// `{"table": "orders", "type": "UPDATE", "record": {...}}` on a channel.
pub struct PgChangeFeed;

impl PgChangeFeed {
    pub async fn start(
        pool: &PgPool,
        channel: &str,
    ) -> PlatformResult<(ChangeBroadcaster, JoinHandle<()>)> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(channel).await?;
        tracing::info!(channel = %channel, "listening for change notifications");

        let broadcaster = ChangeBroadcaster::new();
        let publisher = broadcaster.clone();
        let handle = tokio::spawn(async move {
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => forward(&publisher, notification.payload()),
                    Ok(None) => {
                        tracing::warn!("change feed connection lost, reconnecting");
                        reconnect(&mut listener).await;
                        let delivered = publisher.resync();
                        tracing::info!(delivered, "change feed reconnected, subscribers resynced");
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "change feed receive failed");
                        reconnect(&mut listener).await;
                        publisher.resync();
                    }
                }
            }
        });

        Ok((broadcaster, handle))
    }
}

fn forward(publisher: &ChangeBroadcaster, payload: &str) {
    match serde_json::from_str::<ChangeEvent>(payload) {
        Ok(event) => {
            let delivered = publisher.publish(event);
            tracing::debug!(delivered, "change event forwarded");
        }
        Err(err) => tracing::warn!(error = %err, "ignoring malformed change payload"),
    }
}

/// Any statement on a dropped listener opens a new connection and re-issues
/// `LISTEN` for its channels.
async fn reconnect(listener: &mut PgListener) {
    while let Err(err) = sqlx::query("SELECT 1").execute(&mut *listener).await {
        tracing::error!(error = %err, "change feed reconnect failed, retrying");
        tokio::time::sleep(RETRY_DELAY).await;
    }
}
