use serde::Serialize;

use crate::{notice::Notice, services::order_service::OrderView};

/// Frames pushed over the live orders socket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    Snapshot(OrderView),
    Notice(Notice),
}
