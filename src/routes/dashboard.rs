use axum::{
    Json, Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};

use crate::{
    dto::orders::DashboardEvent,
    error::AppResult,
    middleware::auth::SocketSession,
    models::Session,
    notice::{Notice, Notices},
    platform::Platform,
    response::{ApiResponse, Meta},
    services::{
        dashboard::MountedDashboard,
        order_service::{OrderStore, OrderView},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(customer_orders))
        .route("/orders/live", get(live_orders))
}

#[utoipa::path(
    get,
    path = "/api/customer/orders",
    responses(
        (status = 200, description = "Active orders and order history", body = ApiResponse<OrderView>),
        (status = 401, description = "No session"),
        (status = 403, description = "Not a customer"),
        (status = 502, description = "Orders could not be loaded"),
    ),
    tag = "Customer"
)]
pub async fn customer_orders(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let mut store = OrderStore::new(&state.platform, Notices::detached());
    store.initialize(Some(&session)).await?;
    let view = store.into_view();

    let meta = Meta::total(view.len());
    Ok(Json(ApiResponse::success("Orders", view, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/customer/orders/live",
    params(
        ("access_token" = Option<String>, Query, description = "Access token, when no Authorization header can be sent"),
    ),
    responses(
        (status = 101, description = "WebSocket of order snapshots and notices"),
        (status = 401, description = "No session"),
    ),
    tag = "Customer"
)]
pub async fn live_orders(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    SocketSession(session): SocketSession,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_orders(socket, state.platform, session))
}

async fn stream_orders(socket: WebSocket, platform: Platform, session: Session) {
    let user_id = session.user_id;
    let (mut sink, mut receiver) = socket.split();
    let (notices, mut notice_rx) = Notices::channel();

    let mut dashboard = match MountedDashboard::mount(session, &platform, notices).await {
        Ok(dashboard) => dashboard,
        Err(err) => {
            tracing::info!(user_id = %user_id, error = %err, "live orders refused");
            let _ = send(&mut sink, &DashboardEvent::Notice(Notice::from(&err))).await;
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };
    tracing::info!(user_id = %user_id, "live orders connected");

    let mut open = send(&mut sink, &DashboardEvent::Snapshot(dashboard.view())).await;
    while open {
        tokio::select! {
            changed = dashboard.changed() => {
                open = changed
                    && send(&mut sink, &DashboardEvent::Snapshot(dashboard.view())).await;
            }
            Some(notice) = notice_rx.recv() => {
                open = send(&mut sink, &DashboardEvent::Notice(notice)).await;
            }
            msg = receiver.next() => {
                open = match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => false,
                    Some(Ok(_)) => true,
                };
            }
        }
    }

    dashboard.unmount().await;
    tracing::info!(user_id = %user_id, "live orders disconnected");
}

/// Returns `false` once the socket is gone.
async fn send(sink: &mut SplitSink<WebSocket, Message>, event: &DashboardEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode dashboard event");
            return true;
        }
    };
    sink.send(Message::Text(text.into())).await.is_ok()
}
