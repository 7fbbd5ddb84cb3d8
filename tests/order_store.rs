mod common;

use std::collections::HashSet;

use common::{Harness, ScriptedOrders, StaticRoles, at, order, session};
use marketplace_dashboard::{
    error::AppError,
    models::{Order, OrderStatus, Role, Route},
    notice::{NoticeLevel, Notices},
    platform::{ChangeEvent, ChangeKind},
    services::order_service::{OrderStore, OrderView},
};
use uuid::Uuid;

fn customer_harness(rows: impl FnOnce(Uuid) -> Vec<Order>) -> (Uuid, Harness) {
    let customer = Uuid::new_v4();
    let harness = Harness::new(
        StaticRoles::with(customer, Role::Customer),
        ScriptedOrders::with(rows(customer)),
    );
    (customer, harness)
}

#[tokio::test]
async fn pending_goes_active_and_delivered_goes_history() -> anyhow::Result<()> {
    let (customer, harness) = customer_harness(|c| {
        vec![
            order(c, OrderStatus::Pending, at(1)),
            order(c, OrderStatus::Delivered, at(2)),
        ]
    });
    let mut store = OrderStore::new(&harness.platform, Notices::detached());
    store.initialize(Some(&session(customer))).await?;

    assert_eq!(store.active_orders().len(), 1);
    assert_eq!(store.active_orders()[0].created_at, at(1));
    assert_eq!(store.active_orders()[0].status, OrderStatus::Pending);
    assert_eq!(store.order_history().len(), 1);
    assert_eq!(store.order_history()[0].created_at, at(2));
    assert_eq!(store.order_history()[0].status, OrderStatus::Delivered);
    Ok(())
}

#[test]
fn partition_is_total_exclusive_and_sorted() {
    let customer = Uuid::new_v4();
    // Deliberately out of order.
    let orders = vec![
        order(customer, OrderStatus::Accepted, at(3)),
        order(customer, OrderStatus::Cancelled, at(9)),
        order(customer, OrderStatus::Pending, at(7)),
        order(customer, OrderStatus::Delivered, at(1)),
        order(customer, OrderStatus::InTransit, at(5)),
        order(customer, OrderStatus::Cancelled, at(2)),
    ];
    let fetched: HashSet<Uuid> = orders.iter().map(|o| o.id).collect();

    let view = OrderView::partition(orders);

    assert!(view.active_orders.iter().all(|o| o.status.is_active()));
    assert!(view.order_history.iter().all(|o| o.status.is_terminal()));

    let active: HashSet<Uuid> = view.active_orders.iter().map(|o| o.id).collect();
    let history: HashSet<Uuid> = view.order_history.iter().map(|o| o.id).collect();
    assert!(active.is_disjoint(&history));
    assert_eq!(&active | &history, fetched);
    assert_eq!(view.len(), fetched.len());

    let active_times: Vec<_> = view.active_orders.iter().map(|o| o.created_at).collect();
    assert_eq!(active_times, vec![at(7), at(5), at(3)]);
    let history_times: Vec<_> = view.order_history.iter().map(|o| o.created_at).collect();
    assert_eq!(history_times, vec![at(9), at(2), at(1)]);
}

#[test]
fn every_status_lands_on_exactly_one_side() {
    let customer = Uuid::new_v4();
    for status in OrderStatus::ALL {
        let view = OrderView::partition(vec![order(customer, status, at(0))]);
        let expected_active = matches!(
            status,
            OrderStatus::Pending | OrderStatus::Accepted | OrderStatus::InTransit
        );
        assert_eq!(view.active_orders.len() == 1, expected_active, "{status}");
        assert_eq!(view.order_history.len() == 1, !expected_active, "{status}");
    }
}

#[tokio::test]
async fn reloading_without_backend_change_is_idempotent() -> anyhow::Result<()> {
    let (customer, harness) = customer_harness(|c| {
        vec![
            order(c, OrderStatus::InTransit, at(4)),
            order(c, OrderStatus::Cancelled, at(3)),
            order(c, OrderStatus::Accepted, at(2)),
        ]
    });
    let who = session(customer);
    let mut store = OrderStore::new(&harness.platform, Notices::detached());

    store.load_orders(&who).await?;
    let first = store.view().clone();
    store.load_orders(&who).await?;

    assert_eq!(store.view(), &first);
    assert_eq!(harness.orders.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn only_the_customers_own_orders_are_loaded() -> anyhow::Result<()> {
    let (customer, harness) = customer_harness(|c| vec![order(c, OrderStatus::Pending, at(1))]);
    let stranger = Uuid::new_v4();
    harness.orders.set(vec![
        order(customer, OrderStatus::Pending, at(1)),
        order(stranger, OrderStatus::Pending, at(2)),
    ]);

    let mut store = OrderStore::new(&harness.platform, Notices::detached());
    store.load_orders(&session(customer)).await?;

    assert_eq!(store.view().len(), 1);
    assert!(store.active_orders().iter().all(|o| o.customer_id == customer));
    Ok(())
}

#[tokio::test]
async fn change_event_with_no_orders_yields_two_empty_lists() -> anyhow::Result<()> {
    let (customer, harness) = customer_harness(|_| Vec::new());
    let (notices, mut notice_rx) = Notices::channel();
    let mut store = OrderStore::new(&harness.platform, notices);

    let event = ChangeEvent::new("orders", ChangeKind::Update, serde_json::json!({}));
    store
        .on_external_change_notification(&session(customer), &event)
        .await?;

    assert!(store.active_orders().is_empty());
    assert!(store.order_history().is_empty());
    assert!(notice_rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn change_event_reloads_wholesale_and_ignores_payload() -> anyhow::Result<()> {
    let (customer, harness) = customer_harness(|c| vec![order(c, OrderStatus::Pending, at(1))]);
    let who = session(customer);
    let mut store = OrderStore::new(&harness.platform, Notices::detached());
    store.load_orders(&who).await?;

    let mut delivered = store.active_orders()[0].clone();
    delivered.status = OrderStatus::Delivered;
    harness.orders.set(vec![delivered.clone()]);

    // The payload claims something unrelated; only the refetch counts.
    let event = ChangeEvent::new(
        "orders",
        ChangeKind::Update,
        serde_json::json!({ "id": Uuid::new_v4(), "status": "pending" }),
    );
    store.on_external_change_notification(&who, &event).await?;

    assert!(store.active_orders().is_empty());
    assert_eq!(store.order_history(), &[delivered]);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_keeps_previous_lists_and_raises_notice() -> anyhow::Result<()> {
    let (customer, harness) = customer_harness(|c| {
        vec![
            order(c, OrderStatus::Pending, at(2)),
            order(c, OrderStatus::Delivered, at(1)),
        ]
    });
    let who = session(customer);
    let (notices, mut notice_rx) = Notices::channel();
    let mut store = OrderStore::new(&harness.platform, notices);
    store.load_orders(&who).await?;
    let before = store.view().clone();
    assert!(!before.is_empty());

    harness.orders.set_failing(true);
    let err = store.load_orders(&who).await.unwrap_err();

    assert!(matches!(err, AppError::LoadError(_)));
    assert_eq!(store.view(), &before);
    let notice = notice_rx.try_recv()?;
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("Failed to load orders"));
    Ok(())
}

#[tokio::test]
async fn missing_session_requires_sign_in() {
    let (_, harness) = customer_harness(|_| Vec::new());
    let (notices, mut notice_rx) = Notices::channel();
    let mut store = OrderStore::new(&harness.platform, notices);

    let err = store.initialize(None).await.unwrap_err();

    assert!(matches!(err, AppError::AuthRequired));
    assert_eq!(err.redirect(), Some(Route::SignIn));
    assert!(notice_rx.try_recv().is_ok());
    assert_eq!(harness.orders.calls(), 0);
}

#[tokio::test]
async fn vendor_is_denied_and_sent_home() {
    let vendor = Uuid::new_v4();
    let harness = Harness::new(
        StaticRoles::with(vendor, Role::Vendor),
        ScriptedOrders::default(),
    );
    let (notices, mut notice_rx) = Notices::channel();
    let mut store = OrderStore::new(&harness.platform, notices);

    let err = store.initialize(Some(&session(vendor))).await.unwrap_err();

    assert!(matches!(err, AppError::AccessDenied));
    assert_eq!(err.redirect(), Some(Route::Home));
    let notice = notice_rx.try_recv().expect("access notice");
    assert_eq!(notice.title, "Access denied");
    assert_eq!(harness.orders.calls(), 0);
}

#[tokio::test]
async fn user_without_profile_is_denied() {
    let harness = Harness::new(StaticRoles::default(), ScriptedOrders::default());
    let mut store = OrderStore::new(&harness.platform, Notices::detached());

    let err = store
        .initialize(Some(&session(Uuid::new_v4())))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccessDenied));
}
