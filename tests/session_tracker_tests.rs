//! Session tracker tests
//!
//! Drive `LoyaltyService` with explicit timestamps against a temporary SQLite
//! database and check how polls and orders open, extend and bank visits.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Once};
use tabletrail::config::init_config;
use tabletrail::loyalty::{SessionPolicy, SessionState};
use tabletrail::services::{LoyaltyService, SubmitOrderRequest};
use tabletrail::storage::{GiftStatus, GiftType, SeaOrmStorage};
use tempfile::TempDir;

// 确保 config 只初始化一次
static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

const RID: &str = "resto-1";

async fn create_service() -> (LoyaltyService, Arc<SeaOrmStorage>, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("loyalty.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    let service = LoyaltyService::new(storage.clone(), SessionPolicy::from_secs(180));
    (service, storage, temp_dir)
}

fn order(device_id: &str) -> SubmitOrderRequest {
    SubmitOrderRequest {
        device_id: Some(device_id.to_string()),
        total_cents: 1800,
        ..Default::default()
    }
}

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn test_first_poll_creates_visitor_awaiting_bank() {
    let (service, storage, _dir) = create_service().await;

    let status = service.status_at(RID, "dev-a", t0()).await.unwrap();
    assert_eq!(status.session_state, SessionState::ClosedAwaitingBank);
    assert_eq!(status.total_visits, 0);
    assert_eq!(status.orders_in_current_visit, 0);
    assert!(!status.discount_eligible);
    assert!(status.gift_conversion_enabled);

    let visitor = storage.find_visitor(RID, "dev-a").await.unwrap().unwrap();
    assert_eq!(visitor.last_session_at, t0());
    assert_eq!(visitor.last_visit_at, None);
}

#[tokio::test]
async fn test_first_order_opens_session_without_banking() {
    let (service, _storage, _dir) = create_service().await;

    let submission = service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();
    assert_eq!(submission.session_state, Some(SessionState::OpenSession));
    assert!(!submission.visit_banked);
    assert_eq!(submission.total_visits, 0);
    assert_eq!(submission.orders_in_current_visit, 1);
    assert_eq!(submission.order.status, "pending");
    assert_eq!(submission.order.loyalty_id.as_deref(), Some("dev-a"));
}

#[tokio::test]
async fn test_heartbeat_keeps_session_open() {
    let (service, storage, _dir) = create_service().await;

    service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();

    // Polls every two minutes keep the window alive well past the timeout
    let mut now = t0();
    for _ in 0..5 {
        now += Duration::seconds(120);
        let status = service.status_at(RID, "dev-a", now).await.unwrap();
        assert_eq!(status.session_state, SessionState::OpenSession);
        assert_eq!(status.orders_in_current_visit, 1);
    }

    let visitor = storage.find_visitor(RID, "dev-a").await.unwrap().unwrap();
    assert_eq!(visitor.last_session_at, now);
}

#[tokio::test]
async fn test_expiry_boundary_is_strict() {
    let (service, _storage, _dir) = create_service().await;

    service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();

    // Exactly the timeout: still live
    let status = service
        .status_at(RID, "dev-a", t0() + Duration::seconds(180))
        .await
        .unwrap();
    assert_eq!(status.session_state, SessionState::OpenSession);

    // One second past the (refreshed) timeout: a new window
    let status = service
        .status_at(RID, "dev-a", t0() + Duration::seconds(361))
        .await
        .unwrap();
    assert_eq!(status.session_state, SessionState::ClosedAwaitingBank);
    assert_eq!(status.orders_in_current_visit, 0);
}

#[tokio::test]
async fn test_poll_after_expiry_never_banks() {
    let (service, storage, _dir) = create_service().await;

    let first = service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();
    storage
        .set_order_status(RID, first.order.id, "completed")
        .await
        .unwrap();

    let status = service
        .status_at(RID, "dev-a", t0() + Duration::minutes(30))
        .await
        .unwrap();
    assert_eq!(status.session_state, SessionState::ClosedAwaitingBank);
    assert_eq!(status.total_visits, 0);
}

#[tokio::test]
async fn test_order_in_new_window_banks_after_completed_order() {
    let (service, storage, _dir) = create_service().await;

    let first = service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();
    storage
        .set_order_status(RID, first.order.id, "completed")
        .await
        .unwrap();

    let later = t0() + Duration::minutes(30);
    let second = service
        .submit_order_at(RID, order("dev-a"), later)
        .await
        .unwrap();
    assert!(second.visit_banked);
    assert_eq!(second.total_visits, 1);
    assert_eq!(second.orders_in_current_visit, 1);
    assert_eq!(second.session_state, Some(SessionState::OpenSession));

    let visitor = storage.find_visitor(RID, "dev-a").await.unwrap().unwrap();
    assert_eq!(visitor.last_visit_at, Some(later));
    assert_eq!(visitor.last_counted_at, Some(later));

    // Banking visit 1 mints the welcome gift
    assert_eq!(second.minted_gifts.len(), 1);
    let gift = &second.minted_gifts[0];
    assert_eq!(gift.gift_type, GiftType::Percentage);
    assert_eq!(gift.percentage_value, 10);
    assert_eq!(gift.status, GiftStatus::Unused);
    assert_eq!(gift.source, "welcome");
}

#[tokio::test]
async fn test_new_window_without_completed_order_does_not_bank() {
    let (service, _storage, _dir) = create_service().await;

    // The first order stays pending
    service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();

    let second = service
        .submit_order_at(RID, order("dev-a"), t0() + Duration::minutes(30))
        .await
        .unwrap();
    assert!(!second.visit_banked);
    assert_eq!(second.total_visits, 0);
    assert_eq!(second.orders_in_current_visit, 1);
    assert!(second.minted_gifts.is_empty());
}

#[tokio::test]
async fn test_completed_order_counts_once() {
    let (service, storage, _dir) = create_service().await;

    let first = service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();
    storage
        .set_order_status(RID, first.order.id, "completed")
        .await
        .unwrap();

    let t1 = t0() + Duration::minutes(30);
    let banked = service.submit_order_at(RID, order("dev-a"), t1).await.unwrap();
    assert!(banked.visit_banked);

    // The order completed before the bank no longer qualifies; the one
    // placed at t1 is still pending
    let t2 = t1 + Duration::minutes(30);
    let next = service.submit_order_at(RID, order("dev-a"), t2).await.unwrap();
    assert!(!next.visit_banked);
    assert_eq!(next.total_visits, 1);

    storage
        .set_order_status(RID, banked.order.id, "completed")
        .await
        .unwrap();
    let t3 = t2 + Duration::minutes(30);
    let third = service.submit_order_at(RID, order("dev-a"), t3).await.unwrap();
    assert!(third.visit_banked);
    assert_eq!(third.total_visits, 2);
    // Welcome gift is only for visit 1
    assert!(third.minted_gifts.is_empty());
}

#[tokio::test]
async fn test_poll_opened_window_is_confirmed_by_order() {
    let (service, storage, _dir) = create_service().await;

    let first = service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();
    storage
        .set_order_status(RID, first.order.id, "completed")
        .await
        .unwrap();

    // Poll opens the new window, the order inside it banks
    let t1 = t0() + Duration::minutes(30);
    let status = service.status_at(RID, "dev-a", t1).await.unwrap();
    assert_eq!(status.session_state, SessionState::ClosedAwaitingBank);
    assert_eq!(status.total_visits, 0);

    let submission = service
        .submit_order_at(RID, order("dev-a"), t1 + Duration::seconds(40))
        .await
        .unwrap();
    assert!(submission.visit_banked);
    assert_eq!(submission.total_visits, 1);
}

#[tokio::test]
async fn test_visitors_are_scoped_per_restaurant() {
    let (service, _storage, _dir) = create_service().await;

    service
        .submit_order_at("resto-1", order("dev-a"), t0())
        .await
        .unwrap();
    let other = service.status_at("resto-2", "dev-a", t0()).await.unwrap();
    assert_eq!(other.session_state, SessionState::ClosedAwaitingBank);
    assert_eq!(other.orders_in_current_visit, 0);
}

#[tokio::test]
async fn test_anonymous_order_skips_loyalty() {
    let (service, _storage, _dir) = create_service().await;

    let submission = service
        .submit_order_at(
            RID,
            SubmitOrderRequest {
                device_id: None,
                total_cents: 900,
                ..Default::default()
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(submission.session_state, None);
    assert_eq!(submission.order.loyalty_id, None);
    assert!(!submission.visit_banked);
}

#[tokio::test]
async fn test_welcome_gift_disabled_by_zero_percentage() {
    let (service, storage, _dir) = create_service().await;

    service
        .update_settings(
            RID,
            tabletrail::services::UpdateSettingsRequest {
                welcome_gift_percentage: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let first = service
        .submit_order_at(RID, order("dev-a"), t0())
        .await
        .unwrap();
    storage
        .set_order_status(RID, first.order.id, "completed")
        .await
        .unwrap();
    let banked = service
        .submit_order_at(RID, order("dev-a"), t0() + Duration::minutes(30))
        .await
        .unwrap();
    assert!(banked.visit_banked);
    assert!(banked.minted_gifts.is_empty());
}
