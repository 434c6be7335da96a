//! Points ledger tests
//!
//! `total_points` must equal the sum of the visitor's ledger rows after every
//! operation; the audit reports any drift.

use migration::entities::visitor;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};
use std::sync::{Arc, Once};
use tabletrail::config::init_config;
use tabletrail::loyalty::SessionPolicy;
use tabletrail::services::LoyaltyService;
use tabletrail::storage::{GiftType, NewGift, SeaOrmStorage};
use tempfile::TempDir;

// 确保 config 只初始化一次
static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

const RID: &str = "resto-1";
const DEV: &str = "dev-a";

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

async fn grant(storage: &SeaOrmStorage, cents: i64) -> i64 {
    storage
        .grant_gift(NewGift {
            restaurant_id: RID.to_string(),
            device_id: DEV.to_string(),
            gift_type: GiftType::FixedValue,
            euro_value_cents: cents,
            percentage_value: 0,
            gift_name: None,
            source: "manual".to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn assert_consistent(service: &LoyaltyService, expected: i64) {
    let view = service.ledger(RID, DEV).await.unwrap();
    assert_eq!(view.audit.cached, expected);
    assert_eq!(view.audit.computed, expected);
    assert!(view.audit.consistent);
    assert_eq!(view.entries.iter().map(|e| e.amount).sum::<i64>(), expected);
}

/// Overwrite the cached balance behind the ledger's back
async fn force_balance(storage: &SeaOrmStorage, total: i64) {
    visitor::Entity::update_many()
        .col_expr(visitor::Column::TotalPoints, Expr::value(total))
        .filter(visitor::Column::RestaurantId.eq(RID))
        .filter(visitor::Column::DeviceId.eq(DEV))
        .exec(storage.get_db())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_balance_tracks_every_operation() {
    let (service, storage, _dir) = create_service().await;
    service.status(RID, DEV).await.unwrap();
    assert_consistent(&service, 0).await;

    let a = grant(&storage, 500).await;
    let b = grant(&storage, 250).await;
    let c = grant(&storage, 1).await;

    service.convert_gift(RID, DEV, a).await.unwrap();
    assert_consistent(&service, 500).await;

    service.convert_gift(RID, DEV, b).await.unwrap();
    assert_consistent(&service, 750).await;

    service.revert_gift_conversion(RID, DEV, a).await.unwrap();
    assert_consistent(&service, 250).await;

    service.convert_gift(RID, DEV, c).await.unwrap();
    assert_consistent(&service, 251).await;

    service.convert_gift(RID, DEV, a).await.unwrap();
    assert_consistent(&service, 751).await;

    service.revert_gift_conversion(RID, DEV, b).await.unwrap();
    service.revert_gift_conversion(RID, DEV, c).await.unwrap();
    assert_consistent(&service, 500).await;
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let (service, storage, _dir) = create_service().await;
    service.status(RID, DEV).await.unwrap();

    let a = grant(&storage, 100).await;
    let b = grant(&storage, 200).await;
    service.convert_gift(RID, DEV, a).await.unwrap();
    service.convert_gift(RID, DEV, b).await.unwrap();

    let view = service.ledger(RID, DEV).await.unwrap();
    let gift_ids: Vec<_> = view.entries.iter().map(|e| e.gift_id).collect();
    assert_eq!(gift_ids, vec![Some(b), Some(a)]);
}

#[tokio::test]
async fn test_audit_reports_drift() {
    let (service, storage, _dir) = create_service().await;
    service.status(RID, DEV).await.unwrap();
    let gift = grant(&storage, 500).await;
    service.convert_gift(RID, DEV, gift).await.unwrap();

    force_balance(&storage, 700).await;

    let view = service.ledger(RID, DEV).await.unwrap();
    assert_eq!(view.audit.cached, 700);
    assert_eq!(view.audit.computed, 500);
    assert!(!view.audit.consistent);
}

#[tokio::test]
async fn test_revert_floors_balance_at_zero() {
    let (service, storage, _dir) = create_service().await;
    service.status(RID, DEV).await.unwrap();
    let gift = grant(&storage, 500).await;
    service.convert_gift(RID, DEV, gift).await.unwrap();

    force_balance(&storage, 120).await;

    let reverted = service
        .revert_gift_conversion(RID, DEV, gift)
        .await
        .unwrap();
    assert_eq!(reverted.points, 500);
    assert_eq!(reverted.total_points, 0);
    assert_consistent(&service, 0).await;
}

#[tokio::test]
async fn test_ledgers_are_isolated_per_visitor() {
    let (service, storage, _dir) = create_service().await;
    service.status(RID, DEV).await.unwrap();
    service.status(RID, "dev-b").await.unwrap();

    let gift = grant(&storage, 300).await;
    service.convert_gift(RID, DEV, gift).await.unwrap();

    let other = service.ledger(RID, "dev-b").await.unwrap();
    assert!(other.entries.is_empty());
    assert_eq!(other.audit.cached, 0);
    assert!(other.audit.consistent);
}
