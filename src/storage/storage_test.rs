use std::sync::Arc;

use futures::StreamExt;

use super::*;
use crate::ChangeFeed;
use crate::Error;
use crate::EventKind;
use crate::LocalChangeFeed;
use crate::Order;
use crate::OrderStatus;
use crate::StorageError;
use crate::Table;
use crate::Topic;

fn pickup_ready(id: &str) -> Order {
    let mut order = Order::new(id, "cust-1", "rest-1", 1000, "1 Main St");
    order.status = OrderStatus::PickupPending;
    order
}

fn claim_patch(driver: &str) -> OrderPatch {
    OrderPatch {
        status: OrderStatus::PickupAccepted,
        driver: DriverChange::Assign(driver.to_string()),
        updated_at: 42,
    }
}

async fn conditional_write_contract(store: Arc<dyn OrderStore>) {
    store.insert(pickup_ready("o1")).await.unwrap();

    let claimed = store
        .update_if("o1", WriteGuard::unclaimed(), claim_patch("d1"))
        .await
        .unwrap()
        .expect("first claim matches");
    assert_eq!(claimed.driver_id.as_deref(), Some("d1"));
    assert_eq!(claimed.updated_at, 42);

    // Zero rows affected is not an error
    let second = store.update_if("o1", WriteGuard::unclaimed(), claim_patch("d2")).await.unwrap();
    assert!(second.is_none());
    assert_eq!(store.fetch("o1").await.unwrap().unwrap().driver_id.as_deref(), Some("d1"));

    let missing = store
        .update_if("nope", WriteGuard::unclaimed(), claim_patch("d1"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

async fn duplicate_insert_contract(store: Arc<dyn OrderStore>) {
    store.insert(pickup_ready("o1")).await.unwrap();

    let err = store.insert(pickup_ready("o1")).await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::DuplicateKey(id)) if id == "o1"));
}

async fn list_available_contract(store: Arc<dyn OrderStore>) {
    let mut older = pickup_ready("b");
    older.created_at = 1;
    let mut newer = pickup_ready("a");
    newer.created_at = 2;
    store.insert(newer).await.unwrap();
    store.insert(older).await.unwrap();
    store.insert(Order::new("c", "cust-1", "rest-1", 1000, "")).await.unwrap();

    let ids: Vec<String> =
        store.list_available().await.unwrap().into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn test_mem_store_conditional_write() {
    conditional_write_contract(Arc::new(MemOrderStore::new())).await;
}

#[tokio::test]
async fn test_mem_store_duplicate_insert() {
    duplicate_insert_contract(Arc::new(MemOrderStore::new())).await;
}

#[tokio::test]
async fn test_mem_store_list_available() {
    list_available_contract(Arc::new(MemOrderStore::new())).await;
}

#[tokio::test]
async fn test_sled_store_conditional_write() {
    conditional_write_contract(Arc::new(SledOrderStore::temporary().unwrap())).await;
}

#[tokio::test]
async fn test_sled_store_duplicate_insert() {
    duplicate_insert_contract(Arc::new(SledOrderStore::temporary().unwrap())).await;
}

#[tokio::test]
async fn test_sled_store_list_available() {
    list_available_contract(Arc::new(SledOrderStore::temporary().unwrap())).await;
}

#[tokio::test]
async fn test_sled_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders");
    {
        let db = init_sled_order_db(&path).unwrap();
        let store = SledOrderStore::new(&db).unwrap();
        store.insert(pickup_ready("o1")).await.unwrap();
        store
            .update_if("o1", WriteGuard::unclaimed(), claim_patch("d1"))
            .await
            .unwrap();
        db.flush().unwrap();
    }

    let db = init_sled_order_db(&path).unwrap();
    let store = SledOrderStore::new(&db).unwrap();
    let order = store.fetch("o1").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::PickupAccepted);
    assert_eq!(order.driver_id.as_deref(), Some("d1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sled_store_concurrent_claims_single_winner() {
    let store = Arc::new(SledOrderStore::temporary().unwrap());
    store.insert(pickup_ready("o1")).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .update_if("o1", WriteGuard::unclaimed(), claim_patch(&format!("d{i}")))
                .await
                .unwrap()
        }));
    }
    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap().is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[test]
fn test_guard_and_patch() {
    let mut order = pickup_ready("o1");
    assert!(WriteGuard::unclaimed().matches(&order));
    assert!(WriteGuard::status(OrderStatus::PickupPending).matches(&order));
    assert!(!WriteGuard::status(OrderStatus::Preparing).matches(&order));

    claim_patch("d1").apply(&mut order);
    assert!(!WriteGuard::unclaimed().matches(&order));

    OrderPatch {
        status: OrderStatus::Cancelled,
        driver: DriverChange::Clear,
        updated_at: 43,
    }
    .apply(&mut order);
    assert_eq!(order.driver_id, None);
    assert!(order.driver_invariant_holds());
}

#[tokio::test]
async fn test_publishing_store_announces_writes() {
    let feed = Arc::new(LocalChangeFeed::new(16, 0));
    let store = FeedPublishingStore::new(Arc::new(MemOrderStore::new()), feed.clone());
    let mut stream = feed.connect(&Topic::table(Table::Orders)).await.unwrap();

    store.insert(pickup_ready("o1")).await.unwrap();
    store
        .update_if("o1", WriteGuard::unclaimed(), claim_patch("d1"))
        .await
        .unwrap();
    // no row matched, nothing published
    store
        .update_if("o1", WriteGuard::unclaimed(), claim_patch("d2"))
        .await
        .unwrap();
    store.insert(pickup_ready("o2")).await.unwrap();

    let inserted = stream.next().await.unwrap();
    assert_eq!(inserted.kind, EventKind::Insert);
    assert_eq!(inserted.row_id(), "o1");

    let claimed = stream.next().await.unwrap();
    assert_eq!(claimed.kind, EventKind::Update);
    assert_eq!(claimed.new_status(), Some(OrderStatus::PickupAccepted));
    assert!(claimed.old.is_none());

    let next = stream.next().await.unwrap();
    assert_eq!(next.row_id(), "o2");
}
