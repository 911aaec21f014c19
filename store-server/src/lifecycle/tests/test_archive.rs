//! Archive, restore and message scenarios

use super::*;

fn delivered_order(storage: &StoreStorage, lifecycle: &OrderLifecycle) -> Order {
    seed_product(storage, 1, 100.0, 10);
    let order = lifecycle.create_order(&draft(vec![(1, 1)]), "web").unwrap();
    lifecycle
        .transition(&order.id, OrderStatus::Cobrada, "gateway")
        .unwrap();
    lifecycle
        .transition(&order.id, OrderStatus::Delivered, "admin")
        .unwrap()
        .order
}

#[test]
fn test_archive_moves_order_atomically() {
    let (storage, lifecycle) = setup();
    let order = delivered_order(&storage, &lifecycle);

    let archived = lifecycle.archive_order(&order.id).unwrap();
    assert!(archived.archived_date.is_some());

    assert!(storage.get_order(&order.id).unwrap().is_none());
    let archived_all = storage.get_all_archived_orders().unwrap();
    assert_eq!(archived_all.len(), 1);
    assert_eq!(archived_all[0].id, order.id);
}

#[test]
fn test_restore_clears_archived_date() {
    let (storage, lifecycle) = setup();
    let order = delivered_order(&storage, &lifecycle);
    lifecycle.archive_order(&order.id).unwrap();

    let restored = lifecycle.restore_archived_order(&order.id).unwrap();
    assert!(restored.archived_date.is_none());
    assert!(storage.get_order(&order.id).unwrap().is_some());
    assert!(storage.get_all_archived_orders().unwrap().is_empty());

    // Stock was never touched by the move
    assert_eq!(product_stock(&storage, 1), 9);
}

#[test]
fn test_delete_only_from_archive() {
    let (storage, lifecycle) = setup();
    let order = delivered_order(&storage, &lifecycle);

    // Active orders cannot be hard-deleted
    assert!(matches!(
        lifecycle.delete_archived_order(&order.id),
        Err(LifecycleError::ArchivedOrderNotFound(_))
    ));

    lifecycle.archive_order(&order.id).unwrap();
    lifecycle.delete_archived_order(&order.id).unwrap();
    assert!(storage.get_all_archived_orders().unwrap().is_empty());
    assert!(storage.get_order(&order.id).unwrap().is_none());
}

#[test]
fn test_archive_unknown_order() {
    let (_storage, lifecycle) = setup();
    assert!(matches!(
        lifecycle.archive_order("nope"),
        Err(LifecycleError::OrderNotFound(_))
    ));
    assert!(matches!(
        lifecycle.restore_archived_order("nope"),
        Err(LifecycleError::ArchivedOrderNotFound(_))
    ));
}

#[test]
fn test_messages_and_tracking() {
    let (storage, lifecycle) = setup();
    seed_product(&storage, 1, 100.0, 10);
    let order = lifecycle.create_order(&draft(vec![(1, 1)]), "web").unwrap();

    lifecycle
        .add_message(&order.id, "su pedido está listo", "admin")
        .unwrap();
    let updated = lifecycle
        .set_tracking(
            &order.id,
            Some("CA123456789AR".to_string()),
            Some("https://correo.example/track/CA123456789AR".to_string()),
        )
        .unwrap();

    assert_eq!(updated.tracking_number.as_deref(), Some("CA123456789AR"));
    assert_eq!(updated.messages.len(), 1);
    assert_eq!(updated.messages[0].text, "su pedido está listo");
}

#[test]
fn test_find_order_by_token() {
    let (storage, lifecycle) = setup();
    seed_product(&storage, 1, 100.0, 10);
    let order = lifecycle.create_order(&draft(vec![(1, 1)]), "web").unwrap();

    let found = lifecycle
        .find_order_by_token(&order.tracking_token)
        .unwrap()
        .unwrap();
    assert_eq!(found.id, order.id);
    assert!(lifecycle.find_order_by_token("ffffffff").unwrap().is_none());
}
