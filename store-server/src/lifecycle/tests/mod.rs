//! Lifecycle scenario tests over an in-memory database

mod test_archive;

use super::*;
use crate::ledger::InventoryLedger;
use crate::storage::StoreStorage;
use shared::models::discount::{DiscountType, ProductScope};
use shared::models::{Coupon, Product, Promotion, PromotionCondition};
use shared::order::ContactPreference;
use shared::util::now_millis;

fn setup() -> (StoreStorage, OrderLifecycle) {
    let storage = StoreStorage::open_in_memory().unwrap();
    let ledger = InventoryLedger::new(storage.clone(), 100);
    let lifecycle = OrderLifecycle::new(storage.clone(), ledger, "ARS");
    (storage, lifecycle)
}

fn seed_product(storage: &StoreStorage, id: i64, price_ars: f64, stock: i64) {
    let txn = storage.begin_write().unwrap();
    storage
        .store_product(
            &txn,
            &Product {
                id,
                name: format!("Producto {}", id),
                description: None,
                price_ars,
                price_usd: None,
                stock,
                stock_alert: 2,
                image: None,
                sort_order: 0,
                is_active: true,
                created_at: now_millis(),
                updated_at: now_millis(),
            },
        )
        .unwrap();
    txn.commit().unwrap();
}

fn seed_coupon(storage: &StoreStorage, coupon: Coupon) {
    let txn = storage.begin_write().unwrap();
    storage.store_coupon(&txn, &coupon).unwrap();
    txn.commit().unwrap();
}

fn seed_promotion(storage: &StoreStorage, promotion: Promotion) {
    let txn = storage.begin_write().unwrap();
    storage.store_promotion(&txn, &promotion).unwrap();
    txn.commit().unwrap();
}

fn basic_coupon(code: &str) -> Coupon {
    Coupon {
        id: 100,
        code: code.to_string(),
        discount_type: DiscountType::Percentage,
        value: 10.0,
        min_purchase: 0.0,
        max_uses: 0,
        uses_count: 0,
        valid_from: None,
        valid_until: None,
        applies_to: ProductScope::All,
        combinable: true,
        is_active: true,
        created_at: now_millis(),
    }
}

fn basic_promotion(value: f64) -> Promotion {
    Promotion {
        id: 200,
        name: "Promo".to_string(),
        discount_type: DiscountType::Fixed,
        value,
        applies_to: ProductScope::All,
        condition: PromotionCondition::Always,
        valid_from: None,
        valid_until: None,
        is_active: true,
        created_at: now_millis(),
    }
}

fn draft(items: Vec<(i64, i64)>) -> OrderDraft {
    OrderDraft {
        customer: CustomerInfo {
            name: "Ana García".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            chat_handle: None,
            contact_preference: ContactPreference::Email,
        },
        delivery: DeliveryMethod::Pickup,
        items: items
            .into_iter()
            .map(|(product_id, quantity)| CartLine {
                product_id,
                quantity,
            })
            .collect(),
        coupon_code: None,
        payment_method: "mercadopago".to_string(),
        shipping_cost: 0.0,
        customer_note: None,
    }
}

fn product_stock(storage: &StoreStorage, id: i64) -> i64 {
    storage.get_product(id).unwrap().unwrap().stock
}
