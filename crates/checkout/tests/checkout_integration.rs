//! Integration tests for the checkout workflows over the in-memory store.

use checkout::{CheckoutError, CheckoutService};
use common::{CustomerId, FruitId, Money};
use domain::{
    Fruit, MovementDirection, NewCustomer, NewFruit, OrderDraft, OrderLine, OrderStatus,
    PaymentMethod, PaymentStatus,
};
use storage::{MemoryStore, StoreError};

fn service() -> CheckoutService<MemoryStore> {
    CheckoutService::new(MemoryStore::new())
}

async fn seed_fruit(
    service: &CheckoutService<MemoryStore>,
    name: &str,
    price_cents: i64,
    stock: i64,
) -> Fruit {
    service
        .create_fruit(NewFruit {
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            stock,
            image_url: None,
        })
        .await
        .unwrap()
}

fn line(fruit: &Fruit, quantity: u32) -> OrderLine {
    OrderLine {
        fruit_id: fruit.id,
        quantity,
        unit_price: fruit.price,
    }
}

fn draft(lines: Vec<OrderLine>) -> OrderDraft {
    OrderDraft {
        customer_id: CustomerId::new(),
        user_id: None,
        payment_method: PaymentMethod::Cash,
        lines,
    }
}

mod order_creation {
    use super::*;

    #[tokio::test]
    async fn placing_an_order_for_stock_5_quantity_3() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;

        let order = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap();

        assert_eq!(order.total.cents(), 3000);
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.order_number.starts_with("ORD-"));

        assert_eq!(service.fruit(mango.id).await.unwrap().stock, 2);

        let details = service.order(order.id).await.unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].quantity, 3);
        assert_eq!(details.items[0].subtotal.cents(), 3000);
        assert_eq!(details.payments.len(), 1);
        assert_eq!(details.payments[0].amount.cents(), 3000);
        assert_eq!(details.payments[0].status, PaymentStatus::Pending);
        assert_eq!(details.payments[0].method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn multi_line_order_decrements_every_fruit() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let apple = seed_fruit(&service, "Apple", 250, 10).await;

        let order = service
            .create_order(draft(vec![line(&mango, 2), line(&apple, 4)]))
            .await
            .unwrap();

        assert_eq!(order.total.cents(), 3000);
        assert_eq!(service.fruit(mango.id).await.unwrap().stock, 3);
        assert_eq!(service.fruit(apple.id).await.unwrap().stock, 6);
    }

    #[tokio::test]
    async fn order_captures_caller_supplied_price_not_live_price() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;

        // The cart saw the fruit at 800.
        let order = service
            .create_order(draft(vec![OrderLine {
                fruit_id: mango.id,
                quantity: 2,
                unit_price: Money::from_cents(800),
            }]))
            .await
            .unwrap();

        assert_eq!(order.total.cents(), 1600);
        let details = service.order(order.id).await.unwrap();
        assert_eq!(details.items[0].unit_price.cents(), 800);
    }

    #[tokio::test]
    async fn creation_logs_an_out_movement_per_line() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;

        let order = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap();

        let movements = service.stock_movements(mango.id, 10).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].direction, MovementDirection::Out);
        assert_eq!(movements[0].quantity, 3);
        assert!(movements[0].description.contains(&order.order_number));
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_no_trace() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 2).await;

        let err = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for Mango");

        assert_eq!(service.fruit(mango.id).await.unwrap().stock, 2);
        assert!(service.orders(10).await.unwrap().is_empty());
        assert!(service.stock_movements(mango.id, 10).await.unwrap().is_empty());
        assert_eq!(service.store().movement_count().await, 0);
    }

    #[tokio::test]
    async fn one_short_line_rolls_back_all_lines() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let apple = seed_fruit(&service, "Apple", 250, 1).await;

        let err = service
            .create_order(draft(vec![line(&mango, 2), line(&apple, 3)]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for Apple");

        // The mango decrement from the first line must not survive.
        assert_eq!(service.fruit(mango.id).await.unwrap().stock, 5);
        assert_eq!(service.fruit(apple.id).await.unwrap().stock, 1);
        assert!(service.orders(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_rejects_before_any_transaction() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;

        let err = service.create_order(draft(vec![])).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));

        let err = service
            .create_order(draft(vec![line(&mango, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));

        let err = service
            .create_order(draft(vec![OrderLine {
                fruit_id: mango.id,
                quantity: 1,
                unit_price: Money::zero(),
            }]))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn order_numbers_are_unique_across_orders() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 100).await;

        let a = service
            .create_order(draft(vec![line(&mango, 1)]))
            .await
            .unwrap();
        let b = service
            .create_order(draft(vec![line(&mango, 1)]))
            .await
            .unwrap();

        assert_ne!(a.order_number, b.order_number);
    }
}

mod order_cancellation {
    use super::*;

    #[tokio::test]
    async fn cancelling_restores_stock_and_fails_payments() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let order = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap();

        let cancelled = service.cancel_order(order.id).await.unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(service.fruit(mango.id).await.unwrap().stock, 5);

        let details = service.order(order.id).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Cancelled);
        assert!(details
            .payments
            .iter()
            .all(|p| p.status == PaymentStatus::Failed));
    }

    #[tokio::test]
    async fn cancelling_appends_an_in_movement() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let order = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap();

        service.cancel_order(order.id).await.unwrap();

        let movements = service.stock_movements(mango.id, 10).await.unwrap();
        // "out" from creation plus "in" from cancellation.
        assert_eq!(movements.len(), 2);
        let restoration = movements
            .iter()
            .find(|m| m.direction == MovementDirection::In)
            .unwrap();
        assert_eq!(restoration.quantity, 3);
        assert_eq!(
            restoration.description,
            format!("Order {} cancelled", order.order_number)
        );
    }

    #[tokio::test]
    async fn second_cancel_fails_and_mutates_nothing() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let order = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap();

        service.cancel_order(order.id).await.unwrap();
        let movements_before = service.store().movement_count().await;

        let err = service.cancel_order(order.id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidTransition { .. }));

        assert_eq!(service.fruit(mango.id).await.unwrap().stock, 5);
        assert_eq!(service.store().movement_count().await, movements_before);
    }

    #[tokio::test]
    async fn cancelling_a_completed_order_is_rejected() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let order = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap();

        service.complete_order(order.id).await.unwrap();

        let err = service.cancel_order(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Cancelled,
            }
        ));
        // Stock stays consumed.
        assert_eq!(service.fruit(mango.id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn cancelling_a_missing_order_is_not_found() {
        let service = service();
        let err = service
            .cancel_order(common::OrderId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::OrderNotFound(_)));
    }
}

mod order_completion {
    use super::*;

    #[tokio::test]
    async fn processing_order_can_complete() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let order = service
            .create_order(draft(vec![line(&mango, 1)]))
            .await
            .unwrap();

        let completed = service.complete_order(order.id).await.unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn cancelled_order_cannot_complete() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let order = service
            .create_order(draft(vec![line(&mango, 1)]))
            .await
            .unwrap();
        service.cancel_order(order.id).await.unwrap();

        let err = service.complete_order(order.id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidTransition { .. }));
    }
}

mod summaries {
    use super::*;

    #[tokio::test]
    async fn order_summary_counts_statuses_and_revenue() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 50).await;

        let a = service
            .create_order(draft(vec![line(&mango, 3)]))
            .await
            .unwrap();
        let _b = service
            .create_order(draft(vec![line(&mango, 2)]))
            .await
            .unwrap();
        let c = service
            .create_order(draft(vec![line(&mango, 1)]))
            .await
            .unwrap();

        service.complete_order(a.id).await.unwrap();
        service.cancel_order(c.id).await.unwrap();

        let summary = service.order_summary().await.unwrap();
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.total_amount.cents(), 6000);
        assert_eq!(summary.processing, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.cancelled, 1);

        // Everything was placed just now, so the time windows match the totals.
        assert_eq!(summary.today_count, 3);
        assert_eq!(summary.today_amount.cents(), 6000);
        assert_eq!(summary.this_month_count, 3);
        assert_eq!(summary.this_month_amount.cents(), 6000);
    }
}

mod admin {
    use super::*;

    #[tokio::test]
    async fn fruit_referenced_by_an_order_cannot_be_deleted() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        service
            .create_order(draft(vec![line(&mango, 1)]))
            .await
            .unwrap();

        let err = service.delete_fruit(mango.id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Conflict(_))));
        assert!(service.fruit(mango.id).await.is_ok());
    }

    #[tokio::test]
    async fn unordered_fruit_can_be_deleted() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;

        service.delete_fruit(mango.id).await.unwrap();
        let err = service.fruit(mango.id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::FruitNotFound(_)));
    }

    #[tokio::test]
    async fn customer_with_orders_cannot_be_deleted() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let customer = service
            .create_customer(NewCustomer {
                name: "Alice".to_string(),
                email: Some("alice@example.com".to_string()),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        let mut order_draft = draft(vec![line(&mango, 1)]);
        order_draft.customer_id = customer.id;
        service.create_order(order_draft).await.unwrap();

        let err = service.delete_customer(customer.id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn duplicate_customer_email_is_a_conflict() {
        let service = service();
        let new = |name: &str| NewCustomer {
            name: name.to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            address: None,
        };

        service.create_customer(new("Alice")).await.unwrap();
        let err = service.create_customer(new("Alicia")).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Store(StoreError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn fruit_patch_updates_price_without_touching_orders() {
        let service = service();
        let mango = seed_fruit(&service, "Mango", 1000, 5).await;
        let order = service
            .create_order(draft(vec![line(&mango, 2)]))
            .await
            .unwrap();

        service
            .update_fruit(
                mango.id,
                domain::FruitPatch {
                    price: Some(Money::from_cents(2000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Historical order keeps the captured price.
        let details = service.order(order.id).await.unwrap();
        assert_eq!(details.items[0].unit_price.cents(), 1000);
        assert_eq!(details.order.total.cents(), 2000);
        assert_eq!(service.fruit(mango.id).await.unwrap().price.cents(), 2000);
    }

    #[tokio::test]
    async fn unknown_fruit_lookup_is_not_found() {
        let service = service();
        let err = service.fruit(FruitId::new()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::FruitNotFound(_)));
    }
}
