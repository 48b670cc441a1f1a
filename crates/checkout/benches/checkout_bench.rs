use checkout::CheckoutService;
use common::{CustomerId, Money};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Fruit, NewFruit, OrderDraft, OrderLine, PaymentMethod};
use storage::MemoryStore;

fn draft_for(fruits: &[Fruit], quantity: u32) -> OrderDraft {
    OrderDraft {
        customer_id: CustomerId::new(),
        user_id: None,
        payment_method: PaymentMethod::Cash,
        lines: fruits
            .iter()
            .map(|fruit| OrderLine {
                fruit_id: fruit.id,
                quantity,
                unit_price: fruit.price,
            })
            .collect(),
    }
}

/// Seed a catalog of N fruits, each with effectively unlimited stock.
async fn seed_catalog(service: &CheckoutService<MemoryStore>, n: usize) -> Vec<Fruit> {
    let mut fruits = Vec::with_capacity(n);
    for i in 0..n {
        let fruit = service
            .create_fruit(NewFruit {
                name: format!("Fruit {i}"),
                price: Money::from_cents(500),
                stock: i64::MAX / 2,
                image_url: None,
            })
            .await
            .unwrap();
        fruits.push(fruit);
    }
    fruits
}

fn bench_create_single_line_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CheckoutService::new(MemoryStore::new());
    let fruits = rt.block_on(seed_catalog(&service, 1));

    c.bench_function("checkout/create_single_line_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.create_order(draft_for(&fruits, 2)).await.unwrap();
            });
        });
    });
}

fn bench_create_ten_line_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CheckoutService::new(MemoryStore::new());
    let fruits = rt.block_on(seed_catalog(&service, 10));

    c.bench_function("checkout/create_ten_line_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.create_order(draft_for(&fruits, 1)).await.unwrap();
            });
        });
    });
}

fn bench_create_then_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CheckoutService::new(MemoryStore::new());
    let fruits = rt.block_on(seed_catalog(&service, 3));

    c.bench_function("checkout/create_then_cancel", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = service.create_order(draft_for(&fruits, 1)).await.unwrap();
                service.cancel_order(order.id).await.unwrap();
            });
        });
    });
}

fn bench_order_summary_500_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CheckoutService::new(MemoryStore::new());

    rt.block_on(async {
        let fruits = seed_catalog(&service, 1).await;
        for _ in 0..500 {
            service.create_order(draft_for(&fruits, 1)).await.unwrap();
        }
    });

    c.bench_function("checkout/order_summary_500_orders", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.order_summary().await.unwrap();
            });
        });
    });
}

fn bench_fruit_stats_200_fruits(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CheckoutService::new(MemoryStore::new());

    rt.block_on(async {
        for i in 0..200 {
            service
                .create_fruit(NewFruit {
                    name: format!("Fruit {i}"),
                    price: Money::from_cents(500),
                    stock: (i % 25) as i64,
                    image_url: None,
                })
                .await
                .unwrap();
        }
    });

    c.bench_function("checkout/fruit_stats_200_fruits", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.fruit_stats().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_single_line_order,
    bench_create_ten_line_order,
    bench_create_then_cancel,
    bench_order_summary_500_orders,
    bench_fruit_stats_200_fruits,
);
criterion_main!(benches);
