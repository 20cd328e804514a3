use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use reltree::*;
use serde_json::{json, Value};
use std::sync::Arc;

// One customer with `orders` orders, each order with `lines` line items.
fn make_fixture(orders: usize, lines: usize) -> Value {
    let order_rows: Vec<Value> = (1..=orders)
        .map(|i| json!({ "id": i, "customer_id": 1, "total": i * 3, "status": "open" }))
        .collect();
    let line_rows: Vec<Value> = (1..=orders * lines)
        .map(|i| json!({ "id": i, "order_id": (i - 1) / lines + 1, "sku": format!("SKU-{i:05}"), "qty": i % 7 }))
        .collect();

    json!({
        "name": "bench",
        "types": {
            "Customer": { "relationships": { "orders": { "macro": "has_many", "target": "Order" } } },
            "Order": { "relationships": {
                "customer": { "macro": "belongs_to", "target": "Customer" },
                "lines": { "macro": "has_many", "target": "Line" }
            } },
            "Line": { "relationships": { "order": { "macro": "belongs_to", "target": "Order" } } }
        },
        "records": {
            "Customer": [{ "id": 1, "name": "bench" }],
            "Order": order_rows,
            "Line": line_rows
        }
    })
}

fn make_state(orders: usize, lines: usize, page_size: usize, expand_orders: bool) -> TreeState {
    let store = MemoryStore::from_json_str(&make_fixture(orders, lines).to_string()).unwrap();
    let mut config = Config::default();
    config.page_size = page_size;
    config.model_mut("Customer").configure_children(["orders"]);
    config.model_mut("Order").configure_children(["customer", "lines"]);
    config.model_mut("Line").configure_children(["order"]);

    let mut state = TreeState::open(Arc::new(store), Arc::new(config), "Customer", &RecordId::from(1)).unwrap();

    // Open the orders group, then walk down opening every order and its line items.
    state.move_down();
    state.expand_current().unwrap();
    let mut last = usize::MAX;
    while expand_orders && state.cursor() != last {
        last = state.cursor();
        if state.cursor_row().is_some_and(|r| r.depth == 2 && r.is_record()) {
            state.expand_current().unwrap();
            state.move_down();
            state.move_down();
            state.expand_current().unwrap();
        }
        state.move_down();
    }
    state.move_to_top();
    state
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    group.sample_size(30);

    for (orders, lines) in [(50usize, 10usize), (100, 10)] {
        let label = format!("{orders}x{lines}");
        let mut state = make_state(orders, lines, orders, true);
        let rows = state.visible_rows().len();
        group.throughput(criterion::Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("visible_rows", &label), &label, |b, _| {
            b.iter(|| state.visible_rows().len())
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(30);

    let renderer = Renderer::new();
    for (w, h) in [(120u16, 40u16), (240, 80)] {
        let label = format!("{w}x{h}");
        let mut state = make_state(100, 10, 100, true);

        group.bench_with_input(BenchmarkId::new("frame", &label), &label, |b, _| {
            b.iter(|| renderer.render(&mut state, w, h).len())
        });
    }
    group.finish();
}

fn bench_paging(c: &mut Criterion) {
    let mut group = c.benchmark_group("paging");
    group.sample_size(20);

    group.bench_function("load_all_pages_2000", |b| {
        b.iter_batched(
            || {
                let mut state = make_state(2000, 0, 25, false);
                state.move_to_bottom();
                state
            },
            |mut state| {
                while state.cursor_row().map(|r| r.kind) == Some(NodeKind::LoadMore) {
                    state.toggle_expand().unwrap();
                    state.move_to_bottom();
                }
                state
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_flatten, bench_render, bench_paging);
criterion_main!(benches);
