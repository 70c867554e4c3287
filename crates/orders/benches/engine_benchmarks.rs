use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;
use orderline_core::Percent;
use orderline_orders::{
    CustomerMaster, EngineConfig, InMemoryCounterStore, ItemMaster, OrderChannel, OrderLineEngine,
    SessionContext,
};
use rust_decimal::Decimal;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 5).unwrap()
}

fn catalog(size: usize) -> Vec<ItemMaster> {
    (0..size)
        .map(|i| {
            ItemMaster::new(
                format!("ITM-{i:05}"),
                format!("Item {i}"),
                Decimal::new(12_550 + i as i64, 2),
                Percent::new(Decimal::from([5, 12, 18, 28][i % 4])).unwrap(),
            )
        })
        .collect()
}

fn engine_with(items: &[ItemMaster]) -> OrderLineEngine<InMemoryCounterStore> {
    let session = SessionContext::new(OrderChannel::Admin, "EXE-1", "Bench");
    let mut engine = OrderLineEngine::open(
        &EngineConfig::default(),
        InMemoryCounterStore::new(),
        session,
        today(),
    );
    engine.select_customer(&CustomerMaster::new("C-1", "Bench Traders", "Tamil Nadu"));
    for item in items {
        engine.add_line(item, 3).unwrap();
    }
    engine.drain_notices();
    engine
}

fn bench_add_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_line");

    for size in [10usize, 100, 500] {
        let items = catalog(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("distinct_items", size), &items, |b, items| {
            b.iter(|| engine_with(black_box(items)));
        });
    }

    // Duplicate adds hit the merge path and a linear scan of existing lines.
    let items = catalog(100);
    group.bench_function("merge_into_100_lines", |b| {
        let mut engine = engine_with(&items);
        b.iter(|| engine.add_line(black_box(&items[99]), 1).unwrap());
    });

    group.finish();
}

fn bench_state_switch(c: &mut Criterion) {
    let mut group = c.benchmark_group("customer_state_switch");

    for size in [10usize, 100, 500] {
        let items = catalog(size);
        group.bench_with_input(BenchmarkId::new("retax_lines", size), &items, |b, items| {
            let mut engine = engine_with(items);
            let mut intra = false;
            b.iter(|| {
                intra = !intra;
                engine.set_customer_state(if intra { "Tamil Nadu" } else { "Kerala" });
            });
        });
    }

    group.finish();
}

fn bench_totals_and_submit(c: &mut Criterion) {
    let items = catalog(200);
    let mut group = c.benchmark_group("totals_and_submit");

    group.bench_function("compute_totals_200_lines", |b| {
        let engine = engine_with(&items);
        b.iter(|| black_box(engine.compute_totals()));
    });

    group.bench_function("submit_200_lines", |b| {
        b.iter_batched(
            || engine_with(&items),
            |mut engine| engine.submit().unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_add_line,
    bench_state_switch,
    bench_totals_and_submit
);
criterion_main!(benches);
