use chrono::NaiveDate;
use orderline_core::{DomainError, Percent};
use orderline_orders::{
    CounterRecord, CustomerMaster, EngineConfig, InMemoryCounterStore, ItemMaster, LineDiscount,
    LineItem,
    NoticeLevel, OrderChannel, OrderCounterStore, OrderLineEngine, OrderNumber, OrderReview,
    OrderStatus, SessionContext, next_order_number,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn admin() -> SessionContext {
    SessionContext::new(OrderChannel::Admin, "EXE-3", "Meena").with_role("sales")
}

fn open(store: InMemoryCounterStore, today: NaiveDate) -> OrderLineEngine<InMemoryCounterStore> {
    orderline_observability::init();
    OrderLineEngine::open(&EngineConfig::default(), store, admin(), today)
}

fn item(code: &str, rate: i64, gst: &str) -> ItemMaster {
    ItemMaster::new(code, format!("Item {code}"), Decimal::from(rate), Percent::parse(gst).unwrap())
}

#[test]
fn switching_home_state_to_another_state_moves_tax_to_igst() {
    let mut engine = open(InMemoryCounterStore::new(), day(2025, 11, 5));
    engine.set_customer_state("Tamil Nadu");
    engine.add_line(&item("A", 100, "18%"), 10).unwrap();

    let line = &engine.lines()[0];
    assert_eq!(line.gross_amount(), Decimal::from(1000));
    assert_eq!(line.sgst(), Decimal::from(90));
    assert_eq!(line.cgst(), Decimal::from(90));
    assert_eq!(line.igst(), Decimal::ZERO);

    engine.set_customer_state("Kerala");
    let line = &engine.lines()[0];
    assert_eq!(line.sgst(), Decimal::ZERO);
    assert_eq!(line.cgst(), Decimal::ZERO);
    assert_eq!(line.igst(), Decimal::from(180));
}

#[test]
fn order_numbers_increment_within_a_day_and_restart_on_the_next() {
    let same = next_order_number("SQ-05-11-25-0004", day(2025, 11, 5), day(2025, 11, 5)).unwrap();
    assert_eq!(same.to_string(), "SQ-05-11-25-0005");

    let next_day =
        next_order_number("SQ-05-11-25-0004", day(2025, 11, 5), day(2025, 11, 6)).unwrap();
    assert_eq!(next_day.to_string(), "SQ-06-11-25-0001");

    let err = next_order_number("garbage", day(2025, 11, 5), day(2025, 11, 5)).unwrap_err();
    assert!(matches!(err, DomainError::Format(_)));
}

#[test]
fn engine_continues_the_stored_sequence() {
    let last = OrderNumber::parse("SQ-05-11-25-0004").unwrap();
    let store = InMemoryCounterStore::with_record(&CounterRecord::new(day(2025, 11, 5), &last)).unwrap();

    let engine = open(store, day(2025, 11, 5));
    assert_eq!(engine.order_number().to_string(), "SQ-05-11-25-0005");
}

#[test]
fn corrupted_counter_degrades_to_first_number_of_the_day() {
    let store = InMemoryCounterStore::with_raw(r#"{"date":"2025-11-05","orderNumber":"SQ-oops"}"#);
    let engine = open(store, day(2025, 11, 5));
    assert_eq!(engine.order_number().to_string(), "SQ-05-11-25-0001");
}

#[test]
fn removed_lines_never_contribute_to_totals() {
    let mut engine = open(InMemoryCounterStore::new(), day(2025, 11, 5));
    engine.add_line(&item("A", 10, "12"), 2).unwrap();
    engine.add_line(&item("B", 999, "28"), 7).unwrap();
    engine.add_line(&item("C", 5, "5"), 1).unwrap();

    engine.remove_line(1);
    let totals = engine.compute_totals();
    assert_eq!(totals.total_quantity, 3);
    assert_eq!(totals.total_amount, Decimal::from(25));
    assert_eq!(engine.lines().len(), 2);
    assert_eq!(engine.lines()[1].item_code().as_str(), "C");
}

#[test]
fn invalid_quantity_updates_leave_the_line_unchanged() {
    let mut engine = open(InMemoryCounterStore::new(), day(2025, 11, 5));
    engine.add_line(&item("A", 10, "18"), 3).unwrap();
    let before = engine.lines()[0].clone();
    engine.drain_notices();

    assert!(matches!(
        engine.update_quantity(0, "-2"),
        Err(DomainError::Validation(_))
    ));
    assert_eq!(engine.lines()[0], before);
    assert_eq!(engine.drain_notices()[0].level, NoticeLevel::Error);
}

#[test]
fn submitted_order_is_numbered_serialized_and_reviewable() {
    let mut engine = open(InMemoryCounterStore::new(), day(2025, 11, 5));
    engine.select_customer(&CustomerMaster::new("C-5", "Velan Hardware", "Kerala"));
    engine.add_line(&item("A", 100, "18"), 10).unwrap();

    let submission = engine.submit().unwrap();
    assert_eq!(submission.order_number.to_string(), "SQ-05-11-25-0001");
    assert_eq!(submission.totals.total_payable, Decimal::from(1180));

    let stored = engine.counter_store().get().unwrap().unwrap();
    assert_eq!(stored.order_number, "SQ-05-11-25-0001");
    assert_eq!(stored.date, day(2025, 11, 5));
    assert_eq!(engine.order_number().to_string(), "SQ-05-11-25-0002");

    let json = serde_json::to_value(&submission.records).unwrap();
    let row = &json[0];
    assert_eq!(row["voucher_type"], "Sales Order");
    assert_eq!(row["order_no"], "SQ-05-11-25-0001");
    assert_eq!(row["executiveCode"], "EXE-3");
    assert_eq!(row["status"], "pending");
    assert_eq!(row["igst"], 180.0);
    assert_eq!(row["sgst"], 0.0);
    assert_eq!(row["amount"], 1000.0);
    assert_eq!(row["uom"], "No's");

    let mut review = OrderReview::from_records(submission.records).unwrap();
    review.approve().unwrap();
    assert!(review.records().iter().all(|r| r.status == OrderStatus::Approved));
}

#[test]
fn default_discount_flows_into_records_and_review_edits() {
    let config = EngineConfig {
        default_discount: LineDiscount::new(Percent::parse("5").unwrap(), Percent::ZERO),
        ..EngineConfig::default()
    };
    let mut engine = OrderLineEngine::open(&config, InMemoryCounterStore::new(), admin(), day(2025, 11, 5));
    engine.select_customer(&CustomerMaster::new("C-5", "Velan Hardware", "Tamil Nadu"));
    engine.add_line(&item("A", 200, "12"), 5).unwrap();
    engine.add_line(&item("A", 200, "12"), 5).unwrap();
    engine.add_line(&item("B", 50, "5"), 2).unwrap();

    let records = engine.submit().unwrap().records;
    assert_eq!(records[0].quantity, 10);
    assert_eq!(records[0].disc_amount, Decimal::from(100));
    assert_eq!(records[0].gross_amount, Decimal::from(1900));
    assert_eq!(records[0].sgst, Decimal::from(114));

    let mut review = OrderReview::from_records(records).unwrap();
    review.update_quantity(0, "6").unwrap();
    let edited = review
        .set_line_discount(0, Percent::ZERO, Percent::parse("10").unwrap())
        .unwrap();
    assert_eq!(edited.spl_disc_amount, Decimal::from(120));
    assert_eq!(edited.gross_amount, Decimal::from(1080));
    assert_eq!(edited.cgst, Decimal::new(6480, 2));
    assert!(review.records().iter().all(|r| r.total_quantity == 8 && r.total_amount == Decimal::from(1300)));

    review.approve().unwrap();
    assert!(review.update_quantity(0, "1").is_err());
}

#[test]
fn quantity_input_takes_digits_only() {
    let mut engine = open(InMemoryCounterStore::new(), day(2025, 11, 5));
    engine.add_line(&item("A", 10, "18"), 3).unwrap();

    for bad in ["+5", "1_000", "3.0", "1e2"] {
        assert!(engine.update_quantity(0, bad).is_err(), "{bad:?}");
    }
    assert_eq!(engine.update_quantity(0, "1000").unwrap().quantity(), 1000);
}

#[derive(Debug, Clone)]
enum Op {
    Add { item: usize, quantity: u32 },
    Remove(usize),
    Update(usize, String),
    State(&'static str),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6, 0u32..50).prop_map(|(item, quantity)| Op::Add { item, quantity }),
        (0usize..8).prop_map(Op::Remove),
        (0usize..8, prop_oneof![
            (0u32..100).prop_map(|q| q.to_string()),
            Just(String::new()),
            Just("-4".to_string()),
            Just("2.5".to_string()),
            Just("x".to_string()),
        ])
            .prop_map(|(i, raw)| Op::Update(i, raw)),
        prop_oneof![Just("Tamil Nadu"), Just("tn"), Just("Kerala"), Just("")].prop_map(Op::State),
    ]
}

fn sum_of(lines: &[LineItem]) -> (u64, Decimal, Decimal) {
    lines.iter().fold((0, Decimal::ZERO, Decimal::ZERO), |(q, amount, tax), line| {
        (
            q + u64::from(line.quantity()),
            amount + line.gross_amount(),
            tax + line.sgst() + line.cgst() + line.igst(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn totals_always_equal_the_sum_of_current_lines(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let catalog: Vec<ItemMaster> = (0..6)
            .map(|i| ItemMaster::new(
                format!("I{i}"),
                format!("Item {i}"),
                Decimal::new(1_999 + 250 * i as i64, 2),
                Percent::new(Decimal::from([0, 5, 12, 18, 28, 18][i])).unwrap(),
            ))
            .collect();
        let mut engine = OrderLineEngine::open(
            &EngineConfig::default(),
            InMemoryCounterStore::new(),
            admin(),
            day(2025, 11, 5),
        );

        for op in ops {
            match op {
                Op::Add { item, quantity } => { let _ = engine.add_line(&catalog[item], quantity); }
                Op::Remove(index) => engine.remove_line(index),
                Op::Update(index, raw) => { let _ = engine.update_quantity(index, &raw); }
                Op::State(state) => engine.set_customer_state(state),
            }

            let totals = engine.compute_totals();
            let (quantity, amount, tax) = sum_of(engine.lines());
            prop_assert_eq!(totals.total_quantity, quantity);
            prop_assert_eq!(totals.total_amount, amount);
            prop_assert_eq!(totals.total_tax(), tax);
            prop_assert_eq!(totals, engine.compute_totals());

            for line in engine.lines() {
                prop_assert_eq!(line.gross_amount(), Decimal::from(line.quantity()) * line.rate());
                if engine.draft().region().is_intra_state() {
                    prop_assert_eq!(line.sgst(), line.cgst());
                    prop_assert_eq!(line.igst(), Decimal::ZERO);
                } else {
                    prop_assert_eq!(line.igst(), line.gst_amount());
                    prop_assert_eq!(line.sgst(), Decimal::ZERO);
                }
            }
        }
    }
}
