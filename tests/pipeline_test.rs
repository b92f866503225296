use bond_ledger::config::Config;
use bond_ledger::domain::{Currency, InstrumentMetadata, Nominal, Nullable};
use bond_ledger::{
    run, AccountId, DataSource, Decimal, InstrumentUid, MarketSnapshot, MemoryDataSource,
    Operation, OperationKind, Ticker,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn day(y: i32, m: u32, dd: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, dd).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
}

fn config(mode: &str) -> Config {
    let mut env = HashMap::new();
    env.insert("OPERATIONS_PATH".to_string(), "unused.csv".to_string());
    env.insert("REFERENCE_PATH".to_string(), "unused.json".to_string());
    env.insert("ACCOUNT_ID".to_string(), "acc".to_string());
    env.insert("REPORT_MODE".to_string(), mode.to_string());
    Config::from_env_map(env).unwrap()
}

fn snapshot(date: NaiveDate, ytm: &str) -> MarketSnapshot {
    let mut s = MarketSnapshot::new(Ticker::new("SU26207RMFS9"), date);
    s.short_name = Nullable::Value("ОФЗ 26207".to_string());
    s.maturity_date = Nullable::Value(day(2027, 2, 3));
    s.yield_to_maturity = Nullable::Value(d(ytm));
    s
}

/// Ten bonds held for over three years, one coupon, quoted at 105%.
fn source() -> MemoryDataSource {
    let uid = InstrumentUid::new("uid-26207");
    let account = AccountId::new("acc");
    let bought = Utc.with_ymd_and_hms(2021, 1, 4, 7, 0, 0).unwrap();

    MemoryDataSource::new()
        .with_instrument(
            uid.clone(),
            InstrumentMetadata {
                name: "ОФЗ-ПД 26207".to_string(),
                ticker: Ticker::new("SU26207RMFS9"),
                class_code: "TQOB".to_string(),
                nominal: Nominal {
                    amount: d("1000"),
                    currency: Currency::new("rub"),
                },
                replaced: false,
            },
        )
        .with_last_price(uid.clone(), d("105"))
        .with_snapshot(snapshot(day(2020, 12, 30), "5.9"))
        .with_snapshot(snapshot(day(2024, 6, 28), "15.7"))
        .with_operations(
            account,
            vec![
                Operation::new(OperationKind::Buy, bought, uid.clone())
                    .with_quantity(d("10"))
                    .with_price(d("1000"))
                    .with_payment(d("-10000")),
                Operation::new(
                    OperationKind::Coupon,
                    Utc.with_ymd_and_hms(2021, 8, 4, 9, 0, 0).unwrap(),
                    uid,
                )
                .with_payment(d("300")),
            ],
        )
}

fn number(value: &Value, field: &str) -> f64 {
    value[field].as_f64().unwrap()
}

#[tokio::test]
async fn test_general_report_end_to_end() {
    let json = run(&config("general"), Arc::new(source()), now()).await.unwrap();
    let rows: Vec<Value> = serde_json::from_str(&json).unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["name"], "ОФЗ 26207");
    assert_eq!(row["ticker"], "SU26207RMFS9");
    assert_eq!(row["redemption_date"], "2027-02-03");
    assert_eq!(number(row, "quantity"), 10.0);
    assert_eq!(number(row, "position_price"), 1000.0);
    assert_eq!(number(row, "profit"), 800.0);
    assert_eq!(number(row, "profit_in_percentage"), 8.0);
    assert_eq!(number(row, "percent_of_portfolio"), 100.0);
    assert_eq!(number(row, "current_yield"), 15.7);
    assert_eq!(number(row, "yield_on_purchase"), 5.9);
}

#[tokio::test]
async fn test_lot_report_is_tax_exempt_after_three_years() {
    let json = run(&config("lots"), Arc::new(source()), now()).await.unwrap();
    let rows: Vec<Value> = serde_json::from_str(&json).unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(number(row, "sell_price"), 1050.0);
    assert_eq!(number(row, "profit_before_tax"), 800.0);
    assert_eq!(number(row, "tax"), 0.0);
    assert_eq!(number(row, "profit"), 800.0);
    assert!(row["sell_date"].is_null());
}

#[tokio::test]
async fn test_lot_report_lists_realized_slice_before_open_remainder() {
    let source = source()
        .with_snapshot(snapshot(day(2022, 3, 1), "9.8"))
        .with_operation(
            AccountId::new("acc"),
            Operation::new(
                OperationKind::Sell,
                Utc.with_ymd_and_hms(2022, 3, 1, 9, 0, 0).unwrap(),
                InstrumentUid::new("uid-26207"),
            )
            .with_quantity(d("4"))
            .with_price(d("1020")),
        );

    let json = run(&config("lots"), Arc::new(source), now()).await.unwrap();
    let rows: Vec<Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(rows.len(), 2);

    // Sold after 421 days: 80 gain, taxed; coupon stays with the open lot.
    let sold = &rows[0];
    assert!(sold["sell_date"].is_string());
    assert_eq!(number(sold, "quantity"), 4.0);
    assert_eq!(number(sold, "sell_price"), 1020.0);
    assert_eq!(number(sold, "yield_to_maturity"), 9.8);
    assert_eq!(number(sold, "tax"), 10.4);
    assert_eq!(number(sold, "profit"), 69.6);

    let open = &rows[1];
    assert!(open["sell_date"].is_null());
    assert_eq!(number(open, "quantity"), 6.0);
    assert_eq!(number(open, "profit"), 600.0);
}

#[tokio::test]
async fn test_missing_snapshot_is_missing_data() {
    let source = source().with_lookback_days(0);
    let err = run(&config("lots"), Arc::new(source), now()).await.unwrap_err();
    assert!(err.is_missing_data());
}

#[tokio::test]
async fn test_files_feed_the_same_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let ops_path = dir.path().join("operations.csv");
    let ref_path = dir.path().join("reference.json");

    std::fs::File::create(&ops_path)
        .unwrap()
        .write_all(
            b"account_id,kind,date,instrument_uid,figi,currency,quantity_done,price,payment,commission,accrued_interest
acc,15,2024-01-15T07:00:00Z,uid-26207,BBG00ZK,rub,4,1000,-4000,,
acc,22,2024-03-01T07:00:00Z,uid-26207,BBG00ZK,rub,1,1020,1020,,
acc,999,2024-03-02T07:00:00Z,uid-26207,BBG00ZK,rub,,,,,
",
        )
        .unwrap();
    std::fs::File::create(&ref_path)
        .unwrap()
        .write_all(
            r#"{
                "instruments": [{
                    "instrument_uid": "uid-26207",
                    "name": "ОФЗ-ПД 26207",
                    "ticker": "SU26207RMFS9",
                    "class_code": "TQOB",
                    "nominal": { "amount": 1000, "currency": "rub" }
                }],
                "last_prices": { "uid-26207": 101 },
                "snapshots": [
                    { "ticker": "SU26207RMFS9", "date": "2024-01-15", "yield_to_maturity": 12.5 },
                    { "ticker": "SU26207RMFS9", "date": "2024-06-28", "yield_to_maturity": 15.7 }
                ]
            }"#
            .as_bytes(),
        )
        .unwrap();

    let source = MemoryDataSource::from_files(&ops_path, &ref_path).unwrap();
    let operations = source
        .fetch_operations(&AccountId::new("acc"), DateTime::<Utc>::UNIX_EPOCH)
        .await
        .unwrap();
    assert_eq!(operations.len(), 3);

    let json = run(&config("general"), Arc::new(source), now()).await.unwrap();
    let rows: Vec<Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(number(&rows[0], "quantity"), 3.0);
    // 3 of 4 still open, marked at 1010: 30 before the 13% tax.
    assert_eq!(number(&rows[0], "profit"), 26.1);
    assert_eq!(rows[0]["name"], "ОФЗ-ПД 26207");
}
