use chrono::{NaiveDate, NaiveDateTime};
use demand_forecast::data::{first_sale, DailySeries, DataLoader, TransactionRecord};
use demand_forecast::ForecastError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn record(timestamp: &str, code: &str, quantity: i64) -> TransactionRecord {
    TransactionRecord {
        timestamp: ts(timestamp),
        stock_code: code.to_string(),
        quantity,
    }
}

#[test]
fn test_series_conserves_quantity_and_has_no_gaps() {
    let records = vec![
        record("2023-01-01 09:15:00", "20750", 5),
        record("2023-01-01 16:40:00", "20750", 7),
        record("2023-01-04 11:00:00", "20750", 3),
        record("2023-01-02 10:00:00", "99999", 100), // other SKU
        record("2023-01-03 10:00:00", "20750", -4),  // return, excluded
    ];

    let series = DailySeries::from_transactions(&records, "20750").unwrap();

    // Complete daily range Jan 1 - Jan 4, zeros on quiet days
    assert_eq!(series.start_date(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2023, 1, 4).unwrap());
    assert_eq!(series.len(), 4);
    assert_eq!(series.values(), &[12.0, 0.0, 0.0, 3.0]);

    // Conservation: sum of matching positive quantities
    assert_eq!(series.sum(), 15.0);
}

#[test]
fn test_stock_code_matching_is_normalized() {
    let records = vec![
        record("2023-01-01 09:00:00", "  20750 ", 2),
        record("2023-01-02 09:00:00", "20750", 4),
    ];

    // Lowercase query with whitespace still matches
    let series = DailySeries::from_transactions(&records, " 20750  ").unwrap();
    assert_eq!(series.sum(), 6.0);

    let records = vec![record("2023-01-01 09:00:00", "abc123", 2)];
    let series = DailySeries::from_transactions(&records, "ABC123").unwrap();
    assert_eq!(series.stock_code(), "ABC123");
}

#[test]
fn test_empty_series_error_for_unknown_sku() {
    let records = vec![record("2023-01-01 09:00:00", "20750", 5)];

    let result = DailySeries::from_transactions(&records, "NOPE");
    assert!(matches!(result, Err(ForecastError::EmptySeries(_))));

    // Returns-only history is also empty
    let records = vec![record("2023-01-01 09:00:00", "20750", -5)];
    let result = DailySeries::from_transactions(&records, "20750");
    assert!(matches!(result, Err(ForecastError::EmptySeries(_))));
}

#[test]
fn test_window_extraction() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let series =
        DailySeries::from_values("X", start, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

    let window = series
        .window(
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 4).unwrap(),
        )
        .unwrap();
    assert_eq!(window.values(), &[2.0, 3.0, 4.0]);
    assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());

    // Out-of-range windows fail
    let result = series.window(start, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
    assert!(result.is_err());
}

#[test]
fn test_first_sale() {
    let records = vec![
        record("2023-01-05 09:00:00", "20750", 5),
        record("2023-01-02 09:00:00", "20750", -1), // return, not a sale
        record("2023-01-03 09:00:00", "20750", 2),
    ];

    assert_eq!(first_sale(&records, "20750"), Some(ts("2023-01-03 09:00:00")));
    assert_eq!(first_sale(&records, "NOPE"), None);
}

#[test]
fn test_loader_reads_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "InvoiceDate,StockCode,Quantity").unwrap();
    writeln!(file, "2023-01-01 09:15:00,20750,5").unwrap();
    writeln!(file, "2023-01-02 10:00:00,20750,-2").unwrap();
    writeln!(file, "2023-01-03 11:30:00,85123A,12").unwrap();

    let records = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].quantity, 5);
    assert_eq!(records[1].quantity, -2);
    assert_eq!(records[2].stock_code, "85123A");
}

#[test]
fn test_loader_drops_unparseable_dates() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "InvoiceDate,StockCode,Quantity").unwrap();
    writeln!(file, "2023-01-01 09:15:00,20750,5").unwrap();
    writeln!(file, "not-a-date,20750,3").unwrap();
    writeln!(file, "2023-01-02 10:00:00,20750,4").unwrap();

    let records = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].quantity, 5);
    assert_eq!(records[1].quantity, 4);
}

#[test]
fn test_loader_rejects_malformed_quantity() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "InvoiceDate,StockCode,Quantity").unwrap();
    writeln!(file, "2023-01-01 09:15:00,20750,five").unwrap();

    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataParse(_))));
}

#[test]
fn test_loader_missing_file() {
    let result = DataLoader::from_csv("/nonexistent/path.csv");
    assert!(matches!(result, Err(ForecastError::Io(_))));
}

#[test]
fn test_loader_missing_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Code,Qty").unwrap();
    writeln!(file, "2023-01-01,20750,5").unwrap();

    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataParse(_))));
}
