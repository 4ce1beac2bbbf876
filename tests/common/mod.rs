#![allow(dead_code)]

use polars::prelude::*;

use stockdata::MemorySource;

pub fn quotes(symbol: &str, dates: &[&str], open: &[f64], close: &[f64]) -> DataFrame {
    let symbols = vec![symbol; dates.len()];
    df! {
        "symbol" => symbols,
        "date" => dates,
        "open" => open,
        "close" => close,
    }
    .expect("fixture frame")
}

/// Two rows for `A`, the second with a NaN close.
pub fn quotes_a() -> DataFrame {
    quotes(
        "A",
        &["2020-01-01", "2020-01-02"],
        &[1.0, 3.0],
        &[2.0, f64::NAN],
    )
}

pub fn quotes_b() -> DataFrame {
    quotes(
        "B",
        &["2020-01-01", "2020-01-02", "2020-01-03"],
        &[10.0, 11.0, 12.0],
        &[10.5, 11.5, 12.5],
    )
}

pub fn source() -> MemorySource {
    MemorySource::new()
        .with_batch("A", quotes_a())
        .with_batch("B", quotes_b())
}

pub fn row_dates(rows: impl Iterator<Item = stockdata::Row>) -> Vec<String> {
    rows.map(|row| row.identifiers[1].clone().unwrap_or_default())
        .collect()
}
