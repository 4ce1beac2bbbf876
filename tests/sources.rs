use std::io::Write;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use stockdata::{
    CsvDirSource, Dataset, DatasetConfig, DatasetError, RowSource, SourceError, TabularDataset,
};

fn write_quotes(dir: &TempDir, symbol: &str, body: &str) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(dir.path().join(format!("{symbol}.csv")))?;
    writeln!(file, "symbol,date,open,close\n{body}")?;
    Ok(())
}

#[test]
fn csv_directory_source_reads_one_file_per_symbol() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_quotes(
        &dir,
        "AAPL",
        "AAPL,2024-01-02,185.5,186.0\nAAPL,2024-01-03,184.2,184.9",
    )?;

    let source = CsvDirSource::new(dir.path());
    let frame = source.fetch("AAPL")?;

    assert_eq!(frame.shape(), (2, 4));
    assert_eq!(
        frame.get_column_names(),
        vec!["symbol", "date", "open", "close"]
    );
    Ok(())
}

#[test]
fn csv_directory_source_reports_missing_symbols() {
    let dir = TempDir::new().expect("temp dir");
    let source = CsvDirSource::new(dir.path());

    assert!(matches!(
        source.fetch("MSFT"),
        Err(SourceError::NotFound { ref symbol }) if symbol == "MSFT"
    ));
}

#[test]
fn unreadable_values_are_dropped_by_sanitize() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_quotes(
        &dir,
        "AAPL",
        "AAPL,2024-01-02,185.5,186.0\nAAPL,2024-01-03,n/a,184.9",
    )?;
    write_quotes(&dir, "MSFT", "MSFT,2024-01-02,370.0,371.5")?;

    let source = CsvDirSource::new(dir.path());
    let mut dataset = Dataset::new(&source, DatasetConfig::for_symbols(["AAPL", "MSFT"]))?;
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.raw_data().row(1).map(|row| row.features[0]), Some(None));

    assert_eq!(dataset.sanitize(), 1);
    let closes: Vec<f64> = dataset
        .rows()
        .filter_map(|row| row.features[1])
        .collect();
    assert_eq!(closes.len(), 2);
    assert_abs_diff_eq!(closes[0], 186.0);
    assert_abs_diff_eq!(closes[1], 371.5);
    Ok(())
}

#[test]
fn csv_files_with_different_layouts_are_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_quotes(&dir, "AAPL", "AAPL,2024-01-02,185.5,186.0")?;
    let mut file = std::fs::File::create(dir.path().join("MSFT.csv"))?;
    writeln!(file, "symbol,date,close\nMSFT,2024-01-02,371.5")?;

    let source = CsvDirSource::new(dir.path());
    let err = Dataset::new(&source, DatasetConfig::for_symbols(["AAPL", "MSFT"])).unwrap_err();
    assert!(matches!(err, DatasetError::SchemaMismatch { ref symbol, .. } if symbol == "MSFT"));
    Ok(())
}
