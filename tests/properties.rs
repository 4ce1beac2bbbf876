use polars::prelude::*;
use proptest::prelude::*;

use stockdata::{Dataset, DatasetConfig, MLDataset, MemorySource, TabularDataset};

fn value() -> impl Strategy<Value = f64> {
    prop_oneof![
        6 => -1.0e6..1.0e6f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

fn rows() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((value(), value(), value()), 0..40)
}

fn frame(symbol: &str, rows: &[(f64, f64, f64)]) -> DataFrame {
    let symbols = vec![symbol; rows.len()];
    let dates: Vec<String> = (0..rows.len()).map(|idx| format!("day-{idx}")).collect();
    let open: Vec<f64> = rows.iter().map(|row| row.0).collect();
    let close: Vec<f64> = rows.iter().map(|row| row.1).collect();
    df! {
        "symbol" => symbols,
        "date" => dates,
        "open" => open,
        "close" => close,
    }
    .expect("generated frame")
}

fn target(rows: &[(f64, f64, f64)]) -> Vec<f64> {
    rows.iter().map(|row| row.2).collect()
}

fn valid(value: f64) -> bool {
    value.is_finite()
}

proptest! {
    #[test]
    fn sanitize_keeps_exactly_the_complete_rows(first in rows(), second in rows()) {
        let source = MemorySource::new()
            .with_batch("A", frame("A", &first))
            .with_batch("B", frame("B", &second));
        let mut dataset = Dataset::new(&source, DatasetConfig::for_symbols(["A", "B"])).unwrap();
        prop_assert_eq!(dataset.len(), first.len() + second.len());

        dataset.sanitize();

        let expected: Vec<String> = first
            .iter()
            .enumerate()
            .filter(|(_, row)| valid(row.0) && valid(row.1))
            .map(|(idx, _)| format!("A/day-{idx}"))
            .chain(
                second
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| valid(row.0) && valid(row.1))
                    .map(|(idx, _)| format!("B/day-{idx}")),
            )
            .collect();
        let kept: Vec<String> = dataset
            .rows()
            .map(|row| {
                format!(
                    "{}/{}",
                    row.identifiers[0].clone().unwrap_or_default(),
                    row.identifiers[1].clone().unwrap_or_default()
                )
            })
            .collect();
        prop_assert_eq!(kept, expected);

        let once = dataset.raw_data().clone();
        prop_assert_eq!(dataset.sanitize(), 0);
        prop_assert_eq!(dataset.raw_data(), &once);
    }

    #[test]
    fn ml_sanitize_keeps_rows_and_targets_aligned(first in rows(), second in rows()) {
        let source = MemorySource::new()
            .with_batch("A", frame("A", &first))
            .with_batch("B", frame("B", &second));
        let mut targets = vec![target(&first), target(&second)].into_iter();
        let mut dataset = MLDataset::new(
            &source,
            DatasetConfig::for_symbols(["A", "B"]),
            |_: &DataFrame| -> PolarsResult<Series> {
                Ok(Series::new("target", targets.next().unwrap_or_default()))
            },
        )
        .unwrap();
        prop_assert_eq!(dataset.len(), dataset.target().len());

        dataset.sanitize();

        let expected: Vec<f64> = first
            .iter()
            .chain(second.iter())
            .filter(|row| valid(row.0) && valid(row.1) && valid(row.2))
            .map(|row| row.2)
            .collect();
        prop_assert_eq!(dataset.len(), dataset.target_data().len());
        prop_assert_eq!(dataset.target_data(), expected);

        let labeled_ok = dataset
            .rows()
            .all(|row| row.features.len() == 3 && row.is_complete());
        prop_assert!(labeled_ok);

        prop_assert_eq!(dataset.sanitize(), 0);
        prop_assert_eq!(dataset.len(), dataset.target().len());
    }
}
