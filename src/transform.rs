use crate::compiler::CompileError;
use crate::data::Dataset;
use serde_json::Value;
use std::collections::BTreeSet;

/// Positional feature data after lookup and row filtering.
/// Index 0 is the X/primary feature, 1 the Y/secondary, 2 the Z/tertiary.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureData {
    columns: Vec<Vec<Value>>,
}

impl FeatureData {
    /// Column at `idx`, or an empty slice if the chart asked for more
    /// positions than were selected
    pub fn column(&self, idx: usize) -> &[Value] {
        self.columns.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Look up every selected feature and apply the row filter.
///
/// A missing feature is treated as an empty column, and any empty column
/// fails the whole extraction: one unusable feature makes the plot
/// meaningless.
pub fn extract_features(
    dataset: &Dataset,
    selected: &[String],
    rows: Option<&BTreeSet<usize>>,
) -> Result<FeatureData, CompileError> {
    let mut columns = Vec::with_capacity(selected.len());
    for name in selected {
        let values = dataset.feature(name).unwrap_or(&[]);
        if values.is_empty() {
            return Err(CompileError::EmptyFeature(name.clone()));
        }
        columns.push(filter_rows(values, rows));
    }
    Ok(FeatureData { columns })
}

/// Keep only the values whose 1-based position is in `rows`; `None` keeps all.
pub fn filter_rows(values: &[Value], rows: Option<&BTreeSet<usize>>) -> Vec<Value> {
    match rows {
        Some(rows) => values
            .iter()
            .enumerate()
            .filter(|(idx, _)| rows.contains(&(idx + 1)))
            .map(|(_, v)| v.clone())
            .collect(),
        None => values.to_vec(),
    }
}

/// Distinct values in first-seen order with their occurrence counts
pub fn count_categories(values: &[Value]) -> (Vec<Value>, Vec<Value>) {
    let mut labels: Vec<Value> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();
    for v in values {
        match labels.iter().position(|l| l == v) {
            Some(pos) => counts[pos] += 1,
            None => {
                labels.push(v.clone());
                counts.push(1);
            }
        }
    }
    (labels, counts.into_iter().map(Value::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_data() -> Dataset {
        serde_json::from_value(json!({
            "A": [1, 2, 3, 4, 5],
            "B": [10, 20, 30, 40, 50]
        }))
        .unwrap()
    }

    fn rows(idx: &[usize]) -> BTreeSet<usize> {
        idx.iter().copied().collect()
    }

    #[test]
    fn test_extract_positional() {
        let ds: Dataset = serde_json::from_value(json!({"A": [1, 2], "B": [3, 4]})).unwrap();
        let data = extract_features(&ds, &["B".to_string(), "A".to_string()], None).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.column(0), &[json!(3), json!(4)]);
        assert_eq!(data.column(1), &[json!(1), json!(2)]);
        assert!(data.column(2).is_empty());
    }

    #[test]
    fn test_extract_missing_feature_fails() {
        let ds: Dataset = serde_json::from_value(json!({"A": [1, 2]})).unwrap();
        let err = extract_features(&ds, &["A".to_string(), "Q".to_string()], None).unwrap_err();
        assert!(matches!(err, CompileError::EmptyFeature(ref f) if f == "Q"));
    }

    #[test]
    fn test_extract_empty_feature_fails() {
        let ds: Dataset = serde_json::from_value(json!({"A": [], "B": []})).unwrap();
        assert!(extract_features(&ds, &["A".to_string()], None).is_err());
    }

    #[test]
    fn test_filter_rows_one_based() {
        let ds = make_data();
        let values = ds.feature("B").unwrap_or(&[]);
        let filtered = filter_rows(values, Some(&rows(&[1, 3, 9])));
        assert_eq!(filtered, vec![json!(10), json!(30)]);
    }

    #[test]
    fn test_filter_rows_idempotent() {
        let values: Vec<Value> = (1..=6).map(Value::from).collect();
        let keep = rows(&[1, 2, 3]);
        let once = filter_rows(&values, Some(&keep));
        let twice = filter_rows(&once, Some(&keep));
        assert_eq!(once, twice);
        assert_eq!(once, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_filter_rows_none_keeps_all() {
        let values = vec![json!("a"), json!("b")];
        assert_eq!(filter_rows(&values, None), values);
    }

    #[test]
    fn test_extract_applies_filter_to_all_columns() {
        let ds: Dataset = serde_json::from_value(json!({"A": [1, 2, 3], "B": [4, 5, 6]})).unwrap();
        let keep = rows(&[2]);
        let data = extract_features(&ds, &["A".to_string(), "B".to_string()], Some(&keep)).unwrap();
        assert_eq!(data.column(0), &[json!(2)]);
        assert_eq!(data.column(1), &[json!(5)]);
    }

    #[test]
    fn test_count_categories() {
        let values = vec![json!("a"), json!("b"), json!("a"), json!(1)];
        let (labels, counts) = count_categories(&values);
        assert_eq!(labels, vec![json!("a"), json!("b"), json!(1)]);
        assert_eq!(counts, vec![json!(2), json!(1), json!(1)]);
    }
}
