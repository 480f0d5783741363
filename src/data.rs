use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Feature '{feature}' has {found} values, expected {expected}")]
    RaggedColumns {
        feature: String,
        expected: usize,
        found: usize,
    },
    #[error("Feature '{0}' is not an array of values")]
    NotAnArray(String),
    #[error("Input data must be a JSON object of features or an array of records")]
    UnsupportedShape,
    #[error("Record {0} is not an object")]
    RecordNotObject(usize),
    #[error("`features` must be an array of feature names")]
    InvalidFeatureList,
    #[error("Failed to read CSV input")]
    Csv(#[from] csv::Error),
}

/// Column-oriented dataset: feature name -> ordered values.
///
/// Every column has the same length. Feature order follows the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    columns: IndexMap<String, Vec<Value>>,
}

impl Dataset {
    /// Build from already split columns, checking that lengths agree
    pub fn from_columns(columns: IndexMap<String, Vec<Value>>) -> Result<Self, DatasetError> {
        let mut expected = None;
        for (feature, values) in &columns {
            match expected {
                None => expected = Some(values.len()),
                Some(n) if n != values.len() => {
                    return Err(DatasetError::RaggedColumns {
                        feature: feature.clone(),
                        expected: n,
                        found: values.len(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(Self { columns })
    }

    /// Transpose row records into columns. Only the listed features are kept;
    /// a record missing a feature contributes `null` for it.
    pub fn from_records(records: &[Map<String, Value>], features: &[String]) -> Self {
        let columns = features
            .iter()
            .map(|feature| {
                let values = records
                    .iter()
                    .map(|record| record.get(feature).cloned().unwrap_or(Value::Null))
                    .collect();
                (feature.clone(), values)
            })
            .collect();
        Self { columns }
    }

    /// Accept either a feature map (`{"a": [..], "b": [..]}`) or an array of
    /// record objects, whose keys are taken from the first record.
    pub fn from_json(value: &Value) -> Result<Self, DatasetError> {
        match value {
            Value::Object(map) => {
                let mut columns = IndexMap::with_capacity(map.len());
                for (feature, col) in map {
                    let values = col
                        .as_array()
                        .ok_or_else(|| DatasetError::NotAnArray(feature.clone()))?;
                    columns.insert(feature.clone(), values.clone());
                }
                Self::from_columns(columns)
            }
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let obj = item.as_object().ok_or(DatasetError::RecordNotObject(idx))?;
                    records.push(obj.clone());
                }
                let features: Vec<String> = records
                    .first()
                    .map(|first| first.keys().cloned().collect())
                    .unwrap_or_default();
                Ok(Self::from_records(&records, &features))
            }
            _ => Err(DatasetError::UnsupportedShape),
        }
    }

    /// Read CSV with a header row. Cells that parse as numbers become numbers,
    /// empty cells become `null`, everything else stays a string.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut columns: IndexMap<String, Vec<Value>> =
            headers.iter().map(|h| (h.clone(), Vec::new())).collect();

        for result in rdr.records() {
            let record = result?;
            for (header, cell) in headers.iter().zip(record.iter()) {
                if let Some(col) = columns.get_mut(header) {
                    col.push(parse_cell(cell));
                }
            }
        }

        Self::from_columns(columns)
    }

    pub fn feature(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let columns = IndexMap::<String, Vec<Value>>::deserialize(deserializer)?;
        Dataset::from_columns(columns).map_err(serde::de::Error::custom)
    }
}

/// Dataset as handed over by a graph creation request: either a feature map
/// or `{records, features}` row records to be transposed.
///
/// An object whose keys are exactly `records` and `features` is always read
/// as row records; if those do not have the right shape the input is
/// rejected rather than taken as two columns.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetInput {
    Records {
        records: Vec<Map<String, Value>>,
        features: Vec<String>,
    },
    FeatureMap(Dataset),
}

impl DatasetInput {
    pub fn from_json(value: Value) -> Result<Self, DatasetError> {
        match value {
            Value::Object(mut map) if is_records_shape(&map) => {
                let records = match map.remove("records") {
                    Some(Value::Array(items)) => items
                        .into_iter()
                        .enumerate()
                        .map(|(idx, item)| match item {
                            Value::Object(record) => Ok(record),
                            _ => Err(DatasetError::RecordNotObject(idx)),
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    _ => return Err(DatasetError::NotAnArray("records".to_string())),
                };
                let features = match map.remove("features") {
                    Some(Value::Array(names)) => names
                        .into_iter()
                        .map(|name| match name {
                            Value::String(name) => Ok(name),
                            _ => Err(DatasetError::InvalidFeatureList),
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    _ => return Err(DatasetError::InvalidFeatureList),
                };
                Ok(DatasetInput::Records { records, features })
            }
            other => Dataset::from_json(&other).map(DatasetInput::FeatureMap),
        }
    }

    pub fn into_dataset(self) -> Dataset {
        match self {
            DatasetInput::Records { records, features } => {
                Dataset::from_records(&records, &features)
            }
            DatasetInput::FeatureMap(dataset) => dataset,
        }
    }
}

fn is_records_shape(map: &Map<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("records") && map.contains_key("features")
}

impl<'de> Deserialize<'de> for DatasetInput {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DatasetInput::from_json(value).map_err(serde::de::Error::custom)
    }
}

impl From<Dataset> for DatasetInput {
    fn from(dataset: Dataset) -> Self {
        DatasetInput::FeatureMap(dataset)
    }
}

fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_feature_map() {
        let ds = Dataset::from_json(&json!({"A": [1, 2, 3], "B": ["x", "y", "z"]})).unwrap();
        assert_eq!(ds.feature_count(), 2);
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.feature("B").unwrap()[1], json!("y"));
        assert_eq!(ds.features().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_from_json_ragged_rejected() {
        let err = Dataset::from_json(&json!({"A": [1, 2, 3], "B": [1]})).unwrap_err();
        assert!(matches!(err, DatasetError::RaggedColumns { found: 1, .. }));
    }

    #[test]
    fn test_from_json_non_array_rejected() {
        let err = Dataset::from_json(&json!({"A": 5})).unwrap_err();
        assert!(matches!(err, DatasetError::NotAnArray(ref f) if f == "A"));
    }

    #[test]
    fn test_from_json_records() {
        let ds = Dataset::from_json(&json!([
            {"height": 170, "weight": 65},
            {"height": 180, "weight": 80}
        ]))
        .unwrap();
        assert_eq!(ds.feature("weight").unwrap(), &[json!(65), json!(80)]);
    }

    #[test]
    fn test_from_records_transpose() {
        let records: Vec<Map<String, Value>> = vec![
            json!({"a": 1, "b": 2}).as_object().unwrap().clone(),
            json!({"a": 3}).as_object().unwrap().clone(),
        ];
        let ds = Dataset::from_records(&records, &["a".to_string(), "b".to_string()]);
        assert_eq!(ds.feature("a").unwrap(), &[json!(1), json!(3)]);
        assert_eq!(ds.feature("b").unwrap(), &[json!(2), Value::Null]);
    }

    #[test]
    fn test_from_csv() {
        let csv = "x, label, y\n1, a, 2.5\n2, b,\n";
        let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.feature("x").unwrap(), &[json!(1), json!(2)]);
        assert_eq!(ds.feature("label").unwrap(), &[json!("a"), json!("b")]);
        assert_eq!(ds.feature("y").unwrap(), &[json!(2.5), Value::Null]);
    }

    #[test]
    fn test_dataset_input_shapes() {
        let input: DatasetInput = serde_json::from_value(json!({
            "records": [{"A": 1, "B": 4}, {"A": 2, "B": 5}],
            "features": ["A", "B"]
        }))
        .unwrap();
        let ds = input.into_dataset();
        assert_eq!(ds.feature("B").unwrap(), &[json!(4), json!(5)]);

        let input: DatasetInput = serde_json::from_value(json!({"A": [1], "B": [2]})).unwrap();
        assert_eq!(input.into_dataset().feature_count(), 2);
    }

    #[test]
    fn test_malformed_records_rejected() {
        let bad_records: Result<DatasetInput, _> =
            serde_json::from_value(json!({"records": [1, 2], "features": ["a", "b"]}));
        assert!(bad_records.is_err());

        let err = DatasetInput::from_json(json!({"records": [{"a": 1}, 2], "features": ["a"]}))
            .unwrap_err();
        assert!(matches!(err, DatasetError::RecordNotObject(1)));

        let err = DatasetInput::from_json(json!({"records": [{"a": 1}], "features": [1]}))
            .unwrap_err();
        assert!(matches!(err, DatasetError::InvalidFeatureList));

        let err = DatasetInput::from_json(json!({"records": {}, "features": []})).unwrap_err();
        assert!(matches!(err, DatasetError::NotAnArray(ref f) if f == "records"));
    }

    #[test]
    fn test_records_key_among_other_features_is_a_column() {
        let input = DatasetInput::from_json(json!({
            "records": [1, 2],
            "features": [3, 4],
            "extra": [5, 6]
        }))
        .unwrap();
        assert_eq!(input.into_dataset().feature_count(), 3);
    }

    #[test]
    fn test_dataset_deserialize_validates() {
        let res: Result<Dataset, _> = serde_json::from_value(json!({"A": [1, 2], "B": [1]}));
        assert!(res.is_err());
    }
}
