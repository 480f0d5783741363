use crate::chart::{ChartType, ChartTypeError};
use crate::data::{Dataset, DatasetInput};
use crate::style::{GraphStyle, StyleUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Missing `graphType` in graph spec")]
    MissingChartType,
    #[error(transparent)]
    UnknownChartType(#[from] ChartTypeError),
    #[error("Invalid dataset structure: {0}")]
    InvalidDataset(String),
    #[error("No features selected for a '{0}' chart")]
    NoFeaturesSelected(ChartType),
}

/// Stable identifier of a graph inside a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(String);

impl GraphId {
    pub fn generate() -> Self {
        GraphId(format!("graph_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        GraphId(s.to_string())
    }
}

/// Which positional feature an axis change targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisRole {
    X,
    Y,
    Z,
}

impl AxisRole {
    pub fn index(self) -> usize {
        match self {
            AxisRole::X => 0,
            AxisRole::Y => 1,
            AxisRole::Z => 2,
        }
    }
}

impl std::str::FromStr for AxisRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(AxisRole::X),
            "y" => Ok(AxisRole::Y),
            "z" => Ok(AxisRole::Z),
            other => Err(format!("Unknown axis '{}' (expected x, y or z)", other)),
        }
    }
}

/// One point of an externally fitted curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

/// Graph creation request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSpec {
    #[serde(default)]
    pub graph_name: Option<String>,
    #[serde(default)]
    pub graph_type: Option<String>,
    #[serde(default)]
    pub dataset: Option<DatasetInput>,
    #[serde(default)]
    pub selected_features: Vec<String>,
}

/// One user-created visualization of a dataset.
///
/// Mutators are crate-private: outside code changes a graph only through
/// [`crate::registry::GraphRegistry`], which also notifies observers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    id: GraphId,
    name: String,
    dataset: Dataset,
    chart_type: ChartType,
    selected_features: Vec<String>,
    more_y_axes: Vec<String>,
    showed_datapoints: Option<BTreeSet<usize>>,
    fitted_curve: Option<Vec<CurvePoint>>,
    style: GraphStyle,
    visible: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    metadata: Map<String, Value>,
}

impl Graph {
    /// Build a graph with a fresh id from a creation request.
    ///
    /// The selected features are reconciled to the chart type's required
    /// count with the same policy as a type switch.
    pub fn from_spec(spec: GraphSpec) -> Result<Graph, GraphError> {
        let type_id = spec.graph_type.ok_or(GraphError::MissingChartType)?;
        let chart_type: ChartType = type_id.parse()?;

        let dataset = spec
            .dataset
            .ok_or_else(|| GraphError::InvalidDataset("no dataset supplied".to_string()))?
            .into_dataset();
        if dataset.is_empty() {
            return Err(GraphError::InvalidDataset("dataset has no features".to_string()));
        }

        if spec.selected_features.is_empty() {
            return Err(GraphError::NoFeaturesSelected(chart_type));
        }
        let selected_features =
            reconcile_features(spec.selected_features, chart_type.required_features());

        let id = GraphId::generate();
        let now = Utc::now();
        Ok(Graph {
            name: spec.graph_name.unwrap_or_else(|| id.to_string()),
            id,
            dataset,
            chart_type,
            selected_features,
            more_y_axes: Vec::new(),
            showed_datapoints: None,
            fitted_curve: None,
            style: GraphStyle::default(),
            visible: true,
            created_at: now,
            updated_at: now,
            metadata: Map::new(),
        })
    }

    // === Read access ===

    pub fn id(&self) -> &GraphId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn selected_features(&self) -> &[String] {
        &self.selected_features
    }

    pub fn x_axis(&self) -> Option<&str> {
        self.axis(AxisRole::X)
    }

    pub fn y_axis(&self) -> Option<&str> {
        self.axis(AxisRole::Y)
    }

    pub fn z_axis(&self) -> Option<&str> {
        self.axis(AxisRole::Z)
    }

    pub fn axis(&self, role: AxisRole) -> Option<&str> {
        self.selected_features.get(role.index()).map(String::as_str)
    }

    pub fn more_y_axes(&self) -> &[String] {
        &self.more_y_axes
    }

    pub fn showed_datapoints(&self) -> Option<&BTreeSet<usize>> {
        self.showed_datapoints.as_ref()
    }

    pub fn fitted_curve(&self) -> Option<&[CurvePoint]> {
        self.fitted_curve.as_deref()
    }

    pub fn style(&self) -> &GraphStyle {
        &self.style
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    // === Mutation (registry only) ===

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub(crate) fn rebind_id(&mut self, id: GraphId) {
        self.id = id;
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub(crate) fn update_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.touch();
    }

    pub(crate) fn update_style(&mut self, update: &StyleUpdate) {
        self.style = update.apply(&self.style);
        self.touch();
    }

    pub(crate) fn replace_style(&mut self, style: GraphStyle) {
        self.style = style;
        self.touch();
    }

    pub(crate) fn change_color(&mut self, color: &str) {
        self.style = self.style.with_color(color);
        self.touch();
    }

    pub(crate) fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
        self.touch();
    }

    pub(crate) fn set_fitted_curve(&mut self, points: Vec<CurvePoint>) {
        self.fitted_curve = Some(points);
        self.touch();
    }

    pub(crate) fn clear_fitted_curve(&mut self) {
        self.fitted_curve = None;
        self.touch();
    }

    /// Shallow merge into the metadata bag
    pub(crate) fn set_metadata(&mut self, patch: Map<String, Value>) {
        self.metadata.extend(patch);
        self.touch();
    }

    pub(crate) fn set_more_y_axes(&mut self, features: Vec<String>) {
        self.more_y_axes = features;
        self.touch();
    }

    /// Restrict plotted rows to the given 1-based indices. An empty set
    /// clears the filter.
    pub(crate) fn set_showed_datapoints<I: IntoIterator<Item = usize>>(&mut self, rows: I) {
        let rows: BTreeSet<usize> = rows.into_iter().collect();
        self.showed_datapoints = if rows.is_empty() { None } else { Some(rows) };
        self.touch();
    }

    pub(crate) fn set_x_axis(&mut self, feature: impl Into<String>) {
        self.set_axis(AxisRole::X, feature);
    }

    pub(crate) fn set_y_axis(&mut self, feature: impl Into<String>) {
        self.set_axis(AxisRole::Y, feature);
    }

    pub(crate) fn set_z_axis(&mut self, feature: impl Into<String>) {
        self.set_axis(AxisRole::Z, feature);
    }

    /// Write a feature at the axis position, growing the list if needed.
    /// Membership in the dataset is checked at compile time, not here.
    pub(crate) fn set_axis(&mut self, role: AxisRole, feature: impl Into<String>) {
        let feature = feature.into();
        let idx = role.index();
        if idx >= self.selected_features.len() {
            let filler = self
                .selected_features
                .first()
                .cloned()
                .unwrap_or_else(|| feature.clone());
            self.selected_features.resize(idx + 1, filler);
        }
        self.selected_features[idx] = feature;
        self.touch();
    }

    /// Switch chart type and reconcile the feature list to the new
    /// required count.
    pub(crate) fn set_type(&mut self, chart_type: ChartType) {
        let features = std::mem::take(&mut self.selected_features);
        self.selected_features = reconcile_features(features, chart_type.required_features());
        self.chart_type = chart_type;
        self.touch();
    }
}

/// Pad by repeating the first feature, or truncate, to reach `required`.
fn reconcile_features(mut features: Vec<String>, required: usize) -> Vec<String> {
    if features.len() > required {
        features.truncate(required);
    } else if let Some(first) = features.first().cloned() {
        features.resize(required, first);
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_graph(chart: &str, features: &[&str]) -> Graph {
        let dataset: Dataset = serde_json::from_value(json!({
            "A": [1, 2, 3], "B": [4, 5, 6], "C": [7, 8, 9]
        }))
        .unwrap();
        Graph::from_spec(GraphSpec {
            graph_name: Some("test".to_string()),
            graph_type: Some(chart.to_string()),
            dataset: Some(dataset.into()),
            selected_features: features.iter().map(|s| s.to_string()).collect(),
        })
        .unwrap()
    }

    #[test]
    fn test_from_spec_defaults() {
        let g = make_graph("bar", &["A", "B"]);
        assert_eq!(g.chart_type(), ChartType::Bar);
        assert_eq!(g.name(), "test");
        assert!(g.is_visible());
        assert!(g.id().as_str().starts_with("graph_"));
        assert_eq!(g.created_at(), g.updated_at());
        assert_eq!(g.style(), &GraphStyle::default());
    }

    #[test]
    fn test_from_spec_name_defaults_to_id() {
        let g = Graph::from_spec(GraphSpec {
            graph_type: Some("pie".to_string()),
            dataset: Some(serde_json::from_value(json!({"A": [1]})).unwrap()),
            selected_features: vec!["A".to_string()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(g.name(), g.id().as_str());
    }

    #[test]
    fn test_from_spec_reconciles_feature_count() {
        let g = make_graph("heatmap", &["A"]);
        assert_eq!(g.selected_features(), &["A", "A", "A"]);
        let g = make_graph("pie", &["A", "B"]);
        assert_eq!(g.selected_features(), &["A"]);
    }

    #[test]
    fn test_from_spec_errors() {
        let missing_type = Graph::from_spec(GraphSpec::default());
        assert!(matches!(missing_type, Err(GraphError::MissingChartType)));

        let unknown = Graph::from_spec(GraphSpec {
            graph_type: Some("sunburst".to_string()),
            ..Default::default()
        });
        assert!(matches!(unknown, Err(GraphError::UnknownChartType(_))));

        let no_data = Graph::from_spec(GraphSpec {
            graph_type: Some("bar".to_string()),
            selected_features: vec!["A".to_string()],
            ..Default::default()
        });
        assert!(matches!(no_data, Err(GraphError::InvalidDataset(_))));

        let no_features = Graph::from_spec(GraphSpec {
            graph_type: Some("bar".to_string()),
            dataset: Some(serde_json::from_value(json!({"A": [1]})).unwrap()),
            ..Default::default()
        });
        assert!(matches!(no_features, Err(GraphError::NoFeaturesSelected(ChartType::Bar))));
    }

    #[test]
    fn test_set_type_pads_with_first_feature() {
        let mut g = make_graph("scatter", &["A", "B"]);
        g.set_type(ChartType::Heatmap);
        assert_eq!(g.selected_features(), &["A", "B", "A"]);
        assert_eq!(g.chart_type(), ChartType::Heatmap);
    }

    #[test]
    fn test_set_type_truncates() {
        let mut g = make_graph("scatter3d", &["A", "B", "C"]);
        g.set_type(ChartType::Pie);
        assert_eq!(g.selected_features(), &["A"]);
    }

    #[test]
    fn test_set_type_equal_count_unchanged() {
        let mut g = make_graph("scatter", &["B", "A"]);
        g.set_type(ChartType::Line);
        assert_eq!(g.selected_features(), &["B", "A"]);
    }

    #[test]
    fn test_feature_count_invariant_across_switches() {
        let mut g = make_graph("bar", &["A", "B"]);
        for t in ChartType::ALL {
            g.set_type(t);
            assert_eq!(g.selected_features().len(), t.required_features());
        }
    }

    #[test]
    fn test_axis_setters() {
        let mut g = make_graph("scatter", &["A", "B"]);
        g.set_y_axis("C");
        assert_eq!(g.y_axis(), Some("C"));
        g.set_x_axis("B");
        assert_eq!(g.x_axis(), Some("B"));
        assert_eq!(g.z_axis(), None);

        // beyond current length extends the list
        g.set_z_axis("A");
        assert_eq!(g.selected_features(), &["B", "C", "A"]);
    }

    #[test]
    fn test_axis_setter_extends_with_first_feature() {
        let mut g = make_graph("pie", &["B"]);
        g.set_z_axis("C");
        assert_eq!(g.selected_features(), &["B", "B", "C"]);
    }

    #[test]
    fn test_axis_setter_accepts_unknown_feature() {
        let mut g = make_graph("bar", &["A", "B"]);
        g.set_axis(AxisRole::Y, "missing");
        assert_eq!(g.y_axis(), Some("missing"));
    }

    #[test]
    fn test_mutations_bump_updated_at() {
        let mut g = make_graph("bar", &["A", "B"]);
        let before = g.updated_at();
        g.change_color("red");
        assert!(g.updated_at() >= before);
        assert_eq!(g.style().color_scheme, "red");
        assert_eq!(g.style().marker_style.color, "red");
    }

    #[test]
    fn test_toggle_visibility() {
        let mut g = make_graph("bar", &["A", "B"]);
        g.toggle_visibility();
        assert!(!g.is_visible());
        g.toggle_visibility();
        assert!(g.is_visible());
    }

    #[test]
    fn test_metadata_merges() {
        let mut g = make_graph("bar", &["A", "B"]);
        g.set_metadata(json!({"note": "first", "keep": 1}).as_object().unwrap().clone());
        g.set_metadata(json!({"note": "second"}).as_object().unwrap().clone());
        assert_eq!(g.metadata()["note"], json!("second"));
        assert_eq!(g.metadata()["keep"], json!(1));
    }

    #[test]
    fn test_showed_datapoints_empty_clears() {
        let mut g = make_graph("bar", &["A", "B"]);
        g.set_showed_datapoints([2, 1, 2]);
        assert_eq!(g.showed_datapoints().unwrap().len(), 2);
        g.set_showed_datapoints(Vec::new());
        assert!(g.showed_datapoints().is_none());
    }

    #[test]
    fn test_fitted_curve_set_and_clear() {
        let mut g = make_graph("scatter", &["A", "B"]);
        g.set_fitted_curve(vec![CurvePoint { x: 0.0, y: 1.0 }]);
        assert_eq!(g.fitted_curve().unwrap().len(), 1);
        g.clear_fitted_curve();
        assert!(g.fitted_curve().is_none());
    }

    #[test]
    fn test_axis_role_parse() {
        assert_eq!("X".parse::<AxisRole>(), Ok(AxisRole::X));
        assert!("w".parse::<AxisRole>().is_err());
    }

    #[test]
    fn test_reconcile_empty_stays_empty() {
        assert!(reconcile_features(Vec::new(), 3).is_empty());
    }
}
