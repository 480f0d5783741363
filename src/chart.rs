// Chart type table: identifiers, display names and feature requirements

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartTypeError {
    #[error("Unknown chart type '{0}'")]
    Unknown(String),
}

/// Menu grouping for chart types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartCategory {
    #[serde(rename = "Basic Charts")]
    Basic,
    #[serde(rename = "Advanced Charts")]
    Advanced,
}

impl fmt::Display for ChartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartCategory::Basic => write!(f, "Basic Charts"),
            ChartCategory::Advanced => write!(f, "Advanced Charts"),
        }
    }
}

/// Every chart type the compiler knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Scatter,
    Line,
    Bar,
    Pie,
    Heatmap,
    #[serde(rename = "scatterpolar")]
    ScatterPolar,
    Dot,
    Area,
    #[serde(rename = "scatter3d")]
    Scatter3d,
}

/// Static description of one chart type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartTypeDescriptor {
    pub type_id: &'static str,
    pub display_name: &'static str,
    pub category: ChartCategory,
    pub required_feature_count: usize,
}

const fn entry(
    type_id: &'static str,
    display_name: &'static str,
    category: ChartCategory,
    required_feature_count: usize,
) -> ChartTypeDescriptor {
    ChartTypeDescriptor { type_id, display_name, category, required_feature_count }
}

// Table order is menu order.
static DESCRIPTORS: [ChartTypeDescriptor; 9] = [
    entry("scatter", "Scatter Plot", ChartCategory::Basic, 2),
    entry("line", "Line Chart", ChartCategory::Basic, 2),
    entry("bar", "Bar Chart", ChartCategory::Basic, 2),
    entry("pie", "Pie Chart", ChartCategory::Basic, 1),
    entry("heatmap", "Heatmap", ChartCategory::Advanced, 3),
    entry("scatterpolar", "Radar Chart", ChartCategory::Advanced, 3),
    entry("dot", "Dot Chart", ChartCategory::Advanced, 2),
    entry("area", "Area Chart", ChartCategory::Advanced, 2),
    entry("scatter3d", "3D Scatter Plot", ChartCategory::Advanced, 3),
];

impl ChartType {
    pub const ALL: [ChartType; 9] = [
        ChartType::Scatter,
        ChartType::Line,
        ChartType::Bar,
        ChartType::Pie,
        ChartType::Heatmap,
        ChartType::ScatterPolar,
        ChartType::Dot,
        ChartType::Area,
        ChartType::Scatter3d,
    ];

    pub fn descriptor(self) -> &'static ChartTypeDescriptor {
        let idx = match self {
            ChartType::Scatter => 0,
            ChartType::Line => 1,
            ChartType::Bar => 2,
            ChartType::Pie => 3,
            ChartType::Heatmap => 4,
            ChartType::ScatterPolar => 5,
            ChartType::Dot => 6,
            ChartType::Area => 7,
            ChartType::Scatter3d => 8,
        };
        &DESCRIPTORS[idx]
    }

    pub fn id(self) -> &'static str {
        self.descriptor().type_id
    }

    pub fn display_name(self) -> &'static str {
        self.descriptor().display_name
    }

    pub fn required_features(self) -> usize {
        self.descriptor().required_feature_count
    }

    /// Whether extra Y features can be drawn as additional series
    pub fn supports_multi_series(self) -> bool {
        matches!(
            self,
            ChartType::Scatter | ChartType::Line | ChartType::Bar | ChartType::Area
        )
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ChartType {
    type Err = ChartTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ChartType::ALL
            .into_iter()
            .find(|t| t.id() == needle)
            .ok_or_else(|| ChartTypeError::Unknown(s.to_string()))
    }
}

/// Number of features a chart type needs. Returns 0 for an unknown id;
/// callers must treat 0 as "unknown type", never as a requirement.
pub fn required_feature_count(type_id: &str) -> usize {
    type_id
        .parse::<ChartType>()
        .map(ChartType::required_features)
        .unwrap_or(0)
}

/// Descriptors grouped by category, both in table order
pub fn chart_categories() -> Vec<(ChartCategory, Vec<&'static ChartTypeDescriptor>)> {
    let mut groups: Vec<(ChartCategory, Vec<&'static ChartTypeDescriptor>)> = Vec::new();
    for desc in DESCRIPTORS.iter() {
        match groups.iter_mut().find(|(cat, _)| *cat == desc.category) {
            Some((_, members)) => members.push(desc),
            None => groups.push((desc.category, vec![desc])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_feature_count_known() {
        assert_eq!(required_feature_count("scatter"), 2);
        assert_eq!(required_feature_count("pie"), 1);
        assert_eq!(required_feature_count("heatmap"), 3);
        assert_eq!(required_feature_count("scatter3d"), 3);
    }

    #[test]
    fn test_required_feature_count_unknown_is_zero() {
        assert_eq!(required_feature_count("treemap"), 0);
        assert_eq!(required_feature_count(""), 0);
    }

    #[test]
    fn test_descriptor_matches_variant() {
        for t in ChartType::ALL {
            assert_eq!(t.id().parse::<ChartType>().unwrap(), t);
            assert!(t.required_features() >= 1);
        }
    }

    #[test]
    fn test_type_ids_unique() {
        let mut ids: Vec<&str> = DESCRIPTORS.iter().map(|d| d.type_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DESCRIPTORS.len());
    }

    #[test]
    fn test_parse_unknown() {
        let err = "donut".parse::<ChartType>().unwrap_err();
        assert_eq!(err, ChartTypeError::Unknown("donut".to_string()));
    }

    #[test]
    fn test_multi_series_support() {
        assert!(ChartType::Bar.supports_multi_series());
        assert!(ChartType::Area.supports_multi_series());
        assert!(!ChartType::Pie.supports_multi_series());
        assert!(!ChartType::Heatmap.supports_multi_series());
    }

    #[test]
    fn test_categories_grouping() {
        let groups = chart_categories();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, ChartCategory::Basic);
        assert_eq!(groups[0].1.len(), 4);
        assert_eq!(groups[1].1[0].type_id, "heatmap");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ChartType::ScatterPolar).unwrap();
        assert_eq!(json, "\"scatterpolar\"");
        let t: ChartType = serde_json::from_str("\"scatter3d\"").unwrap();
        assert_eq!(t, ChartType::Scatter3d);
    }
}
