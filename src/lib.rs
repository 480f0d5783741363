// Library exports for vizgraph

pub mod chart;
pub mod color;
pub mod compiler;
pub mod data;
pub mod graph;
pub mod ir;
pub mod palette;
pub mod registry;
pub mod style;
pub mod transform;

pub use chart::{required_feature_count, ChartType};
pub use compiler::{CompileError, VisualizationCompiler};
pub use data::{Dataset, DatasetInput};
pub use graph::{AxisRole, CurvePoint, Graph, GraphId, GraphSpec};
pub use ir::PlotSpecification;
pub use registry::{GraphEvent, GraphRegistry, GraphStore, SubscriptionId};
pub use style::{GraphStyle, StyleUpdate};

use ir::Margin;
use serde::Deserialize;

/// Plot-wide settings the compiler applies to every graph.
/// Every field may be omitted in a JSON options file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompileOptions {
    #[serde(default = "default_grid_color")]
    pub grid_color: String,
    #[serde(default = "default_zeroline_color")]
    pub zeroline_color: String,
    #[serde(default = "default_paper_bgcolor")]
    pub paper_bgcolor: String,
    #[serde(default = "default_margin")]
    pub margin: Margin,
    #[serde(default = "default_fitted_curve_color")]
    pub fitted_curve_color: String,
    #[serde(default = "default_fitted_curve_width")]
    pub fitted_curve_width: f64,
    #[serde(default = "default_colorscale")]
    pub heatmap_colorscale: String,
    #[serde(default = "default_pie_hole")]
    pub pie_hole: f64,
    #[serde(default = "default_pie_colors")]
    pub pie_colors: Vec<String>,
}

fn default_grid_color() -> String { "#DDDDDD".to_string() }
fn default_zeroline_color() -> String { "#BBBBBB".to_string() }
fn default_paper_bgcolor() -> String { "white".to_string() }
fn default_margin() -> Margin { Margin { l: 50, r: 50, t: 50, b: 50 } }
fn default_fitted_curve_color() -> String { "red".to_string() }
fn default_fitted_curve_width() -> f64 { 2.0 }
fn default_colorscale() -> String { "Viridis".to_string() }
fn default_pie_hole() -> f64 { 0.3 }
fn default_pie_colors() -> Vec<String> {
    palette::PIE_COLORS.iter().map(|c| c.to_string()).collect()
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            grid_color: default_grid_color(),
            zeroline_color: default_zeroline_color(),
            paper_bgcolor: default_paper_bgcolor(),
            margin: default_margin(),
            fitted_curve_color: default_fitted_curve_color(),
            fitted_curve_width: default_fitted_curve_width(),
            heatmap_colorscale: default_colorscale(),
            pie_hole: default_pie_hole(),
            pie_colors: default_pie_colors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_from_empty_json() {
        let opts: CompileOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, CompileOptions::default());
    }

    #[test]
    fn test_options_partial_override() {
        let opts: CompileOptions =
            serde_json::from_str(r#"{"fitted_curve_color": "black", "margin": {"l": 10, "r": 10, "t": 0, "b": 0}}"#)
                .unwrap();
        assert_eq!(opts.fitted_curve_color, "black");
        assert_eq!(opts.margin.t, 0);
        assert_eq!(opts.grid_color, "#DDDDDD");
    }
}
