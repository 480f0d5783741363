// Renderer-neutral plot description produced by the compiler.
//
// Field names follow the trace/layout schema the chart widget consumes, so a
// serialized PlotSpecification can be handed over unchanged.

use serde::Serialize;
use serde_json::Value;

// =============================================================================
// Traces
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
    Pie,
    Heatmap,
    #[serde(rename = "scatterpolar")]
    ScatterPolar,
    #[serde(rename = "scatter3d")]
    Scatter3d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceMode {
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    ToZeroY,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: String,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

/// One renderable data series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TraceMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Trace {
    /// Empty trace of the given kind; builders fill in what they need
    pub fn new(kind: TraceKind) -> Self {
        Trace {
            kind,
            mode: None,
            x: None,
            y: None,
            z: None,
            r: None,
            theta: None,
            labels: None,
            values: None,
            marker: None,
            line: None,
            fill: None,
            colorscale: None,
            hole: None,
            name: None,
        }
    }
}

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub gridcolor: String,
    pub zerolinecolor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, serde::Deserialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zaxis: Option<Axis>,
    pub width: u32,
    pub height: u32,
    pub plot_bgcolor: String,
    pub paper_bgcolor: String,
    pub margin: Margin,
    pub showlegend: bool,
}

/// Compiled output for one graph: traces in draw order plus layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSpecification {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl PlotSpecification {
    pub fn traces(&self) -> &[Trace] {
        &self.data
    }
}
