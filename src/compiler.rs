use crate::chart::ChartType;
use crate::graph::{CurvePoint, Graph};
use crate::ir::{Axis, Fill, Layout, Line, Marker, PlotSpecification, Trace, TraceKind, TraceMode};
use crate::palette::{series_color, DEFAULT_COLOR};
use crate::style::GraphStyle;
use crate::transform::{self, FeatureData};
use crate::CompileOptions;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Dataset has no features")]
    EmptyDataset,
    #[error("Graph has no selected features")]
    NoFeatures,
    #[error("Selected feature '{0}' is missing or has no values")]
    EmptyFeature(String),
}

/// Turns a graph and its dataset into a plot specification.
///
/// The compiler holds no per-graph state; every call builds a fresh
/// specification from the graph as it is now.
#[derive(Debug, Clone, Default)]
pub struct VisualizationCompiler {
    options: CompileOptions,
}

impl VisualizationCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a graph, returning `None` (and logging why) when there is
    /// nothing sensible to render.
    pub fn visualize(&self, graph: &Graph) -> Option<PlotSpecification> {
        match self.try_visualize(graph) {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!(
                    graph_id = %graph.id(),
                    chart_type = %graph.chart_type(),
                    "Cannot visualize graph: {}",
                    e
                );
                None
            }
        }
    }

    pub fn try_visualize(&self, graph: &Graph) -> Result<PlotSpecification, CompileError> {
        if graph.dataset().is_empty() {
            return Err(CompileError::EmptyDataset);
        }
        if graph.selected_features().is_empty() {
            return Err(CompileError::NoFeatures);
        }

        // 1. Extract + filter (all-or-nothing)
        let features = transform::extract_features(
            graph.dataset(),
            graph.selected_features(),
            graph.showed_datapoints(),
        )?;

        // 2. Primary trace
        let mut data = vec![self.build_primary(graph, &features)];

        // 3. Fitted curve overlay (best effort)
        if let Some(fitted) = self.build_fitted_curve(graph.fitted_curve()) {
            data.push(fitted);
        }

        // 4. Extra Y series (best effort)
        data.extend(self.build_extra_series(graph, &features));

        let layout = self.build_layout(graph, data.len());
        Ok(PlotSpecification { data, layout })
    }

    fn build_primary(&self, graph: &Graph, features: &FeatureData) -> Trace {
        let style = graph.style();
        match graph.chart_type() {
            ChartType::Scatter => scatter_trace(features, style),
            ChartType::Dot => dot_trace(features, style),
            ChartType::Bar => bar_trace(features, style),
            ChartType::Line => {
                let mut trace = line_trace(features, style);
                trace.name = graph.y_axis().map(str::to_string);
                trace
            }
            ChartType::Area => area_trace(features, style),
            ChartType::ScatterPolar => polar_trace(features, style),
            ChartType::Heatmap => self.heatmap_trace(features),
            ChartType::Scatter3d => scatter3d_trace(features, style),
            ChartType::Pie => self.pie_trace(features, style),
        }
    }

    fn heatmap_trace(&self, features: &FeatureData) -> Trace {
        let mut trace = Trace::new(TraceKind::Heatmap);
        trace.x = Some(features.column(0).to_vec());
        trace.y = Some(features.column(1).to_vec());
        trace.z = Some(features.column(2).to_vec());
        trace.colorscale = Some(self.options.heatmap_colorscale.clone());
        trace
    }

    /// One slice per distinct value of the first feature, sized by count.
    /// Slices take the graph's marker color once one has been chosen and the
    /// configured palette until then.
    fn pie_trace(&self, features: &FeatureData, style: &GraphStyle) -> Trace {
        let (labels, values) = transform::count_categories(features.column(0));
        let colors = if style.marker_style.color == DEFAULT_COLOR {
            self.options.pie_colors.clone()
        } else {
            vec![style.marker_style.color.clone()]
        };
        let mut trace = Trace::new(TraceKind::Pie);
        trace.labels = Some(labels);
        trace.values = Some(values);
        trace.marker = Some(Marker {
            colors: Some(colors),
            ..Default::default()
        });
        trace.hole = Some(self.options.pie_hole);
        trace
    }

    fn build_fitted_curve(&self, curve: Option<&[CurvePoint]>) -> Option<Trace> {
        let points = curve?;
        let (x, y): (Vec<Value>, Vec<Value>) = points
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| (Value::from(p.x), Value::from(p.y)))
            .unzip();

        if x.is_empty() {
            debug!("No valid fitted curve data found, skipping overlay");
            return None;
        }

        let mut trace = Trace::new(TraceKind::Scatter);
        trace.mode = Some(TraceMode::Lines);
        trace.x = Some(x);
        trace.y = Some(y);
        trace.line = Some(Line {
            color: self.options.fitted_curve_color.clone(),
            width: self.options.fitted_curve_width,
            dash: None,
        });
        trace.name = Some("Fitted Curve".to_string());
        Some(trace)
    }

    fn build_extra_series(&self, graph: &Graph, features: &FeatureData) -> Vec<Trace> {
        let extra = graph.more_y_axes();
        if extra.is_empty() {
            return Vec::new();
        }

        let chart = graph.chart_type();
        if !chart.supports_multi_series() {
            warn!(
                graph_id = %graph.id(),
                "Chart type '{}' does not support additional Y axes; skipping {} series",
                chart,
                extra.len()
            );
            return Vec::new();
        }

        let x = features.column(0);
        let mut traces = Vec::with_capacity(extra.len());
        for name in extra {
            let values = match graph.dataset().feature(name) {
                Some(values) if !values.is_empty() => values,
                _ => {
                    debug!(
                        graph_id = %graph.id(),
                        "Extra Y feature '{}' is missing or empty, skipping",
                        name
                    );
                    continue;
                }
            };
            let y = transform::filter_rows(values, graph.showed_datapoints());
            if let Some(trace) = series_trace(chart, x.to_vec(), y, name, graph.style()) {
                traces.push(trace);
            }
        }
        traces
    }

    fn build_layout(&self, graph: &Graph, trace_count: usize) -> Layout {
        let selected = graph.selected_features();
        let axis = |idx: usize, fallback: &str| Axis {
            title: selected
                .get(idx)
                .filter(|name| !name.is_empty())
                .cloned()
                .unwrap_or_else(|| fallback.to_string()),
            gridcolor: self.options.grid_color.clone(),
            zerolinecolor: self.options.zeroline_color.clone(),
        };

        let style = graph.style();
        Layout {
            title: graph.name().to_string(),
            xaxis: axis(0, "X"),
            yaxis: (selected.len() >= 2).then(|| axis(1, "Y")),
            zaxis: (selected.len() == 3).then(|| axis(2, "Z")),
            width: style.layout_size.width,
            height: style.layout_size.height,
            plot_bgcolor: style.background_color.clone(),
            paper_bgcolor: self.options.paper_bgcolor.clone(),
            margin: self.options.margin,
            showlegend: trace_count > 1,
        }
    }
}

// =============================================================================
// Per-type trace builders
// =============================================================================

fn marker(style: &GraphStyle) -> Marker {
    Marker {
        color: Some(style.marker_style.color.clone()),
        size: Some(style.marker_style.size),
        ..Default::default()
    }
}

fn stroke(style: &GraphStyle, color: String) -> Line {
    Line {
        color,
        width: style.line_style.width,
        dash: Some(style.line_style.dash_pattern.clone()),
    }
}

fn xy_trace(kind: TraceKind, mode: Option<TraceMode>, x: Vec<Value>, y: Vec<Value>) -> Trace {
    let mut trace = Trace::new(kind);
    trace.mode = mode;
    trace.x = Some(x);
    trace.y = Some(y);
    trace
}

fn scatter_trace(features: &FeatureData, style: &GraphStyle) -> Trace {
    let mut trace = xy_trace(
        TraceKind::Scatter,
        Some(TraceMode::Markers),
        features.column(0).to_vec(),
        features.column(1).to_vec(),
    );
    trace.marker = Some(marker(style));
    trace
}

fn dot_trace(features: &FeatureData, style: &GraphStyle) -> Trace {
    let mut trace = scatter_trace(features, style);
    trace.marker = Some(Marker {
        symbol: Some("circle".to_string()),
        ..marker(style)
    });
    trace
}

fn bar_trace(features: &FeatureData, style: &GraphStyle) -> Trace {
    let mut trace = xy_trace(
        TraceKind::Bar,
        None,
        features.column(0).to_vec(),
        features.column(1).to_vec(),
    );
    trace.marker = Some(Marker {
        color: Some(style.marker_style.color.clone()),
        ..Default::default()
    });
    trace
}

fn line_trace(features: &FeatureData, style: &GraphStyle) -> Trace {
    let mut trace = xy_trace(
        TraceKind::Scatter,
        Some(TraceMode::LinesMarkers),
        features.column(0).to_vec(),
        features.column(1).to_vec(),
    );
    trace.line = Some(stroke(style, style.marker_style.color.clone()));
    trace.marker = Some(Marker {
        symbol: Some("circle".to_string()),
        ..marker(style)
    });
    trace
}

fn area_trace(features: &FeatureData, style: &GraphStyle) -> Trace {
    let mut trace = xy_trace(
        TraceKind::Scatter,
        Some(TraceMode::Lines),
        features.column(0).to_vec(),
        features.column(1).to_vec(),
    );
    trace.fill = Some(Fill::ToZeroY);
    trace.line = Some(stroke(style, style.marker_style.color.clone()));
    trace
}

fn polar_trace(features: &FeatureData, style: &GraphStyle) -> Trace {
    let mut trace = Trace::new(TraceKind::ScatterPolar);
    trace.r = Some(features.column(0).to_vec());
    trace.theta = Some(features.column(1).to_vec());
    trace.marker = Some(marker(style));
    trace
}

fn scatter3d_trace(features: &FeatureData, style: &GraphStyle) -> Trace {
    let mut trace = Trace::new(TraceKind::Scatter3d);
    trace.mode = Some(TraceMode::Markers);
    trace.x = Some(features.column(0).to_vec());
    trace.y = Some(features.column(1).to_vec());
    trace.z = Some(features.column(2).to_vec());
    trace.marker = Some(marker(style));
    trace
}

/// Additional series in the chart's own shape, colored by feature name
fn series_trace(
    chart: ChartType,
    x: Vec<Value>,
    y: Vec<Value>,
    name: &str,
    style: &GraphStyle,
) -> Option<Trace> {
    let color = series_color(name);
    let mut trace = match chart {
        ChartType::Scatter => {
            let mut t = xy_trace(TraceKind::Scatter, Some(TraceMode::Markers), x, y);
            t.marker = Some(Marker {
                color: Some(color),
                size: Some(style.marker_style.size),
                ..Default::default()
            });
            t
        }
        ChartType::Line => {
            let mut t = xy_trace(TraceKind::Scatter, Some(TraceMode::LinesMarkers), x, y);
            t.line = Some(stroke(style, color.clone()));
            t.marker = Some(Marker {
                color: Some(color),
                size: Some(style.marker_style.size),
                ..Default::default()
            });
            t
        }
        ChartType::Bar => {
            let mut t = xy_trace(TraceKind::Bar, None, x, y);
            t.marker = Some(Marker {
                color: Some(color),
                ..Default::default()
            });
            t
        }
        ChartType::Area => {
            let mut t = xy_trace(TraceKind::Scatter, Some(TraceMode::Lines), x, y);
            t.fill = Some(Fill::ToZeroY);
            t.line = Some(stroke(style, color));
            t
        }
        ChartType::Pie
        | ChartType::Heatmap
        | ChartType::ScatterPolar
        | ChartType::Dot
        | ChartType::Scatter3d => return None,
    };
    trace.name = Some(name.to_string());
    Some(trace)
}
