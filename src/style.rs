use crate::palette::DEFAULT_COLOR;
use serde::{Deserialize, Serialize};

/// Marker appearance for point-like traces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub size: f64,
    pub color: String,
}

/// Stroke appearance for line-like traces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    pub width: f64,
    pub dash_pattern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSize {
    pub width: u32,
    pub height: u32,
}

/// Visual configuration of a single graph.
///
/// Values are never edited in place: every change goes through one of the
/// `with_*` methods or a [`StyleUpdate`], which return a new style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStyle {
    pub color_scheme: String,
    pub marker_style: MarkerStyle,
    pub line_style: LineStyle,
    pub layout_size: LayoutSize,
    pub background_color: String,
}

impl Default for GraphStyle {
    fn default() -> Self {
        GraphStyle {
            color_scheme: DEFAULT_COLOR.to_string(),
            marker_style: MarkerStyle {
                size: 8.0,
                color: DEFAULT_COLOR.to_string(),
            },
            line_style: LineStyle {
                width: 2.0,
                dash_pattern: "solid".to_string(),
            },
            layout_size: LayoutSize {
                width: 300,
                height: 150,
            },
            background_color: "rgba(245, 245, 245, 0.9)".to_string(),
        }
    }
}

impl GraphStyle {
    /// Change the color scheme; the marker color follows it.
    pub fn with_color(&self, color: impl Into<String>) -> Self {
        let color = color.into();
        GraphStyle {
            marker_style: MarkerStyle {
                color: color.clone(),
                ..self.marker_style.clone()
            },
            color_scheme: color,
            ..self.clone()
        }
    }

    pub fn with_marker_size(&self, size: f64) -> Self {
        GraphStyle {
            marker_style: MarkerStyle {
                size,
                ..self.marker_style.clone()
            },
            ..self.clone()
        }
    }

    pub fn with_line(&self, width: f64, dash_pattern: impl Into<String>) -> Self {
        GraphStyle {
            line_style: LineStyle {
                width,
                dash_pattern: dash_pattern.into(),
            },
            ..self.clone()
        }
    }

    pub fn with_layout_size(&self, width: u32, height: u32) -> Self {
        GraphStyle {
            layout_size: LayoutSize { width, height },
            ..self.clone()
        }
    }

    pub fn with_background(&self, color: impl Into<String>) -> Self {
        GraphStyle {
            background_color: color.into(),
            ..self.clone()
        }
    }
}

/// Partial style change; `None` fields keep the current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleUpdate {
    pub color_scheme: Option<String>,
    pub marker_size: Option<f64>,
    pub marker_color: Option<String>,
    pub line_width: Option<f64>,
    pub dash_pattern: Option<String>,
    pub layout_size: Option<LayoutSize>,
    pub background_color: Option<String>,
}

impl StyleUpdate {
    /// Produce the merged style. A color scheme change also recolors the
    /// marker unless the same update sets an explicit marker color.
    pub fn apply(&self, base: &GraphStyle) -> GraphStyle {
        let mut style = match &self.color_scheme {
            Some(color) => base.with_color(color.clone()),
            None => base.clone(),
        };
        if let Some(size) = self.marker_size {
            style = style.with_marker_size(size);
        }
        if let Some(ref color) = self.marker_color {
            style.marker_style.color = color.clone();
        }
        if self.line_width.is_some() || self.dash_pattern.is_some() {
            let width = self.line_width.unwrap_or(style.line_style.width);
            let dash = self
                .dash_pattern
                .clone()
                .unwrap_or_else(|| style.line_style.dash_pattern.clone());
            style = style.with_line(width, dash);
        }
        if let Some(size) = self.layout_size {
            style = style.with_layout_size(size.width, size.height);
        }
        if let Some(ref bg) = self.background_color {
            style = style.with_background(bg.clone());
        }
        style
    }

    /// Every color this update would introduce
    pub fn colors(&self) -> impl Iterator<Item = &str> {
        [&self.color_scheme, &self.marker_color, &self.background_color]
            .into_iter()
            .filter_map(|c| c.as_deref())
    }
}
