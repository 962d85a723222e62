//! Configuration types for stangraph rendering.
//!
//! This module provides configuration structures that control how dependency
//! graphs are rendered and exported. All types implement
//! [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration combining render and style settings.
//! - [`RenderConfig`] - Label detail, node shapes and default output formats.
//! - [`StyleConfig`] - Colors and font size of the exported graph.
//!
//! # Example
//!
//! ```
//! # use stangraph::config::{AppConfig, NodeShape};
//! let config = AppConfig::default();
//! assert!(!config.render().explicit());
//! assert_eq!(config.render().statement_shape(), NodeShape::Circle);
//! assert!(config.style().node_color().is_ok());
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

use stangraph_core::color::Color;

/// Top-level application configuration combining render and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified render and style configurations.
    pub fn new(render: RenderConfig, style: StyleConfig) -> Self {
        Self { render, style }
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Shape of a rendered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Circle,
    Ellipse,
    Box,
}

impl NodeShape {
    /// The Graphviz `shape` attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Box => "box",
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// SVG laid out in-process.
    Svg,
    /// Graphviz DOT source.
    Dot,
    /// PNG rendered by the Graphviz `dot` executable.
    Png,
}

impl OutputFormat {
    /// File extension for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Dot => "dot",
            Self::Png => "png",
        }
    }

    /// Formats written when none are configured: DOT and PNG when Graphviz
    /// support is compiled in, SVG otherwise.
    pub fn defaults() -> Vec<Self> {
        if cfg!(feature = "graphviz") {
            vec![Self::Dot, Self::Png]
        } else {
            vec![Self::Svg]
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "dot" | "gv" => Ok(Self::Dot),
            "png" => Ok(Self::Png),
            _ => Err(format!("unknown output format `{s}` (expected svg, dot or png)")),
        }
    }
}

/// Render configuration: what labels show and how nodes look.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Show full right-hand side expressions in labels.
    explicit: bool,

    /// Formats written when the caller does not choose any.
    formats: Option<Vec<OutputFormat>>,

    /// Shape of variables defined by a statement.
    statement_shape: NodeShape,

    /// Shape of variables that are only referenced.
    leaf_shape: NodeShape,

    /// Graphviz `splines` graph attribute.
    splines: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            explicit: false,
            formats: None,
            statement_shape: NodeShape::Circle,
            leaf_shape: NodeShape::Ellipse,
            splines: false,
        }
    }
}

impl RenderConfig {
    pub fn explicit(&self) -> bool {
        self.explicit
    }

    /// Configured output formats, or [`OutputFormat::defaults`].
    pub fn formats(&self) -> Vec<OutputFormat> {
        self.formats.clone().unwrap_or_else(OutputFormat::defaults)
    }

    pub fn statement_shape(&self) -> NodeShape {
        self.statement_shape
    }

    pub fn leaf_shape(&self) -> NodeShape {
        self.leaf_shape
    }

    pub fn splines(&self) -> bool {
        self.splines
    }

    /// Returns a copy with `explicit` set.
    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }
}

/// Visual styling configuration for exported graphs.
///
/// Colors are CSS color strings. Fields that are not set fall back to
/// black strokes, no background and a 14 point font.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    node_color: Option<String>,

    #[serde(default)]
    edge_color: Option<String>,

    #[serde(default)]
    background_color: Option<String>,

    #[serde(default)]
    font_size: Option<usize>,
}

const DEFAULT_FONT_SIZE: usize = 14;

fn parse_color(value: Option<&String>, field: &str) -> Result<Option<Color>, String> {
    value
        .map(|color| Color::new(color))
        .transpose()
        .map_err(|err| format!("Invalid {field} in config: {err}"))
}

impl StyleConfig {
    /// Returns the node outline [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn node_color(&self) -> Result<Color, String> {
        parse_color(self.node_color.as_ref(), "node color").map(Option::unwrap_or_default)
    }

    /// Returns the edge [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn edge_color(&self) -> Result<Color, String> {
        parse_color(self.edge_color.as_ref(), "edge color").map(Option::unwrap_or_default)
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        parse_color(self.background_color.as_ref(), "background color")
    }

    /// Label font size in points.
    pub fn font_size(&self) -> usize {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Returns a copy with the node color set to the CSS color `color`.
    pub fn with_node_color(mut self, color: impl Into<String>) -> Self {
        self.node_color = Some(color.into());
        self
    }

    /// Returns a copy with the edge color set to the CSS color `color`.
    pub fn with_edge_color(mut self, color: impl Into<String>) -> Self {
        self.edge_color = Some(color.into());
        self
    }
}
