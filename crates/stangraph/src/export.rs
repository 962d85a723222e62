//! Export functionality for rendered dependency graphs.
//!
//! This module provides the [`Exporter`] trait that defines the interface for
//! converting a [`RenderedGraph`] into an output format. It is the final
//! stage in the stangraph processing pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Stan Source
//!     ↓ parse
//! DependencyGraph
//!     ↓ squish (optional)
//! DependencyGraph
//!     ↓ render
//! RenderedGraph
//!     ↓ export (this module)
//! Output bytes
//! ```
//!
//! # Available Backends
//!
//! - [`svg`]: SVG output with an in-process layered layout, always available
//! - `dot`: Graphviz DOT source and PNG images, behind the `graphviz` feature
//!
//! # Error Handling
//!
//! Export operations return [`Error`]. [`Error`] converts into
//! [`StangraphError::Export`] at the crate boundary.
//!
//! [`StangraphError::Export`]: crate::StangraphError::Export

/// Graphviz export backend.
#[cfg(feature = "graphviz")]
pub mod dot;
/// SVG export backend.
pub mod svg;

use log::debug;
use thiserror::Error;

use stangraph_core::color::Color;

use crate::{
    config::{AppConfig, OutputFormat, RenderConfig, StyleConfig},
    render::RenderedGraph,
};

/// Abstraction for graph export backends.
///
/// Implementors convert a [`RenderedGraph`] into the bytes of one output
/// format.
pub trait Exporter {
    /// Exports `graph` to the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the graph cannot be laid out or converted.
    fn export_graph(&self, graph: &RenderedGraph) -> Result<Vec<u8>, Error>;
}

/// Errors that can occur during graph export.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured style could not be resolved.
    #[error("Style error: {0}")]
    Style(String),

    /// Node placement failed.
    #[error("Layout error: {0}")]
    Layout(String),

    /// The Graphviz executable failed or could not be started.
    #[error("Graphviz error: {0}")]
    Graphviz(#[source] std::io::Error),

    /// The format needs a backend that was not compiled in.
    #[error("output format `{0}` requires the `graphviz` feature")]
    Unsupported(OutputFormat),
}

/// Resolved colors and font size shared by all backends.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExportStyle {
    node_color: Color,
    edge_color: Color,
    background_color: Option<Color>,
    font_size: usize,
}

impl ExportStyle {
    pub(crate) fn from_config(style: &StyleConfig) -> Result<Self, Error> {
        Ok(Self {
            node_color: style.node_color().map_err(Error::Style)?,
            edge_color: style.edge_color().map_err(Error::Style)?,
            background_color: style.background_color().map_err(Error::Style)?,
            font_size: style.font_size(),
        })
    }

    pub(crate) fn node_color(&self) -> Color {
        self.node_color
    }

    pub(crate) fn edge_color(&self) -> Color {
        self.edge_color
    }

    pub(crate) fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub(crate) fn font_size(&self) -> usize {
        self.font_size
    }
}

/// Exports `graph` in `format` using the settings of `config`.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] for DOT and PNG when the `graphviz`
/// feature is disabled, and the backend's error otherwise.
pub fn export(
    graph: &RenderedGraph,
    format: OutputFormat,
    config: &AppConfig,
) -> Result<Vec<u8>, Error> {
    debug!(format = format.extension(); "Exporting graph");
    let style = ExportStyle::from_config(config.style())?;
    let exporter = exporter_for(format, config.render(), style)?;
    exporter.export_graph(graph)
}

#[cfg(feature = "graphviz")]
fn exporter_for(
    format: OutputFormat,
    render: &RenderConfig,
    style: ExportStyle,
) -> Result<Box<dyn Exporter>, Error> {
    Ok(match format {
        OutputFormat::Svg => Box::new(svg::SvgExporter::new(style)),
        OutputFormat::Dot => Box::new(dot::DotExporter::new(render, style)),
        OutputFormat::Png => Box::new(dot::PngExporter::new(render, style)),
    })
}

#[cfg(not(feature = "graphviz"))]
fn exporter_for(
    format: OutputFormat,
    _render: &RenderConfig,
    style: ExportStyle,
) -> Result<Box<dyn Exporter>, Error> {
    match format {
        OutputFormat::Svg => Ok(Box::new(svg::SvgExporter::new(style))),
        OutputFormat::Dot | OutputFormat::Png => Err(Error::Unsupported(format)),
    }
}
