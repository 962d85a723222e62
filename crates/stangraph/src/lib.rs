//! stangraph - Variable dependency graphs for Stan models.
//!
//! Parsing, contraction, rendering and export of the dependency graph of a
//! Stan model. [`GraphBuilder`] drives the pipeline:
//!
//! ```text
//! Stan source ─parse─▶ DependencyGraph ─squish─▶ DependencyGraph
//!             ─render─▶ RenderedGraph ─export─▶ SVG / DOT / PNG bytes
//! ```

pub mod config;
pub mod export;
pub mod render;
pub mod structure;

mod error;

pub use stangraph_core::{color, declared, graph, identifier, labels};

pub use error::StangraphError;
pub use render::{RenderError, RenderedGraph};

use std::{fs, path::Path};

use log::{debug, info, trace, warn};

use stangraph_core::{graph::DependencyGraph, identifier::Id, labels::LabelMapping};

use config::{AppConfig, OutputFormat};
use render::RenderOptions;
use structure::DependencyStructure;

/// Builder for parsing, squishing and rendering dependency graphs.
///
/// # Examples
///
/// ```rust
/// use stangraph::{GraphBuilder, config::{AppConfig, OutputFormat}};
///
/// let source = "parameters { real mu; } model { y ~ normal(mu, 1); }";
///
/// let builder = GraphBuilder::new(AppConfig::default());
/// let graph = builder.parse(source).expect("Failed to parse");
/// let rendered = builder.render(&graph, None, false).expect("Failed to render");
/// let svg = builder
///     .export(&rendered, OutputFormat::Svg)
///     .expect("Failed to export");
///
/// assert!(String::from_utf8(svg).unwrap().contains("y ~ normal"));
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    config: AppConfig,
}

impl GraphBuilder {
    /// Create a new graph builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse Stan source into a dependency graph.
    ///
    /// # Errors
    ///
    /// Returns [`StangraphError::Parse`] for unbalanced braces. The error
    /// carries the source so diagnostics can show snippets.
    pub fn parse(&self, source: &str) -> Result<DependencyGraph, StangraphError> {
        info!("Parsing model");

        let graph = stangraph_parser::parse(source)
            .map_err(|err| StangraphError::new_parse_error(err, source))?;

        debug!(nodes = graph.len(); "Model parsed successfully");
        trace!(graph:?; "Parsed dependency graph");

        Ok(graph)
    }

    /// Read and parse the Stan file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StangraphError::Io`] if the file cannot be read, and the
    /// errors of [`GraphBuilder::parse`] otherwise.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<DependencyGraph, StangraphError> {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Reading model file");
        let source = fs::read_to_string(path)?;
        self.parse(&source)
    }

    /// Remove `name` from `graph`, connecting its consumers to its own
    /// dependencies. `graph` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StangraphError::Graph`] if `name` is not a node of `graph`.
    pub fn squish(
        &self,
        graph: &DependencyGraph,
        name: &str,
    ) -> Result<DependencyGraph, StangraphError> {
        info!(variable = name; "Squishing variable");
        Ok(graph.squish(Id::new(name))?)
    }

    /// Squish every name of `names`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first name that is not a node and returns
    /// [`StangraphError::Graph`].
    pub fn squish_all<'a>(
        &self,
        graph: &DependencyGraph,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<DependencyGraph, StangraphError> {
        let names: Vec<Id> = names.into_iter().map(Id::new).collect();
        if names.is_empty() {
            return Ok(graph.clone());
        }

        info!(count = names.len(); "Squishing variables");
        let squished = graph.squish_all(names)?;
        debug!(nodes = squished.len(); "Variables squished");
        Ok(squished)
    }

    /// Render `graph` into nodes and edges.
    ///
    /// `explicit` shows full right-hand side expressions in addition to
    /// whatever the configuration asks for. `labels` replaces variable names
    /// in statement labels.
    ///
    /// # Errors
    ///
    /// Returns [`StangraphError::Render`] when the graph has a dependency
    /// cycle through several variables.
    pub fn render(
        &self,
        graph: &DependencyGraph,
        labels: Option<&LabelMapping>,
        explicit: bool,
    ) -> Result<RenderedGraph, StangraphError> {
        let structure = DependencyStructure::from_graph(graph);
        if structure.has_cycle() {
            warn!("Dependency graph contains a cycle or a self-dependency");
        }

        if let Some(labels) = labels {
            for name in labels.names().filter(|&name| !is_known(graph, name)) {
                warn!(variable = name.to_string(); "Label given for unknown variable");
            }
        }

        let render_config = self.config.render();
        let explicit = explicit || render_config.explicit();
        let options = RenderOptions::new(render_config, labels).with_explicit(explicit);

        info!(explicit; "Rendering dependency graph");
        let rendered = render::render(graph, &options)?;
        info!(
            nodes = rendered.nodes().len(),
            edges = rendered.edges().len();
            "Graph rendered"
        );
        trace!(rendered:%; "Rendered graph");

        Ok(rendered)
    }

    /// Export a rendered graph in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`StangraphError::Export`] if the style cannot be resolved,
    /// the format is not compiled in, or the backend fails.
    pub fn export(
        &self,
        rendered: &RenderedGraph,
        format: OutputFormat,
    ) -> Result<Vec<u8>, StangraphError> {
        let bytes = export::export(rendered, format, &self.config)?;
        info!(format = format.extension(), bytes = bytes.len(); "Graph exported");
        Ok(bytes)
    }
}

/// Whether `name` is a node or a dependency of some node.
fn is_known(graph: &DependencyGraph, name: Id) -> bool {
    graph.contains(name) || graph.iter().any(|(_, node)| node.depends_on(name))
}
