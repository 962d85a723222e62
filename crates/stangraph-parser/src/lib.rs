//! # stangraph Parser
//!
//! Heuristic parser for Stan model source. This crate turns model text into
//! a [`DependencyGraph`] of the variables defined by statements. It does not
//! implement the Stan grammar: each stage is a structural recognizer and
//! lines it does not understand are skipped.
//!
//! ## Usage
//!
//! ```
//! # use stangraph_parser::{parse, error::ParseError};
//! # use stangraph_core::identifier::Id;
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         parameters { real mu; }
//!         model { y ~ normal(mu, 1); }
//!     "#;
//!
//!     let graph = parse(source)?;
//!     assert!(graph.get(Id::new("y")).unwrap().depends_on(Id::new("mu")));
//!     Ok(())
//! }
//! ```

mod blocks;
mod declarations;
pub mod error;
mod lexical;
mod preprocess;
mod span;
mod statements;

pub use blocks::{Block, extract_blocks};
pub use declarations::{declared_set, scan_declarations};
pub use preprocess::strip_comments;
pub use span::Span;
pub use statements::{build_dependency_graph, parse_statement, parse_statements};

use indexmap::IndexMap;
use log::{debug, trace};

use stangraph_core::{declared::DeclaredSet, graph::DependencyGraph};

use error::ParseError;

/// A parsed model: its blocks, the declared names and the dependency graph.
#[derive(Debug, Clone)]
pub struct Model {
    blocks: IndexMap<String, Block>,
    declared: DeclaredSet,
    graph: DependencyGraph,
}

impl Model {
    /// Blocks in order of first appearance.
    pub fn blocks(&self) -> &IndexMap<String, Block> {
        &self.blocks
    }

    pub fn declared(&self) -> &DeclaredSet {
        &self.declared
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn into_graph(self) -> DependencyGraph {
        self.graph
    }
}

/// Parse model source into its blocks, declarations and dependency graph.
///
/// The pipeline runs in four steps:
///
/// 1. **Preprocess** - Blank out comments, keeping byte offsets
/// 2. **Extract** - Split the text into named top-level blocks
/// 3. **Declare** - Collect declared names over all blocks
/// 4. **Parse** - Turn statement lines into graph nodes, in block order
///
/// # Errors
///
/// Returns a [`ParseError`] when the braces of the model are unbalanced.
/// Spans in its diagnostics refer to `source`.
pub fn parse_model(source: &str) -> Result<Model, ParseError> {
    // Step 1: Preprocess
    let text = strip_comments(source);

    // Step 2: Extract
    let blocks = extract_blocks(&text)?;

    // Step 3: Declare
    let declared = declared_set(&blocks);
    debug!(declared = declared.len(); "Declarations scanned");

    // Step 4: Parse
    let graph = build_dependency_graph(&blocks, &declared);
    debug!(nodes = graph.len(), leaves = graph.leaves().len(); "Dependency graph built");
    trace!(graph:?; "Full dependency graph");

    Ok(Model {
        blocks,
        declared,
        graph,
    })
}

/// Parse model source into its dependency graph.
///
/// # Errors
///
/// See [`parse_model`].
pub fn parse(source: &str) -> Result<DependencyGraph, ParseError> {
    parse_model(source).map(Model::into_graph)
}
