//! stangraph Core Types
//!
//! This crate provides the foundational types shared by the stangraph
//! parser, renderer and command-line tool:
//!
//! - **Identifiers**: interned variable names ([`identifier::Id`])
//! - **Graph**: the dependency graph and its contraction ([`graph`] module)
//! - **Declarations**: the set of declared variable names ([`declared::DeclaredSet`])
//! - **Labels**: display labels loaded from label files ([`labels::LabelMapping`])
//! - **Colors**: CSS color handling for exporters ([`color::Color`])

pub mod color;
pub mod declared;
pub mod graph;
pub mod identifier;
pub mod labels;

pub use graph::GraphError;
pub use labels::LabelError;
