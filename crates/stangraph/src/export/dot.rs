//! Graphviz export: DOT source, and PNG images rendered by the `dot`
//! executable.

use dot_structures::{
    Attribute, Edge, EdgeTy, Graph, GraphAttributes, Id as DotId, Node as DotNode, NodeId, Stmt,
    Vertex,
};
use graphviz_rust::{
    cmd::Format,
    exec,
    printer::{DotPrinter, PrinterContext},
};
use log::debug;

use stangraph_core::identifier::Id;

use super::{Error, ExportStyle, Exporter};
use crate::{config::RenderConfig, render::RenderedGraph};

const GRAPH_NAME: &str = "dependencies";

/// Writes DOT source.
pub struct DotExporter {
    style: ExportStyle,
    splines: bool,
}

impl DotExporter {
    pub(crate) fn new(render: &RenderConfig, style: ExportStyle) -> Self {
        Self {
            style,
            splines: render.splines(),
        }
    }

    /// Builds the Graphviz graph. Nodes and edges keep their traversal order.
    fn build(&self, graph: &RenderedGraph) -> Graph {
        let mut graph_attributes = vec![attribute("splines", plain(self.splines))];
        if let Some(background) = self.style.background_color() {
            graph_attributes.push(attribute("bgcolor", quoted(&background.to_hex())));
        }

        let node_color = quoted(&self.style.node_color().to_hex());
        let mut stmts = vec![
            Stmt::GAttribute(GraphAttributes::Graph(graph_attributes)),
            Stmt::GAttribute(GraphAttributes::Node(vec![
                attribute("color", node_color.clone()),
                attribute("fontcolor", node_color),
                attribute("fontsize", plain(self.style.font_size())),
            ])),
            Stmt::GAttribute(GraphAttributes::Edge(vec![attribute(
                "color",
                quoted(&self.style.edge_color().to_hex()),
            )])),
        ];

        stmts.extend(graph.nodes().iter().map(|node| {
            Stmt::Node(DotNode {
                id: node_id(node.id()),
                attributes: vec![
                    attribute("label", quoted(node.label())),
                    attribute("shape", plain(node.shape())),
                ],
            })
        }));
        stmts.extend(graph.edges().iter().map(|edge| {
            Stmt::Edge(Edge {
                ty: EdgeTy::Pair(Vertex::N(node_id(edge.from())), Vertex::N(node_id(edge.to()))),
                attributes: vec![],
            })
        }));

        Graph::DiGraph {
            id: DotId::Plain(GRAPH_NAME.to_string()),
            strict: false,
            stmts,
        }
    }
}

impl Exporter for DotExporter {
    fn export_graph(&self, graph: &RenderedGraph) -> Result<Vec<u8>, Error> {
        let dot = self.build(graph).print(&mut PrinterContext::default());
        debug!(bytes = dot.len(); "DOT source generated");
        Ok(dot.into_bytes())
    }
}

/// Renders PNG images through the Graphviz `dot` executable.
pub struct PngExporter {
    dot: DotExporter,
}

impl PngExporter {
    pub(crate) fn new(render: &RenderConfig, style: ExportStyle) -> Self {
        Self {
            dot: DotExporter::new(render, style),
        }
    }
}

impl Exporter for PngExporter {
    fn export_graph(&self, graph: &RenderedGraph) -> Result<Vec<u8>, Error> {
        let image = exec(
            self.dot.build(graph),
            &mut PrinterContext::default(),
            vec![Format::Png.into()],
        )
        .map_err(Error::Graphviz)?;
        debug!(bytes = image.len(); "PNG rendered by Graphviz");
        Ok(image)
    }
}

fn attribute(key: &str, value: DotId) -> Attribute {
    Attribute(DotId::Plain(key.to_string()), value)
}

fn plain(value: impl ToString) -> DotId {
    DotId::Plain(value.to_string())
}

/// A double-quoted DOT string.
fn quoted(text: &str) -> DotId {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    DotId::Escaped(format!("\"{escaped}\""))
}

fn node_id(id: Id) -> NodeId {
    NodeId(quoted(&id.to_string()), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{NodeShape, StyleConfig},
        render::GraphSink,
    };

    fn exporter(render: &RenderConfig) -> DotExporter {
        DotExporter::new(
            render,
            ExportStyle::from_config(&StyleConfig::default()).unwrap(),
        )
    }

    fn sample() -> RenderedGraph {
        let mut graph = RenderedGraph::new();
        graph.add_node(Id::new("y"), "y ~ normal", NodeShape::Circle);
        graph.add_node(Id::new("mu"), "mu", NodeShape::Ellipse);
        graph.add_edge(Id::new("mu"), Id::new("y"));
        graph
    }

    #[test]
    fn test_dot_source() {
        let bytes = exporter(&RenderConfig::default())
            .export_graph(&sample())
            .unwrap();
        let dot = String::from_utf8(bytes).unwrap();

        assert!(dot.starts_with("digraph dependencies"));
        assert!(dot.contains("splines=false"));
        assert!(dot.contains("\"y ~ normal\""));
        assert!(dot.contains("shape=circle"));
        assert!(dot.contains("shape=ellipse"));
        assert!(dot.contains("->"));
    }

    #[test]
    fn test_statement_order_is_kept() {
        let graph = exporter(&RenderConfig::default()).build(&sample());
        let Graph::DiGraph { stmts, .. } = graph else {
            panic!("Expected a directed graph");
        };

        let node_ids: Vec<&NodeId> = stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Node(node) => Some(&node.id),
                _ => None,
            })
            .collect();
        assert_eq!(node_ids, vec![&node_id(Id::new("y")), &node_id(Id::new("mu"))]);
        assert!(matches!(stmts.last(), Some(Stmt::Edge(_))));
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(
            quoted("say \"hi\""),
            DotId::Escaped("\"say \\\"hi\\\"\"".to_string())
        );
    }
}
