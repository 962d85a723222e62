//! Graph traversal into a rendering target.
//!
//! [`render_into`] walks a [`DependencyGraph`] and declares every variable
//! once, as a node, and every dependency as an edge from the dependency to
//! the variable that uses it. The walk is depth-first: a variable is
//! declared before its dependencies, and its incoming edges follow once all
//! of its dependencies have been visited.
//!
//! [`RenderedGraph`] is the in-memory target consumed by the exporters.

use std::{collections::HashSet, fmt};

use indexmap::IndexSet;
use log::{debug, trace};
use thiserror::Error;

use stangraph_core::{
    graph::{DependencyGraph, Node},
    identifier::Id,
    labels::LabelMapping,
};

use crate::config::{NodeShape, RenderConfig};

/// Errors raised while rendering a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The graph holds a dependency cycle through more than one variable.
    #[error("dependency cycle detected: {}", format_cycle(.cycle))]
    CycleDetected {
        /// Variables of the cycle, in dependency order from the first one
        /// reached.
        cycle: Vec<Id>,
    },
}

fn format_cycle(cycle: &[Id]) -> String {
    let mut path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
    if let Some(first) = path.first().cloned() {
        path.push(first);
    }
    path.join(" -> ")
}

/// A rendering target for node declarations and edges.
pub trait GraphSink {
    /// Declares a node. Called once per variable, before any edge that
    /// touches it.
    fn add_node(&mut self, id: Id, label: &str, shape: NodeShape);

    /// Adds an edge from `from` (the dependency) to `to` (the dependent).
    fn add_edge(&mut self, from: Id, to: Id);
}

/// A node of a [`RenderedGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNode {
    id: Id,
    label: String,
    shape: NodeShape,
}

impl RenderedNode {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }
}

/// An edge of a [`RenderedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedEdge {
    from: Id,
    to: Id,
}

impl RenderedEdge {
    pub fn from(&self) -> Id {
        self.from
    }

    pub fn to(&self) -> Id {
        self.to
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Nodes and edges in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedGraph {
    nodes: Vec<RenderedNode>,
    edges: Vec<RenderedEdge>,
}

impl RenderedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[RenderedNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RenderedEdge] {
        &self.edges
    }

    pub fn node(&self, id: Id) -> Option<&RenderedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

impl GraphSink for RenderedGraph {
    fn add_node(&mut self, id: Id, label: &str, shape: NodeShape) {
        self.nodes.push(RenderedNode {
            id,
            label: label.to_string(),
            shape,
        });
    }

    fn add_edge(&mut self, from: Id, to: Id) {
        self.edges.push(RenderedEdge { from, to });
    }
}

impl fmt::Display for RenderedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            writeln!(f, "{} [{}] {}", node.id, node.shape, node.label)?;
        }
        for edge in &self.edges {
            writeln!(f, "{} -> {}", edge.from, edge.to)?;
        }
        Ok(())
    }
}

/// Label text and shapes for traversal.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    labels: Option<&'a LabelMapping>,
    explicit: bool,
    statement_shape: NodeShape,
    leaf_shape: NodeShape,
}

impl<'a> RenderOptions<'a> {
    /// Options taken from `config`, with optional display labels.
    pub fn new(config: &RenderConfig, labels: Option<&'a LabelMapping>) -> Self {
        Self {
            labels,
            explicit: config.explicit(),
            statement_shape: config.statement_shape(),
            leaf_shape: config.leaf_shape(),
        }
    }

    /// Overrides whether labels show full expressions.
    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// Label of a variable defined by a statement, e.g. `y ~ normal`.
    fn statement_label(&self, name: Id, node: &Node) -> String {
        let display = match self.labels {
            Some(labels) => labels.display_name(name),
            None => name.to_string(),
        };
        let expression = if self.explicit {
            node.expression()
        } else {
            node.head()
        };
        format!("{display} {} {expression}", node.relation())
    }
}

/// One variable on the traversal stack.
struct Frame {
    id: Id,
    next_dependency: usize,
}

/// Traversal state shared by all roots of one walk.
struct Traversal<'g, 'o, S> {
    graph: &'g DependencyGraph,
    options: &'o RenderOptions<'o>,
    sink: &'o mut S,
    emitted: HashSet<Id>,
    on_path: IndexSet<Id>,
}

impl<S: GraphSink> Traversal<'_, '_, S> {
    fn emit(&mut self, id: Id) {
        let graph = self.graph;
        match graph.get(id) {
            Some(node) => {
                let label = self.options.statement_label(id, node);
                trace!(variable = id.to_string(), label; "Emitting node");
                self.sink.add_node(id, &label, self.options.statement_shape);
            }
            None => {
                trace!(variable = id.to_string(); "Emitting leaf");
                self.sink
                    .add_node(id, &id.to_string(), self.options.leaf_shape);
            }
        }
        self.emitted.insert(id);
    }

    /// Walks everything reachable from `root` with an explicit stack.
    fn visit(&mut self, root: Id) -> Result<(), RenderError> {
        let graph = self.graph;
        let mut stack = vec![Frame {
            id: root,
            next_dependency: 0,
        }];
        self.emit(root);
        self.on_path.insert(root);

        while let Some(frame) = stack.last_mut() {
            let id = frame.id;
            let index = frame.next_dependency;
            frame.next_dependency += 1;

            let node = graph.get(id);
            let Some(&dependency) = node.and_then(|node| node.dependencies().get_index(index))
            else {
                for &dependency in node.into_iter().flat_map(Node::dependencies) {
                    self.sink.add_edge(dependency, id);
                }
                self.on_path.pop();
                stack.pop();
                continue;
            };

            if dependency == id {
                continue;
            }
            if let Some(start) = self.on_path.get_index_of(&dependency) {
                let cycle: Vec<Id> = self.on_path.iter().skip(start).copied().collect();
                return Err(RenderError::CycleDetected { cycle });
            }
            if !self.emitted.contains(&dependency) {
                self.emit(dependency);
                self.on_path.insert(dependency);
                stack.push(Frame {
                    id: dependency,
                    next_dependency: 0,
                });
            }
        }

        Ok(())
    }
}

/// Walks `graph` in insertion order and reports every node and edge to
/// `sink`.
///
/// Each variable is declared exactly once. Variables without a node of
/// their own (leaves) are labelled with their bare name. A variable that
/// depends on itself gets a self-loop edge.
///
/// # Errors
///
/// Returns [`RenderError::CycleDetected`] when a dependency leads back to a
/// variable that is still being visited. Whatever was reported to `sink`
/// before the cycle was found stays there.
pub fn render_into<S: GraphSink>(
    graph: &DependencyGraph,
    options: &RenderOptions<'_>,
    sink: &mut S,
) -> Result<(), RenderError> {
    let mut traversal = Traversal {
        graph,
        options,
        sink,
        emitted: HashSet::new(),
        on_path: IndexSet::new(),
    };

    for name in graph.names() {
        if !traversal.emitted.contains(&name) {
            traversal.visit(name)?;
        }
    }

    debug!(nodes = traversal.emitted.len(); "Graph traversed");
    Ok(())
}

/// Renders `graph` into a new [`RenderedGraph`].
///
/// # Errors
///
/// See [`render_into`].
pub fn render(
    graph: &DependencyGraph,
    options: &RenderOptions<'_>,
) -> Result<RenderedGraph, RenderError> {
    let mut rendered = RenderedGraph::new();
    render_into(graph, options, &mut rendered)?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use stangraph_core::graph::Relation;

    use super::*;

    fn options() -> RenderOptions<'static> {
        RenderOptions::new(&RenderConfig::default(), None)
    }

    fn node(relation: Relation, expression: &str, deps: &[&str]) -> Node {
        Node::new(relation, expression, deps.iter().map(|name| Id::new(name)))
    }

    fn edge_names(rendered: &RenderedGraph) -> Vec<(String, String)> {
        rendered
            .edges()
            .iter()
            .map(|edge| (edge.from().to_string(), edge.to().to_string()))
            .collect()
    }

    fn node_names(rendered: &RenderedGraph) -> Vec<String> {
        rendered.nodes().iter().map(|n| n.id().to_string()).collect()
    }

    #[test]
    fn test_single_statement() {
        let mut graph = DependencyGraph::new();
        graph.insert(
            Id::new("y"),
            node(Relation::Stochastic, "normal(mu, 1)", &["mu"]),
        );

        let rendered = render(&graph, &options()).unwrap();

        assert_eq!(node_names(&rendered), vec!["y", "mu"]);
        assert_eq!(rendered.node(Id::new("y")).unwrap().label(), "y ~ normal");
        assert_eq!(rendered.node(Id::new("y")).unwrap().shape(), NodeShape::Circle);
        assert_eq!(rendered.node(Id::new("mu")).unwrap().label(), "mu");
        assert_eq!(rendered.node(Id::new("mu")).unwrap().shape(), NodeShape::Ellipse);
        assert_eq!(edge_names(&rendered), vec![("mu".into(), "y".into())]);
    }

    #[test]
    fn test_explicit_labels() {
        let mut graph = DependencyGraph::new();
        graph.insert(
            Id::new("y"),
            node(Relation::Stochastic, "normal(mu, 1)", &["mu"]),
        );

        let rendered = render(&graph, &options().with_explicit(true)).unwrap();
        assert_eq!(
            rendered.node(Id::new("y")).unwrap().label(),
            "y ~ normal(mu, 1)"
        );
    }

    #[test]
    fn test_parenthesized_expression_label() {
        let mut graph = DependencyGraph::new();
        graph.insert(
            Id::new("x"),
            node(Relation::Deterministic, "(a + b) * c", &["a", "b", "c"]),
        );

        let rendered = render(&graph, &options()).unwrap();
        assert_eq!(rendered.node(Id::new("x")).unwrap().label(), "x = (a + b) * c");
    }

    #[test]
    fn test_label_mapping() {
        let mut graph = DependencyGraph::new();
        graph.insert(
            Id::new("theta"),
            node(Relation::Deterministic, "mu + tau", &["mu", "tau"]),
        );
        let labels = LabelMapping::parse("theta θ\nmu μ").unwrap();
        let options = RenderOptions::new(&RenderConfig::default(), Some(&labels));

        let rendered = render(&graph, &options).unwrap();

        assert_eq!(rendered.node(Id::new("theta")).unwrap().label(), "θ = mu + tau");
        // Leaves keep their bare name.
        assert_eq!(rendered.node(Id::new("mu")).unwrap().label(), "mu");
    }

    #[test]
    fn test_diamond_emits_each_node_once() {
        let mut graph = DependencyGraph::new();
        graph.insert(Id::new("d"), node(Relation::Deterministic, "b + c", &["b", "c"]));
        graph.insert(Id::new("b"), node(Relation::Deterministic, "a", &["a"]));
        graph.insert(Id::new("c"), node(Relation::Deterministic, "a", &["a"]));
        graph.insert(Id::new("a"), node(Relation::Deterministic, "1", &[]));

        let rendered = render(&graph, &options()).unwrap();

        assert_eq!(node_names(&rendered), vec!["d", "b", "a", "c"]);
        assert_eq!(
            edge_names(&rendered),
            vec![
                ("a".into(), "b".into()),
                ("a".into(), "c".into()),
                ("b".into(), "d".into()),
                ("c".into(), "d".into()),
            ]
        );
    }

    #[test]
    fn test_nodes_precede_their_edges() {
        let mut graph = DependencyGraph::new();
        graph.insert(Id::new("z"), node(Relation::Stochastic, "normal(y, 1)", &["y"]));
        graph.insert(Id::new("y"), node(Relation::Deterministic, "x * 2", &["x"]));

        let mut log = Vec::new();
        struct Recorder<'a>(&'a mut Vec<String>);
        impl GraphSink for Recorder<'_> {
            fn add_node(&mut self, id: Id, _label: &str, _shape: NodeShape) {
                self.0.push(format!("node {id}"));
            }
            fn add_edge(&mut self, from: Id, to: Id) {
                self.0.push(format!("edge {from}->{to}"));
            }
        }

        render_into(&graph, &options(), &mut Recorder(&mut log)).unwrap();

        assert_eq!(
            log,
            vec!["node z", "node y", "node x", "edge x->y", "edge y->z"]
        );
    }

    #[test]
    fn test_self_loop_is_not_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.insert(Id::new("x"), node(Relation::Deterministic, "x + a", &["x", "a"]));

        let rendered = render(&graph, &options()).unwrap();

        assert_eq!(node_names(&rendered), vec!["x", "a"]);
        assert_eq!(
            edge_names(&rendered),
            vec![("x".into(), "x".into()), ("a".into(), "x".into())]
        );
        assert!(rendered.edges()[0].is_self_loop());
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = DependencyGraph::new();
        graph.insert(Id::new("a"), node(Relation::Deterministic, "b", &["b"]));
        graph.insert(Id::new("b"), node(Relation::Deterministic, "c", &["c"]));
        graph.insert(Id::new("c"), node(Relation::Deterministic, "a", &["a"]));

        let err = render(&graph, &options()).unwrap_err();

        assert_eq!(
            err,
            RenderError::CycleDetected {
                cycle: vec![Id::new("a"), Id::new("b"), Id::new("c")],
            }
        );
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> c -> a");
        // The graph itself is untouched and still usable.
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_empty_graph() {
        let rendered = render(&DependencyGraph::new(), &options()).unwrap();
        assert!(rendered.nodes().is_empty());
        assert!(rendered.edges().is_empty());
    }
}
