//! The dependency graph and its contraction.
//!
//! A [`DependencyGraph`] maps every variable defined by a statement to its
//! [`Node`]: the relation of the statement, the right-hand side text, and the
//! declared variables the right-hand side refers to. Variables that are only
//! referenced (data, parameters without a statement) are not keys; they show
//! up as dependencies only and are called *leaves*.
//!
//! [`DependencyGraph::squish`] removes a variable and reconnects its
//! consumers directly to its own dependencies.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use thiserror::Error;

use crate::identifier::Id;

/// Errors raised by graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The requested variable is not a node of the graph.
    #[error("variable `{0}` not found in the dependency graph")]
    NotFound(Id),
}

/// The kind of statement that defines a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Assignment (`=`): the value is fully determined by the expression.
    Deterministic,
    /// Sampling statement (`~`): the value is drawn from a distribution.
    Stochastic,
}

impl Relation {
    /// Maps a statement operator to its relation.
    ///
    /// ```
    /// use stangraph_core::graph::Relation;
    ///
    /// assert_eq!(Relation::from_operator('~'), Some(Relation::Stochastic));
    /// assert_eq!(Relation::from_operator('+'), None);
    /// ```
    pub fn from_operator(operator: char) -> Option<Self> {
        match operator {
            '=' => Some(Self::Deterministic),
            '~' => Some(Self::Stochastic),
            _ => None,
        }
    }

    /// The operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Deterministic => "=",
            Self::Stochastic => "~",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The parsed record of one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    relation: Relation,
    expression: String,
    dependencies: IndexSet<Id>,
}

impl Node {
    /// Creates a node. Duplicate dependencies are dropped, keeping the first
    /// occurrence.
    pub fn new(
        relation: Relation,
        expression: impl Into<String>,
        dependencies: impl IntoIterator<Item = Id>,
    ) -> Self {
        Self {
            relation,
            expression: expression.into(),
            dependencies: dependencies.into_iter().collect(),
        }
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Right-hand side of the defining statement, without the trailing `;`.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The expression up to its first `(`, i.e. the distribution or function
    /// name for call expressions and the whole expression otherwise. An
    /// expression that opens with `(` has no name, so it is kept whole.
    ///
    /// ```
    /// use stangraph_core::graph::{Node, Relation};
    ///
    /// let node = Node::new(Relation::Stochastic, "normal(mu, sigma)", []);
    /// assert_eq!(node.head(), "normal");
    ///
    /// let node = Node::new(Relation::Deterministic, "alpha + beta", []);
    /// assert_eq!(node.head(), "alpha + beta");
    /// ```
    pub fn head(&self) -> &str {
        let head = self
            .expression
            .split('(')
            .next()
            .unwrap_or_default()
            .trim_end();
        if head.is_empty() {
            &self.expression
        } else {
            head
        }
    }

    /// Dependencies in first-occurrence order.
    pub fn dependencies(&self) -> &IndexSet<Id> {
        &self.dependencies
    }

    pub fn depends_on(&self, name: Id) -> bool {
        self.dependencies.contains(&name)
    }

    /// Returns a copy of this node where `target` is replaced by `inherited`,
    /// in place, without duplicates.
    fn splice(&self, target: Id, inherited: &[Id]) -> Self {
        let mut dependencies = IndexSet::with_capacity(self.dependencies.len() + inherited.len());
        for &dependency in &self.dependencies {
            if dependency == target {
                dependencies.extend(inherited.iter().copied());
            } else {
                dependencies.insert(dependency);
            }
        }

        Self {
            relation: self.relation,
            expression: self.expression.clone(),
            dependencies,
        }
    }
}

/// Ordered mapping from variable name to its [`Node`].
///
/// Iteration follows insertion order. Re-inserting an existing name replaces
/// its node but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: IndexMap<Id, Node>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the node for `name`, returning the replaced node.
    pub fn insert(&mut self, name: Id, node: Node) -> Option<Node> {
        self.nodes.insert(name, node)
    }

    /// Merges `other` into this graph; entries of `other` win on conflicts.
    pub fn merge(&mut self, other: DependencyGraph) {
        self.nodes.extend(other.nodes);
    }

    pub fn get(&self, name: Id) -> Option<&Node> {
        self.nodes.get(&name)
    }

    pub fn contains(&self, name: Id) -> bool {
        self.nodes.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over `(name, node)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Node)> {
        self.nodes.iter().map(|(name, node)| (*name, node))
    }

    /// Iterates over node names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.keys().copied()
    }

    /// Variables that appear as dependencies but have no node of their own.
    pub fn leaves(&self) -> IndexSet<Id> {
        self.nodes
            .values()
            .flat_map(|node| node.dependencies.iter().copied())
            .filter(|dependency| !self.nodes.contains_key(dependency))
            .collect()
    }

    /// Names of the nodes that list `name` as a dependency.
    pub fn consumers(&self, name: Id) -> impl Iterator<Item = Id> + '_ {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.depends_on(name))
            .map(|(consumer, _)| *consumer)
    }

    /// Removes `target` and rewires its consumers to its dependencies.
    ///
    /// Every remaining node that depended on `target` now depends on
    /// `(old - {target}) ∪ deps(target)`. A self-dependency of `target` is
    /// not inherited, so no node of the result refers to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `target` is not a node. `self` is
    /// never modified.
    ///
    /// ```
    /// use stangraph_core::{
    ///     graph::{DependencyGraph, Node, Relation},
    ///     identifier::Id,
    /// };
    ///
    /// let (a, b, c) = (Id::new("a"), Id::new("b"), Id::new("c"));
    /// let mut graph = DependencyGraph::new();
    /// graph.insert(a, Node::new(Relation::Deterministic, "1", []));
    /// graph.insert(b, Node::new(Relation::Deterministic, "a * 2", [a]));
    /// graph.insert(c, Node::new(Relation::Stochastic, "normal(b, 1)", [b]));
    ///
    /// let squished = graph.squish(b).unwrap();
    /// assert!(!squished.contains(b));
    /// assert!(squished.get(c).unwrap().depends_on(a));
    /// assert_eq!(graph.len(), 3);
    /// ```
    pub fn squish(&self, target: Id) -> Result<Self, GraphError> {
        let removed = self.nodes.get(&target).ok_or(GraphError::NotFound(target))?;

        let inherited: Vec<Id> = removed
            .dependencies
            .iter()
            .copied()
            .filter(|&dependency| dependency != target)
            .collect();
        let rewired = self
            .consumers(target)
            .filter(|&consumer| consumer != target)
            .count();

        let nodes: IndexMap<Id, Node> = self
            .nodes
            .iter()
            .filter(|(name, _)| **name != target)
            .map(|(name, node)| (*name, node.splice(target, &inherited)))
            .collect();

        debug!(
            variable = target.to_string(),
            inherited = inherited.len(),
            rewired,
            remaining = nodes.len();
            "Squished variable out of the graph"
        );
        trace!(nodes:?; "Graph after squish");

        Ok(Self { nodes })
    }

    /// Squishes each of `targets` in order.
    ///
    /// # Errors
    ///
    /// Stops at the first name that is not a node of the intermediate graph
    /// and returns [`GraphError::NotFound`] for it.
    pub fn squish_all(&self, targets: impl IntoIterator<Item = Id>) -> Result<Self, GraphError> {
        targets
            .into_iter()
            .try_fold(self.clone(), |graph, target| graph.squish(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<const N: usize>(names: [&str; N]) -> [Id; N] {
        names.map(Id::new)
    }

    /// `a -> b -> c` chain where `a` is a node without dependencies.
    fn chain() -> DependencyGraph {
        let [a, b, c] = ids(["a", "b", "c"]);
        let mut graph = DependencyGraph::new();
        graph.insert(a, Node::new(Relation::Deterministic, "0", []));
        graph.insert(b, Node::new(Relation::Deterministic, "a + 1", [a]));
        graph.insert(c, Node::new(Relation::Stochastic, "normal(b, 1)", [b]));
        graph
    }

    #[test]
    fn test_relation_symbols() {
        assert_eq!(Relation::Deterministic.symbol(), "=");
        assert_eq!(Relation::Stochastic.to_string(), "~");
        assert_eq!(Relation::from_operator('='), Some(Relation::Deterministic));
    }

    #[test]
    fn test_node_deduplicates_dependencies() {
        let [mu, sigma] = ids(["mu", "sigma"]);
        let node = Node::new(Relation::Stochastic, "normal(mu, sigma)", [mu, sigma, mu]);

        let deps: Vec<Id> = node.dependencies().iter().copied().collect();
        assert_eq!(deps, vec![mu, sigma]);
    }

    #[test]
    fn test_node_head() {
        let node = Node::new(Relation::Stochastic, "student_t (3, 0, 1)", []);
        assert_eq!(node.head(), "student_t");

        let node = Node::new(Relation::Deterministic, "(a + b) * c", []);
        assert_eq!(node.head(), "(a + b) * c");
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let [a, b] = ids(["a", "b"]);
        let mut graph = DependencyGraph::new();
        graph.insert(a, Node::new(Relation::Deterministic, "1", []));
        graph.insert(b, Node::new(Relation::Deterministic, "2", []));

        let old = graph.insert(a, Node::new(Relation::Stochastic, "normal(0, 1)", []));

        assert_eq!(old.map(|n| n.relation()), Some(Relation::Deterministic));
        assert_eq!(graph.names().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(graph.get(a).unwrap().relation(), Relation::Stochastic);
    }

    #[test]
    fn test_merge_later_wins() {
        let [x] = ids(["x"]);
        let mut first = DependencyGraph::new();
        first.insert(x, Node::new(Relation::Deterministic, "1", []));
        let mut second = DependencyGraph::new();
        second.insert(x, Node::new(Relation::Stochastic, "normal(0, 1)", []));

        first.merge(second);

        assert_eq!(first.len(), 1);
        assert_eq!(first.get(x).unwrap().relation(), Relation::Stochastic);
    }

    #[test]
    fn test_leaves_and_consumers() {
        let [mu, sigma, y, z] = ids(["mu", "sigma", "y", "z"]);
        let mut graph = DependencyGraph::new();
        graph.insert(mu, Node::new(Relation::Stochastic, "normal(0, sigma)", [sigma]));
        graph.insert(y, Node::new(Relation::Stochastic, "normal(mu, sigma)", [mu, sigma]));
        graph.insert(z, Node::new(Relation::Deterministic, "y", [y]));

        assert_eq!(graph.leaves().into_iter().collect::<Vec<_>>(), vec![sigma]);
        assert_eq!(graph.consumers(sigma).collect::<Vec<_>>(), vec![mu, y]);
        assert_eq!(graph.consumers(z).count(), 0);
    }

    #[test]
    fn test_squish_chain() {
        let [a, b, c] = ids(["a", "b", "c"]);
        let graph = chain();

        let squished = graph.squish(b).expect("b is a node");

        assert_eq!(squished.len(), 2);
        assert!(!squished.contains(b));
        assert!(squished.get(a).unwrap().dependencies().is_empty());
        assert_eq!(
            squished.get(c).unwrap().dependencies().iter().copied().collect::<Vec<_>>(),
            vec![a]
        );
    }

    #[test]
    fn test_squish_missing_leaves_graph_unchanged() {
        let graph = chain();
        let before = graph.clone();

        let err = graph.squish(Id::new("missing")).unwrap_err();

        assert_eq!(err, GraphError::NotFound(Id::new("missing")));
        assert_eq!(err.to_string(), "variable `missing` not found in the dependency graph");
        assert_eq!(graph, before);
    }

    #[test]
    fn test_squish_root_removes_without_replacement() {
        let [a, b] = ids(["a", "b"]);
        let squished = chain().squish(a).unwrap();

        assert!(!squished.contains(a));
        assert!(squished.get(b).unwrap().dependencies().is_empty());
    }

    #[test]
    fn test_squish_splices_in_place_without_duplicates() {
        let [p, q, m, y] = ids(["p", "q", "m", "y"]);
        let mut graph = DependencyGraph::new();
        graph.insert(m, Node::new(Relation::Deterministic, "p + q", [p, q]));
        graph.insert(y, Node::new(Relation::Stochastic, "normal(q, m)", [q, m]));

        let squished = graph.squish(m).unwrap();

        let deps: Vec<Id> = squished.get(y).unwrap().dependencies().iter().copied().collect();
        assert_eq!(deps, vec![q, p]);
    }

    #[test]
    fn test_squish_does_not_inherit_self_dependency() {
        let [acc, x, out] = ids(["acc", "x", "out"]);
        let mut graph = DependencyGraph::new();
        graph.insert(acc, Node::new(Relation::Deterministic, "acc + x", [acc, x]));
        graph.insert(out, Node::new(Relation::Deterministic, "acc * 2", [acc]));

        let squished = graph.squish(acc).unwrap();

        assert!(!squished.get(out).unwrap().depends_on(acc));
        assert!(squished.get(out).unwrap().depends_on(x));
    }

    #[test]
    fn test_squish_all_in_order() {
        let [a, b, c] = ids(["a", "b", "c"]);
        let squished = chain().squish_all([b, a]).unwrap();

        assert_eq!(squished.names().collect::<Vec<_>>(), vec![c]);
        assert!(squished.get(c).unwrap().dependencies().is_empty());
    }

    #[test]
    fn test_squish_all_stops_at_missing() {
        let [b] = ids(["b"]);
        let graph = chain();

        let err = graph.squish_all([b, b]).unwrap_err();

        assert_eq!(err, GraphError::NotFound(b));
        assert_eq!(graph, chain());
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Random graphs over `v0..vN`; every variable is a node and may depend on
    /// any other variable, including itself.
    fn graph_strategy() -> impl Strategy<Value = DependencyGraph> {
        (1usize..8).prop_flat_map(|size| {
            proptest::collection::vec(proptest::collection::vec(0..size, 0..size), size).prop_map(
                move |adjacency| {
                    let mut graph = DependencyGraph::new();
                    for (index, deps) in adjacency.into_iter().enumerate() {
                        let deps = deps.into_iter().map(|d| Id::new(&format!("v{d}")));
                        graph.insert(
                            Id::new(&format!("v{index}")),
                            Node::new(Relation::Deterministic, "f()", deps),
                        );
                    }
                    graph
                },
            )
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// The squished name is gone and every former consumer got the splice.
    fn check_squish_rewires_consumers(
        graph: &DependencyGraph,
        pick: usize,
    ) -> Result<(), TestCaseError> {
        let target = graph.names().nth(pick % graph.len()).unwrap();
        let inherited: IndexSet<Id> = graph
            .get(target)
            .unwrap()
            .dependencies()
            .iter()
            .copied()
            .filter(|&d| d != target)
            .collect();

        let squished = graph.squish(target).unwrap();

        prop_assert!(!squished.contains(target));
        for (name, node) in squished.iter() {
            prop_assert!(!node.depends_on(target), "{name} still depends on {target}");

            let old = graph.get(name).unwrap().dependencies();
            if old.contains(&target) {
                let mut expected: IndexSet<Id> =
                    old.iter().copied().filter(|&d| d != target).collect();
                expected.extend(inherited.iter().copied());
                prop_assert_eq!(node.dependencies(), &expected);
            } else {
                prop_assert_eq!(node.dependencies(), old);
            }
        }
        Ok(())
    }

    /// A missing name fails and the graph compares equal to its snapshot.
    fn check_squish_missing_is_noop(graph: &DependencyGraph) -> Result<(), TestCaseError> {
        let before = graph.clone();
        let result = graph.squish(Id::new("not_a_node"));

        prop_assert_eq!(result, Err(GraphError::NotFound(Id::new("not_a_node"))));
        prop_assert_eq!(graph, &before);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn squish_rewires_consumers(graph in graph_strategy(), pick in 0usize..8) {
            check_squish_rewires_consumers(&graph, pick)?;
        }

        #[test]
        fn squish_missing_is_noop(graph in graph_strategy()) {
            check_squish_missing_is_noop(&graph)?;
        }
    }
}
