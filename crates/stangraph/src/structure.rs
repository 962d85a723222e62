//! Whole-graph analysis on top of petgraph.
//!
//! A [`DependencyGraph`] only answers local questions (a node's direct
//! dependencies). [`DependencyStructure`] converts it into a petgraph
//! [`DiGraph`] with one edge per `dependency -> variable` relation and
//! answers transitive ones: which variables feed into a given variable, and
//! whether the graph is acyclic.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use petgraph::{
    Direction,
    algo::is_cyclic_directed,
    graph::{DiGraph, NodeIndex},
    visit::{Bfs, Reversed, Walker},
};

use stangraph_core::{graph::DependencyGraph, identifier::Id};

/// Directed view of a dependency graph, edges pointing from a dependency
/// to the variable that uses it.
#[derive(Debug)]
pub struct DependencyStructure {
    graph: DiGraph<Id, ()>,
    node_id_map: HashMap<Id, NodeIndex>,
}

impl DependencyStructure {
    /// Builds the structure for `dependencies`, including leaves.
    pub fn from_graph(dependencies: &DependencyGraph) -> Self {
        let mut structure = Self {
            graph: DiGraph::new(),
            node_id_map: HashMap::new(),
        };

        for (name, node) in dependencies.iter() {
            let target = structure.node_index(name);
            for &dependency in node.dependencies() {
                let source = structure.node_index(dependency);
                structure.graph.add_edge(source, target, ());
            }
        }

        debug!(
            nodes = structure.graph.node_count(),
            edges = structure.graph.edge_count();
            "Dependency structure built"
        );
        structure
    }

    fn node_index(&mut self, id: Id) -> NodeIndex {
        *self
            .node_id_map
            .entry(id)
            .or_insert_with(|| self.graph.add_node(id))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether some variable depends on itself, directly or transitively.
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Variables that feed into `name`, directly or transitively.
    ///
    /// `name` itself is only included when it lies on a cycle. Unknown names
    /// have no upstream.
    pub fn upstream(&self, name: Id) -> BTreeSet<String> {
        let Some(&start) = self.node_id_map.get(&name) else {
            return BTreeSet::new();
        };

        let reversed = Reversed(&self.graph);
        let mut upstream: BTreeSet<String> = Bfs::new(reversed, start)
            .iter(reversed)
            .filter(|&index| index != start)
            .map(|index| self.graph[index].to_string())
            .collect();

        if self.reaches(start, start) {
            upstream.insert(name.to_string());
        }
        upstream
    }

    /// Whether a non-empty path leads from `from` to `to`.
    fn reaches(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(from, Direction::Outgoing)
            .any(|next| {
                Bfs::new(&self.graph, next)
                    .iter(&self.graph)
                    .any(|index| index == to)
            })
    }
}

#[cfg(test)]
mod tests {
    use stangraph_core::graph::{Node, Relation};

    use super::*;

    fn graph(entries: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (name, deps) in entries {
            graph.insert(
                Id::new(name),
                Node::new(
                    Relation::Deterministic,
                    deps.join(" + "),
                    deps.iter().map(|dep| Id::new(dep)),
                ),
            );
        }
        graph
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_counts_include_leaves() {
        let structure = DependencyStructure::from_graph(&graph(&[
            ("y", &["mu", "sigma"]),
            ("mu", &["alpha"]),
        ]));

        assert_eq!(structure.node_count(), 4);
        assert_eq!(structure.edge_count(), 3);
    }

    #[test]
    fn test_upstream_is_transitive() {
        let structure = DependencyStructure::from_graph(&graph(&[
            ("y", &["mu", "sigma"]),
            ("mu", &["alpha", "beta"]),
        ]));

        assert_eq!(
            structure.upstream(Id::new("y")),
            set(&["alpha", "beta", "mu", "sigma"])
        );
        assert_eq!(structure.upstream(Id::new("mu")), set(&["alpha", "beta"]));
        assert!(structure.upstream(Id::new("alpha")).is_empty());
        assert!(structure.upstream(Id::new("structure_unknown")).is_empty());
    }

    #[test]
    fn test_cycle_check() {
        let acyclic = DependencyStructure::from_graph(&graph(&[("b", &["a"]), ("c", &["b"])]));
        assert!(!acyclic.has_cycle());

        let cyclic = DependencyStructure::from_graph(&graph(&[("a", &["b"]), ("b", &["a"])]));
        assert!(cyclic.has_cycle());
        assert_eq!(cyclic.upstream(Id::new("a")), set(&["a", "b"]));
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let structure = DependencyStructure::from_graph(&graph(&[("x", &["x", "a"])]));

        assert!(structure.has_cycle());
        assert_eq!(structure.upstream(Id::new("x")), set(&["a", "x"]));
    }
}
