//! Measure dependency graph.
//!
//! One node per measure (keyed by full name), one edge per resolved
//! reference: `A → B` means A's expression references B. The graph backs
//! usage propagation and answers dependency queries after construction.

use crate::model::{Diagnostic, Measure};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct MeasureGraph {
    /// Node weights are measure full names.
    graph: DiGraph<String, ()>,

    /// Index: full name → NodeIndex.
    index: HashMap<String, NodeIndex>,
}

impl MeasureGraph {
    /// Build the graph from a report's measures.
    ///
    /// Raw references that name a measure not present in the mapping get
    /// no edge; each is recorded as a [`Diagnostic::UnresolvedReference`].
    /// Self-references produce a self-loop, matching the raw data.
    pub(crate) fn build(
        measures: &BTreeMap<String, Measure>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::with_capacity(measures.len());

        for full_name in measures.keys() {
            let node = graph.add_node(full_name.clone());
            index.insert(full_name.clone(), node);
        }

        for (full_name, measure) in measures {
            let source = index[full_name];
            for reference in &measure.referenced_measures {
                match index.get(reference) {
                    Some(&target) => {
                        graph.add_edge(source, target, ());
                    }
                    None => diagnostics.push(Diagnostic::UnresolvedReference {
                        measure: full_name.clone(),
                        reference: reference.clone(),
                    }),
                }
            }
        }

        Self { graph, index }
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.index.contains_key(full_name)
    }

    pub fn measure_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Full names of measures that `full_name`'s expression references.
    pub fn dependencies_of(&self, full_name: &str) -> Vec<&str> {
        self.neighbors(full_name, Direction::Outgoing)
    }

    /// Full names of measures whose expressions reference `full_name`.
    pub fn dependents_of(&self, full_name: &str) -> Vec<&str> {
        self.neighbors(full_name, Direction::Incoming)
    }

    fn neighbors(&self, full_name: &str, direction: Direction) -> Vec<&str> {
        let Some(&node) = self.index.get(full_name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|neighbor| self.graph[neighbor].as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// All resolved (source, target) edges.
    pub(crate) fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
            )
        })
    }
}
