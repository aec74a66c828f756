//! RDF dataset - a default graph plus named graphs
//!
//! Named graph names are either IRIs or blank node identifiers (`_:label`).
//! Graphs are stored in a `BTreeMap` so iteration over graph names is always
//! lexicographic.

use crate::{Graph, Triple};
use std::collections::BTreeMap;

/// An RDF dataset: one default graph and zero or more named graphs
///
/// # Example
///
/// ```
/// use quarry_graph_ir::{Dataset, Graph, Term};
///
/// let mut graph = Graph::new();
/// graph.add_triple(
///     Term::iri("http://example.org/a"),
///     Term::iri("http://example.org/p"),
///     Term::string("x"),
/// );
///
/// let mut dataset = Dataset::new();
/// dataset.add_graph(None, graph);
/// assert_eq!(dataset.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    default_graph: Graph,
    named_graphs: BTreeMap<String, Graph>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a graph's triples to the dataset
    ///
    /// `name` of `None` targets the default graph. Adding to an existing
    /// named graph merges the triples.
    pub fn add_graph(&mut self, name: Option<&str>, graph: Graph) {
        match name {
            None => self.default_graph.extend(graph),
            Some(n) => self
                .named_graphs
                .entry(n.to_string())
                .or_default()
                .extend(graph),
        }
    }

    /// Add a single quad
    pub fn add_quad(&mut self, name: Option<&str>, triple: Triple) {
        match name {
            None => self.default_graph.add(triple),
            Some(n) => self
                .named_graphs
                .entry(n.to_string())
                .or_default()
                .add(triple),
        }
    }

    /// Get the default graph
    pub fn default_graph(&self) -> &Graph {
        &self.default_graph
    }

    /// Get a named graph by name
    pub fn named_graph(&self, name: &str) -> Option<&Graph> {
        self.named_graphs.get(name)
    }

    /// Iterate over named graphs in lexicographic name order
    pub fn named_graphs(&self) -> impl Iterator<Item = (&str, &Graph)> {
        self.named_graphs.iter().map(|(n, g)| (n.as_str(), g))
    }

    /// Graph names in lexicographic order
    pub fn graph_names(&self) -> impl Iterator<Item = &str> {
        self.named_graphs.keys().map(|n| n.as_str())
    }

    /// Total number of quads across all graphs
    pub fn len(&self) -> usize {
        self.default_graph.len() + self.named_graphs.values().map(Graph::len).sum::<usize>()
    }

    /// Check if the dataset contains no quads
    pub fn is_empty(&self) -> bool {
        self.default_graph.is_empty() && self.named_graphs.values().all(Graph::is_empty)
    }

    /// Sort every graph for deterministic output
    pub fn sort(&mut self) {
        self.default_graph.sort();
        for graph in self.named_graphs.values_mut() {
            graph.sort();
        }
    }
}
