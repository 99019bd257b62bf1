//! The static visibility graph and its directed, weighted adjacency
//! structure (spec.md §4.3, Component C).
//!
//! Modelled the way the teacher's `search/visibility.rs` builds its
//! adjacency (a `HashMap` keyed by vertex), generalized from undirected
//! pairs to a directed weighted multigraph since `find_shortest_path`
//! needs one-way edges for its per-query augmentation.

use std::collections::HashMap;

use crate::polygon::VertexId;

/// A directed, weighted adjacency structure over [`VertexId`]s.
///
/// Stores, for each vertex with at least one outgoing edge, the list of
/// `(neighbour, weight)` pairs reachable directly from it. An "undirected"
/// edge is just a pair of directed edges, one each way, with the same
/// weight.
#[derive(Debug, Clone, Default)]
pub struct DirectedHeuristicGraph {
    adjacency: HashMap<VertexId, Vec<(VertexId, f64)>>,
}

impl DirectedHeuristicGraph {
    pub fn new() -> Self {
        Self {
            adjacency: HashMap::new(),
        }
    }

    /// Adds a one-way edge `from -> to` with the given weight. Replaces any
    /// existing edge between the same pair in the same direction.
    pub fn add_directed_edge(&mut self, from: VertexId, to: VertexId, weight: f64) {
        let neighbours = self.adjacency.entry(from).or_default();
        if let Some(entry) = neighbours.iter_mut().find(|(v, _)| *v == to) {
            entry.1 = weight;
        } else {
            neighbours.push((to, weight));
        }
    }

    pub fn add_multiple_directed_edges(&mut self, edges: impl IntoIterator<Item = (VertexId, VertexId, f64)>) {
        for (from, to, weight) in edges {
            self.add_directed_edge(from, to, weight);
        }
    }

    /// Adds edges `a -> b` and `b -> a`, both with the given weight.
    pub fn add_undirected_edge(&mut self, a: VertexId, b: VertexId, weight: f64) {
        self.add_directed_edge(a, b, weight);
        self.add_directed_edge(b, a, weight);
    }

    pub fn add_multiple_undirected_edges(
        &mut self,
        edges: impl IntoIterator<Item = (VertexId, VertexId, f64)>,
    ) {
        for (a, b, weight) in edges {
            self.add_undirected_edge(a, b, weight);
        }
    }

    /// Removes both directions of the edge between `a` and `b`, if present.
    pub fn remove_undirected_edge(&mut self, a: VertexId, b: VertexId) {
        if let Some(neighbours) = self.adjacency.get_mut(&a) {
            neighbours.retain(|(v, _)| *v != b);
        }
        if let Some(neighbours) = self.adjacency.get_mut(&b) {
            neighbours.retain(|(v, _)| *v != a);
        }
    }

    pub fn remove_multiple_undirected_edges(&mut self, edges: impl IntoIterator<Item = (VertexId, VertexId)>) {
        for (a, b) in edges {
            self.remove_undirected_edge(a, b);
        }
    }

    /// The `(neighbour, weight)` pairs directly reachable from `vertex`.
    pub fn neighbours_of(&self, vertex: VertexId) -> &[(VertexId, f64)] {
        self.adjacency
            .get(&vertex)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn out_degree(&self, vertex: VertexId) -> usize {
        self.neighbours_of(vertex).len()
    }

    /// Returns `true` if `to` is a direct neighbour of `from`, along with
    /// its weight.
    pub fn edge_weight(&self, from: VertexId, to: VertexId) -> Option<f64> {
        self.neighbours_of(from)
            .iter()
            .find(|(v, _)| *v == to)
            .map(|(_, w)| *w)
    }

    /// A full duplicate of the graph. The spec's "shallow clone" (a cheap
    /// copy-on-write view sharing unmodified buckets with the original) is
    /// an optimization this crate does not implement; materializing a
    /// complete duplicate is the sanctioned alternative for maps of the
    /// size this crate deals with (spec.md §9, Design Notes).
    pub fn shallow_clone(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexId {
        VertexId(i)
    }

    #[test]
    fn undirected_edge_is_symmetric() {
        let mut g = DirectedHeuristicGraph::new();
        g.add_undirected_edge(v(0), v(1), 2.5);
        assert_eq!(g.edge_weight(v(0), v(1)), Some(2.5));
        assert_eq!(g.edge_weight(v(1), v(0)), Some(2.5));
    }

    #[test]
    fn directed_edge_is_one_way() {
        let mut g = DirectedHeuristicGraph::new();
        g.add_directed_edge(v(0), v(1), 1.0);
        assert_eq!(g.edge_weight(v(0), v(1)), Some(1.0));
        assert_eq!(g.edge_weight(v(1), v(0)), None);
    }

    #[test]
    fn remove_undirected_edge_clears_both_directions() {
        let mut g = DirectedHeuristicGraph::new();
        g.add_undirected_edge(v(0), v(1), 1.0);
        g.remove_undirected_edge(v(0), v(1));
        assert_eq!(g.edge_weight(v(0), v(1)), None);
        assert_eq!(g.edge_weight(v(1), v(0)), None);
    }

    #[test]
    fn shallow_clone_is_independent() {
        let mut g = DirectedHeuristicGraph::new();
        g.add_undirected_edge(v(0), v(1), 1.0);
        let mut cloned = g.shallow_clone();
        cloned.add_directed_edge(v(1), v(2), 3.0);
        assert_eq!(g.edge_weight(v(1), v(2)), None);
        assert_eq!(cloned.edge_weight(v(1), v(2)), Some(3.0));
    }

    #[test]
    fn out_degree_counts_neighbours() {
        let mut g = DirectedHeuristicGraph::new();
        g.add_directed_edge(v(0), v(1), 1.0);
        g.add_directed_edge(v(0), v(2), 1.0);
        assert_eq!(g.out_degree(v(0)), 2);
        assert_eq!(g.out_degree(v(1)), 0);
    }
}
