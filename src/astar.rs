//! Modified A* (spec.md §4.7, Component G).
//!
//! Grounded in the teacher's `search/simple.rs` A* (a `BinaryHeap` of
//! `SearchNode`s ordered by reversed `f_score` for a min-heap, expanded via
//! a visited/best-`g` map), generalized with the tie-break rule spec.md
//! requires (smaller `g`, then smaller out-degree) and run from `goal`
//! toward `start` per the one-way edge augmentation `find_shortest_path`
//! sets up.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::graph::DirectedHeuristicGraph;
use crate::polygon::VertexId;

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenEntry {
    f_score: f64,
    g_score: f64,
    out_degree: usize,
    vertex: VertexId,
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse every comparison so the vertex
        // with the smallest f_score (then smallest g, then smallest
        // out-degree) is popped first.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.g_score.total_cmp(&self.g_score))
            .then_with(|| other.out_degree.cmp(&self.out_degree))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Runs A* on `graph` from `source` to `target`, using the admissible
/// Euclidean heuristic `heuristic(v) = distance(v, target)`. Returns the
/// vertex sequence from `source` to `target` and the total path distance,
/// or `None` if `target` is unreachable.
pub fn modified_a_star(
    graph: &DirectedHeuristicGraph,
    heuristic: impl Fn(VertexId) -> f64,
    source: VertexId,
    target: VertexId,
) -> Option<(Vec<VertexId>, f64)> {
    let mut best_g: HashMap<VertexId, f64> = HashMap::new();
    let mut came_from: HashMap<VertexId, VertexId> = HashMap::new();
    let mut open = BinaryHeap::new();

    best_g.insert(source, 0.0);
    open.push(OpenEntry {
        f_score: heuristic(source),
        g_score: 0.0,
        out_degree: graph.out_degree(source),
        vertex: source,
    });

    while let Some(current) = open.pop() {
        if current.vertex == target {
            return Some((reconstruct_path(&came_from, target), current.g_score));
        }
        // Stale entry: a cheaper path to this vertex was already expanded.
        if current.g_score > *best_g.get(&current.vertex).unwrap_or(&f64::INFINITY) {
            continue;
        }

        for &(neighbour, weight) in graph.neighbours_of(current.vertex) {
            let tentative_g = current.g_score + weight;
            if tentative_g < *best_g.get(&neighbour).unwrap_or(&f64::INFINITY) {
                best_g.insert(neighbour, tentative_g);
                came_from.insert(neighbour, current.vertex);
                open.push(OpenEntry {
                    f_score: tentative_g + heuristic(neighbour),
                    g_score: tentative_g,
                    out_degree: graph.out_degree(neighbour),
                    vertex: neighbour,
                });
            }
        }
    }

    None
}

fn reconstruct_path(came_from: &HashMap<VertexId, VertexId>, target: VertexId) -> Vec<VertexId> {
    let mut path = vec![target];
    let mut current = target;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;

    fn v(i: usize) -> VertexId {
        VertexId(i)
    }

    #[test]
    fn finds_shortest_path_through_cheaper_detour() {
        // 0 -> 1 -> 3 costs 1 + 1 = 2; 0 -> 2 -> 3 costs 5 + 5 = 10.
        let mut graph = DirectedHeuristicGraph::new();
        graph.add_directed_edge(v(0), v(1), 1.0);
        graph.add_directed_edge(v(1), v(3), 1.0);
        graph.add_directed_edge(v(0), v(2), 5.0);
        graph.add_directed_edge(v(2), v(3), 5.0);

        let coords: HashMap<VertexId, Coordinate> = [
            (v(0), Coordinate::new(0.0, 0.0)),
            (v(1), Coordinate::new(1.0, 0.0)),
            (v(2), Coordinate::new(5.0, 0.0)),
            (v(3), Coordinate::new(2.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let target_coord = coords[&v(3)];
        let heuristic = move |u: VertexId| coords[&u].distance(target_coord);

        let (path, distance) = modified_a_star(&graph, heuristic, v(0), v(3)).unwrap();
        assert_eq!(path, vec![v(0), v(1), v(3)]);
        assert_eq!(distance, 2.0);
    }

    #[test]
    fn unreachable_target_returns_none() {
        let mut graph = DirectedHeuristicGraph::new();
        graph.add_directed_edge(v(0), v(1), 1.0);
        assert!(modified_a_star(&graph, |_| 0.0, v(0), v(2)).is_none());
    }
}
