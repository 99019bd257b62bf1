//! The visibility engine: `find_visible` (spec.md §4.4, Component D).
//!
//! Grounded in the teacher's `search/visibility.rs::are_vertices_visible`,
//! which tests one pair at a time against every polygon edge; this
//! generalizes that to the set-elimination formulation the algorithm
//! actually wants (many candidates against many edges, pruning both sets as
//! it goes) so that a single pass amortizes across the whole candidate set
//! instead of repeating the full edge scan per pair.

use std::collections::HashSet;

use crate::angle::{find_within_range, lies_behind};
use crate::geometry::Vector;
use crate::polygon::{Edge, EdgeId, VertexId};

/// Per-vertex fields that depend on the current query origin: its position
/// relative to the origin, distance from it, and pseudo-angle.
#[derive(Debug, Clone, Copy)]
pub struct Translated {
    pub vector: Vector,
    pub distance: f64,
    pub angle: Option<f64>,
}

/// A candidate vertex together with the data `find_visible` needs about it:
/// its translated view, and (if it belongs to a polygon) its two
/// neighbour vertices and two incident edges, per spec.md §9's "tagged
/// variant" design note.
#[derive(Debug, Clone, Copy)]
pub struct CandidateInfo {
    pub id: VertexId,
    pub translated: Translated,
    pub is_extremity: bool,
    pub polygon_neighbours: Option<(VertexId, VertexId)>,
    pub incident_edges: Option<(EdgeId, EdgeId)>,
}

/// Runs the set-elimination visibility algorithm described in spec.md
/// §4.4: starting from candidate set `candidates` and edge set `edges`,
/// repeatedly pops an edge and eliminates candidates proven to lie behind
/// it, until either set is exhausted. Returns `(vertex, distance)` for
/// every candidate that survives, i.e. every candidate visible from the
/// translation origin.
///
/// `lookup_translated` and `lookup_edge` give O(1) access to a vertex's
/// translated fields and an edge's endpoint coordinates, respectively.
/// `lookup_polygon` gives a polygon-owned vertex's two neighbours, two
/// incident edges, and extremity flag, regardless of whether that vertex
/// is currently a member of `candidates` (every edge endpoint is
/// polygon-owned by construction, so this is always defined for them).
pub fn find_visible(
    candidates: Vec<CandidateInfo>,
    edges: HashSet<EdgeId>,
    lookup_edge: impl Fn(EdgeId) -> Edge,
    lookup_translated: impl Fn(VertexId) -> Translated,
    lookup_polygon: impl Fn(VertexId) -> (VertexId, VertexId, EdgeId, EdgeId, bool),
) -> Vec<(VertexId, f64)> {
    let mut by_id: std::collections::HashMap<VertexId, CandidateInfo> =
        candidates.into_iter().map(|c| (c.id, c)).collect();
    let mut remaining_edges = edges;
    let mut priority_edges: HashSet<EdgeId> = HashSet::new();

    while !by_id.is_empty() && !remaining_edges.is_empty() {
        let edge_id = priority_edges
            .iter()
            .next()
            .copied()
            .or_else(|| remaining_edges.iter().next().copied())
            .expect("remaining_edges is non-empty");
        priority_edges.remove(&edge_id);
        remaining_edges.remove(&edge_id);
        let edge = lookup_edge(edge_id);

        let mut v1 = edge.vertex1;
        let mut v2 = edge.vertex2;
        let mut range_less_180 = true;

        let t1_edge = lookup_translated(edge.vertex1);
        let t2_edge = lookup_translated(edge.vertex2);

        let c1 = by_id.remove(&v1);
        let c2 = by_id.remove(&v2);

        if t1_edge.distance == 0.0 {
            // o lies on e, coincident with e.v1: discard e.v1 from the
            // candidate set (a no-op above if it wasn't a candidate, e.g.
            // a hole vertex sharing coordinates with the boundary, or a
            // query point landing exactly on a polygon vertex) and
            // substitute its own two polygon neighbours as the directional
            // pair. Only e.v1's *other* incident edge (edge1, the one not
            // shared with e) is discarded. This runs regardless of whether
            // e.v1 was a candidate: the substitution and edge discard are
            // about the geometry at o, not about candidate membership.
            let (n1, n2, e1, _e2, is_extremity) = lookup_polygon(v1);
            v1 = n1;
            v2 = n2;
            range_less_180 = is_extremity;
            remaining_edges.remove(&e1);
            priority_edges.remove(&e1);
            if let Some(info) = c2 {
                by_id.insert(edge.vertex2, info);
            }
        } else if t2_edge.distance == 0.0 {
            let (n1, n2, _e1, e2, is_extremity) = lookup_polygon(v2);
            v1 = n1;
            v2 = n2;
            range_less_180 = is_extremity;
            remaining_edges.remove(&e2);
            priority_edges.remove(&e2);
            if let Some(info) = c1 {
                by_id.insert(edge.vertex1, info);
            }
        } else {
            // Neither endpoint is the degenerate (o-coincident) case: put
            // both back if they were candidates, they are not eliminated.
            if let Some(info) = c1 {
                by_id.insert(edge.vertex1, info);
            }
            if let Some(info) = c2 {
                by_id.insert(edge.vertex2, info);
            }
        }

        if by_id.is_empty() {
            break;
        }

        // v1/v2 may have been substituted by the degenerate branch above;
        // always read their translated fields fresh rather than reusing
        // t1_edge/t2_edge, which describe the original edge endpoints.
        let t1 = lookup_translated(v1);
        let t2 = lookup_translated(v2);

        let (phi1, phi2) = match (t1.angle, t2.angle) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };

        let candidate_ids: Vec<(VertexId, Option<f64>)> = by_id
            .values()
            .map(|c| (c.id, c.translated.angle))
            .collect();
        let in_range: HashSet<VertexId> = find_within_range(phi1, phi2, candidate_ids, range_less_180)
            .into_iter()
            .collect();

        let d_max = t1.distance.max(t2.distance);
        let d_min = t1.distance.min(t2.distance);

        let p1 = t1.vector;
        let p2 = t2.vector;

        let mut behind: Vec<VertexId> = Vec::new();
        let mut front: Vec<VertexId> = Vec::new();

        for &id in &in_range {
            let info = by_id[&id];
            let d = info.translated.distance;
            if d > d_max {
                behind.push(id);
            } else if d < d_min {
                front.push(id);
            } else if lies_behind(p1, p2, info.translated.vector) {
                behind.push(id);
            } else {
                front.push(id);
            }
        }

        for id in behind {
            by_id.remove(&id);
        }

        for id in front {
            if let Some(info) = by_id.get(&id) {
                if let Some((e1, e2)) = info.incident_edges {
                    if remaining_edges.contains(&e1) {
                        priority_edges.insert(e1);
                    }
                    if remaining_edges.contains(&e2) {
                        priority_edges.insert(e2);
                    }
                }
            }
        }
    }

    by_id
        .into_values()
        .map(|c| (c.id, c.translated.distance))
        .collect()
}
