//! Vertex/edge/polygon model (spec.md §3, §4.2).
//!
//! Vertices and edges live in flat arenas owned by
//! [`crate::environment::Environment`] and are referred to by index
//! (`VertexId`/`EdgeId`) rather than through owning references, so a
//! vertex's two incident edges and a polygon's vertex list never form an
//! ownership cycle. This follows the teacher's `point.rs`/`polygon.rs` split
//! (a polygon owning a `Vec<Point>`), generalized to an arena since vertices
//! here additionally need back-pointers to their incident edges and polygon
//! neighbours.

use crate::error::PolygonError;
use crate::geometry::Coordinate;

/// An index into an [`Environment`](crate::environment::Environment)'s
/// vertex arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub(crate) usize);

/// An index into an [`Environment`](crate::environment::Environment)'s
/// edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

/// An edge between two polygon-adjacent vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub vertex1: VertexId,
    pub vertex2: VertexId,
}

/// The polygon-specific fields of a vertex: its two polygon neighbours, its
/// two incident edges in cyclic order, and whether it is an extremity.
/// Absent (`None` on [`VertexData::polygon`]) for the free vertices created
/// for a single query's start/goal points.
#[derive(Debug, Clone, Copy)]
pub struct PolygonInfo {
    pub prev: VertexId,
    pub next: VertexId,
    pub edge1: EdgeId,
    pub edge2: EdgeId,
    pub is_extremity: bool,
}

/// A vertex: either polygon-owned (with neighbours, incident edges, and an
/// extremity flag) or a free vertex belonging to no polygon.
#[derive(Debug, Clone, Copy)]
pub struct VertexData {
    pub coordinates: Coordinate,
    pub polygon: Option<PolygonInfo>,
}

impl VertexData {
    pub fn is_extremity(&self) -> bool {
        self.polygon.map(|p| p.is_extremity).unwrap_or(false)
    }
}

/// A simple polygon: the boundary (wound counter-clockwise) or a hole
/// (wound clockwise), stored as the cyclic sequence of vertex ids that make
/// it up plus the parallel sequence of its edges (`edge_ids[i]` connects
/// `vertex_ids[i]` to `vertex_ids[(i + 1) % n]`).
#[derive(Debug, Clone)]
pub struct Polygon {
    pub is_hole: bool,
    pub vertex_ids: Vec<VertexId>,
    pub edge_ids: Vec<EdgeId>,
}

impl Polygon {
    pub fn extremities<'a>(
        &'a self,
        vertices: &'a [VertexData],
    ) -> impl Iterator<Item = VertexId> + 'a {
        self.vertex_ids
            .iter()
            .copied()
            .filter(move |&id| vertices[id.0].is_extremity())
    }
}

/// A vertex is an extremity iff its interior angle on the traversable side
/// exceeds 180°. Working through hand examples for both a CCW boundary and
/// a CW hole (see DESIGN.md) shows this reduces, in both cases, to the same
/// sign test on the raw cross product of the incident edge vectors (the
/// orientation flip between boundary and hole winding cancels against the
/// flip in which side is traversable), so no `is_hole`-dependent branch is
/// needed here.
fn classify_extremity(prev: Coordinate, this: Coordinate, next: Coordinate) -> bool {
    let incoming = this - prev;
    let outgoing = next - this;
    incoming.cross(outgoing) < 0.0
}

/// Appends one ring of coordinates to the shared vertex/edge arenas and
/// returns the [`Polygon`] describing it.
pub fn build_polygon(
    coordinates: &[Coordinate],
    is_hole: bool,
    vertices: &mut Vec<VertexData>,
    edges: &mut Vec<Edge>,
) -> Polygon {
    let n = coordinates.len();
    let base_vertex = vertices.len();
    let base_edge = edges.len();

    for &c in coordinates {
        vertices.push(VertexData {
            coordinates: c,
            polygon: None,
        });
    }
    for i in 0..n {
        let v1 = VertexId(base_vertex + i);
        let v2 = VertexId(base_vertex + (i + 1) % n);
        edges.push(Edge {
            vertex1: v1,
            vertex2: v2,
        });
    }

    for i in 0..n {
        let prev_idx = (i + n - 1) % n;
        let next_idx = (i + 1) % n;
        let prev = VertexId(base_vertex + prev_idx);
        let next = VertexId(base_vertex + next_idx);
        let edge1 = EdgeId(base_edge + prev_idx);
        let edge2 = EdgeId(base_edge + i);
        let is_extremity =
            classify_extremity(coordinates[prev_idx], coordinates[i], coordinates[next_idx]);
        vertices[base_vertex + i].polygon = Some(PolygonInfo {
            prev,
            next,
            edge1,
            edge2,
            is_extremity,
        });
    }

    Polygon {
        is_hole,
        vertex_ids: (0..n).map(|i| VertexId(base_vertex + i)).collect(),
        edge_ids: (0..n).map(|i| EdgeId(base_edge + i)).collect(),
    }
}

/// Signed area via the shoelace formula: positive for a counter-clockwise
/// ring, negative for clockwise.
fn signed_area(coordinates: &[Coordinate]) -> f64 {
    let n = coordinates.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = coordinates[i];
        let b = coordinates[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Orientation of the turn `p -> q -> r`: `1` counter-clockwise, `-1`
/// clockwise, `0` collinear. Adapted from the teacher's
/// `polygon.rs::orientation`, generalized from integer to float coordinates.
fn orientation(p: Coordinate, q: Coordinate, r: Coordinate) -> i32 {
    let val = (q - p).cross(r - q);
    if val.abs() < 1e-9 {
        0
    } else if val > 0.0 {
        1
    } else {
        -1
    }
}

fn on_segment(p: Coordinate, q: Coordinate, r: Coordinate) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Adapted from the teacher's `polygon.rs::intersects_segment`: whether two
/// closed segments share any point, including collinear overlap.
fn segments_intersect(
    (a1, a2): (Coordinate, Coordinate),
    (b1, b2): (Coordinate, Coordinate),
) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(a1, b1, a2))
        || (o2 == 0 && on_segment(a1, b2, a2))
        || (o3 == 0 && on_segment(b1, a1, b2))
        || (o4 == 0 && on_segment(b1, a2, b2))
}

/// Validates a ring of coordinates per `store(..., validate: true)`: at
/// least 3 vertices, no degenerate repeated vertex, no self-intersection
/// among non-adjacent edges, and the winding required for its role (CCW
/// boundary, CW hole).
pub fn validate_ring(coordinates: &[Coordinate], is_hole: bool) -> Result<(), PolygonError> {
    let n = coordinates.len();
    if n < 3 {
        return Err(PolygonError::TooFewVertices(n));
    }
    for i in 0..n {
        if coordinates[i] == coordinates[(i + 1) % n] {
            return Err(PolygonError::DegenerateVertices);
        }
    }

    let area = signed_area(coordinates);
    if area == 0.0 {
        return Err(PolygonError::DegenerateVertices);
    }
    if is_hole && area > 0.0 {
        return Err(PolygonError::HoleNotClockwise);
    }
    if !is_hole && area < 0.0 {
        return Err(PolygonError::BoundaryNotCounterClockwise);
    }

    for i in 0..n {
        let edge_a = (coordinates[i], coordinates[(i + 1) % n]);
        for j in (i + 1)..n {
            let adjacent = j == (i + 1) % n || i == (j + 1) % n;
            if adjacent {
                continue;
            }
            let edge_b = (coordinates[j], coordinates[(j + 1) % n]);
            if segments_intersect(edge_a, edge_b) {
                return Err(PolygonError::SelfIntersecting);
            }
        }
    }
    Ok(())
}
