//! The polygonal environment: storage, preprocessing, and path queries
//! (spec.md §4.5, §4.6, Components E and F).
//!
//! Grounded in the teacher's `board.rs` (a `Board` owning a flat
//! `Vec<Polygon>` and the pathfinders that run over it), generalized from a
//! GUI-facing demo board into the library's single stateful entry point.

use std::collections::HashSet;

use log::{debug, trace};

use crate::angle::{find_within_range, inside_polygon, pseudo_angle};
use crate::astar::modified_a_star;
use crate::error::{PathError, PolygonError};
use crate::geometry::Coordinate;
use crate::graph::DirectedHeuristicGraph;
use crate::polygon::{build_polygon, Edge, EdgeId, Polygon, VertexData, VertexId};
use crate::visibility::{find_visible, CandidateInfo, Translated};

/// A polygonal map: one counter-clockwise boundary, zero or more clockwise
/// holes, plus the precomputed visibility graph over their extremities.
pub struct Environment {
    vertices: Vec<VertexData>,
    edges: Vec<Edge>,
    boundary: Polygon,
    holes: Vec<Polygon>,
    all_extremities: Vec<VertexId>,
    prepared: bool,
    graph: DirectedHeuristicGraph,
    origin: Coordinate,
    translated: Vec<Translated>,
}

impl Environment {
    /// Loads the boundary and hole rings. With `validate` set, rejects
    /// malformed polygons (too few vertices, self-intersection, wrong
    /// winding) with [`PolygonError`].
    pub fn store(
        boundary: &[Coordinate],
        holes: &[Vec<Coordinate>],
        validate: bool,
    ) -> Result<Self, PolygonError> {
        if validate {
            crate::polygon::validate_ring(boundary, false)?;
            for hole in holes {
                crate::polygon::validate_ring(hole, true)?;
            }
        }

        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        let boundary_polygon = build_polygon(boundary, false, &mut vertices, &mut edges);
        let hole_polygons: Vec<Polygon> = holes
            .iter()
            .map(|h| build_polygon(h, true, &mut vertices, &mut edges))
            .collect();

        let all_extremities: Vec<VertexId> = std::iter::once(&boundary_polygon)
            .chain(hole_polygons.iter())
            .flat_map(|p| p.extremities(&vertices).collect::<Vec<_>>())
            .collect();

        let translated = vec![
            Translated {
                vector: crate::geometry::Vector::ZERO,
                distance: 0.0,
                angle: None,
            };
            vertices.len()
        ];

        Ok(Self {
            vertices,
            edges,
            boundary: boundary_polygon,
            holes: hole_polygons,
            all_extremities,
            prepared: false,
            graph: DirectedHeuristicGraph::new(),
            origin: Coordinate::ORIGIN,
            translated,
        })
    }

    /// Recomputes every vertex's translated fields (position, distance,
    /// pseudo-angle) relative to a new origin. The source computes these
    /// lazily per vertex behind a dirty flag; this recomputes the whole
    /// cache eagerly on every call, same asymptotic cost, simpler to reason
    /// about with an arena of plain data instead of per-vertex state.
    pub fn translate(&mut self, origin: Coordinate) {
        self.origin = origin;
        self.translated.resize(
            self.vertices.len(),
            Translated {
                vector: crate::geometry::Vector::ZERO,
                distance: 0.0,
                angle: None,
            },
        );
        for (i, vertex) in self.vertices.iter().enumerate() {
            let vector = vertex.coordinates - origin;
            self.translated[i] = Translated {
                vector,
                distance: vector.length(),
                angle: pseudo_angle(vector),
            };
        }
    }

    fn all_edge_ids(&self) -> HashSet<EdgeId> {
        (0..self.edges.len()).map(EdgeId).collect()
    }

    fn candidate_info(&self, id: VertexId) -> CandidateInfo {
        let data = &self.vertices[id.0];
        CandidateInfo {
            id,
            translated: self.translated[id.0],
            is_extremity: data.is_extremity(),
            polygon_neighbours: data.polygon.map(|p| (p.prev, p.next)),
            incident_edges: data.polygon.map(|p| (p.edge1, p.edge2)),
        }
    }

    fn find_visible_from(&self, candidates: Vec<VertexId>, edges: HashSet<EdgeId>) -> Vec<(VertexId, f64)> {
        let infos = candidates.into_iter().map(|id| self.candidate_info(id)).collect();
        find_visible(
            infos,
            edges,
            |id| self.edges[id.0],
            |id| self.translated[id.0],
            |id| {
                let info = self.vertices[id.0]
                    .polygon
                    .expect("edge endpoints are always polygon-owned");
                (info.prev, info.next, info.edge1, info.edge2, info.is_extremity)
            },
        )
    }

    /// Builds the static visibility graph over all extremities. Idempotent:
    /// calling it again recomputes the same graph from scratch.
    pub fn prepare(&mut self) {
        self.graph = DirectedHeuristicGraph::new();
        let extremities = self.all_extremities.clone();
        let mut processed: HashSet<VertexId> = HashSet::new();

        for &x in &extremities {
            self.translate(self.vertices[x.0].coordinates);
            let info = self.vertices[x.0]
                .polygon
                .expect("extremities are always polygon-owned");

            // spec.md §4.5 step 2: candidates are the *remaining* (not yet
            // processed) extremities minus x's already-confirmed graph
            // neighbours, not all extremities. An already-processed y must
            // not be re-tested against x: "in front of" is directional, so
            // an edge {x, y} that Property One removed during y's turn
            // could otherwise be wrongly re-added during x's turn.
            let mut candidates: HashSet<VertexId> = extremities
                .iter()
                .copied()
                .filter(|&id| {
                    id != x && !processed.contains(&id) && self.graph.edge_weight(x, id).is_none()
                })
                .collect();

            let mut visible: Vec<(VertexId, f64)> = Vec::new();
            for neighbour in [info.prev, info.next] {
                if candidates.remove(&neighbour) {
                    let d = self.translated[neighbour.0].distance;
                    visible.push((neighbour, d));
                }
            }

            let phi_prev = self.translated[info.prev.0].angle;
            let phi_next = self.translated[info.next.0].angle;
            if let (Some(phi1), Some(phi2)) = (phi_prev, phi_next) {
                // Interior-angle prune: candidates in the <180° obstacle-side
                // cone at x cannot be seen across x.
                let blocked: HashSet<VertexId> = find_within_range(
                    phi1,
                    phi2,
                    candidates
                        .iter()
                        .map(|&id| (id, self.translated[id.0].angle)),
                    true,
                )
                .into_iter()
                .collect();
                candidates.retain(|id| !blocked.contains(id));

                // Property One prune: rotate the neighbour cone by 180° to
                // find extremities "in front of" x on the traversable side;
                // scan *all* extremities (not just remaining candidates)
                // since an already-processed extremity may still carry a
                // graph edge to x that needs removing.
                let rotated1 = (phi1 + 2.0).rem_euclid(4.0);
                let rotated2 = (phi2 + 2.0).rem_euclid(4.0);
                let front_cone: Vec<VertexId> = find_within_range(
                    rotated1,
                    rotated2,
                    extremities.iter().filter(|&&id| id != x).map(|&id| {
                        let vector = self.vertices[id.0].coordinates - self.origin;
                        (id, pseudo_angle(vector))
                    }),
                    true,
                );
                for y in front_cone {
                    self.graph.remove_undirected_edge(x, y);
                    candidates.remove(&y);
                }
            }

            let edges_to_check: HashSet<EdgeId> = self
                .all_edge_ids()
                .into_iter()
                .filter(|id| *id != info.edge1 && *id != info.edge2)
                .collect();

            let newly_visible = self.find_visible_from(candidates.into_iter().collect(), edges_to_check);
            visible.extend(newly_visible);

            debug!(
                "prepare: extremity {:?} sees {} vertices",
                x,
                visible.len()
            );

            for (v, d) in visible {
                self.graph.add_undirected_edge(x, v, d);
            }

            processed.insert(x);
        }

        self.prepared = true;
    }

    /// `true` if `(x, y)` lies inside the boundary and outside every hole.
    /// The boundary itself counts as inside the map; a hole's own boundary
    /// counts as accepted too (not as "inside the hole"), per the
    /// resolution of spec.md §9's open question.
    pub fn within_map(&self, point: Coordinate) -> bool {
        let boundary_coords: Vec<(f64, f64)> = self
            .boundary
            .vertex_ids
            .iter()
            .map(|id| {
                let c = self.vertices[id.0].coordinates;
                (c.x, c.y)
            })
            .collect();
        if !inside_polygon(point.x, point.y, &boundary_coords, true) {
            return false;
        }
        for hole in &self.holes {
            let hole_coords: Vec<(f64, f64)> = hole
                .vertex_ids
                .iter()
                .map(|id| {
                    let c = self.vertices[id.0].coordinates;
                    (c.x, c.y)
                })
                .collect();
            if inside_polygon(point.x, point.y, &hole_coords, false) {
                return false;
            }
        }
        true
    }

    fn push_free_vertex(&mut self, coordinates: Coordinate) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(VertexData {
            coordinates,
            polygon: None,
        });
        self.translated.push(Translated {
            vector: crate::geometry::Vector::ZERO,
            distance: 0.0,
            angle: None,
        });
        id
    }

    fn truncate_to(&mut self, len: usize) {
        self.vertices.truncate(len);
        self.translated.truncate(len);
    }

    /// Finds the shortest Euclidean path from `start` to `goal` through the
    /// traversable region, preparing the visibility graph first if needed.
    pub fn find_shortest_path(
        &mut self,
        start: Coordinate,
        goal: Coordinate,
    ) -> Result<(Vec<Coordinate>, f64), PathError> {
        if !self.within_map(start) || !self.within_map(goal) {
            return Err(PathError::OutOfMap);
        }
        if start == goal {
            return Ok((vec![start, goal], 0.0));
        }
        if !self.prepared {
            self.prepare();
        }

        let base_len = self.vertices.len();
        let start_id = self.push_free_vertex(start);
        let goal_id = self.push_free_vertex(goal);

        let mut temp_graph = self.graph.shallow_clone();
        let all_edges = self.all_edge_ids();

        self.translate(start);
        let mut from_start_candidates: Vec<VertexId> = self.all_extremities.clone();
        from_start_candidates.push(goal_id);
        let visible_from_start = self.find_visible_from(from_start_candidates, all_edges.clone());

        if let Some(&(_, d)) = visible_from_start.iter().find(|(v, _)| *v == goal_id) {
            debug!("find_shortest_path: direct line of sight, distance {}", d);
            self.truncate_to(base_len);
            return Ok((vec![start, goal], d));
        }

        for (v, d) in &visible_from_start {
            if *v != goal_id {
                temp_graph.add_directed_edge(*v, start_id, *d);
            }
        }

        self.translate(goal);
        let visible_from_goal = self.find_visible_from(self.all_extremities.clone(), all_edges);
        for (v, d) in &visible_from_goal {
            temp_graph.add_directed_edge(goal_id, *v, *d);
        }

        debug!("find_shortest_path: direct line of sight unavailable, running A*");

        let start_coord = start;
        let heuristic = {
            let vertices = &self.vertices;
            move |v: VertexId| {
                if v == start_id {
                    0.0
                } else {
                    vertices[v.0].coordinates.distance(start_coord)
                }
            }
        };

        let result = modified_a_star(&temp_graph, heuristic, goal_id, start_id);
        self.truncate_to(base_len);

        match result {
            None => {
                trace!("find_shortest_path: no path found");
                Err(PathError::NoPath)
            }
            Some((mut vertex_path, distance)) => {
                vertex_path.reverse(); // A* runs goal -> start; reverse for start -> goal.
                let mut path: Vec<Coordinate> = vertex_path
                    .iter()
                    .map(|&v| {
                        if v == start_id {
                            start
                        } else if v == goal_id {
                            goal
                        } else {
                            self.vertices[v.0].coordinates
                        }
                    })
                    .collect();
                // Guaranteed equal to `start`/`goal` already, but pin the
                // literal values so callers never see an internal vertex's
                // coordinates stand in for the query's own endpoints.
                if let Some(first) = path.first_mut() {
                    *first = start;
                }
                if let Some(last) = path.last_mut() {
                    *last = goal;
                }
                Ok((path, distance))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coordinate {
        Coordinate::new(x, y)
    }

    /// A simplified version of the grid-derived map from spec.md §8: a
    /// plain rectangular boundary (dropping the boundary-only notches,
    /// which none of the exercised test points interact with) plus the two
    /// interior holes built from obstacle cells
    /// `(5,5),(5,6),(6,6),(6,7),(7,7)` and `(7,5)`.
    fn grid_environment() -> Environment {
        let boundary = vec![c(0.0, 0.0), c(19.0, 0.0), c(19.0, 10.0), c(0.0, 10.0)];
        let hole1 = vec![
            c(5.0, 5.0),
            c(5.0, 7.0),
            c(6.0, 7.0),
            c(6.0, 8.0),
            c(8.0, 8.0),
            c(8.0, 7.0),
            c(7.0, 7.0),
            c(7.0, 6.0),
            c(6.0, 6.0),
            c(6.0, 5.0),
        ];
        let hole2 = vec![c(7.0, 5.0), c(7.0, 6.0), c(8.0, 6.0), c(8.0, 5.0)];
        Environment::store(&boundary, &[hole1, hole2], true).unwrap()
    }

    #[test]
    fn identical_start_and_goal_is_zero_distance() {
        let mut env = grid_environment();
        let (path, distance) = env.find_shortest_path(c(15.0, 5.0), c(15.0, 5.0)).unwrap();
        assert_eq!(path, vec![c(15.0, 5.0), c(15.0, 5.0)]);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn direct_line_of_sight_is_used_when_available() {
        let mut env = grid_environment();
        let (path, distance) = env.find_shortest_path(c(15.0, 5.0), c(15.0, 6.0)).unwrap();
        assert_eq!(path, vec![c(15.0, 5.0), c(15.0, 6.0)]);
        assert_eq!(distance, 1.0);

        let mut env = grid_environment();
        let (path, distance) = env.find_shortest_path(c(15.0, 5.0), c(16.0, 6.0)).unwrap();
        assert_eq!(path, vec![c(15.0, 5.0), c(16.0, 6.0)]);
        assert!((distance - 2.0f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn straight_vertical_run_has_no_obstacles_in_the_way() {
        let mut env = grid_environment();
        let (path, distance) = env.find_shortest_path(c(15.0, 0.0), c(15.0, 6.0)).unwrap();
        assert_eq!(path, vec![c(15.0, 0.0), c(15.0, 6.0)]);
        assert_eq!(distance, 6.0);
    }

    #[test]
    fn far_side_of_map_is_also_a_direct_line_of_sight() {
        let mut env = grid_environment();
        let (path, distance) = env.find_shortest_path(c(7.0, 8.0), c(7.0, 9.0)).unwrap();
        assert_eq!(path, vec![c(7.0, 8.0), c(7.0, 9.0)]);
        assert_eq!(distance, 1.0);
    }

    #[test]
    fn rejects_points_outside_the_rectangle() {
        let mut env = grid_environment();
        assert_eq!(
            env.find_shortest_path(c(-1.0, 5.0), c(17.0, 0.5)),
            Err(PathError::OutOfMap)
        );
        assert_eq!(
            env.find_shortest_path(c(20.0, 5.0), c(17.0, 0.5)),
            Err(PathError::OutOfMap)
        );
        assert_eq!(
            env.find_shortest_path(c(1.0, 11.0), c(17.0, 0.5)),
            Err(PathError::OutOfMap)
        );
    }

    #[test]
    fn rejects_points_strictly_inside_a_hole() {
        let mut env = grid_environment();
        assert_eq!(
            env.find_shortest_path(c(6.5, 6.5), c(1.0, 1.0)),
            Err(PathError::OutOfMap)
        );
    }

    #[test]
    fn accepts_points_on_a_hole_boundary() {
        let env = grid_environment();
        assert!(env.within_map(c(7.0, 5.5)));
    }

    #[test]
    fn prepare_is_idempotent() {
        let mut env = grid_environment();
        env.prepare();
        let first: Vec<_> = env
            .all_extremities
            .iter()
            .map(|&v| env.graph.neighbours_of(v).to_vec())
            .collect();
        env.prepare();
        let second: Vec<_> = env
            .all_extremities
            .iter()
            .map(|&v| env.graph.neighbours_of(v).to_vec())
            .collect();
        for (mut a, mut b) in first.into_iter().zip(second.into_iter()) {
            a.sort_by(|x, y| x.0.cmp(&y.0));
            b.sort_by(|x, y| x.0.cmp(&y.0));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn distance_equality_holds_for_every_graph_edge() {
        // spec.md §8: for every edge (u, v, w) in the prepared graph,
        // w == Euclidean(u, v).
        let mut env = grid_environment();
        env.prepare();
        for &u in &env.all_extremities {
            let u_coords = env.vertices[u.0].coordinates;
            for &(v, w) in env.graph.neighbours_of(u) {
                let v_coords = env.vertices[v.0].coordinates;
                assert!((u_coords.distance(v_coords) - w).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn graph_is_symmetric_after_prepare() {
        // Visibility symmetry (spec.md §8): every edge the graph records is
        // undirected by construction, so u is a neighbour of v iff v is a
        // neighbour of u.
        let mut env = grid_environment();
        env.prepare();
        for &u in &env.all_extremities {
            for &(v, w) in env.graph.neighbours_of(u) {
                let back = env.graph.neighbours_of(v);
                assert!(back.iter().any(|&(x, w2)| x == u && (w2 - w).abs() < 1e-9));
            }
        }
    }
}
