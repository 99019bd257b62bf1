//! Pseudo-angle representation and the cheap predicates built on it.
//!
//! A true `atan2` is unnecessary for the visibility engine: it only ever
//! compares angles against each other, never against a physical bearing. A
//! pseudo-angle in `[0, 4)` that is strictly monotone in the true angle is
//! enough, and is computed without any trigonometry.

use crate::geometry::Vector;

/// Reduces any real number to its representative in `[0, 4)`.
fn modulo4(x: f64) -> f64 {
    x.rem_euclid(4.0)
}

/// Maps a displacement from the query origin to a pseudo-angle in `[0, 4)`,
/// or `None` if the displacement is the zero vector (the point coincides
/// with the origin, where no angle is defined).
pub fn pseudo_angle(v: Vector) -> Option<f64> {
    let (x, y) = (v.x, v.y);
    let denom = x.abs() + y.abs();
    if denom == 0.0 {
        return None;
    }
    let a = x / denom;
    let phi = if x >= 0.0 && y >= 0.0 {
        1.0 - a
    } else if x < 0.0 && y >= 0.0 {
        1.0 + (-a)
    } else if x < 0.0 && y < 0.0 {
        3.0 - a
    } else {
        3.0 + (-a)
    };
    Some(phi)
}

/// `true` if `phi` lies strictly inside the arc running counter-clockwise
/// from `lo` to `hi` (mod 4).
fn within_arc(lo: f64, hi: f64, phi: f64) -> bool {
    let span = modulo4(hi - lo);
    let offset = modulo4(phi - lo);
    offset > 0.0 && offset < span
}

/// Filters `candidates` down to those whose pseudo-angle lies strictly
/// between `phi1` and `phi2`, on the arc of length `< 2` (i.e. `< 180°`)
/// when `angle_range_less_180` is set, otherwise on the (degenerate,
/// exactly 180°) arc running directly from `phi1` to `phi2`. Candidates
/// with an undefined angle are dropped.
pub fn find_within_range<T: Copy>(
    phi1: f64,
    phi2: f64,
    candidates: impl IntoIterator<Item = (T, Option<f64>)>,
    angle_range_less_180: bool,
) -> Vec<T> {
    let (lo, hi) = if angle_range_less_180 {
        if modulo4(phi2 - phi1) < 2.0 {
            (phi1, phi2)
        } else {
            (phi2, phi1)
        }
    } else {
        (phi1, phi2)
    };
    candidates
        .into_iter()
        .filter_map(|(item, phi)| phi.filter(|&p| within_arc(lo, hi, p)).map(|_| item))
        .collect()
}

/// Given that `q` is angularly between `p1` and `p2` (relative to the
/// origin `o = (0, 0)`), decides whether the ray `o -> q` crosses the
/// segment `p1-p2` strictly before reaching `q`. Points exactly on the
/// segment are treated as *in front* (return `false`).
pub fn lies_behind(p1: Vector, p2: Vector, q: Vector) -> bool {
    let d = p2 - p1;
    let denom = q.cross(d);
    if denom == 0.0 {
        // o, q and the segment's line are parallel/collinear: cannot prove
        // q lies behind this particular edge.
        return false;
    }
    let t = p1.cross(d) / denom;
    if t <= 0.0 || t >= 1.0 {
        return false;
    }
    let s = if d.x.abs() > d.y.abs() {
        (t * q.x - p1.x) / d.x
    } else {
        (t * q.y - p1.y) / d.y
    };
    (0.0..=1.0).contains(&s)
}

/// Even-odd ray-casting point-in-polygon test. Points exactly on the
/// boundary return `border_value`.
pub fn inside_polygon(x: f64, y: f64, vertices: &[(f64, f64)], border_value: bool) -> bool {
    let n = vertices.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];

        if on_segment(x, y, xi, yi, xj, yj) {
            return border_value;
        }

        let crosses = (yi > y) != (yj > y);
        if crosses {
            let x_intersect = xi + (y - yi) * (xj - xi) / (yj - yi);
            if x < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
    let cross = (px - x1) * (y2 - y1) - (py - y1) * (x2 - x1);
    if cross.abs() > f64::EPSILON * (x2 - x1).hypot(y2 - y1).max(1.0) * 8.0 {
        return false;
    }
    px >= x1.min(x2) && px <= x1.max(x2) && py >= y1.min(y2) && py <= y1.max(y2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pseudo_angle_undefined_at_origin() {
        assert_eq!(pseudo_angle(Vector::ZERO), None);
    }

    proptest! {
        /// Angular monotonicity (spec.md §8): for any two non-zero vectors,
        /// pseudo-angle orders them the same way `atan2` does.
        #[test]
        fn pseudo_angle_matches_atan2_order(
            ax in -100.0f64..100.0, ay in -100.0f64..100.0,
            bx in -100.0f64..100.0, by in -100.0f64..100.0,
        ) {
            prop_assume!(ax != 0.0 || ay != 0.0);
            prop_assume!(bx != 0.0 || by != 0.0);
            let a = Vector::new(ax, ay);
            let b = Vector::new(bx, by);
            let phi_a = pseudo_angle(a).unwrap();
            let phi_b = pseudo_angle(b).unwrap();

            // atan2 gives (-pi, pi]; normalize to [0, 2*pi) to match
            // pseudo_angle's [0, 4) range before comparing orderings.
            let theta_a = ay.atan2(ax).rem_euclid(std::f64::consts::TAU);
            let theta_b = by.atan2(bx).rem_euclid(std::f64::consts::TAU);

            prop_assert_eq!(phi_a.partial_cmp(&phi_b), theta_a.partial_cmp(&theta_b));
        }

        /// `lies_behind` never panics and is insensitive to which endpoint
        /// of the segment is passed first (the predicate must not depend on
        /// edge traversal direction for its occlusion verdict's symmetry
        /// under swapping p1/p2, since an edge is an unordered pair of
        /// vertices for occlusion purposes).
        #[test]
        fn lies_behind_is_symmetric_in_segment_endpoints(
            p1x in -50.0f64..50.0, p1y in -50.0f64..50.0,
            p2x in -50.0f64..50.0, p2y in -50.0f64..50.0,
            qx in -50.0f64..50.0, qy in -50.0f64..50.0,
        ) {
            let p1 = Vector::new(p1x, p1y);
            let p2 = Vector::new(p2x, p2y);
            let q = Vector::new(qx, qy);
            prop_assert_eq!(lies_behind(p1, p2, q), lies_behind(p2, p1, q));
        }
    }

    #[test]
    fn pseudo_angle_monotone_per_quadrant() {
        let east = pseudo_angle(Vector::new(1.0, 0.0)).unwrap();
        let north = pseudo_angle(Vector::new(0.0, 1.0)).unwrap();
        let west = pseudo_angle(Vector::new(-1.0, 0.0)).unwrap();
        let south = pseudo_angle(Vector::new(0.0, -1.0)).unwrap();
        assert!(east < north);
        assert!(north < west);
        assert!(west < south);
        assert!(south < east + 4.0);
    }

    #[test]
    fn pseudo_angle_preserves_ccw_order_within_quadrant() {
        let a = pseudo_angle(Vector::new(1.0, 0.1)).unwrap();
        let b = pseudo_angle(Vector::new(1.0, 0.9)).unwrap();
        assert!(a < b, "angle should increase counter-clockwise");
    }

    #[test]
    fn lies_behind_true_when_strictly_between() {
        let p1 = Vector::new(-1.0, 2.0);
        let p2 = Vector::new(1.0, 2.0);
        let q = Vector::new(0.0, 4.0);
        assert!(lies_behind(p1, p2, q));
    }

    #[test]
    fn lies_behind_false_on_segment() {
        let p1 = Vector::new(-1.0, 2.0);
        let p2 = Vector::new(1.0, 2.0);
        let q = Vector::new(0.0, 2.0);
        assert!(!lies_behind(p1, p2, q));
    }

    #[test]
    fn lies_behind_false_when_nothing_in_the_way() {
        let p1 = Vector::new(-1.0, 5.0);
        let p2 = Vector::new(1.0, 5.0);
        let q = Vector::new(0.0, 2.0);
        assert!(!lies_behind(p1, p2, q));
    }

    #[test]
    fn inside_polygon_border_value_controls_edge_points() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(inside_polygon(0.5, 0.0, &square, true));
        assert!(!inside_polygon(0.5, 0.0, &square, false));
        assert!(inside_polygon(0.5, 0.5, &square, false));
        assert!(!inside_polygon(2.0, 2.0, &square, true));
    }
}
