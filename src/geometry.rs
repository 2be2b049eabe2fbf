//! Geometry kernel shared by every exercise rule.
//!
//! All functions are pure. Degenerate input (zero-length or non-finite vectors)
//! yields `0.0` instead of propagating NaN.

use crate::landmark::Landmark;

const MIN_VECTOR_LENGTH: f64 = 1e-9;

/// Angle in degrees at vertex `b` between `a - b` and `c - b`, in 3-D
pub fn angle_at_vertex(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    angle_between(
        [a.x - b.x, a.y - b.y, a.z - b.z],
        [c.x - b.x, c.y - b.y, c.z - b.z],
    )
}

/// Angle in degrees at vertex `b` using only x and y (depth dropped)
pub fn projected_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    angle_between([a.x - b.x, a.y - b.y, 0.0], [c.x - b.x, c.y - b.y, 0.0])
}

/// Euclidean distance in 3-D
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

fn angle_between(u: [f64; 3], v: [f64; 3]) -> f64 {
    let norm_u = norm(u);
    let norm_v = norm(v);

    // Negated comparison so NaN lengths take the guard as well
    if !(norm_u > MIN_VECTOR_LENGTH) || !(norm_v > MIN_VECTOR_LENGTH) {
        return 0.0;
    }
    if !norm_u.is_finite() || !norm_v.is_finite() {
        return 0.0;
    }

    let cosine = (u[0] * v[0] + u[1] * v[1] + u[2] * v[2]) / (norm_u * norm_v);
    if !cosine.is_finite() {
        return 0.0;
    }

    cosine.clamp(-1.0, 1.0).acos().to_degrees()
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Landmark {
        Landmark::new(x, y, z)
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_at_vertex(&p(1.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(0.0, 1.0, 0.0));
        assert!((angle - 90.0).abs() < 0.1);

        let angle = angle_at_vertex(&p(0.3, 0.2, 0.5), &p(0.3, 0.2, 0.1), &p(0.7, 0.2, 0.1));
        assert!((angle - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_collinear_points() {
        let same = angle_at_vertex(&p(1.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0));
        assert!(same.abs() < 0.1);

        let opposite =
            angle_at_vertex(&p(-1.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0));
        assert!((opposite - 180.0).abs() < 0.1);
    }

    #[test]
    fn test_zero_length_vector() {
        let origin = p(0.5, 0.5, 0.5);
        assert_eq!(angle_at_vertex(&origin, &origin, &p(1.0, 0.0, 0.0)), 0.0);
        assert_eq!(projected_angle(&p(1.0, 0.0, 0.0), &origin, &origin), 0.0);
    }

    #[test]
    fn test_non_finite_input_is_neutral() {
        let nan = p(f64::NAN, 0.0, 0.0);
        let origin = p(0.0, 0.0, 0.0);
        assert_eq!(angle_at_vertex(&nan, &origin, &p(1.0, 0.0, 0.0)), 0.0);

        let huge = p(f64::MAX, f64::MAX, 0.0);
        assert_eq!(angle_at_vertex(&huge, &origin, &p(1.0, 0.0, 0.0)), 0.0);
        assert_eq!(projected_angle(&huge, &origin, &p(1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_projected_angle_ignores_depth() {
        // 3-D angle is skewed by depth, the projection is a clean right angle
        let a = p(1.0, 0.0, 5.0);
        let b = p(0.0, 0.0, 0.0);
        let c = p(0.0, 1.0, 0.0);
        assert!((projected_angle(&a, &b, &c) - 90.0).abs() < 0.1);
        assert!((angle_at_vertex(&a, &b, &c) - 90.0).abs() < 0.1);

        let c = p(0.0, 1.0, 1.0);
        assert!(angle_at_vertex(&a, &b, &c) < 90.0);
        assert!((projected_angle(&a, &b, &c) - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_distance() {
        let d = distance(&p(0.0, 0.0, 0.0), &p(3.0, 4.0, 0.0));
        assert!((d - 5.0).abs() < 0.01);
    }
}
