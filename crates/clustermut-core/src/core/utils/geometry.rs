use nalgebra::{Point3, Rotation3, Vector3};
use rand::Rng;
use std::f64::consts::{FRAC_PI_2, PI};

/// Rotation for a unit orientation given as Euler angles `(phi, omega, psi)`.
///
/// The angles are applied as roll, pitch, and yaw about the fixed x, y, and z axes.
pub fn euler_rotation(angles: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::from_euler_angles(angles.x, angles.y, angles.z)
}

/// Draws a random orientation with `phi, psi` in `(-pi, pi)` and `omega` in `(-pi/2, pi/2)`.
pub fn random_euler<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    let mut draw = |range: f64| {
        let magnitude = rng.r#gen::<f64>() * range;
        if rng.r#gen::<bool>() { -magnitude } else { magnitude }
    };
    let phi = draw(PI);
    let omega = draw(FRAC_PI_2);
    let psi = draw(PI);
    Vector3::new(phi, omega, psi)
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Mass-weighted center of a set of points.
///
/// Returns `None` for empty input or a non-positive total mass.
pub fn mass_weighted_center(points: &[Point3<f64>], masses: &[f64]) -> Option<Point3<f64>> {
    if points.is_empty() || points.len() != masses.len() {
        return None;
    }
    let total: f64 = masses.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    let weighted = points
        .iter()
        .zip(masses)
        .fold(Vector3::zeros(), |acc, (p, &m)| acc + p.coords * m);
    Some(Point3::from(weighted / total))
}

/// Axis-aligned bounding box `(min, max)` of a set of points.
pub fn bounding_box(points: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    let first = points.first()?;
    Some(points.iter().skip(1).fold((*first, *first), |(lo, hi), p| {
        (
            Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
            Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
        )
    }))
}

/// Moves `point` away from the origin along its position vector so that its
/// distance from the origin grows by `added_distance`.
///
/// Returns `None` when the point sits on the origin and has no direction.
pub fn push_outward(point: &Point3<f64>, added_distance: f64) -> Option<Point3<f64>> {
    let distance = point.coords.norm();
    if distance <= f64::EPSILON {
        return None;
    }
    let factor = (distance + added_distance) / distance;
    Some(Point3::from(point.coords * factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    #[test]
    fn zero_euler_angles_give_identity() {
        let rot = euler_rotation(&Vector3::zeros());
        let p = Point3::new(1.0, -2.0, 3.0);
        assert!(((rot * p) - p).norm() < EPS);
    }

    #[test]
    fn euler_rotation_preserves_lengths() {
        let rot = euler_rotation(&Vector3::new(0.3, -1.1, 2.4));
        let v = Vector3::new(1.0, 2.0, -0.5);
        assert!(((rot * v).norm() - v.norm()).abs() < EPS);
    }

    #[test]
    fn random_euler_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let e = random_euler(&mut rng);
            assert!(e.x.abs() <= PI);
            assert!(e.y.abs() <= FRAC_PI_2);
            assert!(e.z.abs() <= PI);
        }
    }

    #[test]
    fn centroid_of_empty_slice_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn centroid_averages_points() {
        let c = centroid(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
        ])
        .unwrap();
        assert!((c - Point3::new(1.0, 1.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn mass_weighted_center_favors_heavy_points() {
        let c = mass_weighted_center(
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)],
            &[3.0, 1.0],
        )
        .unwrap();
        assert!((c.x - 1.0).abs() < EPS);
    }

    #[test]
    fn mass_weighted_center_rejects_mismatched_input() {
        assert!(mass_weighted_center(&[Point3::origin()], &[]).is_none());
        assert!(mass_weighted_center(&[Point3::origin()], &[0.0]).is_none());
    }

    #[test]
    fn bounding_box_spans_all_points() {
        let (lo, hi) = bounding_box(&[
            Point3::new(1.0, -1.0, 5.0),
            Point3::new(-2.0, 4.0, 0.0),
        ])
        .unwrap();
        assert_eq!(lo, Point3::new(-2.0, -1.0, 0.0));
        assert_eq!(hi, Point3::new(1.0, 4.0, 5.0));
    }

    #[test]
    fn push_outward_grows_distance_from_origin() {
        let p = push_outward(&Point3::new(3.0, 4.0, 0.0), 5.0).unwrap();
        assert!((p.coords.norm() - 10.0).abs() < EPS);
        assert!((p - Point3::new(6.0, 8.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn push_outward_of_origin_is_none() {
        assert!(push_outward(&Point3::origin(), 1.0).is_none());
    }
}
