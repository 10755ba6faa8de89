//! Ray/segment intersection and nearest-hit selection over closed polygons.

use crate::{
    foundation::core::{Point, Vec2},
    shape::model::{Shape, ShapeSet},
};

/// Below this |denominator| a ray is treated as parallel to the segment.
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Where a ray meets a segment.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Hit {
    pub point: Point,
    /// Ray parameter: `point == origin + t * direction`, always `>= 0`.
    pub t: f64,
    /// Unit normal of the hit segment, oriented so `direction.dot(normal) <= 0`.
    pub normal: Vec2,
}

/// Anything that can be walked as a list of closed polygons.
///
/// Implementors must visit polygons in their stored order and, within a polygon, edges in
/// point order with the wraparound edge (last, first) visited last. Nearest-hit ties are
/// resolved by this order.
pub trait EdgeSource {
    fn for_each_edge(&self, visit: &mut dyn FnMut(Point, Point));
}

impl EdgeSource for Shape {
    fn for_each_edge(&self, visit: &mut dyn FnMut(Point, Point)) {
        for (a, b) in self.edges() {
            visit(a, b);
        }
    }
}

impl EdgeSource for [Shape] {
    fn for_each_edge(&self, visit: &mut dyn FnMut(Point, Point)) {
        for shape in self {
            shape.for_each_edge(visit);
        }
    }
}

impl EdgeSource for ShapeSet {
    fn for_each_edge(&self, visit: &mut dyn FnMut(Point, Point)) {
        self.shapes().for_each_edge(visit);
    }
}

/// Intersect the ray `origin + t * direction` with segment `a -> b`.
///
/// `direction` does not need to be unit length; `t` is measured in multiples of it.
/// Parallel (or anti-parallel) rays never hit.
pub fn intersect_ray_segment(origin: Point, direction: Vec2, a: Point, b: Point) -> Option<Hit> {
    let v1 = origin - a;
    let v2 = b - a;
    let v3 = direction.turn_90();

    let denom = v2.dot(v3);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t1 = v2.cross(v1) / denom;
    let t2 = v1.dot(v3) / denom;
    if !(t1 >= 0.0 && (0.0..=1.0).contains(&t2)) {
        return None;
    }

    let mut normal = v2.turn_90().normalize();
    if direction.dot(normal) > 0.0 {
        normal = -normal;
    }
    Some(Hit {
        point: origin + t1 * direction,
        t: t1,
        normal,
    })
}

/// Nearest hit of the ray over every edge of `shapes`.
///
/// On exact ties the first edge in visiting order wins.
pub fn intersect<S: EdgeSource + ?Sized>(origin: Point, direction: Vec2, shapes: &S) -> Option<Hit> {
    let mut closest: Option<Hit> = None;
    shapes.for_each_edge(&mut |a, b| {
        if let Some(hit) = intersect_ray_segment(origin, direction, a, b)
            && closest.is_none_or(|c| hit.t < c.t)
        {
            closest = Some(hit);
        }
    });
    closest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Shape {
        Shape::new([
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ])
        .unwrap()
    }

    #[test]
    fn parallel_and_antiparallel_rays_miss() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(2.0, 1.0);
        let d = b - a;
        assert!(intersect_ray_segment(Point::new(0.0, -1.0), d, a, b).is_none());
        assert!(intersect_ray_segment(Point::new(0.0, -1.0), -d, a, b).is_none());
        // Collinear and pointing straight along the segment: still a miss.
        assert!(intersect_ray_segment(Point::new(-1.0, -0.5), d, a, b).is_none());
    }

    #[test]
    fn crossing_ray_reports_point_and_parameter() {
        let hit = intersect_ray_segment(
            Point::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 10.0),
        )
        .unwrap();
        assert!((hit.t - 1.5).abs() < 1e-12);
        assert!((hit.point - Point::new(3.0, 3.0)).hypot() < 1e-12);
        assert!((hit.normal.hypot() - 1.0).abs() < 1e-12);
        assert!(Vec2::new(2.0, 2.0).dot(hit.normal) <= 0.0);
    }

    #[test]
    fn behind_origin_or_outside_segment_misses() {
        let a = Point::new(3.0, 0.0);
        let b = Point::new(3.0, 1.0);
        assert!(intersect_ray_segment(Point::new(0.0, 0.5), Vec2::new(-1.0, 0.0), a, b).is_none());
        assert!(intersect_ray_segment(Point::new(0.0, 1.5), Vec2::new(1.0, 0.0), a, b).is_none());
    }

    #[test]
    fn segment_endpoints_are_inclusive() {
        let hit = intersect_ray_segment(
            Point::new(0.0, 1.0),
            Vec2::new(1.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 1.0),
        );
        assert!(hit.is_some());
    }

    #[test]
    fn normal_flips_to_oppose_ray_from_either_side() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        let from_left =
            intersect_ray_segment(Point::new(-1.0, 0.5), Vec2::new(1.0, 0.0), a, b).unwrap();
        let from_right =
            intersect_ray_segment(Point::new(1.0, 0.5), Vec2::new(-1.0, 0.0), a, b).unwrap();
        assert_eq!(from_left.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(from_right.normal, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn nearest_shape_wins_regardless_of_order() {
        let far = square(10.0, -1.0, 2.0);
        let near = square(4.0, -1.0, 2.0);
        let shapes = vec![far, near];
        let hit = intersect(Point::new(0.0, 0.0), Vec2::new(1.0, 0.0), shapes.as_slice()).unwrap();
        assert!((hit.point.x - 4.0).abs() < 1e-12);
        assert!((hit.t - 4.0).abs() < 1e-12);
    }

    #[test]
    fn exact_tie_keeps_first_encountered_edge() {
        // Two identical squares: the first one in order must win.
        let shapes = vec![square(1.0, -1.0, 2.0), square(1.0, -1.0, 2.0)];
        let mut order = Vec::new();
        shapes.as_slice().for_each_edge(&mut |a, b| order.push((a, b)));
        assert_eq!(order.len(), 8);

        let hit = intersect(Point::new(0.0, 0.0), Vec2::new(1.0, 0.0), shapes.as_slice()).unwrap();
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert!((hit.t - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_set_never_hits() {
        let set = ShapeSet::default();
        assert!(intersect(Point::ORIGIN, Vec2::new(1.0, 0.0), &set).is_none());
    }
}
