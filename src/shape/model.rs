use crate::foundation::{
    core::{BezPath, Point, Rect},
    error::{RefraktError, RefraktResult},
};

/// A closed polygon: the last point connects back to the first.
///
/// Construction removes consecutive duplicate points (including the wraparound pair) and
/// rejects anything left with fewer than two distinct points, so every `Shape` in the crate
/// has well-defined, non-degenerate edges.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Shape {
    points: Vec<Point>,
}

impl Shape {
    pub fn new(points: impl IntoIterator<Item = Point>) -> RefraktResult<Self> {
        let mut out: Vec<Point> = Vec::new();
        for p in points {
            if !(p.x.is_finite() && p.y.is_finite()) {
                return Err(RefraktError::validation(format!(
                    "shape point ({}, {}) is not finite",
                    p.x, p.y
                )));
            }
            if out.last() != Some(&p) {
                out.push(p);
            }
        }
        while out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        if out.len() < 2 {
            return Err(RefraktError::validation(format!(
                "shape needs at least 2 distinct points, got {}",
                out.len()
            )));
        }
        Ok(Self { points: out })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false` for a constructed shape, which holds at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Edges in point order, ending with the wraparound edge (last, first).
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut iter = self.points.iter();
        if let Some(&first) = iter.next() {
            path.move_to(first);
            for &p in iter {
                path.line_to(p);
            }
            path.close_path();
        }
        path
    }

    pub fn bounds(&self) -> Rect {
        let first = self.points[0];
        self.points
            .iter()
            .fold(Rect::from_points(first, first), |r, &p| r.union_pt(p))
    }
}

/// Immutable, ordered set of shapes loaded once per process.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ShapeSet {
    shapes: Vec<Shape>,
}

impl ShapeSet {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    /// Union of all shape bounds, `None` for an empty set.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(|a, b| a.union(b))
    }
}

impl<'a> IntoIterator for &'a ShapeSet {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[(f64, f64)]) -> Vec<Point> {
        v.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn removes_consecutive_and_wraparound_duplicates() {
        let s = Shape::new(pts(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 0.0),
        ]))
        .unwrap();
        assert_eq!(s.points(), pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]).as_slice());
    }

    #[test]
    fn rejects_shapes_with_fewer_than_two_distinct_points() {
        assert!(Shape::new(pts(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)])).is_err());
        assert!(Shape::new(Vec::new()).is_err());
        let pair = Shape::new(pts(&[(0.0, 0.0), (2.0, 0.0)])).unwrap();
        assert_eq!(pair.len(), 2);
        assert!(!pair.is_empty());
    }

    #[test]
    fn rejects_non_finite_points() {
        assert!(Shape::new(pts(&[(0.0, 0.0), (f64::NAN, 1.0), (1.0, 1.0)])).is_err());
    }

    #[test]
    fn edges_include_wraparound() {
        let s = Shape::new(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])).unwrap();
        let edges: Vec<_> = s.edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2], (Point::new(1.0, 1.0), Point::new(0.0, 0.0)));
    }

    #[test]
    fn set_bounds_cover_every_shape() {
        let set = ShapeSet::new(vec![
            Shape::new(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])).unwrap(),
            Shape::new(pts(&[(-2.0, 3.0), (4.0, 5.0)])).unwrap(),
        ]);
        assert_eq!(set.bounds(), Some(Rect::new(-2.0, 0.0, 4.0, 5.0)));
        assert_eq!(ShapeSet::default().bounds(), None);
    }
}
