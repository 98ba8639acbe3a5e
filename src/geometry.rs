//! Integer points and closed polygons in canvas coordinates.

use serde::{Deserialize, Serialize};

/// A point on the pixel grid. `x` grows to the right and `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// The column.
    pub x: i32,
    /// The row.
    pub y: i32,
}

impl Point {
    /// Creates a new [`Point`].
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis aligned bounding box with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// The smallest `x` coordinate.
    pub min_x: i32,
    /// The smallest `y` coordinate.
    pub min_y: i32,
    /// The largest `x` coordinate.
    pub max_x: i32,
    /// The largest `y` coordinate.
    pub max_y: i32,
}

/// A closed polygon given by its vertices.
///
/// The last vertex is implicitly connected back to the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Creates a new [`Polygon`] from its vertices.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns the vertices.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the polygon has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the edges, including the closing edge.
    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let next = self.0.iter().cycle().skip(1);
        self.0.iter().copied().zip(next.copied())
    }

    /// Twice the signed area (shoelace formula).
    fn double_signed_area(&self) -> i64 {
        self.edges()
            .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
            .sum()
    }

    /// Returns the enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let area = self.double_signed_area().unsigned_abs() as f64;
        area / 2.0
    }

    /// Returns the bounding box, or `None` for an empty polygon.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.0.first()?;
        let mut bounds = Bounds { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        for p in &self.0[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    /// Returns the distance from `(x, y)` to the nearest point of the outline.
    #[must_use]
    pub fn boundary_distance(&self, x: f64, y: f64) -> f64 {
        if let [p] = self.0.as_slice() {
            return (f64::from(p.x) - x).hypot(f64::from(p.y) - y);
        }

        self.edges()
            .map(|(a, b)| segment_distance(a, b, x, y))
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether `(x, y)` lies strictly inside the polygon.
    ///
    /// Points on (or within a tiny tolerance of) the outline are not inside.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.0.len() < 3 || self.boundary_distance(x, y) < 1e-9 {
            return false;
        }

        // even-odd ray casting towards +x
        let mut inside = false;
        for (a, b) in self.edges() {
            let (ax, ay) = (f64::from(a.x), f64::from(a.y));
            let (bx, by) = (f64::from(b.x), f64::from(b.y));
            if (ay > y) != (by > y) {
                let cross = ax + (y - ay) * (bx - ax) / (by - ay);
                if x < cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Returns the area centroid, or the mean of the vertices for degenerate polygons.
    ///
    /// Returns `None` for an empty polygon.
    #[must_use]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.0.is_empty() {
            return None;
        }

        let double_area = self.double_signed_area();
        if double_area == 0 {
            #[allow(clippy::cast_precision_loss)]
            let n = self.0.len() as f64;
            let (sx, sy) = self
                .0
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + f64::from(p.x), sy + f64::from(p.y)));
            return Some((sx / n, sy / n));
        }

        let (mut cx, mut cy) = (0.0, 0.0);
        for (a, b) in self.edges() {
            let cross = f64::from(a.x) * f64::from(b.y) - f64::from(b.x) * f64::from(a.y);
            cx += f64::from(a.x + b.x) * cross;
            cy += f64::from(a.y + b.y) * cross;
        }

        #[allow(clippy::cast_precision_loss)]
        let six_area = 3.0 * double_area as f64;
        Some((cx / six_area, cy / six_area))
    }
}

/// Distance from `(x, y)` to the segment `a..b`.
fn segment_distance(a: Point, b: Point, x: f64, y: f64) -> f64 {
    let (ax, ay) = (f64::from(a.x), f64::from(a.y));
    let (dx, dy) = (f64::from(b.x) - ax, f64::from(b.y) - ay);
    let len = dx * dx + dy * dy;
    let t = if len == 0.0 {
        0.0
    } else {
        (((x - ax) * dx + (y - ay) * dy) / len).clamp(0.0, 1.0)
    };
    (ax + t * dx - x).hypot(ay + t * dy - y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: i32) -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(0, size),
            Point::new(size, size),
            Point::new(size, 0),
        ])
    }

    #[test]
    fn square_area_and_bounds() {
        let square = square(4);
        assert!((square.area() - 16.0).abs() < f64::EPSILON);
        assert_eq!(
            square.bounds(),
            Some(Bounds { min_x: 0, min_y: 0, max_x: 4, max_y: 4 })
        );
        assert_eq!(Polygon::default().bounds(), None);
    }

    #[test]
    fn containment_is_strict() {
        let square = square(4);
        assert!(square.contains(2.0, 2.0));
        assert!(square.contains(0.5, 3.9));
        assert!(!square.contains(0.0, 2.0));
        assert!(!square.contains(4.0, 4.0));
        assert!(!square.contains(5.0, 2.0));
    }

    #[test]
    fn distance_to_outline() {
        let square = square(4);
        assert!((square.boundary_distance(2.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((square.boundary_distance(2.0, 2.0) - 2.0).abs() < 1e-12);
        assert!((square.boundary_distance(7.0, 8.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_square_and_line() {
        let (x, y) = square(4).centroid().unwrap_or_default();
        assert!((x - 2.0).abs() < 1e-12 && (y - 2.0).abs() < 1e-12);

        let line = Polygon::new(vec![Point::new(0, 0), Point::new(4, 0)]);
        let (x, y) = line.centroid().unwrap_or_default();
        assert!((x - 2.0).abs() < 1e-12 && y.abs() < 1e-12);
    }
}
