//! Border following over binary images.
//!
//! Outer borders are followed with the Suzuki-Abe procedure
//! (8-connected foreground, counterclockwise neighborhood scans),
//! then shortened by removing the points that continue a straight run.

use crate::geometry::Point;

/// The 8 neighbor offsets in counterclockwise order, starting to the right.
///
/// `y` grows downward, so "north" is `-1`.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// The index of `(-1, 0)` in [`DIRECTIONS`].
const WEST: usize = 4;

/// Returns the index into [`DIRECTIONS`] of the step from `from` to its neighbor `to`.
fn direction(from: Point, to: Point) -> usize {
    let step = (to.x - from.x, to.y - from.y);
    DIRECTIONS.iter().position(|&d| d == step).unwrap_or(0)
}

/// Offsets `p` by the direction with index `dir`.
fn step(p: Point, dir: usize) -> Point {
    let (dx, dy) = DIRECTIONS[dir % 8];
    Point::new(p.x + dx, p.y + dy)
}

/// Follows the outer border of the foreground component containing `start`.
///
/// `start` must be the first foreground pixel of its component in row-major order,
/// so that its western neighbor is background.
/// The returned ring lists the border pixels in the order they are visited,
/// without repeating the first point at the end.
/// An isolated pixel yields a ring with only `start`.
#[must_use]
pub fn trace_outer(foreground: impl Fn(i32, i32) -> bool, start: Point) -> Vec<Point> {
    let is_set = |p: Point| foreground(p.x, p.y);

    // clockwise from the west neighbor
    let Some(first) = (0..8)
        .map(|i| step(start, (WEST + 8 - i) % 8))
        .find(|&p| is_set(p))
    else {
        return vec![start];
    };

    let mut ring = Vec::new();
    let mut previous = first;
    let mut current = start;

    loop {
        // counterclockwise, starting after the pixel we came from
        let from = direction(current, previous);
        let next = (1..=8)
            .map(|i| step(current, from + i))
            .find(|&p| is_set(p))
            .unwrap_or(previous);

        ring.push(current);

        if next == start && current == first {
            break;
        }

        previous = current;
        current = next;
    }

    ring
}

/// Removes the points where the ring continues in the same direction,
/// leaving only the corners.
#[must_use]
pub fn simplify(ring: &[Point]) -> Vec<Point> {
    let n = ring.len();
    if n < 3 {
        return ring.to_vec();
    }

    let heading = |a: Point, b: Point| ((b.x - a.x).signum(), (b.y - a.y).signum());

    let corners = (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            heading(prev, ring[i]) != heading(ring[i], next)
        })
        .map(|i| ring[i])
        .collect::<Vec<_>>();

    if corners.is_empty() {
        ring[..1].to_vec()
    } else {
        corners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid<const W: usize, const H: usize>(cells: [[u8; W]; H]) -> impl Fn(i32, i32) -> bool {
        move |x, y| {
            usize::try_from(x)
                .ok()
                .zip(usize::try_from(y).ok())
                .and_then(|(x, y)| cells.get(y).and_then(|row| row.get(x)))
                .is_some_and(|&v| v != 0)
        }
    }

    fn points(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn isolated_pixel() {
        let fg = grid([[0, 0, 0], [0, 1, 0], [0, 0, 0]]);
        assert_eq!(trace_outer(fg, Point::new(1, 1)), points(&[(1, 1)]));
    }

    #[test]
    fn square_block() {
        let fg = grid([[1, 1], [1, 1]]);
        assert_eq!(
            trace_outer(fg, Point::new(0, 0)),
            points(&[(0, 0), (0, 1), (1, 1), (1, 0)])
        );
    }

    #[test]
    fn thin_line_is_walked_both_ways() {
        let fg = grid([[1, 1, 1]]);
        let ring = trace_outer(fg, Point::new(0, 0));
        assert_eq!(ring, points(&[(0, 0), (1, 0), (2, 0), (1, 0)]));
        assert_eq!(simplify(&ring), points(&[(0, 0), (2, 0)]));
    }

    #[test]
    fn hollow_rectangle_simplifies_to_corners() {
        let fg = grid([
            [1, 1, 1, 1],
            [1, 0, 0, 1],
            [1, 1, 1, 1],
        ]);
        let ring = trace_outer(fg, Point::new(0, 0));
        assert_eq!(ring.len(), 10);
        assert_eq!(
            simplify(&ring),
            points(&[(0, 0), (0, 2), (3, 2), (3, 0)])
        );
    }

    #[test]
    fn diagonal_steps_are_followed() {
        let fg = grid([
            [0, 1, 0],
            [1, 1, 1],
            [0, 1, 0],
        ]);
        let ring = trace_outer(fg, Point::new(1, 0));
        assert_eq!(ring, points(&[(1, 0), (0, 1), (1, 2), (2, 1)]));
    }
}
