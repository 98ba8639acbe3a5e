//! Placement of the color number inside each shape.

use crate::{geometry::Polygon, LABEL_SAMPLES};
use ordered_float::OrderedFloat;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// The smallest label font size.
pub const MIN_FONT_SIZE: f64 = 4.0;

/// The largest label font size.
pub const MAX_FONT_SIZE: f64 = 12.0;

/// Where and how large to draw the number of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// The horizontal position of the text anchor.
    pub x: f64,
    /// The vertical position of the text anchor.
    pub y: f64,
    /// The font size.
    pub size: f64,
    /// Whether no sample landed inside the shape and the centroid was used instead.
    pub fallback: bool,
}

/// Returns the font size for a shape with the given area: `sqrt(area) / 8` within `4..=12`.
#[must_use]
pub fn font_size(area: f64) -> f64 {
    (area.sqrt() / 8.0).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Picks a label position inside `polygon`.
///
/// [`LABEL_SAMPLES`] points are drawn uniformly from the bounding box and the one strictly
/// inside the polygon that lies farthest from its outline wins. If none of the samples is
/// inside (thin slivers), the label falls back to the polygon's centroid.
#[must_use]
pub fn place_label(polygon: &Polygon, rng: &mut impl Rng) -> Label {
    let size = font_size(polygon.area());

    let best = polygon.bounds().and_then(|b| {
        let xs = Uniform::new_inclusive(f64::from(b.min_x), f64::from(b.max_x));
        let ys = Uniform::new_inclusive(f64::from(b.min_y), f64::from(b.max_y));
        (0..LABEL_SAMPLES)
            .map(|_| (xs.sample(rng), ys.sample(rng)))
            .filter(|&(x, y)| polygon.contains(x, y))
            .max_by_key(|&(x, y)| OrderedFloat(polygon.boundary_distance(x, y)))
    });

    if let Some((x, y)) = best {
        return Label { x, y, size, fallback: false };
    }

    tracing::debug!(
        vertices = polygon.len(),
        area = polygon.area(),
        "no label sample inside the shape, using its centroid"
    );

    let (x, y) = polygon.centroid().unwrap_or_default();
    Label { x, y, size, fallback: true }
}
