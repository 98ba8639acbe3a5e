//! Extraction of outlined single-color regions.

use crate::{
    components::{Component, Connectivity, Labeling},
    contour::{simplify, trace_outer},
    geometry::{Point, Polygon},
    mask::ColorMask,
    ColorCounts, Image, ManifestEntry, PaletteManifest, Shape,
};
use palette::Srgb;

/// The shapes of an image and the palette manifest that groups them by color.
#[derive(Debug, Clone, PartialEq)]
pub struct Regions {
    /// The distinct colors of the image in ascending order.
    pub palette: Vec<Srgb<u8>>,
    /// The shapes in id order.
    pub shapes: Vec<Shape>,
    /// One entry per palette color, including colors without any shapes.
    pub manifest: PaletteManifest,
}

/// Whether a region is not enclosed by another region of its own color:
/// it touches the canvas edge or borders a pixel that can reach the edge without crossing its color.
fn is_external(
    labeling: &Labeling,
    id: u32,
    component: &Component,
    boundary: &ColorMask,
    background: &ColorMask,
) -> bool {
    let (min_x, min_y, max_x, max_y) = component.bbox;
    if min_x == 0 || min_y == 0 || max_x + 1 == labeling.width() || max_y + 1 == labeling.height() {
        return true;
    }

    let width = labeling.width() as usize;
    let labels = labeling.labels();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (x, y) = (i64::from(x), i64::from(y));
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let on_edge = labels[y as usize * width + x as usize] == id && boundary.contains(x, y);
            if on_edge
                && Connectivity::Four
                    .offsets()
                    .iter()
                    .any(|&(dx, dy)| background.contains(x + i64::from(dx), y + i64::from(dy)))
            {
                return true;
            }
        }
    }

    false
}

/// Traces the outline of a region over its boundary pixels and drops the collinear points.
fn outline(labeling: &Labeling, id: u32, component: &Component, boundary: &ColorMask) -> Polygon {
    let (width, height) = (labeling.width(), labeling.height());
    let labels = labeling.labels();

    let foreground = |x: i32, y: i32| {
        let (Ok(ux), Ok(uy)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        ux < width
            && uy < height
            && labels[uy as usize * width as usize + ux as usize] == id
            && boundary.contains(i64::from(x), i64::from(y))
    };

    let (sx, sy) = component.start;
    #[allow(clippy::cast_possible_wrap)]
    let start = Point::new(sx as i32, sy as i32);

    Polygon::new(simplify(&trace_outer(foreground, start)))
}

/// Finds the outlined regions of every color of `image`.
///
/// Regions are the 4-connected pieces of each color. A region enclosed by another region of the
/// same color is not emitted. Outlines with fewer than 4 points or an area below
/// `min_area_fraction * image.area()` are discarded.
///
/// Shape ids count up from `0` in ascending color order, and within one color in the row-major
/// order of each region's first pixel.
#[must_use]
pub fn extract_regions(image: &Image, min_area_fraction: f64) -> Regions {
    let (width, height) = (image.width(), image.height());
    let counts = ColorCounts::new(image.pixels());
    let labeling = Labeling::new(width, height, counts.indices(), Connectivity::Four);

    let mut by_color = vec![Vec::new(); counts.len()];
    for (id, component) in labeling.components().iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        by_color[component.key as usize].push(id as u32);
    }

    #[allow(clippy::cast_precision_loss)]
    let min_area = min_area_fraction * image.area() as f64;

    let mut shapes = Vec::new();
    let mut entries = Vec::with_capacity(counts.len());
    let mut discarded = 0usize;

    for (color_index, (&color, regions)) in counts.color_components().iter().zip(&by_color).enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let mask = ColorMask::new(width, height, counts.indices(), color_index as u32);
        let boundary = mask.boundary();
        let background = mask.background();

        let mut ids = Vec::new();
        for &id in regions {
            let component = &labeling.components()[id as usize];
            if !is_external(&labeling, id, component, &boundary, &background) {
                continue;
            }

            let polygon = outline(&labeling, id, component, &boundary);
            if polygon.len() < 4 || polygon.area() < min_area {
                discarded += 1;
                continue;
            }

            #[allow(clippy::cast_possible_truncation)]
            let shape_id = shapes.len() as u32;
            ids.push(shape_id);
            shapes.push(Shape { id: shape_id, color, color_index, polygon });
        }

        entries.push(ManifestEntry { color, shapes: ids });
    }

    tracing::debug!(shapes = shapes.len(), discarded, "extracted regions");

    Regions {
        palette: counts.colors().to_vec(),
        shapes,
        manifest: PaletteManifest(entries),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use std::collections::BTreeSet;

    const A: Srgb<u8> = Srgb::new(10, 20, 30);
    const B: Srgb<u8> = Srgb::new(200, 100, 50);

    fn assert_consistent(regions: &Regions) {
        for (i, shape) in regions.shapes.iter().enumerate() {
            assert_eq!(shape.id as usize, i);
            assert!(shape.polygon.len() >= 4);
            let entry = &regions.manifest.entries()[shape.color_index];
            assert_eq!(entry.color, shape.color);
            assert!(entry.shapes.contains(&shape.id));
        }

        let ids = regions.manifest.shape_ids().collect::<Vec<_>>();
        let unique = ids.iter().copied().collect::<BTreeSet<_>>();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(ids.len(), regions.shapes.len());
    }

    #[test]
    fn solid_image_is_one_rectangle() {
        let image = Image::filled(20, 12, A).unwrap();
        let regions = extract_regions(&image, 0.001);

        assert_eq!(regions.shapes.len(), 1);
        assert_eq!(
            regions.shapes[0].polygon.points(),
            &[
                Point::new(0, 0),
                Point::new(0, 11),
                Point::new(19, 11),
                Point::new(19, 0)
            ]
        );
        assert_eq!(regions.manifest.len(), 1);
        assert_consistent(&regions);
    }

    #[test]
    fn diagonal_neighbors_are_separate_shapes() {
        let image = quadrants(20, A, B);
        let regions = extract_regions(&image, 0.0);

        assert_eq!(regions.shapes.len(), 4);
        assert_eq!(regions.manifest.entries()[0].shapes, vec![0, 1]);
        assert_eq!(regions.manifest.entries()[1].shapes, vec![2, 3]);
        for shape in &regions.shapes {
            assert!((shape.polygon.area() - 81.0).abs() < f64::EPSILON);
        }
        assert_consistent(&regions);
    }

    #[test]
    fn nested_regions_of_the_same_color_are_skipped() {
        let mut image = Image::filled(11, 11, A).unwrap();
        for y in 2..=8 {
            for x in 2..=8 {
                if x == 2 || x == 8 || y == 2 || y == 8 {
                    let i = image.index(x, y);
                    image.pixels_mut()[i] = B;
                }
            }
        }

        let regions = extract_regions(&image, 0.0);
        let colors = regions.shapes.iter().map(|s| s.color).collect::<Vec<_>>();
        assert_eq!(colors, vec![[10, 20, 30], [200, 100, 50]]);
        assert_consistent(&regions);
    }

    #[test]
    fn small_regions_are_discarded() {
        let mut image = Image::filled(30, 30, A).unwrap();
        let i = image.index(10, 10);
        image.pixels_mut()[i] = B;
        for (x, y) in [(20, 20), (21, 20), (20, 21), (21, 21)] {
            let i = image.index(x, y);
            image.pixels_mut()[i] = B;
        }

        // a lone pixel never has a polygon, the 2x2 block has an area of 1
        let regions = extract_regions(&image, 0.0);
        assert_eq!(regions.manifest.entries()[1].shapes.len(), 1);

        let regions = extract_regions(&image, 2.0 / 900.0);
        assert!(regions.manifest.entries()[1].shapes.is_empty());
        assert_eq!(regions.manifest.len(), 2);
        assert_consistent(&regions);
    }
}
