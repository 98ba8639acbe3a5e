//! Removal of undersized single-color components.
//!
//! Each pass labels the 8-connected components of every color in a snapshot of the image,
//! then rewrites every component below the area threshold with the most common color
//! found just outside of it. The pass walks the colors in a configurable order and
//! later colors see the replacements made for earlier ones, so the order changes the result.

use crate::{
    components::{Component, Connectivity, Labeling},
    mask::laplacian,
    ColorCounts, Image,
};
use palette::Srgb;
use serde::{Deserialize, Serialize};

/// The order in which colors are visited during a pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneOrder {
    /// Descending by the sum of the channels.
    #[default]
    BrightestFirst,
    /// Ascending by the sum of the channels.
    DarkestFirst,
    /// Ascending `(r, g, b)` order.
    Enumeration,
}

impl PruneOrder {
    /// Returns the indices of `colors` in the order they should be visited.
    ///
    /// Colors with the same channel sum keep their relative order.
    #[must_use]
    pub fn sort(self, colors: &[Srgb<u8>]) -> Vec<usize> {
        let intensity = |i: usize| {
            let c = colors[i];
            u32::from(c.red) + u32::from(c.green) + u32::from(c.blue)
        };

        let mut order = (0..colors.len()).collect::<Vec<_>>();
        match self {
            PruneOrder::BrightestFirst => order.sort_by_key(|&i| std::cmp::Reverse(intensity(i))),
            PruneOrder::DarkestFirst => order.sort_by_key(|&i| intensity(i)),
            PruneOrder::Enumeration => (),
        }
        order
    }
}

/// Counters describing a pruning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// The number of passes that were run.
    pub iterations_run: u32,
    /// The number of components that were absorbed into a neighboring color.
    pub pruned: usize,
    /// The number of undersized components left alone because nothing surrounds them.
    pub skipped: usize,
}

/// A pruned image and the statistics of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutput {
    /// The cleaned image.
    pub image: Image,
    /// What happened along the way.
    pub stats: PruneStats,
}

/// Returns the pixels just outside of a component
/// (a positive Laplacian response on the component mask) in row-major order.
fn ring(labeling: &Labeling, id: u32, component: &Component) -> Vec<usize> {
    let (width, height) = (i64::from(labeling.width()), i64::from(labeling.height()));
    let labels = labeling.labels();

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let inside = |x: i64, y: i64| {
        x >= 0 && y >= 0 && x < width && y < height && labels[(y * width + x) as usize] == id
    };

    let (min_x, min_y, max_x, max_y) = component.bbox;
    let mut ring = Vec::new();
    for y in (i64::from(min_y) - 1).max(0)..=(i64::from(max_y) + 1).min(height - 1) {
        for x in (i64::from(min_x) - 1).max(0)..=(i64::from(max_x) + 1).min(width - 1) {
            if laplacian(inside, x, y) > 0 {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                ring.push((y * width + x) as usize);
            }
        }
    }
    ring
}

/// Returns the most frequent color among `pixels` at `indices`.
///
/// Ties go to the color encountered first. Returns `None` if `indices` is empty.
fn dominant_color(pixels: &[Srgb<u8>], indices: &[usize]) -> Option<Srgb<u8>> {
    let mut tally: Vec<(Srgb<u8>, u32)> = Vec::new();
    for &i in indices {
        let color = pixels[i];
        match tally.iter_mut().find(|(c, _)| *c == color) {
            Some((_, n)) => *n += 1,
            None => tally.push((color, 1)),
        }
    }

    tally
        .into_iter()
        .fold(None, |best: Option<(Srgb<u8>, u32)>, (c, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((c, n)),
        })
        .map(|(c, _)| c)
}

/// Runs a single pruning pass over `work`, returning the number of rewritten pixels.
fn prune_pass(work: &mut Image, threshold: f64, order: PruneOrder, stats: &mut PruneStats) -> usize {
    let snapshot = ColorCounts::new(work.pixels());
    let labeling = Labeling::new(work.width(), work.height(), snapshot.indices(), Connectivity::Eight);

    #[allow(clippy::cast_precision_loss)]
    let min_area = threshold * work.area() as f64;

    let mut prunable = vec![Vec::new(); snapshot.len()];
    for (id, component) in labeling.components().iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        if (component.area as f64) < min_area {
            prunable[component.key as usize].push(id);
        }
    }

    let width = work.width() as usize;
    let labels = labeling.labels();
    let mut rewritten = 0;

    for color in order.sort(snapshot.colors()) {
        // every replacement of one color is decided before any of its pixels change
        let replacements = prunable[color]
            .iter()
            .map(|&id| {
                #[allow(clippy::cast_possible_truncation)]
                let id = id as u32;
                let component = &labeling.components()[id as usize];
                let ring = ring(&labeling, id, component);
                (id, component, dominant_color(work.pixels(), &ring))
            })
            .collect::<Vec<_>>();

        for (id, component, replacement) in replacements {
            let Some(replacement) = replacement else {
                tracing::debug!(
                    start = ?component.start,
                    area = component.area,
                    "component has no neighbors, leaving it in place"
                );
                stats.skipped += 1;
                continue;
            };

            let (min_x, min_y, max_x, max_y) = component.bbox;
            let pixels = work.pixels_mut();
            for y in min_y as usize..=max_y as usize {
                for x in min_x as usize..=max_x as usize {
                    let i = y * width + x;
                    if labels[i] == id {
                        pixels[i] = replacement;
                        rewritten += 1;
                    }
                }
            }
            stats.pruned += 1;
        }
    }

    rewritten
}

/// Absorbs the components smaller than `threshold * image.area()` pixels into their surroundings.
///
/// Runs at most `iterations` passes and stops early once a pass leaves the image unchanged.
/// Undersized components may remain after the last pass, so the result is not guaranteed
/// to be free of them.
#[must_use]
pub fn prune(image: &Image, threshold: f64, iterations: u32, order: PruneOrder) -> PruneOutput {
    let mut work = image.clone();
    let mut stats = PruneStats::default();

    for _ in 0..iterations {
        stats.iterations_run += 1;
        let rewritten = prune_pass(&mut work, threshold, order, &mut stats);
        tracing::debug!(iteration = stats.iterations_run, rewritten, "pruning pass finished");
        if rewritten == 0 {
            break;
        }
    }

    PruneOutput { image: work, stats }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    const K: Srgb<u8> = Srgb::new(0, 0, 0);
    const R: Srgb<u8> = Srgb::new(200, 0, 0);
    const G: Srgb<u8> = Srgb::new(0, 250, 0);
    const W: Srgb<u8> = Srgb::new(255, 255, 255);

    fn row(pixels: &[Srgb<u8>]) -> Image {
        Image::new(u32::try_from(pixels.len()).unwrap(), 1, pixels.to_vec()).unwrap()
    }

    #[test]
    fn orders() {
        let colors = [K, W, R, G];
        assert_eq!(PruneOrder::BrightestFirst.sort(&colors), vec![1, 3, 2, 0]);
        assert_eq!(PruneOrder::DarkestFirst.sort(&colors), vec![0, 2, 3, 1]);
        assert_eq!(PruneOrder::Enumeration.sort(&colors), vec![0, 1, 2, 3]);
    }

    #[test]
    fn ties_go_to_the_first_neighbor() {
        let image = row(&[K, K, R, W, W]);
        let output = prune(&image, 0.3, 1, PruneOrder::default());
        assert_eq!(output.image, row(&[K, K, K, W, W]));
        assert_eq!(output.stats, PruneStats { iterations_run: 1, pruned: 1, skipped: 0 });
    }

    #[test]
    fn later_colors_see_earlier_replacements() {
        let image = row(&[K, K, R, G, W, W, W]);

        // G becomes R, then R sees K and the rewritten R and picks K
        let brightest = prune(&image, 0.2, 1, PruneOrder::BrightestFirst);
        assert_eq!(brightest.image, row(&[K, K, K, R, W, W, W]));

        // R becomes K, then G sees K and W and picks K
        let darkest = prune(&image, 0.2, 1, PruneOrder::DarkestFirst);
        assert_eq!(darkest.image, row(&[K, K, K, K, W, W, W]));

        let repeated = prune(&image, 0.2, 3, PruneOrder::BrightestFirst);
        assert_eq!(repeated.image, row(&[K, K, K, K, W, W, W]));
        assert_eq!(repeated.stats.iterations_run, 3);
    }

    #[test]
    fn isolated_component_is_skipped() {
        let image = Image::filled(4, 4, R).unwrap();
        let output = prune(&image, 2.0, 3, PruneOrder::default());
        assert_eq!(output.image, image);
        assert_eq!(output.stats, PruneStats { iterations_run: 1, pruned: 0, skipped: 1 });
    }

    #[test]
    fn zero_threshold_changes_nothing() {
        let image = Image::new(16, 16, random_pixels_with(256, 5)).unwrap();
        let output = prune(&image, 0.0, 3, PruneOrder::default());
        assert_eq!(output.image, image);
        assert_eq!(output.stats.iterations_run, 1);
    }

    #[test]
    fn specks_are_absorbed() {
        let clean = quadrants(40, Srgb::new(250, 0, 0), Srgb::new(0, 0, 250));
        let mut noisy = clean.clone();
        let specks = random_pixels_with(36, 2);
        for (i, &color) in specks.iter().enumerate() {
            let (x, y) = (3 + 7 * (i % 6), 3 + 7 * (i / 6));
            let index = noisy.index(u32::try_from(x).unwrap(), u32::try_from(y).unwrap());
            noisy.pixels_mut()[index] = color;
        }

        let output = prune(&noisy, 0.01, 3, PruneOrder::default());
        assert_eq!(output.image, clean);
        assert_eq!(output.stats.skipped, 0);

        let counts = ColorCounts::new(output.image.pixels());
        let labeling = Labeling::new(40, 40, counts.indices(), Connectivity::Eight);
        assert!(labeling.components().iter().all(|c| c.area >= 16));
    }
}
