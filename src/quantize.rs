//! Color count selection and k-means color quantization.

use crate::{
    kmeans,
    knee::{find_knee, max_difference},
    ColorCounts, Image, KNEE_SAMPLE_SIZE, MAX_CANDIDATE_COLORS,
};
use palette::Srgb;
use rand::{seq::index, Rng};

/// A quantized image together with its palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeOutput {
    /// The distinct colors of `image` in ascending order.
    pub palette: Vec<Srgb<u8>>,
    /// The number of pixels of each palette color.
    pub counts: Vec<u32>,
    /// The quantized image.
    pub image: Image,
}

/// Raises a color count below `floor` by adding `floor` to it.
///
/// Counts at or above the floor are returned unchanged.
/// Note that this adds rather than clamps, so a count of `3` with a floor of `10` becomes `13`.
#[must_use]
pub const fn apply_floor(count: usize, floor: usize) -> usize {
    if count < floor {
        count + floor
    } else {
        count
    }
}

/// Chooses a cluster count for `image` with the knee method, without applying any floor.
///
/// k-means is fit for every candidate count in `1..=MAX_CANDIDATE_COLORS` on the same random
/// sample of at most [`KNEE_SAMPLE_SIZE`] pixels, and the knee of the resulting inertia curve
/// is returned. If there is no knee, the candidate with the largest normalized gain is used.
/// A flat curve (for example, a single colored image) yields `1`.
#[must_use]
pub fn knee_color_count(image: &Image, rng: &mut impl Rng) -> usize {
    let pixels = image.pixels();
    let amount = pixels.len().min(KNEE_SAMPLE_SIZE);
    let sample = index::sample(rng, pixels.len(), amount)
        .into_iter()
        .map(|i| pixels[i])
        .collect::<Vec<_>>();

    let color_counts = ColorCounts::new(&sample);

    let candidates = (1..=MAX_CANDIDATE_COLORS).collect::<Vec<_>>();
    #[allow(clippy::cast_precision_loss)]
    let xs = candidates.iter().map(|&k| k as f64).collect::<Vec<_>>();
    let ys = candidates
        .iter()
        .map(|&k| kmeans::fit(&color_counts, k, rng).inertia)
        .collect::<Vec<_>>();

    tracing::trace!(?ys, "inertia per candidate color count");

    if let Some(i) = find_knee(&xs, &ys) {
        candidates[i]
    } else if let Some(i) = max_difference(&xs, &ys) {
        tracing::debug!("inertia curve has no knee, using the largest gain");
        candidates[i]
    } else {
        1
    }
}

/// Chooses the number of palette colors for `image`:
/// the knee of the k-means inertia curve, raised by [`apply_floor`].
#[must_use]
pub fn select_color_count(image: &Image, floor: u16, rng: &mut impl Rng) -> usize {
    apply_floor(knee_color_count(image, rng), usize::from(floor))
}

/// Reduces `image` to at most `k` colors with k-means in RGB space.
///
/// Every pixel is replaced by the center of its cluster rounded to the nearest byte values.
/// If `k` is at least the number of distinct colors, the image is returned unchanged.
/// A `k` of `0` is treated as `1`.
#[must_use]
pub fn quantize(image: &Image, k: usize, rng: &mut impl Rng) -> QuantizeOutput {
    let color_counts = ColorCounts::new(image.pixels());
    let fit = kmeans::fit(&color_counts, k, rng);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let centroids = fit
        .centroids
        .iter()
        .map(|c| {
            let [r, g, b] = c.map(|v| v.round().clamp(0.0, 255.0) as u8);
            Srgb::new(r, g, b)
        })
        .collect::<Vec<_>>();

    let mut quantized = image.clone();
    for (pixel, &i) in quantized.pixels_mut().iter_mut().zip(color_counts.indices()) {
        *pixel = centroids[fit.assignments[i as usize] as usize];
    }

    let output_counts = ColorCounts::new(quantized.pixels());

    tracing::debug!(
        requested = k,
        input_colors = color_counts.len(),
        output_colors = output_counts.len(),
        inertia = fit.inertia,
        "quantized image"
    );

    QuantizeOutput {
        palette: output_counts.colors().to_vec(),
        counts: output_counts.counts().to_vec(),
        image: quantized,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn floor_is_added_not_clamped() {
        assert_eq!(apply_floor(3, 10), 13);
        assert_eq!(apply_floor(10, 10), 10);
        assert_eq!(apply_floor(12, 10), 12);
        assert_eq!(apply_floor(0, 0), 0);
    }

    #[test]
    fn output_has_at_most_k_colors() {
        let image = Image::new(64, 64, random_pixels_with(64 * 64, 11)).unwrap();
        let mut rng = test_rng();
        for k in [1, 2, 5, 16] {
            let output = quantize(&image, k, &mut rng);
            assert!(output.palette.len() <= k);
            assert_eq!(output.image.width(), image.width());
            assert_eq!(output.image.height(), image.height());
            assert_eq!(output.counts.iter().sum::<u32>() as usize, image.area());
            assert_eq!(ColorCounts::new(output.image.pixels()).colors(), output.palette);
        }
    }

    #[test]
    fn enough_colors_keeps_the_image() {
        let image = quadrants(20, Srgb::new(250, 0, 0), Srgb::new(0, 0, 250));
        let output = quantize(&image, 4, &mut test_rng());
        assert_eq!(output.image, image);
        assert_eq!(output.palette, vec![Srgb::new(0, 0, 250), Srgb::new(250, 0, 0)]);
        assert_eq!(output.counts, vec![200, 200]);
    }

    #[test]
    fn zero_colors_means_one() {
        let image = three_clusters(30, 7);
        let output = quantize(&image, 0, &mut test_rng());
        assert_eq!(output.palette.len(), 1);
    }

    #[test]
    fn solid_image_selects_one_color() {
        let image = Image::filled(16, 16, Srgb::new(40, 80, 120)).unwrap();
        assert_eq!(knee_color_count(&image, &mut test_rng()), 1);
        assert_eq!(select_color_count(&image, 10, &mut test_rng()), 11);
    }

    #[test]
    fn knee_finds_separated_clusters() {
        let image = three_clusters(60, 3);
        let k = select_color_count(&image, 0, &mut test_rng());
        assert!((2..=4).contains(&k), "selected {k} colors");
    }
}
