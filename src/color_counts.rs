//! Contains the code for color/pixel deduplication.
//!
//! The distinct colors of an image are always kept in ascending `(r, g, b)` order.
//! This is the color enumeration order used by every later stage:
//! masks, manifest entries, and label numbers all follow it.

use bitvec::vec::BitVec;
use palette::{cast::AsArrays, Srgb};
use std::ops::Range;

/// A byte-sized Radix
const RADIX: usize = u8::MAX as usize + 1;

/// Returns the range associated with the `i`-th chunk.
#[inline]
fn chunk_range(chunks: &[u32], i: usize) -> Range<usize> {
    (chunks[i] as usize)..(chunks[i + 1] as usize)
}

/// Deduplicated colors, their frequency counts, and the index of each pixel's color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorCounts {
    /// The unique colors in ascending order.
    colors: Vec<Srgb<u8>>,
    /// The number of times each color was present in the original pixels.
    counts: Vec<u32>,
    /// The index into `colors` for each of the original pixels.
    indices: Vec<u32>,
}

impl ColorCounts {
    /// Deduplicates the given pixels.
    ///
    /// The pixels are bucketed by their red component with a counting sort,
    /// then each bucket is deduplicated over a green-blue bitmask,
    /// which yields the unique colors already sorted.
    #[must_use]
    pub fn new(pixels: &[Srgb<u8>]) -> Self {
        if pixels.is_empty() {
            return Self::default();
        }

        let pixels: &[[u8; 3]] = pixels.as_arrays();

        let mut red_prefix = vec![0u32; RADIX + 1];
        for &[r, ..] in pixels {
            red_prefix[usize::from(r) + 1] += 1;
        }
        for i in 1..=RADIX {
            red_prefix[i] += red_prefix[i - 1];
        }

        let mut next = red_prefix.clone();
        let mut orig_index = vec![0u32; pixels.len()];
        let mut green_blue = vec![[0u8; 2]; pixels.len()];
        for (i, &[r, g, b]) in pixels.iter().enumerate() {
            let slot = &mut next[usize::from(r)];
            green_blue[*slot as usize] = [g, b];
            #[allow(clippy::cast_possible_truncation)]
            {
                orig_index[*slot as usize] = i as u32;
            }
            *slot += 1;
        }

        let mut colors = Vec::new();
        let mut counts = Vec::new();
        let mut indices = vec![0u32; pixels.len()];

        let mut lower = vec![0u32; RADIX * RADIX];
        let mut bitmask: BitVec = BitVec::repeat(false, RADIX * RADIX);

        for r in 0..RADIX {
            let chunk = chunk_range(&red_prefix, r);
            if chunk.is_empty() {
                continue;
            }

            let green_blue = &green_blue[chunk.clone()];
            let orig_index = &orig_index[chunk];

            for &[g, b] in green_blue {
                let i = usize::from(g) * RADIX + usize::from(b);
                lower[i] += 1;
                bitmask.set(i, true);
            }

            for i in bitmask.iter_ones() {
                counts.push(lower[i]);
                #[allow(clippy::cast_possible_truncation)]
                {
                    lower[i] = colors.len() as u32;
                    colors.push(Srgb::new(r as u8, (i / RADIX) as u8, (i % RADIX) as u8));
                }
            }

            for (&orig, &[g, b]) in orig_index.iter().zip(green_blue) {
                indices[orig as usize] = lower[usize::from(g) * RADIX + usize::from(b)];
            }

            for i in bitmask.iter_ones() {
                lower[i] = 0;
            }
            bitmask.fill(false);
        }

        Self { colors, counts, indices }
    }

    /// Returns the slice of unique colors in ascending order.
    #[must_use]
    pub fn colors(&self) -> &[Srgb<u8>] {
        &self.colors
    }

    /// Returns the unique colors as component arrays.
    #[must_use]
    pub fn color_components(&self) -> &[[u8; 3]] {
        self.colors.as_slice().as_arrays()
    }

    /// Returns how many times each unique color was present in the original pixels.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Returns the index into [`ColorCounts::colors`] for each of the original pixels.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the number of original pixels.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns the number of unique colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether there are no colors at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn assert_valid(counts: &ColorCounts, pixels: &[Srgb<u8>]) {
        assert_eq!(counts.total_count(), pixels.len());

        let colors = counts.colors();
        let mut expected = vec![0; colors.len()];
        for (&i, &color) in counts.indices().iter().zip(pixels) {
            assert_eq!(colors[i as usize], color);
            expected[i as usize] += 1;
        }
        assert_eq!(expected, counts.counts());

        let components = counts.color_components();
        for i in 1..components.len() {
            assert!(components[i - 1] < components[i]);
        }
    }

    #[test]
    fn empty_input() {
        let counts = ColorCounts::new(&[]);
        assert!(counts.is_empty() && counts.counts().is_empty() && counts.indices().is_empty());
        assert_eq!(counts.total_count(), 0);
    }

    #[test]
    fn random_pixels() {
        let pixels = random_pixels_with(4096, 7);
        assert_valid(&ColorCounts::new(&pixels), &pixels);
    }

    #[test]
    fn repeated_colors_are_merged() {
        let a = Srgb::new(200, 3, 3);
        let b = Srgb::new(3, 200, 3);
        let pixels = vec![a, b, a, a, b];
        let counts = ColorCounts::new(&pixels);

        assert_eq!(counts.colors(), &[b, a]);
        assert_eq!(counts.counts(), &[2, 3]);
        assert_eq!(counts.indices(), &[1, 0, 1, 1, 0]);
        assert_valid(&counts, &pixels);
    }
}
