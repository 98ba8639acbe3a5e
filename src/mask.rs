//! Binary masks over the pixel grid and the 3x3 Laplacian used to find their edges.

use crate::components::Connectivity;
use bitvec::vec::BitVec;
use std::collections::VecDeque;

/// The response of the kernel `[[0, 1, 0], [1, -4, 1], [0, 1, 0]]` at `(x, y)`.
///
/// `inside` reports whether a pixel belongs to the mask.
/// Callers decide how pixels outside of the canvas are treated; this crate always treats them as `0`.
///
/// A negative response marks a mask pixel on the edge of the mask.
/// A positive response marks a pixel outside of the mask that touches it.
#[inline]
pub fn laplacian(inside: impl Fn(i64, i64) -> bool, x: i64, y: i64) -> i32 {
    let neighbors = Connectivity::Four
        .offsets()
        .iter()
        .filter(|&&(dx, dy)| inside(x + i64::from(dx), y + i64::from(dy)))
        .count();

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let neighbors = neighbors as i32;

    if inside(x, y) {
        neighbors - 4
    } else {
        neighbors
    }
}

/// A set of pixels on a `width` by `height` canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMask {
    /// The number of columns.
    width: u32,
    /// The number of rows.
    height: u32,
    /// One bit per pixel in row-major order.
    bits: BitVec,
}

impl ColorMask {
    /// Creates the exact-match mask of `key` over a grid of keys.
    ///
    /// # Panics
    /// Panics if `keys.len()` is not `width * height`.
    #[must_use]
    pub fn new(width: u32, height: u32, keys: &[u32], key: u32) -> Self {
        assert_eq!(keys.len(), width as usize * height as usize);
        Self {
            width,
            height,
            bits: keys.iter().map(|&k| k == key).collect(),
        }
    }

    /// Whether `(x, y)` is in the mask. Coordinates outside of the canvas are never in the mask.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let i = y as usize * self.width as usize + x as usize;
        self.bits[i]
    }

    /// The number of pixels in the mask.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Returns the mask pixels with a negative Laplacian response,
    /// i.e. the mask pixels with at least one horizontal or vertical neighbor outside of the mask.
    #[must_use]
    pub fn boundary(&self) -> Self {
        let mut bits = BitVec::repeat(false, self.bits.len());
        for i in self.bits.iter_ones() {
            #[allow(clippy::cast_possible_wrap)]
            let (x, y) = (
                (i % self.width as usize) as i64,
                (i / self.width as usize) as i64,
            );
            if laplacian(|x, y| self.contains(x, y), x, y) < 0 {
                bits.set(i, true);
            }
        }
        Self { width: self.width, height: self.height, bits }
    }

    /// Returns the pixels outside of the mask that can reach the edge of the canvas
    /// through other pixels outside of the mask, moving in any of the 8 directions.
    #[must_use]
    pub fn background(&self) -> Self {
        let (width, height) = (self.width as usize, self.height as usize);
        let mut bits = BitVec::repeat(false, self.bits.len());
        let mut queue = VecDeque::new();

        for y in 0..height {
            for x in 0..width {
                let on_edge = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
                let i = y * width + x;
                if on_edge && !self.bits[i] {
                    bits.set(i, true);
                    queue.push_back((x, y));
                }
            }
        }

        while let Some((x, y)) = queue.pop_front() {
            for &(dx, dy) in Connectivity::Eight.offsets() {
                let (Some(nx), Some(ny)) = (
                    x.checked_add_signed(dx as isize),
                    y.checked_add_signed(dy as isize),
                ) else {
                    continue;
                };
                if nx >= width || ny >= height {
                    continue;
                }

                let n = ny * width + nx;
                if !self.bits[n] && !bits[n] {
                    bits.set(n, true);
                    queue.push_back((nx, ny));
                }
            }
        }

        Self { width: self.width, height: self.height, bits }
    }
}
