//! Contains the image buffer and the shape types shared across the pipeline stages.

use crate::{geometry::Polygon, PbnError, MAX_PIXELS};
use palette::{
    cast::{self, AsArrays},
    Srgb,
};
use serde::{Deserialize, Serialize};
#[cfg(feature = "image")]
use {image::RgbImage, palette::cast::ComponentsAs};

/// An owned, row-major RGB image with non-zero dimensions.
///
/// Each pipeline stage takes an [`Image`] and returns a new one,
/// so no two stages ever share a pixel buffer.
///
/// # Examples
/// ```
/// # use pbnkit::{Image, PbnError};
/// # use palette::Srgb;
/// # fn main() -> Result<(), PbnError> {
/// let image = Image::new(2, 1, vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])?;
/// assert_eq!(image.area(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// The number of columns.
    width: u32,
    /// The number of rows.
    height: u32,
    /// The pixels in row-major order.
    pixels: Vec<Srgb<u8>>,
}

impl Image {
    /// Creates a new [`Image`] from a row-major pixel vector.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidImage`] if either dimension is zero,
    /// if the image has more than [`MAX_PIXELS`] pixels,
    /// or if `pixels.len()` is not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Srgb<u8>>) -> Result<Self, PbnError> {
        if width == 0 || height == 0 {
            return Err(PbnError::InvalidImage(format!(
                "zero sized image ({width}x{height})"
            )));
        }

        let expected = u64::from(width) * u64::from(height);
        if expected > u64::from(MAX_PIXELS) {
            return Err(PbnError::InvalidImage(format!(
                "{expected} pixels is above the maximum of {MAX_PIXELS}"
            )));
        }

        if pixels.len() as u64 != expected {
            return Err(PbnError::InvalidImage(format!(
                "expected {expected} pixels for a {width}x{height} image, got {}",
                pixels.len()
            )));
        }

        Ok(Self { width, height, pixels })
    }

    /// Creates a new [`Image`] from interleaved `r, g, b` bytes.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidImage`] if the buffer length is not a multiple of 3
    /// or does not match the dimensions (see [`Image::new`]).
    pub fn from_raw(width: u32, height: u32, buf: Vec<u8>) -> Result<Self, PbnError> {
        if buf.len() % 3 != 0 {
            return Err(PbnError::InvalidImage(format!(
                "buffer length {} is not a multiple of 3",
                buf.len()
            )));
        }

        let pixels = buf
            .chunks_exact(3)
            .map(|c| Srgb::new(c[0], c[1], c[2]))
            .collect();

        Self::new(width, height, pixels)
    }

    /// Creates a new [`Image`] where every pixel is `color`.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidImage`] for the same reasons as [`Image::new`].
    pub fn filled(width: u32, height: u32, color: Srgb<u8>) -> Result<Self, PbnError> {
        let len = usize::try_from(u64::from(width) * u64::from(height))
            .map_err(|e| PbnError::InvalidImage(e.to_string()))?;
        Self::new(width, height, vec![color; len])
    }

    /// The number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The number of pixels, `width * height`.
    #[must_use]
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// The pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[Srgb<u8>] {
        &self.pixels
    }

    /// The pixels in row-major order as component arrays.
    #[must_use]
    pub fn pixel_arrays(&self) -> &[[u8; 3]] {
        self.pixels.as_slice().as_arrays()
    }

    /// Mutable access to the pixels. The dimensions cannot change through this slice.
    pub fn pixels_mut(&mut self) -> &mut [Srgb<u8>] {
        &mut self.pixels
    }

    /// Returns the flat index of the pixel at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside of the image.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Srgb<u8> {
        self.pixels[self.index(x, y)]
    }

    /// Returns the dimensions of the image after adding `border` pixels on every side.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidOption`] for `border_padding` if the padded width or height
    /// does not fit in a `u32` or the padded area exceeds [`MAX_PIXELS`].
    pub fn padded_dimensions(&self, border: u32) -> Result<(u32, u32), PbnError> {
        let grow = |len: u32| u32::try_from(u64::from(len) + 2 * u64::from(border)).ok();
        match (grow(self.width), grow(self.height)) {
            (Some(width), Some(height))
                if u64::from(width) * u64::from(height) <= u64::from(MAX_PIXELS) =>
            {
                Ok((width, height))
            }
            _ => Err(PbnError::InvalidOption {
                option: "border_padding",
                value: f64::from(border),
            }),
        }
    }

    /// Returns a new image with `border` pixels added on every side.
    ///
    /// The border repeats the nearest edge pixel, so padding never adds a new color.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidOption`] if [`Image::padded_dimensions`] rejects `border`.
    pub fn padded(&self, border: u32) -> Result<Self, PbnError> {
        if border == 0 {
            return Ok(self.clone());
        }

        let (width, height) = self.padded_dimensions(border)?;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let sy = y.saturating_sub(border).min(self.height - 1);
            for x in 0..width {
                let sx = x.saturating_sub(border).min(self.width - 1);
                pixels.push(self.get(sx, sy));
            }
        }

        Ok(Self { width, height, pixels })
    }

    /// Consumes the image and returns the interleaved `r, g, b` bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        cast::into_component_vec(self.pixels)
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbImage> for Image {
    type Error = PbnError;

    fn try_from(image: &RgbImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        let buf = &image.as_raw()[..(pixels * 3)];
        let colors: &[Srgb<u8>] = buf.components_as();
        Self::new(image.width(), image.height(), colors.to_vec())
    }
}

#[cfg(feature = "image")]
impl From<Image> for RgbImage {
    fn from(image: Image) -> Self {
        let (width, height) = (image.width, image.height);

        #[allow(clippy::expect_used)]
        {
            // the buffer holds exactly width * height pixels by construction
            RgbImage::from_vec(width, height, image.into_raw()).expect("large enough buffer")
        }
    }
}

/// A closed outline of one color region, created once by the region extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// The id of the shape, unique within one template.
    pub id: u32,
    /// The color the region had in the cleaned image.
    pub color: [u8; 3],
    /// The index of `color` in the template's palette (ascending color order).
    pub color_index: usize,
    /// The outline of the region in canvas coordinates.
    pub polygon: Polygon,
}

/// One palette color and the ids of the shapes drawn in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The palette color.
    pub color: [u8; 3],
    /// The ids of the shapes with this color, in ascending order.
    pub shapes: Vec<u32>,
}

/// The ordered list of palette colors and their shapes,
/// used by a coloring UI to look up which shapes belong to which color.
///
/// Every emitted shape id appears in exactly one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteManifest(pub Vec<ManifestEntry>);

impl PaletteManifest {
    /// Returns the entries in palette order.
    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.0
    }

    /// Returns the number of palette colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the manifest has no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over every shape id in palette order.
    pub fn shape_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().flat_map(|entry| entry.shapes.iter().copied())
    }

    /// Serializes the manifest as a JSON array of `{"color": [r, g, b], "shapes": [...]}`.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
