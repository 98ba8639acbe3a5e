//! Contains the [`TemplatePipeline`] builder struct for the high level API.

use crate::{
    label::place_label,
    prune::prune,
    quantize::{apply_floor, knee_color_count, quantize},
    regions::extract_regions,
    render::{render, Template},
    Image, PbnError, TemplateOptions,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
#[cfg(feature = "image")]
use image::RgbImage;

/// A builder struct that turns an image into a paint-by-number [`Template`].
///
/// The stages run in order and each one hands a new image to the next:
/// 1. quantize the colors (choosing the color count with the knee method if none is given),
/// 2. prune undersized components,
/// 3. pad the border and outline the remaining regions,
/// 4. place a label inside every shape,
/// 5. render the SVG and the palette manifest.
///
/// # Examples
/// ```
/// # use pbnkit::{Image, TemplatePipeline, TemplateOptions};
/// # use palette::Srgb;
/// # fn main() -> Result<(), pbnkit::PbnError> {
/// let image = Image::filled(40, 30, Srgb::new(200, 150, 90))?;
/// let template = TemplatePipeline::new(image)
///     .options(TemplateOptions::new().desired_color_count(Some(4)))
///     .run()?;
///
/// assert_eq!(template.shapes.len(), 1);
/// println!("{}", template.manifest.to_json().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TemplatePipeline {
    /// The input image.
    pub(crate) image: Image,
    /// The options for every stage.
    pub(crate) options: TemplateOptions,
}

impl TemplatePipeline {
    /// Creates a new [`TemplatePipeline`] with default options.
    pub fn new(image: Image) -> Self {
        Self { image, options: TemplateOptions::new() }
    }

    /// Replaces all of the options.
    pub fn options(&mut self, options: TemplateOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Sets the number of palette colors. See [`TemplateOptions::desired_color_count`].
    pub fn desired_color_count(&mut self, count: Option<u16>) -> &mut Self {
        self.options = self.options.desired_color_count(count);
        self
    }

    /// Sets the seed value for the random number generator. See [`TemplateOptions::seed`].
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.options = self.options.seed(seed);
        self
    }

    /// Returns the input image.
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Runs the pipeline with a random number generator seeded from the options.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidOption`] if the options do not pass [`TemplateOptions::validate`].
    pub fn run(&self) -> Result<Template, PbnError> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(self.options.seed);
        self.run_with_rng(&mut rng)
    }

    /// Runs the pipeline, drawing all randomness from `rng`.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidOption`] if the options do not pass [`TemplateOptions::validate`]
    /// or if `border_padding` would grow the canvas past [`MAX_PIXELS`](crate::MAX_PIXELS).
    pub fn run_with_rng(&self, rng: &mut impl Rng) -> Result<Template, PbnError> {
        let options = &self.options;
        options.validate()?;
        self.image.padded_dimensions(options.border_padding)?;

        let quantized = {
            let _span = tracing::info_span!("quantize").entered();
            let requested = match options.desired_color_count {
                Some(count) => usize::from(count),
                None => knee_color_count(&self.image, rng),
            };
            let k = apply_floor(requested, usize::from(options.min_color_floor));
            let output = quantize(&self.image, k, rng);
            tracing::info!(requested, k, colors = output.palette.len(), "quantized colors");
            output
        };

        let pruned = {
            let _span = tracing::info_span!("prune").entered();
            let output = prune(
                &quantized.image,
                options.pruning_threshold,
                options.pruning_iterations,
                options.prune_order,
            );
            tracing::info!(
                iterations = output.stats.iterations_run,
                pruned = output.stats.pruned,
                skipped = output.stats.skipped,
                "pruned small components"
            );
            output.image
        };

        let padded = pruned.padded(options.border_padding)?;

        let regions = {
            let _span = tracing::info_span!("extract").entered();
            let regions = extract_regions(&padded, options.min_shape_area_fraction);
            tracing::info!(shapes = regions.shapes.len(), "extracted shapes");
            regions
        };

        let labels = {
            let _span = tracing::info_span!("label").entered();
            let labels = regions
                .shapes
                .iter()
                .map(|shape| place_label(&shape.polygon, rng))
                .collect::<Vec<_>>();
            let fallbacks = labels.iter().filter(|l| l.fallback).count();
            tracing::info!(labels = labels.len(), fallbacks, "placed labels");
            labels
        };

        let _span = tracing::info_span!("render").entered();
        Ok(render(padded.width(), padded.height(), regions, labels))
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbImage> for TemplatePipeline {
    type Error = PbnError;

    fn try_from(image: &RgbImage) -> Result<Self, Self::Error> {
        Image::try_from(image).map(Self::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use palette::Srgb;
    use std::collections::BTreeSet;

    fn assert_valid(template: &Template, min_area: f64) {
        assert_eq!(template.shapes.len(), template.labels.len());
        assert_eq!(template.manifest.len(), template.palette.len());

        let ids = template.manifest.shape_ids().collect::<BTreeSet<_>>();
        let shape_ids = template.shapes.iter().map(|s| s.id).collect::<BTreeSet<_>>();
        assert_eq!(ids, shape_ids);
        assert_eq!(ids.len(), template.shapes.len());

        for (shape, label) in template.shapes.iter().zip(&template.labels) {
            assert!(shape.polygon.area() >= min_area);
            assert!(label.fallback || shape.polygon.contains(label.x, label.y));
            assert_eq!(template.drawing.matches(&format!("<g id=\"{}\"", shape.id)).count(), 1);
        }
    }

    #[test]
    fn solid_image() {
        let image = Image::filled(100, 100, Srgb::new(90, 140, 200)).unwrap();
        let template = TemplatePipeline::new(image)
            .desired_color_count(Some(1))
            .run()
            .unwrap();

        assert_eq!((template.width, template.height), (110, 110));
        assert_eq!(template.shapes.len(), 1);
        assert_eq!(template.manifest.len(), 1);
        assert_eq!(template.manifest.entries()[0].color, [90, 140, 200]);
        assert_eq!(template.manifest.entries()[0].shapes, vec![0]);
        assert!(template.drawing.contains(r#"viewBox="0 0 110 110""#));
        assert_valid(&template, 0.001 * 110.0 * 110.0);
    }

    #[test]
    fn two_color_quadrants() {
        let image = quadrants(100, Srgb::new(255, 255, 255), Srgb::new(0, 0, 0));
        let options = TemplateOptions::new()
            .desired_color_count(Some(2))
            .min_color_floor(0)
            .pruning_threshold(0.0)
            .min_shape_area_fraction(1e-6);
        let template = TemplatePipeline::new(image).options(options).run().unwrap();

        assert_eq!(template.shapes.len(), 4);
        assert_eq!(template.manifest.len(), 2);
        for entry in template.manifest.entries() {
            assert_eq!(entry.shapes.len(), 2);
        }
        assert_valid(&template, 1e-6 * 110.0 * 110.0);
    }

    #[test]
    fn separated_clusters_choose_their_count() {
        let image = three_clusters(60, 1);
        let template = TemplatePipeline::new(image)
            .options(TemplateOptions::new().min_color_floor(0))
            .run()
            .unwrap();

        assert!((2..=4).contains(&template.palette.len()), "{} colors", template.palette.len());
        assert_valid(&template, 0.001 * 70.0 * 70.0);
    }

    #[test]
    fn same_seed_same_template() {
        let image = Image::new(48, 48, random_pixels_with(48 * 48, 8)).unwrap();
        let mut pipeline = TemplatePipeline::new(image);
        pipeline.options(TemplateOptions::new().desired_color_count(Some(4)).min_color_floor(0));

        let first = pipeline.seed(3).run().unwrap();
        let second = pipeline.seed(3).run().unwrap();
        assert_eq!(first, second);
        assert!(first.palette.len() <= 4);
        assert_valid(&first, 0.001 * 58.0 * 58.0);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let image = Image::filled(4, 4, Srgb::new(0, 0, 0)).unwrap();
        let result = TemplatePipeline::new(image)
            .options(TemplateOptions::new().min_shape_area_fraction(2.0))
            .run();
        assert!(matches!(
            result,
            Err(PbnError::InvalidOption { option: "min_shape_area_fraction", .. })
        ));
    }

    #[test]
    fn oversized_border_is_rejected() {
        let image = Image::filled(2, 2, Srgb::new(0, 0, 0)).unwrap();
        for border in [1 << 31, u32::MAX / 4] {
            let result = TemplatePipeline::new(image.clone())
                .options(TemplateOptions::new().border_padding(border))
                .run();
            assert!(matches!(
                result,
                Err(PbnError::InvalidOption { option: "border_padding", .. })
            ));
        }
    }
}
