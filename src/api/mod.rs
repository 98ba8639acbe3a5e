//! Contains the types and functions for the high level pipeline builder API.

mod template_pipeline;

pub use template_pipeline::TemplatePipeline;

use crate::{PbnError, PruneOrder};
use serde::{Deserialize, Serialize};

/// A builder struct to specify the parameters for template generation.
///
/// Options can also be loaded from JSON, where missing fields keep their defaults.
///
/// # Examples
/// ```
/// # use pbnkit::{TemplateOptions, PruneOrder};
/// let options = TemplateOptions::new()
///     .desired_color_count(Some(12))
///     .prune_order(PruneOrder::DarkestFirst)
///     .seed(42);
/// # assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// The number of palette colors, or `None` to choose it automatically.
    pub(crate) desired_color_count: Option<u16>,
    /// Color counts below this are raised by adding it.
    pub(crate) min_color_floor: u16,
    /// Components smaller than this fraction of the image area are pruned.
    pub(crate) pruning_threshold: f64,
    /// The maximum number of pruning passes.
    pub(crate) pruning_iterations: u32,
    /// The order in which colors are visited while pruning.
    pub(crate) prune_order: PruneOrder,
    /// Shapes smaller than this fraction of the padded canvas area are dropped.
    pub(crate) min_shape_area_fraction: f64,
    /// The number of pixels added on every side before outlining.
    pub(crate) border_padding: u32,
    /// The seed value for the random number generator.
    pub(crate) seed: u64,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateOptions {
    /// Creates a new [`TemplateOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            desired_color_count: None,
            min_color_floor: 10,
            pruning_threshold: 6.25e-5,
            pruning_iterations: 3,
            prune_order: PruneOrder::BrightestFirst,
            min_shape_area_fraction: 0.001,
            border_padding: 5,
            seed: 0,
        }
    }

    /// Sets the number of palette colors.
    ///
    /// With `None` (the default), the count is chosen with the knee method.
    /// Either way, counts below the [color floor](TemplateOptions::min_color_floor)
    /// are raised by adding the floor.
    #[must_use]
    pub const fn desired_color_count(mut self, count: Option<u16>) -> Self {
        self.desired_color_count = count;
        self
    }

    /// Sets the color floor. A color count below the floor has the floor added to it,
    /// so `3` colors with a floor of `10` becomes `13`.
    ///
    /// The default floor is `10`. A floor of `0` leaves the count alone.
    #[must_use]
    pub const fn min_color_floor(mut self, floor: u16) -> Self {
        self.min_color_floor = floor;
        self
    }

    /// Sets the fraction of the image area below which a component is absorbed by its surroundings.
    ///
    /// The default threshold is `6.25e-5`.
    #[must_use]
    pub const fn pruning_threshold(mut self, threshold: f64) -> Self {
        self.pruning_threshold = threshold;
        self
    }

    /// Sets the maximum number of pruning passes.
    ///
    /// The default is `3`.
    #[must_use]
    pub const fn pruning_iterations(mut self, iterations: u32) -> Self {
        self.pruning_iterations = iterations;
        self
    }

    /// Sets the order in which colors are pruned.
    ///
    /// The default is [`PruneOrder::BrightestFirst`].
    #[must_use]
    pub const fn prune_order(mut self, order: PruneOrder) -> Self {
        self.prune_order = order;
        self
    }

    /// Sets the fraction of the padded canvas area below which shapes are dropped.
    ///
    /// The default is `0.001`.
    #[must_use]
    pub const fn min_shape_area_fraction(mut self, fraction: f64) -> Self {
        self.min_shape_area_fraction = fraction;
        self
    }

    /// Sets the width of the border added around the image before outlining.
    ///
    /// The default is `5` pixels.
    #[must_use]
    pub const fn border_padding(mut self, border: u32) -> Self {
        self.border_padding = border;
        self
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that the fractional options are usable.
    ///
    /// # Errors
    /// Returns [`PbnError::InvalidOption`] if the pruning threshold is negative or not finite,
    /// or if the minimum shape area fraction is outside of `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), PbnError> {
        let threshold = self.pruning_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PbnError::InvalidOption { option: "pruning_threshold", value: threshold });
        }

        let fraction = self.min_shape_area_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PbnError::InvalidOption {
                option: "min_shape_area_fraction",
                value: fraction,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_fractions() {
        assert!(TemplateOptions::new().validate().is_ok());
        assert_eq!(
            TemplateOptions::new().pruning_threshold(f64::NAN).validate().map_err(|e| match e {
                PbnError::InvalidOption { option, .. } => option,
                PbnError::InvalidImage(_) => "",
            }),
            Err("pruning_threshold")
        );
        assert!(TemplateOptions::new().pruning_threshold(-1e-3).validate().is_err());
        assert!(TemplateOptions::new().min_shape_area_fraction(1.5).validate().is_err());
        assert!(TemplateOptions::new().min_shape_area_fraction(f64::INFINITY).validate().is_err());
        assert!(TemplateOptions::new().min_shape_area_fraction(0.0).validate().is_ok());
    }

    #[test]
    fn json_fills_in_defaults() {
        let options: TemplateOptions =
            serde_json::from_str(r#"{"desired_color_count": 8, "prune_order": "darkest_first"}"#).unwrap();
        assert_eq!(
            options,
            TemplateOptions::new()
                .desired_color_count(Some(8))
                .prune_order(PruneOrder::DarkestFirst)
        );

        let round_trip: TemplateOptions =
            serde_json::from_str(&serde_json::to_string(&options).unwrap()).unwrap();
        assert_eq!(round_trip, options);
    }
}
