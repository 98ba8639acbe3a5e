#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::{bilateral_filter, median_filter};
use pbnkit::{PruneOrder, TemplateOptions, TemplatePipeline};

#[derive(Copy, Clone, ValueEnum)]
enum CliPruneOrder {
    Brightest,
    Darkest,
    Simple,
}

impl From<CliPruneOrder> for PruneOrder {
    fn from(value: CliPruneOrder) -> Self {
        match value {
            CliPruneOrder::Brightest => PruneOrder::BrightestFirst,
            CliPruneOrder::Darkest => PruneOrder::DarkestFirst,
            CliPruneOrder::Simple => PruneOrder::Enumeration,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum BlurKind {
    Gaussian,
    Median,
    Bilateral,
}

/// Turns an image into a paint-by-number SVG and a JSON palette manifest.
#[derive(Parser)]
pub struct Options {
    /// JSON file with template options. Flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of palette colors (chosen automatically if omitted).
    #[arg(short, long)]
    k: Option<u16>,

    /// Color counts below this have it added to them.
    #[arg(long)]
    floor: Option<u16>,

    /// Components smaller than this fraction of the image are absorbed.
    #[arg(long)]
    pruning_threshold: Option<f64>,

    #[arg(long)]
    pruning_iterations: Option<u32>,

    #[arg(long, value_enum)]
    prune_order: Option<CliPruneOrder>,

    /// Shapes smaller than this fraction of the canvas are dropped.
    #[arg(long)]
    min_shape_area: Option<f64>,

    #[arg(long)]
    border: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Downscale the input until it has at most this many pixels (0 disables).
    #[arg(long, default_value_t = 200_000)]
    max_pixels: u32,

    /// Blur applied before quantization.
    #[arg(long, value_enum)]
    blur: Option<BlurKind>,

    /// Kernel size of the median and bilateral blurs.
    #[arg(long, default_value_t = 13)]
    blur_size: u32,

    /// Standard deviation of the Gaussian blur.
    #[arg(long, default_value_t = 3.0)]
    blur_sigma: f32,

    /// How far apart two intensities may be and still be mixed by the bilateral blur.
    #[arg(long, default_value_t = 21.0)]
    blur_color_sigma: f32,

    /// Spatial standard deviation of the bilateral blur.
    #[arg(long, default_value_t = 21.0)]
    blur_space_sigma: f32,

    input: PathBuf,

    /// Where to write the SVG drawing.
    output: PathBuf,

    /// Where to write the palette manifest (defaults to the output path with a `.json` extension).
    #[arg(long)]
    manifest: Option<PathBuf>,
}

impl Options {
    fn template_options(&self) -> anyhow::Result<TemplateOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?
            }
            None => TemplateOptions::new(),
        };

        if let Some(k) = self.k {
            options = options.desired_color_count(Some(k));
        }
        if let Some(floor) = self.floor {
            options = options.min_color_floor(floor);
        }
        if let Some(threshold) = self.pruning_threshold {
            options = options.pruning_threshold(threshold);
        }
        if let Some(iterations) = self.pruning_iterations {
            options = options.pruning_iterations(iterations);
        }
        if let Some(order) = self.prune_order {
            options = options.prune_order(order.into());
        }
        if let Some(fraction) = self.min_shape_area {
            options = options.min_shape_area_fraction(fraction);
        }
        if let Some(border) = self.border {
            options = options.border_padding(border);
        }
        if let Some(seed) = self.seed {
            options = options.seed(seed);
        }

        options.validate()?;
        Ok(options)
    }
}

/// Shrinks `image` so that it has at most `max_pixels` pixels, keeping its aspect ratio.
fn downscale(image: RgbImage, max_pixels: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let pixels = u64::from(width) * u64::from(height);
    if max_pixels == 0 || pixels <= u64::from(max_pixels) {
        return image;
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (new_width, new_height) = {
        let scale = (f64::from(max_pixels) / pixels as f64).sqrt();
        (
            ((f64::from(width) * scale) as u32).max(1),
            ((f64::from(height) * scale) as u32).max(1),
        )
    };

    tracing::info!(width, height, new_width, new_height, "downscaling input");
    imageops::resize(&image, new_width, new_height, imageops::FilterType::Triangle)
}

impl BlurKind {
    fn apply(self, image: &RgbImage, cli: &Options) -> RgbImage {
        tracing::info!(size = cli.blur_size, sigma = cli.blur_sigma, "blurring input");
        match self {
            BlurKind::Gaussian => imageops::blur(image, cli.blur_sigma),
            BlurKind::Median => {
                let radius = cli.blur_size / 2;
                median_filter(image, radius, radius)
            }
            BlurKind::Bilateral => per_channel(image, |channel| {
                bilateral_filter(channel, cli.blur_size, cli.blur_color_sigma, cli.blur_space_sigma)
            }),
        }
    }
}

/// Runs a grayscale filter over each of the red, green and blue channels.
fn per_channel(image: &RgbImage, filter: impl Fn(&GrayImage) -> GrayImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let [r, g, b] = [0, 1, 2].map(|c| {
        filter(&GrayImage::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y)[c]])))
    });
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([r.get_pixel(x, y)[0], g.get_pixel(x, y)[0], b.get_pixel(x, y)[0]])
    })
}

fn write(path: &Path, contents: impl AsRef<[u8]>) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Options::parse();
    let options = cli.template_options()?;

    let image = image::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?
        .into_rgb8();
    let mut image = downscale(image, cli.max_pixels);
    if let Some(kind) = cli.blur {
        image = kind.apply(&image, &cli);
    }

    let time = std::time::Instant::now();
    let template = TemplatePipeline::try_from(&image)?.options(options).run()?;
    tracing::info!(
        shapes = template.shapes.len(),
        colors = template.palette.len(),
        millis = time.elapsed().as_millis(),
        "generated template"
    );

    write(&cli.output, &template.drawing)?;

    let manifest = cli.manifest.unwrap_or_else(|| cli.output.with_extension("json"));
    write(&manifest, template.manifest.to_json()?)?;

    Ok(())
}
