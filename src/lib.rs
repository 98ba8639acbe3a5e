//! A library for turning photographs into paint-by-number templates.
//!
//! `pbnkit` reduces an image to a small palette with k-means,
//! cleans up the specks that would be impossible to paint,
//! outlines the remaining single-color regions, and numbers every region with its palette index.
//!
//! # Features
//! - `image`: enables integration with the [`image`] crate.
//!
//! # High-Level API
//! To get started with the high-level API, see [`TemplatePipeline`]. Here is a short example:
//! ```no_run
//! # use pbnkit::{TemplatePipeline, TemplateOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgb8();
//!
//! let template = TemplatePipeline::try_from(&img)?
//!     .options(TemplateOptions::new().desired_color_count(Some(16)))
//!     .run()?;
//!
//! std::fs::write("template.svg", &template.drawing)?;
//! std::fs::write("palette.json", template.manifest.to_json()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Low-Level API
//! Each stage is also available on its own:
//! [`quantize`](quantize::quantize), [`prune`](prune::prune),
//! [`extract_regions`](regions::extract_regions), [`place_label`](label::place_label),
//! and [`render`](render::render).
//! They take an explicit random number generator where randomness is involved.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod color_counts;
mod error;
mod types;

pub mod components;
pub mod contour;
pub mod geometry;
pub mod kmeans;
pub mod knee;
pub mod label;
pub mod mask;
pub mod prune;
pub mod quantize;
pub mod regions;
pub mod render;

pub use api::*;
pub use color_counts::*;
pub use error::*;
pub use label::Label;
pub use prune::{PruneOrder, PruneStats};
pub use render::Template;
pub use types::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The largest color count tried when choosing the number of colors automatically.
pub const MAX_CANDIDATE_COLORS: usize = 24;

/// The maximum number of pixels sampled when choosing the number of colors automatically.
pub const KNEE_SAMPLE_SIZE: usize = 10_000;

/// The number of candidate points sampled when placing a label.
pub const LABEL_SAMPLES: usize = 150;
