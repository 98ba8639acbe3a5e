//! SVG output for finished templates.

use crate::{label::Label, regions::Regions, PaletteManifest, Shape};
use palette::Srgb;
use std::fmt::Write;

/// A finished paint-by-number template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// The width of the canvas, including the border.
    pub width: u32,
    /// The height of the canvas, including the border.
    pub height: u32,
    /// The colors to paint with in ascending order. Label numbers index into this list.
    pub palette: Vec<Srgb<u8>>,
    /// The outlined shapes in id order.
    pub shapes: Vec<Shape>,
    /// The label of each shape, parallel to `shapes`.
    pub labels: Vec<Label>,
    /// The shape ids of each palette color.
    pub manifest: PaletteManifest,
    /// The SVG document.
    pub drawing: String,
}

/// Writes the SVG document for the given shapes and their labels.
///
/// Each shape becomes a `<g>` element with the shape id as its `id`, holding a white polygon
/// with a black outline and the palette index of its color as centered text.
///
/// # Panics
/// Panics if `shapes` and `labels` have different lengths.
#[must_use]
pub fn render_svg(width: u32, height: u32, shapes: &[Shape], labels: &[Label]) -> String {
    assert_eq!(shapes.len(), labels.len());

    let mut svg = String::new();
    // writing into a String cannot fail
    let _ = write_svg(&mut svg, width, height, shapes, labels);
    svg
}

/// Writes the whole SVG document into `out`.
fn write_svg(
    out: &mut impl Write,
    width: u32,
    height: u32,
    shapes: &[Shape],
    labels: &[Label],
) -> std::fmt::Result {
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    )?;

    for (shape, label) in shapes.iter().zip(labels) {
        write!(out, r#"<g id="{}" fill="white" stroke="black"><polygon points=""#, shape.id)?;
        for (i, p) in shape.polygon.points().iter().enumerate() {
            let sep = if i == 0 { "" } else { " " };
            write!(out, "{sep}{},{}", p.x, p.y)?;
        }
        writeln!(
            out,
            r#""/><text x="{:.2}" y="{:.2}" font-size="{:.2}" text-anchor="middle">{}</text></g>"#,
            label.x, label.y, label.size, shape.color_index
        )?;
    }

    writeln!(out, "</svg>")
}

/// Assembles the template for the extracted regions of a `width` by `height` canvas.
///
/// # Panics
/// Panics if `labels` is not parallel to `regions.shapes`.
#[must_use]
pub fn render(width: u32, height: u32, regions: Regions, labels: Vec<Label>) -> Template {
    let drawing = render_svg(width, height, &regions.shapes, &labels);
    Template {
        width,
        height,
        palette: regions.palette,
        shapes: regions.shapes,
        labels,
        manifest: regions.manifest,
        drawing,
    }
}
