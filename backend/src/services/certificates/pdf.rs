//! Paints a `CertificateLayout` into a single-page PDF.
//!
//! The page is exactly the canvas size. A white background without an image is left as
//! bare paper. A solid color is a single pixel stretched over the page. A background
//! image is scaled to cover the canvas at one pixel per unit (capped at
//! `MAX_RASTER_SIDE`), flattened to RGB, written as a temporary PNG and embedded at the
//! page origin. Text fields are painted on top at absolute positions by `CanvasElement`,
//! wrapped to the width of their box.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use genpdf::elements::Image as PdfImage;
use genpdf::Scale;
use genpdf::fonts::{Font, FontData, FontFamily};
use genpdf::render::Area;
use genpdf::style::{Color, Style};
use genpdf::{Context, Document, Element, Mm, Position, RenderResult, Size};
use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, RgbImage};
use log::{debug, warn};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::ExportError;
use crate::services::certificates::render::{
    aligned_x, centered_y, wrap_lines, CertificateLayout, PlacedField, Rgb, FIELD_PADDING,
    UNIT_TO_MM, UNIT_TO_PT, WHITE,
};

/// Families tried, in order, for text whose own family is unavailable.
const DEFAULT_FAMILIES: [&str; 3] = ["Arial", "LiberationSans", "DejaVuSans"];
/// Longest side of a background image raster, in pixels.
const MAX_RASTER_SIDE: u32 = 4096;

/// Font families available to a batch of renders, loaded once from the fonts directory.
///
/// Files follow genpdf's naming: `<Family>-Regular.ttf`, `<Family>-Bold.ttf`,
/// `<Family>-Italic.ttf`, `<Family>-BoldItalic.ttf`, where `<Family>` is the editor's
/// family name without spaces (`Times New Roman` -> `TimesNewRoman`).
#[derive(Clone)]
pub struct FontSet {
    default: FontFamily<FontData>,
    named: HashMap<String, FontFamily<FontData>>,
}

fn family_file_stem(family: &str) -> String {
    family.chars().filter(|c| !c.is_whitespace()).collect()
}

impl FontSet {
    /// Loads the default family plus every distinct family in `families` that has files in
    /// `dir`. Missing families fall back to the default with a warning.
    pub fn load<'a, I>(dir: &Path, families: I) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let default = DEFAULT_FAMILIES
            .iter()
            .find_map(|name| genpdf::fonts::from_files(dir, name, None).ok())
            .ok_or_else(|| ExportError::Font(dir.display().to_string()))?;

        let mut named = HashMap::new();
        for family in families {
            if named.contains_key(family) {
                continue;
            }
            match genpdf::fonts::from_files(dir, &family_file_stem(family), None) {
                Ok(data) => {
                    named.insert(family.to_string(), data);
                }
                Err(e) => warn!("Font family '{}' unavailable ({}), using default", family, e),
            }
        }
        Ok(FontSet { default, named })
    }
}

/// Renders `layout` into PDF bytes. Nothing touches the disk except the temporary
/// background PNG, which is removed before returning.
pub fn render_pdf(layout: &CertificateLayout, fonts: &FontSet) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::new(fonts.default.clone());
    doc.set_title(format!("Certificate {}", layout.template_id));
    doc.set_paper_size(Size::new(layout.width_mm(), layout.height_mm()));

    let families: HashMap<String, FontFamily<Font>> = fonts
        .named
        .iter()
        .map(|(name, data)| (name.clone(), doc.add_font_family(data.clone())))
        .collect();

    // Keep the temporary PNG alive until rendering finishes.
    let (background_file, background) = match background_image(layout)? {
        Some((file, image)) => (Some(file), Some(image)),
        None => (None, None),
    };

    let fields = layout
        .fields
        .iter()
        .map(|field| PaintedField {
            field: field.clone(),
            family: families.get(&field.font_family).copied(),
        })
        .collect();
    doc.push(CanvasElement { background, fields });

    let mut out = Vec::new();
    doc.render(&mut out)?;
    drop(background_file);

    debug!(
        "Rendered certificate for template {} ({} field(s), {:?})",
        layout.template_id,
        layout.fields.len(),
        layout.orientation
    );
    Ok(out)
}

struct PaintedField {
    field: PlacedField,
    family: Option<FontFamily<Font>>,
}

/// Paints the background and every field at absolute positions on one page.
struct CanvasElement {
    background: Option<PdfImage>,
    fields: Vec<PaintedField>,
}

fn mm(units: f64) -> Mm {
    Mm::from(units * UNIT_TO_MM)
}

fn font_size_pt(px: u32) -> u8 {
    (px as f64 * UNIT_TO_PT).round().clamp(1.0, u8::MAX as f64) as u8
}

impl Element for CanvasElement {
    fn render(
        &mut self,
        context: &Context,
        area: Area<'_>,
        style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        if let Some(background) = self.background.as_mut() {
            background.render(context, area.clone(), style)?;
        }

        for painted in &self.fields {
            let field = &painted.field;
            if field.text.is_empty() {
                continue;
            }

            let Rgb(r, g, b) = field.color;
            let mut text_style = style
                .with_font_size(font_size_pt(field.font_size))
                .with_color(Color::Rgb(r, g, b));
            if let Some(family) = painted.family {
                text_style.set_font_family(family);
            }
            if field.bold {
                text_style.set_bold();
            }

            let max_width = mm(field.width - 2.0 * FIELD_PADDING);
            let lines = wrap_lines(&field.text, max_width, |s| {
                text_style.str_width(&context.font_cache, s)
            });
            let line_height = text_style.line_height(&context.font_cache);
            let mut y = centered_y(
                mm(field.y),
                mm(field.height),
                line_height * lines.len() as f64,
            );

            for line in &lines {
                let text_width = text_style.str_width(&context.font_cache, line);
                let x = aligned_x(
                    mm(field.x),
                    mm(field.width),
                    text_width,
                    mm(FIELD_PADDING),
                    field.align,
                );
                let printed =
                    area.print_str(&context.font_cache, Position::new(x, y), text_style, line)?;
                if !printed {
                    warn!("A line of field {} does not fit on the page and was skipped", field.id);
                }
                y += line_height;
            }
        }

        Ok(RenderResult {
            size: area.size(),
            has_more: false,
        })
    }
}

/// Decodes a background image reference: a `data:` URL with base64 payload, or a path.
fn read_image_source(source: &str) -> Result<Vec<u8>, ExportError> {
    if let Some(rest) = source.strip_prefix("data:") {
        let (_, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| ExportError::Background("only base64 data URLs are supported".into()))?;
        return BASE64
            .decode(payload.trim())
            .map_err(|e| ExportError::Background(e.to_string()));
    }
    std::fs::read(PathBuf::from(source)).map_err(|e| ExportError::Background(e.to_string()))
}

/// Pixel size of a background image raster for a `width x height` canvas: one pixel per
/// unit, shrunk proportionally so the longest side stays within `MAX_RASTER_SIDE`.
pub fn raster_size(width: u32, height: u32) -> (u32, u32) {
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));
    let longest = w.max(h);
    let cap = u64::from(MAX_RASTER_SIDE);
    if longest <= cap {
        return (w as u32, h as u32);
    }
    let shrink = |side: u64| (side * cap / longest).max(1) as u32;
    (shrink(w), shrink(h))
}

/// Rasterizes the page background, or `None` when the page is plain white paper.
///
/// Without an image the raster is a single pixel of the background color.
pub fn rasterize_background(layout: &CertificateLayout) -> Result<Option<RgbImage>, ExportError> {
    let Rgb(r, g, b) = layout.background;
    let Some(source) = &layout.background_image else {
        if layout.background == WHITE {
            return Ok(None);
        }
        return Ok(Some(RgbImage::from_pixel(1, 1, image::Rgb([r, g, b]))));
    };

    let (width, height) = raster_size(layout.width, layout.height);
    let mut canvas = image::RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, 255]));
    let img = load_from_memory(&read_image_source(source)?)?;
    // Cover: scale to fill, crop the overflow around the center.
    let cover = img.resize_to_fill(width, height, FilterType::Lanczos3);
    image::imageops::overlay(&mut canvas, &cover.to_rgba8(), 0, 0);

    // Flatten the alpha channel; PDF images are embedded as RGB.
    Ok(Some(DynamicImage::ImageRgba8(canvas).to_rgb8()))
}

/// Writes the rasterized background to a temporary PNG and wraps it as a PDF image
/// stretched over the page.
fn background_image(
    layout: &CertificateLayout,
) -> Result<Option<(NamedTempFile, PdfImage)>, ExportError> {
    let Some(raster) = rasterize_background(layout)? else {
        return Ok(None);
    };
    let (w, h) = raster.dimensions();
    let (width, height) = (layout.width.max(1) as f64, layout.height.max(1) as f64);

    let mut tmp = NamedTempFile::new()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(raster.as_raw())?;
    }

    // At 96 dpi one pixel is one unit; the scale stretches the raster to the canvas,
    // nudged so rounding never makes the image a hair larger than the page.
    let fit = 1.0 - 1e-6;
    let img = PdfImage::from_path(tmp.path())?
        .with_dpi(96.0)
        .with_scale(Scale::new(width / w as f64 * fit, height / h as f64 * fit));
    Ok(Some((tmp, img)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::template::{Orientation, TextAlign};

    fn layout(background_image: Option<String>) -> CertificateLayout {
        CertificateLayout {
            template_id: "t".to_string(),
            width: 40,
            height: 20,
            orientation: Orientation::Landscape,
            background: Rgb(10, 20, 30),
            background_image,
            fields: vec![PlacedField {
                id: "f".to_string(),
                text: "Ana".to_string(),
                x: 0.0,
                y: 0.0,
                width: 40.0,
                height: 20.0,
                font_size: 16,
                font_family: "Arial".to_string(),
                bold: false,
                color: Rgb(0, 0, 0),
                align: TextAlign::Center,
            }],
        }
    }

    fn png_data_url(pixel: [u8; 3]) -> String {
        let img = RgbImage::from_pixel(4, 4, image::Rgb(pixel));
        let mut bytes = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(bytes.into_inner()))
    }

    #[test]
    fn solid_backgrounds_are_a_single_pixel() {
        let raster = rasterize_background(&layout(None)).unwrap().unwrap();
        assert_eq!(raster.dimensions(), (1, 1));
        assert_eq!(raster.get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }

    #[test]
    fn white_backgrounds_are_not_rasterized() {
        let mut plain = layout(None);
        plain.background = Rgb(255, 255, 255);
        assert!(rasterize_background(&plain).unwrap().is_none());
        assert!(background_image(&plain).unwrap().is_none());
    }

    #[test]
    fn background_image_covers_the_canvas() {
        let raster = rasterize_background(&layout(Some(png_data_url([200, 0, 0]))))
            .unwrap()
            .unwrap();
        assert_eq!(raster.dimensions(), (40, 20));
        assert_eq!(raster.get_pixel(0, 0), &image::Rgb([200, 0, 0]));
        assert_eq!(raster.get_pixel(39, 19), &image::Rgb([200, 0, 0]));
    }

    #[test]
    fn raster_size_is_capped_without_overflowing() {
        assert_eq!(raster_size(800, 600), (800, 600));
        assert_eq!(raster_size(0, 0), (1, 1));
        assert_eq!(raster_size(u32::MAX, 20), (MAX_RASTER_SIDE, 1));
        assert_eq!(raster_size(8192, 4096), (MAX_RASTER_SIDE, 2048));
    }

    #[test]
    fn broken_background_references_fail_the_export() {
        let err = rasterize_background(&layout(Some("data:image/png,raw".to_string())));
        assert!(matches!(err, Err(ExportError::Background(_))));

        let err = rasterize_background(&layout(Some("/no/such/background.png".to_string())));
        assert!(matches!(err, Err(ExportError::Background(_))));
    }

    #[test]
    fn font_sizes_convert_to_points() {
        assert_eq!(font_size_pt(16), 12);
        assert_eq!(font_size_pt(72), 54);
        assert_eq!(font_size_pt(0), 1);
        assert_eq!(family_file_stem("Times New Roman"), "TimesNewRoman");
    }

    #[test]
    fn missing_font_directory_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FontSet::load(dir.path(), ["Arial"]);
        assert!(matches!(result, Err(ExportError::Font(_))));
    }
}
