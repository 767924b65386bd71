//! Scene export to image formats.
//!
//! Renders a [`Scene`] to PNG, JPEG or SVG using an SVG intermediate
//! representation and the resvg/tiny-skia rasterization pipeline. The output
//! shows what the editing surface shows: the current zoom and pan apply, the
//! crop guide does not.

use std::fmt::Write;

use image::ImageEncoder;
use serde::{Deserialize, Serialize};
use wallpaper_core::{ObjectKind, Scene, SceneObject, ShapeKind, Style, Transform};

use crate::error::{RenderError, RenderResult};
use crate::image::filtered_data_uri;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    #[serde(alias = "jpg")]
    Jpeg,
    /// SVG vector graphics (returns the SVG XML string as UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// MIME type of the exported bytes.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }

    /// File extension for downloads.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
        }
    }
}

/// Configuration for scene export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output width in pixels (default: surface width).
    pub width: Option<u32>,
    /// Output height in pixels (default: surface height).
    pub height: Option<u32>,
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
    /// JPEG quality 1-100 (default: 90).
    pub jpeg_quality: u8,
    /// Scale factor (e.g. 2.0 for retina).
    pub scale: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            background: [255, 255, 255, 255],
            jpeg_quality: 90,
            scale: 1.0,
        }
    }
}

/// Exports a [`Scene`] to image formats.
pub struct SceneExporter {
    config: ExportConfig,
}

impl SceneExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Export a scene to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be rendered or encoded.
    pub fn export(&self, scene: &Scene, format: ExportFormat) -> RenderResult<Vec<u8>> {
        let bytes = match format {
            ExportFormat::Png => self.render_to_png(scene)?,
            ExportFormat::Jpeg => self.render_to_jpeg(scene)?,
            ExportFormat::Svg => self.render_to_svg(scene)?.into_bytes(),
        };
        tracing::debug!(
            ?format,
            objects = scene.object_count(),
            bytes = bytes.len(),
            "scene exported"
        );
        Ok(bytes)
    }

    /// Export the scene to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_png(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        let svg_string = self.render_to_svg(scene)?;
        let pixmap = Self::rasterize_svg(&svg_string)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }

    /// Export the scene to JPEG bytes, flattened onto the background color.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        let svg_string = self.render_to_svg(scene)?;
        let pixmap = Self::rasterize_svg(&svg_string)?;

        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = &self.config.background;
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        // tiny-skia stores premultiplied RGBA
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for (&src, &back) in pixel[..3].iter().zip(bg.iter()) {
                let value = f32::from(back).mul_add(inv, f32::from(src));
                rgb_data.push(value.min(255.0) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Export the scene to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns an error if an image object cannot be decoded or filtered.
    #[allow(clippy::cast_precision_loss)]
    pub fn render_to_svg(&self, scene: &Scene) -> RenderResult<String> {
        let (out_w, out_h) = self.output_dimensions(scene);
        let scale = self.config.scale;
        let view_w = out_w as f32 / scale;
        let view_h = out_h as f32 / scale;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
        );

        // Background
        let bg = &self.config.background;
        let bg_alpha = f32::from(bg[3]) / 255.0;
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{})\"/>",
            bg[0], bg[1], bg[2], bg_alpha,
        );

        let viewport = scene.viewport();
        let _ = write!(
            svg,
            "<g transform=\"matrix({z} 0 0 {z} {px} {py})\">",
            z = viewport.zoom,
            px = viewport.pan_x,
            py = viewport.pan_y,
        );
        for object in scene.objects() {
            render_object_svg(&mut svg, object)?;
        }
        svg.push_str("</g></svg>");
        Ok(svg)
    }

    /// Get output dimensions (width, height) in pixels.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn output_dimensions(&self, scene: &Scene) -> (u32, u32) {
        let viewport = scene.viewport();
        let base_w = self
            .config
            .width
            .unwrap_or_else(|| viewport.width.max(1.0) as u32);
        let base_h = self
            .config
            .height
            .unwrap_or_else(|| viewport.height.max(1.0) as u32);
        #[allow(clippy::cast_precision_loss)]
        let out_w = (base_w as f32 * self.config.scale) as u32;
        #[allow(clippy::cast_precision_loss)]
        let out_h = (base_h as f32 * self.config.scale) as u32;
        (out_w.max(1), out_h.max(1))
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width() as u32;
        let px_h = tree.size().height() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

/// Render a single object to SVG.
fn render_object_svg(svg: &mut String, object: &SceneObject) -> RenderResult<()> {
    let tf = &object.transform;
    let paint = paint_attributes(&object.style);
    let _ = write!(svg, "<g{}>", transform_attribute(tf));
    match &object.kind {
        ObjectKind::Text {
            content,
            font_size,
            font_family,
        } => {
            let escaped = escape_xml(content);
            let family = escape_xml(font_family);
            let text_y = tf.y + font_size;
            let _ = write!(
                svg,
                "<text x=\"{}\" y=\"{text_y}\" font-size=\"{font_size}\" font-family=\"{family}\"{paint}>{escaped}</text>",
                tf.x,
            );
        }
        ObjectKind::Shape {
            shape: ShapeKind::Rectangle,
        } => {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{paint}/>",
                tf.x, tf.y, tf.width, tf.height,
            );
        }
        ObjectKind::Shape {
            shape: ShapeKind::Circle,
        } => {
            let center = tf.center();
            let _ = write!(
                svg,
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{paint}/>",
                center.x,
                center.y,
                tf.width / 2.0,
                tf.height / 2.0,
            );
        }
        ObjectKind::Line { start, end } => {
            let _ = write!(
                svg,
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke-linecap=\"round\"{paint}/>",
                tf.x + start.x,
                tf.y + start.y,
                tf.x + end.x,
                tf.y + end.y,
            );
        }
        ObjectKind::Path { points } => {
            let mut coords = String::with_capacity(points.len() * 12);
            for p in points {
                let _ = write!(coords, "{},{} ", tf.x + p.x, tf.y + p.y);
            }
            let _ = write!(
                svg,
                "<polyline points=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"{paint}/>",
                coords.trim_end(),
            );
        }
        ObjectKind::Image { src, filters, .. } => {
            let href = filtered_data_uri(src, filters)?;
            let _ = write!(
                svg,
                "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
                tf.x,
                tf.y,
                tf.width,
                tf.height,
                escape_xml(&href),
            );
        }
    }
    svg.push_str("</g>");
    Ok(())
}

/// Rotation and flips about the object center.
fn transform_attribute(tf: &Transform) -> String {
    if tf.rotation.abs() < f32::EPSILON && !tf.flip_x && !tf.flip_y {
        return String::new();
    }
    let center = tf.center();
    let sx = if tf.flip_x { -1.0 } else { 1.0 };
    let sy = if tf.flip_y { -1.0 } else { 1.0 };
    format!(
        " transform=\"translate({cx} {cy}) rotate({r}) scale({sx} {sy}) translate({nx} {ny})\"",
        cx = center.x,
        cy = center.y,
        r = tf.rotation,
        nx = -center.x,
        ny = -center.y,
    )
}

fn paint_attributes(style: &Style) -> String {
    let mut attrs = String::new();
    match &style.fill {
        Some(fill) => {
            let _ = write!(attrs, " fill=\"{}\"", escape_xml(fill));
        }
        None => attrs.push_str(" fill=\"none\""),
    }
    if let Some(stroke) = &style.stroke {
        let _ = write!(
            attrs,
            " stroke=\"{}\" stroke-width=\"{}\"",
            escape_xml(stroke),
            style.stroke_width,
        );
    }
    attrs
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
