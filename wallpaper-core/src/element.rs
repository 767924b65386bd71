//! Scene objects - the drawable building blocks of a wallpaper edit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CanvasError, CanvasResult};

/// Unique identifier for a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CanvasError::ObjectNotFound(s.to_string()))
    }
}

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Geometric primitive for shape objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle filling the object bounds.
    Rectangle,
    /// Circle (ellipse) inscribed in the object bounds.
    Circle,
}

/// Pixel-level filter for image objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// No filter; clears the filter list.
    None,
    /// Channel-average grayscale.
    Grayscale,
    /// Sepia tone.
    Sepia,
    /// Color inversion.
    Invert,
}

/// Raster formats accepted for image objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// WebP image.
    WebP,
}

impl ImageFormat {
    /// Canonical MIME type.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parse a MIME type, ignoring case and parameters.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(Self::Png);
        }
        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        None
    }
}

/// The type of content an object contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ObjectKind {
    /// An editable text box.
    Text {
        /// Text content.
        content: String,
        /// Font size in pixels.
        font_size: f32,
        /// Font family name.
        font_family: String,
    },

    /// A filled geometric shape.
    Shape {
        /// Which primitive.
        shape: ShapeKind,
    },

    /// A straight line between two points relative to the object origin.
    Line {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
    },

    /// A raster image.
    Image {
        /// Image source as a data URI; left out of compact session views.
        #[serde(default, skip_serializing_if = "String::is_empty")]
        src: String,
        /// Image format.
        format: ImageFormat,
        /// Decoded width in pixels.
        natural_width: u32,
        /// Decoded height in pixels.
        natural_height: u32,
        /// Active filters; never more than one.
        filters: Vec<FilterKind>,
    },

    /// A free-drawn stroke with points relative to the object origin.
    Path {
        /// Stroke points in drawing order.
        points: Vec<Point>,
    },
}

impl ObjectKind {
    /// Short lowercase name for notices and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Shape {
                shape: ShapeKind::Rectangle,
            } => "rectangle",
            Self::Shape {
                shape: ShapeKind::Circle,
            } => "circle",
            Self::Line { .. } => "line",
            Self::Image { .. } => "image",
            Self::Path { .. } => "path",
        }
    }

    /// What edits this kind of object supports.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        match self {
            Self::Image { .. } => Capabilities {
                resizable: true,
                flippable: true,
                filterable: true,
            },
            Self::Path { .. } => Capabilities {
                resizable: false,
                flippable: true,
                filterable: false,
            },
            Self::Text { .. } | Self::Shape { .. } | Self::Line { .. } => Capabilities {
                resizable: true,
                flippable: true,
                filterable: false,
            },
        }
    }
}

/// Capability set of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Bounds may be changed.
    pub resizable: bool,
    /// Can be mirrored horizontally/vertically.
    pub flippable: bool,
    /// Accepts pixel filters.
    pub filterable: bool,
}

/// Fill and stroke styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Fill color as hex, if filled.
    pub fill: Option<String>,
    /// Stroke color as hex, if stroked.
    pub stroke: Option<String>,
    /// Stroke width in pixels.
    pub stroke_width: f32,
}

impl Style {
    /// A filled style without stroke.
    #[must_use]
    pub fn filled(color: &str) -> Self {
        Self {
            fill: Some(color.to_string()),
            stroke: None,
            stroke_width: 0.0,
        }
    }

    /// A stroked style without fill.
    #[must_use]
    pub fn stroked(color: &str, width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(color.to_string()),
            stroke_width: width,
        }
    }
}

/// Transform for positioning and sizing objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Rotation in degrees around the center.
    pub rotation: f32,
    /// Mirrored horizontally.
    pub flip_x: bool,
    /// Mirrored vertically.
    pub flip_y: bool,
}

impl Transform {
    /// Transform of the given size centered on a point.
    #[must_use]
    pub fn centered_on(center: Point, width: f32, height: f32) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
            ..Self::default()
        }
    }

    /// Center of the bounds.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

/// A scene object with content, style and transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Object content type.
    pub kind: ObjectKind,
    /// Position and size.
    pub transform: Transform,
    /// Fill and stroke.
    pub style: Style,
    /// Whether this object can be selected.
    pub interactive: bool,
}

impl SceneObject {
    /// Create a new object with the given kind.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            transform: Transform::default(),
            style: Style::default(),
            interactive: true,
        }
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the style.
    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Check if a point (in canvas coordinates) is within this object.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let t = &self.transform;
        x >= t.x && x <= t.x + t.width && y >= t.y && y <= t.y + t.height
    }

    /// Recolor the object with the draw color.
    ///
    /// Text and shapes take it as fill; lines and paths as stroke.
    pub fn recolor(&mut self, color: &str) {
        match self.kind {
            ObjectKind::Text { .. } | ObjectKind::Shape { .. } => {
                self.style.fill = Some(color.to_string());
            }
            ObjectKind::Line { .. } | ObjectKind::Path { .. } => {
                self.style.stroke = Some(color.to_string());
            }
            ObjectKind::Image { .. } => {}
        }
    }
}

/// Validate a `#rgb` or `#rrggbb` color and normalize it to lowercase.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidColor`] for anything else.
pub fn normalize_color(color: &str) -> CanvasResult<String> {
    let trimmed = color.trim();
    let hex = trimmed
        .strip_prefix('#')
        .ok_or_else(|| CanvasError::InvalidColor(color.to_string()))?;
    if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CanvasError::InvalidColor(color.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_are_filterable() {
        let image = ObjectKind::Image {
            src: String::new(),
            format: ImageFormat::Png,
            natural_width: 1,
            natural_height: 1,
            filters: Vec::new(),
        };
        assert!(image.capabilities().filterable);
        let rect = ObjectKind::Shape {
            shape: ShapeKind::Rectangle,
        };
        assert!(!rect.capabilities().filterable);
        assert_eq!(rect.name(), "rectangle");
    }

    #[test]
    fn mime_parsing_ignores_case_and_params() {
        assert_eq!(ImageFormat::from_mime("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::from_mime("image/jpeg; charset=binary"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_mime("image/webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_mime("text/plain"), None);
        assert_eq!(ImageFormat::from_mime("image/gif"), None);
    }

    #[test]
    fn magic_bytes_detection() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"hello"), None);
    }

    #[test]
    fn recolor_targets_fill_or_stroke() {
        let mut rect = SceneObject::new(ObjectKind::Shape {
            shape: ShapeKind::Rectangle,
        })
        .with_style(Style::filled("#000000"));
        rect.recolor("#ff0000");
        assert_eq!(rect.style.fill.as_deref(), Some("#ff0000"));

        let mut line = SceneObject::new(ObjectKind::Line {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
        })
        .with_style(Style::stroked("#000000", 4.0));
        line.recolor("#00ff00");
        assert_eq!(line.style.stroke.as_deref(), Some("#00ff00"));
        assert!(line.style.fill.is_none());
    }

    #[test]
    fn color_validation() {
        assert_eq!(normalize_color("#FFAA00").unwrap(), "#ffaa00");
        assert_eq!(normalize_color(" #abc ").unwrap(), "#abc");
        assert!(normalize_color("red").is_err());
        assert!(normalize_color("#abcd").is_err());
        assert!(normalize_color("#gggggg").is_err());
    }
}
