//! Tool actions and the default objects they create.

use serde::{Deserialize, Serialize};

use crate::event::PointerEvent;
use crate::{
    FilterKind, ObjectId, ObjectKind, Point, SceneObject, ShapeKind, Style, Transform, Viewport,
};

/// Zoom multiplier for one zoom-in step.
pub const ZOOM_IN_STEP: f32 = 1.1;

/// Zoom multiplier for one zoom-out step.
pub const ZOOM_OUT_STEP: f32 = 0.9;

/// Stroke width of free-drawn paths.
pub const BRUSH_WIDTH: f32 = 5.0;

/// Color selected when a session starts.
pub const DEFAULT_COLOR: &str = "#000000";

/// Crop guide aspect ratio (width / height).
pub const CROP_ASPECT: f32 = 16.0 / 9.0;

/// Share of the surface the crop guide may occupy along either axis.
const CROP_COVERAGE: f32 = 0.8;

const TEXT_PLACEHOLDER: &str = "Your text";
const TEXT_FONT_SIZE: f32 = 40.0;
const TEXT_FONT_FAMILY: &str = "sans-serif";
const LINE_LENGTH: f32 = 200.0;
const LINE_WIDTH: f32 = 4.0;

/// Mirror axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    /// Mirror left-right.
    Horizontal,
    /// Mirror top-bottom.
    Vertical,
}

/// A discrete user action on the editing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ToolAction {
    /// Add a text box at the visible center.
    AddText,
    /// Add a rectangle at the visible center.
    AddRectangle,
    /// Add a circle at the visible center.
    AddCircle,
    /// Add a horizontal line at the visible center.
    AddLine,
    /// Toggle free-draw mode.
    ToggleDrawing,
    /// Pointer input (selection, or painting in free-draw mode).
    Pointer(PointerEvent),
    /// Mirror the active object.
    Flip {
        /// Mirror axis.
        axis: FlipAxis,
    },
    /// One zoom-in step around the surface center.
    ZoomIn,
    /// One zoom-out step around the surface center.
    ZoomOut,
    /// Back to 100% zoom.
    ResetZoom,
    /// Show or hide the 16:9 crop guide.
    ToggleCropGuide,
    /// Remove the selection.
    Delete,
    /// Change the draw color and recolor the active object.
    SetColor {
        /// Hex color.
        color: String,
    },
    /// Replace the active image's filters.
    ApplyFilter {
        /// Filter to apply; `none` clears.
        filter: FilterKind,
    },
    /// Select a single object.
    Select {
        /// Object to select.
        id: ObjectId,
    },
    /// Deselect everything.
    ClearSelection,
    /// Restore the previous snapshot.
    Undo,
    /// Container resize notification (debounced).
    ///
    /// A pending request whose quiet period has passed by `at_ms` is applied
    /// before this one is queued.
    Resize {
        /// New width.
        width: f32,
        /// New height.
        height: f32,
        /// Notification time in milliseconds.
        at_ms: u64,
    },
    /// Apply the pending resize if it has settled by `now_ms`.
    FlushResize {
        /// Current time in milliseconds, on the same clock as `at_ms`.
        now_ms: u64,
    },
}

impl ToolAction {
    /// Short action name for logs and metrics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddText => "add_text",
            Self::AddRectangle => "add_rectangle",
            Self::AddCircle => "add_circle",
            Self::AddLine => "add_line",
            Self::ToggleDrawing => "toggle_drawing",
            Self::Pointer(_) => "pointer",
            Self::Flip { .. } => "flip",
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
            Self::ResetZoom => "reset_zoom",
            Self::ToggleCropGuide => "toggle_crop_guide",
            Self::Delete => "delete",
            Self::SetColor { .. } => "set_color",
            Self::ApplyFilter { .. } => "apply_filter",
            Self::Select { .. } => "select",
            Self::ClearSelection => "clear_selection",
            Self::Undo => "undo",
            Self::Resize { .. } => "resize",
            Self::FlushResize { .. } => "flush_resize",
        }
    }
}

/// What a dispatched action did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// An object was added.
    Added {
        /// The new object.
        id: ObjectId,
    },
    /// Objects were removed.
    Removed {
        /// How many.
        count: usize,
    },
    /// The active object changed.
    Modified {
        /// The modified object.
        id: ObjectId,
    },
    /// A mode flag changed.
    Toggled {
        /// New state.
        enabled: bool,
    },
    /// The zoom changed.
    Zoomed {
        /// New zoom factor.
        zoom: f32,
    },
    /// Undo was requested.
    Undone {
        /// Whether a snapshot was restored.
        restored: bool,
    },
    /// The selection changed.
    Selected {
        /// Selected objects.
        ids: Vec<ObjectId>,
    },
    /// The surface size changed.
    Resized {
        /// New width.
        width: f32,
        /// New height.
        height: f32,
    },
    /// Accepted without visible change (e.g. a pending resize).
    Unchanged,
}

/// Non-interactive dashed overlay marking a 16:9 region of the surface.
///
/// Lives outside the scene: it is never snapshotted or exported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropGuide {
    /// Left edge in surface pixels.
    pub x: f32,
    /// Top edge in surface pixels.
    pub y: f32,
    /// Width in surface pixels.
    pub width: f32,
    /// Height in surface pixels.
    pub height: f32,
}

impl CropGuide {
    /// Largest 16:9 rectangle within 80% of the surface, centered.
    #[must_use]
    pub fn for_surface(width: f32, height: f32) -> Self {
        let avail_w = width * CROP_COVERAGE;
        let avail_h = height * CROP_COVERAGE;
        let (w, h) = if avail_h <= 0.0 || avail_w / avail_h > CROP_ASPECT {
            (avail_h * CROP_ASPECT, avail_h)
        } else {
            (avail_w, avail_w / CROP_ASPECT)
        };
        Self {
            x: (width - w) / 2.0,
            y: (height - h) / 2.0,
            width: w,
            height: h,
        }
    }
}

/// Default text box centered on `center`.
#[must_use]
pub fn text_object(center: Point, color: &str) -> SceneObject {
    SceneObject::new(ObjectKind::Text {
        content: TEXT_PLACEHOLDER.to_string(),
        font_size: TEXT_FONT_SIZE,
        font_family: TEXT_FONT_FAMILY.to_string(),
    })
    .with_transform(Transform::centered_on(center, 240.0, TEXT_FONT_SIZE * 1.25))
    .with_style(Style::filled(color))
}

/// Default rectangle centered on `center`.
#[must_use]
pub fn rectangle_object(center: Point, color: &str) -> SceneObject {
    SceneObject::new(ObjectKind::Shape {
        shape: ShapeKind::Rectangle,
    })
    .with_transform(Transform::centered_on(center, 150.0, 100.0))
    .with_style(Style::filled(color))
}

/// Default circle centered on `center`.
#[must_use]
pub fn circle_object(center: Point, color: &str) -> SceneObject {
    SceneObject::new(ObjectKind::Shape {
        shape: ShapeKind::Circle,
    })
    .with_transform(Transform::centered_on(center, 100.0, 100.0))
    .with_style(Style::filled(color))
}

/// Default horizontal line centered on `center`.
#[must_use]
pub fn line_object(center: Point, color: &str) -> SceneObject {
    SceneObject::new(ObjectKind::Line {
        start: Point::new(0.0, LINE_WIDTH / 2.0),
        end: Point::new(LINE_LENGTH, LINE_WIDTH / 2.0),
    })
    .with_transform(Transform::centered_on(center, LINE_LENGTH, LINE_WIDTH))
    .with_style(Style::stroked(color, LINE_WIDTH))
}

/// Build a path object from canvas-space stroke points.
///
/// Points are stored relative to the stroke's bounding box. Returns `None`
/// for strokes with fewer than two points.
#[must_use]
pub fn path_object(points: &[Point], color: &str) -> Option<SceneObject> {
    if points.len() < 2 {
        return None;
    }
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let relative = points
        .iter()
        .map(|p| Point::new(p.x - min_x, p.y - min_y))
        .collect();
    Some(
        SceneObject::new(ObjectKind::Path { points: relative })
            .with_transform(Transform {
                x: min_x,
                y: min_y,
                width: (max_x - min_x).max(BRUSH_WIDTH),
                height: (max_y - min_y).max(BRUSH_WIDTH),
                ..Transform::default()
            })
            .with_style(Style::stroked(color, BRUSH_WIDTH)),
    )
}

/// Scale an image to fit inside the visible surface and center it.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fit_image_transform(viewport: &Viewport, natural_width: u32, natural_height: u32) -> Transform {
    let (nw, nh) = (natural_width as f32, natural_height as f32);
    let visible_w = viewport.width / viewport.zoom;
    let visible_h = viewport.height / viewport.zoom;
    let scale = (visible_w / nw).min(visible_h / nh).min(1.0);
    Transform::centered_on(viewport.visible_center(), nw * scale, nh * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_guide_is_16_9_and_centered() {
        let guide = CropGuide::for_surface(800.0, 600.0);
        assert!((guide.width / guide.height - CROP_ASPECT).abs() < 1e-4);
        assert!((guide.width - 640.0).abs() < 1e-3);
        assert!((guide.x + guide.width / 2.0 - 400.0).abs() < 1e-3);
        assert!((guide.y + guide.height / 2.0 - 300.0).abs() < 1e-3);

        let wide = CropGuide::for_surface(2000.0, 500.0);
        assert!((wide.height - 400.0).abs() < 1e-3);
        assert!(wide.width <= 2000.0 * 0.8);
    }

    #[test]
    fn default_objects_are_centered() {
        let center = Point::new(400.0, 300.0);
        for object in [
            text_object(center, "#111111"),
            rectangle_object(center, "#111111"),
            circle_object(center, "#111111"),
            line_object(center, "#111111"),
        ] {
            let c = object.transform.center();
            assert!((c.x - 400.0).abs() < 1e-3, "{}", object.kind.name());
            assert!((c.y - 300.0).abs() < 1e-3, "{}", object.kind.name());
        }
    }

    #[test]
    fn path_needs_two_points() {
        assert!(path_object(&[Point::new(1.0, 1.0)], "#000000").is_none());
        let path = path_object(
            &[Point::new(10.0, 20.0), Point::new(30.0, 25.0)],
            "#ff0000",
        )
        .expect("path");
        assert!((path.transform.x - 10.0).abs() < f32::EPSILON);
        assert!((path.transform.width - 20.0).abs() < f32::EPSILON);
        assert!((path.style.stroke_width - BRUSH_WIDTH).abs() < f32::EPSILON);
        match path.kind {
            ObjectKind::Path { points } => assert_eq!(points[0], Point::new(0.0, 0.0)),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn large_images_are_scaled_to_fit() {
        let viewport = Viewport::new(800.0, 600.0);
        let t = fit_image_transform(&viewport, 1600, 900);
        assert!((t.width - 800.0).abs() < 1e-3);
        assert!((t.height - 450.0).abs() < 1e-3);

        let small = fit_image_transform(&viewport, 100, 50);
        assert!((small.width - 100.0).abs() < 1e-3);
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: ToolAction =
            serde_json::from_str(r#"{"action":"apply_filter","filter":"sepia"}"#).expect("parse");
        assert_eq!(
            action,
            ToolAction::ApplyFilter {
                filter: FilterKind::Sepia
            }
        );
        let action: ToolAction =
            serde_json::from_str(r#"{"action":"pointer","phase":"down","x":1.0,"y":2.0}"#)
                .expect("parse");
        assert_eq!(action.name(), "pointer");
    }
}
