//! Editing session: the scene, its own undo history, and tool state.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::event::{PointerEvent, PointerPhase, ResizeDebouncer};
use crate::history::History;
use crate::notice::{Notice, NoticeBoard, NoticeLevel};
use crate::tools::{self, CropGuide, FlipAxis, ToolAction, ToolOutcome};
use crate::upload::{ImageProbe, PreparedImage};
use crate::scene::validate_surface;
use crate::{
    normalize_color, CanvasError, CanvasResult, FilterKind, ObjectId, ObjectKind, Point, Scene,
    SceneObject,
};

/// Scene objects as shown in a [`SessionView`].
///
/// A compact view serializes image objects without their data URI.
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    scene: &'a Scene,
    sources: bool,
}

impl<'a> SceneView<'a> {
    /// The scene behind the view.
    #[must_use]
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Whether image sources are included.
    #[must_use]
    pub fn includes_sources(&self) -> bool {
        self.sources
    }
}

impl Serialize for SceneView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.sources {
            return self.scene.serialize(serializer);
        }
        let objects: Vec<CompactObject<'_>> = self.scene.objects().map(CompactObject).collect();
        let mut state = serializer.serialize_struct("Scene", 1)?;
        state.serialize_field("objects", &objects)?;
        state.end()
    }
}

struct CompactObject<'a>(&'a SceneObject);

impl Serialize for CompactObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0.kind {
            ObjectKind::Image {
                format,
                natural_width,
                natural_height,
                filters,
                ..
            } => {
                let stripped = SceneObject {
                    kind: ObjectKind::Image {
                        src: String::new(),
                        format: *format,
                        natural_width: *natural_width,
                        natural_height: *natural_height,
                        filters: filters.clone(),
                    },
                    id: self.0.id,
                    transform: self.0.transform,
                    style: self.0.style.clone(),
                    interactive: self.0.interactive,
                };
                stripped.serialize(serializer)
            }
            _ => self.0.serialize(serializer),
        }
    }
}

/// Read-only view of a session for the page shell.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView<'a> {
    /// Scene objects in paint order.
    pub scene: SceneView<'a>,
    /// Surface width.
    pub width: f32,
    /// Surface height.
    pub height: f32,
    /// Current zoom.
    pub zoom: f32,
    /// Pan offset X.
    pub pan_x: f32,
    /// Pan offset Y.
    pub pan_y: f32,
    /// Selected object IDs.
    pub selection: &'a [ObjectId],
    /// Draw color.
    pub color: &'a str,
    /// Free-draw mode.
    pub drawing: bool,
    /// Crop guide overlay, if shown.
    pub crop_guide: Option<CropGuide>,
    /// Number of undo snapshots.
    pub history_depth: usize,
    /// Pending notices.
    pub notices: Vec<&'a Notice>,
}

/// A single editing session.
///
/// Created when the editor mounts and torn down when it unmounts. All
/// mutating operations snapshot the scene into the session's own
/// [`History`].
#[derive(Debug)]
pub struct EditingSession {
    scene: Scene,
    history: History,
    color: String,
    drawing: bool,
    stroke: Option<Vec<Point>>,
    crop_guide: Option<CropGuide>,
    resize: ResizeDebouncer,
    notices: NoticeBoard,
    active: bool,
}

impl EditingSession {
    /// Start a session on an empty surface with a default-capacity history.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be serialized.
    pub fn new(width: f32, height: f32) -> CanvasResult<Self> {
        Self::with_history(Scene::new(width, height), History::new())
    }

    /// Start a session on `scene`, recording into the given history.
    ///
    /// The history is reset to a snapshot of `scene`.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be serialized.
    pub fn with_history(scene: Scene, mut history: History) -> CanvasResult<Self> {
        history.reset(scene.to_json()?);
        tracing::info!(
            width = scene.viewport().width,
            height = scene.viewport().height,
            capacity = history.capacity(),
            "editing session started"
        );
        Ok(Self {
            scene,
            history,
            color: tools::DEFAULT_COLOR.to_string(),
            drawing: false,
            stroke: None,
            crop_guide: None,
            resize: ResizeDebouncer::default(),
            notices: NoticeBoard::new(),
            active: true,
        })
    }

    /// The scene graph.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current draw color.
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Whether free-draw mode is on.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// The crop guide, if shown.
    #[must_use]
    pub fn crop_guide(&self) -> Option<CropGuide> {
        self.crop_guide
    }

    /// Pending notices.
    #[must_use]
    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Whether the session has not been torn down.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Snapshot of the session state for the page shell.
    #[must_use]
    pub fn view(&self) -> SessionView<'_> {
        self.view_with_sources(true)
    }

    /// Like [`view`](Self::view) but without image data URIs, for responses
    /// that only need the layout.
    #[must_use]
    pub fn compact_view(&self) -> SessionView<'_> {
        self.view_with_sources(false)
    }

    fn view_with_sources(&self, sources: bool) -> SessionView<'_> {
        let viewport = self.scene.viewport();
        SessionView {
            scene: SceneView {
                scene: &self.scene,
                sources,
            },
            width: viewport.width,
            height: viewport.height,
            zoom: viewport.zoom,
            pan_x: viewport.pan_x,
            pan_y: viewport.pan_y,
            selection: self.scene.selection(),
            color: &self.color,
            drawing: self.drawing,
            crop_guide: self.crop_guide,
            history_depth: self.history.len(),
            notices: self.notices.iter().collect(),
        }
    }

    /// Run a tool action.
    ///
    /// User-facing failures (nothing selected, wrong object type, bad color)
    /// are also posted as warning notices.
    ///
    /// # Errors
    ///
    /// Returns the error that rejected the action; the scene is unchanged.
    pub fn dispatch(&mut self, action: ToolAction) -> CanvasResult<ToolOutcome> {
        let name = action.name();
        let result = self.run(action);
        match &result {
            Ok(outcome) => tracing::debug!(action = name, ?outcome, "tool action applied"),
            Err(e) => tracing::debug!(action = name, error = %e, "tool action rejected"),
        }
        self.notify(result)
    }

    fn run(&mut self, action: ToolAction) -> CanvasResult<ToolOutcome> {
        self.ensure_active()?;
        match action {
            ToolAction::AddText => self.add_default(tools::text_object),
            ToolAction::AddRectangle => self.add_default(tools::rectangle_object),
            ToolAction::AddCircle => self.add_default(tools::circle_object),
            ToolAction::AddLine => self.add_default(tools::line_object),
            ToolAction::ToggleDrawing => Ok(ToolOutcome::Toggled {
                enabled: self.toggle_drawing(),
            }),
            ToolAction::Pointer(event) => self.pointer(event),
            ToolAction::Flip { axis } => self.flip(axis).map(|id| ToolOutcome::Modified { id }),
            ToolAction::ZoomIn => Ok(ToolOutcome::Zoomed {
                zoom: self.zoom_by(tools::ZOOM_IN_STEP),
            }),
            ToolAction::ZoomOut => Ok(ToolOutcome::Zoomed {
                zoom: self.zoom_by(tools::ZOOM_OUT_STEP),
            }),
            ToolAction::ResetZoom => {
                self.scene.viewport_mut().reset_zoom();
                Ok(ToolOutcome::Zoomed { zoom: 1.0 })
            }
            ToolAction::ToggleCropGuide => Ok(ToolOutcome::Toggled {
                enabled: self.toggle_crop_guide(),
            }),
            ToolAction::Delete => self
                .delete_selection()
                .map(|count| ToolOutcome::Removed { count }),
            ToolAction::SetColor { color } => {
                self.set_color(&color).map(|modified| match modified {
                    Some(id) => ToolOutcome::Modified { id },
                    None => ToolOutcome::Unchanged,
                })
            }
            ToolAction::ApplyFilter { filter } => self
                .apply_filter(filter)
                .map(|id| ToolOutcome::Modified { id }),
            ToolAction::Select { id } => {
                self.scene.set_active_object(id)?;
                Ok(ToolOutcome::Selected { ids: vec![id] })
            }
            ToolAction::ClearSelection => {
                self.scene.clear_selection();
                Ok(ToolOutcome::Selected { ids: Vec::new() })
            }
            ToolAction::Undo => self.undo().map(|restored| ToolOutcome::Undone { restored }),
            ToolAction::Resize {
                width,
                height,
                at_ms,
            } => {
                validate_surface(width, height)?;
                let applied = self.flush_resize(at_ms);
                self.request_resize(width, height, at_ms)?;
                Ok(self.resize_outcome(applied))
            }
            ToolAction::FlushResize { now_ms } => {
                let applied = self.flush_resize(now_ms);
                Ok(self.resize_outcome(applied))
            }
        }
    }

    fn resize_outcome(&self, applied: bool) -> ToolOutcome {
        if !applied {
            return ToolOutcome::Unchanged;
        }
        let viewport = self.scene.viewport();
        ToolOutcome::Resized {
            width: viewport.width,
            height: viewport.height,
        }
    }

    fn add_default(&mut self, build: fn(Point, &str) -> SceneObject) -> CanvasResult<ToolOutcome> {
        let center = self.scene.viewport().visible_center();
        let object = build(center, &self.color);
        self.add_object(object).map(|id| ToolOutcome::Added { id })
    }

    /// Add an object, select it and snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the snapshot fails.
    pub fn add_object(&mut self, object: SceneObject) -> CanvasResult<ObjectId> {
        self.ensure_active()?;
        let id = self.scene.add_object(object);
        self.scene.set_active_object(id)?;
        self.commit()?;
        Ok(id)
    }

    /// Remove the selection and snapshot. Returns how many objects went.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoSelection`] if nothing is selected.
    pub fn delete_selection(&mut self) -> CanvasResult<usize> {
        self.ensure_active()?;
        let removed = self.scene.remove_active()?;
        self.commit()?;
        Ok(removed.len())
    }

    /// Toggle a flip flag on the active object and snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoSelection`] if nothing is selected, or
    /// [`CanvasError::NotFlippable`] for objects that cannot be mirrored.
    pub fn flip(&mut self, axis: FlipAxis) -> CanvasResult<ObjectId> {
        self.ensure_active()?;
        let object = self
            .scene
            .active_object_mut()
            .ok_or(CanvasError::NoSelection)?;
        if !object.kind.capabilities().flippable {
            return Err(CanvasError::NotFlippable(object.kind.name()));
        }
        match axis {
            FlipAxis::Horizontal => object.transform.flip_x = !object.transform.flip_x,
            FlipAxis::Vertical => object.transform.flip_y = !object.transform.flip_y,
        }
        let id = object.id;
        self.commit()?;
        Ok(id)
    }

    /// Replace the active image's filter list and snapshot.
    ///
    /// `FilterKind::None` clears the list; any other filter becomes the only
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoSelection`] if nothing is selected, or
    /// [`CanvasError::NotFilterable`] if the active object is not an image.
    pub fn apply_filter(&mut self, filter: FilterKind) -> CanvasResult<ObjectId> {
        self.ensure_active()?;
        let object = self
            .scene
            .active_object_mut()
            .ok_or(CanvasError::NoSelection)?;
        let id = object.id;
        match &mut object.kind {
            ObjectKind::Image { filters, .. } => {
                filters.clear();
                if filter != FilterKind::None {
                    filters.push(filter);
                }
            }
            other => return Err(CanvasError::NotFilterable(other.name())),
        }
        self.commit()?;
        Ok(id)
    }

    /// Set the draw color; recolor and snapshot the active object if any.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidColor`] for non-hex colors.
    pub fn set_color(&mut self, color: &str) -> CanvasResult<Option<ObjectId>> {
        self.ensure_active()?;
        let color = normalize_color(color)?;
        let modified = self.scene.active_object_mut().and_then(|object| {
            if matches!(object.kind, ObjectKind::Image { .. }) {
                return None;
            }
            object.recolor(&color);
            Some(object.id)
        });
        self.color = color;
        if modified.is_some() {
            self.commit()?;
        }
        Ok(modified)
    }

    /// Flip free-draw mode. Returns the new state.
    pub fn toggle_drawing(&mut self) -> bool {
        self.drawing = !self.drawing;
        if !self.drawing {
            self.stroke = None;
        }
        self.drawing
    }

    /// Handle pointer input.
    ///
    /// In free-draw mode a down/move/up sequence paints one path in the
    /// draw color; otherwise a press selects the topmost object under the
    /// pointer or clears the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if committing a stroke fails.
    pub fn pointer(&mut self, event: PointerEvent) -> CanvasResult<ToolOutcome> {
        self.ensure_active()?;
        let point = self.scene.viewport().to_canvas(event.position());

        if !self.drawing {
            if event.phase != PointerPhase::Down {
                return Ok(ToolOutcome::Unchanged);
            }
            return Ok(match self.scene.object_at(event.x, event.y) {
                Some(id) => {
                    self.scene.set_active_object(id)?;
                    ToolOutcome::Selected { ids: vec![id] }
                }
                None => {
                    self.scene.clear_selection();
                    ToolOutcome::Selected { ids: Vec::new() }
                }
            });
        }

        match event.phase {
            PointerPhase::Down => {
                self.stroke = Some(vec![point]);
                Ok(ToolOutcome::Unchanged)
            }
            PointerPhase::Move => {
                if let Some(stroke) = self.stroke.as_mut() {
                    stroke.push(point);
                }
                Ok(ToolOutcome::Unchanged)
            }
            PointerPhase::Up => {
                let Some(mut stroke) = self.stroke.take() else {
                    return Ok(ToolOutcome::Unchanged);
                };
                stroke.push(point);
                match tools::path_object(&stroke, &self.color) {
                    Some(path) => {
                        let id = self.scene.add_object(path);
                        self.commit()?;
                        Ok(ToolOutcome::Added { id })
                    }
                    None => Ok(ToolOutcome::Unchanged),
                }
            }
        }
    }

    /// Multiply the zoom by `factor` around the surface center, clamped.
    /// Returns the applied zoom.
    pub fn zoom_by(&mut self, factor: f32) -> f32 {
        let viewport = self.scene.viewport_mut();
        let pivot = viewport.screen_center();
        let target = viewport.zoom * factor;
        viewport.zoom_to_point(target, pivot)
    }

    /// Show or hide the crop guide. Returns whether it is now shown.
    pub fn toggle_crop_guide(&mut self) -> bool {
        self.crop_guide = match self.crop_guide {
            Some(_) => None,
            None => {
                let viewport = self.scene.viewport();
                Some(CropGuide::for_surface(viewport.width, viewport.height))
            }
        };
        self.crop_guide.is_some()
    }

    /// Restore the previous snapshot.
    ///
    /// Returns `false` and changes nothing when only the initial snapshot
    /// remains.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be parsed.
    pub fn undo(&mut self) -> CanvasResult<bool> {
        self.ensure_active()?;
        let Some(snapshot) = self.history.undo() else {
            return Ok(false);
        };
        self.scene.restore_json(snapshot)?;
        tracing::debug!(depth = self.history.len(), "undo restored snapshot");
        Ok(true)
    }

    /// Resize the surface immediately.
    pub fn resize(&mut self, width: f32, height: f32) {
        let viewport = self.scene.viewport();
        if (viewport.width - width).abs() < f32::EPSILON
            && (viewport.height - height).abs() < f32::EPSILON
        {
            return;
        }
        self.scene.resize(width, height);
        if self.crop_guide.is_some() {
            self.crop_guide = Some(CropGuide::for_surface(width, height));
        }
        tracing::debug!(width, height, "surface resized");
    }

    /// Queue a container resize notification.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidSurface`] for non-finite or out of range
    /// sizes; nothing is queued.
    pub fn request_resize(&mut self, width: f32, height: f32, at_ms: u64) -> CanvasResult<()> {
        validate_surface(width, height)?;
        self.resize.request(width, height, at_ms);
        Ok(())
    }

    /// Apply a queued resize once its quiet period has passed.
    /// Returns whether the surface changed.
    pub fn flush_resize(&mut self, now_ms: u64) -> bool {
        let Some((width, height)) = self.resize.take_ready(now_ms) else {
            return false;
        };
        let before = *self.scene.viewport();
        self.resize(width, height);
        *self.scene.viewport() != before
    }

    /// Validate an uploaded file and add it as an image object.
    ///
    /// Rejected uploads post a warning notice and leave the scene untouched.
    ///
    /// # Errors
    ///
    /// Returns the validation or decoding error.
    pub fn add_upload(
        &mut self,
        mime: &str,
        bytes: &[u8],
        probe: &dyn ImageProbe,
    ) -> CanvasResult<ObjectId> {
        let result = PreparedImage::from_upload(mime, bytes, probe);
        self.add_prepared(result)
    }

    /// Add an image given as a base64 data URI, e.g. a generated wallpaper.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or not an accepted image.
    pub fn add_data_uri(&mut self, uri: &str, probe: &dyn ImageProbe) -> CanvasResult<ObjectId> {
        let result = PreparedImage::from_data_uri(uri, probe);
        self.add_prepared(result)
    }

    /// Add an image prepared elsewhere, fitted and centered on the surface.
    ///
    /// A failed preparation is posted as a warning notice, the same as a
    /// rejected [`add_upload`](Self::add_upload).
    ///
    /// # Errors
    ///
    /// Returns the preparation error, or an error if the session is closed.
    pub fn add_prepared(
        &mut self,
        prepared: CanvasResult<PreparedImage>,
    ) -> CanvasResult<ObjectId> {
        let result = self
            .ensure_active()
            .and(prepared)
            .and_then(|image| self.insert_image(image));
        self.notify(result)
    }

    fn insert_image(&mut self, image: PreparedImage) -> CanvasResult<ObjectId> {
        let transform = tools::fit_image_transform(
            self.scene.viewport(),
            image.natural_width,
            image.natural_height,
        );
        let object = SceneObject::new(ObjectKind::Image {
            src: image.src,
            format: image.format,
            natural_width: image.natural_width,
            natural_height: image.natural_height,
            filters: Vec::new(),
        })
        .with_transform(transform);
        self.add_object(object)
    }

    /// Dismiss a notice. Returns whether it was present.
    pub fn dismiss_notice(&mut self, id: u32) -> bool {
        self.notices.dismiss(id)
    }

    /// End the session: clear history, drop tool state and dispose the scene.
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.history.clear();
        self.stroke = None;
        self.drawing = false;
        self.crop_guide = None;
        self.resize.cancel();
        self.notices.clear();
        self.scene.clear();
        self.active = false;
        tracing::info!("editing session torn down");
    }

    fn commit(&mut self) -> CanvasResult<()> {
        let snapshot = self.scene.to_json()?;
        self.history.save(snapshot);
        Ok(())
    }

    fn ensure_active(&self) -> CanvasResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(CanvasError::SessionClosed)
        }
    }

    fn notify<T>(&mut self, result: CanvasResult<T>) -> CanvasResult<T> {
        if let Err(e) = &result {
            if e.is_user_facing() {
                self.notices.post(NoticeLevel::Warning, e.to_string());
            }
        }
        result
    }
}
