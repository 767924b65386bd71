//! Scene graph and the viewport it is rendered through.
//!
//! The [`Scene`] owns every drawable object in paint order (last is topmost).
//! Only the objects are serialized; selection and viewport are live state that
//! snapshots and undo never touch.

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult, ObjectId, Point, SceneObject};

/// Smallest zoom factor.
pub const MIN_ZOOM: f32 = 0.1;

/// Largest zoom factor.
pub const MAX_ZOOM: f32 = 10.0;

/// Largest accepted surface edge in pixels.
pub const MAX_SURFACE_EDGE: f32 = 8192.0;

/// Check that a surface size is finite and within `1..=MAX_SURFACE_EDGE`.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidSurface`] otherwise.
pub fn validate_surface(width: f32, height: f32) -> CanvasResult<()> {
    let in_range = |edge: f32| edge.is_finite() && (1.0..=MAX_SURFACE_EDGE).contains(&edge);
    if in_range(width) && in_range(height) {
        Ok(())
    } else {
        Err(CanvasError::InvalidSurface { width, height })
    }
}

/// Rendering surface dimensions and the canvas-to-screen transform.
///
/// Screen coordinates are `canvas * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Surface width in pixels.
    pub width: f32,
    /// Surface height in pixels.
    pub height: f32,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f32,
    /// Pan offset X.
    pub pan_x: f32,
    /// Pan offset Y.
    pub pan_y: f32,
}

impl Viewport {
    /// Create an unzoomed viewport.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Center of the surface in screen coordinates.
    #[must_use]
    pub fn screen_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Convert screen coordinates to canvas coordinates.
    #[must_use]
    pub fn to_canvas(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_x) / self.zoom,
            (screen.y - self.pan_y) / self.zoom,
        )
    }

    /// Canvas point currently displayed at the surface center.
    #[must_use]
    pub fn visible_center(&self) -> Point {
        self.to_canvas(self.screen_center())
    }

    /// Set the zoom, clamped to [`MIN_ZOOM`, `MAX_ZOOM`], keeping the
    /// canvas point under `pivot` (screen coordinates) fixed.
    ///
    /// Returns the applied zoom.
    pub fn zoom_to_point(&mut self, zoom: f32, pivot: Point) -> f32 {
        let new_zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let ratio = new_zoom / self.zoom;
        self.pan_x = pivot.x - (pivot.x - self.pan_x) * ratio;
        self.pan_y = pivot.y - (pivot.y - self.pan_y) * ratio;
        self.zoom = new_zoom;
        new_zoom
    }

    /// Return to 100% zoom with no pan.
    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A scene containing all drawable objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Objects in paint order; the last one is drawn on top.
    objects: Vec<SceneObject>,
    /// Currently selected object IDs.
    #[serde(skip)]
    selected: Vec<ObjectId>,
    /// Surface and zoom state.
    #[serde(skip)]
    viewport: Viewport,
}

impl Scene {
    /// Create a new empty scene with the given surface size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            objects: Vec::new(),
            selected: Vec::new(),
            viewport: Viewport::new(width, height),
        }
    }

    /// Add an object on top of the scene.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        tracing::debug!(object = %id, kind = object.kind.name(), "add object");
        self.objects.push(object);
        id
    }

    /// Remove an object from the scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn remove_object(&mut self, id: ObjectId) -> CanvasResult<SceneObject> {
        self.selected.retain(|&sid| sid != id);
        let index = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| CanvasError::ObjectNotFound(id.to_string()))?;
        Ok(self.objects.remove(index))
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get_object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Get a mutable reference to an object by ID.
    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// All objects in paint order.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    /// Paint order of an object (0 is bottom).
    #[must_use]
    pub fn z_index(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    /// The viewport.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport access.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Set the surface dimensions.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Find the object at the given screen coordinates.
    /// Returns the ID of the topmost interactive object.
    #[must_use]
    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        let p = self.viewport.to_canvas(Point::new(x, y));
        self.objects
            .iter()
            .rev()
            .find(|o| o.interactive && o.contains_point(p.x, p.y))
            .map(|o| o.id)
    }

    /// Make a single object the active selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn set_active_object(&mut self, id: ObjectId) -> CanvasResult<()> {
        self.set_active_selection(&[id])
    }

    /// Replace the selection with several objects.
    ///
    /// # Errors
    ///
    /// Returns an error if any object is not found; the selection is left
    /// unchanged in that case.
    pub fn set_active_selection(&mut self, ids: &[ObjectId]) -> CanvasResult<()> {
        if let Some(missing) = ids.iter().find(|id| self.get_object(**id).is_none()) {
            return Err(CanvasError::ObjectNotFound(missing.to_string()));
        }
        self.selected.clear();
        for id in ids {
            if !self.selected.contains(id) {
                self.selected.push(*id);
            }
        }
        Ok(())
    }

    /// Deselect all objects.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// The active object: the only selected object, or the most recently
    /// selected one of a multi-selection.
    #[must_use]
    pub fn active_object(&self) -> Option<&SceneObject> {
        self.selected.last().and_then(|id| self.get_object(*id))
    }

    /// Mutable access to the active object.
    pub fn active_object_mut(&mut self) -> Option<&mut SceneObject> {
        let id = *self.selected.last()?;
        self.get_object_mut(id)
    }

    /// IDs of the current selection.
    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        &self.selected
    }

    /// Remove every selected object.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoSelection`] if nothing is selected.
    pub fn remove_active(&mut self) -> CanvasResult<Vec<SceneObject>> {
        if self.selected.is_empty() {
            return Err(CanvasError::NoSelection);
        }
        let ids = std::mem::take(&mut self.selected);
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            removed.push(self.remove_object(id)?);
        }
        Ok(removed)
    }

    /// Drop all objects and the selection.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.selected.clear();
    }

    /// Get the number of objects in the scene.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Serialize the objects to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Replace the objects with those of a snapshot.
    ///
    /// The selection is cleared; the viewport is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be parsed; the scene is left
    /// unchanged in that case.
    pub fn restore_json(&mut self, json: &str) -> CanvasResult<()> {
        let restored: Self = serde_json::from_str(json)?;
        self.objects = restored.objects;
        self.selected.clear();
        Ok(())
    }
}
