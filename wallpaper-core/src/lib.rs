//! # Wallpaper Core
//!
//! Editing logic for Wallpaper Studio: the scene graph behind the editing
//! surface, bounded undo history, tool dispatch and gallery paging.
//! Compiles to WASM for the browser page shell and is linked natively by the
//! server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               EditingSession                │
//! ├─────────────────────────────────────────────┤
//! │  Scene           │  Tools                   │
//! │  - Objects       │  - Tool actions          │
//! │  - Selection     │  - Free draw / crop      │
//! │  - Viewport      │  - Upload validation     │
//! ├─────────────────────────────────────────────┤
//! │  History         │  Notices                 │
//! │  - Snapshots     │  - Dismissable warnings  │
//! │  - Undo          │                          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod element;
pub mod error;
pub mod event;
pub mod gallery;
pub mod history;
pub mod notice;
pub mod scene;
pub mod session;
pub mod store;
pub mod tools;
pub mod upload;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use element::{
    normalize_color, Capabilities, FilterKind, ImageFormat, ObjectId, ObjectKind, Point,
    SceneObject, ShapeKind, Style, Transform,
};
pub use error::{CanvasError, CanvasResult};
pub use event::{PointerEvent, PointerPhase, ResizeDebouncer};
pub use gallery::{FeedMode, GalleryFeed, PageRequest, Photo, PhotoSource, PhotosPage};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use scene::{validate_surface, Scene, Viewport, MAX_SURFACE_EDGE, MAX_ZOOM, MIN_ZOOM};
pub use session::{EditingSession, SceneView, SessionView};
pub use store::{SessionId, SessionStore, DEFAULT_IDLE_TIMEOUT};
pub use tools::{CropGuide, FlipAxis, ToolAction, ToolOutcome};
pub use upload::{ImageProbe, KnownDimensions, PreparedImage, UploadedImage, MAX_UPLOAD_BYTES};

/// Wallpaper core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
