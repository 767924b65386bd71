//! # Wallpaper Renderer
//!
//! Pixel work for Wallpaper Studio: decoding uploads, the image filter
//! pipeline, and exporting an editing scene to PNG, JPEG or SVG.
//!
//! ## Export Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │  Scene   │──▶│ SVG document │──▶│ resvg raster │──▶│ PNG/JPEG │
//! └──────────┘   └──────────────┘   └──────────────┘   └──────────┘
//!                  ▲ images decoded, filtered, re-embedded
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
#[cfg(feature = "export")]
pub mod export;
pub mod filter;
pub mod image;

pub use error::{RenderError, RenderResult};
#[cfg(feature = "export")]
pub use export::{ExportConfig, ExportFormat, SceneExporter};
pub use filter::{apply_filter, apply_filters};
pub use image::{
    encode_png_data_uri, filtered_data_uri, load_image_from_bytes, load_image_from_data_uri,
    DecodedImage, DecodingProbe,
};
