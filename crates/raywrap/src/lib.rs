//! # raywrap
//!
//! Owned, chainable wrappers over a C-style graphics and audio surface.
//!
//! Every native resource (image, texture, wave, sound) is held by exactly one
//! wrapper and destroyed exactly once, when the wrapper is dropped, unloaded
//! or reloaded. The window and the audio device follow the same rule: they
//! are closed until initialized and close themselves on drop.
//!
//! ## Features
//!
//! - **Images**: load, generate, crop, resize, flip, rotate, convert, export
//! - **Textures**: upload from images, filter/wrap/mipmaps, update, read back
//! - **Audio**: decode waves, crop and reformat them, play them as sounds
//! - **Window**: open/close state machine with a scoped drawing [`Canvas`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use raywrap::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     raywrap::foundation::logging::init();
//!
//!     let surface = Surface::software();
//!     let mut window = Window::new(&surface);
//!     window.init(800, 450, "raywrap")?;
//!
//!     let mut image = Image::load(&surface, "resources/feynman.png")?;
//!     image.crop(Rect::new(100, 100, 100, 100))?.resize(50, 50)?;
//!     let texture = Texture::from_image(&window, &image)?;
//!
//!     while !window.should_close()? {
//!         let mut canvas = window.begin_drawing()?;
//!         canvas
//!             .clear_background(Color::RAYWHITE)?
//!             .draw_texture(&texture, 10, 10, Color::WHITE)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod audio;
pub mod config;
pub mod error;
pub mod foundation;
pub mod handle;
pub mod native;

mod image;
mod texture;
mod window;


pub use audio::{AudioDevice, Sound, Wave};
pub use error::{ContextError, ContextResult, LoadError, ResourceError, ResourceResult};
pub use handle::{Handle, ResourceKind};
pub use crate::image::Image;
pub use native::{NativeSurface, Surface};
pub use texture::Texture;
pub use window::{Canvas, Window};

/// Common imports for wrapper users
pub mod prelude {
    pub use crate::{
        audio::{AudioDevice, Sound, Wave},
        config::{AudioConfig, Config, RuntimeConfig, SurfaceConfig, WindowConfig},
        error::{ContextError, LoadError, ResourceError},
        native::{Color, PixelFormat, Rect, Surface, TextureFilter, TextureWrap},
        Canvas, Image, Texture, Window,
    };
}
