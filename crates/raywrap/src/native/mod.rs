//! Native resource surface
//!
//! The wrapper layer sits over a C-style capability surface: free functions
//! that create, mutate, query and destroy resources identified by opaque ids.
//! [`NativeSurface`] is that surface as an object-safe trait; the wrappers in
//! this crate only ever talk to it through a shared [`Surface`].
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Image / Texture / Wave / Sound / Window│ ← owning wrappers
//! └───────────────────┬────────────────────┘
//!                     │ Handle<K> (acquire / release)
//!              ┌──────▼──────┐
//!              │   Surface   │ ← Rc<RefCell<dyn NativeSurface>>
//!              └──────┬──────┘
//!                     │ implemented by
//!          ┌──────────▼──────────┐
//!          │ SoftwareSurface     │ ← default, in-process
//!          │  └ DisplayBackend   │ ← HeadlessDisplay / GlfwDisplay
//!          └─────────────────────┘
//! ```

pub mod display;
#[cfg(feature = "glfw")]
pub mod glfw_display;
pub mod pcm;
#[cfg(feature = "audio")]
pub mod playback;
pub mod software;
pub mod types;

pub use crate::foundation::collections::{ImageId, SoundId, TextureId, WaveId};
pub use display::{DisplayBackend, HeadlessDisplay, WindowFlags};
pub use software::SoftwareSurface;
pub use types::*;

use crate::config::{AudioConfig, ConfigError, RuntimeConfig, SurfaceConfig};
use crate::error::{ContextResult, LoadError, ResourceResult};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// The raw capability surface the wrappers are built on
///
/// Every create call returns a fresh id the caller then owns; every
/// `unload_*` call destroys it. Unknown ids are tolerated: queries return
/// `None`, mutations return [`crate::ResourceError::StaleHandle`] and unloads
/// are no-ops. Mutations return the post-mutation description so callers can
/// refresh cached metadata in the same step.
pub trait NativeSurface {
    /// Decode an image file
    fn load_image(&mut self, path: &Path) -> Result<ImageId, LoadError>;

    /// Create a `width` x `height` image filled with `color`
    fn gen_image_color(
        &mut self,
        width: u32,
        height: u32,
        color: Color,
    ) -> Result<ImageId, LoadError>;

    /// Describe an image
    fn image_info(&self, id: ImageId) -> Option<ImageInfo>;

    /// Read one pixel, converted to RGBA
    fn image_pixel(&self, id: ImageId, x: u32, y: u32) -> Option<Color>;

    /// Keep only `rect` (clamped to the image)
    fn image_crop(&mut self, id: ImageId, rect: Rect) -> ResourceResult<ImageInfo>;

    /// Rescale to `width` x `height`
    fn image_resize(
        &mut self,
        id: ImageId,
        width: u32,
        height: u32,
        filter: ResizeFilter,
    ) -> ResourceResult<ImageInfo>;

    /// Mirror across an axis
    fn image_flip(&mut self, id: ImageId, axis: FlipAxis) -> ResourceResult<ImageInfo>;

    /// Rotate by a quarter turn
    fn image_rotate(&mut self, id: ImageId, rotation: Rotation) -> ResourceResult<ImageInfo>;

    /// Re-encode the pixels in another layout
    fn image_convert(&mut self, id: ImageId, format: PixelFormat) -> ResourceResult<ImageInfo>;

    /// Write the image to disk, format chosen by extension
    fn export_image(&self, id: ImageId, path: &Path) -> ResourceResult<()>;

    /// Destroy an image
    fn unload_image(&mut self, id: ImageId);

    /// Upload an image to a new GPU texture; the image is left untouched
    fn load_texture(&mut self, image: ImageId) -> ResourceResult<TextureId>;

    /// Describe a texture
    fn texture_info(&self, id: TextureId) -> Option<TextureInfo>;

    /// Change the sampling filter
    fn texture_set_filter(
        &mut self,
        id: TextureId,
        filter: TextureFilter,
    ) -> ResourceResult<TextureInfo>;

    /// Change the wrap mode
    fn texture_set_wrap(&mut self, id: TextureId, wrap: TextureWrap) -> ResourceResult<TextureInfo>;

    /// Generate the full mipmap chain
    fn texture_gen_mipmaps(&mut self, id: TextureId) -> ResourceResult<TextureInfo>;

    /// Replace the texels with an image of identical size
    fn texture_update(&mut self, id: TextureId, image: ImageId) -> ResourceResult<TextureInfo>;

    /// Read the texels back into a new image
    fn texture_to_image(&mut self, id: TextureId) -> ResourceResult<ImageId>;

    /// Destroy a texture
    fn unload_texture(&mut self, id: TextureId);

    /// Decode an audio file into a sample buffer
    fn load_wave(&mut self, path: &Path) -> Result<WaveId, LoadError>;

    /// Describe a sample buffer
    fn wave_info(&self, id: WaveId) -> Option<WaveInfo>;

    /// Keep frames `[init_frame, final_frame)`
    fn wave_crop(
        &mut self,
        id: WaveId,
        init_frame: u32,
        final_frame: u32,
    ) -> ResourceResult<WaveInfo>;

    /// Resample, requantize and remix
    fn wave_format(
        &mut self,
        id: WaveId,
        sample_rate: u32,
        sample_size: u16,
        channels: u16,
    ) -> ResourceResult<WaveInfo>;

    /// Write the samples to a WAV file
    fn export_wave(&self, id: WaveId, path: &Path) -> ResourceResult<()>;

    /// Destroy a sample buffer
    fn unload_wave(&mut self, id: WaveId);

    /// Copy a sample buffer onto the audio device as a playable sound
    fn load_sound(&mut self, wave: WaveId) -> ResourceResult<SoundId>;

    /// Describe the samples behind a sound
    fn sound_info(&self, id: SoundId) -> Option<WaveInfo>;

    /// Start from the beginning
    fn play_sound(&mut self, id: SoundId) -> ResourceResult<()>;

    /// Stop and rewind
    fn stop_sound(&mut self, id: SoundId) -> ResourceResult<()>;

    /// Pause at the current position
    fn pause_sound(&mut self, id: SoundId) -> ResourceResult<()>;

    /// Continue a paused sound
    fn resume_sound(&mut self, id: SoundId) -> ResourceResult<()>;

    /// Set per-sound volume (1.0 = unchanged)
    fn set_sound_volume(&mut self, id: SoundId, volume: f32) -> ResourceResult<()>;

    /// Set per-sound pitch (1.0 = unchanged)
    fn set_sound_pitch(&mut self, id: SoundId, pitch: f32) -> ResourceResult<()>;

    /// Whether the sound is currently audible
    fn is_sound_playing(&self, id: SoundId) -> bool;

    /// Destroy a sound
    fn unload_sound(&mut self, id: SoundId);

    /// Create the display window
    fn open_display(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
        flags: WindowFlags,
    ) -> ContextResult<()>;

    /// Destroy the display window; no-op when closed
    fn close_display(&mut self);

    /// Whether the display window exists
    fn is_display_open(&self) -> bool;

    /// Whether the user or OS requested the window to close
    fn display_should_close(&self) -> bool;

    /// Raise or clear the close request
    fn set_display_should_close(&mut self, should_close: bool);

    /// Pump window-system events
    fn poll_events(&mut self);

    /// Client area size
    fn display_size(&self) -> (u32, u32);

    /// Window title
    fn display_title(&self) -> String;

    /// Change the window title
    fn set_display_title(&mut self, title: &str);

    /// Start recording a frame
    fn begin_frame(&mut self) -> ResourceResult<()>;

    /// Fill the frame with a color
    fn clear_background(&mut self, color: Color) -> ResourceResult<()>;

    /// Draw a texture with its top-left corner at `(x, y)`
    fn draw_texture(&mut self, id: TextureId, x: i32, y: i32, tint: Color) -> ResourceResult<()>;

    /// Finish and present the frame
    fn end_frame(&mut self) -> ResourceResult<()>;

    /// Open the audio output device
    fn open_audio_device(&mut self, config: &AudioConfig) -> ContextResult<()>;

    /// Close the audio output device; no-op when closed
    fn close_audio_device(&mut self);

    /// Whether the audio device is open
    fn is_audio_device_open(&self) -> bool;

    /// Set the device-wide volume multiplier
    fn set_master_volume(&mut self, volume: f32);

    /// Device-wide volume multiplier
    fn master_volume(&self) -> f32;

    /// Acquire/release and frame counters
    fn stats(&self) -> SurfaceStats;
}

/// Shared handle to a native surface
///
/// Cloning is cheap and yields another reference to the same surface.
/// The handle is reference-counted without atomics, so neither it nor any
/// wrapper holding it can cross threads.
#[derive(Clone)]
pub struct Surface {
    inner: Rc<RefCell<dyn NativeSurface>>,
}

impl Surface {
    /// Wrap any native surface implementation
    pub fn new<S: NativeSurface + 'static>(native: S) -> Self {
        let inner: Rc<RefCell<dyn NativeSurface>> = Rc::new(RefCell::new(native));
        Self { inner }
    }

    /// Default in-process surface with a headless display
    pub fn software() -> Self {
        Self::new(SoftwareSurface::new())
    }

    /// Software surface configured from a [`SurfaceConfig`]
    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self::new(SoftwareSurface::from_config(config))
    }

    /// Load a runtime config file and build the surface it describes
    ///
    /// The window and audio sections are returned for [`crate::Window::init_with`]
    /// and [`crate::AudioDevice::init_with`].
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<(Self, RuntimeConfig), ConfigError> {
        let config = RuntimeConfig::load(path)?;
        Ok((Self::from_config(&config.surface), config))
    }

    /// Whether both handles refer to the same native surface
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.inner).cast::<()>(),
            Rc::as_ptr(&other.inner).cast::<()>(),
        )
    }

    /// Acquire/release and frame counters
    pub fn stats(&self) -> SurfaceStats {
        self.native_ref().stats()
    }

    /// Whether the display window is open
    pub fn is_display_open(&self) -> bool {
        self.native_ref().is_display_open()
    }

    /// Whether the audio device is open
    pub fn is_audio_device_open(&self) -> bool {
        self.native_ref().is_audio_device_open()
    }

    pub(crate) fn native(&self) -> RefMut<'_, dyn NativeSurface + 'static> {
        self.inner.borrow_mut()
    }

    pub(crate) fn native_ref(&self) -> Ref<'_, dyn NativeSurface + 'static> {
        self.inner.borrow()
    }

    /// Mutable access that never panics, for use from `Drop`
    pub(crate) fn try_native(&self) -> Option<RefMut<'_, dyn NativeSurface + 'static>> {
        self.inner.try_borrow_mut().ok()
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Surface");
        s.field("ptr", &Rc::as_ptr(&self.inner).cast::<()>());
        if let Ok(native) = self.inner.try_borrow() {
            s.field("live", &native.stats().live());
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_same_surface() {
        let surface = Surface::software();
        let other = surface.clone();
        assert!(surface.same_as(&other));
        assert!(!surface.same_as(&Surface::software()));
    }

    #[test]
    fn test_fresh_surface_is_empty() {
        let surface = Surface::software();
        assert_eq!(surface.stats(), SurfaceStats::default());
        assert!(!surface.is_display_open());
        assert!(!surface.is_audio_device_open());
    }
}
