//! Audio device context

use crate::config::AudioConfig;
use crate::error::{ContextError, ContextResult};
use crate::native::Surface;

/// Audio output device owned by the application
///
/// Closed until [`AudioDevice::init`] succeeds; closes itself when dropped.
/// At most one device can be open per surface.
#[derive(Debug)]
pub struct AudioDevice {
    surface: Surface,
    open: bool,
}

impl AudioDevice {
    /// Closed device on `surface`
    pub fn new(surface: &Surface) -> Self {
        Self {
            surface: surface.clone(),
            open: false,
        }
    }

    /// Open with default output parameters
    pub fn init(&mut self) -> ContextResult<&mut Self> {
        self.init_with(&AudioConfig::default())
    }

    /// Open with the given output parameters
    pub fn init_with(&mut self, config: &AudioConfig) -> ContextResult<&mut Self> {
        if self.open {
            return Err(ContextError::AlreadyOpen("Audio device"));
        }
        self.surface.native().open_audio_device(config)?;
        self.open = true;
        Ok(self)
    }

    /// Whether this device is open
    pub fn is_ready(&self) -> bool {
        self.open && self.surface.is_audio_device_open()
    }

    /// Set the device-wide volume, clamped to `0.0..=1.0`
    pub fn set_master_volume(&mut self, volume: f32) -> ContextResult<&mut Self> {
        if !self.open {
            return Err(ContextError::NotOpen("Audio device"));
        }
        self.surface.native().set_master_volume(volume);
        Ok(self)
    }

    /// Device-wide volume, `None` while closed
    pub fn master_volume(&self) -> Option<f32> {
        self.open.then(|| self.surface.native_ref().master_volume())
    }

    /// Surface this device lives on
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Close the device; no-op when already closed
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        match self.surface.try_native() {
            Some(mut native) => native.close_audio_device(),
            None => {
                log::warn!("Audio device closed while the surface is borrowed, device left open")
            }
        }
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.close();
    }
}
