//! Decoded sample buffer wrapper

use crate::error::{LoadError, ResourceResult};
use crate::handle::{Handle, WaveKind};
use crate::native::{NativeSurface, Surface, WaveId, WaveInfo};
use std::path::Path;

/// Owned sample buffer in CPU memory
#[derive(Debug, Default)]
pub struct Wave {
    handle: Handle<WaveKind>,
    info: WaveInfo,
}

impl Wave {
    /// Decode an audio file (WAV; OGG/MP3/FLAC with the `audio` feature)
    pub fn load(surface: &Surface, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let mut wave = Self::default();
        wave.reload(surface, path)?;
        Ok(wave)
    }

    /// Replace the owned buffer with a freshly decoded one
    ///
    /// The previous buffer is released first; on failure the wrapper is empty.
    pub fn reload(
        &mut self,
        surface: &Surface,
        path: impl AsRef<Path>,
    ) -> Result<&mut Self, LoadError> {
        let path = path.as_ref();
        self.info = WaveInfo::default();
        let raw = self.handle.acquire(surface, |native| native.load_wave(path))?;
        self.info = surface.native_ref().wave_info(raw).unwrap_or_default();
        Ok(self)
    }

    fn apply(
        &mut self,
        op: impl FnOnce(&mut dyn NativeSurface, WaveId) -> ResourceResult<WaveInfo>,
    ) -> ResourceResult<&mut Self> {
        self.info = self.handle.with_native(op)?;
        Ok(self)
    }

    /// Whether a buffer is owned
    pub const fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// Frames (one sample per channel)
    pub const fn frame_count(&self) -> u32 {
        self.info.frame_count
    }

    /// Frames per second
    pub const fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    /// Bits per sample
    pub const fn sample_size(&self) -> u16 {
        self.info.sample_size
    }

    /// Interleaved channels
    pub const fn channels(&self) -> u16 {
        self.info.channels
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.info.duration_secs()
    }

    /// Cached native description
    pub const fn info(&self) -> WaveInfo {
        self.info
    }

    /// Keep frames `[init_frame, final_frame)`
    pub fn crop(&mut self, init_frame: u32, final_frame: u32) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.wave_crop(id, init_frame, final_frame))
    }

    /// Resample, requantize and remix
    ///
    /// Changing the rate or channel count needs the `audio` feature; a
    /// conversion that would leave no frames fails and keeps the buffer.
    pub fn format(
        &mut self,
        sample_rate: u32,
        sample_size: u16,
        channels: u16,
    ) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.wave_format(id, sample_rate, sample_size, channels))
    }

    /// Write the buffer to a WAV file
    pub fn export(&self, path: impl AsRef<Path>) -> ResourceResult<()> {
        let path = path.as_ref();
        self.handle.with_native(|native, id| native.export_wave(id, path))
    }

    /// Release the owned buffer
    pub fn unload(&mut self) {
        self.handle.release();
        self.info = WaveInfo::default();
    }

    /// Move the buffer out, leaving this wrapper empty
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub(crate) const fn handle(&self) -> &Handle<WaveKind> {
        &self.handle
    }
}
