//! Playable sound wrapper

use super::device::AudioDevice;
use super::wave::Wave;
use crate::error::{ResourceError, ResourceResult};
use crate::handle::{Handle, SoundKind};
use crate::native::{NativeSurface, SoundId, WaveInfo};
use std::path::Path;

/// Owned sound on the audio device
#[derive(Debug)]
pub struct Sound {
    handle: Handle<SoundKind>,
    info: WaveInfo,
    volume: f32,
    pitch: f32,
}

impl Default for Sound {
    fn default() -> Self {
        Self {
            handle: Handle::empty(),
            info: WaveInfo::default(),
            volume: 1.0,
            pitch: 1.0,
        }
    }
}

impl Sound {
    /// Copy `wave` onto the device; the wave is left untouched
    pub fn from_wave(device: &AudioDevice, wave: &Wave) -> ResourceResult<Self> {
        if !device.is_ready() {
            return Err(ResourceError::AudioDeviceClosed);
        }
        let source = wave.handle().raw().ok_or(ResourceError::NotReady("Wave"))?;
        let surface = device.surface();
        if !wave.handle().belongs_to(surface) {
            return Err(ResourceError::ForeignSurface);
        }

        let mut sound = Self::default();
        let raw = sound.handle.acquire(surface, |native| native.load_sound(source))?;
        sound.info = surface.native_ref().sound_info(raw).unwrap_or_default();
        Ok(sound)
    }

    /// Decode an audio file and place it on the device, discarding the wave
    pub fn load(device: &AudioDevice, path: impl AsRef<Path>) -> ResourceResult<Self> {
        if !device.is_ready() {
            return Err(ResourceError::AudioDeviceClosed);
        }
        let wave = Wave::load(device.surface(), path)?;
        Self::from_wave(device, &wave)
    }

    fn control(
        &mut self,
        op: impl FnOnce(&mut dyn NativeSurface, SoundId) -> ResourceResult<()>,
    ) -> ResourceResult<&mut Self> {
        self.handle.with_native(op)?;
        Ok(self)
    }

    /// Whether a sound is owned
    pub const fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// Frames in the sound
    pub const fn frame_count(&self) -> u32 {
        self.info.frame_count
    }

    /// Description of the underlying samples
    pub const fn info(&self) -> WaveInfo {
        self.info
    }

    /// Per-sound volume
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    /// Per-sound pitch
    pub const fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Whether the sound is currently audible
    pub fn is_playing(&self) -> bool {
        self.handle
            .query(|native, id| Some(native.is_sound_playing(id)))
            .unwrap_or(false)
    }

    /// Start from the beginning
    pub fn play(&mut self) -> ResourceResult<&mut Self> {
        self.control(|native, id| native.play_sound(id))
    }

    /// Stop and rewind
    pub fn stop(&mut self) -> ResourceResult<&mut Self> {
        self.control(|native, id| native.stop_sound(id))
    }

    /// Pause at the current position
    pub fn pause(&mut self) -> ResourceResult<&mut Self> {
        self.control(|native, id| native.pause_sound(id))
    }

    /// Continue after [`Sound::pause`]
    pub fn resume(&mut self) -> ResourceResult<&mut Self> {
        self.control(|native, id| native.resume_sound(id))
    }

    /// Set the volume (1.0 = unchanged)
    pub fn set_volume(&mut self, volume: f32) -> ResourceResult<&mut Self> {
        self.control(|native, id| native.set_sound_volume(id, volume))?;
        self.volume = volume.max(0.0);
        Ok(self)
    }

    /// Set the pitch (1.0 = unchanged)
    pub fn set_pitch(&mut self, pitch: f32) -> ResourceResult<&mut Self> {
        self.control(|native, id| native.set_sound_pitch(id, pitch))?;
        self.pitch = pitch;
        Ok(self)
    }

    /// Release the owned sound
    pub fn unload(&mut self) {
        self.handle.release();
        *self = Self::default();
    }

    /// Move the sound out, leaving this wrapper empty
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::device::tests::try_open;
    use crate::audio::wave::tests::write_tone;
    use crate::config::AudioConfig;
    use crate::native::Surface;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn open_device(surface: &Surface) -> Option<AudioDevice> {
        try_open(surface, &AudioConfig::default())
    }

    #[test]
    fn test_sound_needs_open_device() {
        let dir = TempDir::new().unwrap();
        let path = write_tone(dir.path(), "closed-device", 100, 8000);
        let surface = Surface::software();
        let device = AudioDevice::new(&surface);
        let wave = Wave::load(&surface, &path).unwrap();

        assert!(matches!(Sound::from_wave(&device, &wave), Err(ResourceError::AudioDeviceClosed)));
        assert!(matches!(Sound::load(&device, &path), Err(ResourceError::AudioDeviceClosed)));
    }

    #[test]
    fn test_playback_controls_chain() {
        let dir = TempDir::new().unwrap();
        let path = write_tone(dir.path(), "controls", 16_000, 8000);
        let surface = Surface::software();
        let Some(device) = open_device(&surface) else {
            return;
        };
        let mut sound = Sound::load(&device, &path).unwrap();
        assert_eq!(sound.frame_count(), 16_000);
        assert_eq!(surface.stats().waves.live(), 0);

        sound.set_volume(0.5).unwrap().set_pitch(1.5).unwrap().play().unwrap();
        assert!(sound.is_playing());
        assert_relative_eq!(sound.volume(), 0.5);
        assert_relative_eq!(sound.pitch(), 1.5);

        sound.pause().unwrap();
        assert!(!sound.is_playing());
        sound.resume().unwrap();
        assert!(sound.is_playing());
        sound.stop().unwrap();
        assert!(!sound.is_playing());
    }

    #[test]
    fn test_rejected_pitch_keeps_state() {
        let dir = TempDir::new().unwrap();
        let path = write_tone(dir.path(), "pitch", 100, 8000);
        let surface = Surface::software();
        let Some(device) = open_device(&surface) else {
            return;
        };
        let mut sound = Sound::load(&device, &path).unwrap();

        assert!(matches!(sound.set_pitch(0.0), Err(ResourceError::Unsupported(_))));
        assert_relative_eq!(sound.pitch(), 1.0);
    }

    #[test]
    fn test_not_ready_sound() {
        let mut sound = Sound::default();
        assert!(!sound.is_playing());
        assert!(matches!(sound.play(), Err(ResourceError::NotReady("Sound"))));
    }

    #[test]
    fn test_closing_device_silences_sound() {
        let dir = TempDir::new().unwrap();
        let path = write_tone(dir.path(), "close", 8000, 8000);
        let surface = Surface::software();
        let Some(mut device) = open_device(&surface) else {
            return;
        };
        let mut sound = Sound::load(&device, &path).unwrap();
        sound.play().unwrap();

        device.close();
        assert!(!sound.is_playing());
        assert!(matches!(sound.play(), Err(ResourceError::AudioDeviceClosed)));

        sound.unload();
        assert_eq!(surface.stats().sounds.live(), 0);
    }
}
