//! In-process native surface
//!
//! Images and textures live as `DynamicImage`s, waves and sounds as
//! [`PcmBuffer`]s, each in a generational table. The display is delegated to
//! a [`DisplayBackend`]; with the `audio` feature sounds play through rodio.

use super::display::{DisplayBackend, HeadlessDisplay, WindowFlags};
use super::pcm::{AudioFormat, PcmBuffer, SUPPORTED_SAMPLE_SIZES};
use super::types::*;
use super::NativeSurface;
use crate::config::{AudioConfig, DisplayKind, SurfaceConfig};
use crate::error::{ContextError, ContextResult, LoadError, ResourceError, ResourceResult};
use crate::foundation::collections::{HandleMap, ImageId, SoundId, TextureId, WaveId};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageError, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct TextureEntry {
    pixels: DynamicImage,
    mipmaps: u32,
    filter: TextureFilter,
    wrap: TextureWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone)]
struct SoundEntry {
    pcm: PcmBuffer,
    state: PlayState,
    volume: f32,
    pitch: f32,
}

/// Open audio device
struct AudioOutput {
    #[cfg(feature = "audio")]
    playback: super::playback::PlaybackDevice,
}

/// Default [`NativeSurface`] implementation
pub struct SoftwareSurface {
    search_paths: Vec<PathBuf>,
    images: HandleMap<ImageId, DynamicImage>,
    textures: HandleMap<TextureId, TextureEntry>,
    waves: HandleMap<WaveId, PcmBuffer>,
    sounds: HandleMap<SoundId, SoundEntry>,
    display: Box<dyn DisplayBackend>,
    frame_open: bool,
    audio: Option<AudioOutput>,
    master_volume: f32,
    stats: SurfaceStats,
}

impl SoftwareSurface {
    /// Surface with a headless display and no search paths
    pub fn new() -> Self {
        Self::with_display(HeadlessDisplay::new())
    }

    /// Surface driving the given display backend
    pub fn with_display(display: impl DisplayBackend + 'static) -> Self {
        Self {
            search_paths: Vec::new(),
            images: HandleMap::with_key(),
            textures: HandleMap::with_key(),
            waves: HandleMap::with_key(),
            sounds: HandleMap::with_key(),
            display: Box::new(display),
            frame_open: false,
            audio: None,
            master_volume: 1.0,
            stats: SurfaceStats::default(),
        }
    }

    /// Surface built from configuration
    pub fn from_config(config: &SurfaceConfig) -> Self {
        let mut surface = match config.display {
            DisplayKind::Headless => Self::new(),
            #[cfg(feature = "glfw")]
            DisplayKind::Glfw => Self::with_display(super::glfw_display::GlfwDisplay::new()),
            #[cfg(not(feature = "glfw"))]
            DisplayKind::Glfw => {
                log::warn!("`glfw` feature disabled, using the headless display");
                Self::new()
            }
        };
        for dir in &config.search_paths {
            surface = surface.with_search_path(dir);
        }
        surface
    }

    /// Append a directory searched before paths are used as given
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Resolve a path against the search paths, then as given
    fn resolve(&self, path: &Path) -> Result<PathBuf, LoadError> {
        if path.is_relative() {
            for dir in &self.search_paths {
                let candidate = dir.join(path);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        Err(LoadError::NotFound(path.to_path_buf()))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        let resolved = self.resolve(path)?;
        std::fs::read(&resolved).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn insert_image(&mut self, pixels: DynamicImage) -> ImageId {
        let (width, height) = pixels.dimensions();
        let id = self.images.insert(pixels);
        self.stats.images.on_acquire();
        log::info!("IMAGE: [{id:?}] loaded ({width}x{height})");
        id
    }

    fn image_mut(&mut self, id: ImageId) -> ResourceResult<&mut DynamicImage> {
        self.images.get_mut(id).ok_or(ResourceError::StaleHandle("Image"))
    }

    /// Replace an image's pixels and describe the result
    fn replace_image(
        &mut self,
        id: ImageId,
        op: impl FnOnce(&DynamicImage) -> DynamicImage,
    ) -> ResourceResult<ImageInfo> {
        let pixels = self.image_mut(id)?;
        *pixels = op(&*pixels);
        Ok(describe_image(pixels))
    }

    fn require_display(&self) -> ResourceResult<()> {
        if self.display.is_open() {
            Ok(())
        } else {
            Err(ResourceError::DisplayClosed)
        }
    }

    fn require_frame(&self) -> ResourceResult<()> {
        if self.frame_open {
            Ok(())
        } else {
            Err(ResourceError::FrameState("no frame in progress"))
        }
    }

    fn texture_mut(&mut self, id: TextureId) -> ResourceResult<&mut TextureEntry> {
        self.require_display()?;
        self.textures.get_mut(id).ok_or(ResourceError::StaleHandle("Texture"))
    }

    fn require_audio(&self) -> ResourceResult<()> {
        if self.audio.is_some() {
            Ok(())
        } else {
            Err(ResourceError::AudioDeviceClosed)
        }
    }

    fn sound_mut(&mut self, id: SoundId) -> ResourceResult<&mut SoundEntry> {
        self.require_audio()?;
        self.sounds.get_mut(id).ok_or(ResourceError::StaleHandle("Sound"))
    }

    fn decode_wave(bytes: Vec<u8>, path: &Path) -> Result<PcmBuffer, LoadError> {
        let decode_err = |reason: String| LoadError::Decode {
            path: path.to_path_buf(),
            reason,
        };
        match AudioFormat::detect(&bytes) {
            AudioFormat::Wav => {
                PcmBuffer::decode_wav(&bytes).map_err(|e| decode_err(e.to_string()))
            }
            #[cfg(feature = "audio")]
            AudioFormat::Ogg | AudioFormat::Mp3 | AudioFormat::Flac => {
                super::playback::decode_compressed(bytes).map_err(decode_err)
            }
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn stop_all_sounds(&mut self) {
        for (_id, sound) in &mut self.sounds {
            sound.state = PlayState::Stopped;
        }
    }
}

#[cfg(feature = "audio")]
fn resample(pcm: &PcmBuffer, sample_rate: u32, channels: u16) -> ResourceResult<PcmBuffer> {
    Ok(super::playback::convert(pcm, sample_rate, channels))
}

#[cfg(not(feature = "audio"))]
fn resample(pcm: &PcmBuffer, sample_rate: u32, channels: u16) -> ResourceResult<PcmBuffer> {
    Err(ResourceError::Unsupported(format!(
        "converting {} Hz, {} ch to {sample_rate} Hz, {channels} ch without the `audio` feature",
        pcm.sample_rate, pcm.channels
    )))
}

impl Default for SoftwareSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SoftwareSurface {
    fn drop(&mut self) {
        let live = self.stats.live();
        if live > 0 {
            log::warn!("Native surface dropped with {live} live resources");
        }
        self.audio = None;
        self.display.close();
    }
}

fn pixel_format(pixels: &DynamicImage) -> PixelFormat {
    match pixels.color() {
        ColorType::L8 => PixelFormat::Grayscale,
        ColorType::La8 => PixelFormat::GrayAlpha,
        ColorType::Rgb8 => PixelFormat::Rgb8,
        _ => PixelFormat::Rgba8,
    }
}

/// Collapse decoded layouts onto the supported pixel formats
fn normalize(pixels: DynamicImage) -> DynamicImage {
    match pixels.color() {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => pixels,
        _ => DynamicImage::ImageRgba8(pixels.to_rgba8()),
    }
}

fn convert_pixels(pixels: &DynamicImage, format: PixelFormat) -> DynamicImage {
    match format {
        PixelFormat::Grayscale => DynamicImage::ImageLuma8(pixels.to_luma8()),
        PixelFormat::GrayAlpha => DynamicImage::ImageLumaA8(pixels.to_luma_alpha8()),
        PixelFormat::Rgb8 => DynamicImage::ImageRgb8(pixels.to_rgb8()),
        PixelFormat::Rgba8 => DynamicImage::ImageRgba8(pixels.to_rgba8()),
    }
}

fn describe_image(pixels: &DynamicImage) -> ImageInfo {
    ImageInfo {
        width: pixels.width(),
        height: pixels.height(),
        mipmaps: 1,
        format: pixel_format(pixels),
    }
}

fn describe_texture(entry: &TextureEntry) -> TextureInfo {
    TextureInfo {
        width: entry.pixels.width(),
        height: entry.pixels.height(),
        mipmaps: entry.mipmaps,
        format: pixel_format(&entry.pixels),
        filter: entry.filter,
        wrap: entry.wrap,
    }
}

fn describe_wave(pcm: &PcmBuffer) -> WaveInfo {
    WaveInfo {
        frame_count: pcm.frame_count(),
        sample_rate: pcm.sample_rate,
        sample_size: pcm.sample_size,
        channels: pcm.channels,
    }
}

/// Levels in a full mipmap chain down to 1x1
const fn mip_chain_len(width: u32, height: u32) -> u32 {
    let largest = if width > height { width } else { height };
    32 - largest.leading_zeros()
}

impl NativeSurface for SoftwareSurface {
    fn load_image(&mut self, path: &Path) -> Result<ImageId, LoadError> {
        let bytes = self.read_bytes(path).map_err(|e| {
            log::warn!("IMAGE: Failed to load {}: {e}", path.display());
            e
        })?;
        let pixels = image::load_from_memory(&bytes).map_err(|e| {
            log::warn!("IMAGE: Failed to decode {}: {e}", path.display());
            match e {
                ImageError::Unsupported(_) => LoadError::UnsupportedFormat(path.to_path_buf()),
                other => LoadError::Decode {
                    path: path.to_path_buf(),
                    reason: other.to_string(),
                },
            }
        })?;
        Ok(self.insert_image(normalize(pixels)))
    }

    fn gen_image_color(
        &mut self,
        width: u32,
        height: u32,
        color: Color,
    ) -> Result<ImageId, LoadError> {
        if width == 0 || height == 0 {
            return Err(LoadError::InvalidParameters(format!(
                "image size must be non-zero, got {width}x{height}"
            )));
        }
        let pixels = RgbaImage::from_pixel(width, height, Rgba(color.to_array()));
        Ok(self.insert_image(DynamicImage::ImageRgba8(pixels)))
    }

    fn image_info(&self, id: ImageId) -> Option<ImageInfo> {
        self.images.get(id).map(describe_image)
    }

    fn image_pixel(&self, id: ImageId, x: u32, y: u32) -> Option<Color> {
        let pixels = self.images.get(id)?;
        if !pixels.in_bounds(x, y) {
            return None;
        }
        Some(Color::from(pixels.get_pixel(x, y).0))
    }

    fn image_crop(&mut self, id: ImageId, rect: Rect) -> ResourceResult<ImageInfo> {
        let pixels = self.image_mut(id)?;
        let (x, y, width, height) =
            rect.clamp_to(pixels.width(), pixels.height()).ok_or_else(|| {
                ResourceError::InvalidRegion(format!("{rect:?} lies outside the image"))
            })?;
        self.replace_image(id, |pixels| pixels.crop_imm(x, y, width, height))
    }

    fn image_resize(
        &mut self,
        id: ImageId,
        width: u32,
        height: u32,
        filter: ResizeFilter,
    ) -> ResourceResult<ImageInfo> {
        if width == 0 || height == 0 {
            return Err(ResourceError::InvalidDimensions { width, height });
        }
        let filter = match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
        };
        self.replace_image(id, |pixels| pixels.resize_exact(width, height, filter))
    }

    fn image_flip(&mut self, id: ImageId, axis: FlipAxis) -> ResourceResult<ImageInfo> {
        self.replace_image(id, |pixels| match axis {
            FlipAxis::Vertical => pixels.flipv(),
            FlipAxis::Horizontal => pixels.fliph(),
        })
    }

    fn image_rotate(&mut self, id: ImageId, rotation: Rotation) -> ResourceResult<ImageInfo> {
        self.replace_image(id, |pixels| match rotation {
            Rotation::Clockwise => pixels.rotate90(),
            Rotation::CounterClockwise => pixels.rotate270(),
        })
    }

    fn image_convert(&mut self, id: ImageId, format: PixelFormat) -> ResourceResult<ImageInfo> {
        self.replace_image(id, |pixels| convert_pixels(pixels, format))
    }

    fn export_image(&self, id: ImageId, path: &Path) -> ResourceResult<()> {
        let pixels = self.images.get(id).ok_or(ResourceError::StaleHandle("Image"))?;
        pixels.save(path).map_err(|e| ResourceError::Export {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::info!("IMAGE: [{id:?}] exported to {}", path.display());
        Ok(())
    }

    fn unload_image(&mut self, id: ImageId) {
        if self.images.remove(id).is_some() {
            self.stats.images.on_release();
            log::info!("IMAGE: [{id:?}] unloaded");
        }
    }

    fn load_texture(&mut self, image: ImageId) -> ResourceResult<TextureId> {
        self.require_display()?;
        let pixels = self.images.get(image).ok_or(ResourceError::StaleHandle("Image"))?.clone();
        let (width, height) = pixels.dimensions();
        let id = self.textures.insert(TextureEntry {
            pixels,
            mipmaps: 1,
            filter: TextureFilter::default(),
            wrap: TextureWrap::default(),
        });
        self.stats.textures.on_acquire();
        log::info!("TEXTURE: [{id:?}] uploaded ({width}x{height})");
        Ok(id)
    }

    fn texture_info(&self, id: TextureId) -> Option<TextureInfo> {
        self.textures.get(id).map(describe_texture)
    }

    fn texture_set_filter(
        &mut self,
        id: TextureId,
        filter: TextureFilter,
    ) -> ResourceResult<TextureInfo> {
        let entry = self.texture_mut(id)?;
        entry.filter = filter;
        Ok(describe_texture(entry))
    }

    fn texture_set_wrap(
        &mut self,
        id: TextureId,
        wrap: TextureWrap,
    ) -> ResourceResult<TextureInfo> {
        let entry = self.texture_mut(id)?;
        entry.wrap = wrap;
        Ok(describe_texture(entry))
    }

    fn texture_gen_mipmaps(&mut self, id: TextureId) -> ResourceResult<TextureInfo> {
        let entry = self.texture_mut(id)?;
        entry.mipmaps = mip_chain_len(entry.pixels.width(), entry.pixels.height());
        log::debug!("TEXTURE: [{id:?}] mipmaps generated ({} levels)", entry.mipmaps);
        Ok(describe_texture(entry))
    }

    fn texture_update(&mut self, id: TextureId, image: ImageId) -> ResourceResult<TextureInfo> {
        self.require_display()?;
        let source = self.images.get(image).ok_or(ResourceError::StaleHandle("Image"))?;
        let entry = self.textures.get(id).ok_or(ResourceError::StaleHandle("Texture"))?;
        if source.dimensions() != entry.pixels.dimensions() {
            return Err(ResourceError::SizeMismatch {
                expected: entry.pixels.dimensions(),
                actual: source.dimensions(),
            });
        }
        let pixels = convert_pixels(source, pixel_format(&entry.pixels));
        let entry = self.texture_mut(id)?;
        entry.pixels = pixels;
        Ok(describe_texture(entry))
    }

    fn texture_to_image(&mut self, id: TextureId) -> ResourceResult<ImageId> {
        let pixels = self.texture_mut(id)?.pixels.clone();
        Ok(self.insert_image(pixels))
    }

    fn unload_texture(&mut self, id: TextureId) {
        if self.textures.remove(id).is_some() {
            self.stats.textures.on_release();
            log::info!("TEXTURE: [{id:?}] unloaded");
        }
    }

    fn load_wave(&mut self, path: &Path) -> Result<WaveId, LoadError> {
        let pcm = self
            .read_bytes(path)
            .and_then(|bytes| Self::decode_wave(bytes, path))
            .map_err(|e| {
                log::warn!("WAVE: Failed to load {}: {e}", path.display());
                e
            })?;
        let info = describe_wave(&pcm);
        let id = self.waves.insert(pcm);
        self.stats.waves.on_acquire();
        log::info!(
            "WAVE: [{id:?}] loaded ({} frames, {} Hz, {} bit, {} ch)",
            info.frame_count,
            info.sample_rate,
            info.sample_size,
            info.channels
        );
        Ok(id)
    }

    fn wave_info(&self, id: WaveId) -> Option<WaveInfo> {
        self.waves.get(id).map(describe_wave)
    }

    fn wave_crop(
        &mut self,
        id: WaveId,
        init_frame: u32,
        final_frame: u32,
    ) -> ResourceResult<WaveInfo> {
        let pcm = self.waves.get_mut(id).ok_or(ResourceError::StaleHandle("Wave"))?;
        let frames = pcm.frame_count();
        if init_frame >= final_frame || final_frame > frames {
            return Err(ResourceError::InvalidRegion(format!(
                "frames {init_frame}..{final_frame} outside 0..{frames}"
            )));
        }
        pcm.crop(init_frame, final_frame);
        Ok(describe_wave(pcm))
    }

    fn wave_format(
        &mut self,
        id: WaveId,
        sample_rate: u32,
        sample_size: u16,
        channels: u16,
    ) -> ResourceResult<WaveInfo> {
        if !SUPPORTED_SAMPLE_SIZES.contains(&sample_size) {
            return Err(ResourceError::Unsupported(format!("{sample_size}-bit samples")));
        }
        if channels == 0 || sample_rate == 0 {
            return Err(ResourceError::Unsupported(format!(
                "{channels} channels at {sample_rate} Hz"
            )));
        }
        let pcm = self.waves.get(id).ok_or(ResourceError::StaleHandle("Wave"))?;
        if pcm.frames_at(sample_rate) == 0 {
            return Err(ResourceError::InvalidRegion(format!(
                "{} frames at {} Hz leave no frames at {sample_rate} Hz",
                pcm.frame_count(),
                pcm.sample_rate
            )));
        }

        let mut converted = if (pcm.sample_rate, pcm.channels) == (sample_rate, channels) {
            pcm.clone()
        } else {
            resample(pcm, sample_rate, channels)?
        };
        if converted.frame_count() == 0 {
            return Err(ResourceError::InvalidRegion(format!(
                "conversion to {sample_rate} Hz, {channels} ch left no frames"
            )));
        }
        converted.requantize(sample_size);

        let info = describe_wave(&converted);
        if let Some(slot) = self.waves.get_mut(id) {
            *slot = converted;
        }
        log::debug!(
            "WAVE: [{id:?}] formatted to {sample_rate} Hz, {sample_size} bit, {channels} ch"
        );
        Ok(info)
    }

    fn export_wave(&self, id: WaveId, path: &Path) -> ResourceResult<()> {
        let pcm = self.waves.get(id).ok_or(ResourceError::StaleHandle("Wave"))?;
        let export_err = |reason: String| ResourceError::Export {
            path: path.to_path_buf(),
            reason,
        };
        let file = std::fs::File::create(path).map_err(|e| export_err(e.to_string()))?;
        pcm.encode_wav(std::io::BufWriter::new(file))
            .map_err(|e| export_err(e.to_string()))?;
        log::info!("WAVE: [{id:?}] exported to {}", path.display());
        Ok(())
    }

    fn unload_wave(&mut self, id: WaveId) {
        if self.waves.remove(id).is_some() {
            self.stats.waves.on_release();
            log::info!("WAVE: [{id:?}] unloaded");
        }
    }

    fn load_sound(&mut self, wave: WaveId) -> ResourceResult<SoundId> {
        self.require_audio()?;
        let pcm = self.waves.get(wave).ok_or(ResourceError::StaleHandle("Wave"))?.clone();
        let frames = pcm.frame_count();
        let id = self.sounds.insert(SoundEntry {
            pcm,
            state: PlayState::Stopped,
            volume: 1.0,
            pitch: 1.0,
        });
        self.stats.sounds.on_acquire();
        log::info!("SOUND: [{id:?}] loaded ({frames} frames)");
        Ok(id)
    }

    fn sound_info(&self, id: SoundId) -> Option<WaveInfo> {
        self.sounds.get(id).map(|sound| describe_wave(&sound.pcm))
    }

    fn play_sound(&mut self, id: SoundId) -> ResourceResult<()> {
        let master = self.master_volume;
        let sound = self.sound_mut(id)?;
        sound.state = PlayState::Playing;
        #[cfg(feature = "audio")]
        {
            let (volume, pitch) = (sound.volume * master, sound.pitch);
            let pcm = sound.pcm.clone();
            if let Some(output) = self.audio.as_mut() {
                output.playback.play(id, &pcm, volume, pitch).map_err(ResourceError::Playback)?;
            }
        }
        #[cfg(not(feature = "audio"))]
        let _ = master;
        log::debug!("SOUND: [{id:?}] playing");
        Ok(())
    }

    fn stop_sound(&mut self, id: SoundId) -> ResourceResult<()> {
        self.sound_mut(id)?.state = PlayState::Stopped;
        #[cfg(feature = "audio")]
        if let Some(output) = self.audio.as_mut() {
            output.playback.stop(id);
        }
        Ok(())
    }

    fn pause_sound(&mut self, id: SoundId) -> ResourceResult<()> {
        let sound = self.sound_mut(id)?;
        if sound.state == PlayState::Playing {
            sound.state = PlayState::Paused;
        }
        #[cfg(feature = "audio")]
        if let Some(output) = self.audio.as_ref() {
            output.playback.pause(id);
        }
        Ok(())
    }

    fn resume_sound(&mut self, id: SoundId) -> ResourceResult<()> {
        let sound = self.sound_mut(id)?;
        if sound.state == PlayState::Paused {
            sound.state = PlayState::Playing;
        }
        #[cfg(feature = "audio")]
        if let Some(output) = self.audio.as_ref() {
            output.playback.resume(id);
        }
        Ok(())
    }

    fn set_sound_volume(&mut self, id: SoundId, volume: f32) -> ResourceResult<()> {
        let master = self.master_volume;
        let sound = self.sound_mut(id)?;
        sound.volume = volume.max(0.0);
        #[cfg(feature = "audio")]
        {
            let effective = sound.volume * master;
            if let Some(output) = self.audio.as_ref() {
                output.playback.set_volume(id, effective);
            }
        }
        #[cfg(not(feature = "audio"))]
        let _ = master;
        Ok(())
    }

    fn set_sound_pitch(&mut self, id: SoundId, pitch: f32) -> ResourceResult<()> {
        if pitch.is_nan() || pitch <= 0.0 {
            return Err(ResourceError::Unsupported(format!("pitch {pitch}")));
        }
        self.sound_mut(id)?.pitch = pitch;
        #[cfg(feature = "audio")]
        if let Some(output) = self.audio.as_ref() {
            output.playback.set_pitch(id, pitch);
        }
        Ok(())
    }

    fn is_sound_playing(&self, id: SoundId) -> bool {
        match self.audio.as_ref() {
            None => false,
            #[cfg(feature = "audio")]
            Some(output) => output.playback.is_playing(id),
            #[cfg(not(feature = "audio"))]
            Some(_) => self.sounds.get(id).is_some_and(|sound| sound.state == PlayState::Playing),
        }
    }

    fn unload_sound(&mut self, id: SoundId) {
        if self.sounds.remove(id).is_some() {
            #[cfg(feature = "audio")]
            if let Some(output) = self.audio.as_mut() {
                output.playback.stop(id);
            }
            self.stats.sounds.on_release();
            log::info!("SOUND: [{id:?}] unloaded");
        }
    }

    fn open_display(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
        flags: WindowFlags,
    ) -> ContextResult<()> {
        if self.display.is_open() {
            return Err(ContextError::AlreadyOpen("Display"));
        }
        if width == 0 || height == 0 {
            return Err(ContextError::InvalidSize { width, height });
        }
        self.display.open(width, height, title, flags)?;
        log::info!("DISPLAY: opened {width}x{height} \"{title}\"");
        Ok(())
    }

    fn close_display(&mut self) {
        if self.display.is_open() {
            self.frame_open = false;
            self.display.close();
            log::info!("DISPLAY: closed");
        }
    }

    fn is_display_open(&self) -> bool {
        self.display.is_open()
    }

    fn display_should_close(&self) -> bool {
        self.display.should_close()
    }

    fn set_display_should_close(&mut self, should_close: bool) {
        self.display.set_should_close(should_close);
    }

    fn poll_events(&mut self) {
        self.display.poll_events();
        #[cfg(feature = "audio")]
        if let Some(output) = self.audio.as_mut() {
            output.playback.update();
        }
    }

    fn display_size(&self) -> (u32, u32) {
        self.display.size()
    }

    fn display_title(&self) -> String {
        self.display.title()
    }

    fn set_display_title(&mut self, title: &str) {
        self.display.set_title(title);
    }

    fn begin_frame(&mut self) -> ResourceResult<()> {
        self.require_display()?;
        if self.frame_open {
            return Err(ResourceError::FrameState("frame already in progress"));
        }
        self.frame_open = true;
        Ok(())
    }

    fn clear_background(&mut self, _color: Color) -> ResourceResult<()> {
        self.require_frame()
    }

    fn draw_texture(
        &mut self,
        id: TextureId,
        _x: i32,
        _y: i32,
        _tint: Color,
    ) -> ResourceResult<()> {
        self.require_frame()?;
        if !self.textures.contains_key(id) {
            return Err(ResourceError::StaleHandle("Texture"));
        }
        self.stats.draw_calls += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> ResourceResult<()> {
        self.require_frame()?;
        self.frame_open = false;
        self.display.present();
        self.stats.frames += 1;
        Ok(())
    }

    fn open_audio_device(&mut self, config: &AudioConfig) -> ContextResult<()> {
        if self.audio.is_some() {
            return Err(ContextError::AlreadyOpen("Audio device"));
        }
        config
            .validate()
            .map_err(|e| ContextError::CreationFailed(e.to_string()))?;

        let output = AudioOutput {
            #[cfg(feature = "audio")]
            playback: super::playback::PlaybackDevice::open()
                .map_err(ContextError::CreationFailed)?,
        };
        self.audio = Some(output);
        self.master_volume = config.master_volume;
        log::info!(
            "AUDIO: device opened ({} Hz, {} ch, buffer {})",
            config.sample_rate,
            config.channels,
            config.buffer_size
        );
        Ok(())
    }

    fn close_audio_device(&mut self) {
        if self.audio.take().is_some() {
            self.stop_all_sounds();
            log::info!("AUDIO: device closed");
        }
    }

    fn is_audio_device_open(&self) -> bool {
        self.audio.is_some()
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        #[cfg(feature = "audio")]
        if let Some(output) = self.audio.as_ref() {
            for (id, sound) in &self.sounds {
                output.playback.set_volume(id, sound.volume * self.master_volume);
            }
        }
    }

    fn master_volume(&self) -> f32 {
        self.master_volume
    }

    fn stats(&self) -> SurfaceStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn tone(frames: usize) -> PcmBuffer {
        PcmBuffer {
            samples: (0..frames * 2).map(|i| ((i as f32) * 0.01).sin() * 0.5).collect(),
            sample_rate: 22050,
            sample_size: 16,
            channels: 2,
        }
    }

    fn open_surface() -> SoftwareSurface {
        let mut surface = SoftwareSurface::new();
        surface.open_display(320, 240, "test", WindowFlags::empty()).unwrap();
        surface
    }

    #[test]
    fn test_gen_image_and_pixel() {
        let mut surface = SoftwareSurface::new();
        let id = surface.gen_image_color(4, 3, Color::RED).unwrap();
        let info = surface.image_info(id).unwrap();
        assert_eq!((info.width, info.height, info.mipmaps), (4, 3, 1));
        assert_eq!(info.format, PixelFormat::Rgba8);
        assert_eq!(surface.image_pixel(id, 3, 2), Some(Color::RED));
        assert_eq!(surface.image_pixel(id, 4, 0), None);

        assert!(matches!(
            surface.gen_image_color(0, 3, Color::RED),
            Err(LoadError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_missing_image_is_not_found() {
        let mut surface = SoftwareSurface::new();
        let err = surface.load_image(Path::new("notfound.png")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(ref p) if p == Path::new("notfound.png")));
        assert_eq!(surface.stats().images.acquired, 0);
    }

    #[test]
    fn test_crop_clamps_and_rejects_empty() {
        let mut surface = SoftwareSurface::new();
        let id = surface.gen_image_color(10, 10, Color::WHITE).unwrap();

        let info = surface.image_crop(id, Rect::new(5, 5, 20, 20)).unwrap();
        assert_eq!((info.width, info.height), (5, 5));

        let err = surface.image_crop(id, Rect::new(50, 50, 5, 5)).unwrap_err();
        assert!(matches!(err, ResourceError::InvalidRegion(_)));
        assert_eq!(surface.image_info(id).unwrap().width, 5);
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let mut surface = SoftwareSurface::new();
        let id = surface.gen_image_color(8, 2, Color::BLACK).unwrap();
        let info = surface.image_rotate(id, Rotation::Clockwise).unwrap();
        assert_eq!((info.width, info.height), (2, 8));
    }

    #[test]
    fn test_convert_changes_format() {
        let mut surface = SoftwareSurface::new();
        let id = surface.gen_image_color(2, 2, Color::WHITE).unwrap();
        let info = surface.image_convert(id, PixelFormat::Grayscale).unwrap();
        assert_eq!(info.format, PixelFormat::Grayscale);
        assert_eq!(surface.image_pixel(id, 0, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_stale_image_id() {
        let mut surface = SoftwareSurface::new();
        let id = surface.gen_image_color(2, 2, Color::WHITE).unwrap();
        surface.unload_image(id);
        surface.unload_image(id);
        assert!(matches!(
            surface.image_flip(id, FlipAxis::Vertical),
            Err(ResourceError::StaleHandle("Image"))
        ));
        assert_eq!(surface.stats().images.released, 1);
    }

    #[test]
    fn test_texture_requires_open_display() {
        let mut surface = SoftwareSurface::new();
        let image = surface.gen_image_color(4, 4, Color::WHITE).unwrap();
        assert!(matches!(surface.load_texture(image), Err(ResourceError::DisplayClosed)));

        surface.open_display(320, 240, "test", WindowFlags::empty()).unwrap();
        let texture = surface.load_texture(image).unwrap();
        surface.close_display();

        assert!(matches!(
            surface.texture_set_filter(texture, TextureFilter::Bilinear),
            Err(ResourceError::DisplayClosed)
        ));
        assert!(surface.texture_info(texture).is_some());
        surface.unload_texture(texture);
        assert_eq!(surface.stats().textures.live(), 0);
    }

    #[test]
    fn test_mipmap_chain() {
        let mut surface = open_surface();
        let image = surface.gen_image_color(256, 64, Color::WHITE).unwrap();
        let texture = surface.load_texture(image).unwrap();
        assert_eq!(surface.texture_gen_mipmaps(texture).unwrap().mipmaps, 9);
        assert_eq!(mip_chain_len(1, 1), 1);
        assert_eq!(mip_chain_len(300, 2), 9);
    }

    #[test]
    fn test_texture_update_checks_size() {
        let mut surface = open_surface();
        let image = surface.gen_image_color(4, 4, Color::WHITE).unwrap();
        let texture = surface.load_texture(image).unwrap();

        let other = surface.gen_image_color(4, 5, Color::RED).unwrap();
        assert!(matches!(
            surface.texture_update(texture, other),
            Err(ResourceError::SizeMismatch {
                expected: (4, 4),
                actual: (4, 5),
            })
        ));

        let red = surface.gen_image_color(4, 4, Color::RED).unwrap();
        surface.texture_update(texture, red).unwrap();
        let readback = surface.texture_to_image(texture).unwrap();
        assert_eq!(surface.image_pixel(readback, 1, 1), Some(Color::RED));
    }

    #[test]
    fn test_display_singleton_and_size() {
        let mut surface = SoftwareSurface::new();
        assert!(matches!(
            surface.open_display(0, 10, "zero", WindowFlags::empty()),
            Err(ContextError::InvalidSize {
                width: 0,
                height: 10,
            })
        ));
        surface.open_display(10, 10, "one", WindowFlags::empty()).unwrap();
        assert!(matches!(
            surface.open_display(10, 10, "two", WindowFlags::empty()),
            Err(ContextError::AlreadyOpen("Display"))
        ));
        assert_eq!(surface.display_title(), "one");
    }

    #[test]
    fn test_unavailable_display() {
        let mut surface = SoftwareSurface::with_display(HeadlessDisplay::unavailable());
        assert!(matches!(
            surface.open_display(10, 10, "none", WindowFlags::empty()),
            Err(ContextError::CreationFailed(_))
        ));
        assert!(!surface.is_display_open());
    }

    #[test]
    fn test_frame_state_machine() {
        let mut surface = open_surface();
        let image = surface.gen_image_color(4, 4, Color::WHITE).unwrap();
        let texture = surface.load_texture(image).unwrap();

        assert!(matches!(
            surface.clear_background(Color::BLACK),
            Err(ResourceError::FrameState(_))
        ));
        surface.begin_frame().unwrap();
        assert!(matches!(surface.begin_frame(), Err(ResourceError::FrameState(_))));
        surface.clear_background(Color::RAYWHITE).unwrap();
        surface.draw_texture(texture, 0, 0, Color::WHITE).unwrap();
        surface.end_frame().unwrap();

        let stats = surface.stats();
        assert_eq!((stats.frames, stats.draw_calls), (1, 1));
    }

    #[test]
    fn test_wave_crop_and_format() {
        let mut surface = SoftwareSurface::new();
        let id = surface.waves.insert(tone(1000));
        surface.stats.waves.on_acquire();

        assert!(matches!(surface.wave_crop(id, 10, 10), Err(ResourceError::InvalidRegion(_))));
        assert!(matches!(surface.wave_crop(id, 0, 1001), Err(ResourceError::InvalidRegion(_))));
        assert_eq!(surface.wave_crop(id, 100, 600).unwrap().frame_count, 500);

        let info = surface.wave_format(id, 22050, 8, 2).unwrap();
        assert_eq!((info.sample_rate, info.sample_size, info.channels), (22050, 8, 2));
        assert_eq!(info.frame_count, 500);

        assert!(matches!(
            surface.wave_format(id, 44100, 12, 1),
            Err(ResourceError::Unsupported(_))
        ));
        surface.unload_wave(id);
    }

    #[test]
    fn test_wave_format_to_zero_frames() {
        let mut surface = SoftwareSurface::new();
        let id = surface.waves.insert(tone(3));
        surface.stats.waves.on_acquire();

        assert!(matches!(
            surface.wave_format(id, 4000, 16, 2),
            Err(ResourceError::InvalidRegion(_))
        ));
        let info = surface.wave_info(id).unwrap();
        assert_eq!((info.frame_count, info.sample_rate), (3, 22050));
    }

    #[cfg(feature = "audio")]
    #[test]
    fn test_wave_resample_through_rodio() {
        let mut surface = SoftwareSurface::new();
        let id = surface.waves.insert(tone(1000));
        surface.stats.waves.on_acquire();

        let info = surface.wave_format(id, 44100, 8, 1).unwrap();
        assert_eq!((info.sample_rate, info.sample_size, info.channels), (44100, 8, 1));
        assert!((1995..=2000).contains(&info.frame_count));
    }

    #[test]
    fn test_unknown_audio_format() {
        let mut noise = NamedTempFile::new().unwrap();
        noise.write_all(b"definitely not audio").unwrap();

        let mut surface = SoftwareSurface::new();
        assert!(matches!(surface.load_wave(noise.path()), Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_search_path_resolution() {
        let dir = TempDir::new().unwrap();
        RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("dot.png"))
            .unwrap();

        let mut surface = SoftwareSurface::new().with_search_path(dir.path());
        let id = surface.load_image(Path::new("dot.png")).unwrap();
        assert_eq!(surface.image_pixel(id, 1, 1), Some(Color::new(1, 2, 3, 255)));
        surface.unload_image(id);
    }

    #[cfg(not(feature = "audio"))]
    #[test]
    fn test_sound_state_without_output() {
        let mut surface = SoftwareSurface::new();
        let wave = surface.waves.insert(tone(100));
        surface.stats.waves.on_acquire();
        assert!(matches!(surface.load_sound(wave), Err(ResourceError::AudioDeviceClosed)));

        surface.open_audio_device(&AudioConfig::default()).unwrap();
        let sound = surface.load_sound(wave).unwrap();
        surface.play_sound(sound).unwrap();
        assert!(surface.is_sound_playing(sound));
        surface.pause_sound(sound).unwrap();
        assert!(!surface.is_sound_playing(sound));
        surface.resume_sound(sound).unwrap();
        assert!(surface.is_sound_playing(sound));

        surface.close_audio_device();
        assert!(!surface.is_sound_playing(sound));
        assert!(matches!(surface.play_sound(sound), Err(ResourceError::AudioDeviceClosed)));
        surface.unload_sound(sound);
        surface.unload_wave(wave);
        assert_eq!(surface.stats().live(), 0);
    }
}
