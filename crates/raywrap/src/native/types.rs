//! Plain data exchanged with the native surface

use serde::{Deserialize, Serialize};

/// RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque black
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Fully transparent black
    pub const BLANK: Self = Self::new(0, 0, 0, 0);
    /// Opaque red
    pub const RED: Self = Self::new(230, 41, 55, 255);
    /// Light gray used as the default clear color
    pub const RAYWHITE: Self = Self::new(245, 245, 245, 255);

    /// Create a color from its channels
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as an array
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

/// Axis-aligned pixel rectangle; may extend past an image and gets clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect with `[0, bound_w) x [0, bound_h)`
    ///
    /// Returns `(x, y, w, h)` in unsigned pixels, or `None` when nothing
    /// of the rectangle lies inside the bounds.
    pub fn clamp_to(self, bound_w: u32, bound_h: u32) -> Option<(u32, u32, u32, u32)> {
        let left = i64::from(self.x).max(0);
        let top = i64::from(self.y).max(0);
        let right = (i64::from(self.x) + i64::from(self.width)).min(i64::from(bound_w));
        let bottom = (i64::from(self.y) + i64::from(self.height)).min(i64::from(bound_h));

        if right <= left || bottom <= top {
            return None;
        }
        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// Pixel layout of a CPU-side image or GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit luminance
    Grayscale,
    /// 8-bit luminance + 8-bit alpha
    GrayAlpha,
    /// 8 bits per channel RGB
    Rgb8,
    /// 8 bits per channel RGBA
    #[default]
    Rgba8,
}

/// Resampling used when resizing an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    /// Nearest neighbour
    Nearest,
    /// Bilinear
    #[default]
    Bilinear,
}

/// Axis to mirror an image across
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// Top and bottom swap
    Vertical,
    /// Left and right swap
    Horizontal,
}

/// Quarter-turn rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// 90 degrees clockwise
    Clockwise,
    /// 90 degrees counter-clockwise
    CounterClockwise,
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureFilter {
    /// No filtering, pixel-perfect
    #[default]
    Point,
    /// Linear filtering
    Bilinear,
    /// Trilinear filtering across mipmaps
    Trilinear,
}

/// Texture wrap mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureWrap {
    /// Repeat the texture
    #[default]
    Repeat,
    /// Clamp to edge
    Clamp,
    /// Mirror the texture
    MirrorRepeat,
}

/// Native description of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Mipmap levels (1 for plain images)
    pub mipmaps: u32,
    /// Pixel layout
    pub format: PixelFormat,
}

/// Native description of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Mipmap levels
    pub mipmaps: u32,
    /// Pixel layout
    pub format: PixelFormat,
    /// Sampling filter
    pub filter: TextureFilter,
    /// Wrap mode
    pub wrap: TextureWrap,
}

/// Native description of a sample buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaveInfo {
    /// Frames (one sample per channel)
    pub frame_count: u32,
    /// Frames per second
    pub sample_rate: u32,
    /// Bits per stored sample: 8, 16, 24 or 32
    pub sample_size: u16,
    /// Interleaved channels
    pub channels: u16,
}

impl WaveInfo {
    /// Playback length in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f32 / self.sample_rate as f32
    }
}

/// Acquire/release tally for one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounter {
    /// Successful acquisitions
    pub acquired: u64,
    /// Releases of live resources
    pub released: u64,
}

impl ResourceCounter {
    /// Resources currently alive
    pub const fn live(&self) -> u64 {
        self.acquired - self.released
    }

    pub(crate) fn on_acquire(&mut self) {
        self.acquired += 1;
    }

    pub(crate) fn on_release(&mut self) {
        self.released += 1;
    }
}

/// Bookkeeping a native surface exposes for leak checks and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceStats {
    /// CPU images
    pub images: ResourceCounter,
    /// GPU textures
    pub textures: ResourceCounter,
    /// Sample buffers
    pub waves: ResourceCounter,
    /// Device sounds
    pub sounds: ResourceCounter,
    /// Completed frames
    pub frames: u64,
    /// Draw calls issued inside frames
    pub draw_calls: u64,
}

impl SurfaceStats {
    /// Total live resources across all kinds
    pub const fn live(&self) -> u64 {
        self.images.live() + self.textures.live() + self.waves.live() + self.sounds.live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_clamp_inside() {
        let rect = Rect::new(100, 100, 100, 100);
        assert_eq!(rect.clamp_to(256, 256), Some((100, 100, 100, 100)));
    }

    #[test]
    fn test_rect_clamp_partial() {
        let rect = Rect::new(-10, 200, 50, 100);
        assert_eq!(rect.clamp_to(256, 256), Some((0, 200, 40, 56)));
    }

    #[test]
    fn test_rect_clamp_outside() {
        assert_eq!(Rect::new(300, 0, 10, 10).clamp_to(256, 256), None);
        assert_eq!(Rect::new(0, 0, 0, 10).clamp_to(256, 256), None);
        assert_eq!(Rect::new(0, 0, -5, 10).clamp_to(256, 256), None);
    }

    #[test]
    fn test_counter_live() {
        let mut counter = ResourceCounter::default();
        counter.on_acquire();
        counter.on_acquire();
        counter.on_release();
        assert_eq!(counter.live(), 1);
    }

    #[test]
    fn test_wave_duration() {
        let info = WaveInfo {
            frame_count: 22050,
            sample_rate: 44100,
            sample_size: 16,
            channels: 2,
        };
        assert!((info.duration_secs() - 0.5).abs() < f32::EPSILON);
        assert!(WaveInfo::default().duration_secs().abs() < f32::EPSILON);
    }
}
