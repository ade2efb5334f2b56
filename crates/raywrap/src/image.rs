//! CPU-side image wrapper

use crate::error::{LoadError, ResourceResult};
use crate::handle::{Handle, ImageKind};
use crate::native::{
    Color, FlipAxis, ImageId, ImageInfo, NativeSurface, PixelFormat, Rect, ResizeFilter, Rotation,
    Surface,
};
use std::path::Path;

/// Owned pixel buffer on a native surface
///
/// Mutators chain through `?` and either apply fully or leave the image
/// untouched:
///
/// ```no_run
/// use raywrap::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let surface = Surface::software();
/// let mut image = Image::load(&surface, "resources/feynman.png")?;
/// image.crop(Rect::new(100, 100, 100, 100))?.resize(50, 50)?;
/// assert_eq!(image.size(), (50, 50));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Image {
    handle: Handle<ImageKind>,
    info: ImageInfo,
}

impl Image {
    /// Decode an image file
    pub fn load(surface: &Surface, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let mut image = Self::default();
        image.reload(surface, path)?;
        Ok(image)
    }

    /// Replace the owned image with a freshly decoded one
    ///
    /// The previous image is released first; on failure the wrapper is empty.
    pub fn reload(
        &mut self,
        surface: &Surface,
        path: impl AsRef<Path>,
    ) -> Result<&mut Self, LoadError> {
        let path = path.as_ref();
        self.info = ImageInfo::default();
        let raw = self.handle.acquire(surface, |native| native.load_image(path))?;
        self.refresh(surface, raw);
        Ok(self)
    }

    /// Generate a `width` x `height` image filled with `color`
    pub fn from_color(
        surface: &Surface,
        width: u32,
        height: u32,
        color: Color,
    ) -> Result<Self, LoadError> {
        let mut image = Self::default();
        let raw = image
            .handle
            .acquire(surface, |native| native.gen_image_color(width, height, color))?;
        image.refresh(surface, raw);
        Ok(image)
    }

    pub(crate) fn from_raw(surface: &Surface, raw: ImageId) -> Self {
        let mut image = Self {
            handle: Handle::from_raw(surface, raw),
            info: ImageInfo::default(),
        };
        image.refresh(surface, raw);
        image
    }

    fn refresh(&mut self, surface: &Surface, raw: ImageId) {
        self.info = surface.native_ref().image_info(raw).unwrap_or_default();
    }

    /// Apply a native mutation and cache the resulting description
    fn apply(
        &mut self,
        op: impl FnOnce(&mut dyn NativeSurface, ImageId) -> ResourceResult<ImageInfo>,
    ) -> ResourceResult<&mut Self> {
        self.info = self.handle.with_native(op)?;
        Ok(self)
    }

    /// Whether an image is owned
    pub const fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// Width in pixels, 0 when not ready
    pub const fn width(&self) -> u32 {
        self.info.width
    }

    /// Height in pixels, 0 when not ready
    pub const fn height(&self) -> u32 {
        self.info.height
    }

    /// `(width, height)`
    pub const fn size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    /// Pixel layout
    pub const fn format(&self) -> PixelFormat {
        self.info.format
    }

    /// Mipmap levels, 0 when not ready
    pub const fn mipmaps(&self) -> u32 {
        self.info.mipmaps
    }

    /// Cached native description
    pub const fn info(&self) -> ImageInfo {
        self.info
    }

    /// Read one pixel as RGBA
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.handle.query(|native, id| native.image_pixel(id, x, y))
    }

    /// Keep only `rect`, clamped to the image bounds
    pub fn crop(&mut self, rect: Rect) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_crop(id, rect))
    }

    /// Rescale with bilinear filtering
    pub fn resize(&mut self, width: u32, height: u32) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_resize(id, width, height, ResizeFilter::Bilinear))
    }

    /// Rescale with nearest-neighbour sampling
    pub fn resize_nearest(&mut self, width: u32, height: u32) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_resize(id, width, height, ResizeFilter::Nearest))
    }

    /// Swap top and bottom
    pub fn flip_vertical(&mut self) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_flip(id, FlipAxis::Vertical))
    }

    /// Swap left and right
    pub fn flip_horizontal(&mut self) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_flip(id, FlipAxis::Horizontal))
    }

    /// Rotate 90 degrees clockwise
    pub fn rotate_cw(&mut self) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_rotate(id, Rotation::Clockwise))
    }

    /// Rotate 90 degrees counter-clockwise
    pub fn rotate_ccw(&mut self) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_rotate(id, Rotation::CounterClockwise))
    }

    /// Re-encode the pixels as `format`
    pub fn convert(&mut self, format: PixelFormat) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.image_convert(id, format))
    }

    /// Write to disk; the extension picks the encoder
    pub fn export(&self, path: impl AsRef<Path>) -> ResourceResult<()> {
        let path = path.as_ref();
        self.handle.with_native(|native, id| native.export_image(id, path))
    }

    /// Release the owned image
    pub fn unload(&mut self) {
        self.handle.release();
        self.info = ImageInfo::default();
    }

    /// Move the image out, leaving this wrapper empty
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub(crate) const fn handle(&self) -> &Handle<ImageKind> {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResourceError;
    use tempfile::TempDir;

    #[test]
    fn test_from_color_metadata() {
        let surface = Surface::software();
        let image = Image::from_color(&surface, 16, 8, Color::RED).unwrap();
        assert!(image.is_ready());
        assert_eq!(image.size(), (16, 8));
        assert_eq!(image.mipmaps(), 1);
        assert_eq!(image.format(), PixelFormat::Rgba8);
        assert_eq!(image.pixel(0, 0), Some(Color::RED));
    }

    #[test]
    fn test_not_ready_image() {
        let mut image = Image::default();
        assert!(!image.is_ready());
        assert_eq!(image.size(), (0, 0));
        assert!(image.pixel(0, 0).is_none());
        assert!(matches!(image.flip_vertical(), Err(ResourceError::NotReady("Image"))));
        assert!(matches!(image.export("never.png"), Err(ResourceError::NotReady("Image"))));
    }

    #[test]
    fn test_failed_mutation_keeps_metadata() {
        let surface = Surface::software();
        let mut image = Image::from_color(&surface, 10, 10, Color::WHITE).unwrap();
        let result = image.crop(Rect::new(20, 20, 5, 5));
        assert!(matches!(result, Err(ResourceError::InvalidRegion(_))));
        assert_eq!(image.size(), (10, 10));

        assert!(matches!(
            image.resize(0, 5),
            Err(ResourceError::InvalidDimensions {
                width: 0,
                height: 5,
            })
        ));
        assert_eq!(image.size(), (10, 10));
    }

    #[test]
    fn test_rotate_and_flip_chain() {
        let surface = Surface::software();
        let mut image = Image::from_color(&surface, 6, 3, Color::BLACK).unwrap();
        image.rotate_cw().unwrap().flip_horizontal().unwrap().resize_nearest(9, 12).unwrap();
        assert_eq!(image.size(), (9, 12));
        image.rotate_ccw().unwrap();
        assert_eq!(image.size(), (12, 9));
    }

    #[test]
    fn test_convert_updates_format() {
        let surface = Surface::software();
        let mut image = Image::from_color(&surface, 2, 2, Color::WHITE).unwrap();
        image.convert(PixelFormat::Rgb8).unwrap();
        assert_eq!(image.format(), PixelFormat::Rgb8);
    }

    #[test]
    fn test_failed_reload_empties() {
        let surface = Surface::software();
        let mut image = Image::from_color(&surface, 2, 2, Color::WHITE).unwrap();
        let result = image.reload(&surface, "does/not/exist.png");
        assert!(matches!(result, Err(LoadError::NotFound(_))));
        assert!(!image.is_ready());
        assert_eq!(image.size(), (0, 0));
        assert_eq!(surface.stats().images.live(), 0);
    }

    #[test]
    fn test_unload_resets() {
        let surface = Surface::software();
        let mut image = Image::from_color(&surface, 2, 2, Color::WHITE).unwrap();
        image.unload();
        image.unload();
        assert!(!image.is_ready());
        assert_eq!(image.info(), ImageInfo::default());
        assert_eq!(surface.stats().images.released, 1);
    }

    #[test]
    fn test_export_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.png");
        let surface = Surface::software();
        let image = Image::from_color(&surface, 5, 7, Color::RED).unwrap();
        image.export(&path).unwrap();

        let loaded = Image::load(&surface, &path).unwrap();
        assert_eq!(loaded.size(), (5, 7));
        assert_eq!(loaded.pixel(4, 6), Some(Color::RED));
    }
}
