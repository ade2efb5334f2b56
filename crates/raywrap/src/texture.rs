//! GPU texture wrapper
//!
//! Textures are created against an open [`Window`]; every operation except
//! the metadata queries and release needs the display to still be open.

use crate::error::{ResourceError, ResourceResult};
use crate::handle::{Handle, TextureKind};
use crate::image::Image;
use crate::native::{
    NativeSurface, PixelFormat, TextureFilter, TextureId, TextureInfo, TextureWrap,
};
use crate::window::Window;
use std::path::Path;

/// Owned GPU texture
#[derive(Debug, Default)]
pub struct Texture {
    handle: Handle<TextureKind>,
    info: TextureInfo,
}

impl Texture {
    /// Upload a copy of `image`; the image is left untouched
    pub fn from_image(window: &Window, image: &Image) -> ResourceResult<Self> {
        let mut texture = Self::default();
        texture.upload(window, image)?;
        Ok(texture)
    }

    /// Load an image file and upload it, discarding the CPU copy
    pub fn load(window: &Window, path: impl AsRef<Path>) -> ResourceResult<Self> {
        if !window.is_ready() {
            return Err(ResourceError::DisplayClosed);
        }
        let image = Image::load(window.surface(), path)?;
        Self::from_image(window, &image)
    }

    /// Replace the owned texture with a fresh upload of `image`
    ///
    /// A closed `window` is rejected before the current texture is touched.
    pub fn reload(&mut self, window: &Window, image: &Image) -> ResourceResult<&mut Self> {
        self.upload(window, image)?;
        Ok(self)
    }

    fn upload(&mut self, window: &Window, image: &Image) -> ResourceResult<()> {
        if !window.is_ready() {
            return Err(ResourceError::DisplayClosed);
        }
        let surface = window.surface();
        let source = image.handle().raw().ok_or(ResourceError::NotReady("Image"))?;
        if !image.handle().belongs_to(surface) {
            return Err(ResourceError::ForeignSurface);
        }
        self.info = TextureInfo::default();
        let raw = self.handle.acquire(surface, |native| native.load_texture(source))?;
        self.info = surface.native_ref().texture_info(raw).unwrap_or_default();
        Ok(())
    }

    fn apply(
        &mut self,
        op: impl FnOnce(&mut dyn NativeSurface, TextureId) -> ResourceResult<TextureInfo>,
    ) -> ResourceResult<&mut Self> {
        self.info = self.handle.with_native(op)?;
        Ok(self)
    }

    /// Whether a texture is owned
    pub const fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.info.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.info.height
    }

    /// `(width, height)`
    pub const fn size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    /// Mipmap levels
    pub const fn mipmaps(&self) -> u32 {
        self.info.mipmaps
    }

    /// Pixel layout
    pub const fn format(&self) -> PixelFormat {
        self.info.format
    }

    /// Sampling filter
    pub const fn filter(&self) -> TextureFilter {
        self.info.filter
    }

    /// Wrap mode
    pub const fn wrap(&self) -> TextureWrap {
        self.info.wrap
    }

    /// Cached native description
    pub const fn info(&self) -> TextureInfo {
        self.info
    }

    /// Change the sampling filter
    pub fn set_filter(&mut self, filter: TextureFilter) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.texture_set_filter(id, filter))
    }

    /// Change the wrap mode
    pub fn set_wrap(&mut self, wrap: TextureWrap) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.texture_set_wrap(id, wrap))
    }

    /// Generate the full mipmap chain
    pub fn gen_mipmaps(&mut self) -> ResourceResult<&mut Self> {
        self.apply(|native, id| native.texture_gen_mipmaps(id))
    }

    /// Replace the texels with `image`, which must have the same size
    pub fn update(&mut self, image: &Image) -> ResourceResult<&mut Self> {
        let source = image.handle().raw().ok_or(ResourceError::NotReady("Image"))?;
        if let Some(surface) = self.handle.surface() {
            if !image.handle().belongs_to(surface) {
                return Err(ResourceError::ForeignSurface);
            }
        }
        self.apply(|native, id| native.texture_update(id, source))
    }

    /// Read the texels back into a new image
    pub fn to_image(&self) -> ResourceResult<Image> {
        let raw = self.handle.with_native(|native, id| native.texture_to_image(id))?;
        let surface = self.handle.surface().ok_or(ResourceError::NotReady("Texture"))?;
        Ok(Image::from_raw(surface, raw))
    }

    /// Release the owned texture
    pub fn unload(&mut self) {
        self.handle.release();
        self.info = TextureInfo::default();
    }

    /// Move the texture out, leaving this wrapper empty
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub(crate) const fn handle(&self) -> &Handle<TextureKind> {
        &self.handle
    }
}
