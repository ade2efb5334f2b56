//! Exclusive ownership of one native resource
//!
//! A [`Handle`] is either empty or owns exactly one raw id on one
//! [`Surface`]. Dropping it, releasing it, or acquiring something new into it
//! destroys the owned resource exactly once. It cannot be cloned; ownership
//! moves with the value, and [`Handle::take`] moves it out of a place that
//! stays alive.

use crate::error::{ResourceError, ResourceResult};
use crate::foundation::collections::{ImageId, Key, SoundId, TextureId, WaveId};
use crate::native::{NativeSurface, Surface};
use std::fmt;

/// A kind of native resource a [`Handle`] can own
pub trait ResourceKind {
    /// Raw id the native surface hands out
    type Raw: Key;

    /// Name used in errors and log lines
    const NAME: &'static str;

    /// Destroy `raw` on the native surface
    fn release(native: &mut dyn NativeSurface, raw: Self::Raw);
}

/// CPU-side pixel buffer
#[derive(Debug)]
pub enum ImageKind {}

/// GPU texture
#[derive(Debug)]
pub enum TextureKind {}

/// Decoded sample buffer
#[derive(Debug)]
pub enum WaveKind {}

/// Sample buffer living on the audio device
#[derive(Debug)]
pub enum SoundKind {}

impl ResourceKind for ImageKind {
    type Raw = ImageId;
    const NAME: &'static str = "Image";

    fn release(native: &mut dyn NativeSurface, raw: ImageId) {
        native.unload_image(raw);
    }
}

impl ResourceKind for TextureKind {
    type Raw = TextureId;
    const NAME: &'static str = "Texture";

    fn release(native: &mut dyn NativeSurface, raw: TextureId) {
        native.unload_texture(raw);
    }
}

impl ResourceKind for WaveKind {
    type Raw = WaveId;
    const NAME: &'static str = "Wave";

    fn release(native: &mut dyn NativeSurface, raw: WaveId) {
        native.unload_wave(raw);
    }
}

impl ResourceKind for SoundKind {
    type Raw = SoundId;
    const NAME: &'static str = "Sound";

    fn release(native: &mut dyn NativeSurface, raw: SoundId) {
        native.unload_sound(raw);
    }
}

/// Owner of at most one native resource of kind `K`
pub struct Handle<K: ResourceKind> {
    slot: Option<(Surface, K::Raw)>,
}

impl<K: ResourceKind> Handle<K> {
    /// Handle owning nothing
    pub const fn empty() -> Self {
        Self { slot: None }
    }

    /// Adopt a raw id the caller already owns
    pub(crate) fn from_raw(surface: &Surface, raw: K::Raw) -> Self {
        Self {
            slot: Some((surface.clone(), raw)),
        }
    }

    /// Release the current resource, then create a new one with `create`
    ///
    /// On failure the handle is left empty.
    pub fn acquire<E>(
        &mut self,
        surface: &Surface,
        create: impl FnOnce(&mut dyn NativeSurface) -> Result<K::Raw, E>,
    ) -> Result<K::Raw, E> {
        self.release();
        let raw = create(&mut *surface.native())?;
        self.slot = Some((surface.clone(), raw));
        Ok(raw)
    }

    /// Whether a resource is owned
    pub const fn is_ready(&self) -> bool {
        self.slot.is_some()
    }

    /// Raw id of the owned resource
    pub fn raw(&self) -> Option<K::Raw> {
        self.slot.as_ref().map(|(_, raw)| *raw)
    }

    /// Surface the owned resource lives on
    pub fn surface(&self) -> Option<&Surface> {
        self.slot.as_ref().map(|(surface, _)| surface)
    }

    /// Whether the owned resource lives on `surface`
    pub fn belongs_to(&self, surface: &Surface) -> bool {
        self.surface().is_some_and(|own| own.same_as(surface))
    }

    /// Destroy the owned resource; no-op when empty
    pub fn release(&mut self) {
        let Some((surface, raw)) = self.slot.take() else {
            return;
        };
        let native = surface.try_native();
        match native {
            Some(mut native) => K::release(&mut *native, raw),
            None => log::warn!(
                "{}: [{raw:?}] released while the surface is borrowed, leaking",
                K::NAME
            ),
        }
    }

    /// Move the owned resource out, leaving this handle empty
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Run `f` against the native surface and the owned id
    ///
    /// Fails with [`ResourceError::NotReady`] when empty.
    pub fn with_native<T>(
        &self,
        f: impl FnOnce(&mut dyn NativeSurface, K::Raw) -> ResourceResult<T>,
    ) -> ResourceResult<T> {
        let (surface, raw) = self.slot.as_ref().ok_or(ResourceError::NotReady(K::NAME))?;
        let mut native = surface.native();
        f(&mut *native, *raw)
    }

    /// Read-only query against the owned id; `None` when empty
    pub fn query<T>(&self, f: impl FnOnce(&dyn NativeSurface, K::Raw) -> Option<T>) -> Option<T> {
        let (surface, raw) = self.slot.as_ref()?;
        let native = surface.native_ref();
        f(&*native, *raw)
    }
}

impl<K: ResourceKind> Default for Handle<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: ResourceKind> Drop for Handle<K> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<K: ResourceKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &K::NAME)
            .field("raw", &self.raw())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::native::Color;

    fn acquire_image(handle: &mut Handle<ImageKind>, surface: &Surface) -> ImageId {
        handle
            .acquire(surface, |native| native.gen_image_color(2, 2, Color::WHITE))
            .unwrap()
    }

    #[test]
    fn test_empty_handle() {
        let handle = Handle::<ImageKind>::default();
        assert!(!handle.is_ready());
        assert!(handle.raw().is_none());
        let result = handle.with_native(|native, id| Ok(native.image_info(id)));
        assert!(matches!(result, Err(ResourceError::NotReady("Image"))));
    }

    #[test]
    fn test_release_is_idempotent() {
        let surface = Surface::software();
        let mut handle = Handle::<ImageKind>::empty();
        acquire_image(&mut handle, &surface);
        assert!(handle.is_ready());

        handle.release();
        handle.release();
        assert!(!handle.is_ready());
        assert_eq!(surface.stats().images.released, 1);
    }

    #[test]
    fn test_acquire_releases_previous() {
        let surface = Surface::software();
        let mut handle = Handle::<ImageKind>::empty();
        let first = acquire_image(&mut handle, &surface);
        let second = acquire_image(&mut handle, &surface);
        assert_ne!(first, second);

        let stats = surface.stats();
        assert_eq!((stats.images.acquired, stats.images.released), (2, 1));
        assert!(surface.native_ref().image_info(first).is_none());
    }

    #[test]
    fn test_failed_acquire_leaves_empty() {
        let surface = Surface::software();
        let mut handle = Handle::<ImageKind>::empty();
        acquire_image(&mut handle, &surface);

        let result = handle.acquire(&surface, |native| native.gen_image_color(0, 0, Color::WHITE));
        assert!(matches!(result, Err(LoadError::InvalidParameters(_))));
        assert!(!handle.is_ready());
        assert_eq!(surface.stats().live(), 0);
    }

    #[test]
    fn test_take_transfers_ownership() {
        let surface = Surface::software();
        let mut source = Handle::<ImageKind>::empty();
        let raw = acquire_image(&mut source, &surface);

        let dest = source.take();
        assert!(!source.is_ready());
        assert_eq!(dest.raw(), Some(raw));
        assert!(dest.belongs_to(&surface));

        drop(source);
        assert_eq!(surface.stats().images.live(), 1);
        drop(dest);
        assert_eq!(surface.stats().images.live(), 0);
    }

    #[test]
    fn test_release_while_borrowed_leaks() {
        let surface = Surface::software();
        let mut handle = Handle::<ImageKind>::empty();
        acquire_image(&mut handle, &surface);

        let guard = surface.native_ref();
        handle.release();
        drop(guard);

        assert!(!handle.is_ready());
        assert_eq!(surface.stats().images.live(), 1);
    }

    #[test]
    fn test_drop_outlives_last_surface_clone() {
        let mut handle = Handle::<ImageKind>::empty();
        {
            let surface = Surface::software();
            acquire_image(&mut handle, &surface);
        }
        assert!(handle.is_ready());
        drop(handle);
    }
}
