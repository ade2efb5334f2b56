//! Display backends for the native surface
//!
//! The native surface delegates window-system work to a [`DisplayBackend`].
//! Two implementations exist:
//!
//! - [`HeadlessDisplay`]: in-process, no platform window. Close requests are
//!   simulated with `set_should_close`, and [`HeadlessDisplay::unavailable`]
//!   models a machine without a display surface.
//! - `GlfwDisplay` (feature `glfw`): a real desktop window.

use crate::error::{ContextError, ContextResult};
use bitflags::bitflags;

bitflags! {
    /// Creation hints for the display window
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        /// Window can be resized by the user
        const RESIZABLE = 1 << 0;
        /// Start in fullscreen mode
        const FULLSCREEN = 1 << 1;
        /// Synchronize presentation with the monitor refresh
        const VSYNC = 1 << 2;
        /// Create the window hidden
        const HIDDEN = 1 << 3;
    }
}

/// Window-system contract used by the native surface
///
/// Only one window is open per backend at a time. `open` on an open backend
/// is a caller error that the surface rejects before reaching the backend.
pub trait DisplayBackend {
    /// Create the platform window
    fn open(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
        flags: WindowFlags,
    ) -> ContextResult<()>;

    /// Destroy the platform window; no-op when closed
    fn close(&mut self);

    /// Whether a window currently exists
    fn is_open(&self) -> bool;

    /// Whether the user or OS asked the window to close
    fn should_close(&self) -> bool;

    /// Raise or clear the close request
    fn set_should_close(&mut self, should_close: bool);

    /// Pump pending window-system events
    fn poll_events(&mut self);

    /// Client area size in pixels
    fn size(&self) -> (u32, u32);

    /// Current title
    fn title(&self) -> String;

    /// Change the title
    fn set_title(&mut self, title: &str);

    /// Present the finished frame
    fn present(&mut self);
}

#[derive(Debug, Clone)]
struct HeadlessWindow {
    width: u32,
    height: u32,
    title: String,
    flags: WindowFlags,
    should_close: bool,
}

/// Display backend without a platform window
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    available: bool,
    window: Option<HeadlessWindow>,
    presented: u64,
}

impl HeadlessDisplay {
    /// A headless display that accepts windows
    pub const fn new() -> Self {
        Self {
            available: true,
            window: None,
            presented: 0,
        }
    }

    /// A headless display that refuses to create windows
    pub const fn unavailable() -> Self {
        Self {
            available: false,
            window: None,
            presented: 0,
        }
    }

    /// Creation hints of the open window
    pub fn flags(&self) -> Option<WindowFlags> {
        self.window.as_ref().map(|w| w.flags)
    }

    /// Frames presented since creation
    pub const fn presented(&self) -> u64 {
        self.presented
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBackend for HeadlessDisplay {
    fn open(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
        flags: WindowFlags,
    ) -> ContextResult<()> {
        if !self.available {
            return Err(ContextError::CreationFailed("no display surface available".to_string()));
        }
        self.window = Some(HeadlessWindow {
            width,
            height,
            title: title.to_string(),
            flags,
            should_close: false,
        });
        Ok(())
    }

    fn close(&mut self) {
        self.window = None;
    }

    fn is_open(&self) -> bool {
        self.window.is_some()
    }

    fn should_close(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.should_close)
    }

    fn set_should_close(&mut self, should_close: bool) {
        if let Some(window) = self.window.as_mut() {
            window.should_close = should_close;
        }
    }

    fn poll_events(&mut self) {}

    fn size(&self) -> (u32, u32) {
        self.window.as_ref().map_or((0, 0), |w| (w.width, w.height))
    }

    fn title(&self) -> String {
        self.window.as_ref().map(|w| w.title.clone()).unwrap_or_default()
    }

    fn set_title(&mut self, title: &str) {
        if let Some(window) = self.window.as_mut() {
            window.title = title.to_string();
        }
    }

    fn present(&mut self) {
        if self.window.is_some() {
            self.presented += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_open_close() {
        let mut display = HeadlessDisplay::new();
        assert!(!display.is_open());

        display.open(800, 450, "headless", WindowFlags::VSYNC).unwrap();
        assert!(display.is_open());
        assert_eq!(display.size(), (800, 450));
        assert_eq!(display.title(), "headless");
        assert_eq!(display.flags(), Some(WindowFlags::VSYNC));

        display.close();
        assert!(!display.is_open());
        assert_eq!(display.size(), (0, 0));
    }

    #[test]
    fn test_unavailable_display_refuses() {
        let mut display = HeadlessDisplay::unavailable();
        let result = display.open(800, 450, "nope", WindowFlags::empty());
        assert!(matches!(result, Err(ContextError::CreationFailed(_))));
        assert!(!display.is_open());
    }

    #[test]
    fn test_close_request_is_per_window() {
        let mut display = HeadlessDisplay::new();
        display.open(10, 10, "a", WindowFlags::empty()).unwrap();
        display.set_should_close(true);
        assert!(display.should_close());

        display.close();
        display.open(10, 10, "b", WindowFlags::empty()).unwrap();
        assert!(!display.should_close());
    }

    #[test]
    fn test_present_counts_only_open_frames() {
        let mut display = HeadlessDisplay::new();
        display.present();
        display.open(10, 10, "a", WindowFlags::empty()).unwrap();
        display.present();
        assert_eq!(display.presented(), 1);
    }
}
