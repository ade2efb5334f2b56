//! Window context and frame scope
//!
//! A [`Window`] is closed until [`Window::init`] succeeds and closes itself
//! when dropped. Drawing happens through a [`Canvas`], which exists only
//! while a frame is in progress.

use crate::config::WindowConfig;
use crate::error::{ContextError, ContextResult, ResourceError, ResourceResult};
use crate::native::{Color, Surface, WindowFlags};
use crate::texture::Texture;

/// Display window owned by the application
#[derive(Debug)]
pub struct Window {
    surface: Surface,
    open: bool,
}

impl Window {
    /// Closed window on `surface`
    pub fn new(surface: &Surface) -> Self {
        Self {
            surface: surface.clone(),
            open: false,
        }
    }

    /// Open a `width` x `height` window titled `title`
    pub fn init(&mut self, width: u32, height: u32, title: &str) -> ContextResult<&mut Self> {
        self.open_with(width, height, title, WindowConfig::default().flags())
    }

    /// Open a window described by `config`
    pub fn init_with(&mut self, config: &WindowConfig) -> ContextResult<&mut Self> {
        self.open_with(config.width, config.height, &config.title, config.flags())
    }

    fn open_with(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
        flags: WindowFlags,
    ) -> ContextResult<&mut Self> {
        if self.open {
            return Err(ContextError::AlreadyOpen("Window"));
        }
        self.surface.native().open_display(width, height, title, flags)?;
        self.open = true;
        Ok(self)
    }

    /// Whether this window is open
    pub fn is_ready(&self) -> bool {
        self.open && self.surface.is_display_open()
    }

    fn require_open(&self) -> ContextResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(ContextError::NotOpen("Window"))
        }
    }

    /// Pump events, then report whether a close was requested
    pub fn should_close(&mut self) -> ContextResult<bool> {
        self.require_open()?;
        let mut native = self.surface.native();
        native.poll_events();
        Ok(native.display_should_close())
    }

    /// Raise or clear the close request
    pub fn set_should_close(&mut self, should_close: bool) -> ContextResult<&mut Self> {
        self.require_open()?;
        self.surface.native().set_display_should_close(should_close);
        Ok(self)
    }

    /// Client area size, `None` while closed
    pub fn size(&self) -> Option<(u32, u32)> {
        self.open.then(|| self.surface.native_ref().display_size())
    }

    /// Title, `None` while closed
    pub fn title(&self) -> Option<String> {
        self.open.then(|| self.surface.native_ref().display_title())
    }

    /// Change the title
    pub fn set_title(&mut self, title: &str) -> ContextResult<&mut Self> {
        self.require_open()?;
        self.surface.native().set_display_title(title);
        Ok(self)
    }

    /// Surface this window lives on
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Start a frame
    ///
    /// The frame ends when the returned [`Canvas`] is dropped or
    /// [`Canvas::end`] is called.
    pub fn begin_drawing(&mut self) -> ResourceResult<Canvas<'_>> {
        if !self.is_ready() {
            return Err(ResourceError::DisplayClosed);
        }
        self.surface.native().begin_frame()?;
        Ok(Canvas {
            window: self,
            ended: false,
        })
    }

    /// Close the window; no-op when already closed
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        match self.surface.try_native() {
            Some(mut native) => native.close_display(),
            None => log::warn!("Window closed while the surface is borrowed, display left open"),
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.close();
    }
}

/// Frame in progress on a [`Window`]
#[derive(Debug)]
pub struct Canvas<'a> {
    window: &'a mut Window,
    ended: bool,
}

impl Canvas<'_> {
    /// Fill the frame with `color`
    pub fn clear_background(&mut self, color: Color) -> ResourceResult<&mut Self> {
        self.window.surface.native().clear_background(color)?;
        Ok(self)
    }

    /// Draw `texture` with its top-left corner at `(x, y)`
    pub fn draw_texture(
        &mut self,
        texture: &Texture,
        x: i32,
        y: i32,
        tint: Color,
    ) -> ResourceResult<&mut Self> {
        let raw = texture.handle().raw().ok_or(ResourceError::NotReady("Texture"))?;
        if !texture.handle().belongs_to(&self.window.surface) {
            return Err(ResourceError::ForeignSurface);
        }
        self.window.surface.native().draw_texture(raw, x, y, tint)?;
        Ok(self)
    }

    /// Finish and present the frame
    pub fn end(mut self) -> ResourceResult<()> {
        self.ended = true;
        let result = self.window.surface.native().end_frame();
        result
    }
}

impl Drop for Canvas<'_> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Some(mut native) = self.window.surface.try_native() {
            if let Err(e) = native.end_frame() {
                log::warn!("Failed to end frame: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use crate::native::{HeadlessDisplay, SoftwareSurface};

    #[test]
    fn test_open_and_close() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        assert!(!window.is_ready());
        assert!(window.size().is_none());

        window.init(800, 450, "raywrap window").unwrap();
        assert!(window.is_ready());
        assert_eq!(window.size(), Some((800, 450)));
        assert_eq!(window.title().as_deref(), Some("raywrap window"));

        window.close();
        window.close();
        assert!(!window.is_ready());
        assert!(!surface.is_display_open());
    }

    #[test]
    fn test_reopen_after_close() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        window.init(100, 100, "first").unwrap();
        window.close();
        window.init(200, 100, "second").unwrap();
        assert_eq!(window.size(), Some((200, 100)));
    }

    #[test]
    fn test_double_init_rejected() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        window.init(100, 100, "one").unwrap();
        assert!(matches!(window.init(100, 100, "two"), Err(ContextError::AlreadyOpen("Window"))));

        let mut second = Window::new(&surface);
        assert!(matches!(
            second.init(100, 100, "three"),
            Err(ContextError::AlreadyOpen("Display"))
        ));
        drop(second);
        assert!(window.is_ready());
    }

    #[test]
    fn test_zero_size_and_creation_failure() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        assert!(matches!(window.init(0, 100, "zero"), Err(ContextError::InvalidSize { .. })));
        assert!(!window.is_ready());

        let headless = Surface::new(SoftwareSurface::with_display(HeadlessDisplay::unavailable()));
        let mut window = Window::new(&headless);
        assert!(matches!(window.init(10, 10, "none"), Err(ContextError::CreationFailed(_))));
        assert!(!window.is_ready());
    }

    #[test]
    fn test_should_close_requires_open() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        assert!(matches!(window.should_close(), Err(ContextError::NotOpen("Window"))));

        window.init(10, 10, "close me").unwrap();
        assert!(!window.should_close().unwrap());
        window.set_should_close(true).unwrap();
        assert!(window.should_close().unwrap());
    }

    #[test]
    fn test_init_with_config() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        let config = WindowConfig::new(640, 360, "configured").with_resizable(true);
        window.init_with(&config).unwrap().set_title("renamed").unwrap();
        assert_eq!(window.size(), Some((640, 360)));
        assert_eq!(window.title().as_deref(), Some("renamed"));
    }

    #[test]
    fn test_canvas_frame() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        window.init(64, 64, "frames").unwrap();
        let image = Image::from_color(&surface, 8, 8, Color::WHITE).unwrap();
        let texture = Texture::from_image(&window, &image).unwrap();

        {
            let mut canvas = window.begin_drawing().unwrap();
            canvas
                .clear_background(Color::RAYWHITE)
                .unwrap()
                .draw_texture(&texture, 10, 10, Color::WHITE)
                .unwrap();
        }
        let canvas = window.begin_drawing().unwrap();
        canvas.end().unwrap();

        let stats = surface.stats();
        assert_eq!((stats.frames, stats.draw_calls), (2, 1));
    }

    #[test]
    fn test_canvas_rejects_empty_texture() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        window.init(64, 64, "frames").unwrap();
        let mut canvas = window.begin_drawing().unwrap();
        let result = canvas.draw_texture(&Texture::default(), 0, 0, Color::WHITE);
        assert!(matches!(result, Err(ResourceError::NotReady("Texture"))));
    }

    #[test]
    fn test_drawing_needs_open_window() {
        let surface = Surface::software();
        let mut window = Window::new(&surface);
        assert!(matches!(window.begin_drawing(), Err(ResourceError::DisplayClosed)));
    }

    #[test]
    fn test_drop_closes_display() {
        let surface = Surface::software();
        {
            let mut window = Window::new(&surface);
            window.init(10, 10, "scoped").unwrap();
            assert!(surface.is_display_open());
        }
        assert!(!surface.is_display_open());
    }
}
