//! GLFW-backed display
//!
//! Opens a real desktop window. No client API context is created: the
//! surface only needs the window for its lifecycle and event pump.

use super::display::{DisplayBackend, WindowFlags};
use crate::error::{ContextError, ContextResult};

struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    title: String,
    // Declared last: fields drop in order, the window must go first
    glfw: glfw::Glfw,
}

/// Display backend creating a GLFW window
#[derive(Default)]
pub struct GlfwDisplay {
    inner: Option<GlfwWindow>,
}

impl GlfwDisplay {
    /// Create a closed GLFW display
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplayBackend for GlfwDisplay {
    fn open(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
        flags: WindowFlags,
    ) -> ContextResult<()> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|e| {
            ContextError::CreationFailed(format!("GLFW initialization failed: {e:?}"))
        })?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(flags.contains(WindowFlags::RESIZABLE)));
        glfw.window_hint(glfw::WindowHint::Visible(!flags.contains(WindowFlags::HIDDEN)));
        if flags.contains(WindowFlags::VSYNC) {
            log::debug!("VSYNC hint ignored: GLFW display has no client API context");
        }

        let created = if flags.contains(WindowFlags::FULLSCREEN) {
            glfw.with_primary_monitor(|glfw, monitor| {
                let mode = monitor.map_or(glfw::WindowMode::Windowed, glfw::WindowMode::FullScreen);
                glfw.create_window(width, height, title, mode)
            })
        } else {
            glfw.create_window(width, height, title, glfw::WindowMode::Windowed)
        };
        let (mut window, events) = created.ok_or_else(|| {
            ContextError::CreationFailed("GLFW window creation failed".to_string())
        })?;

        window.set_close_polling(true);
        window.set_size_polling(true);

        self.inner = Some(GlfwWindow {
            window,
            events,
            title: title.to_string(),
            glfw,
        });
        Ok(())
    }

    fn close(&mut self) {
        self.inner = None;
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn should_close(&self) -> bool {
        self.inner.as_ref().is_some_and(|w| w.window.should_close())
    }

    fn set_should_close(&mut self, should_close: bool) {
        if let Some(inner) = self.inner.as_mut() {
            inner.window.set_should_close(should_close);
        }
    }

    fn poll_events(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.glfw.poll_events();
            for (_, event) in glfw::flush_messages(&inner.events) {
                if let glfw::WindowEvent::Size(w, h) = event {
                    log::debug!("DISPLAY: resized to {w}x{h}");
                }
            }
        }
    }

    fn size(&self) -> (u32, u32) {
        self.inner.as_ref().map_or((0, 0), |w| {
            let (width, height) = w.window.get_size();
            (width.max(0) as u32, height.max(0) as u32)
        })
    }

    fn title(&self) -> String {
        // GLFW offers no title getter; the last title set is tracked here
        self.inner.as_ref().map(|w| w.title.clone()).unwrap_or_default()
    }

    fn set_title(&mut self, title: &str) {
        if let Some(inner) = self.inner.as_mut() {
            inner.window.set_title(title);
            inner.title = title.to_string();
        }
    }

    fn present(&mut self) {}
}
