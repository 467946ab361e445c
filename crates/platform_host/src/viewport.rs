//! Viewport-size contract used to compute maximize bounds.

use serde::{Deserialize, Serialize};

/// Smallest viewport width reported to the runtime.
pub const MIN_VIEWPORT_WIDTH: i32 = 320;
/// Smallest viewport height reported to the runtime.
pub const MIN_VIEWPORT_HEIGHT: i32 = 220;

/// Size of the container windows are drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width in CSS pixels.
    pub width: i32,
    /// Height in CSS pixels.
    pub height: i32,
}

impl ViewportSize {
    /// Creates a viewport size clamped to the supported minimum.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(MIN_VIEWPORT_WIDTH),
            height: height.max(MIN_VIEWPORT_HEIGHT),
        }
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Read-only provider of the hosting view's viewport size.
pub trait ViewportService {
    /// Returns the current viewport size.
    fn viewport_size(&self) -> ViewportSize;
}

/// [`ViewportService`] that always reports the same size.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedViewportService(pub ViewportSize);

impl ViewportService for FixedViewportService {
    fn viewport_size(&self) -> ViewportSize {
        self.0
    }
}

/// [`ViewportService`] reading the browser window's inner size, minus reserved chrome.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserViewportService {
    /// Height reserved at the bottom of the window (taskbar).
    pub reserved_bottom_px: i32,
}

impl ViewportService for BrowserViewportService {
    fn viewport_size(&self) -> ViewportSize {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(window) = web_sys::window() {
                let width = window
                    .inner_width()
                    .ok()
                    .and_then(|value| value.as_f64())
                    .map(|value| value as i32)
                    .unwrap_or(1024);
                let height = window
                    .inner_height()
                    .ok()
                    .and_then(|value| value.as_f64())
                    .map(|value| value as i32)
                    .unwrap_or(768);

                return ViewportSize::new(width, height - self.reserved_bottom_px);
            }
        }

        ViewportSize::new(1024, 768 - self.reserved_bottom_px)
    }
}
