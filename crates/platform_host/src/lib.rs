//! Typed host-environment contracts consumed by the shortcut trainer runtime.
//!
//! The trainer core never reads the wall clock or the browser window directly. Hosts inject a
//! [`Clock`] and a [`ViewportService`] so the runtime stays deterministic under test and the same
//! state machine can run in the browser or headless.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod time;
pub mod viewport;

pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};
pub use viewport::{
    BrowserViewportService, FixedViewportService, ViewportService, ViewportSize,
    MIN_VIEWPORT_HEIGHT, MIN_VIEWPORT_WIDTH,
};
