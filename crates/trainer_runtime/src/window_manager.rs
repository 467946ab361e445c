//! Window-manager state and transitions for the practice desktop.
//!
//! Windows are kept in creation order (which drives taskbar order and focus cycling); stacking is
//! carried separately by a monotonically increasing `z_index`. Every mutating operation leaves the
//! stack normalized: at most one window is focused, it is never minimized, and it holds the highest
//! `z_index` among non-minimized windows. Unknown window ids are no-ops throughout.

use platform_host::ViewportSize;

use crate::config::TrainerConfig;
use crate::model::{
    OpenWindowRequest, WindowId, WindowPosition, WindowRecord, WindowRect, WindowSize,
};

/// Placement rules applied to newly opened and maximized windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    pub origin: WindowPosition,
    pub cascade_step: i32,
    pub default_size: WindowSize,
    pub min_size: WindowSize,
}

impl WindowLayout {
    pub fn from_config(config: &TrainerConfig) -> Self {
        Self {
            origin: config.window_origin,
            cascade_step: config.cascade_step,
            default_size: config.default_window_size,
            min_size: config.min_window_size,
        }
    }
}

impl Default for WindowLayout {
    fn default() -> Self {
        Self::from_config(&TrainerConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowManager {
    next_window_id: u64,
    next_z_index: u64,
    windows: Vec<WindowRecord>,
    viewport: ViewportSize,
    layout: WindowLayout,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new(WindowLayout::default(), ViewportSize::default())
    }
}

impl WindowManager {
    pub fn new(layout: WindowLayout, viewport: ViewportSize) -> Self {
        Self {
            next_window_id: 1,
            next_z_index: 1,
            windows: Vec::new(),
            viewport,
            layout,
        }
    }

    pub fn from_config(config: &TrainerConfig) -> Self {
        Self::new(WindowLayout::from_config(config), config.default_viewport)
    }

    /// Open windows in creation order.
    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    /// Ids in taskbar order (creation order, minimized windows included).
    pub fn taskbar_order(&self) -> Vec<WindowId> {
        self.windows.iter().map(|w| w.id).collect()
    }

    pub fn window(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.is_focused).map(|w| w.id)
    }

    /// Windows ordered back-to-front for drawing.
    pub fn stacking_order(&self) -> Vec<&WindowRecord> {
        let mut ordered: Vec<&WindowRecord> = self.windows.iter().collect();
        ordered.sort_by_key(|w| w.z_index);
        ordered
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Updates the host viewport; maximized windows are refitted to it.
    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
        let fill = self.viewport_rect();
        for window in self.windows.iter_mut().filter(|w| w.maximized) {
            window.rect = fill;
        }
    }

    /// Opens a new window at the next cascade position and focuses it.
    pub fn open(&mut self, req: OpenWindowRequest) -> &WindowRecord {
        let window_id = WindowId(self.next_window_id);
        self.next_window_id = self.next_window_id.saturating_add(1);

        let cascade = i32::try_from(window_id.0 - 1)
            .unwrap_or(i32::MAX)
            .saturating_mul(self.layout.cascade_step);
        let rect = req
            .rect
            .unwrap_or_else(|| {
                WindowRect::new(self.layout.origin, self.layout.default_size)
                    .offset(cascade, cascade)
            })
            .clamped_min(self.layout.min_size);

        self.windows.push(WindowRecord {
            id: window_id,
            title: req.title,
            icon_id: req.icon_id,
            content_id: req.content_id,
            rect,
            saved_rect: None,
            z_index: 0,
            is_focused: false,
            minimized: false,
            maximized: false,
        });
        self.focus(window_id);

        let index = self.windows.len() - 1;
        &self.windows[index]
    }

    /// Removes a window. Returns `false` when the id is unknown.
    pub fn close(&mut self, window_id: WindowId) -> bool {
        let before_len = self.windows.len();
        self.windows.retain(|w| w.id != window_id);
        if self.windows.len() == before_len {
            return false;
        }
        self.normalize_window_stack();
        true
    }

    /// Minimizes a window without touching its `z_index`.
    pub fn minimize(&mut self, window_id: WindowId) -> bool {
        let Some(window) = self.window_mut(window_id) else {
            return false;
        };
        if window.minimized {
            return false;
        }
        window.minimized = true;
        window.is_focused = false;
        self.normalize_window_stack();
        true
    }

    /// Un-minimizes a window and brings it to the front.
    pub fn restore(&mut self, window_id: WindowId) -> bool {
        let Some(window) = self.window_mut(window_id) else {
            return false;
        };
        window.minimized = false;
        self.focus(window_id)
    }

    /// Focuses and raises `window_id`, un-minimizing it if needed.
    ///
    /// Returns `true` when the window exists (including when it was already the focused top).
    pub fn focus(&mut self, window_id: WindowId) -> bool {
        let Some(index) = self.windows.iter().position(|w| w.id == window_id) else {
            return false;
        };

        let already_focused_top = self
            .windows
            .get(index)
            .map(|w| w.is_focused && !w.minimized)
            .unwrap_or(false);
        if already_focused_top {
            return true;
        }

        let z_index = self.take_z_index();
        for window in &mut self.windows {
            window.is_focused = false;
        }
        let window = &mut self.windows[index];
        window.z_index = z_index;
        window.is_focused = true;
        window.minimized = false;
        true
    }

    /// Toggles maximized state. Entering captures the current bounds and fills the viewport;
    /// leaving restores the captured bounds. Focus is unchanged.
    pub fn toggle_maximize(&mut self, window_id: WindowId) -> bool {
        let fill = self.viewport_rect();
        let Some(window) = self.window_mut(window_id) else {
            return false;
        };

        if window.maximized {
            if let Some(saved) = window.saved_rect.take() {
                window.rect = saved;
            }
            window.maximized = false;
        } else {
            window.saved_rect = Some(window.rect);
            window.rect = fill;
            window.maximized = true;
        }
        true
    }

    /// Moves a window's top-left corner. Maximized windows stay pinned to the viewport.
    pub fn move_to(&mut self, window_id: WindowId, x: i32, y: i32) -> bool {
        let Some(window) = self.window_mut(window_id) else {
            return false;
        };
        if window.maximized {
            return false;
        }
        window.rect = window.rect.moved_to(x, y);
        true
    }

    /// Minimizes every window, or restores all of them when all are already minimized.
    pub fn toggle_show_desktop(&mut self) -> bool {
        if self.windows.is_empty() {
            return false;
        }

        let all_minimized = self.windows.iter().all(|w| w.minimized);
        for window in &mut self.windows {
            window.minimized = !all_minimized;
            window.is_focused = false;
        }
        self.normalize_window_stack();
        true
    }

    /// Focuses the window created after the focused one, wrapping to the first.
    pub fn cycle_focus(&mut self) -> bool {
        if self.windows.len() <= 1 {
            return false;
        }

        let next_index = match self.windows.iter().position(|w| w.is_focused) {
            Some(index) => (index + 1) % self.windows.len(),
            None => 0,
        };
        let window_id = self.windows[next_index].id;
        self.focus(window_id)
    }

    pub fn close_focused(&mut self) -> bool {
        self.focused_window_id()
            .map(|id| self.close(id))
            .unwrap_or(false)
    }

    pub fn minimize_focused(&mut self) -> bool {
        self.focused_window_id()
            .map(|id| self.minimize(id))
            .unwrap_or(false)
    }

    pub fn toggle_maximize_focused(&mut self) -> bool {
        self.focused_window_id()
            .map(|id| self.toggle_maximize(id))
            .unwrap_or(false)
    }

    fn window_mut(&mut self, window_id: WindowId) -> Option<&mut WindowRecord> {
        self.windows.iter_mut().find(|w| w.id == window_id)
    }

    fn take_z_index(&mut self) -> u64 {
        let z_index = self.next_z_index;
        self.next_z_index = self.next_z_index.saturating_add(1);
        z_index
    }

    fn viewport_rect(&self) -> WindowRect {
        WindowRect {
            x: 0,
            y: 0,
            w: self.viewport.width,
            h: self.viewport.height,
        }
        .clamped_min(self.layout.min_size)
    }

    /// Restores focus invariants after a removal or minimize.
    fn normalize_window_stack(&mut self) {
        let mut has_focused = false;
        for window in &mut self.windows {
            if window.minimized {
                window.is_focused = false;
            }
            if window.is_focused {
                if has_focused {
                    window.is_focused = false;
                } else {
                    has_focused = true;
                }
            }
        }

        if !has_focused {
            if let Some(top) = self
                .windows
                .iter_mut()
                .filter(|w| !w.minimized)
                .max_by_key(|w| w.z_index)
            {
                top.is_focused = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn open(wm: &mut WindowManager, title: &str) -> WindowId {
        wm.open(OpenWindowRequest::new(title, "app", title.to_lowercase()))
            .id
    }

    fn assert_stack_invariant(wm: &WindowManager) {
        let visible_max = wm
            .windows()
            .iter()
            .filter(|w| !w.minimized)
            .map(|w| w.z_index)
            .max();
        let focused: Vec<&WindowRecord> = wm.windows().iter().filter(|w| w.is_focused).collect();
        match visible_max {
            Some(max) => {
                assert_eq!(focused.len(), 1, "exactly one focused window");
                assert!(!focused[0].minimized);
                assert_eq!(focused[0].z_index, max);
            }
            None => assert!(focused.is_empty(), "no focus without visible windows"),
        }
    }

    #[test]
    fn open_cascades_and_focuses_new_window() {
        let mut wm = WindowManager::default();
        let first = open(&mut wm, "A");
        let second = open(&mut wm, "B");

        assert_eq!(wm.focused_window_id(), Some(second));
        let a = wm.window(first).unwrap();
        let b = wm.window(second).unwrap();
        assert_eq!(b.rect.x - a.rect.x, 30);
        assert_eq!(b.rect.y - a.rect.y, 30);
        assert!(b.z_index > a.z_index);
        assert_stack_invariant(&wm);
    }

    #[test]
    fn stack_invariant_holds_across_mixed_operations() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        let b = open(&mut wm, "B");
        let c = open(&mut wm, "C");

        wm.focus(a);
        assert_stack_invariant(&wm);
        wm.minimize(a);
        assert_stack_invariant(&wm);
        assert_eq!(wm.focused_window_id(), Some(c));
        wm.minimize(c);
        assert_eq!(wm.focused_window_id(), Some(b));
        wm.minimize(b);
        assert_stack_invariant(&wm);
        assert_eq!(wm.focused_window_id(), None);
        wm.restore(c);
        assert_stack_invariant(&wm);
        assert_eq!(wm.focused_window_id(), Some(c));
        wm.focus(b);
        assert_stack_invariant(&wm);
        assert!(!wm.window(b).unwrap().minimized);
    }

    #[test]
    fn minimize_keeps_z_index() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        let before = wm.window(a).unwrap().z_index;
        wm.minimize(a);
        assert_eq!(wm.window(a).unwrap().z_index, before);
    }

    #[test]
    fn close_transfers_focus_to_highest_visible_window() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        let b = open(&mut wm, "B");
        let c = open(&mut wm, "C");
        wm.focus(a);
        wm.minimize(b);
        wm.focus(c);

        assert!(wm.close(c));
        assert_eq!(wm.focused_window_id(), Some(a));
        assert_stack_invariant(&wm);
    }

    #[test]
    fn close_is_idempotent_for_missing_ids() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        open(&mut wm, "B");

        assert!(wm.close(a));
        let after_first = wm.clone();
        assert!(!wm.close(a));
        assert!(!wm.close(WindowId(999)));
        assert_eq!(wm, after_first);
    }

    #[test]
    fn focusing_focused_window_keeps_stack() {
        let mut wm = WindowManager::default();
        open(&mut wm, "A");
        let b = open(&mut wm, "B");
        let before = wm.clone();
        assert!(wm.focus(b));
        assert_eq!(wm, before);
    }

    #[test]
    fn cycle_focus_wraps_in_creation_order_and_skips_closed_windows() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        let b = open(&mut wm, "B");
        let c = open(&mut wm, "C");

        assert!(wm.cycle_focus());
        assert_eq!(wm.focused_window_id(), Some(a));
        wm.cycle_focus();
        wm.cycle_focus();
        wm.cycle_focus();
        assert_eq!(wm.focused_window_id(), Some(a));

        wm.cycle_focus();
        assert_eq!(wm.focused_window_id(), Some(b));
        wm.close(b);
        for _ in 0..4 {
            wm.cycle_focus();
            let focused = wm.focused_window_id();
            assert_ne!(focused, Some(b));
            assert!(focused == Some(a) || focused == Some(c));
            assert_stack_invariant(&wm);
        }
    }

    #[test]
    fn cycle_focus_needs_two_windows() {
        let mut wm = WindowManager::default();
        assert!(!wm.cycle_focus());
        let a = open(&mut wm, "A");
        let before = wm.clone();
        assert!(!wm.cycle_focus());
        assert_eq!(wm, before);
        assert_eq!(wm.focused_window_id(), Some(a));
    }

    #[test]
    fn maximize_round_trip_restores_exact_bounds() {
        let mut wm = WindowManager::new(WindowLayout::default(), ViewportSize::new(1280, 720));
        let bounds = WindowRect {
            x: 100,
            y: 100,
            w: 600,
            h: 400,
        };
        let win = wm
            .open(OpenWindowRequest::new("Notes", "notepad", "notes").with_rect(bounds))
            .id;

        assert!(wm.toggle_maximize(win));
        let record = wm.window(win).unwrap();
        assert!(record.maximized);
        assert_eq!(
            record.rect,
            WindowRect {
                x: 0,
                y: 0,
                w: 1280,
                h: 720,
            }
        );
        assert_eq!(record.saved_rect, Some(bounds));

        assert!(wm.toggle_maximize(win));
        let record = wm.window(win).unwrap();
        assert!(!record.maximized);
        assert_eq!(record.rect, bounds);
        assert_eq!(record.saved_rect, None);
    }

    #[test]
    fn maximize_does_not_change_focus() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        let b = open(&mut wm, "B");
        wm.toggle_maximize(a);
        assert_eq!(wm.focused_window_id(), Some(b));
        assert_stack_invariant(&wm);
    }

    #[test]
    fn viewport_change_refits_maximized_windows() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        wm.toggle_maximize(a);
        wm.set_viewport(ViewportSize::new(800, 600));
        assert_eq!(wm.window(a).unwrap().rect.w, 800);
        assert_eq!(wm.window(a).unwrap().rect.h, 600);
    }

    #[test]
    fn show_desktop_toggles_all_windows() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        let b = open(&mut wm, "B");
        wm.minimize(a);

        assert!(wm.toggle_show_desktop());
        assert!(wm.windows().iter().all(|w| w.minimized));
        assert_eq!(wm.focused_window_id(), None);

        assert!(wm.toggle_show_desktop());
        assert!(wm.windows().iter().all(|w| !w.minimized));
        assert_eq!(wm.focused_window_id(), Some(b));
        assert_stack_invariant(&wm);
    }

    #[test]
    fn moving_maximized_window_is_ignored() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        assert!(wm.move_to(a, 5, 7));
        assert_eq!(wm.window(a).unwrap().rect.x, 5);
        wm.toggle_maximize(a);
        assert!(!wm.move_to(a, 300, 300));
        assert_eq!(wm.window(a).unwrap().rect.x, 0);
    }

    #[test]
    fn stacking_order_is_back_to_front() {
        let mut wm = WindowManager::default();
        let a = open(&mut wm, "A");
        let b = open(&mut wm, "B");
        wm.focus(a);
        let order: Vec<WindowId> = wm.stacking_order().iter().map(|w| w.id).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn huge_cascade_step_pins_windows_at_the_edge() {
        let config = TrainerConfig::from_toml_str("cascade_step = 1000000000").expect("config");
        let mut wm = WindowManager::from_config(&config);
        let ids: Vec<_> = (0..8).map(|n| open(&mut wm, &format!("W{n}"))).collect();

        assert_eq!(wm.windows().len(), 8);
        let last = wm.window(ids[7]).expect("last window");
        assert_eq!((last.rect.x, last.rect.y), (i32::MAX, i32::MAX));
        assert_eq!(wm.focused_window_id(), Some(ids[7]));
    }
}
