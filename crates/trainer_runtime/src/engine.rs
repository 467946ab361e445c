//! Exact-match shortcut recognition and bound-action dispatch.

use leptos::logging;

use crate::keys::KeySet;
use crate::practice::PracticeModeController;
use crate::progress::ProgressTracker;
use crate::registry::{ActionKind, ShortcutDefinition, ShortcutRegistry};
use crate::window_manager::WindowManager;

/// Result of feeding one normalized key-set through the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A registered shortcut fired.
    Matched {
        shortcut_id: String,
        /// Whether this completed the pending guided challenge.
        completed_challenge: bool,
        /// Whether the bound action changed the desktop.
        desktop_changed: bool,
    },
    /// Nothing matched while a guided challenge was pending; a failed attempt was recorded.
    Missed { challenge_id: String },
    /// Nothing happened (no match in free mode, or a modifier-only press).
    Ignored,
}

/// Borrowed view over a registry that matches key-sets and runs bound actions.
#[derive(Debug, Clone, Copy)]
pub struct ShortcutEngine<'r> {
    registry: &'r ShortcutRegistry,
}

impl<'r> ShortcutEngine<'r> {
    pub fn new(registry: &'r ShortcutRegistry) -> Self {
        Self { registry }
    }

    /// Returns the first definition, in registration order, whose key-set equals `keys`.
    ///
    /// Subsets and supersets never match, so `Ctrl+Shift+Esc` cannot fire a `Ctrl+Esc` binding.
    pub fn match_keys(&self, keys: &KeySet) -> Option<&'r ShortcutDefinition> {
        self.registry.definitions().iter().find(|d| &d.keys == keys)
    }

    /// Matches `keys`, runs the bound action, and records progress.
    pub fn handle_keys(
        &self,
        keys: &KeySet,
        windows: &mut WindowManager,
        progress: &mut ProgressTracker,
        practice: &mut PracticeModeController,
        at_ms: u64,
    ) -> MatchOutcome {
        if keys.is_empty() || keys.is_modifier_only() {
            return MatchOutcome::Ignored;
        }

        match self.match_keys(keys) {
            Some(definition) => {
                let desktop_changed = run_action(&definition.action, windows);
                progress.record_attempt(&definition.id, true, at_ms);
                let completed_challenge = practice.note_success(&definition.id);
                MatchOutcome::Matched {
                    shortcut_id: definition.id.clone(),
                    completed_challenge,
                    desktop_changed,
                }
            }
            None => match practice.pending_challenge() {
                Some(challenge_id) => {
                    let challenge_id = challenge_id.to_string();
                    logging::log!("missed challenge {challenge_id} with {keys}");
                    progress.record_attempt(&challenge_id, false, at_ms);
                    MatchOutcome::Missed { challenge_id }
                }
                None => MatchOutcome::Ignored,
            },
        }
    }
}

/// Applies a bound action to the window manager. Returns whether anything changed.
pub fn run_action(action: &ActionKind, windows: &mut WindowManager) -> bool {
    match action {
        ActionKind::OpenWindow { .. } => match action.open_request() {
            Some(req) => {
                windows.open(req);
                true
            }
            None => false,
        },
        ActionKind::CloseActive => windows.close_focused(),
        ActionKind::MinimizeActive => windows.minimize_focused(),
        ActionKind::ToggleMaximizeActive => windows.toggle_maximize_focused(),
        ActionKind::ToggleShowDesktop => windows.toggle_show_desktop(),
        ActionKind::CycleFocus => windows.cycle_focus(),
        ActionKind::PracticeOnly => false,
    }
}
