//! Free/guided practice modes and guided challenge selection.
//!
//! Guided practice never chains on its own: once the current challenge is completed the learner
//! has to start practice again to receive the next one.

use leptos::logging;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MASTERY_THRESHOLD;
use crate::progress::ProgressTracker;
use crate::registry::{ShortcutDefinition, ShortcutRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PracticeMode {
    #[default]
    Free,
    Guided,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PracticeState {
    pub mode: PracticeMode,
    pub current_challenge: Option<String>,
    pub hint_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeModeController {
    state: PracticeState,
    mastery_threshold: f64,
}

impl Default for PracticeModeController {
    fn default() -> Self {
        Self::new(DEFAULT_MASTERY_THRESHOLD)
    }
}

impl PracticeModeController {
    pub fn new(mastery_threshold: f64) -> Self {
        Self {
            state: PracticeState::default(),
            mastery_threshold,
        }
    }

    pub fn state(&self) -> &PracticeState {
        &self.state
    }

    pub fn mode(&self) -> PracticeMode {
        self.state.mode
    }

    pub fn current_challenge(&self) -> Option<&str> {
        self.state.current_challenge.as_deref()
    }

    pub fn hint_visible(&self) -> bool {
        self.state.hint_visible
    }

    /// Switches mode. Leaving guided mode drops the challenge and hint but keeps progress.
    pub fn set_mode(&mut self, mode: PracticeMode) {
        if self.state.mode == mode {
            return;
        }
        self.state.mode = mode;
        if mode == PracticeMode::Free {
            self.state.current_challenge = None;
            self.state.hint_visible = false;
        }
    }

    /// Selects the first shortcut in registry order whose mastery is below the threshold.
    ///
    /// Never-attempted shortcuts count as mastery `0.0`. Returns `None` in free mode or when
    /// every shortcut is mastered.
    pub fn start_practice<'r>(
        &mut self,
        registry: &'r ShortcutRegistry,
        progress: &ProgressTracker,
    ) -> Option<&'r ShortcutDefinition> {
        if self.state.mode != PracticeMode::Guided {
            logging::debug_warn!("start practice ignored outside guided mode");
            return None;
        }

        let next = registry
            .definitions()
            .iter()
            .find(|d| progress.mastery_ratio(&d.id) < self.mastery_threshold);

        match next {
            Some(definition) => {
                logging::log!("practice challenge: {}", definition.id);
                self.state.current_challenge = Some(definition.id.clone());
                self.state.hint_visible = true;
            }
            None => {
                logging::log!("practice complete: every shortcut is mastered");
                self.state.current_challenge = None;
                self.state.hint_visible = false;
            }
        }
        next
    }

    /// Shows or hides the hint in guided mode without touching the challenge.
    pub fn toggle_hint(&mut self) {
        if self.state.mode == PracticeMode::Guided {
            self.state.hint_visible = !self.state.hint_visible;
        }
    }

    /// Clears the challenge if `shortcut_id` completes it. Returns whether it did.
    pub fn note_success(&mut self, shortcut_id: &str) -> bool {
        if self.current_challenge() == Some(shortcut_id) {
            self.state.current_challenge = None;
            true
        } else {
            false
        }
    }

    /// The challenge a wrong key combo should be charged against, if any.
    pub fn pending_challenge(&self) -> Option<&str> {
        match self.state.mode {
            PracticeMode::Guided => self.current_challenge(),
            PracticeMode::Free => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::registry::{ActionKind, ShortcutCategory};

    fn registry(ids: &[(&str, &str)]) -> ShortcutRegistry {
        ShortcutRegistry::new(
            ids.iter()
                .map(|(id, keys)| {
                    ShortcutDefinition::new(
                        *id,
                        keys.parse().expect("keys"),
                        *id,
                        ShortcutCategory::System,
                        ActionKind::PracticeOnly,
                    )
                })
                .collect(),
        )
        .expect("registry")
    }

    fn record(tracker: &mut ProgressTracker, id: &str, successes: u32, attempts: u32) {
        for n in 0..attempts {
            tracker.record_attempt(id, n < successes, u64::from(n));
        }
    }

    #[test]
    fn guided_selects_first_unmastered_in_registry_order() {
        let registry = registry(&[("s1", "Ctrl+A"), ("s2", "Ctrl+B"), ("s3", "Ctrl+C")]);
        let mut tracker = ProgressTracker::default();
        record(&mut tracker, "s1", 8, 10);
        record(&mut tracker, "s3", 2, 4);

        let mut practice = PracticeModeController::default();
        practice.set_mode(PracticeMode::Guided);
        let picked = practice.start_practice(&registry, &tracker).map(|d| d.id.clone());

        assert_eq!(picked.as_deref(), Some("s2"));
        assert_eq!(practice.current_challenge(), Some("s2"));
        assert!(practice.hint_visible());
    }

    #[test]
    fn free_mode_never_sets_a_challenge() {
        let registry = registry(&[("s1", "Ctrl+A")]);
        let tracker = ProgressTracker::default();
        let mut practice = PracticeModeController::default();

        assert!(practice.start_practice(&registry, &tracker).is_none());
        assert_eq!(practice.current_challenge(), None);
        assert_eq!(practice.pending_challenge(), None);
    }

    #[test]
    fn all_mastered_leaves_no_challenge() {
        let registry = registry(&[("s1", "Ctrl+A")]);
        let mut tracker = ProgressTracker::default();
        record(&mut tracker, "s1", 7, 10);
        let mut practice = PracticeModeController::default();
        practice.set_mode(PracticeMode::Guided);

        assert!(practice.start_practice(&registry, &tracker).is_none());
        assert!(!practice.hint_visible());
    }

    #[test]
    fn success_clears_challenge_without_advancing() {
        let registry = registry(&[("s1", "Ctrl+A"), ("s2", "Ctrl+B")]);
        let tracker = ProgressTracker::default();
        let mut practice = PracticeModeController::default();
        practice.set_mode(PracticeMode::Guided);
        practice.start_practice(&registry, &tracker);

        assert!(!practice.note_success("s2"));
        assert_eq!(practice.current_challenge(), Some("s1"));
        assert!(practice.note_success("s1"));
        assert_eq!(practice.current_challenge(), None);
    }

    #[test]
    fn hint_toggle_and_mode_switch() {
        let registry = registry(&[("s1", "Ctrl+A")]);
        let tracker = ProgressTracker::default();
        let mut practice = PracticeModeController::default();
        practice.set_mode(PracticeMode::Guided);
        practice.start_practice(&registry, &tracker);

        practice.toggle_hint();
        assert!(!practice.hint_visible());
        assert_eq!(practice.current_challenge(), Some("s1"));
        practice.toggle_hint();
        assert!(practice.hint_visible());

        practice.set_mode(PracticeMode::Free);
        assert_eq!(practice.state(), &PracticeState::default());
    }
}
