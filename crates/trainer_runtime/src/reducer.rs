//! Trainer session state, reducer actions, and side-effect intents.
//!
//! [`TrainerSession`] is the single owner of everything a practice session mutates: the window
//! manager, progress tracker, practice controller, and the most recent match feedback. Hosts feed
//! it [`TrainerAction`] values through [`reduce_trainer`] and execute the returned
//! [`TrainerEffect`] intents (suppressing browser defaults, scheduling feedback clears).

use platform_host::ViewportSize;
use serde::{Deserialize, Serialize};

use crate::config::TrainerConfig;
use crate::engine::{run_action, MatchOutcome, ShortcutEngine};
use crate::keys::{normalize_key_event, KeySet, RawKeyEvent};
use crate::model::{OpenWindowRequest, WindowId, WindowRecord};
use crate::practice::{PracticeMode, PracticeModeController};
use crate::progress::ProgressTracker;
use crate::registry::{RegistryError, ShortcutCategory, ShortcutRegistry};
use crate::window_manager::WindowManager;

/// Transient result of the most recent recognized key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFeedback {
    pub display_text: String,
    pub success: bool,
}

/// One line of the progress sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub shortcut_id: String,
    pub description: String,
    pub category: ShortcutCategory,
    pub key_display: String,
    pub attempts: u32,
    pub successes: u32,
    /// Mastery ratio as a whole percentage, `0..=100`.
    pub mastery_percent: u8,
}

/// The pending guided challenge as presented to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeView {
    pub shortcut_id: String,
    pub description: String,
    /// Key combo, present only while the hint is visible.
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_trainer`] to mutate a [`TrainerSession`].
pub enum TrainerAction {
    /// A raw key press from the host keyboard listener.
    KeyPressed {
        /// Host key event.
        event: RawKeyEvent,
        /// Timestamp of the press in unix milliseconds.
        at_ms: u64,
    },
    /// Open a window directly (desktop icon, launcher).
    OpenWindow(OpenWindowRequest),
    /// Close a window by id.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Focus (and raise) a window by id.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Minimize a window.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Restore a minimized window and focus it.
    RestoreWindow {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Toggle a window between maximized and its saved bounds.
    ToggleMaximize {
        /// Window to maximize or un-maximize.
        window_id: WindowId,
    },
    /// Move a window's top-left corner.
    MoveWindow {
        /// Window to move.
        window_id: WindowId,
        /// New left edge.
        x: i32,
        /// New top edge.
        y: i32,
    },
    /// Taskbar button click: restore if minimized, minimize if focused, focus otherwise.
    ToggleTaskbarWindow {
        /// Window associated with the taskbar button.
        window_id: WindowId,
    },
    /// Minimize all windows, or restore all when all are minimized.
    ToggleShowDesktop,
    /// Focus the next window in creation order.
    CycleFocus,
    /// The hosting view was resized.
    SetViewport {
        /// New viewport size.
        viewport: ViewportSize,
    },
    /// Switch between free and guided practice.
    SetMode {
        /// Target mode.
        mode: PracticeMode,
    },
    /// Pick the next guided challenge.
    StartPractice,
    /// Show or hide the challenge hint.
    ToggleHint,
    /// Clear all progress and the score.
    ResetPractice,
    /// Drop the transient match feedback if it is still the one shown as `seq`.
    ClearFeedback {
        /// Feedback sequence number carried by [`TrainerEffect::ScheduleFeedbackClear`].
        seq: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_trainer`] for the host to execute.
pub enum TrainerEffect {
    /// The key event was consumed; the host should suppress its default behavior.
    PreventDefault,
    /// Show transient feedback for a recognized or missed combo.
    ShowFeedback(MatchFeedback),
    /// Dispatch [`TrainerAction::ClearFeedback`] after the given delay.
    ScheduleFeedbackClear {
        /// Delay in milliseconds.
        after_ms: u32,
        /// Sequence number of the feedback this timer belongs to.
        seq: u64,
    },
    /// The pending guided challenge was completed.
    ChallengeCompleted {
        /// Completed shortcut id.
        shortcut_id: String,
    },
}

/// Complete state of one trainer instance. Sessions share nothing with each other.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerSession {
    registry: ShortcutRegistry,
    config: TrainerConfig,
    windows: WindowManager,
    progress: ProgressTracker,
    practice: PracticeModeController,
    last_feedback: Option<MatchFeedback>,
    /// Bumped for every feedback shown; stale clear timers compare against it.
    feedback_seq: u64,
}

impl TrainerSession {
    pub fn new(registry: ShortcutRegistry, config: TrainerConfig) -> Self {
        Self {
            windows: WindowManager::from_config(&config),
            progress: ProgressTracker::new(config.success_reward),
            practice: PracticeModeController::new(config.mastery_threshold),
            last_feedback: None,
            feedback_seq: 0,
            registry,
            config,
        }
    }

    /// Creates a session over the built-in shortcut catalog.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the embedded catalog fails validation.
    pub fn with_builtin_shortcuts(config: TrainerConfig) -> Result<Self, RegistryError> {
        Ok(Self::new(ShortcutRegistry::builtin()?, config))
    }

    pub fn registry(&self) -> &ShortcutRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn practice(&self) -> &PracticeModeController {
        &self.practice
    }

    pub fn mode(&self) -> PracticeMode {
        self.practice.mode()
    }

    pub fn score(&self) -> u64 {
        self.progress.score()
    }

    pub fn last_feedback(&self) -> Option<&MatchFeedback> {
        self.last_feedback.as_ref()
    }

    /// Live window list in creation (taskbar) order.
    pub fn window_list(&self) -> &[WindowRecord] {
        self.windows.windows()
    }

    /// Registry paired with progress, in registry order.
    pub fn progress_rows(&self) -> Vec<ProgressRow> {
        self.registry
            .definitions()
            .iter()
            .map(|definition| {
                let (attempts, successes, ratio) = self
                    .progress
                    .progress(&definition.id)
                    .map(|p| (p.attempts, p.successes, p.mastery_ratio()))
                    .unwrap_or((0, 0, 0.0));
                ProgressRow {
                    shortcut_id: definition.id.clone(),
                    description: definition.description.clone(),
                    category: definition.category,
                    key_display: definition.keys.display_string(),
                    attempts,
                    successes,
                    mastery_percent: (ratio * 100.0).round().clamp(0.0, 100.0) as u8,
                }
            })
            .collect()
    }

    /// The pending guided challenge, with its key combo when the hint is visible.
    pub fn challenge_view(&self) -> Option<ChallengeView> {
        let id = self.practice.pending_challenge()?;
        let definition = self.registry.get(id)?;
        Some(ChallengeView {
            shortcut_id: definition.id.clone(),
            description: definition.description.clone(),
            hint: self
                .practice
                .hint_visible()
                .then(|| definition.keys.display_string()),
        })
    }

    /// Sequence number of the most recently shown feedback.
    pub fn feedback_seq(&self) -> u64 {
        self.feedback_seq
    }

    fn feedback_effects(&mut self, feedback: MatchFeedback, effects: &mut Vec<TrainerEffect>) {
        self.feedback_seq = self.feedback_seq.wrapping_add(1);
        self.last_feedback = Some(feedback.clone());
        effects.push(TrainerEffect::ShowFeedback(feedback));
        effects.push(TrainerEffect::ScheduleFeedbackClear {
            after_ms: self.config.feedback_duration_ms,
            seq: self.feedback_seq,
        });
    }
}

/// Applies a [`TrainerAction`] to the session and collects resulting side effects.
///
/// Every action is total: unknown window ids and unmatched keys leave the session unchanged
/// (apart from a recorded miss while a guided challenge is pending).
pub fn reduce_trainer(session: &mut TrainerSession, action: TrainerAction) -> Vec<TrainerEffect> {
    let mut effects = Vec::new();
    match action {
        TrainerAction::KeyPressed { event, at_ms } => {
            let keys = normalize_key_event(&event);
            handle_key_press(session, &keys, at_ms, &mut effects);
        }
        TrainerAction::OpenWindow(req) => {
            session.windows.open(req);
        }
        TrainerAction::CloseWindow { window_id } => {
            session.windows.close(window_id);
        }
        TrainerAction::FocusWindow { window_id } => {
            session.windows.focus(window_id);
        }
        TrainerAction::MinimizeWindow { window_id } => {
            session.windows.minimize(window_id);
        }
        TrainerAction::RestoreWindow { window_id } => {
            session.windows.restore(window_id);
        }
        TrainerAction::ToggleMaximize { window_id } => {
            session.windows.toggle_maximize(window_id);
        }
        TrainerAction::MoveWindow { window_id, x, y } => {
            session.windows.move_to(window_id, x, y);
        }
        TrainerAction::ToggleTaskbarWindow { window_id } => {
            let focused = session.windows.focused_window_id() == Some(window_id);
            match session.windows.window(window_id).map(|w| w.minimized) {
                Some(true) => {
                    session.windows.restore(window_id);
                }
                Some(false) if focused => {
                    session.windows.minimize(window_id);
                }
                Some(false) => {
                    session.windows.focus(window_id);
                }
                None => {}
            }
        }
        TrainerAction::ToggleShowDesktop => {
            session.windows.toggle_show_desktop();
        }
        TrainerAction::CycleFocus => {
            session.windows.cycle_focus();
        }
        TrainerAction::SetViewport { viewport } => {
            session.windows.set_viewport(viewport);
        }
        TrainerAction::SetMode { mode } => {
            session.practice.set_mode(mode);
        }
        TrainerAction::StartPractice => {
            session
                .practice
                .start_practice(&session.registry, &session.progress);
        }
        TrainerAction::ToggleHint => {
            session.practice.toggle_hint();
        }
        TrainerAction::ResetPractice => {
            session.progress.reset();
            session.last_feedback = None;
        }
        TrainerAction::ClearFeedback { seq } => {
            if seq == session.feedback_seq {
                session.last_feedback = None;
            }
        }
    }
    effects
}

fn handle_key_press(
    session: &mut TrainerSession,
    keys: &KeySet,
    at_ms: u64,
    effects: &mut Vec<TrainerEffect>,
) {
    let outcome = ShortcutEngine::new(&session.registry).handle_keys(
        keys,
        &mut session.windows,
        &mut session.progress,
        &mut session.practice,
        at_ms,
    );

    match outcome {
        MatchOutcome::Matched {
            shortcut_id,
            completed_challenge,
            ..
        } => {
            effects.push(TrainerEffect::PreventDefault);
            let description = session
                .registry
                .get(&shortcut_id)
                .map(|d| d.description.clone())
                .unwrap_or_default();
            session.feedback_effects(
                MatchFeedback {
                    display_text: format!("{description} ({keys})"),
                    success: true,
                },
                effects,
            );
            if completed_challenge {
                effects.push(TrainerEffect::ChallengeCompleted { shortcut_id });
            }
        }
        MatchOutcome::Missed { challenge_id } => {
            let description = session
                .registry
                .get(&challenge_id)
                .map(|d| d.description.clone())
                .unwrap_or_default();
            session.feedback_effects(
                MatchFeedback {
                    display_text: format!("{keys} does not {}", lower_first(&description)),
                    success: false,
                },
                effects,
            );
        }
        MatchOutcome::Ignored => {}
    }
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Runs a bound action outside of key handling (for example from a "try it" button).
pub fn run_shortcut_action(session: &mut TrainerSession, shortcut_id: &str) -> bool {
    match session.registry.get(shortcut_id) {
        Some(definition) => run_action(&definition.action, &mut session.windows),
        None => false,
    }
}
