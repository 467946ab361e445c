//! Keyboard-shortcut trainer runtime: key normalization, shortcut matching, a synthetic window
//! manager, practice progress, and the leptos wiring that hosts them.

pub mod components;
pub mod config;
pub mod engine;
pub mod keys;
pub mod listener;
pub mod model;
pub mod practice;
pub mod progress;
pub mod reducer;
pub mod registry;
pub mod window_manager;

pub use components::{
    install_keyboard_listener, use_trainer_runtime, BrowserKeyEventSource, TrainerProvider,
    TrainerRuntimeContext,
};
pub use config::{ConfigError, TrainerConfig};
pub use engine::{MatchOutcome, ShortcutEngine};
pub use keys::{normalize_key_event, KeyParseError, KeySet, KeyToken, RawKeyEvent};
pub use listener::{
    start_listening, stop_listening, KeyEventSource, KeyboardListenerGuard, MemoryKeyEventSource,
};
pub use model::*;
pub use practice::{PracticeMode, PracticeModeController, PracticeState};
pub use progress::{ProgressTracker, ShortcutProgress};
pub use reducer::{
    reduce_trainer, ChallengeView, MatchFeedback, ProgressRow, TrainerAction, TrainerEffect,
    TrainerSession,
};
pub use registry::{
    ActionKind, RegistryError, ShortcutCategory, ShortcutDefinition, ShortcutRegistry,
};
pub use window_manager::{WindowLayout, WindowManager};
