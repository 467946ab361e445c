//! Leptos runtime context and browser keyboard wiring for the trainer.
//!
//! Rendering is left to the embedding app; this module only owns the reactive session container,
//! the effect executor, and the window-level listeners.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use leptos::*;
use platform_host::{BrowserViewportService, Clock, SystemClock, ViewportService};

use crate::config::TrainerConfig;
use crate::keys::RawKeyEvent;
use crate::listener::{
    start_listening, stop_listening, KeyEventSource, KeyHandler, ListenerId,
};
use crate::reducer::{reduce_trainer, TrainerAction, TrainerEffect, TrainerSession};
use crate::registry::ShortcutRegistry;

/// Height kept clear for the taskbar when measuring the maximize area.
pub const TASKBAR_HEIGHT_PX: i32 = 40;

#[derive(Clone, Copy)]
/// Leptos context for reading trainer state and dispatching [`TrainerAction`] values.
pub struct TrainerRuntimeContext {
    /// Reactive session signal.
    pub state: RwSignal<TrainerSession>,
    /// Effects emitted by the reducer and not yet executed.
    pub effects: RwSignal<Vec<TrainerEffect>>,
    /// Reducer dispatch callback.
    pub dispatch: Callback<TrainerAction>,
}

impl TrainerRuntimeContext {
    pub fn dispatch_action(&self, action: TrainerAction) {
        self.dispatch.call(action);
    }
}

/// Runs the reducer on the signal state and queues its effects. Returns whether the originating
/// key event should be suppressed.
fn apply_action(
    state: RwSignal<TrainerSession>,
    effects: RwSignal<Vec<TrainerEffect>>,
    action: TrainerAction,
) -> bool {
    let mut session = state.get_untracked();
    let previous = session.clone();
    let new_effects = reduce_trainer(&mut session, action);

    if session != previous {
        state.set(session);
    }
    let prevent = new_effects.contains(&TrainerEffect::PreventDefault);
    if !new_effects.is_empty() {
        let mut queue = effects.get_untracked();
        queue.extend(new_effects);
        effects.set(queue);
    }
    prevent
}

/// Builds the reactive container around `session` without providing it as context.
pub fn create_trainer_runtime(session: TrainerSession) -> TrainerRuntimeContext {
    let state = create_rw_signal(session);
    let effects = create_rw_signal(Vec::<TrainerEffect>::new());

    let dispatch = Callback::new(move |action: TrainerAction| {
        apply_action(state, effects, action);
    });

    TrainerRuntimeContext {
        state,
        effects,
        dispatch,
    }
}

#[component]
/// Provides [`TrainerRuntimeContext`] to descendants and installs the keyboard listener.
pub fn TrainerProvider(
    /// Shortcut table; defaults to the built-in catalog.
    #[prop(optional)]
    registry: Option<ShortcutRegistry>,
    /// Session configuration.
    #[prop(optional)]
    config: Option<TrainerConfig>,
    children: Children,
) -> impl IntoView {
    let config = config.unwrap_or_default();
    let loaded = match registry {
        Some(registry) => Ok(registry),
        None => ShortcutRegistry::builtin(),
    };
    let registry = match loaded {
        Ok(registry) => registry,
        Err(err) => {
            logging::warn!("shortcut catalog rejected, starting with an empty table: {err}");
            ShortcutRegistry::default()
        }
    };

    let runtime = create_trainer_runtime(TrainerSession::new(registry, config));
    provide_context(runtime);

    install_effect_executor(runtime);
    install_keyboard_listener(runtime);
    install_viewport_listener(
        runtime,
        BrowserViewportService {
            reserved_bottom_px: TASKBAR_HEIGHT_PX,
        },
    );

    children().into_view()
}

/// Returns the current [`TrainerRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`TrainerProvider`].
pub fn use_trainer_runtime() -> TrainerRuntimeContext {
    use_context::<TrainerRuntimeContext>().expect("TrainerRuntimeContext not provided")
}

/// Drains queued effects in order. Key-event suppression is handled inline by the listener.
pub fn install_effect_executor(runtime: TrainerRuntimeContext) {
    create_effect(move |_| {
        let queued = runtime.effects.get();
        if queued.is_empty() {
            return;
        }

        runtime.effects.set(Vec::new());

        for effect in queued {
            match effect {
                TrainerEffect::ScheduleFeedbackClear { after_ms, seq } => {
                    set_timeout(
                        move || {
                            runtime.dispatch_action(TrainerAction::ClearFeedback { seq });
                        },
                        Duration::from_millis(u64::from(after_ms)),
                    );
                }
                TrainerEffect::ChallengeCompleted { shortcut_id } => {
                    logging::log!("challenge completed: {shortcut_id}");
                }
                TrainerEffect::PreventDefault | TrainerEffect::ShowFeedback(_) => {}
            }
        }
    });
}

/// Converts a browser keydown into the host-neutral key event.
pub fn raw_key_event(ev: &web_sys::KeyboardEvent) -> RawKeyEvent {
    RawKeyEvent {
        key: ev.key(),
        meta: ev.meta_key(),
        ctrl: ev.ctrl_key(),
        alt: ev.alt_key(),
        shift: ev.shift_key(),
    }
}

/// [`KeyEventSource`] over window-level `keydown` events.
///
/// Auto-repeated keydowns are skipped. A handler that consumes a press suppresses the browser
/// default and stops propagation.
#[derive(Default)]
pub struct BrowserKeyEventSource {
    next_id: Cell<u64>,
    removers: RefCell<Vec<(ListenerId, Box<dyn FnOnce()>)>>,
}

impl BrowserKeyEventSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyEventSource for BrowserKeyEventSource {
    fn attach(&self, handler: KeyHandler) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let handler = RefCell::new(handler);
        let handle = window_event_listener(ev::keydown, move |ev| {
            if ev.repeat() {
                return;
            }
            let consumed = (*handler.borrow_mut())(&raw_key_event(&ev));
            if consumed {
                ev.prevent_default();
                ev.stop_propagation();
            }
        });
        self.removers
            .borrow_mut()
            .push((id, Box::new(move || handle.remove())));
        id
    }

    fn detach(&self, id: ListenerId) -> bool {
        let removed = {
            let mut removers = self.removers.borrow_mut();
            removers
                .iter()
                .position(|(attached, _)| *attached == id)
                .map(|index| removers.remove(index).1)
        };
        match removed {
            Some(remove) => {
                remove();
                true
            }
            None => false,
        }
    }
}

/// Builds a key handler that reduces presses into the reactive session.
///
/// Returns `true` from the handler when the press should be suppressed.
pub fn trainer_key_handler(
    runtime: TrainerRuntimeContext,
    clock: impl Clock + 'static,
) -> KeyHandler {
    Box::new(move |event: &RawKeyEvent| {
        let action = TrainerAction::KeyPressed {
            event: event.clone(),
            at_ms: clock.now_ms(),
        };
        apply_action(runtime.state, runtime.effects, action)
    })
}

/// Attaches the trainer keydown handler for the current reactive scope.
///
/// The returned guard is released by `on_cleanup`, so remounting the trainer view never stacks
/// handlers.
pub fn install_keyboard_listener(runtime: TrainerRuntimeContext) {
    let handler = trainer_key_handler(runtime, SystemClock);
    let guard = start_listening(Rc::new(BrowserKeyEventSource::new()), handler);
    on_cleanup(move || stop_listening(guard));
}

/// Keeps the session viewport in sync with the browser window.
pub fn install_viewport_listener(
    runtime: TrainerRuntimeContext,
    viewport: impl ViewportService + Copy + 'static,
) {
    runtime.dispatch_action(TrainerAction::SetViewport {
        viewport: viewport.viewport_size(),
    });
    let resize_listener = window_event_listener(ev::resize, move |_| {
        runtime.dispatch_action(TrainerAction::SetViewport {
            viewport: viewport.viewport_size(),
        });
    });
    on_cleanup(move || resize_listener.remove());
}
