//! Scoped keyboard listener attachment.
//!
//! A [`KeyboardListenerGuard`] owns exactly one attached handler. Dropping the guard detaches the
//! handler, so remounting a view can never leave a stale or duplicated listener behind.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::logging;
use platform_host::Clock;

use crate::keys::RawKeyEvent;
use crate::reducer::{reduce_trainer, TrainerAction, TrainerEffect, TrainerSession};

/// Handler invoked for every key press. Returns `true` when the press was consumed.
pub type KeyHandler = Box<dyn FnMut(&RawKeyEvent) -> bool>;

/// Identifier of one attached handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Something that delivers raw key presses to attached handlers.
pub trait KeyEventSource {
    fn attach(&self, handler: KeyHandler) -> ListenerId;

    /// Detaches a handler. Returns `false` when `id` was not attached.
    fn detach(&self, id: ListenerId) -> bool;
}

/// Detaches its handler when dropped or passed to [`stop_listening`].
#[must_use = "dropping the guard detaches the keyboard listener"]
pub struct KeyboardListenerGuard {
    source: Rc<dyn KeyEventSource>,
    id: ListenerId,
    detached: bool,
}

impl KeyboardListenerGuard {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        if self.source.detach(self.id) {
            logging::log!("keyboard listener {} detached", self.id.0);
        } else {
            logging::debug_warn!("keyboard listener {} was already detached", self.id.0);
        }
    }
}

impl Drop for KeyboardListenerGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for KeyboardListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardListenerGuard")
            .field("id", &self.id)
            .field("detached", &self.detached)
            .finish()
    }
}

/// Attaches `handler` to `source` for the lifetime of the returned guard.
pub fn start_listening(
    source: Rc<dyn KeyEventSource>,
    handler: KeyHandler,
) -> KeyboardListenerGuard {
    let id = source.attach(handler);
    logging::log!("keyboard listener {} attached", id.0);
    KeyboardListenerGuard {
        source,
        id,
        detached: false,
    }
}

/// Detaches the guarded handler now.
pub fn stop_listening(mut guard: KeyboardListenerGuard) {
    guard.detach();
}

/// Builds a handler that feeds key presses into `session`, stamped with `clock`.
///
/// Every effect batch is passed to `on_effects`; the handler reports the press as consumed when
/// the batch contains [`TrainerEffect::PreventDefault`].
pub fn session_key_handler(
    session: Rc<RefCell<TrainerSession>>,
    clock: Rc<dyn Clock>,
    mut on_effects: impl FnMut(&[TrainerEffect]) + 'static,
) -> KeyHandler {
    Box::new(move |event: &RawKeyEvent| {
        let effects = reduce_trainer(
            &mut session.borrow_mut(),
            TrainerAction::KeyPressed {
                event: event.clone(),
                at_ms: clock.now_ms(),
            },
        );
        on_effects(&effects);
        effects.contains(&TrainerEffect::PreventDefault)
    })
}

type SharedHandler = Rc<RefCell<KeyHandler>>;

/// In-process [`KeyEventSource`] for tests and headless hosts.
#[derive(Default)]
pub struct MemoryKeyEventSource {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(ListenerId, SharedHandler)>>,
}

impl MemoryKeyEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every attached handler in attach order.
    ///
    /// Returns `true` when any handler consumed the press.
    pub fn emit(&self, event: &RawKeyEvent) -> bool {
        // Snapshot so handlers may attach or detach while being called.
        let handlers: Vec<SharedHandler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        let mut consumed = false;
        for handler in handlers {
            consumed |= (*handler.borrow_mut())(event);
        }
        consumed
    }

    pub fn listener_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl KeyEventSource for MemoryKeyEventSource {
    fn attach(&self, handler: KeyHandler) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(handler))));
        id
    }

    fn detach(&self, id: ListenerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(attached, _)| *attached != id);
        handlers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use platform_host::ManualClock;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::TrainerConfig;

    fn session() -> Rc<RefCell<TrainerSession>> {
        Rc::new(RefCell::new(
            TrainerSession::with_builtin_shortcuts(TrainerConfig::default()).expect("session"),
        ))
    }

    #[test]
    fn guard_detaches_on_drop_and_explicit_stop() {
        let source = Rc::new(MemoryKeyEventSource::new());

        let guard = start_listening(source.clone(), Box::new(|_: &RawKeyEvent| false));
        assert_eq!(source.listener_count(), 1);
        stop_listening(guard);
        assert_eq!(source.listener_count(), 0);

        {
            let _guard = start_listening(source.clone(), Box::new(|_: &RawKeyEvent| false));
            assert_eq!(source.listener_count(), 1);
        }
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn guard_detaches_when_the_view_panics() {
        let source = Rc::new(MemoryKeyEventSource::new());
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = start_listening(source.clone(), Box::new(|_: &RawKeyEvent| false));
            panic!("view failed while mounted");
        }));
        assert!(result.is_err());
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn remounting_never_duplicates_handlers() {
        let source = Rc::new(MemoryKeyEventSource::new());
        let session = session();
        let clock = Rc::new(ManualClock::new(1_000));

        let mut guard = start_listening(
            source.clone(),
            session_key_handler(session.clone(), clock.clone(), |_| {}),
        );
        for _ in 0..3 {
            drop(guard);
            guard = start_listening(
                source.clone(),
                session_key_handler(session.clone(), clock.clone(), |_| {}),
            );
        }
        assert_eq!(source.listener_count(), 1);

        source.emit(&RawKeyEvent::new("c").with_ctrl());
        assert_eq!(session.borrow().score(), 10);
        drop(guard);
    }

    #[test]
    fn session_handler_consumes_matches_and_stamps_time() {
        let source = Rc::new(MemoryKeyEventSource::new());
        let session = session();
        let clock = Rc::new(ManualClock::new(5_000));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let _guard = start_listening(
            source.clone(),
            session_key_handler(session.clone(), clock.clone(), move |effects| {
                sink.borrow_mut().extend_from_slice(effects)
            }),
        );

        clock.advance(250);
        assert!(source.emit(&RawKeyEvent::new("v").with_ctrl()));
        assert!(!source.emit(&RawKeyEvent::new("q")));

        let session = session.borrow();
        let paste = session.progress().progress("paste").expect("paste entry");
        assert_eq!(paste.last_attempt_ms, Some(5_250));
        assert!(seen
            .borrow()
            .iter()
            .any(|effect| matches!(effect, TrainerEffect::ScheduleFeedbackClear { .. })));
    }
}
