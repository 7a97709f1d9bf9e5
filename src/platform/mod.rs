//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (`subscribe`/`unsubscribe` input sources)
//! - Run seeds from wall-clock time
//! - Logger setup on the web
//!
//! Raw events are buffered in an [`InputQueue`] and applied by the session
//! at the next frame, so handlers never touch simulation state directly.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::sim::RawInput;

/// Callback receiving raw input events
pub type InputHandler = Box<dyn FnMut(RawInput)>;

/// A stream of discrete key-down and pointer events
pub trait InputSource {
    /// Start delivering events to `handler`, replacing any previous handler
    fn subscribe(&mut self, handler: InputHandler);

    /// Stop delivering events
    fn unsubscribe(&mut self);
}

/// Shared FIFO of raw input waiting for the next frame
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    events: Rc<RefCell<VecDeque<RawInput>>>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, raw: RawInput) {
        self.events.borrow_mut().push_back(raw);
    }

    /// Take everything queued so far, oldest first
    pub fn drain(&self) -> Vec<RawInput> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Handler that appends to this queue
    pub fn handler(&self) -> InputHandler {
        let queue = self.clone();
        Box::new(move |raw| queue.push(raw))
    }
}

/// Input source fed by hand (headless runner, tests)
#[derive(Default)]
pub struct ManualInput {
    handler: Option<InputHandler>,
}

impl ManualInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler.is_some()
    }

    /// Deliver an event. Returns false when nobody is subscribed.
    pub fn emit(&mut self, raw: RawInput) -> bool {
        match self.handler.as_mut() {
            Some(handler) => {
                handler(raw);
                true
            }
            None => false,
        }
    }
}

impl InputSource for ManualInput {
    fn subscribe(&mut self, handler: InputHandler) {
        self.handler = Some(handler);
    }

    fn unsubscribe(&mut self) {
        self.handler = None;
    }
}

/// Seed for a new run from wall-clock time
#[cfg(not(target_arch = "wasm32"))]
pub fn now_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| fold_nanos(d.as_nanos()))
        .unwrap_or_default()
}

/// Fold a 128-bit nanosecond count into 64 seed bits
#[cfg(not(target_arch = "wasm32"))]
fn fold_nanos(nanos: u128) -> u64 {
    (nanos as u64) ^ ((nanos >> 64) as u64)
}

#[cfg(target_arch = "wasm32")]
pub use web::{KeyboardInput, init_logging, now_seed, watch_visibility};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use super::{InputHandler, InputSource};
    use crate::session::SharedSession;
    use crate::sim::{KeyCode, RawInput};

    /// Route `log` to the browser console and panics to `console.error`
    pub fn init_logging(level: log::Level) {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(level).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }
    }

    pub fn now_seed() -> u64 {
        js_sys::Date::now() as u64
    }

    /// Window `keydown` and `pointerdown` listeners
    #[derive(Default)]
    pub struct KeyboardInput {
        keydown: Option<Closure<dyn FnMut(web_sys::KeyboardEvent)>>,
        pointerdown: Option<Closure<dyn FnMut(web_sys::PointerEvent)>>,
    }

    impl KeyboardInput {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl InputSource for KeyboardInput {
        fn subscribe(&mut self, handler: InputHandler) {
            self.unsubscribe();
            let Some(window) = web_sys::window() else {
                log::warn!("No window, keyboard input disabled");
                return;
            };

            let handler = Rc::new(RefCell::new(handler));

            let on_key = {
                let handler = handler.clone();
                Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                    let key = KeyCode::from_name(&event.key()).or_else(|| KeyCode::from_name(&event.code()));
                    if let Some(key) = key {
                        // Keep arrows and space from scrolling the page
                        event.prevent_default();
                        (*handler.borrow_mut())(RawInput::Key(key));
                    }
                })
            };
            let on_pointer = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
                (*handler.borrow_mut())(RawInput::Pointer);
            });

            let _ = window.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref());
            let _ = window
                .add_event_listener_with_callback("pointerdown", on_pointer.as_ref().unchecked_ref());

            self.keydown = Some(on_key);
            self.pointerdown = Some(on_pointer);
        }

        fn unsubscribe(&mut self) {
            let window = web_sys::window();
            if let Some(closure) = self.keydown.take() {
                if let Some(window) = &window {
                    let _ = window
                        .remove_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
                }
            }
            if let Some(closure) = self.pointerdown.take() {
                if let Some(window) = &window {
                    let _ = window.remove_event_listener_with_callback(
                        "pointerdown",
                        closure.as_ref().unchecked_ref(),
                    );
                }
            }
        }
    }

    impl Drop for KeyboardInput {
        fn drop(&mut self) {
            self.unsubscribe();
        }
    }

    /// Suspend the session while the tab is hidden
    pub fn watch_visibility(session: SharedSession) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let doc = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let hidden = doc.visibility_state() == web_sys::VisibilityState::Hidden;
            let changed = session.with(|s| {
                if hidden {
                    s.suspend();
                } else {
                    s.resume();
                }
            });
            if changed.is_none() {
                log::debug!("Visibility change while ticking, ignored");
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}
