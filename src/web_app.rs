//! Browser entry point
//!
//! JavaScript creates a [`WebArcade`] for one game and receives a JSON
//! snapshot after every applied tick. The session runs off
//! `requestAnimationFrame`, reads keys and taps from the window, persists to
//! `localStorage` and suspends itself while the tab is hidden.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::persistence::{KeyValueStore, LocalStorageStore, MemoryStore};
use crate::platform::{KeyboardInput, init_logging, watch_visibility};
use crate::session::{Session, SharedSession};
use crate::settings::Settings;
use crate::sim::GameKind;

#[wasm_bindgen(start)]
pub fn start() {
    init_logging(log::Level::Info);
    log::info!("Arcade core (web) loaded");
}

/// One running game bound to the page
#[wasm_bindgen]
pub struct WebArcade {
    session: SharedSession,
    input: KeyboardInput,
    running: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl WebArcade {
    /// Create a game (`snake`, `pacman`, `flappy`, `car-race`, `platformer`).
    /// `on_frame` is called with a JSON snapshot after every tick.
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str, on_frame: js_sys::Function) -> Result<WebArcade, JsValue> {
        let kind = GameKind::from_str(game)
            .ok_or_else(|| JsValue::from_str(&format!("unknown game '{}'", game)))?;

        let store: Box<dyn KeyValueStore> = match LocalStorageStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("localStorage unavailable, scores will not persist: {}", e);
                Box::new(MemoryStore::new())
            }
        };
        let settings = Settings::load(store.as_ref());

        let mut session = Session::new(kind.config(), settings, store);
        session.set_render_sink(move |snapshot| match serde_json::to_string(snapshot) {
            Ok(json) => {
                if let Err(e) = on_frame.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::warn!("Frame callback failed: {:?}", e);
                }
            }
            Err(e) => log::warn!("Failed to encode snapshot: {}", e),
        });

        let mut input = KeyboardInput::new();
        session.attach_input(&mut input);

        let session = SharedSession::new(session);
        watch_visibility(session.clone());

        let running = Rc::new(Cell::new(true));
        request_animation_frame(session.clone(), running.clone(), None);

        log::info!("Started {} on the page", kind.as_str());
        Ok(WebArcade {
            session,
            input,
            running,
        })
    }

    /// Latest snapshot as JSON, or `None` while a tick is in progress
    pub fn snapshot(&self) -> Option<String> {
        let snapshot = self.session.snapshot()?;
        serde_json::to_string(&snapshot).ok()
    }

    /// Begin the first run (any key or tap does the same)
    pub fn start(&self) -> bool {
        self.session.with(|s| s.start()).unwrap_or(false)
    }

    /// Start a fresh run after game over
    pub fn restart(&self) -> bool {
        self.session.with(|s| s.restart()).unwrap_or(false)
    }

    /// Stop the frame loop and release the listeners
    pub fn stop(&mut self) {
        self.running.set(false);
        self.session.with(|s| s.detach_input(&mut self.input));
    }
}

impl Drop for WebArcade {
    fn drop(&mut self) {
        self.running.set(false);
    }
}

fn request_animation_frame(session: SharedSession, running: Rc<Cell<bool>>, last_time: Option<f64>) {
    let Some(window) = web_sys::window() else {
        log::warn!("No window, frame loop not started");
        return;
    };
    let closure = Closure::once(move |time: f64| {
        game_loop(session, running, last_time, time);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn game_loop(session: SharedSession, running: Rc<Cell<bool>>, last_time: Option<f64>, time: f64) {
    if !running.get() {
        log::debug!("Frame loop stopped");
        return;
    }

    let dt = last_time.map_or(0.0, |last| ((time - last) / 1000.0) as f32);
    session.try_advance(dt);

    request_animation_frame(session, running, Some(time));
}
