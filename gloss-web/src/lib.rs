//! Gloss Web - WebAssembly binding that annotates the live page
//!
//! Exposes [`PageAnnotator`] to JavaScript. Highlights are placed in the
//! page itself, the fallback list lives in an open shadow root, reports and
//! activations are posted to the window.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, KeyboardEvent, Node};

use gloss_core::{AnnotationRequest, Annotator, AnnotatorConfig};

mod console;
mod dom;
mod events;
mod watcher;

pub use dom::BrowserDom;
pub use events::PostMessageSink;
pub use watcher::MutationWatcher;

type Shared = Rc<RefCell<Annotator<BrowserDom>>>;

/// Initialize panic and log forwarding when the module loads
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
    console::init();
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Replays the batch when the page tears out the isolation surface
fn on_structural_change(weak: &Weak<RefCell<Annotator<BrowserDom>>>) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    // Records arrive in a microtask after inject or clear has returned, so
    // our own edits land here too. Supervisor::should_replay ignores them
    // while the surface is still attached. A failed borrow only means a
    // listener is running right now.
    let Ok(mut annotator) = shared.try_borrow_mut() else {
        return;
    };
    annotator.on_structural_change();
}

fn event_node(event: &Event) -> Option<Node> {
    event.target()?.dyn_into::<Node>().ok()
}

/// Tooltips live in the page where the shadow stylesheet cannot reach, so
/// hover and focus toggle their inline display instead.
const TOOLTIP_EVENTS: [(&str, bool); 4] = [
    ("mouseover", true),
    ("mouseout", false),
    ("focusin", true),
    ("focusout", false),
];

fn tooltip_listener(
    weak: Weak<RefCell<Annotator<BrowserDom>>>,
    visible: bool,
) -> Closure<dyn FnMut(Event)> {
    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let (Some(shared), Some(node)) = (weak.upgrade(), event_node(&event)) else {
            return;
        };
        if let Ok(mut annotator) = shared.try_borrow_mut() {
            annotator.set_tooltip_visible(&node, visible);
        };
    })
}

/// Annotation session bound to the current page
#[wasm_bindgen]
pub struct PageAnnotator {
    inner: Shared,
    document: Document,
    on_click: Closure<dyn FnMut(Event)>,
    on_keydown: Closure<dyn FnMut(KeyboardEvent)>,
    on_tooltip: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

#[wasm_bindgen]
impl PageAnnotator {
    /// `configJson` is an optional JSON object in the `AnnotatorConfig`
    /// shape; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<PageAnnotator, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) => {
                AnnotatorConfig::from_json(json).map_err(|e| JsValue::from_str(&format!("{:#}", e)))?
            }
            None => AnnotatorConfig::default(),
        };

        let window = web_sys::window().ok_or("No window")?;
        let browser = BrowserDom::current()?;
        let document = browser.document().clone();
        let body: Node = document.body().ok_or("Document has no body")?.into();

        let inner: Shared = Rc::new_cyclic(|weak: &Weak<RefCell<Annotator<BrowserDom>>>| {
            let weak = weak.clone();
            let watcher = MutationWatcher::new(body, Rc::new(move || on_structural_change(&weak)));
            RefCell::new(
                Annotator::new(browser, config)
                    .with_notifier(Box::new(watcher))
                    .with_sink(Box::new(PostMessageSink::new(window))),
            )
        });

        let on_click = {
            let weak = Rc::downgrade(&inner);
            Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                let (Some(shared), Some(node)) = (weak.upgrade(), event_node(&event)) else {
                    return;
                };
                if let Ok(annotator) = shared.try_borrow() {
                    annotator.activate(&node);
                };
            })
        };

        let on_keydown = {
            let weak = Rc::downgrade(&inner);
            Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
                let (Some(shared), Some(node)) = (weak.upgrade(), event_node(&event)) else {
                    return;
                };
                let Ok(annotator) = shared.try_borrow() else {
                    return;
                };
                if annotator.handle_key(&node, &event.key()) {
                    event.prevent_default();
                }
            })
        };

        document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        document
            .add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref())?;

        let mut on_tooltip = Vec::with_capacity(TOOLTIP_EVENTS.len());
        for (name, visible) in TOOLTIP_EVENTS {
            let listener = tooltip_listener(Rc::downgrade(&inner), visible);
            document.add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())?;
            on_tooltip.push((name, listener));
        }

        Ok(PageAnnotator {
            inner,
            document,
            on_click,
            on_keydown,
            on_tooltip,
        })
    }

    /// Replace the page's highlights with `requestsJson` (an array of
    /// annotation requests) and return the batch report as JSON.
    pub fn inject(&self, requests_json: &str) -> Result<String, JsValue> {
        let requests: Vec<AnnotationRequest> = serde_json::from_str(requests_json).map_err(js_err)?;
        let report = self
            .inner
            .try_borrow_mut()
            .map_err(js_err)?
            .inject(requests)
            .map_err(js_err)?;
        report.to_json().map_err(js_err)
    }

    /// Remove every highlight and stop watching the page
    pub fn clear(&self) -> Result<(), JsValue> {
        self.inner.try_borrow_mut().map_err(js_err)?.clear();
        Ok(())
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner
            .try_borrow()
            .map(|a| a.is_active())
            .unwrap_or(false)
    }

    /// Most recent report as JSON, including supervised replays
    #[wasm_bindgen(js_name = lastReport)]
    pub fn last_report(&self) -> Option<String> {
        self.inner.try_borrow().ok()?.last_report()?.to_json().ok()
    }

    #[wasm_bindgen(js_name = replayCount)]
    pub fn replay_count(&self) -> usize {
        self.inner
            .try_borrow()
            .map(|a| a.replay_count())
            .unwrap_or(0)
    }
}

impl Drop for PageAnnotator {
    fn drop(&mut self) {
        let _ = self
            .document
            .remove_event_listener_with_callback("click", self.on_click.as_ref().unchecked_ref());
        let _ = self.document.remove_event_listener_with_callback(
            "keydown",
            self.on_keydown.as_ref().unchecked_ref(),
        );
        for (name, listener) in &self.on_tooltip {
            let _ = self
                .document
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        if let Ok(mut annotator) = self.inner.try_borrow_mut() {
            annotator.clear();
        }
    }
}
