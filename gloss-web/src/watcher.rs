//! Mutation feed for the resilience supervisor

use std::rc::Rc;

use gloss_core::{ChangeNotifier, DomError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MutationObserver, MutationObserverInit, Node};

use crate::dom::js_error;

type MutationCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// Watches a subtree for child-list changes and runs `on_change` once per
/// delivered batch of mutation records.
///
/// The observer is created on the first `observe` so construction cannot
/// fail.
pub struct MutationWatcher {
    target: Node,
    on_change: Rc<dyn Fn()>,
    observer: Option<(MutationObserver, MutationCallback)>,
    observing: bool,
}

impl MutationWatcher {
    pub fn new(target: Node, on_change: Rc<dyn Fn()>) -> Self {
        Self {
            target,
            on_change,
            observer: None,
            observing: false,
        }
    }

    fn observer(&mut self) -> Result<&MutationObserver, DomError> {
        if self.observer.is_none() {
            let on_change = self.on_change.clone();
            let callback: MutationCallback =
                Closure::new(move |_records: js_sys::Array, _observer: MutationObserver| {
                    on_change()
                });
            let observer =
                MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(js_error)?;
            self.observer = Some((observer, callback));
        }

        match &self.observer {
            Some((observer, _)) => Ok(observer),
            None => Err(DomError::Host("mutation observer unavailable".into())),
        }
    }
}

impl ChangeNotifier for MutationWatcher {
    fn observe(&mut self) -> Result<(), DomError> {
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);

        let target = self.target.clone();
        self.observer()?
            .observe_with_options(&target, &init)
            .map_err(js_error)?;
        self.observing = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some((observer, _)) = &self.observer {
            observer.disconnect();
        }
        self.observing = false;
    }

    fn is_observing(&self) -> bool {
        self.observing
    }
}

impl Drop for MutationWatcher {
    fn drop(&mut self) {
        self.disconnect();
    }
}
