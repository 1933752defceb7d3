//! Notifications posted to the page

use gloss_core::{EventSink, Notification};
use web_sys::Window;

/// Posts each notification to the window as a plain object, for content
/// scripts and side panels listening for `message` events.
pub struct PostMessageSink {
    window: Window,
}

impl PostMessageSink {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl EventSink for PostMessageSink {
    fn publish(&self, notification: &Notification) {
        let json = match notification.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Could not serialize notification: {}", e);
                return;
            }
        };

        let message = match js_sys::JSON::parse(&json) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not convert notification: {:?}", e);
                return;
            }
        };

        if let Err(e) = self.window.post_message(&message, "*") {
            tracing::warn!("postMessage failed: {:?}", e);
        }
    }
}
