//! Outcome reporter
//!
//! Compiles per-request outcomes into a [`BatchReport`] and publishes
//! notifications to whoever is listening: a side panel, persistence,
//! telemetry.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AnnotationRequest, AttemptOutcome, BatchReport};

/// Message published to collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    HighlightReport {
        report: BatchReport,
        /// Set when the report comes from a supervised replay
        replay: bool,
        published_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    HighlightActivated {
        #[serde(rename = "highlight")]
        request: AnnotationRequest,
        matched_text: String,
    },
}

impl Notification {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub trait EventSink {
    fn publish(&self, notification: &Notification);
}

impl<F: Fn(&Notification)> EventSink for F {
    fn publish(&self, notification: &Notification) {
        self(notification)
    }
}

/// Sink that records every notification; clones share the record
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    published: Rc<RefCell<Vec<Notification>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.published.borrow().clone()
    }

    pub fn reports(&self) -> Vec<BatchReport> {
        self.published
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::HighlightReport { report, .. } => Some(report.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn activations(&self) -> Vec<(AnnotationRequest, String)> {
        self.published
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::HighlightActivated {
                    request,
                    matched_text,
                } => Some((request.clone(), matched_text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.published.borrow_mut().clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, notification: &Notification) {
        self.published.borrow_mut().push(notification.clone());
    }
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&self, notification: &Notification) {
        match notification {
            Notification::HighlightReport { report, replay, .. } => tracing::info!(
                "Highlight report{}: {}/{} placed",
                if *replay { " (replay)" } else { "" },
                report.succeeded,
                report.total
            ),
            Notification::HighlightActivated { request, .. } => {
                tracing::info!("Highlight {} activated", request.id)
            }
        }
    }
}

pub struct Reporter {
    sink: Box<dyn EventSink>,
}

impl Reporter {
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn compile(&self, attempts: Vec<AttemptOutcome>) -> BatchReport {
        let report = BatchReport::from_attempts(attempts);
        tracing::info!(
            "Placed {} of {} annotation(s), {} failed",
            report.succeeded,
            report.total,
            report.failed
        );
        report
    }

    pub fn publish_report(&self, report: &BatchReport, replay: bool) {
        self.sink.publish(&Notification::HighlightReport {
            report: report.clone(),
            replay,
            published_at: Utc::now(),
        });
    }

    pub fn publish_activation(&self, request: &AnnotationRequest, matched_text: &str) {
        self.sink.publish(&Notification::HighlightActivated {
            request: request.clone(),
            matched_text: matched_text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    #[test]
    fn test_report_notification_wire_shape() {
        let sink = MemorySink::new();
        let reporter = Reporter::new(Box::new(sink.clone()));
        let report = reporter.compile(vec![]);
        reporter.publish_report(&report, false);

        let json = sink.notifications()[0].to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "HIGHLIGHT_REPORT");
        assert_eq!(value["report"]["total"], 0);
        assert!(value.get("publishedAt").is_some());
    }

    #[test]
    fn test_activation_notification_wire_shape() {
        let sink = MemorySink::new();
        let reporter = Reporter::new(Box::new(sink.clone()));
        let request = AnnotationRequest::new(Category::Omission, "t", "e").with_id("r9");
        reporter.publish_activation(&request, "matched");

        let value = serde_json::to_value(&sink.notifications()[0]).unwrap();
        assert_eq!(value["type"], "HIGHLIGHT_ACTIVATED");
        assert_eq!(value["highlight"]["id"], "r9");
        assert_eq!(value["matchedText"], "matched");
        assert_eq!(sink.activations().len(), 1);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        let reporter = Reporter::new(Box::new(move |_: &Notification| {
            *counter.borrow_mut() += 1;
        }));
        reporter.publish_report(&BatchReport::empty(), true);
        assert_eq!(*seen.borrow(), 1);
    }
}
