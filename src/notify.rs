//! 通知与导航模块：错误提示与登录跳转的外部协作者接口。
//!
//! Notification and navigation collaborators.
//!
//! The pipeline never renders anything itself. User-visible feedback goes
//! through a [`NotificationSink`] (a toast in the app shell) and the post-401
//! redirect goes through a [`Navigator`]. Both are fire-and-forget.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TracingNotificationSink`] | Default sink, logs through `tracing` |
//! | [`InMemoryNotificationSink`] | Records notifications for testing |
//! | [`TracingNavigator`] | Default navigator, logs the redirect |
//! | [`InMemoryNavigator`] | Records redirects for testing |

use crate::classifier::ErrorKind;
use std::sync::{Arc, RwLock};

/// Destination for user-facing failure notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: ErrorKind, text: &str);
}

/// Destination for the login redirect scheduled after a 401.
pub trait Navigator: Send + Sync {
    fn redirect_to(&self, path: &str);
}

/// A notification as seen by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: ErrorKind,
    pub text: String,
}

/// Logs notifications at warn level.
#[derive(Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, kind: ErrorKind, text: &str) {
        tracing::warn!(kind = %kind, "{}", text);
    }
}

/// In-memory sink for testing.
pub struct InMemoryNotificationSink {
    events: Arc<RwLock<Vec<Notification>>>,
    max_events: usize,
}

impl InMemoryNotificationSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max,
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.notifications().into_iter().map(|n| n.text).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryNotificationSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, kind: ErrorKind, text: &str) {
        if let Ok(mut events) = self.events.write() {
            events.push(Notification {
                kind,
                text: text.to_string(),
            });
            if events.len() > self.max_events {
                events.remove(0);
            }
        }
    }
}

/// Logs the redirect instead of performing it; suits services and the probe binary.
#[derive(Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect_to(&self, path: &str) {
        tracing::info!(path, "redirect requested");
    }
}

/// Records redirects for testing.
#[derive(Default)]
pub struct InMemoryNavigator {
    redirects: RwLock<Vec<String>>,
}

impl InMemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Navigator for InMemoryNavigator {
    fn redirect_to(&self, path: &str) {
        if let Ok(mut redirects) = self.redirects.write() {
            redirects.push(path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_keeps_most_recent() {
        let sink = InMemoryNotificationSink::new(2);
        sink.notify(ErrorKind::Network, "a");
        sink.notify(ErrorKind::Timeout, "b");
        sink.notify(ErrorKind::Business, "c");
        assert_eq!(sink.texts(), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(sink.notifications()[1].kind, ErrorKind::Business);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn in_memory_navigator_records_paths() {
        let nav = InMemoryNavigator::new();
        nav.redirect_to("/login");
        assert_eq!(nav.redirects(), vec!["/login".to_string()]);
    }
}
