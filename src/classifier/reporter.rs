//! Effectful half of error handling: notifications and session expiry.

use super::{AllowList, ErrorRecord};
use crate::notify::{Navigator, NotificationSink};
use crate::session::CredentialSource;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// What the reporter did with a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    pub notified: bool,
    /// This record claimed the session-expiry handling (credential clear + redirect).
    pub session_expired: bool,
}

/// Applies the side effects for a classified failure.
///
/// Gates, in order:
/// - cancelled records are logged at debug and otherwise ignored
/// - allow-listed URLs produce no effects at all
/// - a 401 clears the credential and schedules one redirect per session
/// - the notice goes to the sink unless the call opted out
#[derive(Clone)]
pub struct ErrorReporter {
    allow_list: AllowList,
    notifier: Arc<dyn NotificationSink>,
    credentials: Arc<dyn CredentialSource>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    redirect_delay: Duration,
    /// Set once a session has been expired; a later 401 only counts once a
    /// credential is present again.
    session_expired: Arc<Mutex<bool>>,
}

impl ErrorReporter {
    pub fn new(
        allow_list: AllowList,
        notifier: Arc<dyn NotificationSink>,
        credentials: Arc<dyn CredentialSource>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            allow_list,
            notifier,
            credentials,
            navigator,
            login_path: "/login".to_string(),
            redirect_delay: Duration::from_millis(1500),
            session_expired: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn report(&self, record: &ErrorRecord, notify_on_error: bool) -> ReportOutcome {
        let mut outcome = ReportOutcome::default();

        if !record.kind.is_error() {
            debug!(url = %record.url, "request cancelled");
            return outcome;
        }

        if self.allow_list.matches(&record.url) {
            debug!(url = %record.url, kind = %record.kind, "failure on allow-listed endpoint");
            return outcome;
        }

        warn!(
            url = %record.url,
            kind = %record.kind,
            answered = record.kind.has_response(),
            http_status = ?record.http_status,
            business_code = ?record.business_code,
            "request failed: {}",
            record.message
        );

        if record.is_session_expired() {
            outcome.session_expired = self.expire_session();
        }

        if notify_on_error {
            if let Some(notice) = record.notice.as_deref() {
                self.notifier.notify(record.kind, notice);
                outcome.notified = true;
            }
        }

        outcome
    }

    /// Clears the credential and schedules the login redirect, unless this
    /// session was already expired and nobody has signed in since. Returns
    /// whether this call did the work.
    fn expire_session(&self) -> bool {
        {
            let mut expired = self
                .session_expired
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *expired && self.credentials.token().is_none() {
                debug!("session already expired");
                return false;
            }
            *expired = true;
            // Cleared under the lock so a concurrent 401 sees no credential.
            self.credentials.clear_token();
        }

        let navigator = self.navigator.clone();
        let path = self.login_path.clone();
        let delay = self.redirect_delay;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.redirect_to(&path);
                });
            }
            Err(_) => {
                // Outside a runtime there is nothing to schedule on.
                navigator.redirect_to(&path);
            }
        }
        true
    }
}
