//! 请求指纹注册表：追踪进行中的请求，并取消被新请求覆盖的重复请求。
//!
//! # Pending Request Registry
//!
//! Every deduplicated call registers under its [`Fingerprint`]. Registering a
//! fingerprint that is already live cancels the older call first, so two
//! identical requests are never in flight at once.
//!
//! Entries carry a registration id. Releasing a call that has already been
//! superseded leaves the newer entry under the same fingerprint untouched.

mod fingerprint;

pub use fingerprint::Fingerprint;

use crate::request::RequestDescriptor;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle for one registered call.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    fingerprint: Fingerprint,
    id: u64,
    token: CancellationToken,
}

impl PendingRequest {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct PendingEntry {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: Mutex<HashMap<Fingerprint, PendingEntry>>,
    next_id: AtomicU64,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: &RequestDescriptor) -> PendingRequest {
        self.register_fingerprint(Fingerprint::of(descriptor))
    }

    /// Cancels any live call with the same fingerprint, then registers a fresh one.
    pub fn register_fingerprint(&self, fingerprint: Fingerprint) -> PendingRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let mut entries = self.lock();
        if let Some(previous) = entries.insert(
            fingerprint.clone(),
            PendingEntry {
                id,
                token: token.clone(),
            },
        ) {
            debug!(fingerprint = %fingerprint, "superseding in-flight duplicate");
            previous.token.cancel();
        }
        PendingRequest {
            fingerprint,
            id,
            token,
        }
    }

    /// Settles a call: cancels its token (no-op once finished) and removes its
    /// entry if it is still the live one. Returns whether an entry was removed.
    pub fn release(&self, pending: &PendingRequest) -> bool {
        pending.token.cancel();
        let mut entries = self.lock();
        match entries.get(&pending.fingerprint) {
            Some(entry) if entry.id == pending.id => {
                entries.remove(&pending.fingerprint);
                true
            }
            _ => false,
        }
    }

    /// Cancels and forgets every live call. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PendingEntry> = self.lock().drain().map(|(_, e)| e).collect();
        for entry in &drained {
            entry.token.cancel();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "cancelled all pending requests");
        }
        drained.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().contains_key(fingerprint)
    }

    /// Registers and returns a guard that releases exactly once.
    pub fn guard(self: &Arc<Self>, descriptor: &RequestDescriptor) -> PendingGuard {
        PendingGuard {
            pending: self.register(descriptor),
            registry: Some(self.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, PendingEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a call registered; releasing or dropping it settles the entry once.
#[must_use = "dropping the guard immediately releases the registration"]
pub struct PendingGuard {
    pending: PendingRequest,
    registry: Option<Arc<PendingRegistry>>,
}

impl PendingGuard {
    pub fn pending(&self) -> &PendingRequest {
        &self.pending
    }

    pub fn token(&self) -> &CancellationToken {
        &self.pending.token
    }

    pub fn release(mut self) {
        if let Some(registry) = self.registry.take() {
            registry.release(&self.pending);
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.release(&self.pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list_request(page: u32) -> RequestDescriptor {
        RequestDescriptor::get("/user/list").with_query_value(json!({ "page": page }))
    }

    #[test]
    fn duplicate_cancels_older_and_keeps_one_entry() {
        let registry = PendingRegistry::new();
        let first = registry.register(&list_request(1));
        let second = registry.register(&list_request(1));
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.pending_count(), 1);
        assert!(registry.contains(second.fingerprint()));
    }

    #[test]
    fn different_requests_coexist() {
        let registry = PendingRegistry::new();
        let a = registry.register(&list_request(1));
        let b = registry.register(&list_request(2));
        assert!(!a.is_cancelled());
        assert!(!b.is_cancelled());
        assert_eq!(registry.pending_count(), 2);
    }

    #[test]
    fn releasing_superseded_call_keeps_newer_entry() {
        let registry = PendingRegistry::new();
        let first = registry.register(&list_request(1));
        let second = registry.register(&list_request(1));
        assert!(!registry.release(&first));
        assert_eq!(registry.pending_count(), 1);
        assert!(!second.is_cancelled());
        assert!(registry.release(&second));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let registry = PendingRegistry::new();
        let p = registry.register(&list_request(1));
        assert!(registry.release(&p));
        assert!(!registry.release(&p));
        assert!(p.is_cancelled());
    }

    #[test]
    fn cancel_all_clears_everything() {
        let registry = PendingRegistry::new();
        let handles: Vec<_> = (0..5).map(|i| registry.register(&list_request(i))).collect();
        assert_eq!(registry.cancel_all(), 5);
        assert_eq!(registry.pending_count(), 0);
        assert!(handles.iter().all(PendingRequest::is_cancelled));
        assert_eq!(registry.cancel_all(), 0);
    }

    #[test]
    fn guard_releases_on_drop() {
        let registry = Arc::new(PendingRegistry::new());
        {
            let g = registry.guard(&list_request(1));
            assert_eq!(registry.pending_count(), 1);
            assert!(!g.token().is_cancelled());
        }
        assert_eq!(registry.pending_count(), 0);

        let g = registry.guard(&list_request(1));
        let token = g.token().clone();
        g.release();
        assert!(token.is_cancelled());
        assert_eq!(registry.pending_count(), 0);
    }
}
