//! 忙碌状态计数器：并发请求共享的全局 loading 信号。
//!
//! # Busy-State Counter
//!
//! Concurrent requests finish in arbitrary order, so a plain boolean would hide
//! the indicator when the *first* request completes. The counter keeps it
//! visible until the *last* participating request completes.
//!
//! Invariant: `count > 0` if and only if the indicator is shown. Observers see
//! `on_busy` and `on_idle` strictly alternating, starting with `on_busy`, and
//! always end on the current state. A busy period that opens and closes while
//! another thread is still delivering may be coalesced away.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Receives busy/idle transitions (the loading overlay in the app shell).
///
/// Callbacks run after the count lock is released, so they may read
/// [`BusyCounter::count`] or [`BusyCounter::is_busy`]. They must not call
/// [`BusyCounter::enter`] or [`BusyCounter::exit`] on the counter that is
/// notifying them.
pub trait BusyObserver: Send + Sync {
    fn on_busy(&self);
    fn on_idle(&self);
}

pub struct BusyCounter {
    count: Mutex<usize>,
    /// Last state delivered to observers; held while they run.
    delivered: Mutex<bool>,
    observers: RwLock<Vec<Arc<dyn BusyObserver>>>,
    state: watch::Sender<bool>,
}

impl BusyCounter {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            count: Mutex::new(0),
            delivered: Mutex::new(false),
            observers: RwLock::new(Vec::new()),
            state,
        }
    }

    pub fn with_observer(self, observer: Arc<dyn BusyObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn add_observer(&self, observer: Arc<dyn BusyObserver>) {
        if let Ok(mut observers) = self.observers.write() {
            observers.push(observer);
        }
    }

    /// Increments the count; notifies on 0→1. Returns the new count.
    pub fn enter(&self) -> usize {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        let now = *count;
        if now == 1 {
            debug!("busy");
            self.state.send_replace(true);
            drop(count);
            self.deliver();
        }
        now
    }

    /// Decrements the count, flooring at zero; notifies on 1→0. Returns the new count.
    pub fn exit(&self) -> usize {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            warn!("busy counter exit without matching enter");
            return 0;
        }
        *count -= 1;
        let now = *count;
        if now == 0 {
            debug!("idle");
            self.state.send_replace(false);
            drop(count);
            self.deliver();
        }
        now
    }

    pub fn count(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }

    /// Watch the indicator state (`true` while busy).
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Enters and returns a guard that exits exactly once.
    pub fn guard(self: &Arc<Self>) -> BusyGuard {
        self.enter();
        BusyGuard {
            counter: Some(self.clone()),
        }
    }

    /// Brings observers in line with the current state. Transitions that were
    /// undone before delivery are coalesced, so observers always alternate.
    fn deliver(&self) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        let busy = self.is_busy();
        if busy == *delivered {
            return;
        }
        *delivered = busy;
        if busy {
            self.each_observer(|o| o.on_busy());
        } else {
            self.each_observer(|o| o.on_idle());
        }
    }

    fn each_observer(&self, f: impl Fn(&dyn BusyObserver)) {
        if let Ok(observers) = self.observers.read() {
            for o in observers.iter() {
                f(o.as_ref());
            }
        }
    }
}

impl Default for BusyCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds one unit of the busy count; releasing or dropping it exits once.
#[must_use = "dropping the guard immediately ends the busy period"]
pub struct BusyGuard {
    counter: Option<Arc<BusyCounter>>,
}

impl BusyGuard {
    pub fn release(mut self) {
        if let Some(counter) = self.counter.take() {
            counter.exit();
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Some(counter) = self.counter.take() {
            counter.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder {
        events: StdMutex<Vec<&'static str>>,
    }

    impl BusyObserver for Recorder {
        fn on_busy(&self) {
            self.events.lock().unwrap().push("busy");
        }
        fn on_idle(&self) {
            self.events.lock().unwrap().push("idle");
        }
    }

    #[test]
    fn nested_enters_notify_once() {
        let rec = Arc::new(Recorder::default());
        let counter = BusyCounter::new().with_observer(rec.clone());
        assert_eq!(counter.enter(), 1);
        assert_eq!(counter.enter(), 2);
        assert_eq!(counter.enter(), 3);
        assert_eq!(counter.exit(), 2);
        assert!(counter.is_busy());
        assert_eq!(counter.exit(), 1);
        assert_eq!(counter.exit(), 0);
        assert!(!counter.is_busy());
        assert_eq!(*rec.events.lock().unwrap(), vec!["busy", "idle"]);
    }

    /// Reads the counter from inside its callbacks.
    #[derive(Default)]
    struct Overlay {
        counter: StdMutex<Option<Arc<BusyCounter>>>,
        seen: StdMutex<Vec<(bool, usize)>>,
    }

    impl Overlay {
        fn record(&self) {
            if let Some(counter) = self.counter.lock().unwrap().as_ref() {
                self.seen
                    .lock()
                    .unwrap()
                    .push((counter.is_busy(), counter.count()));
            }
        }
    }

    impl BusyObserver for Overlay {
        fn on_busy(&self) {
            self.record();
        }
        fn on_idle(&self) {
            self.record();
        }
    }

    #[test]
    fn observers_can_read_the_counter() {
        let overlay = Arc::new(Overlay::default());
        let counter = Arc::new(BusyCounter::new());
        counter.add_observer(overlay.clone());
        *overlay.counter.lock().unwrap() = Some(counter.clone());

        let guard = counter.guard();
        guard.release();

        assert_eq!(*overlay.seen.lock().unwrap(), vec![(true, 1), (false, 0)]);
        overlay.counter.lock().unwrap().take();
    }

    #[test]
    fn extra_exits_floor_at_zero_without_renotifying() {
        let rec = Arc::new(Recorder::default());
        let counter = BusyCounter::new().with_observer(rec.clone());
        counter.enter();
        counter.exit();
        assert_eq!(counter.exit(), 0);
        assert_eq!(counter.exit(), 0);
        assert_eq!(counter.count(), 0);
        assert_eq!(*rec.events.lock().unwrap(), vec!["busy", "idle"]);

        // still usable afterwards
        assert_eq!(counter.enter(), 1);
    }

    #[test]
    fn guard_exits_once_on_release_or_drop() {
        let counter = Arc::new(BusyCounter::new());
        let a = counter.guard();
        let b = counter.guard();
        assert_eq!(counter.count(), 2);
        a.release();
        assert_eq!(counter.count(), 1);
        drop(b);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn watch_channel_tracks_state() {
        let counter = BusyCounter::new();
        let rx = counter.subscribe();
        assert!(!*rx.borrow());
        counter.enter();
        assert!(*rx.borrow());
        counter.exit();
        assert!(!*rx.borrow());
    }

    #[test]
    fn thread_safe_balanced_traffic() {
        let counter = Arc::new(BusyCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let g = c.guard();
                        drop(g);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.count(), 0);
    }
}
