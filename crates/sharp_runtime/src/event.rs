//! One-shot initialization notification

use parking_lot::Mutex;

type Listener = Box<dyn FnOnce() + Send>;

/// Observer list that fires exactly once
///
/// Listeners added after the event fired run immediately on the
/// subscribing thread. Each listener runs at most once and is then dropped.
#[derive(Default)]
pub struct OnceEvent {
    state: Mutex<OnceState>,
}

#[derive(Default)]
struct OnceState {
    fired: bool,
    listeners: Vec<Listener>,
}

impl OnceEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `listener` when the event fires, or now if it already has
    pub fn subscribe(&self, listener: impl FnOnce() + Send + 'static) {
        let mut state = self.state.lock();
        if state.fired {
            drop(state);
            listener();
        } else {
            state.listeners.push(Box::new(listener));
        }
    }

    /// Fire the event; later calls do nothing
    ///
    /// Listeners run outside the lock so they may subscribe again.
    pub fn fire(&self) -> bool {
        let listeners = {
            let mut state = self.state.lock();
            if state.fired {
                return false;
            }
            state.fired = true;
            std::mem::take(&mut state.listeners)
        };

        for listener in listeners {
            listener();
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.state.lock().fired
    }

    /// Listeners still waiting
    pub fn pending(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fires_once() {
        let event = OnceEvent::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        event.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(event.pending(), 1);

        assert!(event.fire());
        assert!(!event.fire());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event.pending(), 0);
    }

    #[test]
    fn test_late_subscriber_runs_immediately() {
        let event = OnceEvent::new();
        event.fire();

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        event.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event.pending(), 0);
        assert!(event.has_fired());
    }

    #[test]
    fn test_listener_can_resubscribe() {
        let event = Arc::new(OnceEvent::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let inner_event = event.clone();
        let c = calls.clone();
        event.subscribe(move || {
            let c2 = c.clone();
            inner_event.subscribe(move || {
                c2.fetch_add(1, Ordering::SeqCst);
            });
        });

        event.fire();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
