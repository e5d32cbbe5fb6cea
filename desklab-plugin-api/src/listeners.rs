//! Change listeners with unsubscribe tokens

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;
type Slots<A> = RwLock<Vec<(u64, Callback<A>)>>;

/// An ordered list of callbacks invoked with a borrowed argument.
///
/// Callbacks are snapshotted before they run, so a callback may subscribe,
/// unsubscribe, or re-enter the owner's read APIs.
pub struct Listeners<A: ?Sized + 'static> {
    next_id: AtomicU64,
    slots: Arc<Slots<A>>,
}

impl<A: ?Sized + 'static> Listeners<A> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            slots: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a callback. It stays registered until the returned token is
    /// dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe(&self, callback: impl Fn(&A) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Callback<A> = Arc::new(callback);
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, callback));

        let slots: Weak<Slots<A>> = Arc::downgrade(&self.slots);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(slots) = slots.upgrade() {
                    slots
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(slot_id, _)| *slot_id != id);
                }
            })),
        }
    }

    /// Invoke every callback in subscription order
    pub fn notify(&self, arg: &A) {
        let snapshot: Vec<Callback<A>> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(arg);
        }
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: ?Sized + 'static> Default for Listeners<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsubscribe token returned by `add_listener` calls.
///
/// Dropping the token removes the listener.
#[must_use = "dropping a Subscription immediately removes the listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_reaches_every_subscriber() {
        let listeners: Listeners<u32> = Listeners::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = Arc::clone(&total);
        let _a = listeners.subscribe(move |n| {
            t1.fetch_add(*n as usize, Ordering::SeqCst);
        });
        let t2 = Arc::clone(&total);
        let _b = listeners.subscribe(move |n| {
            t2.fetch_add(*n as usize * 10, Ordering::SeqCst);
        });

        listeners.notify(&2);
        assert_eq!(total.load(Ordering::SeqCst), 22);
    }

    #[test]
    fn test_unsubscribe_and_drop_remove_listener() {
        let listeners: Listeners<()> = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let explicit = listeners.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = Arc::clone(&calls);
        let dropped = listeners.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(listeners.len(), 2);

        explicit.unsubscribe();
        drop(dropped);
        assert!(listeners.is_empty());

        listeners.notify(&());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_outliving_listeners_is_harmless() {
        let listeners: Listeners<()> = Listeners::new();
        let sub = listeners.subscribe(|_| {});
        drop(listeners);
        drop(sub);
    }

    #[test]
    fn test_slice_argument() {
        let listeners: Listeners<[String]> = Listeners::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        let _sub = listeners.subscribe(move |items: &[String]| {
            s.store(items.len(), Ordering::SeqCst);
        });
        listeners.notify(&["a".to_string(), "b".to_string()][..]);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
