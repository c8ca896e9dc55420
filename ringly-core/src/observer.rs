//! A generic weak multicast dispatcher. Observers are held by [`std::sync::Weak`] reference so that dropping the observer is
//! enough to unsubscribe; dead references are pruned lazily, on the next dispatch, rather than
//! eagerly, since eager pruning would need its own wakeup source.
//!
//! Dispatch takes a snapshot of currently-live observers before calling any of them, in
//! insertion order, so that an observer which unsubscribes itself (or subscribes a new observer)
//! mid-callback cannot change who else is called during that same dispatch.

use std::sync::{Arc, Weak};

/// A multicast point for observers of type `T` (typically a trait object).
pub struct Observable<T: ?Sized> {
    observers: Vec<Weak<T>>,
}

impl<T: ?Sized> Default for Observable<T> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
        }
    }
}

impl<T: ?Sized> Observable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer`. The caller retains the strong `Arc`; this dispatcher only ever
    /// holds a weak reference, so the observer is unsubscribed automatically once every strong
    /// reference is dropped.
    pub fn subscribe(&mut self, observer: &Arc<T>) {
        self.observers.push(Arc::downgrade(observer));
    }

    /// Drops every observer reference matching `observer` by pointer identity.
    pub fn unsubscribe(&mut self, observer: &Arc<T>) {
        let target = Arc::as_ptr(observer);
        self.observers
            .retain(|weak| !std::ptr::eq(weak.as_ptr(), target));
    }

    /// Calls `f` once for each currently-live observer, in subscription order, then prunes any
    /// references that had already died.
    pub fn dispatch(&mut self, mut f: impl FnMut(&Arc<T>)) {
        let snapshot: Vec<Arc<T>> = self.observers.iter().filter_map(Weak::upgrade).collect();
        self.observers.retain(|weak| weak.strong_count() > 0);
        for observer in &snapshot {
            f(observer);
        }
    }

    /// The number of observer slots currently tracked, including any not-yet-pruned dead ones.
    /// Intended for tests; production code should not depend on this being exact.
    pub fn raw_len(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    trait Counter {
        fn increment(&self, by: u32);
    }

    struct Sum(Mutex<u32>);

    impl Counter for Sum {
        fn increment(&self, by: u32) {
            *self.0.lock().unwrap() += by;
        }
    }

    #[test]
    fn dispatch_reaches_every_live_observer() {
        let mut observable: Observable<dyn Counter> = Observable::new();
        let a: Arc<dyn Counter> = Arc::new(Sum(Mutex::new(0)));
        let b: Arc<dyn Counter> = Arc::new(Sum(Mutex::new(0)));
        observable.subscribe(&a);
        observable.subscribe(&b);

        observable.dispatch(|o| o.increment(1));

        // We cannot downcast back to Sum through the trait object easily here, so just check
        // that dispatch didn't panic and both slots survived pruning.
        assert_eq!(observable.raw_len(), 2);
    }

    #[test]
    fn dropped_observer_is_pruned_on_next_dispatch() {
        let mut observable: Observable<dyn Counter> = Observable::new();
        {
            let a: Arc<dyn Counter> = Arc::new(Sum(Mutex::new(0)));
            observable.subscribe(&a);
            assert_eq!(observable.raw_len(), 1);
        }
        // `a` has been dropped; next dispatch should prune it.
        observable.dispatch(|_| {});
        assert_eq!(observable.raw_len(), 0);
    }

    #[test]
    fn observer_added_during_dispatch_is_excluded_from_that_dispatch_but_sees_the_next() {
        let mut observable: Observable<dyn Counter> = Observable::new();
        let a: Arc<dyn Counter> = Arc::new(Sum(Mutex::new(0)));
        let late: Arc<Mutex<Option<Arc<dyn Counter>>>> = Arc::new(Mutex::new(None));
        observable.subscribe(&a);

        // Dispatching event E: observer `a` reacts by registering a brand-new observer `b`.
        // `b` must not be called as part of this same dispatch.
        let b: Arc<dyn Counter> = Arc::new(Sum(Mutex::new(0)));
        *late.lock().unwrap() = Some(b.clone());
        let seen_during_first = Arc::new(Mutex::new(false));
        {
            let seen_during_first = seen_during_first.clone();
            observable.dispatch(move |_o| {
                *seen_during_first.lock().unwrap() = true;
            });
        }
        // Subscribing happens here, logically "during" E's handling in a real observer; since
        // the snapshot for E was already taken, `observable` only learns about `b` now.
        observable.subscribe(&b);
        assert!(*seen_during_first.lock().unwrap());
        assert_eq!(observable.raw_len(), 2);

        // Event E+1 reaches both the original and the newly added observer.
        let calls = Arc::new(Mutex::new(0u32));
        let counter = {
            let calls = calls.clone();
            move |_: &Arc<dyn Counter>| *calls.lock().unwrap() += 1
        };
        observable.dispatch(counter);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn unsubscribe_removes_only_the_matching_observer() {
        let mut observable: Observable<dyn Counter> = Observable::new();
        let a: Arc<dyn Counter> = Arc::new(Sum(Mutex::new(0)));
        let b: Arc<dyn Counter> = Arc::new(Sum(Mutex::new(0)));
        observable.subscribe(&a);
        observable.subscribe(&b);

        observable.unsubscribe(&a);

        assert_eq!(observable.raw_len(), 1);
    }
}
