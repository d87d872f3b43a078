use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

const CHANNEL_CAPACITY: usize = 64;

/// A value with a change stream.
///
/// Every `publish` replaces the current value and emits it to every live
/// subscriber exactly once. A new subscriber first receives the value current
/// at subscription time, then every later publication in order.
#[derive(Debug)]
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    value: Mutex<T>,
    tx: broadcast::Sender<T>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Default + Clone> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(initial),
                tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> T {
        self.lock().clone()
    }

    pub fn publish(&self, value: T) {
        let mut current = self.lock();
        *current = value.clone();
        // No subscribers is fine, the value is still kept as current.
        let _ = self.inner.tx.send(value);
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let current = self.lock();
        Subscription {
            replay: Some(current.clone()),
            rx: self.inner.tx.subscribe(),
            source: self.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

#[derive(Debug)]
pub struct Subscription<T> {
    replay: Option<T>,
    rx: broadcast::Receiver<T>,
    source: Observable<T>,
}

impl<T: Clone> Subscription<T> {
    /// Next value, the replayed current one first. Cancel safe.
    pub async fn next(&mut self) -> Option<T> {
        if let Some(value) = self.replay.take() {
            return Some(value);
        }
        match self.rx.recv().await {
            Ok(value) => Some(value),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Subscriber lagged, skipped {skipped} updates");
                self.rx = self.rx.resubscribe();
                Some(self.source.current())
            }
            Err(RecvError::Closed) => None,
        }
    }
}
