//! Observable values with explicit subscription handles.
//!
//! Each piece of UI-facing state lives in an [`Observable`]. Readers hold a
//! [`Subscription`]; dropping it unsubscribes. Publishing never fails, even
//! when nobody is listening.

use std::sync::Arc;

use tokio::sync::watch;

pub struct Observable<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate in place and notify subscribers once.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Handle on an [`Observable`]; unsubscribes when dropped.
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next published value. `None` once the observable is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_values() {
        let value = Observable::new(0u64);
        let mut sub = value.subscribe();
        assert_eq!(value.subscriber_count(), 1);

        value.publish(5);
        assert_eq!(sub.changed().await, Some(5));

        value.update(|v| *v += 1);
        assert_eq!(sub.current(), 6);

        drop(sub);
        assert_eq!(value.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_ignored() {
        let value = Observable::new(vec![1]);
        value.publish(vec![1, 2]);
        assert_eq!(value.get(), vec![1, 2]);
    }

    #[tokio::test]
    async fn subscription_ends_with_the_observable() {
        let value = Observable::new(1u8);
        let mut sub = value.subscribe();
        drop(value);
        assert_eq!(sub.changed().await, None);
    }
}
