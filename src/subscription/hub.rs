use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::subscription::{Mailbox, Subscription, SubscriptionStrategy, Transition};

/// Identifies one subscriber of a [`SubscriptionHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct HubShared<S, A> {
    subscribers: Mutex<BTreeMap<SubscriberId, Arc<Mailbox<S, A>>>>,
    next_id: AtomicU64,
}

impl<S, A> HubShared<S, A> {
    pub(crate) fn remove(&self, id: SubscriberId) -> bool {
        // Take the mailbox out first so it is closed without holding the set lock.
        let removed = self.subscribers.lock().remove(&id);
        match removed {
            Some(mailbox) => {
                mailbox.close();
                tracing::debug!(subscriber = %id, "unsubscribed");
                true
            }
            None => false,
        }
    }
}

impl<S, A> Drop for HubShared<S, A> {
    fn drop(&mut self) {
        for mailbox in self.subscribers.get_mut().values() {
            mailbox.close();
        }
    }
}

/// Fan-out of transitions to every live subscriber of one store.
///
/// Each subscriber owns its own queue, so publishing never waits on a
/// consumer and a slow subscriber cannot hold up the others. When the hub is
/// dropped every outstanding subscription ends.
pub struct SubscriptionHub<S, A> {
    shared: Arc<HubShared<S, A>>,
}

impl<S: Clone, A: Clone> SubscriptionHub<S, A> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(HubShared {
                subscribers: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a new subscriber. It receives only transitions published
    /// after this call returns.
    pub fn add_subscriber(&self, strategy: SubscriptionStrategy) -> Subscription<S, A> {
        let id = SubscriberId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let mailbox = Arc::new(Mailbox::new(strategy));
        self.shared
            .subscribers
            .lock()
            .insert(id, Arc::clone(&mailbox));
        tracing::debug!(subscriber = %id, ?strategy, "subscribed");
        Subscription::new(id, mailbox, Arc::downgrade(&self.shared))
    }

    /// Remove a subscriber and end its sequence.
    ///
    /// Returns `false` if it was already gone. Safe to call from code that is
    /// handling one of that subscriber's transitions.
    pub fn remove_subscriber(&self, id: SubscriberId) -> bool {
        self.shared.remove(id)
    }

    /// Deliver `(state, action)` to every subscriber registered at the time
    /// of the call. Returns how many accepted it.
    pub fn publish(&self, state: &S, action: &A) -> usize {
        let targets: Vec<Arc<Mailbox<S, A>>> =
            self.shared.subscribers.lock().values().cloned().collect();

        targets
            .iter()
            .filter(|mailbox| {
                mailbox.push(Transition {
                    state: state.clone(),
                    action: action.clone(),
                })
            })
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.lock().len()
    }
}

impl<S: Clone, A: Clone> Default for SubscriptionHub<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> fmt::Debug for SubscriptionHub<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("subscribers", &self.shared.subscribers.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TryRecvError;
    use futures::executor::block_on;
    use std::sync::Barrier;
    use std::thread;

    type Hub = SubscriptionHub<i32, &'static str>;

    #[test]
    fn publish_reaches_every_subscriber() {
        let hub = Hub::new();
        let mut first = hub.add_subscriber(SubscriptionStrategy::Every);
        let mut second = hub.add_subscriber(SubscriptionStrategy::Every);

        assert_eq!(hub.publish(&1, &"inc"), 2);
        assert_eq!(hub.publish(&2, &"inc"), 2);

        for subscription in [&mut first, &mut second] {
            assert_eq!(subscription.try_recv().unwrap().state, 1);
            assert_eq!(subscription.try_recv().unwrap().state, 2);
            assert_eq!(subscription.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[test]
    fn late_subscriber_sees_only_later_transitions() {
        let hub = Hub::new();
        let mut early = hub.add_subscriber(SubscriptionStrategy::Every);
        hub.publish(&1, &"inc");
        let mut late = hub.add_subscriber(SubscriptionStrategy::Every);
        hub.publish(&2, &"inc");

        assert_eq!(early.try_recv().unwrap().state, 1);
        assert_eq!(early.try_recv().unwrap().state, 2);
        assert_eq!(late.try_recv().unwrap().state, 2);
        assert_eq!(late.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn remove_is_idempotent_and_ends_the_stream() {
        let hub = Hub::new();
        let mut subscription = hub.add_subscriber(SubscriptionStrategy::Every);
        let id = subscription.id();

        assert!(hub.remove_subscriber(id));
        assert!(!hub.remove_subscriber(id));
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(&1, &"inc"), 0);
        assert_eq!(block_on(subscription.recv()), None);
    }

    #[test]
    fn dropping_subscription_unregisters_it() {
        let hub = Hub::new();
        let subscription = hub.add_subscriber(SubscriptionStrategy::Latest);
        assert_eq!(hub.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn dropping_hub_closes_subscriptions() {
        let hub = Hub::new();
        let mut subscription = hub.add_subscriber(SubscriptionStrategy::Every);
        hub.publish(&1, &"inc");

        drop(hub);
        assert!(subscription.is_closed());
        assert_eq!(block_on(subscription.recv()), None);
        // Closing after the hub is gone is still fine.
        subscription.closer().close();
    }

    #[test]
    fn close_during_concurrent_publish() {
        let hub = Arc::new(Hub::new());
        let mut subscription = hub.add_subscriber(SubscriptionStrategy::Every);
        let _bystander = hub.add_subscriber(SubscriptionStrategy::Latest);
        let closer = subscription.closer();
        let start = Arc::new(Barrier::new(2));

        let publisher = {
            let hub = Arc::clone(&hub);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for n in 0..100_000 {
                    hub.publish(&n, &"inc");
                }
            })
        };

        start.wait();
        closer.close();
        closer.close();
        publisher.join().unwrap();

        assert_eq!(block_on(subscription.recv()), None);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let hub = Hub::new();
        let a = hub.add_subscriber(SubscriptionStrategy::Every);
        let b = hub.add_subscriber(SubscriptionStrategy::Every);

        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string(), "#1");
    }
}
