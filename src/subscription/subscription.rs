use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::task::AtomicWaker;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;

use super::hub::{HubShared, SubscriberId};
use crate::error::TryRecvError;

/// A committed state change: the resulting state and the action that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<S, A> {
    pub state: S,
    pub action: A,
}

/// How a subscription buffers transitions its consumer has not read yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubscriptionStrategy {
    /// Keep every transition. The queue grows without bound while the
    /// consumer is parked.
    #[default]
    Every,
    /// Keep only the newest transition. The consumer always sees the most
    /// recent state but may skip intermediate ones.
    Latest,
    /// Keep at most `n` transitions, dropping the oldest. `Bounded(0)`
    /// behaves like `Bounded(1)`.
    Bounded(usize),
}

impl SubscriptionStrategy {
    fn capacity(self) -> Option<usize> {
        match self {
            SubscriptionStrategy::Every => None,
            SubscriptionStrategy::Latest => Some(1),
            SubscriptionStrategy::Bounded(n) => Some(n.max(1)),
        }
    }
}

struct Queue<S, A> {
    items: VecDeque<Transition<S, A>>,
    closed: bool,
    missed: u64,
}

/// Per-subscriber delivery queue.
///
/// Producers push without ever waiting on the consumer; the consumer is woken
/// through an [`AtomicWaker`].
pub(crate) struct Mailbox<S, A> {
    queue: Mutex<Queue<S, A>>,
    waker: AtomicWaker,
    capacity: Option<usize>,
}

impl<S, A> Mailbox<S, A> {
    pub(crate) fn new(strategy: SubscriptionStrategy) -> Self {
        Self {
            queue: Mutex::new(Queue {
                items: VecDeque::new(),
                closed: false,
                missed: 0,
            }),
            waker: AtomicWaker::new(),
            capacity: strategy.capacity(),
        }
    }

    /// Queue a transition. Returns `false` if the mailbox is already closed.
    pub(crate) fn push(&self, transition: Transition<S, A>) -> bool {
        {
            let mut queue = self.queue.lock();
            if queue.closed {
                return false;
            }
            if let Some(capacity) = self.capacity {
                while queue.items.len() >= capacity {
                    queue.items.pop_front();
                    queue.missed += 1;
                    tracing::trace!(missed = queue.missed, "dropped oldest queued transition");
                }
            }
            queue.items.push_back(transition);
        }
        self.waker.wake();
        true
    }

    /// End the sequence. Anything still queued is discarded.
    pub(crate) fn close(&self) {
        {
            let mut queue = self.queue.lock();
            if queue.closed {
                return;
            }
            queue.closed = true;
            queue.items.clear();
        }
        self.waker.wake();
    }

    fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Option<Transition<S, A>>> {
        // Register before inspecting the queue so a concurrent push cannot be missed.
        self.waker.register(cx.waker());
        let mut queue = self.queue.lock();
        if let Some(transition) = queue.items.pop_front() {
            return Poll::Ready(Some(transition));
        }
        if queue.closed {
            return Poll::Ready(None);
        }
        Poll::Pending
    }

    fn try_recv(&self) -> Result<Transition<S, A>, TryRecvError> {
        let mut queue = self.queue.lock();
        match queue.items.pop_front() {
            Some(transition) => Ok(transition),
            None if queue.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    fn missed(&self) -> u64 {
        self.queue.lock().missed
    }

    fn is_closed(&self) -> bool {
        self.queue.lock().closed
    }
}

/// A live feed of a store's transitions.
///
/// Transitions arrive in dispatch order, one independent sequence per
/// subscription. Dropping the subscription unsubscribes it; a
/// [`SubscriptionCloser`] can end it from another task, in which case any
/// pending [`recv`](Subscription::recv) resolves to `None`.
///
/// Unsubscribing while a dispatch is publishing is a race: the transition in
/// flight may or may not be delivered.
pub struct Subscription<S, A> {
    id: SubscriberId,
    mailbox: Arc<Mailbox<S, A>>,
    hub: Weak<HubShared<S, A>>,
}

impl<S, A> Subscription<S, A> {
    pub(crate) fn new(
        id: SubscriberId,
        mailbox: Arc<Mailbox<S, A>>,
        hub: Weak<HubShared<S, A>>,
    ) -> Self {
        Self { id, mailbox, hub }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next transition. `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<Transition<S, A>> {
        self.next().await
    }

    /// Take the next queued transition without waiting.
    pub fn try_recv(&mut self) -> Result<Transition<S, A>, TryRecvError> {
        self.mailbox.try_recv()
    }

    /// Transitions dropped because the buffer was full.
    ///
    /// Always zero for [`SubscriptionStrategy::Every`].
    pub fn missed(&self) -> u64 {
        self.mailbox.missed()
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }

    /// A handle that can end this subscription from elsewhere.
    pub fn closer(&self) -> SubscriptionCloser<S, A> {
        SubscriptionCloser {
            id: self.id,
            mailbox: Arc::downgrade(&self.mailbox),
            hub: Weak::clone(&self.hub),
        }
    }

    /// Stop receiving transitions. Same as dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl<S, A> Drop for Subscription<S, A> {
    fn drop(&mut self) {
        release(self.id, &self.hub);
        self.mailbox.close();
    }
}

impl<S, A> Stream for Subscription<S, A> {
    type Item = Transition<S, A>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.mailbox.poll_next(cx)
    }
}

impl<S, A> fmt::Debug for Subscription<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("missed", &self.missed())
            .finish()
    }
}

/// Ends a [`Subscription`] without owning it.
///
/// Closing is idempotent and safe to call while the store is publishing.
pub struct SubscriptionCloser<S, A> {
    id: SubscriberId,
    mailbox: Weak<Mailbox<S, A>>,
    hub: Weak<HubShared<S, A>>,
}

impl<S, A> SubscriptionCloser<S, A> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn close(&self) {
        release(self.id, &self.hub);
        if let Some(mailbox) = self.mailbox.upgrade() {
            mailbox.close();
        }
    }
}

impl<S, A> Clone for SubscriptionCloser<S, A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            mailbox: Weak::clone(&self.mailbox),
            hub: Weak::clone(&self.hub),
        }
    }
}

impl<S, A> fmt::Debug for SubscriptionCloser<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionCloser")
            .field("id", &self.id)
            .finish()
    }
}

fn release<S, A>(id: SubscriberId, hub: &Weak<HubShared<S, A>>) {
    if let Some(hub) = hub.upgrade() {
        hub.remove(id);
    }
}
