//! Broadcasting committed transitions to subscribers.
//!
//! Every store owns a [`SubscriptionHub`]. Each call to `subscribe` registers
//! a [`Subscription`] with its own queue; publishing pushes a copy of the
//! [`Transition`] into every queue and returns immediately.

mod hub;
mod subscription;

pub use hub::{SubscriberId, SubscriptionHub};
pub use subscription::{Subscription, SubscriptionCloser, SubscriptionStrategy, Transition};
