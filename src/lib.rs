//! # Unistore
//!
//! Predictable, unidirectional state management for Rust.
//!
//! State lives in a store and only changes when an action is dispatched:
//! - `Action` - Plain data describing an event, routed by its kind
//! - `Reducer` - Pure function folding an action onto the previous state
//! - `Store` - Owns the state, serializes dispatch, publishes every transition
//! - `Subscription` - Async stream of `(state, action)` transitions
//! - `CombinedStore` - Named child stores presented as one state tree
//!
//! ## Example
//!
//! ```
//! use unistore::{Action, Store};
//!
//! #[derive(Clone, Debug)]
//! enum Counter {
//!     Increment,
//!     Decrement,
//! }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum CounterKind {
//!     Increment,
//!     Decrement,
//! }
//!
//! impl Action for Counter {
//!     type Kind = CounterKind;
//!
//!     fn kind(&self) -> CounterKind {
//!         match self {
//!             Counter::Increment => CounterKind::Increment,
//!             Counter::Decrement => CounterKind::Decrement,
//!         }
//!     }
//! }
//!
//! let store = Store::builder(0)
//!     .on(CounterKind::Increment, |n: &i32, _: &Counter| n + 1)
//!     .on(CounterKind::Decrement, |n: &i32, _: &Counter| n - 1)
//!     .build();
//!
//! let mut updates = store.subscribe();
//! store.dispatch(Counter::Increment).unwrap();
//!
//! let transition = futures::executor::block_on(updates.recv()).unwrap();
//! assert_eq!(transition.state, 1);
//! ```

pub mod action;
pub mod error;
pub mod store;
pub mod subscription;

#[cfg(test)]
mod fixtures;

// Re-export main types for convenience
pub use action::{reducer, try_reducer, Action, ActionRouter, Reducer};
pub use error::{BoxError, ComposeError, DispatchError, SubstateError, TryRecvError};
pub use store::{
    CombinedStore, CombinedStoreBuilder, Dispatch, Prepared, StateValue, Store, StoreBuilder,
    Substates,
};
pub use subscription::{
    SubscriberId, Subscription, SubscriptionCloser, SubscriptionHub, SubscriptionStrategy,
    Transition,
};
