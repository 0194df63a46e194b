//! Actions and the routing table that maps them to reducers.
//!
//! An [`Action`] is plain data. Its [`Action::kind`] is the routing key: an
//! [`ActionRouter`] looks reducers up by kind and folds them over the state.

mod action;
mod router;

pub use action::Action;
pub use router::{reducer, try_reducer, ActionRouter, Reducer};
