//! Stores: the dispatch and commit runtime.
//!
//! A [`Store`] owns one state value and the reducers that fold actions onto
//! it. A [`CombinedStore`] presents several child stores as one state tree.
//! Both implement [`Dispatch`], so combined stores nest.

mod combined;
mod dispatch;
mod store;
mod substates;

pub use combined::{CombinedStore, CombinedStoreBuilder};
pub use dispatch::{Dispatch, Prepared};
pub use store::{Store, StoreBuilder};
pub use substates::{StateValue, Substates};
