use std::fmt;

use crate::action::Action;
use crate::error::DispatchError;
use crate::subscription::{Subscription, SubscriptionStrategy};

/// The contract shared by [`Store`](crate::Store) and
/// [`CombinedStore`](crate::CombinedStore).
///
/// Dispatch is two-phase. [`prepare`](Dispatch::prepare) takes the store's
/// dispatch lock and computes the next state without committing it; the
/// returned [`Prepared`] either commits (swap state, publish the transition)
/// or, when dropped, abandons the dispatch and releases the lock. A combined
/// store prepares every child before committing any of them.
pub trait Dispatch: Send + Sync {
    type State: Clone + Send + Sync + 'static;
    type Action: Action;

    /// Stage the next state for `action` while holding the dispatch lock.
    fn prepare(
        &self,
        action: &Self::Action,
    ) -> Result<Prepared<'_, Self::State, Self::Action>, DispatchError>;

    /// Latest committed state.
    fn state(&self) -> Self::State;

    /// Subscribe with the store's default strategy.
    fn subscribe(&self) -> Subscription<Self::State, Self::Action>;

    fn subscribe_with(
        &self,
        strategy: SubscriptionStrategy,
    ) -> Subscription<Self::State, Self::Action>;

    /// Identity of the dispatch lock taken by `prepare`.
    ///
    /// Handles sharing one lock must return the same value. Combined stores
    /// prepare their children in ascending `lock_id` order, so stores shared
    /// between several combined stores are always locked in the same order.
    fn lock_id(&self) -> usize {
        (self as *const Self).cast::<()>() as usize
    }

    /// Reduce `action`, commit the result and publish it.
    ///
    /// On error nothing is committed and nothing is published.
    fn dispatch(&self, action: Self::Action) -> Result<Self::State, DispatchError> {
        let prepared = self.prepare(&action)?;
        Ok(prepared.commit(&action))
    }
}

/// A staged dispatch that still holds its store's dispatch lock.
///
/// Commit it to apply the new state, drop it to abandon the dispatch.
#[must_use = "a prepared dispatch does nothing unless committed"]
pub struct Prepared<'a, S, A> {
    state: S,
    reduced: bool,
    commit: Box<dyn FnOnce(&S, &A) + 'a>,
}

impl<'a, S, A> Prepared<'a, S, A> {
    /// `reduced` is false when no reducer handled the action; `state` is then
    /// the unchanged current state and committing publishes nothing.
    pub fn new(state: S, reduced: bool, commit: impl FnOnce(&S, &A) + 'a) -> Self {
        Self {
            state,
            reduced,
            commit: Box::new(commit),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn is_reduced(&self) -> bool {
        self.reduced
    }

    /// Apply the staged state and return it.
    pub fn commit(self, action: &A) -> S {
        let Prepared { state, commit, .. } = self;
        commit(&state, action);
        state
    }
}

impl<S, A> fmt::Debug for Prepared<'_, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prepared")
            .field("reduced", &self.reduced)
            .finish_non_exhaustive()
    }
}
