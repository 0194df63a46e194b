use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::Action;
use crate::error::{BoxError, DispatchError};

/// A reducer: folds an action onto the previous state, producing the next one.
///
/// Reducers must not mutate shared data or perform I/O. Returning `Err`
/// aborts the whole dispatch.
pub type Reducer<S, A> = Arc<dyn Fn(&S, &A) -> Result<S, BoxError> + Send + Sync>;

/// Wrap an infallible reducer function.
pub fn reducer<S, A, F>(f: F) -> Reducer<S, A>
where
    S: 'static,
    A: 'static,
    F: Fn(&S, &A) -> S + Send + Sync + 'static,
{
    Arc::new(move |state: &S, action: &A| -> Result<S, BoxError> { Ok(f(state, action)) })
}

/// Wrap a fallible reducer function.
pub fn try_reducer<S, A, E, F>(f: F) -> Reducer<S, A>
where
    S: 'static,
    A: 'static,
    E: Into<BoxError> + 'static,
    F: Fn(&S, &A) -> Result<S, E> + Send + Sync + 'static,
{
    Arc::new(move |state: &S, action: &A| -> Result<S, BoxError> {
        f(state, action).map_err(Into::into)
    })
}

/// Routing table from action kind to the reducers registered for it.
///
/// A store owns its router and never changes it after construction.
pub struct ActionRouter<S, A: Action> {
    routes: HashMap<A::Kind, Vec<Reducer<S, A>>>,
}

impl<S, A: Action> ActionRouter<S, A> {
    /// Create an empty router. Every action passes through unhandled.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register `reducer` for each of `kinds`.
    ///
    /// Reducers registered for the same kind run in registration order. A
    /// kind listed more than once in `kinds` still runs `reducer` once.
    pub fn register<K>(&mut self, kinds: K, reducer: Reducer<S, A>)
    where
        K: IntoIterator<Item = A::Kind>,
    {
        let mut seen = HashSet::new();
        for kind in kinds {
            if !seen.insert(kind) {
                continue;
            }
            self.routes
                .entry(kind)
                .or_default()
                .push(Arc::clone(&reducer));
        }
    }

    /// Reducers registered for the action's exact kind, in registration order.
    ///
    /// Empty when nothing handles the action.
    pub fn resolve(&self, action: &A) -> &[Reducer<S, A>] {
        self.routes
            .get(&action.kind())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any reducer is registered for `kind`.
    pub fn handles(&self, kind: A::Kind) -> bool {
        self.routes.contains_key(&kind)
    }

    /// Fold every resolved reducer over `state`.
    ///
    /// Returns `Ok(None)` when no reducer handles the action. Each reducer
    /// receives the output of the one before it.
    pub fn reduce(&self, state: &S, action: &A) -> Result<Option<S>, DispatchError> {
        let mut reducers = self.resolve(action).iter();
        let Some(first) = reducers.next() else {
            return Ok(None);
        };

        let fail = |source: BoxError| DispatchError::Reducer {
            action: format!("{:?}", action.kind()),
            source,
        };

        let mut next = first(state, action).map_err(fail)?;
        for reducer in reducers {
            next = reducer(&next, action).map_err(fail)?;
        }
        Ok(Some(next))
    }

    /// Number of distinct kinds with at least one reducer.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S, A: Action> Default for ActionRouter<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A: Action> fmt::Debug for ActionRouter<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, reducers) in &self.routes {
            map.entry(kind, &reducers.len());
        }
        map.finish()
    }
}
