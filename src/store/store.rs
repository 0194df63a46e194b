use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::dispatch::{Dispatch, Prepared};
use crate::action::{reducer, try_reducer, Action, ActionRouter, Reducer};
use crate::error::{BoxError, DispatchError};
use crate::subscription::{Subscription, SubscriptionHub, SubscriptionStrategy};

/// A thread-safe state container driven by actions.
///
/// `dispatch` is serialized per store: resolving reducers, folding them,
/// swapping the state and publishing the transition happen under one lock.
/// Reading the state never waits for a fold in progress.
///
/// Reducers must not dispatch to the store they belong to; that deadlocks.
///
/// # Example
///
/// ```
/// use unistore::{Action, Store};
///
/// #[derive(Clone, Debug)]
/// struct Increment;
///
/// impl Action for Increment {
///     type Kind = ();
///     fn kind(&self) {}
/// }
///
/// let store = Store::builder(0)
///     .on((), |count: &i32, _: &Increment| count + 1)
///     .build();
///
/// assert_eq!(store.dispatch(Increment).unwrap(), 1);
/// assert_eq!(store.state(), 1);
/// ```
pub struct Store<S, A: Action> {
    inner: Arc<StoreInner<S, A>>,
}

struct StoreInner<S, A: Action> {
    name: Option<String>,
    state: RwLock<S>,
    dispatch_lock: Mutex<()>,
    router: ActionRouter<S, A>,
    hub: SubscriptionHub<S, A>,
    strategy: SubscriptionStrategy,
}

impl<S, A: Action> StoreInner<S, A> {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("store")
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Create a store from an initial state and a finished router.
    pub fn new(initial: S, router: ActionRouter<S, A>) -> Self {
        StoreBuilder {
            initial,
            name: None,
            router,
            strategy: SubscriptionStrategy::default(),
        }
        .build()
    }

    pub fn builder(initial: S) -> StoreBuilder<S, A> {
        StoreBuilder {
            initial,
            name: None,
            router: ActionRouter::new(),
            strategy: SubscriptionStrategy::default(),
        }
    }

    /// Fold `action` through its reducers, commit and publish the result.
    ///
    /// An action no reducer handles leaves the state unchanged and publishes
    /// nothing. If a reducer fails the error is returned and the state is
    /// left exactly as it was.
    pub fn dispatch(&self, action: A) -> Result<S, DispatchError> {
        Dispatch::dispatch(self, action)
    }

    /// Get a clone of the current state.
    pub fn state(&self) -> S {
        self.inner.state.read().clone()
    }

    /// Read state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.inner.state.read();
        f(&state)
    }

    /// Subscribe to transitions using the store's default strategy.
    pub fn subscribe(&self) -> Subscription<S, A> {
        self.subscribe_with(self.inner.strategy)
    }

    pub fn subscribe_with(&self, strategy: SubscriptionStrategy) -> Subscription<S, A> {
        self.inner.hub.add_subscriber(strategy)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.hub.subscriber_count()
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn router(&self) -> &ActionRouter<S, A> {
        &self.inner.router
    }
}

impl<S, A> Dispatch for Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    type State = S;
    type Action = A;

    fn prepare(&self, action: &A) -> Result<Prepared<'_, S, A>, DispatchError> {
        let inner = &*self.inner;
        let guard = inner.dispatch_lock.lock();

        let reduced = {
            let current = inner.state.read();
            inner.router.reduce(&current, action)
        };
        let next = match reduced {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(
                    store = inner.label(),
                    kind = ?action.kind(),
                    error = %err,
                    "reducer failed, state unchanged"
                );
                return Err(err);
            }
        };

        let Some(next) = next else {
            tracing::debug!(store = inner.label(), kind = ?action.kind(), "unhandled action");
            let current = inner.state.read().clone();
            return Ok(Prepared::new(current, false, move |_, _| drop(guard)));
        };

        Ok(Prepared::new(next, true, move |state: &S, action: &A| {
            *inner.state.write() = state.clone();
            let notified = inner.hub.publish(state, action);
            tracing::debug!(
                store = inner.label(),
                kind = ?action.kind(),
                notified,
                "dispatched"
            );
            drop(guard);
        }))
    }

    fn state(&self) -> S {
        Store::state(self)
    }

    fn subscribe(&self) -> Subscription<S, A> {
        Store::subscribe(self)
    }

    fn subscribe_with(&self, strategy: SubscriptionStrategy) -> Subscription<S, A> {
        Store::subscribe_with(self, strategy)
    }

    fn lock_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl<S, A: Action> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Declares a [`Store`]: its initial state, reducers and options.
pub struct StoreBuilder<S, A: Action> {
    initial: S,
    name: Option<String>,
    router: ActionRouter<S, A>,
    strategy: SubscriptionStrategy,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Name used in log output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Register a reducer for one action kind.
    pub fn on<F>(self, kind: A::Kind, f: F) -> Self
    where
        F: Fn(&S, &A) -> S + Send + Sync + 'static,
    {
        self.reducer([kind], reducer(f))
    }

    /// Register one reducer for several action kinds.
    pub fn on_any<K, F>(self, kinds: K, f: F) -> Self
    where
        K: IntoIterator<Item = A::Kind>,
        F: Fn(&S, &A) -> S + Send + Sync + 'static,
    {
        self.reducer(kinds, reducer(f))
    }

    /// Register a fallible reducer for one action kind.
    pub fn try_on<E, F>(self, kind: A::Kind, f: F) -> Self
    where
        E: Into<BoxError> + 'static,
        F: Fn(&S, &A) -> Result<S, E> + Send + Sync + 'static,
    {
        self.reducer([kind], try_reducer(f))
    }

    pub fn try_on_any<K, E, F>(self, kinds: K, f: F) -> Self
    where
        K: IntoIterator<Item = A::Kind>,
        E: Into<BoxError> + 'static,
        F: Fn(&S, &A) -> Result<S, E> + Send + Sync + 'static,
    {
        self.reducer(kinds, try_reducer(f))
    }

    pub fn reducer<K>(mut self, kinds: K, reducer: Reducer<S, A>) -> Self
    where
        K: IntoIterator<Item = A::Kind>,
    {
        self.router.register(kinds, reducer);
        self
    }

    /// Strategy used by [`Store::subscribe`]. Defaults to
    /// [`SubscriptionStrategy::Every`].
    pub fn default_strategy(mut self, strategy: SubscriptionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> Store<S, A> {
        Store {
            inner: Arc::new(StoreInner {
                name: self.name,
                state: RwLock::new(self.initial),
                dispatch_lock: Mutex::new(()),
                router: self.router,
                hub: SubscriptionHub::new(),
                strategy: self.strategy,
            }),
        }
    }
}
