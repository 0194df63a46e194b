use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::dispatch::{Dispatch, Prepared};
use super::substates::{StateValue, Substates};
use crate::action::Action;
use crate::error::{ComposeError, DispatchError, SubstateError};
use crate::subscription::{Subscription, SubscriptionHub, SubscriptionStrategy};

type Combine<S> = Box<dyn Fn(&Substates) -> Result<S, SubstateError> + Send + Sync>;

/// Several named child stores presented as one store.
///
/// Every dispatched action goes to every child in declaration order. All
/// children are prepared before any of them commits, so if one child fails
/// no child and not the parent changes state. The parent state is rebuilt
/// from the children's fresh states by the combine function and published on
/// the combined store's own hub. Subscribers of a combined store see one
/// transition per handled action, never the children's.
///
/// Children should only be dispatched through their combined store;
/// dispatching a child directly leaves the parent snapshot stale until the
/// next combined dispatch. Passing the same store instance (or a clone of it)
/// as two children deadlocks on the first dispatch.
///
/// A store may be a child of several combined stores. Children are locked in
/// ascending [`Dispatch::lock_id`] order whatever their field order, so
/// combined stores sharing children never wait on each other in a cycle.
///
/// Use [`combine_stores!`](crate::combine_stores) to derive the combine
/// function from a parent struct.
pub struct CombinedStore<S, A: Action> {
    inner: Arc<CombinedInner<S, A>>,
}

struct CombinedInner<S, A: Action> {
    name: Option<String>,
    children: Vec<Box<dyn Child<A>>>,
    /// Child indices in ascending lock order.
    lock_order: Vec<usize>,
    combine: Combine<S>,
    state: RwLock<S>,
    dispatch_lock: Mutex<()>,
    hub: SubscriptionHub<S, A>,
    strategy: SubscriptionStrategy,
}

impl<S, A: Action> CombinedInner<S, A> {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("combined")
    }
}

/// A child store with its state type erased.
trait Child<A>: Send + Sync {
    fn name(&self) -> &'static str;

    fn snapshot(&self) -> StateValue;

    fn lock_id(&self) -> usize;

    fn stage(&self, action: &A) -> Result<Staged<'_, A>, DispatchError>;
}

struct Staged<'a, A> {
    value: StateValue,
    reduced: bool,
    commit: Box<dyn FnOnce(&A) + 'a>,
}

struct NamedChild<D> {
    name: &'static str,
    store: D,
}

impl<D: Dispatch> Child<D::Action> for NamedChild<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn snapshot(&self) -> StateValue {
        StateValue::new(self.store.state())
    }

    fn lock_id(&self) -> usize {
        self.store.lock_id()
    }

    fn stage(&self, action: &D::Action) -> Result<Staged<'_, D::Action>, DispatchError> {
        let prepared = self.store.prepare(action)?;
        Ok(Staged {
            value: StateValue::new(prepared.state().clone()),
            reduced: prepared.is_reduced(),
            commit: Box::new(move |action: &D::Action| {
                prepared.commit(action);
            }),
        })
    }
}

impl<S, A> CombinedStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Forward `action` to every child and commit the reassembled state.
    pub fn dispatch(&self, action: A) -> Result<S, DispatchError> {
        Dispatch::dispatch(self, action)
    }

    pub fn state(&self) -> S {
        self.inner.state.read().clone()
    }

    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.inner.state.read();
        f(&state)
    }

    /// Subscribe to combined transitions using the default strategy.
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

    /// Child names in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.inner.children.iter().map(|child| child.name())
    }
}

impl<S, A> Dispatch for CombinedStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    type State = S;
    type Action = A;

    fn prepare(&self, action: &A) -> Result<Prepared<'_, S, A>, DispatchError> {
        let inner = &*self.inner;
        let guard = inner.dispatch_lock.lock();

        // Lock children in a global order; reassemble in declaration order.
        let mut slots: Vec<Option<(&'static str, Staged<'_, A>)>> =
            inner.children.iter().map(|_| None).collect();
        for &index in &inner.lock_order {
            let child = &inner.children[index];
            match child.stage(action) {
                Ok(stage) => slots[index] = Some((child.name(), stage)),
                Err(err) => {
                    tracing::warn!(
                        store = inner.label(),
                        child = child.name(),
                        kind = ?action.kind(),
                        error = %err,
                        "child dispatch failed, state unchanged"
                    );
                    return Err(DispatchError::Child {
                        child: child.name(),
                        source: Box::new(err),
                    });
                }
            }
        }
        let staged: Vec<_> = slots.into_iter().flatten().collect();

        let reduced = staged.iter().any(|(_, stage)| stage.reduced);
        let next = if reduced {
            let substates = Substates::new(
                staged
                    .iter()
                    .map(|(name, stage)| (*name, stage.value.clone()))
                    .collect(),
            );
            Some((inner.combine)(&substates)?)
        } else {
            None
        };

        let commit_children = move |action: &A| {
            for (_, stage) in staged {
                (stage.commit)(action);
            }
        };

        let Some(next) = next else {
            tracing::debug!(store = inner.label(), kind = ?action.kind(), "unhandled action");
            let current = inner.state.read().clone();
            return Ok(Prepared::new(current, false, move |_, action: &A| {
                commit_children(action);
                drop(guard);
            }));
        };

        Ok(Prepared::new(next, true, move |state: &S, action: &A| {
            commit_children(action);
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
        CombinedStore::state(self)
    }

    fn subscribe(&self) -> Subscription<S, A> {
        CombinedStore::subscribe(self)
    }

    fn subscribe_with(&self, strategy: SubscriptionStrategy) -> Subscription<S, A> {
        CombinedStore::subscribe_with(self, strategy)
    }

    fn lock_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl<S, A: Action> Clone for CombinedStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A: Action> fmt::Debug for CombinedStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedStore")
            .field("name", &self.inner.name)
            .field(
                "children",
                &self
                    .inner
                    .children
                    .iter()
                    .map(|child| child.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Declares a [`CombinedStore`]: its children and how to assemble the parent.
pub struct CombinedStoreBuilder<A: Action> {
    name: Option<String>,
    children: Vec<Box<dyn Child<A>>>,
    duplicate: Option<&'static str>,
    strategy: SubscriptionStrategy,
}

impl<A: Action> CombinedStoreBuilder<A> {
    pub fn new() -> Self {
        Self {
            name: None,
            children: Vec::new(),
            duplicate: None,
            strategy: SubscriptionStrategy::default(),
        }
    }

    /// Name used in log output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a child owning the parent field `name`.
    ///
    /// `store` may also belong to other combined stores, but must not appear
    /// twice in this one.
    pub fn child<D>(mut self, name: &'static str, store: D) -> Self
    where
        D: Dispatch<Action = A> + 'static,
    {
        if self.duplicate.is_none() && self.children.iter().any(|child| child.name() == name) {
            self.duplicate = Some(name);
        }
        self.children.push(Box::new(NamedChild { name, store }));
        self
    }

    pub fn default_strategy(mut self, strategy: SubscriptionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Finish the store. The initial parent state is assembled from the
    /// children's current states with `combine`.
    pub fn build<S, F>(self, combine: F) -> Result<CombinedStore<S, A>, ComposeError>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(&Substates) -> Result<S, SubstateError> + Send + Sync + 'static,
    {
        if let Some(name) = self.duplicate {
            return Err(ComposeError::DuplicateChild(name));
        }
        if self.children.is_empty() {
            return Err(ComposeError::NoChildren);
        }

        let substates = Substates::new(
            self.children
                .iter()
                .map(|child| (child.name(), child.snapshot()))
                .collect(),
        );
        let initial = combine(&substates)?;

        let mut lock_order: Vec<usize> = (0..self.children.len()).collect();
        lock_order.sort_by_key(|&index| self.children[index].lock_id());

        Ok(CombinedStore {
            inner: Arc::new(CombinedInner {
                name: self.name,
                children: self.children,
                lock_order,
                combine: Box::new(combine),
                state: RwLock::new(initial),
                dispatch_lock: Mutex::new(()),
                hub: SubscriptionHub::new(),
                strategy: self.strategy,
            }),
        })
    }
}

impl<A: Action> Default for CombinedStoreBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a [`CombinedStore`] whose state is the struct `$state`, one child
/// store per field.
///
/// `$state` may be a bare name or a path such as `app::Dex`. Field names must
/// be exactly the struct's fields; each child's state type must match its
/// field's type. Evaluates to
/// `Result<CombinedStore<$state, _>, ComposeError>`.
///
/// ```
/// use unistore::{combine_stores, Action, Store};
///
/// #[derive(Clone, Debug)]
/// struct Tick;
///
/// impl Action for Tick {
///     type Kind = ();
///     fn kind(&self) {}
/// }
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Both {
///     up: i32,
///     down: i32,
/// }
///
/// let up = Store::builder(0).on((), |n: &i32, _: &Tick| n + 1).build();
/// let down = Store::builder(0).on((), |n: &i32, _: &Tick| n - 1).build();
/// let both = combine_stores!(Both { up: up, down: down }).unwrap();
///
/// assert_eq!(both.dispatch(Tick).unwrap(), Both { up: 1, down: -1 });
/// ```
#[macro_export]
macro_rules! combine_stores {
    ($state:path { $($field:ident : $store:expr),+ $(,)? }) => {
        $crate::CombinedStoreBuilder::new()
            $(.child(::core::stringify!($field), $store))+
            .build(
                |substates: &$crate::Substates|
                 -> ::core::result::Result<$state, $crate::SubstateError> {
                    type __UnistoreCombinedState = $state;
                    ::core::result::Result::Ok(__UnistoreCombinedState {
                        $($field: substates.get(::core::stringify!($field))?,)+
                    })
                },
            )
    };
}
