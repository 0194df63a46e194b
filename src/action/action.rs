use std::fmt::Debug;
use std::hash::Hash;

/// An event that may change a store's state.
///
/// Actions are usually a closed enum. `Kind` is a field-less companion enum
/// naming each variant, so reducers can be registered before any action value
/// exists.
///
/// # Example
///
/// ```
/// use unistore::Action;
///
/// #[derive(Clone, Debug)]
/// enum Counter {
///     Increment,
///     Add(i64),
/// }
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum CounterKind {
///     Increment,
///     Add,
/// }
///
/// impl Action for Counter {
///     type Kind = CounterKind;
///
///     fn kind(&self) -> CounterKind {
///         match self {
///             Counter::Increment => CounterKind::Increment,
///             Counter::Add(_) => CounterKind::Add,
///         }
///     }
/// }
///
/// assert_eq!(Counter::Add(3).kind(), CounterKind::Add);
/// ```
pub trait Action: Clone + Debug + Send + Sync + 'static {
    /// Discriminant used to route the action.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// The routing key of this action.
    fn kind(&self) -> Self::Kind;
}
