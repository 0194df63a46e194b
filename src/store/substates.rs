use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::SubstateError;

/// A type-erased, reference-counted child state.
///
/// Clone is cheap, just an atomic increment.
#[derive(Clone)]
pub struct StateValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl StateValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns `None` if the stored type doesn't match `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Name of the stored type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue")
            .field("type", &self.type_name)
            .finish()
    }
}

/// The fresh state of every child of a combined store, in declaration order.
///
/// Handed to the combine function, which rebuilds the parent state from it.
#[derive(Clone, Debug, Default)]
pub struct Substates {
    entries: Vec<(&'static str, StateValue)>,
}

impl Substates {
    pub(crate) fn new(entries: Vec<(&'static str, StateValue)>) -> Self {
        Self { entries }
    }

    /// Clone out the state of child `name` as a `T`.
    pub fn get<T: Any + Clone>(&self, name: &str) -> Result<T, SubstateError> {
        let value = self
            .value(name)
            .ok_or_else(|| SubstateError::Missing(name.to_string()))?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| SubstateError::Type {
                field: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn value(&self, name: &str) -> Option<&StateValue> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
