//! Error types returned by stores, subscriptions and composition.

use thiserror::Error;

/// Boxed error produced by a fallible reducer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A dispatch that could not be committed.
///
/// The store that returned it still holds its pre-dispatch state and no
/// transition was published.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("reducer for {action} failed: {source}")]
    Reducer {
        /// `Debug` rendering of the action kind being reduced.
        action: String,
        #[source]
        source: BoxError,
    },

    #[error("child store `{child}` failed: {source}")]
    Child {
        child: &'static str,
        #[source]
        source: Box<DispatchError>,
    },

    #[error(transparent)]
    Substate(#[from] SubstateError),
}

impl DispatchError {
    /// Follow `Child` wrappers down to the store that actually failed.
    pub fn root(&self) -> &DispatchError {
        match self {
            DispatchError::Child { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Failure to read a child state out of [`Substates`](crate::Substates).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstateError {
    #[error("no substate named `{0}`")]
    Missing(String),

    #[error("substate `{field}` is not a `{expected}`")]
    Type {
        field: String,
        expected: &'static str,
    },
}

/// Failure to assemble a [`CombinedStore`](crate::CombinedStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("a combined store needs at least one child")]
    NoChildren,

    #[error("child store `{0}` registered twice")]
    DuplicateChild(&'static str),

    #[error("cannot assemble initial state: {0}")]
    Substate(#[from] SubstateError),
}

/// Outcome of a non-blocking receive on a subscription.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    #[error("no transition is queued")]
    Empty,

    #[error("subscription is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_unwraps_nested_children() {
        let leaf = DispatchError::Reducer {
            action: "Caught".to_string(),
            source: "boom".into(),
        };
        let nested = DispatchError::Child {
            child: "inner",
            source: Box::new(DispatchError::Child {
                child: "caught",
                source: Box::new(leaf),
            }),
        };

        assert!(matches!(
            nested.root(),
            DispatchError::Reducer { action, .. } if action == "Caught"
        ));
        assert_eq!(
            nested.to_string(),
            "child store `inner` failed: child store `caught` failed: reducer for Caught failed: boom"
        );
    }
}
