//! Actions and states shared by the unit tests.

use std::collections::BTreeSet;

use crate::Action;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Counter {
    Increment,
    Decrement,
    Add(i64),
    Fail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum CounterKind {
    Increment,
    Decrement,
    Add,
    Fail,
}

impl Action for Counter {
    type Kind = CounterKind;

    fn kind(&self) -> CounterKind {
        match self {
            Counter::Increment => CounterKind::Increment,
            Counter::Decrement => CounterKind::Decrement,
            Counter::Add(_) => CounterKind::Add,
            Counter::Fail => CounterKind::Fail,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Pokedex {
    Seen(String),
    Caught(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum PokedexKind {
    Seen,
    Caught,
}

impl Action for Pokedex {
    type Kind = PokedexKind;

    fn kind(&self) -> PokedexKind {
        match self {
            Pokedex::Seen(_) => PokedexKind::Seen,
            Pokedex::Caught(_) => PokedexKind::Caught,
        }
    }
}

impl Pokedex {
    pub(crate) fn name(&self) -> &str {
        match self {
            Pokedex::Seen(name) | Pokedex::Caught(name) => name,
        }
    }
}

pub(crate) type Names = BTreeSet<String>;

pub(crate) fn names(list: &[&str]) -> Names {
    list.iter().map(|name| name.to_string()).collect()
}
