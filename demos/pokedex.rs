//! Demonstration of a CombinedStore: two child stores behind one state tree

use std::collections::BTreeSet;

use unistore::{combine_stores, Action, Store};

#[derive(Clone, Debug)]
enum DexAction {
    Seen(String),
    Caught(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum DexKind {
    Seen,
    Caught,
}

impl Action for DexAction {
    type Kind = DexKind;

    fn kind(&self) -> DexKind {
        match self {
            DexAction::Seen(_) => DexKind::Seen,
            DexAction::Caught(_) => DexKind::Caught,
        }
    }
}

type Names = BTreeSet<String>;

#[derive(Clone, Debug)]
struct Pokedex {
    seen: Names,
    caught: Names,
}

fn record(names: &Names, action: &DexAction) -> Names {
    let (DexAction::Seen(name) | DexAction::Caught(name)) = action;
    let mut next = names.clone();
    next.insert(name.clone());
    next
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== CombinedStore Example: Pokedex ===\n");

    // Catching something also means you have seen it.
    let seen = Store::builder(Names::new())
        .name("seen")
        .on_any([DexKind::Seen, DexKind::Caught], record)
        .build();
    let caught = Store::builder(Names::new())
        .name("caught")
        .on(DexKind::Caught, record)
        .build();

    let pokedex = combine_stores!(Pokedex {
        seen: seen,
        caught: caught,
    })?;
    let mut updates = pokedex.subscribe();

    for action in [
        DexAction::Seen("Pikachu".to_string()),
        DexAction::Seen("Squirtle".to_string()),
        DexAction::Caught("Squirtle".to_string()),
    ] {
        println!("Dispatching {:?}", action);
        let state = pokedex.dispatch(action)?;
        println!("   seen:   {:?}", state.seen);
        println!("   caught: {:?}", state.caught);
    }

    println!("\nTransitions observed by the subscriber:");
    while let Ok(transition) = updates.try_recv() {
        println!(
            "   {:?} -> {} seen, {} caught",
            transition.action,
            transition.state.seen.len(),
            transition.state.caught.len()
        );
    }

    Ok(())
}
