//! Complete counter application: reducers, dispatch and a subscriber thread

use std::thread;

use futures::executor::block_on;
use unistore::{Action, Store, SubscriptionStrategy};

#[derive(Clone, Debug)]
enum CounterAction {
    Increment,
    Decrement,
    SetStep(i32),
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum CounterKind {
    Increment,
    Decrement,
    SetStep,
    Reset,
}

impl Action for CounterAction {
    type Kind = CounterKind;

    fn kind(&self) -> CounterKind {
        match self {
            CounterAction::Increment => CounterKind::Increment,
            CounterAction::Decrement => CounterKind::Decrement,
            CounterAction::SetStep(_) => CounterKind::SetStep,
            CounterAction::Reset => CounterKind::Reset,
        }
    }
}

#[derive(Clone, Debug)]
struct CounterState {
    count: i32,
    step: i32,
    history: Vec<i32>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            count: 0,
            step: 1,
            history: vec![0],
        }
    }

    fn with_count(&self, count: i32) -> Self {
        let mut history = self.history.clone();
        history.push(count);
        Self {
            count,
            step: self.step,
            history,
        }
    }
}

fn main() {
    println!("=== Complete Counter Application ===\n");

    println!("1. Declaring the counter store");
    let store = Store::builder(CounterState::new())
        .name("counter")
        .on(CounterKind::Increment, |state: &CounterState, _: &CounterAction| {
            state.with_count(state.count + state.step)
        })
        .on(CounterKind::Decrement, |state: &CounterState, _: &CounterAction| {
            state.with_count(state.count - state.step)
        })
        .on(CounterKind::SetStep, |state: &CounterState, action: &CounterAction| {
            let mut next = state.clone();
            if let CounterAction::SetStep(step) = action {
                next.step = *step;
            }
            next
        })
        .on(CounterKind::Reset, |state: &CounterState, _: &CounterAction| {
            state.with_count(0)
        })
        .build();

    println!("\n2. Logging every transition on a separate thread");
    let mut updates = store.subscribe_with(SubscriptionStrategy::Every);
    let logger = thread::spawn(move || {
        block_on(async {
            while let Some(transition) = updates.recv().await {
                println!(
                    "   [State] {:?} -> Count: {}, Step: {}",
                    transition.action, transition.state.count, transition.state.step
                );
            }
        })
    });

    println!("\n3. Incrementing...");
    for _ in 0..3 {
        store.dispatch(CounterAction::Increment).expect("increment");
    }

    println!("\n4. Changing step size to 5");
    store.dispatch(CounterAction::SetStep(5)).expect("set step");
    store.dispatch(CounterAction::Increment).expect("increment");

    println!("\n5. Decrementing...");
    for _ in 0..3 {
        store.dispatch(CounterAction::Decrement).expect("decrement");
    }

    println!("\n6. History:");
    store.read(|state| println!("   {:?}", state.history));

    println!("\n7. Resetting...");
    let state = store.dispatch(CounterAction::Reset).expect("reset");
    println!("   Final history: {:?}", state.history);

    // Dropping the store ends the subscription, which stops the logger.
    drop(store);
    logger.join().expect("logger thread");

    println!("\n✓ Counter application complete!");
}
