//! Property tests for dispatch ordering and composition.

use proptest::prelude::*;
use unistore::{combine_stores, Action, Store, SubscriptionStrategy, TryRecvError};

#[derive(Clone, Debug, PartialEq)]
enum Op {
    Add(i64),
    Mul(i64),
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum OpKind {
    Add,
    Mul,
    Reset,
}

impl Action for Op {
    type Kind = OpKind;

    fn kind(&self) -> OpKind {
        match self {
            Op::Add(_) => OpKind::Add,
            Op::Mul(_) => OpKind::Mul,
            Op::Reset => OpKind::Reset,
        }
    }
}

fn apply(state: &i64, op: &Op) -> i64 {
    match op {
        Op::Add(n) => state.wrapping_add(*n),
        Op::Mul(n) => state.wrapping_mul(*n),
        Op::Reset => 0,
    }
}

/// Handles `Add` and `Mul`, ignores `Reset`.
fn arithmetic(initial: i64) -> Store<i64, Op> {
    Store::builder(initial)
        .on_any([OpKind::Add, OpKind::Mul], apply)
        .build()
}

/// Handles only `Reset` and `Add`.
fn resetting(initial: i64) -> Store<i64, Op> {
    Store::builder(initial)
        .on_any([OpKind::Reset, OpKind::Add], apply)
        .build()
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-1_000i64..1_000).prop_map(Op::Add),
        (-4i64..4).prop_map(Op::Mul),
        Just(Op::Reset),
    ]
}

#[derive(Clone, Debug, PartialEq)]
struct Both {
    arithmetic: i64,
    resetting: i64,
}

proptest! {
    #[test]
    fn dispatch_matches_left_fold(
        initial in -100i64..100,
        ops in prop::collection::vec(op(), 0..64),
        subscribers in 0usize..4,
    ) {
        let store = arithmetic(initial);
        let _subscriptions: Vec<_> = (0..subscribers)
            .map(|_| store.subscribe_with(SubscriptionStrategy::Latest))
            .collect();

        let expected = ops.iter().fold(initial, |state, op| match op {
            Op::Reset => state,
            other => apply(&state, other),
        });

        for op in ops {
            store.dispatch(op).unwrap();
        }
        prop_assert_eq!(store.state(), expected);
    }

    #[test]
    fn every_subscriber_sees_the_same_sequence(ops in prop::collection::vec(op(), 0..64)) {
        let store = arithmetic(1);
        let mut first = store.subscribe();
        let mut second = store.subscribe();

        let mut handled = 0;
        for op in ops {
            if op != Op::Reset {
                handled += 1;
            }
            store.dispatch(op).unwrap();
        }

        let mut count = 0;
        loop {
            match (first.try_recv(), second.try_recv()) {
                (Ok(a), Ok(b)) => {
                    prop_assert_eq!(a, b);
                    count += 1;
                }
                (Err(TryRecvError::Empty), Err(TryRecvError::Empty)) => break,
                (a, b) => prop_assert!(false, "subscribers diverged: {:?} / {:?}", a, b),
            }
        }
        prop_assert_eq!(count, handled);
    }

    #[test]
    fn combined_fields_match_independent_children(
        start in (-50i64..50, -50i64..50),
        ops in prop::collection::vec(op(), 0..32),
    ) {
        let both = combine_stores!(Both {
            arithmetic: arithmetic(start.0),
            resetting: resetting(start.1),
        })
        .unwrap();
        let lone_arithmetic = arithmetic(start.0);
        let lone_resetting = resetting(start.1);

        for op in ops {
            let state = both.dispatch(op.clone()).unwrap();
            prop_assert_eq!(state.arithmetic, lone_arithmetic.dispatch(op.clone()).unwrap());
            prop_assert_eq!(state.resetting, lone_resetting.dispatch(op).unwrap());
        }
    }
}
