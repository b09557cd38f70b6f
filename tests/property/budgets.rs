//! Property tests for timeout and forking delay providers.
//!
//! Invariants tested:
//! - Equal timeouts never exceed the remaining budget
//! - Equal timeouts over a full sequence fit into the budget
//! - Equal delays never exceed the remaining budget
//! - Fixed timeouts honour their tail behaviour

use proptest::prelude::*;
use std::time::Duration;
use tower_cluster_core::{Budget, Request};
use tower_cluster_strategy::{
    EqualDelaysProvider, EqualTimeoutsProvider, FixedTimeoutsProvider, ForkingDelaysProvider,
    SequentialTimeoutsProvider, TailTimeoutBehaviour,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: a single equal timeout fits into what is left
    #[test]
    fn equal_timeout_within_budget(
        remaining_ms in 0u64..600_000,
        division in 1usize..10,
        total in 1usize..20,
        index in 0usize..20,
    ) {
        let provider = EqualTimeoutsProvider::new(division).unwrap();
        let budget = Budget::with_remaining(Duration::from_millis(remaining_ms));
        let timeout = provider.timeout(&Request::get("x"), &budget, index, total);

        prop_assert!(timeout <= budget.total());
    }

    /// Property: spending each timeout in full never overdraws the budget
    #[test]
    fn equal_timeouts_sum_to_at_most_the_budget(
        total_ms in 1u64..600_000,
        division in 1usize..10,
        replicas in 1usize..10,
    ) {
        let provider = EqualTimeoutsProvider::new(division).unwrap();
        let request = Request::get("x");
        let mut remaining = Duration::from_millis(total_ms);
        let mut spent = Duration::ZERO;

        for index in 0..replicas {
            let budget = Budget::with_remaining(remaining);
            let timeout = provider.timeout(&request, &budget, index, replicas);
            prop_assert!(timeout <= remaining);
            spent += timeout;
            remaining -= timeout;
        }

        prop_assert!(spent <= Duration::from_millis(total_ms));
    }

    /// Property: equal forking delays fit into what is left
    #[test]
    fn equal_delay_within_budget(
        remaining_ms in 0u64..600_000,
        division in 1usize..10,
        total in 0usize..20,
        index in 0usize..20,
    ) {
        let provider = EqualDelaysProvider::new(division).unwrap();
        let budget = Budget::with_remaining(Duration::from_millis(remaining_ms));
        let delay = provider.delay(&Request::get("x"), &budget, index, total);

        prop_assert!(delay.is_some_and(|delay| delay <= budget.total()));
    }

    /// Property: fixed timeouts come from the list, then from the tail rule
    #[test]
    fn fixed_timeouts_follow_the_list(
        timeouts in prop::collection::vec(1u64..10_000, 1..6),
        remaining_ms in 0u64..100_000,
        index in 0usize..10,
    ) {
        let list: Vec<Duration> = timeouts.iter().copied().map(Duration::from_millis).collect();
        let budget = Budget::with_remaining(Duration::from_millis(remaining_ms));
        let request = Request::get("x");

        let last = FixedTimeoutsProvider::new(TailTimeoutBehaviour::UseLastValue, list.clone()).unwrap();
        let rest = FixedTimeoutsProvider::new(TailTimeoutBehaviour::UseRemainingBudget, list.clone()).unwrap();

        let from_last = last.timeout(&request, &budget, index, 10);
        let from_rest = rest.timeout(&request, &budget, index, 10);

        match list.get(index) {
            Some(expected) => {
                prop_assert_eq!(from_last, *expected);
                prop_assert_eq!(from_rest, *expected);
            }
            None => {
                prop_assert_eq!(Some(&from_last), list.last());
                prop_assert!(from_rest <= budget.total());
            }
        }
    }
}
