//! Property tests for adaptive throttling.
//!
//! Invariants tested:
//! - Counters never go negative and accepts never exceed requests
//! - The rejection probability stays within `[0, cap]`
//! - Nothing is shed while fewer than the minimum requests were seen

use futures::future::BoxFuture;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tower_cluster_core::{
    Budget, ClusterResult, ClusterResultStatus, Next, Request, RequestContext, RequestModule,
};
use tower_cluster_throttling::{AdaptiveThrottlingModule, AdaptiveThrottlingOptions, ThrottlingStore};

/// Succeeds or fails depending on the request path.
struct Outcome;

impl RequestModule for Outcome {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            let status = if ctx.request().url().to_string() == "ok" {
                ClusterResultStatus::Success
            } else {
                ClusterResultStatus::ReplicasExhausted
            };
            ClusterResult::new(status, Vec::new(), None, ctx.request().clone())
        })
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: counters and probability stay in range for any outcome mix
    #[test]
    fn counters_and_probability_stay_in_range(
        outcomes in prop::collection::vec(any::<bool>(), 1..200),
        minimum in 1u32..50,
        critical in 1.1f64..5.0,
        cap in 0.05f64..=1.0,
        seed in any::<u64>(),
        pauses in prop::collection::vec(0u64..30, 1..200),
    ) {
        let rt = Builder::new_current_thread().enable_time().start_paused(true).build().unwrap();
        rt.block_on(async {
            let options = AdaptiveThrottlingOptions::builder("props")
                .minimum_requests(minimum)
                .critical_ratio(critical)
                .probability_cap(cap)
                .decay_period(Duration::from_secs(60))
                .build()
                .unwrap();
            let store = ThrottlingStore::new();
            let module = AdaptiveThrottlingModule::with_seed(options, &store, seed);
            let tail: Vec<Arc<dyn RequestModule>> = vec![Arc::new(Outcome)];

            for (i, accepted) in outcomes.iter().enumerate() {
                let seen = module.requests();
                let request = Request::get(if *accepted { "ok" } else { "fail" });
                let mut ctx = RequestContext::new(
                    request,
                    Budget::infinite(),
                    CancellationToken::new(),
                    "props",
                );
                let result = module.execute(&mut ctx, Next::new(&tail)).await;

                if seen < f64::from(minimum) {
                    prop_assert_ne!(result.status(), ClusterResultStatus::Throttled);
                }
                prop_assert!(module.accepts() >= 0.0);
                prop_assert!(module.requests() >= module.accepts());
                let probability = module.rejection_probability();
                prop_assert!((0.0..=cap).contains(&probability));

                let pause = pauses[i % pauses.len()];
                tokio::time::advance(Duration::from_secs(pause)).await;
            }
            Ok(())
        })?;
    }
}
