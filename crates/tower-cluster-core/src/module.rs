//! The request module chain.
//!
//! A logical request flows through an ordered slice of [`RequestModule`]s.
//! Each module receives the mutable [`RequestContext`] and a [`Next`]
//! continuation over the rest of the slice. It may short-circuit by returning
//! a result without running `next`, delegate to `next`, or post-process what
//! `next` returns.
//!
//! ```rust
//! use futures::future::BoxFuture;
//! use tower_cluster_core::{ClusterResult, Next, RequestContext, RequestModule};
//!
//! struct RejectEverything;
//!
//! impl RequestModule for RejectEverything {
//!     fn execute<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         _next: Next<'a>,
//!     ) -> BoxFuture<'a, ClusterResult> {
//!         Box::pin(async move { ClusterResult::throttled(ctx.request().clone()) })
//!     }
//! }
//! ```

use crate::budget::Budget;
use crate::model::Request;
use crate::result::{ClusterResult, ClusterResultStatus};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Mutable state of one logical request as it travels down the chain.
pub struct RequestContext {
    request: Request,
    budget: Budget,
    cancellation: CancellationToken,
    span: Span,
    service_name: Arc<str>,
}

impl RequestContext {
    pub fn new(
        request: Request,
        budget: Budget,
        cancellation: CancellationToken,
        service_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            request,
            budget,
            cancellation,
            span: Span::none(),
            service_name: service_name.into(),
        }
    }

    /// Attaches the tracing span the request runs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Replaces the request seen by the remaining modules.
    pub fn set_request(&mut self, request: Request) {
        self.request = request;
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("service", &self.service_name)
            .field("method", self.request.method())
            .field("url", &self.request.url().to_string())
            .field("budget", &self.budget)
            .field("canceled", &self.cancellation.is_cancelled())
            .finish()
    }
}

/// One stage of the request pipeline.
pub trait RequestModule: Send + Sync {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult>;
}

impl<M: RequestModule + ?Sized> RequestModule for Arc<M> {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        (**self).execute(ctx, next)
    }
}

/// Continuation over the modules that follow the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    modules: &'a [Arc<dyn RequestModule>],
}

impl<'a> Next<'a> {
    pub fn new(modules: &'a [Arc<dyn RequestModule>]) -> Self {
        Self { modules }
    }

    /// Number of modules left in the chain.
    pub fn remaining(&self) -> usize {
        self.modules.len()
    }

    /// Runs the rest of the chain.
    ///
    /// Running past the last module yields `ReplicasExhausted`: nothing was
    /// left to try.
    pub fn run<'b>(self, ctx: &'b mut RequestContext) -> BoxFuture<'b, ClusterResult>
    where
        'a: 'b,
    {
        match self.modules.split_first() {
            Some((head, rest)) => head.execute(ctx, Next { modules: rest }),
            None => Box::pin(async move {
                ClusterResult::new(
                    ClusterResultStatus::ReplicasExhausted,
                    Vec::new(),
                    None,
                    ctx.request().clone(),
                )
            }),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.modules.len())
            .finish()
    }
}
