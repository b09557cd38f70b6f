use futures::future::BoxFuture;
use http::Method;
use tower_cluster_core::{ClusterResult, Next, Request, RequestContext, RequestModule};

/// Rejects requests that can never be sent correctly.
///
/// A body on a GET, HEAD, OPTIONS or TRACE request and an absolute URL with a
/// scheme other than http or https both yield `IncorrectArguments`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidationModule;

impl RequestValidationModule {
    /// Problems found in `request`, empty when it is valid.
    pub fn validate(request: &Request) -> Vec<String> {
        let mut errors = Vec::new();

        let forbids_body = [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE]
            .contains(request.method());
        if forbids_body && request.body().is_some_and(|body| !body.is_empty()) {
            errors.push(format!("{} request cannot carry a body", request.method()));
        }

        if let Some(url) = request.url().as_absolute() {
            if !matches!(url.scheme(), "http" | "https") {
                errors.push(format!("unsupported url scheme '{}'", url.scheme()));
            }
        }

        errors
    }
}

impl RequestModule for RequestValidationModule {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            let errors = Self::validate(ctx.request());
            if errors.is_empty() {
                return next.run(ctx).await;
            }

            tracing::error!(
                parent: ctx.span(),
                service = ctx.service_name(),
                errors = ?errors,
                "request is invalid"
            );
            ClusterResult::incorrect_arguments(ctx.request().clone())
        })
    }
}

/// Returns `TimeExpired` without doing any work when the budget is already
/// spent on arrival.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutValidationModule;

impl RequestModule for TimeoutValidationModule {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ClusterResult> {
        Box::pin(async move {
            if ctx.budget().has_expired() {
                tracing::warn!(
                    parent: ctx.span(),
                    service = ctx.service_name(),
                    timeout = ?ctx.budget().total(),
                    "request timeout expired before sending"
                );
                return ClusterResult::time_expired(ctx.request().clone());
            }
            next.run(ctx).await
        })
    }
}
