//! The transport seam.
//!
//! The cluster client never talks to the network itself. It hands absolute
//! requests to a [`Transport`], which must:
//! - respect the attempt timeout by returning a timeout or canceled response,
//! - stop promptly once the cancellation token fires,
//! - turn ordinary network failures into responses instead of errors.
//!
//! [`ServiceTransport`] adapts any tower [`Service`] to this contract.

use crate::error::{BoxError, TransportError};
use crate::model::{Request, Response};
use futures::future::{poll_fn, BoxFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_service::Service;

/// Capability of sending one absolute request within a deadline.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: Request,
        timeout: Duration,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Response, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send<'a>(
        &'a self,
        request: Request,
        timeout: Duration,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        (**self).send(request, timeout, cancellation)
    }
}

/// A [`Transport`] backed by a tower service.
///
/// The timeout is enforced with [`tokio::time::timeout`] and yields
/// [`Response::timeout`]; cancellation yields [`Response::canceled`]; service
/// errors are logged and become [`Response::unknown_failure`].
#[derive(Debug, Clone)]
pub struct ServiceTransport<S> {
    inner: S,
}

impl<S> ServiceTransport<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<Request, Response = Response> + Clone + Send + Sync + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    fn send<'a>(
        &'a self,
        request: Request,
        timeout: Duration,
        cancellation: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        let mut service = self.inner.clone();

        Box::pin(async move {
            let target = request.url().to_string();
            let call = async move {
                poll_fn(|cx| service.poll_ready(cx)).await?;
                service.call(request).await
            };

            tokio::select! {
                biased;

                _ = cancellation.cancelled() => Ok(Response::canceled()),

                outcome = tokio::time::timeout(timeout, call) => match outcome {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(error)) => {
                        let error: BoxError = error.into();
                        tracing::error!(target_url = %target, error = %error, "unknown error while sending request");
                        Ok(Response::unknown_failure())
                    }
                    Err(_) => {
                        tracing::error!(target_url = %target, timeout = ?timeout, "request timed out");
                        Ok(Response::timeout())
                    }
                },
            }
        })
    }
}
