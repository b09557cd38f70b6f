//! Turning relative requests into absolute ones.

use tower_cluster_core::{Replica, Request, RequestUrl};
use url::Url;

/// Combines a replica base URL with the relative URL of a request.
///
/// The base path and the relative path are concatenated with exactly one
/// `/` between them, so `http://host:80/api` and `users?id=1` become
/// `http://host:80/api/users?id=1`. A replica whose URL cannot serve as a
/// base, or carries a query or fragment, cannot be combined with anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestConverter;

impl RequestConverter {
    /// Returns the absolute request, or `None` when the URLs cannot be combined.
    pub fn convert(&self, request: &Request, replica: &Replica) -> Option<Request> {
        let relative = match request.url() {
            RequestUrl::Absolute(_) => return Some(request.clone()),
            RequestUrl::Relative(relative) => relative,
        };

        let absolute = combine(replica.url(), relative)?;
        Some(request.clone().with_url(RequestUrl::Absolute(absolute)))
    }
}

fn combine(base: &Url, relative: &str) -> Option<Url> {
    if base.cannot_be_a_base() || base.query().is_some() || base.fragment().is_some() {
        tracing::warn!(replica = %base, "replica url cannot be used as a base");
        return None;
    }

    let mut joined = base.as_str().trim_end_matches('/').to_string();
    let relative = relative.trim_start_matches('/');
    if !relative.is_empty() {
        if !relative.starts_with('?') {
            joined.push('/');
        }
        joined.push_str(relative);
    }

    match Url::parse(&joined) {
        Ok(url) => Some(url),
        Err(error) => {
            tracing::warn!(replica = %base, relative, error = %error, "failed to combine replica and request urls");
            None
        }
    }
}
