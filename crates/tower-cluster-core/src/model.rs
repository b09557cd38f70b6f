//! Request and response values.
//!
//! Both types are immutable: every `with_*` method consumes the value and
//! returns a modified copy. Headers use [`http::HeaderMap`], an ordered
//! multimap with case-insensitive names.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use std::fmt;
use url::Url;

/// Header names used by the cluster client itself.
pub mod header_names {
    /// Marker header telling the client that retrying this response elsewhere is pointless.
    pub const DONT_RETRY: &str = "x-dont-retry";
}

/// Target of a request: either a full URL or a path relative to a replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestUrl {
    /// Absolute URL with a host, sent as-is.
    Absolute(Url),
    /// Path and query to be appended to a replica's base URL.
    Relative(String),
}

impl RequestUrl {
    /// Parses `raw` as an absolute URL when it has a scheme and a host,
    /// otherwise keeps it as a relative reference.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if url.has_host() => RequestUrl::Absolute(url),
            _ => RequestUrl::Relative(raw.to_string()),
        }
    }

    /// Returns true for absolute URLs.
    pub fn is_absolute(&self) -> bool {
        matches!(self, RequestUrl::Absolute(_))
    }

    /// Returns the absolute URL, if any.
    pub fn as_absolute(&self) -> Option<&Url> {
        match self {
            RequestUrl::Absolute(url) => Some(url),
            RequestUrl::Relative(_) => None,
        }
    }
}

impl fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestUrl::Absolute(url) => write!(f, "{}", url),
            RequestUrl::Relative(path) => f.write_str(path),
        }
    }
}

/// An HTTP request as seen by the cluster client.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: RequestUrl,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a request without headers or body.
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: RequestUrl::parse(url),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// `GET` request.
    pub fn get(url: &str) -> Self {
        Self::new(Method::GET, url)
    }

    /// `POST` request.
    pub fn post(url: &str) -> Self {
        Self::new(Method::POST, url)
    }

    /// `PUT` request.
    pub fn put(url: &str) -> Self {
        Self::new(Method::PUT, url)
    }

    /// `DELETE` request.
    pub fn delete(url: &str) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// `HEAD` request.
    pub fn head(url: &str) -> Self {
        Self::new(Method::HEAD, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &RequestUrl {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns a copy pointing at `url`.
    pub fn with_url(mut self, url: RequestUrl) -> Self {
        self.url = url;
        self
    }

    /// Returns a copy carrying `body`.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns a copy with `name` set to `value`, replacing earlier values.
    ///
    /// Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "ignoring invalid request header"),
        }
        self
    }

    /// Returns a copy with `value` appended to the values of `name`.
    pub fn with_appended_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_accept(self, value: &str) -> Self {
        self.with_header(http::header::ACCEPT.as_str(), value)
    }

    pub fn with_content_type(self, value: &str) -> Self {
        self.with_header(http::header::CONTENT_TYPE.as_str(), value)
    }

    pub fn with_user_agent(self, value: &str) -> Self {
        self.with_header(http::header::USER_AGENT.as_str(), value)
    }

    /// Sets `Authorization` to `scheme parameter`.
    pub fn with_authorization(self, scheme: &str, parameter: &str) -> Self {
        let value = format!("{} {}", scheme, parameter);
        self.with_header(http::header::AUTHORIZATION.as_str(), &value)
    }

    /// Sets `Authorization` to HTTP basic credentials.
    pub fn with_basic_authorization(self, user: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{}:{}", user, password));
        self.with_authorization("Basic", &token)
    }

    /// Sets `Range` to a byte range; either bound may be open.
    pub fn with_range(self, from: Option<u64>, to: Option<u64>) -> Self {
        let value = match (from, to) {
            (Some(from), Some(to)) => format!("bytes={}-{}", from, to),
            (Some(from), None) => format!("bytes={}-", from),
            (None, Some(to)) => format!("bytes=-{}", to),
            (None, None) => return self,
        };
        self.with_header(http::header::RANGE.as_str(), &value)
    }
}

/// Response status code.
///
/// Regular HTTP statuses are represented by their numeric value. The client
/// reserves a few codes outside of the HTTP range for outcomes that never
/// reached a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseCode(pub u16);

impl ResponseCode {
    /// No response is known, for example when the request was never sent.
    pub const UNKNOWN: ResponseCode = ResponseCode(0);
    pub const OK: ResponseCode = ResponseCode(200);
    pub const ACCEPTED: ResponseCode = ResponseCode(202);
    pub const BAD_REQUEST: ResponseCode = ResponseCode(400);
    pub const NOT_FOUND: ResponseCode = ResponseCode(404);
    pub const REQUEST_TIMEOUT: ResponseCode = ResponseCode(408);
    pub const TOO_MANY_REQUESTS: ResponseCode = ResponseCode(429);
    /// The attempt was canceled before a response arrived.
    pub const CANCELED: ResponseCode = ResponseCode(499);
    pub const INTERNAL_SERVER_ERROR: ResponseCode = ResponseCode(500);
    pub const NOT_IMPLEMENTED: ResponseCode = ResponseCode(501);
    pub const BAD_GATEWAY: ResponseCode = ResponseCode(502);
    pub const SERVICE_UNAVAILABLE: ResponseCode = ResponseCode(503);
    pub const GATEWAY_TIMEOUT: ResponseCode = ResponseCode(504);
    pub const HTTP_VERSION_NOT_SUPPORTED: ResponseCode = ResponseCode(505);
    /// The transport failed for a reason it could not classify.
    pub const UNKNOWN_FAILURE: ResponseCode = ResponseCode(599);
    pub const CONNECT_FAILURE: ResponseCode = ResponseCode(601);
    pub const RECEIVE_FAILURE: ResponseCode = ResponseCode(602);
    pub const SEND_FAILURE: ResponseCode = ResponseCode(603);

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// 2xx codes.
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 5xx codes, excluding the client-reserved failure codes.
    pub fn is_server_error(&self) -> bool {
        (500..599).contains(&self.0)
    }

    /// Codes produced by the network layer rather than by a server.
    pub fn is_network_error(&self) -> bool {
        matches!(
            *self,
            ResponseCode::REQUEST_TIMEOUT
                | ResponseCode::CONNECT_FAILURE
                | ResponseCode::RECEIVE_FAILURE
                | ResponseCode::SEND_FAILURE
        )
    }

    /// `Unknown` and `UnknownFailure`.
    pub fn is_unknown(&self) -> bool {
        matches!(*self, ResponseCode::UNKNOWN | ResponseCode::UNKNOWN_FAILURE)
    }
}

impl From<http::StatusCode> for ResponseCode {
    fn from(status: http::StatusCode) -> Self {
        ResponseCode(status.as_u16())
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            ResponseCode::UNKNOWN => "Unknown",
            ResponseCode::CANCELED => "Canceled",
            ResponseCode::UNKNOWN_FAILURE => "UnknownFailure",
            ResponseCode::CONNECT_FAILURE => "ConnectFailure",
            ResponseCode::RECEIVE_FAILURE => "ReceiveFailure",
            ResponseCode::SEND_FAILURE => "SendFailure",
            code => {
                return match http::StatusCode::from_u16(code.0)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                {
                    Some(reason) => write!(f, "{} {}", code.0, reason),
                    None => write!(f, "{}", code.0),
                }
            }
        };
        write!(f, "{} {}", self.0, name)
    }
}

/// An HTTP response, or a sentinel standing in for one.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    code: ResponseCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    pub fn new(code: ResponseCode) -> Self {
        Self {
            code,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Sentinel for an attempt whose outcome is not known.
    pub fn unknown() -> Self {
        Self::new(ResponseCode::UNKNOWN)
    }

    /// Sentinel for an unclassified transport failure.
    pub fn unknown_failure() -> Self {
        Self::new(ResponseCode::UNKNOWN_FAILURE)
    }

    /// Sentinel for a canceled attempt.
    pub fn canceled() -> Self {
        Self::new(ResponseCode::CANCELED)
    }

    /// Sentinel for an attempt that ran out of time.
    pub fn timeout() -> Self {
        Self::new(ResponseCode::REQUEST_TIMEOUT)
    }

    pub fn code(&self) -> ResponseCode {
        self.code
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns a copy with `name` set to `value`.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}
