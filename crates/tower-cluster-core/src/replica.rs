use std::fmt;
use std::str::FromStr;
use url::Url;

/// One candidate backend endpoint of a logical service, identified by its base URL.
///
/// Replicas own no mutable state; ordering and throttling state is keyed by
/// replica identity in external stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Replica(Url);

impl Replica {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    /// `host:port` part of the base URL, used in log records.
    pub fn authority(&self) -> String {
        match (self.0.host_str(), self.0.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => self.0.as_str().to_string(),
        }
    }
}

impl From<Url> for Replica {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl FromStr for Replica {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s).map(Replica)
    }
}

impl fmt::Display for Replica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
