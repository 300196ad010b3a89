//! Backend abstraction for the browser's data endpoints.
//!
//! The engine never performs I/O itself: it hands queries to a driver, and
//! the driver runs them against a `Backend` and feeds the results back.

use std::future::Future;
use std::pin::Pin;

use crate::protocol::{City, LocationRecord, MovieDetail, Suggestions};
use crate::request::{LocationQuery, MovieQuery, SearchQuery};

/// Which endpoint a fetch targeted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Locations,
    Movie,
    Search,
    Cities,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Locations => "locations",
            Endpoint::Movie => "movie",
            Endpoint::Search => "search",
            Endpoint::Cities => "cities",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection refused, timeout, TLS, ...
    Network,
    /// Non-2xx response.
    Status(u16),
    /// Body was not the expected JSON shape.
    Decode,
}

/// Failure of a single backend request.
#[derive(Debug)]
pub struct FetchError {
    pub endpoint: Endpoint,
    pub kind: FetchErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FetchErrorKind::Network => {
                write!(f, "{} fetch failed: {}", self.endpoint, self.message)
            }
            FetchErrorKind::Status(code) => {
                write!(f, "{} fetch returned HTTP {code}: {}", self.endpoint, self.message)
            }
            FetchErrorKind::Decode => {
                write!(f, "{} response malformed: {}", self.endpoint, self.message)
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl FetchError {
    pub fn new(endpoint: Endpoint, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        endpoint: Endpoint,
        kind: FetchErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            endpoint,
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The four read-only endpoints the browser consumes.
///
/// Methods return boxed futures for dyn-compatibility.
pub trait Backend: Send + Sync {
    fn fetch_locations(
        &self,
        query: LocationQuery,
    ) -> BoxFuture<'_, Result<Vec<LocationRecord>, FetchError>>;

    fn fetch_movie(&self, query: MovieQuery) -> BoxFuture<'_, Result<MovieDetail, FetchError>>;

    fn search(&self, query: SearchQuery) -> BoxFuture<'_, Result<Suggestions, FetchError>>;

    fn fetch_cities(&self) -> BoxFuture<'_, Result<Vec<City>, FetchError>>;
}

#[cfg(test)]
mod tests {
    use super::{Endpoint, FetchError, FetchErrorKind};
    use std::error::Error as _;

    #[test]
    fn display_names_endpoint_and_kind() {
        let e = FetchError::new(Endpoint::Locations, FetchErrorKind::Status(400), "Invalid bounds");
        assert_eq!(
            e.to_string(),
            "locations fetch returned HTTP 400: Invalid bounds"
        );
        let e = FetchError::new(Endpoint::Search, FetchErrorKind::Decode, "expected object");
        assert_eq!(e.to_string(), "search response malformed: expected object");
    }

    #[test]
    fn source_is_exposed() {
        let inner = std::io::Error::other("reset by peer");
        let e = FetchError::with_source(Endpoint::Cities, FetchErrorKind::Network, "io", inner);
        assert!(e.source().is_some());
    }
}
