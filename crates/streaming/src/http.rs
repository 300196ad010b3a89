use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::protocol::{City, LocationRecord, MovieDetail, Suggestions};
use crate::request::{
    CITIES_PATH, LOCATIONS_PATH, LocationQuery, MovieQuery, SEARCH_PATH, SearchQuery,
};
use crate::source::{Backend, BoxFuture, Endpoint, FetchError, FetchErrorKind};

/// `Backend` over the JSON endpoints of a running server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                FetchError::with_source(endpoint, FetchErrorKind::Network, e.to_string(), e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                body.to_string()
            };
            return Err(FetchError::new(
                endpoint,
                FetchErrorKind::Status(status.as_u16()),
                message,
            ));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| {
                FetchError::with_source(endpoint, FetchErrorKind::Network, e.to_string(), e)
            })?;
        serde_json::from_str(&text).map_err(|e| {
            FetchError::with_source(endpoint, FetchErrorKind::Decode, e.to_string(), e)
        })
    }
}

impl Backend for HttpBackend {
    fn fetch_locations(
        &self,
        query: LocationQuery,
    ) -> BoxFuture<'_, Result<Vec<LocationRecord>, FetchError>> {
        Box::pin(async move {
            self.get_json(Endpoint::Locations, LOCATIONS_PATH, &query.query_pairs())
                .await
        })
    }

    fn fetch_movie(&self, query: MovieQuery) -> BoxFuture<'_, Result<MovieDetail, FetchError>> {
        Box::pin(async move {
            self.get_json(Endpoint::Movie, &query.path(), &query.query_pairs())
                .await
        })
    }

    fn search(&self, query: SearchQuery) -> BoxFuture<'_, Result<Suggestions, FetchError>> {
        Box::pin(async move {
            if query.is_blank() {
                return Ok(Suggestions::default());
            }
            self.get_json(Endpoint::Search, SEARCH_PATH, &query.query_pairs())
                .await
        })
    }

    fn fetch_cities(&self) -> BoxFuture<'_, Result<Vec<City>, FetchError>> {
        Box::pin(async move { self.get_json(Endpoint::Cities, CITIES_PATH, &[]).await })
    }
}
