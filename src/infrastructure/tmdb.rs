//! TMDB v3 client implementing the metadata gateway.

use crate::domain::content::{
    BrowseCategory, ContentSummary, Credits, MovieRecord, Page, TvShowRecord,
};
use crate::domain::error::DomainError;
use crate::domain::gateway::MetadataGateway;
use crate::domain::list::ContentType;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const LANGUAGE: &str = "en-US";

/// A search/browse/similar result entry. Movies carry `title` and
/// `release_date`, TV shows `name` and `first_air_date`.
#[derive(Debug, Deserialize)]
struct TmdbResult {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    vote_average: f64,
}

impl TmdbResult {
    fn into_summary(self, content_type: ContentType) -> ContentSummary {
        let (title, release_date) = match content_type {
            ContentType::Movie => (self.title.or(self.name), self.release_date),
            ContentType::Tv => (self.name.or(self.title), self.first_air_date),
        };
        ContentSummary {
            id: self.id,
            title: title.unwrap_or_default(),
            content_type,
            poster_path: self.poster_path,
            overview: self.overview.unwrap_or_default(),
            release_date: release_date.filter(|date| !date.is_empty()),
            vote_average: self.vote_average,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TmdbPage {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    results: Vec<TmdbResult>,
}

fn first_page() -> u32 {
    1
}

impl TmdbPage {
    fn into_page(self, content_type: ContentType) -> Page<ContentSummary> {
        Page {
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
            results: self
                .results
                .into_iter()
                .map(|result| result.into_summary(content_type))
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct TmdbGateway {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbGateway {
    /// Builds a client whose every request is bounded by `timeout`.
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.api_url, path);
        debug!(url = %url, "Calling metadata provider");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Metadata request failed");
                DomainError::RemoteUnavailable(format!("request to {} failed: {}", path, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(url = %url, status = %status, "Metadata provider returned an error status");
            return Err(DomainError::RemoteUnavailable(format!(
                "{} returned status {}",
                path, status
            ))
            .into());
        }

        let body = response.json::<T>().await.map_err(|e| {
            warn!(url = %url, error = %e, "Metadata response could not be decoded");
            DomainError::RemoteUnavailable(format!("malformed response from {}: {}", path, e))
        })?;
        Ok(body)
    }
}

#[async_trait]
impl MetadataGateway for TmdbGateway {
    #[instrument(skip(self))]
    async fn search(
        &self,
        content_type: ContentType,
        query: &str,
    ) -> Result<Vec<ContentSummary>> {
        let path = format!("search/{}", content_type);
        let page: TmdbPage = self
            .get_json(
                &path,
                &[("query", query.to_string()), ("page", "1".to_string())],
            )
            .await?;
        Ok(page.into_page(content_type).results)
    }

    #[instrument(skip(self))]
    async fn movie(&self, id: i64) -> Result<MovieRecord> {
        self.get_json(&format!("movie/{}", id), &[]).await
    }

    #[instrument(skip(self))]
    async fn tv_show(&self, id: i64) -> Result<TvShowRecord> {
        self.get_json(&format!("tv/{}", id), &[]).await
    }

    #[instrument(skip(self))]
    async fn similar(&self, content_type: ContentType, id: i64) -> Result<Vec<ContentSummary>> {
        let page: TmdbPage = self
            .get_json(&format!("{}/{}/similar", content_type, id), &[])
            .await?;
        Ok(page.into_page(content_type).results)
    }

    #[instrument(skip(self))]
    async fn credits(&self, content_type: ContentType, id: i64) -> Result<Credits> {
        self.get_json(&format!("{}/{}/credits", content_type, id), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn browse(&self, category: BrowseCategory, page: u32) -> Result<Page<ContentSummary>> {
        let content_type = category.content_type();
        let body: TmdbPage = self
            .get_json(
                &format!("{}/{}", content_type, category.slug()),
                &[("page", page.to_string())],
            )
            .await?;
        Ok(body.into_page(content_type))
    }
}
