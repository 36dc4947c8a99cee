use anyhow::Result;
use async_trait::async_trait;

use crate::domain::content::{
    BrowseCategory, ContentSummary, Credits, MovieRecord, Page, TvShowRecord,
};
use crate::domain::list::ContentType;

/// Remote movie/TV metadata provider.
///
/// Implementations report every upstream failure (transport, status,
/// decoding) as `DomainError::RemoteUnavailable`.
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    /// First page of title matches.
    async fn search(&self, content_type: ContentType, query: &str)
    -> Result<Vec<ContentSummary>>;

    async fn movie(&self, id: i64) -> Result<MovieRecord>;

    async fn tv_show(&self, id: i64) -> Result<TvShowRecord>;

    async fn similar(&self, content_type: ContentType, id: i64) -> Result<Vec<ContentSummary>>;

    async fn credits(&self, content_type: ContentType, id: i64) -> Result<Credits>;

    async fn browse(&self, category: BrowseCategory, page: u32) -> Result<Page<ContentSummary>>;
}
