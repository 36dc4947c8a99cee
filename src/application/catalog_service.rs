use crate::domain::content::{
    BrowseCategory, ContentDetail, ContentSummary, Credits, MAX_PAGE, MovieDetail, MovieRecord,
    Page, SearchKind, SearchResults, TOP_CAST, TvShowDetail, TvShowRecord, user_score,
};
use crate::domain::error::DomainError;
use crate::domain::gateway::MetadataGateway;
use crate::domain::list::ContentType;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct CatalogService {
    gateway: Arc<dyn MetadataGateway>,
    image_base_url: String,
}

impl CatalogService {
    pub fn new(gateway: Arc<dyn MetadataGateway>, image_base_url: String) -> Self {
        Self {
            gateway,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Searches movies and/or TV shows by title. `kind` narrows the search;
    /// both run concurrently when it is absent.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, kind: Option<SearchKind>) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::Validation("Please enter a title to search for.".into()).into());
        }
        let wants = |content_type: ContentType| kind.is_none_or(|k| k.includes(content_type));

        let movies = async {
            if wants(ContentType::Movie) {
                self.gateway.search(ContentType::Movie, query).await
            } else {
                Ok(Vec::new())
            }
        };
        let tv_shows = async {
            if wants(ContentType::Tv) {
                self.gateway.search(ContentType::Tv, query).await
            } else {
                Ok(Vec::new())
            }
        };
        let (movies, tv_shows) = tokio::try_join!(movies, tv_shows)?;

        info!(
            movies = movies.len(),
            tv_shows = tv_shows.len(),
            "Search completed"
        );
        Ok(SearchResults { movies, tv_shows })
    }

    pub async fn get_content_detail(
        &self,
        id: i64,
        content_type: ContentType,
    ) -> Result<ContentDetail> {
        match content_type {
            ContentType::Movie => self.movie_detail(id).await.map(ContentDetail::Movie),
            ContentType::Tv => self.tv_show_detail(id).await.map(ContentDetail::Tv),
        }
    }

    #[instrument(skip(self))]
    pub async fn movie_detail(&self, id: i64) -> Result<MovieDetail> {
        let (record, similar, credits) = tokio::try_join!(
            self.gateway.movie(id),
            self.gateway.similar(ContentType::Movie, id),
            self.gateway.credits(ContentType::Movie, id),
        )?;
        Ok(self.assemble_movie(record, similar, credits))
    }

    #[instrument(skip(self))]
    pub async fn tv_show_detail(&self, id: i64) -> Result<TvShowDetail> {
        let (record, similar, credits) = tokio::try_join!(
            self.gateway.tv_show(id),
            self.gateway.similar(ContentType::Tv, id),
            self.gateway.credits(ContentType::Tv, id),
        )?;
        Ok(self.assemble_tv_show(record, similar, credits))
    }

    /// One page of a provider listing such as `popular` or `on_the_air`.
    #[instrument(skip(self))]
    pub async fn browse(
        &self,
        content_type: ContentType,
        category: &str,
        page: Option<u32>,
    ) -> Result<Page<ContentSummary>> {
        let category = BrowseCategory::parse(content_type, category)?;
        let page = page.unwrap_or(1);
        if !(1..=MAX_PAGE).contains(&page) {
            return Err(DomainError::Validation(format!(
                "Page must be between 1 and {}.",
                MAX_PAGE
            ))
            .into());
        }
        self.gateway.browse(category, page).await
    }

    fn poster_url(&self, poster_path: Option<&str>) -> Option<String> {
        poster_path
            .map(|path| path.trim_start_matches('/'))
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}/{}", self.image_base_url, path))
    }

    fn assemble_movie(
        &self,
        record: MovieRecord,
        similar: Vec<ContentSummary>,
        credits: Credits,
    ) -> MovieDetail {
        let director = credits
            .crew
            .iter()
            .find(|member| member.job == "Director")
            .map(|member| member.name.clone());

        MovieDetail {
            id: record.id,
            title: record.title,
            content_type: ContentType::Movie,
            director,
            cast: top_cast(&credits),
            genres: record.genres.into_iter().map(|genre| genre.name).collect(),
            overview: record.overview,
            release_date: record.release_date,
            tagline: record.tagline,
            runtime: record.runtime,
            user_score: user_score(record.vote_average),
            poster_url: self.poster_url(record.poster_path.as_deref()),
            similar,
        }
    }

    fn assemble_tv_show(
        &self,
        record: TvShowRecord,
        similar: Vec<ContentSummary>,
        credits: Credits,
    ) -> TvShowDetail {
        TvShowDetail {
            id: record.id,
            title: record.name,
            content_type: ContentType::Tv,
            creator: record.created_by.into_iter().next().map(|person| person.name),
            cast: top_cast(&credits),
            genres: record.genres.into_iter().map(|genre| genre.name).collect(),
            overview: record.overview,
            first_air_date: record.first_air_date,
            episode_run_time: record.episode_run_time.first().copied(),
            number_of_seasons: record.number_of_seasons,
            tagline: record.tagline,
            user_score: user_score(record.vote_average),
            poster_url: self.poster_url(record.poster_path.as_deref()),
            similar,
        }
    }
}

fn top_cast(credits: &Credits) -> Vec<String> {
    credits
        .cast
        .iter()
        .take(TOP_CAST)
        .map(|member| member.name.clone())
        .collect()
}
