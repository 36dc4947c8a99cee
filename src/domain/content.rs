use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::list::ContentType;

/// Highest page TMDB will serve for list endpoints.
pub const MAX_PAGE: u32 = 500;

/// Number of cast members shown on a detail page.
pub const TOP_CAST: usize = 10;

/// One entry of a search, browse or "similar" result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: i64,
    pub title: String,
    pub content_type: ContentType,
    pub poster_path: Option<String>,
    pub overview: String,
    pub release_date: Option<String>,
    pub vote_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default)]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Movie details as served by the metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// TV show details as served by the metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TvShowRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub created_by: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetail {
    pub id: i64,
    pub title: String,
    pub content_type: ContentType,
    pub director: Option<String>,
    pub cast: Vec<String>,
    pub genres: Vec<String>,
    pub overview: String,
    pub release_date: Option<String>,
    pub tagline: Option<String>,
    pub runtime: Option<u32>,
    pub user_score: u32,
    pub poster_url: Option<String>,
    pub similar: Vec<ContentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TvShowDetail {
    pub id: i64,
    pub title: String,
    pub content_type: ContentType,
    pub creator: Option<String>,
    pub cast: Vec<String>,
    pub genres: Vec<String>,
    pub overview: String,
    pub first_air_date: Option<String>,
    pub episode_run_time: Option<u32>,
    pub number_of_seasons: Option<u32>,
    pub tagline: Option<String>,
    pub user_score: u32,
    pub poster_url: Option<String>,
    pub similar: Vec<ContentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentDetail {
    Movie(MovieDetail),
    Tv(TvShowDetail),
}

/// What a search form asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchKind {
    #[serde(rename = "Movies")]
    Movies,
    #[serde(rename = "TV Shows")]
    TvShows,
}

impl std::str::FromStr for SearchKind {
    type Err = DomainError;

    /// Accepts the labels shown on the search form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Movies" => Ok(SearchKind::Movies),
            "TV Shows" => Ok(SearchKind::TvShows),
            other => Err(DomainError::Validation(format!(
                "Unknown search choice: {}",
                other
            ))),
        }
    }
}

impl SearchKind {
    pub fn includes(&self, content_type: ContentType) -> bool {
        matches!(
            (self, content_type),
            (SearchKind::Movies, ContentType::Movie) | (SearchKind::TvShows, ContentType::Tv)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub movies: Vec<ContentSummary>,
    pub tv_shows: Vec<ContentSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieCategory {
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TvCategory {
    Popular,
    TopRated,
    OnTheAir,
    AiringToday,
}

/// A browsable listing on the metadata provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseCategory {
    Movie(MovieCategory),
    Tv(TvCategory),
}

impl BrowseCategory {
    pub fn parse(content_type: ContentType, raw: &str) -> Result<Self, DomainError> {
        let category = match (content_type, raw.trim()) {
            (ContentType::Movie, "popular") => BrowseCategory::Movie(MovieCategory::Popular),
            (ContentType::Movie, "top_rated") => BrowseCategory::Movie(MovieCategory::TopRated),
            (ContentType::Movie, "now_playing") => {
                BrowseCategory::Movie(MovieCategory::NowPlaying)
            }
            (ContentType::Movie, "upcoming") => BrowseCategory::Movie(MovieCategory::Upcoming),
            (ContentType::Tv, "popular") => BrowseCategory::Tv(TvCategory::Popular),
            (ContentType::Tv, "top_rated") => BrowseCategory::Tv(TvCategory::TopRated),
            (ContentType::Tv, "on_the_air") => BrowseCategory::Tv(TvCategory::OnTheAir),
            (ContentType::Tv, "airing_today") => BrowseCategory::Tv(TvCategory::AiringToday),
            (_, other) => {
                return Err(DomainError::Validation(format!(
                    "Unknown {} category: {}",
                    content_type, other
                )));
            }
        };
        Ok(category)
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            BrowseCategory::Movie(_) => ContentType::Movie,
            BrowseCategory::Tv(_) => ContentType::Tv,
        }
    }

    /// Path segment used by the provider, e.g. `top_rated`.
    pub fn slug(&self) -> &'static str {
        match self {
            BrowseCategory::Movie(MovieCategory::Popular)
            | BrowseCategory::Tv(TvCategory::Popular) => "popular",
            BrowseCategory::Movie(MovieCategory::TopRated)
            | BrowseCategory::Tv(TvCategory::TopRated) => "top_rated",
            BrowseCategory::Movie(MovieCategory::NowPlaying) => "now_playing",
            BrowseCategory::Movie(MovieCategory::Upcoming) => "upcoming",
            BrowseCategory::Tv(TvCategory::OnTheAir) => "on_the_air",
            BrowseCategory::Tv(TvCategory::AiringToday) => "airing_today",
        }
    }
}

/// Provider vote average (0-10) as a percentage score.
pub fn user_score(vote_average: f64) -> u32 {
    if !vote_average.is_finite() {
        return 0;
    }
    (vote_average * 10.0).round().clamp(0.0, 100.0) as u32
}
