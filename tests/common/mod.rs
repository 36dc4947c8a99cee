#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::web;
use anyhow::Result;
use async_trait::async_trait;
use cinelist::data::list_repository::InMemoryListRepository;
use cinelist::data::user_repository::InMemoryUserRepository;
use cinelist::domain::content::{
    BrowseCategory, CastMember, ContentSummary, Credits, CrewMember, MovieRecord, Page,
    TvShowRecord,
};
use cinelist::domain::error::DomainError;
use cinelist::domain::gateway::MetadataGateway;
use cinelist::domain::list::ContentType;
use cinelist::infrastructure::config::Config;
use cinelist::presentation::auth::SESSION_COOKIE;
use cinelist::presentation::flash::FLASH_COOKIE;
use cinelist::presentation::handlers::AppState;
use std::sync::Arc;

/// Movie id the fake provider fails on, as if it timed out.
pub const UNREACHABLE_ID: i64 = 999;

/// Canned metadata provider. Titles echo the query so tests can tell
/// which search produced a result.
pub struct FakeGateway;

fn summary(id: i64, title: &str, content_type: ContentType) -> ContentSummary {
    ContentSummary {
        id,
        title: title.to_string(),
        content_type,
        poster_path: Some(format!("/{}.jpg", id)),
        overview: String::new(),
        release_date: None,
        vote_average: 7.0,
    }
}

#[async_trait]
impl MetadataGateway for FakeGateway {
    async fn search(&self, content_type: ContentType, query: &str) -> Result<Vec<ContentSummary>> {
        let id = match content_type {
            ContentType::Movie => 1,
            ContentType::Tv => 2,
        };
        Ok(vec![summary(id, &format!("{} ({})", query, content_type), content_type)])
    }

    async fn movie(&self, id: i64) -> Result<MovieRecord> {
        if id == UNREACHABLE_ID {
            return Err(DomainError::RemoteUnavailable("timed out".into()).into());
        }
        Ok(MovieRecord {
            id,
            title: "Alien".into(),
            vote_average: 8.46,
            poster_path: Some("/alien.jpg".into()),
            ..MovieRecord::default()
        })
    }

    async fn tv_show(&self, id: i64) -> Result<TvShowRecord> {
        if id == UNREACHABLE_ID {
            return Err(DomainError::RemoteUnavailable("timed out".into()).into());
        }
        Ok(TvShowRecord {
            id,
            name: "Firefly".into(),
            episode_run_time: vec![44],
            ..TvShowRecord::default()
        })
    }

    async fn similar(&self, content_type: ContentType, _id: i64) -> Result<Vec<ContentSummary>> {
        Ok(vec![summary(77, "Something Similar", content_type)])
    }

    async fn credits(&self, _content_type: ContentType, _id: i64) -> Result<Credits> {
        Ok(Credits {
            cast: (0..12)
                .map(|i| CastMember {
                    name: format!("Actor {}", i),
                    character: None,
                })
                .collect(),
            crew: vec![CrewMember {
                name: "Ridley Scott".into(),
                job: "Director".into(),
            }],
        })
    }

    async fn browse(&self, category: BrowseCategory, page: u32) -> Result<Page<ContentSummary>> {
        Ok(Page {
            page,
            total_pages: 500,
            total_results: 10000,
            results: vec![summary(5, category.slug(), category.content_type())],
        })
    }
}

pub fn test_config() -> Config {
    Config::from_vars(vec![
        ("APP_SECRET_KEY".to_string(), "test-secret-key-for-testing-only".to_string()),
        ("API_KEY".to_string(), "tmdb-test-key".to_string()),
    ])
    .unwrap()
}

pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryListRepository::new()),
        Arc::new(FakeGateway),
        &test_config(),
    ))
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.into_owned())
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    response_cookie(resp, SESSION_COOKIE).expect("session cookie set")
}

pub fn flash_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    response_cookie(resp, FLASH_COOKIE).expect("flash cookie set")
}

/// Builds the full application around `test_state()`.
macro_rules! setup_app {
    () => {{
        let state = common::test_state();
        let app = actix_web::test::init_service(
            actix_web::App::new()
                .app_data(state.clone())
                .wrap(cinelist::presentation::middleware::SessionMiddleware)
                .wrap(cinelist::presentation::middleware::TimingMiddleware)
                .wrap(cinelist::presentation::middleware::RequestIdMiddleware)
                .configure(cinelist::presentation::routes::configure),
        )
        .await;
        (app, state)
    }};
}

/// Registers a user through the form and returns the session cookie.
macro_rules! register_user {
    ($app:expr, $name:expr, $email:expr, $password:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/register")
            .set_form(&cinelist::domain::user::CreateUser {
                name: $name.to_string(),
                email: $email.to_string(),
                password: $password.to_string(),
            })
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::SEE_OTHER);
        assert_eq!(common::location(&resp), "/search");
        common::session_cookie(&resp)
    }};
}
