use crate::application::auth_service::AuthService;
use crate::application::catalog_service::CatalogService;
use crate::application::list_service::ListService;
use crate::domain::content::SearchKind;
use crate::domain::error::DomainError;
use crate::domain::gateway::MetadataGateway;
use crate::domain::list::{ContentType, ItemOrder, ListKind, NewListItem};
use crate::domain::repository::{ListRepository, UserRepository};
use crate::domain::user::User;
use crate::infrastructure::config::Config;
use crate::presentation::auth::session_removal_cookie;
use crate::presentation::flash::{FlashMessages, page, redirect_with_flash};
use crate::presentation::middleware::CurrentUser;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Shared services handed to every handler.
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub list_service: Arc<ListService>,
    pub catalog_service: Arc<CatalogService>,
    pub session_ttl_secs: i64,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        list_repository: Arc<dyn ListRepository>,
        gateway: Arc<dyn MetadataGateway>,
        config: &Config,
    ) -> Self {
        let list_service = Arc::new(ListService::new(list_repository));
        let auth_service = Arc::new(AuthService::new(
            user_repository,
            list_service.clone(),
            config.app_secret_key.clone(),
            config.session_ttl_secs,
        ));
        let catalog_service = Arc::new(CatalogService::new(
            gateway,
            config.tmdb_image_url.clone(),
        ));

        Self {
            auth_service,
            list_service,
            catalog_service,
            session_ttl_secs: config.session_ttl_secs,
            secure_cookies: config.secure_cookies,
        }
    }

    /// The logged-in user for pages that also serve anonymous visitors.
    pub async fn viewer(&self, identity: Option<CurrentUser>) -> Option<User> {
        let identity = identity?;
        self.auth_service
            .current_user(identity.user_id())
            .await
            .ok()
    }
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: serde_json::Value,
}

#[derive(Error, Debug)]
pub enum WebError {
    /// A recovered user or domain error: flash the message and send the
    /// browser to `location`.
    #[error("{message}")]
    Flash { message: String, location: String },
    #[error("Please log in to access this page.")]
    AuthenticationRequired,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn flash(message: impl Into<String>, location: impl Into<String>) -> Self {
        WebError::Flash {
            message: message.into(),
            location: location.into(),
        }
    }

    /// Turns user-input and domain errors into a flash + redirect to
    /// `location`; infrastructure failures keep their 5xx mapping.
    pub fn recover(err: anyhow::Error, location: &str) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::AuthenticationRequired) => WebError::AuthenticationRequired,
            Some(domain) if domain.is_recoverable() => WebError::flash(domain.to_string(), location),
            _ => WebError::from(err),
        }
    }
}

impl ResponseError for WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebError::Flash { .. } | WebError::AuthenticationRequired => StatusCode::SEE_OTHER,
            WebError::Validation(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WebError::Conflict(_) => StatusCode::CONFLICT,
            WebError::Upstream(_) => StatusCode::BAD_GATEWAY,
            WebError::Database(_) | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        match self {
            WebError::Flash { message, location } => {
                warn!(error = %message, location = %location, "Recovered request error");
                return redirect_with_flash(location, message);
            }
            WebError::AuthenticationRequired => {
                warn!("Anonymous request to protected page");
                // A signed token may outlive its user; drop it with the redirect
                let mut resp = redirect_with_flash("/login", &error_msg);
                if let Err(e) = resp.add_cookie(&session_removal_cookie()) {
                    error!(error = %e, "Failed to clear session cookie");
                }
                return resp;
            }
            WebError::Validation(_) | WebError::Conflict(_) => {
                warn!(error = %error_msg, status = %status, "Rejected request")
            }
            WebError::NotFound(_) => {
                warn!(error = %error_msg, status = %status, "Resource not found")
            }
            WebError::Unauthorized(_) => {
                warn!(error = %error_msg, status = %status, "Unauthorized")
            }
            WebError::Upstream(_) => {
                error!(error = %error_msg, status = %status, "Metadata provider error")
            }
            WebError::Database(_) => {
                error!(error = %error_msg, status = %status, "Database error")
            }
            WebError::Internal(_) => {
                error!(error = %error_msg, status = %status, "Internal error")
            }
        }

        let details = match self {
            WebError::Validation(msg)
            | WebError::NotFound(msg)
            | WebError::Unauthorized(msg)
            | WebError::Conflict(msg)
            | WebError::Upstream(msg) => serde_json::json!({ "message": msg }),
            _ => serde_json::json!({ "message": "Something went wrong. Please try again later." }),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_msg,
            details,
        })
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(msg)) => WebError::Validation(msg.clone()),
            Some(e @ (DomainError::PasswordMismatch | DomainError::Confirmation)) => {
                WebError::Validation(e.to_string())
            }
            Some(e @ (DomainError::DuplicateEmail | DomainError::AlreadyExists(_))) => {
                WebError::Conflict(e.to_string())
            }
            Some(e @ DomainError::InvalidCredentials(_)) => WebError::Unauthorized(e.to_string()),
            Some(DomainError::AuthenticationRequired) => WebError::AuthenticationRequired,
            Some(DomainError::NotFound(msg)) => WebError::NotFound(msg.clone()),
            Some(DomainError::RemoteUnavailable(msg)) => WebError::Upstream(msg.clone()),
            Some(DomainError::Internal(msg)) => WebError::Internal(msg.clone()),
            None => WebError::Database(format!("{:#}", err)),
        }
    }
}

/// Parses a required numeric content id from a query string.
fn parse_content_id(raw: Option<&str>) -> Result<i64, DomainError> {
    raw.map(str::trim)
        .filter(|id| !id.is_empty())
        .and_then(|id| id.parse::<i64>().ok())
        .ok_or_else(|| DomainError::Validation("A valid content id is required.".to_string()))
}

fn parse_content_type(raw: Option<&str>) -> Result<Option<ContentType>, DomainError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<ContentType>)
        .transpose()
}

fn parse_page(raw: Option<&str>) -> Result<Option<u32>, DomainError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<u32>()
                .map_err(|_| DomainError::Validation(format!("Invalid page number: {}", value)))
        })
        .transpose()
}

// Handlers

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

// Lists

#[derive(Debug, Default, Deserialize)]
pub struct AddItemQuery {
    pub id: Option<String>,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveItemQuery {
    pub id: Option<String>,
    pub content_type: Option<String>,
}

#[instrument(skip(state, flashes), fields(user_id = %user.user_id(), kind = %kind))]
async fn show_list(
    state: web::Data<AppState>,
    user: CurrentUser,
    flashes: FlashMessages,
    kind: ListKind,
) -> Result<HttpResponse, WebError> {
    let current_user = state.auth_service.current_user(user.user_id()).await?;
    let list = state.list_service.get_list(user.user_id(), kind).await?;
    let items = state
        .list_service
        .list_items(&list, ItemOrder::NewestFirst)
        .await?;

    Ok(page(
        &flashes,
        serde_json::json!({
            "page": kind.name().to_lowercase(),
            "current_user": current_user,
            "list": list,
            "items": items,
        }),
    ))
}

#[instrument(skip(state, query), fields(user_id = %user.user_id(), kind = %kind))]
async fn add_to_list(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: AddItemQuery,
    kind: ListKind,
) -> Result<HttpResponse, WebError> {
    let back = kind.path();
    let content_id =
        parse_content_id(query.id.as_deref()).map_err(|e| WebError::flash(e.to_string(), back))?;
    let content_type = parse_content_type(query.content_type.as_deref())
        .map_err(|e| WebError::flash(e.to_string(), back))?
        .ok_or_else(|| WebError::flash("A content type is required.", back))?;

    state.auth_service.current_user(user.user_id()).await?;
    let list = state
        .list_service
        .get_list(user.user_id(), kind)
        .await
        .map_err(|e| WebError::recover(e, back))?;
    let item = state
        .list_service
        .add_item(
            &list,
            NewListItem {
                content_id,
                content_type,
                title: query.title.unwrap_or_default(),
                poster_path: query.poster_path,
            },
        )
        .await
        .map_err(|e| WebError::recover(e, back))?;

    info!(content_id = content_id, "Added to list");
    Ok(redirect_with_flash(
        back,
        &format!("Added {} to your {}.", item.title, kind.name().to_lowercase()),
    ))
}

#[instrument(skip(state, query), fields(user_id = %user.user_id(), kind = %kind))]
async fn remove_from_list(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: RemoveItemQuery,
    kind: ListKind,
) -> Result<HttpResponse, WebError> {
    let back = kind.path();
    let content_id =
        parse_content_id(query.id.as_deref()).map_err(|e| WebError::flash(e.to_string(), back))?;
    let content_type = parse_content_type(query.content_type.as_deref())
        .map_err(|e| WebError::flash(e.to_string(), back))?;

    state.auth_service.current_user(user.user_id()).await?;
    let list = state
        .list_service
        .get_list(user.user_id(), kind)
        .await
        .map_err(|e| WebError::recover(e, back))?;
    state
        .list_service
        .remove_item(&list, content_id, content_type)
        .await
        .map_err(|e| WebError::recover(e, back))?;

    Ok(redirect_with_flash(
        back,
        &format!("Removed from your {}.", kind.name().to_lowercase()),
    ))
}

pub async fn watchlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    flashes: FlashMessages,
) -> Result<HttpResponse, WebError> {
    show_list(state, user, flashes, ListKind::Watchlist).await
}

pub async fn favourites(
    state: web::Data<AppState>,
    user: CurrentUser,
    flashes: FlashMessages,
) -> Result<HttpResponse, WebError> {
    show_list(state, user, flashes, ListKind::Favourites).await
}

pub async fn add_to_watchlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<AddItemQuery>,
) -> Result<HttpResponse, WebError> {
    add_to_list(state, user, query.into_inner(), ListKind::Watchlist).await
}

pub async fn add_to_favourites(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<AddItemQuery>,
) -> Result<HttpResponse, WebError> {
    add_to_list(state, user, query.into_inner(), ListKind::Favourites).await
}

pub async fn remove_from_watchlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<RemoveItemQuery>,
) -> Result<HttpResponse, WebError> {
    remove_from_list(state, user, query.into_inner(), ListKind::Watchlist).await
}

pub async fn remove_from_favourites(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<RemoveItemQuery>,
) -> Result<HttpResponse, WebError> {
    remove_from_list(state, user, query.into_inner(), ListKind::Favourites).await
}

// Catalog

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub choice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BrowseMoviesQuery {
    pub page_number: Option<String>,
    pub movie_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BrowseTvQuery {
    pub page_number: Option<String>,
    pub tv_show_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindQuery {
    pub id: Option<String>,
}

pub async fn search_page(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
) -> HttpResponse {
    let current_user = state.viewer(identity).await;
    page(
        &flashes,
        serde_json::json!({
            "page": "search",
            "current_user": current_user,
            "choices": [SearchKind::Movies, SearchKind::TvShows],
        }),
    )
}

#[instrument(skip(state, flashes, form), fields(query = %form.title))]
pub async fn search(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
    form: web::Form<SearchForm>,
) -> Result<HttpResponse, WebError> {
    let form = form.into_inner();
    let choice = form
        .choice
        .as_deref()
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .map(str::parse::<SearchKind>)
        .transpose()
        .map_err(|e| WebError::flash(e.to_string(), "/search"))?;
    let results = state
        .catalog_service
        .search(&form.title, choice)
        .await
        .map_err(|e| WebError::recover(e, "/search"))?;
    let current_user = state.viewer(identity).await;

    Ok(page(
        &flashes,
        serde_json::json!({
            "page": "select",
            "current_user": current_user,
            "query": form.title.trim(),
            "movie_options": results.movies,
            "tv_show_options": results.tv_shows,
        }),
    ))
}

#[instrument(skip(state, flashes))]
pub async fn browse_movies(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
    query: web::Query<BrowseMoviesQuery>,
) -> Result<HttpResponse, WebError> {
    let page_number =
        parse_page(query.page_number.as_deref()).map_err(|e| WebError::flash(e.to_string(), "/search"))?;
    let category = query.movie_type.as_deref().unwrap_or("popular");
    let results = state
        .catalog_service
        .browse(ContentType::Movie, category, page_number)
        .await
        .map_err(|e| WebError::recover(e, "/search"))?;
    let current_user = state.viewer(identity).await;

    Ok(page(
        &flashes,
        serde_json::json!({
            "page": "media-results",
            "current_user": current_user,
            "is_movie": true,
            "movie_type": category,
            "movies": results,
        }),
    ))
}

#[instrument(skip(state, flashes))]
pub async fn browse_tv_shows(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
    query: web::Query<BrowseTvQuery>,
) -> Result<HttpResponse, WebError> {
    let page_number =
        parse_page(query.page_number.as_deref()).map_err(|e| WebError::flash(e.to_string(), "/search"))?;
    let category = query.tv_show_type.as_deref().unwrap_or("popular");
    let results = state
        .catalog_service
        .browse(ContentType::Tv, category, page_number)
        .await
        .map_err(|e| WebError::recover(e, "/search"))?;
    let current_user = state.viewer(identity).await;

    Ok(page(
        &flashes,
        serde_json::json!({
            "page": "media-results",
            "current_user": current_user,
            "is_tv_show": true,
            "tv_show_type": category,
            "tv_shows": results,
        }),
    ))
}

async fn find_content(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
    query: FindQuery,
    content_type: ContentType,
) -> Result<HttpResponse, WebError> {
    let id = parse_content_id(query.id.as_deref())
        .map_err(|e| WebError::flash(e.to_string(), "/search"))?;
    let detail = state
        .catalog_service
        .get_content_detail(id, content_type)
        .await
        .map_err(|e| WebError::recover(e, "/search"))?;
    let current_user = state.viewer(identity).await;

    Ok(page(
        &flashes,
        serde_json::json!({
            "page": "content-info",
            "current_user": current_user,
            "is_movie": content_type == ContentType::Movie,
            "is_tv_show": content_type == ContentType::Tv,
            "content": detail,
        }),
    ))
}

#[instrument(skip(state, flashes))]
pub async fn find_movie(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
    query: web::Query<FindQuery>,
) -> Result<HttpResponse, WebError> {
    find_content(state, identity, flashes, query.into_inner(), ContentType::Movie).await
}

#[instrument(skip(state, flashes))]
pub async fn find_tv_show(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
    query: web::Query<FindQuery>,
) -> Result<HttpResponse, WebError> {
    find_content(state, identity, flashes, query.into_inner(), ContentType::Tv).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_id() {
        assert_eq!(parse_content_id(Some(" 42 ")).unwrap(), 42);
        assert!(parse_content_id(None).is_err());
        assert!(parse_content_id(Some("")).is_err());
        assert!(parse_content_id(Some("abc")).is_err());
    }

    #[test]
    fn test_parse_page_and_content_type_allow_absence() {
        assert_eq!(parse_page(None).unwrap(), None);
        assert_eq!(parse_page(Some("3")).unwrap(), Some(3));
        assert!(parse_page(Some("-1")).is_err());
        assert_eq!(parse_content_type(Some("")).unwrap(), None);
        assert_eq!(parse_content_type(Some("tv")).unwrap(), Some(ContentType::Tv));
    }

    #[test]
    fn test_recover_flashes_domain_errors_only() {
        let recovered = WebError::recover(
            DomainError::AlreadyExists("Item already exists in watchlist.".into()).into(),
            "/watchlist",
        );
        assert!(matches!(
            &recovered,
            WebError::Flash { location, .. } if location == "/watchlist"
        ));

        let upstream = WebError::recover(
            DomainError::RemoteUnavailable("timeout".into()).into(),
            "/search",
        );
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);

        let store = WebError::recover(anyhow::anyhow!("connection refused"), "/watchlist");
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_authentication_required_redirects_to_login() {
        let resp = WebError::AuthenticationRequired.error_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(actix_web::http::header::LOCATION).unwrap(),
            "/login"
        );
    }
}
