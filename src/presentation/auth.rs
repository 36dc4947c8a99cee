use crate::domain::error::DomainError;
use crate::domain::user::{ChangePasswordRequest, CreateUser, LoginRequest};
use crate::presentation::flash::{FlashMessages, page, redirect, redirect_with_flash};
use crate::presentation::handlers::{AppState, WebError};
use crate::presentation::middleware::CurrentUser;
use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

pub const SESSION_COOKIE: &str = "session";

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(state.session_ttl_secs))
        .finish()
}

pub(crate) fn session_removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Redirect that also installs the session cookie.
fn start_session(state: &AppState, token: String, location: &str, message: &str) -> HttpResponse {
    let mut resp = redirect_with_flash(location, message);
    if let Err(e) = resp.add_cookie(&session_cookie(state, token)) {
        error!(error = %e, "Failed to attach session cookie");
    }
    resp
}

pub async fn register_page(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
) -> HttpResponse {
    if state.viewer(identity).await.is_some() {
        return redirect("/search");
    }
    page(&flashes, serde_json::json!({ "page": "register" }))
}

#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<CreateUser>,
) -> Result<HttpResponse, WebError> {
    info!("Registration request received");

    let user = match state.auth_service.register(form.into_inner()).await {
        Ok(user) => user,
        Err(e) => {
            return Err(match e.downcast_ref::<DomainError>() {
                Some(DomainError::DuplicateEmail) => {
                    WebError::flash(DomainError::DuplicateEmail.to_string(), "/login")
                }
                _ => WebError::recover(e, "/register"),
            });
        }
    };
    let token = state.auth_service.issue_session(&user)?;

    Ok(start_session(
        &state,
        token,
        "/search",
        &format!("Welcome, {}!", user.name),
    ))
}

pub async fn login_page(
    state: web::Data<AppState>,
    identity: Option<CurrentUser>,
    flashes: FlashMessages,
) -> HttpResponse {
    if state.viewer(identity).await.is_some() {
        return redirect("/search");
    }
    page(&flashes, serde_json::json!({ "page": "login" }))
}

#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginRequest>,
) -> Result<HttpResponse, WebError> {
    info!("Login request received");

    let session = state
        .auth_service
        .login(form.into_inner())
        .await
        .map_err(|e| WebError::recover(e, "/login"))?;

    Ok(start_session(
        &state,
        session.token,
        "/search",
        &format!("Welcome back, {}!", session.user.name),
    ))
}

pub async fn logout() -> HttpResponse {
    let mut resp = redirect_with_flash("/search", "You have been logged out.");
    if let Err(e) = resp.add_cookie(&session_removal_cookie()) {
        error!(error = %e, "Failed to clear session cookie");
    }
    resp
}

#[instrument(skip(state, flashes), fields(user_id = %user.user_id()))]
pub async fn edit_profile(
    state: web::Data<AppState>,
    user: CurrentUser,
    flashes: FlashMessages,
) -> Result<HttpResponse, WebError> {
    let current_user = state.auth_service.current_user(user.user_id()).await?;
    let lists = state.list_service.lists_for_user(user.user_id()).await?;

    Ok(page(
        &flashes,
        serde_json::json!({
            "page": "edit-profile",
            "current_user": current_user,
            "lists": lists,
        }),
    ))
}

pub async fn change_password_page(
    state: web::Data<AppState>,
    user: CurrentUser,
    flashes: FlashMessages,
) -> Result<HttpResponse, WebError> {
    let current_user = state.auth_service.current_user(user.user_id()).await?;
    Ok(page(
        &flashes,
        serde_json::json!({
            "page": "change-password",
            "current_user": current_user,
        }),
    ))
}

#[instrument(skip(state, form), fields(user_id = %user.user_id()))]
pub async fn change_password(
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<ChangePasswordRequest>,
) -> Result<HttpResponse, WebError> {
    state
        .auth_service
        .change_password(user.user_id(), form.into_inner())
        .await
        .map_err(|e| WebError::recover(e, "/change-password"))?;

    Ok(redirect_with_flash(
        "/edit-profile",
        "Password changed successfully.",
    ))
}
