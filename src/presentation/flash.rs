//! One-shot messages carried across a redirect in a cookie.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use std::convert::Infallible;
use std::future::{Ready, ready};
use tracing::debug;

pub const FLASH_COOKIE: &str = "_flash";

fn encode(messages: &[String]) -> String {
    let json = serde_json::to_vec(messages).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode(value: &str) -> Vec<String> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn flash_cookie(messages: &[String]) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, encode(messages))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Messages left by the previous response. Extracting never fails; a
/// missing or garbled cookie yields no messages.
#[derive(Debug, Default, Clone)]
pub struct FlashMessages(Vec<String>);

impl FlashMessages {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromRequest for FlashMessages {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let messages = req
            .cookie(FLASH_COOKIE)
            .map(|cookie| decode(cookie.value()))
            .unwrap_or_default();
        ready(Ok(FlashMessages(messages)))
    }
}

#[derive(Serialize)]
struct PageEnvelope<'a, T: Serialize> {
    flashes: &'a [String],
    #[serde(flatten)]
    page: T,
}

/// Renders a page view model as JSON, consuming pending flash messages.
pub fn page<T: Serialize>(flashes: &FlashMessages, page: T) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    if !flashes.is_empty() {
        builder.cookie(removal_cookie());
    }
    builder.json(PageEnvelope {
        flashes: flashes.messages(),
        page,
    })
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

pub fn redirect_with_flash(location: &str, message: &str) -> HttpResponse {
    debug!(location = location, message = message, "Redirecting with flash");
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .cookie(flash_cookie(&[message.to_string()]))
        .finish()
}
