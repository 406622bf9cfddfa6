//! Flash messages carried across a redirect in a short-lived cookie.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use microblog_types::flash::Flash;
use tracing::warn;

const COOKIE_NAME: &str = "flash";

pub fn set(jar: CookieJar, flash: &Flash) -> CookieJar {
    let value = match serde_json::to_vec(flash) {
        Ok(json) => B64.encode(json),
        Err(e) => {
            warn!("Dropping unserialisable flash message: {}", e);
            return jar;
        }
    };
    jar.add(
        Cookie::build((COOKIE_NAME, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Reads the pending flash, if any, and clears it so it shows only once.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(COOKIE_NAME) else {
        return (jar, None);
    };
    let flash = B64
        .decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok());
    (jar.remove(Cookie::build(COOKIE_NAME).path("/")), flash)
}

/// Redirect to `to`, showing `flash` on the next page.
pub fn redirect(jar: CookieJar, to: &str, flash: Flash) -> Response {
    (set(jar, &flash), Redirect::to(to)).into_response()
}
