use std::convert::Infallible;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use maud::Markup;

use crate::app::views;
use crate::config::SecretKey;
use crate::error::AppError;
use crate::session::{self, Flash};

/// The flash notice sent with this request, if any. Rendering a page through
/// it consumes the notice.
#[derive(Debug, Default)]
pub struct IncomingFlash {
    flash: Option<Flash>,
    cookie_present: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
    SecretKey: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = SecretKey::from_ref(state);
        let raw = session::read_cookie(&parts.headers, session::FLASH_COOKIE);
        let flash = raw.and_then(|value| session::decode_flash(&key, value));
        if raw.is_some() && flash.is_none() {
            tracing::debug!("ignoring invalid flash cookie");
        }
        Ok(Self {
            flash,
            cookie_present: raw.is_some(),
        })
    }
}

impl IncomingFlash {
    pub fn render(self, title: &str, body: Markup) -> Page {
        Page {
            markup: views::layout(title, self.flash.as_ref(), body),
            clear_flash: self.cookie_present,
        }
    }
}

/// A full HTML page. Clears the flash cookie when one was consumed.
pub struct Page {
    markup: Markup,
    clear_flash: bool,
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let mut resp = Html(self.markup.into_string()).into_response();
        if self.clear_flash {
            if let Ok(value) = HeaderValue::from_str(&session::flash_clear_cookie()) {
                resp.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        resp
    }
}

/// `303 See Other` to `to`, carrying `flash` for the next page.
pub fn redirect_with_flash(key: &SecretKey, to: &str, flash: &Flash) -> Result<Response, AppError> {
    let cookie = session::flash_set_cookie(key, flash)?;
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|err| AppError::Internal(format!("flash cookie header: {err}")))?;

    let mut resp = Redirect::to(to).into_response();
    resp.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(resp)
}
