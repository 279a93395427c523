//! One-shot flash messages carried across a redirect in a cookie.

use axum::http::{HeaderMap, HeaderValue};
use base64ct::{Base64UrlUnpadded, Encoding};
use tracing::debug;

use super::context::cookie_value;
use crate::settings::Flash;

pub(crate) const FLASH_COOKIE: &str = "orgadmin_flash";

/// `Set-Cookie` value carrying `flash` to the next request.
pub(crate) fn set_cookie(flash: &Flash) -> Option<HeaderValue> {
    let json = serde_json::to_vec(flash).ok()?;
    let encoded = Base64UrlUnpadded::encode_string(&json);
    HeaderValue::from_str(&format!(
        "{FLASH_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

/// `Set-Cookie` value consuming the flash.
pub(crate) fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("orgadmin_flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Reads the pending flash, if any. A malformed cookie is ignored.
pub(crate) fn pending(headers: &HeaderMap) -> Option<Flash> {
    let encoded = cookie_value(headers, FLASH_COOKIE).filter(|value| !value.is_empty())?;
    let decoded = Base64UrlUnpadded::decode_vec(&encoded)
        .map_err(|err| debug!("ignoring malformed flash cookie: {err}"))
        .ok()?;
    serde_json::from_slice(&decoded)
        .map_err(|err| debug!("ignoring malformed flash cookie: {err}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn request_headers(set_cookie: &HeaderValue) -> HeaderMap {
        let pair = set_cookie
            .to_str()
            .ok()
            .and_then(|value| value.split(';').next())
            .unwrap_or_default()
            .to_string();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pair).expect("cookie header"));
        headers
    }

    #[test]
    fn flash_survives_the_cookie() {
        let flash = Flash::error("failed to delete webhook: record not found");
        let cookie = set_cookie(&flash).expect("cookie");

        assert_eq!(pending(&request_headers(&cookie)), Some(flash));
    }

    #[test]
    fn cleared_or_garbled_cookie_yields_nothing() {
        assert_eq!(pending(&request_headers(&clear_cookie())), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("orgadmin_flash=%%%"));
        assert_eq!(pending(&headers), None);
    }
}
