use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, Response, StatusCode, Url};
use thiserror::Error;
use tracing::warn;

/// The only origins the gateway will fetch from. Matching is exact host or
/// subdomain suffix; substring matches are not accepted.
pub const ALLOWED_IMAGE_HOSTS: &[&str] = &[
    "i.imgur.com",
    "imgur.com",
    "drive.google.com",
    "lh3.googleusercontent.com",
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("url token could not be decoded")]
    MalformedToken,
    #[error("image host is not allow-listed")]
    DomainRejected,
    #[error("upstream image responded {0}")]
    UpstreamStatus(StatusCode),
    #[error("upstream image fetch failed")]
    Upstream,
}

/// Recover the origin URL from an opaque proxy token. The token is
/// untrusted input; every failure mode collapses to `MalformedToken`.
pub fn decode_token(token: &str) -> Result<Url, ProxyError> {
    // Query decoding turns an unescaped '+' into a space; undo it so
    // standard-alphabet tokens still decode.
    let token = token.trim().replace(' ', "+");
    let bytes = BASE64
        .decode(token)
        .map_err(|_| ProxyError::MalformedToken)?;
    let raw = String::from_utf8(bytes).map_err(|_| ProxyError::MalformedToken)?;
    Url::parse(&raw).map_err(|_| ProxyError::MalformedToken)
}

pub fn host_allowed(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    ALLOWED_IMAGE_HOSTS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

/// Fetch the origin asset. Non-success statuses map to `UpstreamStatus`
/// (served as not-found); transport failures map to `Upstream`. Neither
/// carries the origin URL, which must never reach the client.
pub async fn fetch_image(http: &Client, origin: Url) -> Result<Response, ProxyError> {
    let response = http
        .get(origin)
        .header("Accept", "image/*,*/*;q=0.8")
        .send()
        .await
        .map_err(|err| {
            warn!(
                target = "zahara.proxy",
                error_kind = ?err.status(),
                timeout = err.is_timeout(),
                "image_fetch_failed"
            );
            ProxyError::Upstream
        })?;

    if !response.status().is_success() {
        return Err(ProxyError::UpstreamStatus(response.status()));
    }
    Ok(response)
}
