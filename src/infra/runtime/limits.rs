use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::core::error::{Result, SolvedAcError};
use crate::infra::config::RemoteSettings;

pub const LANGUAGE_HEADER: &str = "x-solvedac-language";
pub const MAX_REDIRECTS: usize = 10;

/// Build the shared solved.ac client: language header on every request,
/// fixed request timeout, redirects followed.
pub fn make_http_client(settings: &RemoteSettings) -> Result<reqwest::Client> {
    let language = HeaderValue::from_str(&settings.language).map_err(|_| {
        SolvedAcError::invalid_argument(format!("invalid language header value: {:?}", settings.language))
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(LANGUAGE_HEADER), language);

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(SolvedAcError::ClientBuild)
}
