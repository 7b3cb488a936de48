use std::time::Instant;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::core::error::{Result, SolvedAcError};
use crate::domain::{ProblemSearchResult, UserInfo};
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::lifecycle::RemoteClientHandle;

pub const USER_SHOW_PATH: &str = "/user/show";
pub const SEARCH_PROBLEM_PATH: &str = "/search/problem";

/// Request-executing operations against the solved.ac API. Each call issues
/// at most one HTTP request on the shared client.
#[derive(Clone, Debug)]
pub struct SolvedAcClient {
    handle: RemoteClientHandle,
}

impl SolvedAcClient {
    pub fn new(handle: RemoteClientHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &RemoteClientHandle {
        &self.handle
    }

    pub async fn fetch_user(&self, handle: &str) -> Result<UserInfo> {
        if handle.trim().is_empty() {
            return Err(SolvedAcError::invalid_argument("handle must not be empty"));
        }
        self.get_json(USER_SHOW_PATH, &[("handle", handle.to_owned())], |status| {
            (status == StatusCode::NOT_FOUND).then(|| SolvedAcError::NotFound { handle: handle.to_owned() })
        })
        .await
    }

    pub async fn search_problems(&self, query: &str, page: u32) -> Result<ProblemSearchResult> {
        if page < 1 {
            return Err(SolvedAcError::invalid_argument(format!("page must be >= 1, got {page}")));
        }
        self.get_json(
            SEARCH_PROBLEM_PATH,
            &[("query", query.to_owned()), ("page", page.to_string())],
            |_| None,
        )
        .await
    }

    /// One GET round-trip. `special` lets an operation claim a status before
    /// the shared translation table applies.
    async fn get_json<T, F>(&self, path: &'static str, params: &[(&str, String)], special: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(StatusCode) -> Option<SolvedAcError>,
    {
        let client = self.handle.client()?;
        let url = client.url(path);
        let (builder, rid) = add_standard_headers(client.http.get(&url).query(params), None);
        tracing::debug!(endpoint = path, request_id = %rid, "solved.ac request");

        let start = Instant::now();
        let res = async {
            let resp = builder
                .send()
                .await
                .map_err(|source| SolvedAcError::NetworkError { endpoint: path, source })?;
            let status = resp.status();
            if !status.is_success() {
                return Err(special(status).unwrap_or_else(|| translate_status(path, status)));
            }
            let body = resp
                .bytes()
                .await
                .map_err(|source| SolvedAcError::NetworkError { endpoint: path, source })?;
            serde_json::from_slice::<T>(&body)
                .map_err(|source| SolvedAcError::InvalidResponseShape { endpoint: path, source })
        }
        .await;

        match &res {
            Ok(_) => {
                let elapsed_ms = start.elapsed().as_millis() as f64;
                crate::infra::logging::log_metric(path, "remote_latency_ms", elapsed_ms);
            }
            Err(e) => {
                tracing::warn!(endpoint = path, request_id = %rid, kind = %e.kind(), error = %e, "solved.ac request failed");
                crate::infra::logging::log_metric(path, "remote_error_total", 1.0);
            }
        }
        res
    }
}

/// Status table shared by every endpoint.
fn translate_status(endpoint: &'static str, status: StatusCode) -> SolvedAcError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        SolvedAcError::RateLimited
    } else if status.is_server_error() {
        SolvedAcError::RemoteUnavailable { status: status.as_u16() }
    } else {
        SolvedAcError::UnexpectedStatus { endpoint, status: status.as_u16() }
    }
}
