use rmcp::ErrorData as McpError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Coarse failure classes a calling agent can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidArgument,
    ClientUnavailable,
    InvalidResponseShape,
    NotFound,
    RateLimited,
    RemoteUnavailable,
    UnexpectedStatus,
    NetworkError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::ClientUnavailable => "ClientUnavailable",
            ErrorKind::InvalidResponseShape => "InvalidResponseShape",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::RemoteUnavailable => "RemoteUnavailable",
            ErrorKind::UnexpectedStatus => "UnexpectedStatus",
            ErrorKind::NetworkError => "NetworkError",
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited | ErrorKind::RemoteUnavailable | ErrorKind::NetworkError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure a core operation or capability binding can produce.
#[derive(Debug, Error)]
pub enum SolvedAcError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("solved.ac HTTP client is not available; the gateway has not been started or is shutting down")]
    ClientUnavailable,

    #[error("could not build the solved.ac HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("solved.ac returned an unexpected payload from {endpoint}: {source}")]
    InvalidResponseShape {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("solved.ac user handle '{handle}' was not found")]
    NotFound { handle: String },

    #[error("solved.ac is rate limiting requests (429); this is temporary, please retry later")]
    RateLimited,

    #[error("solved.ac server error ({status}); this is temporary, please retry later")]
    RemoteUnavailable { status: u16 },

    #[error("solved.ac returned unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },

    #[error("network error while calling solved.ac {endpoint}: {source}")]
    NetworkError {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl SolvedAcError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        SolvedAcError::InvalidArgument(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SolvedAcError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            SolvedAcError::ClientUnavailable | SolvedAcError::ClientBuild(_) => {
                ErrorKind::ClientUnavailable
            }
            SolvedAcError::InvalidResponseShape { .. } => ErrorKind::InvalidResponseShape,
            SolvedAcError::NotFound { .. } => ErrorKind::NotFound,
            SolvedAcError::RateLimited => ErrorKind::RateLimited,
            SolvedAcError::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            SolvedAcError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            SolvedAcError::NetworkError { .. } => ErrorKind::NetworkError,
        }
    }

    /// HTTP status that caused the failure, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SolvedAcError::NotFound { .. } => Some(404),
            SolvedAcError::RateLimited => Some(429),
            SolvedAcError::RemoteUnavailable { status }
            | SolvedAcError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Structured `data` attached to the protocol-level error.
    pub fn error_data(&self) -> serde_json::Value {
        let kind = self.kind();
        let mut data = json!({ "kind": kind.as_str(), "transient": kind.is_transient() });
        if let Some(status) = self.status() {
            data["status"] = json!(status);
        }
        data
    }

    /// Map onto a JSON-RPC error. Argument problems are `invalid_params`,
    /// everything else is reported as an internal error carrying its kind.
    pub fn to_mcp_error(&self) -> McpError {
        match self.kind() {
            ErrorKind::InvalidArgument => McpError::invalid_params(self.to_string(), Some(self.error_data())),
            _ => McpError::internal_error(self.to_string(), Some(self.error_data())),
        }
    }
}

impl From<SolvedAcError> for McpError {
    fn from(e: SolvedAcError) -> Self {
        e.to_mcp_error()
    }
}

/// Result alias used by core operations and bindings.
pub type Result<T> = std::result::Result<T, SolvedAcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_handle() {
        let e = SolvedAcError::NotFound { handle: "no_such_user_xyz".into() };
        assert_eq!(e.kind(), ErrorKind::NotFound);
        assert!(e.to_string().contains("no_such_user_xyz"));
    }

    #[test]
    fn transient_failures_advise_retry() {
        let rl = SolvedAcError::RateLimited;
        let down = SolvedAcError::RemoteUnavailable { status: 503 };
        assert!(rl.to_string().contains("retry later"));
        assert!(down.to_string().contains("retry later"));
        assert!(rl.kind().is_transient());
        assert!(down.kind().is_transient());
        assert!(!ErrorKind::NotFound.is_transient());
    }

    #[test]
    fn invalid_argument_maps_to_invalid_params() {
        let e = SolvedAcError::invalid_argument("page must be >= 1");
        let mcp = e.to_mcp_error();
        assert_eq!(mcp.code.0, -32602);
        assert!(mcp.message.contains("page must be >= 1"));
        assert_eq!(mcp.data.unwrap()["kind"], "InvalidArgument");
    }

    #[test]
    fn status_errors_carry_kind_and_status() {
        let e = SolvedAcError::UnexpectedStatus { endpoint: "/search/problem", status: 418 };
        let mcp: McpError = e.into();
        assert_eq!(mcp.code.0, -32603);
        let data = mcp.data.unwrap();
        assert_eq!(data["kind"], "UnexpectedStatus");
        assert_eq!(data["status"], 418);
    }
}
