//! Unified client error model.
//! Session rejection (HTTP 401) is its own variant so callers can tell it apart from
//! domain failures; every other non-2xx status is passed through as `Status` unchanged.

use thiserror::Error;

use crate::forms::FieldErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("{code}: {message} (HTTP {status})")]
    Status { status: u16, code: String, message: String },

    /// Role gate refusal; `target` names the route path or the action.
    #[error("forbidden: {target} is not available for this role")]
    Forbidden { target: String },

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn code_str(&self) -> &str {
        match self {
            ClientError::Unauthorized { .. } => "unauthorized",
            ClientError::Status { code, .. } => code.as_str(),
            ClientError::Forbidden { .. } => "forbidden",
            ClientError::Validation(_) => "validation",
            ClientError::Transport(_) => "transport",
            ClientError::Decode(_) => "decode",
            ClientError::Storage(_) => "storage",
            ClientError::Config(_) => "config",
        }
    }

    /// HTTP status reported by the server, if the failure came from a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for the one failure class the gateway recovers centrally.
    pub fn is_session_rejection(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn config<S: Into<String>>(msg: S) -> Self { ClientError::Config(msg.into()) }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        let unauth = ClientError::Unauthorized { message: "expired".into() };
        assert_eq!(unauth.http_status(), Some(401));
        assert!(unauth.is_session_rejection());

        let nf = ClientError::Status { status: 404, code: "not_found".into(), message: "no patient".into() };
        assert_eq!(nf.http_status(), Some(404));
        assert_eq!(nf.code_str(), "not_found");
        assert!(!nf.is_session_rejection());

        assert_eq!(ClientError::config("bad url").http_status(), None);
        assert_eq!(ClientError::Forbidden { target: "/alerts".into() }.code_str(), "forbidden");
    }

    #[test]
    fn display_includes_status() {
        let e = ClientError::Status { status: 422, code: "validation_error".into(), message: "title required".into() };
        assert_eq!(e.to_string(), "validation_error: title required (HTTP 422)");
    }
}
