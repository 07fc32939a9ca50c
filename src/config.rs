//! Client configuration resolved from the environment.

use std::path::PathBuf;

use reqwest::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_STATE_DIR: &str = ".ghcs";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: Url,
    /// Directory holding the persisted session slots.
    pub state_dir: PathBuf,
    pub login_route: String,
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> ClientResult<Self> {
        let api_base_url = Url::parse(api_base_url)
            .map_err(|e| ClientError::config(format!("invalid API base URL '{}': {}", api_base_url, e)))?;
        Ok(Self {
            api_base_url,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        })
    }

    /// GHCS_API_BASE_URL, GHCS_STATE_DIR and GHCS_LOGIN_ROUTE override the defaults.
    pub fn from_env() -> ClientResult<Self> {
        let base = std::env::var("GHCS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let state_dir = std::env::var("GHCS_STATE_DIR").unwrap_or_else(|_| DEFAULT_STATE_DIR.to_string());
        let login_route = std::env::var("GHCS_LOGIN_ROUTE").unwrap_or_else(|_| DEFAULT_LOGIN_ROUTE.to_string());
        Ok(Self::new(&base)?.with_state_dir(state_dir).with_login_route(login_route))
    }

    pub fn with_state_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn with_login_route<S: Into<String>>(mut self, route: S) -> Self {
        self.login_route = route.into();
        self
    }

    /// Resolve an API path such as `/api/patients` against the base URL.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.api_base_url
            .join(path)
            .map_err(|e| ClientError::config(format!("invalid endpoint path '{}': {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparsable_base_url() {
        let err = ClientConfig::new("not a url").unwrap_err();
        assert_eq!(err.code_str(), "config");
    }

    #[test]
    fn endpoint_joins_absolute_paths() {
        let cfg = ClientConfig::new("http://127.0.0.1:9000").unwrap();
        assert_eq!(cfg.endpoint("/api/patients").unwrap().as_str(), "http://127.0.0.1:9000/api/patients");
        assert_eq!(cfg.login_route, "/login");
    }
}
