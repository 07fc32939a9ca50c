use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ClientResult;
use crate::forms::{FieldErrors, Validate};
use crate::gateway::Gateway;
use crate::identity::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut e = FieldErrors::new();
        e.require("email", &self.email);
        if !self.email.trim().is_empty() && !self.email.contains('@') {
            e.add("email", "must be an email address");
        }
        e.require("password", &self.password);
        e.into_result()
    }
}

/// Flat login response; the one wire shape this client accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type", default = "bearer")]
    pub token_type: String,
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub expires_at: Option<String>,
}

fn bearer() -> String { "Bearer".to_string() }

impl AuthResponse {
    pub fn user(&self) -> User {
        User {
            id: self.user_id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }
}

pub struct AuthApi<'a> {
    gw: &'a Gateway,
}

impl<'a> AuthApi<'a> {
    pub fn new(gw: &'a Gateway) -> Self { Self { gw } }

    /// Authenticate and establish the session. Works without a prior credential.
    pub async fn login(&self, req: &LoginRequest) -> ClientResult<AuthResponse> {
        super::validated(req)?;
        let resp: AuthResponse = self.gw.post("/api/auth/login", req).await?;
        self.gw.store().login(resp.token.clone(), resp.user())?;
        info!(target: "ghcs::auth", user_id = %resp.user_id, role = %resp.role, "login succeeded");
        Ok(resp)
    }

    /// Local only: the API has no logout endpoint, the bearer simply stops being sent.
    pub fn logout(&self) -> ClientResult<()> { self.gw.store().logout() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_login_response() {
        let raw = r#"{"token":"abc","type":"Bearer","userId":"u1","email":"a@b.c","firstName":"Ana","lastName":"Ruiz","role":"PHYSICIAN","expiresAt":"2030-01-01T00:00:00"}"#;
        let r: AuthResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(r.role, Role::Physician);
        assert_eq!(r.user().id, "u1");
        assert_eq!(r.token_type, "Bearer");
    }

    #[test]
    fn login_request_validation() {
        let bad = LoginRequest { email: "nobody".into(), password: "".into() };
        let errs = bad.validate().unwrap_err();
        assert_eq!(errs.get("email"), Some("must be an email address"));
        assert_eq!(errs.get("password"), Some("is required"));
        let ok = LoginRequest { email: "a@b.c".into(), password: "pw".into() };
        assert!(ok.validate().is_ok());
    }
}
