use serde::{Deserialize, Serialize};

/// The authenticated user's public record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Both fields are required before anything is sent.
    pub fn new(email: &str, password: &str) -> Option<Self> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub user: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"accessToken":"xyz","user":{"id":2,"email":"c@d.com"}}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("valid login response");
        assert_eq!(resp.access_token, "xyz");
        assert_eq!(resp.user, Identity { id: 2, email: "c@d.com".to_string() });
    }

    #[test]
    fn test_identity_ignores_extra_fields() {
        let json = r#"{"id":1,"email":"a@b.com","createdAt":"2024-01-01"}"#;
        let identity: Identity = serde_json::from_str(json).expect("extra fields are fine");
        assert_eq!(identity.id, 1);
    }

    #[test]
    fn test_login_request_requires_both_fields() {
        assert!(LoginRequest::new("", "secret").is_none());
        assert!(LoginRequest::new("   ", "secret").is_none());
        assert!(LoginRequest::new("a@b.com", "").is_none());

        let req = LoginRequest::new(" a@b.com ", "secret").expect("valid");
        assert_eq!(req.email, "a@b.com");
    }
}
