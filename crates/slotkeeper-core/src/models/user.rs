use serde::{Deserialize, Serialize};

/// Response of `GET /auth/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub last_name: String,
}

impl UserInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}

/// Token pair returned by login, register and refresh.
///
/// Both fields default to empty so a body without tokens still parses and
/// can be rejected by the caller.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl TokenPair {
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("has_access_token", &self.has_access_token())
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub email: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_info() {
        let json = r#"{"id":7,"email":"u@x.com","name":"Ada","lastName":"Lovelace"}"#;
        let user: UserInfo = serde_json::from_str(json).expect("Failed to parse user info");
        assert_eq!(user.id, 7);
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_token_pair_tolerates_missing_fields() {
        let pair: TokenPair = serde_json::from_str("{}").unwrap();
        assert!(!pair.has_access_token());

        let pair: TokenPair =
            serde_json::from_str(r#"{"accessToken":"a","refreshToken":"r"}"#).unwrap();
        assert!(pair.has_access_token());
        assert_eq!(pair.refresh_token, "r");
    }

    #[test]
    fn test_request_bodies_use_camel_case() {
        let body = serde_json::to_value(RefreshRequest {
            email: "u@x.com".into(),
            refresh_token: "r".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"email": "u@x.com", "refreshToken": "r"}));

        let body = serde_json::to_value(RegisterRequest {
            name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "u@x.com".into(),
            password: "secret1".into(),
        })
        .unwrap();
        assert_eq!(body["lastName"], "Lovelace");
    }
}
