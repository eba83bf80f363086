use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// The authenticated user for the lifetime of the application session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Option<Identifier>,
    pub name: String,
    pub email: String,
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub user_id: Option<Identifier>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the backend on non-2xx auth responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// Builds a session, preferring response fields and falling back to the
    /// supplied values for anything the backend left empty.
    pub fn into_session(self, fallback: &SessionFallback<'_>) -> Session {
        Session {
            id: self.user_id,
            name: non_empty_or(self.name, fallback.name),
            email: non_empty_or(self.email, fallback.email),
            contact: non_empty_or(self.contact, fallback.contact),
            age: self.age.or(fallback.age),
            gender: self.gender.or_else(|| fallback.gender.map(str::to_string)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SessionFallback<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub contact: &'a str,
    pub age: Option<u32>,
    pub gender: Option<&'a str>,
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_maps_user_id_into_session() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"message":"Login successful","name":"Asha","email":"asha@example.com","contact":"9876543210","user_id":12}"#,
        )
        .unwrap();

        let session = response.into_session(&SessionFallback::default());
        assert_eq!(session.id, Some(Identifier::Numeric(12)));
        assert_eq!(session.name, "Asha");
        assert_eq!(session.contact, "9876543210");
        assert_eq!(session.age, None);
    }

    #[test]
    fn test_empty_fields_fall_back() {
        let response = LoginResponse {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        let fallback = SessionFallback {
            name: "Ravi",
            email: "ravi@example.com",
            contact: "9123456780",
            age: Some(31),
            gender: Some("male"),
        };

        let session = response.into_session(&fallback);
        assert_eq!(session.id, None);
        assert_eq!(session.name, "Ravi");
        assert_eq!(session.email, "ravi@example.com");
        assert_eq!(session.age, Some(31));
        assert_eq!(session.gender.as_deref(), Some("male"));
    }

    #[test]
    fn test_signup_request_omits_missing_optionals() {
        let request = SignupRequest {
            name: "Ravi".to_string(),
            contact: "9123456780".to_string(),
            email: "ravi@example.com".to_string(),
            password: "secret1".to_string(),
            age: None,
            gender: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("age").is_none());
        assert!(value.get("gender").is_none());
    }
}
