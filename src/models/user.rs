use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Registration form payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Profile edit payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Body returned by login, registration, profile update and password reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_auth_response() {
        let raw = r#"{
            "token": "abc.def",
            "user": {
                "id": 3,
                "firstName": "Ana",
                "lastName": "Pérez",
                "email": "ana@example.com",
                "phone": "099123456",
                "admin": true,
                "createdAt": "2024-05-01T00:00:00Z"
            }
        }"#;
        let auth: AuthResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(auth.token, "abc.def");
        assert!(auth.user.admin);
        assert_eq!(auth.user.full_name(), "Ana Pérez");
    }

    #[test]
    fn register_payload_uses_camel_case() {
        let user = RegisterUser {
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
            phone: "099123456".into(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["firstName"], "Ana");
        assert_eq!(value["lastName"], "Pérez");
    }
}
