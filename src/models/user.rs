//! User models and authentication DTOs.

use serde::{Deserialize, Serialize};

use super::{string_or_number, Role};

/// Snapshot of an authenticated principal, taken at login time and cached
/// in the session store until the next login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Payload for creating a user (manager surface and self-registration).
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Payload for `PUT /user/updateuser/:id`. Password is only sent when the
/// caller wants it changed.
#[derive(Debug, Clone, Serialize)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_string_or_number() {
        let from_string: User = serde_json::from_str(
            r#"{"user_id":"mgr1","first_name":"A","last_name":"B","email":"a@b.c","role":"manager"}"#,
        )
        .unwrap();
        assert_eq!(from_string.user_id, "mgr1");

        let from_number: User = serde_json::from_str(
            r#"{"user_id":42,"first_name":"A","last_name":"B","email":"a@b.c","role":"lab technician"}"#,
        )
        .unwrap();
        assert_eq!(from_number.user_id, "42");
    }
}
