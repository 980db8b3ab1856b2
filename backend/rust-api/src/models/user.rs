use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Trimmed identity triple. A user is unique on all three fields together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UserIdentity {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub roll_number: String,
    #[validate(length(min = 1, max = 255))]
    pub school_name: String,
}

/// Name and roll number pair used to log in.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct LoginCredentials {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub roll_number: String,
}

/// User stored in the "users" collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub name: String,
    pub roll_number: String,
    pub school_name: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            name: self.name.clone(),
            roll_number: self.roll_number.clone(),
            school_name: self.school_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub school_name: Option<String>,
}

impl RegisterRequest {
    /// Returns None when any field is missing; present fields are trimmed.
    pub fn into_identity(self) -> Option<UserIdentity> {
        Some(UserIdentity {
            name: self.name?.trim().to_string(),
            roll_number: self.roll_number?.trim().to_string(),
            school_name: self.school_name?.trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: Option<String>,
    pub roll_number: Option<String>,
}

impl LoginRequest {
    pub fn into_credentials(self) -> Option<LoginCredentials> {
        Some(LoginCredentials {
            name: self.name?.trim().to_string(),
            roll_number: self.roll_number?.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub name: String,
    pub roll_number: String,
    pub school_name: String,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            roll_number: user.roll_number,
            school_name: user.school_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub created: bool,
}
