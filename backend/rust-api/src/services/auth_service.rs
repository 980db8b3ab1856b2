use std::sync::Arc;
use validator::Validate;

use crate::error::ServiceError;
use crate::metrics::{LOGINS_TOTAL, REGISTRATIONS_TOTAL};
use crate::models::user::{LoginRequest, RegisterRequest, UserRecord};
use crate::storage::{InsertOutcome, UserStore};

pub const USER_NOT_FOUND: &str = "User not found. Please register first.";
pub const USER_EXISTS: &str = "User already exists. Please log in.";

/// Name/roll-number identity. There are no passwords: a participant is
/// whoever knows the triple they registered with.
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserRecord, ServiceError> {
        let identity = req.into_identity().ok_or_else(|| {
            REGISTRATIONS_TOTAL.with_label_values(&["invalid"]).inc();
            ServiceError::InvalidPayload
        })?;
        if identity.validate().is_err() {
            REGISTRATIONS_TOTAL.with_label_values(&["invalid"]).inc();
            return Err(ServiceError::validation(
                "name, roll_number and school_name are required",
            ));
        }

        match self.users.insert(&identity).await? {
            InsertOutcome::Created(user) => {
                REGISTRATIONS_TOTAL.with_label_values(&["created"]).inc();
                tracing::info!(user_id = user.user_id, "User registered");
                Ok(user)
            }
            InsertOutcome::Duplicate => {
                REGISTRATIONS_TOTAL.with_label_values(&["conflict"]).inc();
                tracing::info!("Registration for an existing identity");
                Err(ServiceError::Conflict(USER_EXISTS.to_string()))
            }
        }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<UserRecord, ServiceError> {
        let credentials = req.into_credentials().ok_or_else(|| {
            LOGINS_TOTAL.with_label_values(&["invalid"]).inc();
            ServiceError::InvalidPayload
        })?;
        if credentials.validate().is_err() {
            LOGINS_TOTAL.with_label_values(&["invalid"]).inc();
            return Err(ServiceError::validation(
                "Both name and roll_number are required",
            ));
        }

        match self.users.find_by_login(&credentials).await? {
            Some(user) => {
                LOGINS_TOTAL.with_label_values(&["success"]).inc();
                tracing::info!(user_id = user.user_id, "User logged in");
                Ok(user)
            }
            None => {
                LOGINS_TOTAL.with_label_values(&["not_found"]).inc();
                tracing::warn!("Login for unknown user");
                Err(ServiceError::NotFound(USER_NOT_FOUND.to_string()))
            }
        }
    }
}
