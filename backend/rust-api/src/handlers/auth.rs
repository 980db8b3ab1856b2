use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::{
    error::ServiceError,
    extractors::AppJson,
    models::user::{LoginRequest, RegisterRequest, RegisterResponse, UserResponse},
    services::AppState,
};

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.auth_service().register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            created: true,
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    let user = state.auth_service().login(req).await?;
    Ok(Json(user.into()))
}
