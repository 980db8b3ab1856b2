use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::ServiceError,
    extractors::AppJson,
    models::game_result::{SaveGame1Request, SaveGame2Request, SaveResultResponse},
    services::AppState,
};

/// POST /save_game1 - balloon, gambling and reward scores
pub async fn save_game1(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SaveGame1Request>,
) -> Result<Json<SaveResultResponse>, ServiceError> {
    state.result_service().save(req).await?;
    Ok(Json(SaveResultResponse { ok: true }))
}

/// POST /save_game2 - london, maze and plan scores
pub async fn save_game2(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SaveGame2Request>,
) -> Result<Json<SaveResultResponse>, ServiceError> {
    state.result_service().save(req).await?;
    Ok(Json(SaveResultResponse { ok: true }))
}
