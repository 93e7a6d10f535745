use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};

use crate::controllers::AlertController;
use crate::dto::ApiResponse;
use crate::models::alert::UserAlertView;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_alert_router() -> Router<AppState> {
    Router::new()
        .route("/usuario/:usuario_id", get(list_user_alerts))
        .route("/:alerta_id/leida", patch(mark_alert_read))
}

async fn list_user_alerts(
    State(state): State<AppState>,
    Path(usuario_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<UserAlertView>>>, AppError> {
    let controller = AlertController::new(state.services.clone());
    let response = controller.list_for_user(usuario_id).await?;
    Ok(Json(response))
}

async fn mark_alert_read(
    State(state): State<AppState>,
    Path(alerta_id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AlertController::new(state.services.clone());
    let response = controller.mark_read(alerta_id).await?;
    Ok(Json(response))
}
