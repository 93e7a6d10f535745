use axum::{
    extract::{multipart::Field, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::clients::UploadedFile;
use crate::controllers::{BatchReply, MaintenanceController};
use crate::dto::maintenance_dto::{
    CreateMaintenanceForm, PeriodicBatchRequest, SetStatusRequest, ToggleApprovalRequest,
    UpdateMaintenanceRequest,
};
use crate::dto::ApiResponse;
use crate::models::maintenance::MaintenanceRecord;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Tamaño máximo del formulario de creación (incluye la imagen)
const MAX_FORM_BYTES: usize = 10 * 1024 * 1024;

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_maintenance).layer(DefaultBodyLimit::max(MAX_FORM_BYTES)),
        )
        .route("/periodicas", post(create_periodic_batch))
        .route(
            "/:id",
            get(get_maintenance)
                .put(update_maintenance)
                .delete(delete_maintenance),
        )
        .route("/:id/aprobacion", patch(toggle_approval))
        .route("/:id/estado", patch(set_status))
        .route("/:id/en-proceso", patch(set_en_proceso))
}

/// Cuerpo JSON con el error de deserialización en el formato de la API
fn json_body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn read_file(field: Field<'_>) -> Result<Option<UploadedFile>, AppError> {
    let filename = field.file_name().unwrap_or("imagen").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("imagen: {}", e.body_text())))?;

    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

/// Lee el formulario multipart de creación
async fn read_form(mut multipart: Multipart) -> Result<CreateMaintenanceForm, AppError> {
    let mut form = CreateMaintenanceForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "imagen" {
            form.imagen = read_file(field).await?;
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("{}: {}", name, e.body_text())))?;
        if !form.set_text_field(&name, value) {
            debug!(campo = %name, "Campo de formulario ignorado");
        }
    }

    Ok(form)
}

async fn create_maintenance(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<MaintenanceRecord>>), AppError> {
    let form = read_form(multipart).await?;
    let controller = MaintenanceController::new(state.services.clone());
    let response = controller.create(form).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_maintenance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let controller = MaintenanceController::new(state.services.clone());
    let response = controller.get(id).await?;
    Ok(Json(response))
}

async fn update_maintenance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateMaintenanceRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let request = json_body(payload)?;
    let controller = MaintenanceController::new(state.services.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_maintenance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = MaintenanceController::new(state.services.clone());
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn create_periodic_batch(
    State(state): State<AppState>,
    payload: Result<Json<PeriodicBatchRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = json_body(payload)?;
    let controller = MaintenanceController::new(state.services.clone());
    let response = match controller.create_batch(request).await? {
        BatchReply::Created(body) => (StatusCode::CREATED, Json(body)).into_response(),
        BatchReply::Failed(body) => (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response(),
    };
    Ok(response)
}

async fn toggle_approval(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<ToggleApprovalRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let request = json_body(payload)?;
    let controller = MaintenanceController::new(state.services.clone());
    let response = controller.toggle_approval(id, request).await?;
    Ok(Json(response))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<SetStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let request = json_body(payload)?;
    let controller = MaintenanceController::new(state.services.clone());
    let response = controller.set_status(id, request).await?;
    Ok(Json(response))
}

async fn set_en_proceso(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, AppError> {
    let controller = MaintenanceController::new(state.services.clone());
    let response = controller.set_en_proceso(id).await?;
    Ok(Json(response))
}
