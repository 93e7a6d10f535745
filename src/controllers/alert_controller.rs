use crate::dto::ApiResponse;
use crate::models::alert::UserAlertView;
use crate::services::AppServices;
use crate::utils::errors::AppError;

pub struct AlertController {
    services: AppServices,
}

impl AlertController {
    pub fn new(services: AppServices) -> Self {
        Self { services }
    }

    pub async fn list_for_user(
        &self,
        usuario_id: i32,
    ) -> Result<ApiResponse<Vec<UserAlertView>>, AppError> {
        let alerts = self.services.notifications.alerts_for_user(usuario_id).await?;
        Ok(ApiResponse::success(alerts))
    }

    pub async fn mark_read(&self, alerta_id: i32) -> Result<ApiResponse<()>, AppError> {
        self.services.notifications.mark_read(alerta_id).await?;
        Ok(ApiResponse::message("Alerta marcada como leída".to_string()))
    }
}
