use sea_orm::DatabaseConnection;
use service::email::EmailService;

/// Shared by every handler; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub email: EmailService,
}
