use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::ClinicStore;
use shared_models::auth::User;
use shared_models::clinic::ClinicUser;
use shared_models::error::AppError;

use crate::jwt::validate_token;

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_value = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Maps the identity provider's subject onto the internal user record.
pub async fn resolve_caller(store: &dyn ClinicStore, user: &User) -> Result<ClinicUser, AppError> {
    debug!("Resolving caller {}", user.id);
    store
        .find_user_by_external_id(&user.id)
        .await
        .map_err(|e| AppError::DependencyFailure(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
