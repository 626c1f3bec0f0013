//! Bearer-token middleware for the admin routes

use axum::{extract::Request, http::header::AUTHORIZATION, middleware::Next, response::Response};

use crate::auth::JwtConfig;
use crate::error::AppError;

/// Admin identity attached to authenticated requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub username: String,
}

/// Rejects requests without a valid `Authorization: Bearer <jwt>` header.
/// Expects `JwtConfig` as a request extension.
pub async fn jwt_auth(mut req: Request, next: Next) -> Result<Response, AppError> {
    let config = req
        .extensions()
        .get::<JwtConfig>()
        .cloned()
        .ok_or_else(|| AppError::Internal("JwtConfig extension missing".to_string()))?;

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = config.verify(token)?;
    req.extensions_mut().insert(AdminPrincipal {
        username: claims.sub,
    });
    Ok(next.run(req).await)
}
