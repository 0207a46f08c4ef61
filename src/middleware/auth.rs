use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    security::{Claims, Role},
    state::AppState,
};

/// A caller holding a valid user credential. The user record itself is not
/// loaded here; operations that need it report `NotFound` if it is gone.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// A caller holding a valid admin credential.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub email: String,
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(AppError::unauthorized)?;

    state.tokens.verify(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != Role::User {
            return Err(AppError::unauthorized());
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::unauthorized())?;
        Ok(AuthUser { user_id })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != Role::Admin {
            return Err(AppError::unauthorized());
        }
        Ok(AdminUser { email: claims.sub })
    }
}
