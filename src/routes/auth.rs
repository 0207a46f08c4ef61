use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::auth::{AdminTokenResponse, LoginRequest, RegisterRequest, SessionResponse},
    error::AppResult,
    extract::ApiJson,
    middleware::{auth::AuthUser, rate_limit::identity_rate_limiter},
    models::UserProfile,
    response::ApiResponse,
    services::auth_service::{admin_login, get_profile, login_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin", post(admin))
        .route("/me", get(me).post(me));

    match identity_rate_limiter() {
        Some(limiter) => router.layer(limiter),
        None => {
            tracing::warn!("identity rate limiter misconfigured; running without it");
            router
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<SessionResponse>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered")
    ),
    tag = "User"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SessionResponse>>)> {
    let resp = register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<SessionResponse>),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "Unknown email")
    ),
    tag = "User"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin credential", body = ApiResponse<AdminTokenResponse>),
        (status = 401, description = "Wrong admin email or password")
    ),
    tag = "User"
)]
pub async fn admin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AdminTokenResponse>>> {
    let resp = admin_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Not authorized"),
        (status = 404, description = "User was deleted")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = get_profile(&state, &user).await?;
    Ok(Json(resp))
}
