use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{AdminTokenResponse, LoginRequest, RegisterRequest, SessionResponse},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartMap, UserProfile},
    response::ApiResponse,
    security::{hash_password, verify_password},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<SessionResponse>> {
    let RegisterRequest { name, email, password } = payload;
    let name = name.trim().to_string();
    if name.is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("All fields are required.".into()));
    }

    let email = normalize_email(&email);
    if !validator::validate_email(email.as_str()) {
        return Err(AppError::BadRequest("Please enter a valid email.".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters.".into(),
        ));
    }

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("User already exists.".into()));
    }

    let password_hash = hash_password(&password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        cart_data: Set(CartMap::default()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        // Lost a race with a concurrent registration for the same address.
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User already exists.".into())
        }
        _ => AppError::OrmError(err),
    })?;

    let token = state.tokens.issue_user(user.id)?;
    tracing::info!(user_id = %user.id, "user registered");
    audit::record(
        state,
        Some(user.id),
        "register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        SessionResponse {
            token,
            user: profile_from_entity(user),
        },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<SessionResponse>> {
    let LoginRequest { email, password } = payload;
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required.".into(),
        ));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(normalize_email(&email)))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User doesn't exist.".into()))?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Incorrect password.".into()));
    }

    let token = state.tokens.issue_user(user.id)?;
    audit::record(
        state,
        Some(user.id),
        "login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        SessionResponse {
            token,
            user: profile_from_entity(user),
        },
        None,
    ))
}

pub async fn admin_login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AdminTokenResponse>> {
    if !state.admin.authenticate(&payload.email, &payload.password) {
        tracing::warn!("admin sign-in rejected");
        return Err(AppError::Unauthorized(
            "Email or password is incorrect.".into(),
        ));
    }

    let token = state.tokens.issue_admin(&payload.email)?;
    audit::record(
        state,
        None,
        "admin_login",
        "admin",
        serde_json::json!({ "email": payload.email }),
    )
    .await;

    Ok(ApiResponse::success(
        "Admin logged in",
        AdminTokenResponse { token },
        None,
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let user = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;
    Ok(ApiResponse::success("OK", profile_from_entity(user), None))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn profile_from_entity(model: UserModel) -> UserProfile {
    UserProfile {
        id: model.id,
        name: model.name,
        email: model.email,
    }
}
