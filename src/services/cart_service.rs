//! Per-user cart kept as a JSONB map on the user row.
//!
//! Every mutation is a single `UPDATE`, so Postgres row locking serializes
//! concurrent writers and increments are never lost.

use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{AddToCartRequest, CartData, UpdateCartRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartMap,
    response::ApiResponse,
    state::AppState,
};

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartData>> {
    let item_id = validate_item_id(&payload.item_id)?;

    let row: Option<(Json<CartMap>,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET cart_data = jsonb_set(
            cart_data,
            ARRAY[$2::text],
            to_jsonb(COALESCE((cart_data ->> $2::text)::bigint, 0) + 1),
            true
        )
        WHERE id = $1
        RETURNING cart_data
        "#,
    )
    .bind(user.user_id)
    .bind(item_id)
    .fetch_optional(&state.pool)
    .await?;

    let (Json(cart),) = row.ok_or_else(user_not_found)?;
    tracing::debug!(user_id = %user.user_id, item_id, "cart increment");
    Ok(ApiResponse::success(
        "Added to cart",
        CartData { cart_data: cart },
        None,
    ))
}

pub async fn update_cart(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartData>> {
    let item_id = validate_item_id(&payload.item_id)?;
    let quantity = validate_quantity(payload.quantity)?;

    // Zero removes the key; a stored zero would break the cart invariant.
    let query = if quantity == 0 {
        sqlx::query_as::<_, (Json<CartMap>,)>(
            "UPDATE users SET cart_data = cart_data - $2::text WHERE id = $1 RETURNING cart_data",
        )
        .bind(user.user_id)
        .bind(item_id)
    } else {
        sqlx::query_as::<_, (Json<CartMap>,)>(
            r#"
            UPDATE users
            SET cart_data = jsonb_set(cart_data, ARRAY[$2::text], to_jsonb($3::bigint), true)
            WHERE id = $1
            RETURNING cart_data
            "#,
        )
        .bind(user.user_id)
        .bind(item_id)
        .bind(quantity)
    };

    let (Json(cart),) = query
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(ApiResponse::success(
        "Cart updated",
        CartData { cart_data: cart },
        None,
    ))
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartData>> {
    let row: Option<(Json<CartMap>,)> =
        sqlx::query_as("SELECT cart_data FROM users WHERE id = $1")
            .bind(user.user_id)
            .fetch_optional(&state.pool)
            .await?;

    let (Json(cart),) = row.ok_or_else(user_not_found)?;
    Ok(ApiResponse::success("OK", CartData { cart_data: cart }, None))
}

/// Reset a user's cart to empty. Returns whether the user still exists.
pub async fn clear_cart(pool: &DbPool, user_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("UPDATE users SET cart_data = '{}'::jsonb WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn validate_item_id(raw: &str) -> AppResult<&str> {
    let item_id = raw.trim();
    if item_id.is_empty() {
        return Err(AppError::BadRequest("Invalid or missing itemId".into()));
    }
    Ok(item_id)
}

fn validate_quantity(raw: f64) -> AppResult<i64> {
    if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 || raw > f64::from(u32::MAX) {
        return Err(AppError::BadRequest("Invalid quantity".into()));
    }
    Ok(raw as i64)
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_ids_are_trimmed() {
        assert_eq!(validate_item_id("  sku-1 ").unwrap(), "sku-1");
        assert!(matches!(validate_item_id("   "), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_item_id(""), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn quantity_must_be_a_whole_non_negative_number() {
        assert_eq!(validate_quantity(0.0).unwrap(), 0);
        assert_eq!(validate_quantity(3.0).unwrap(), 3);
        for bad in [-1.0, 1.5, f64::NAN, f64::INFINITY, 1e12] {
            assert!(matches!(validate_quantity(bad), Err(AppError::BadRequest(_))));
        }
    }
}
