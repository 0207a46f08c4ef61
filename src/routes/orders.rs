use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
    routing::post,
};

use crate::{
    dto::orders::{
        ConfirmPaymentRequest, DeferredCheckout, OrderList, PlaceOrderRequest, PlacedOrder,
        UpdateStatusRequest,
    },
    error::AppResult,
    extract::ApiJson,
    middleware::auth::{AdminUser, AuthUser},
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/place", post(place_order))
        .route("/pay-deferred", post(place_deferred))
        // The storefront checkout page posts here.
        .route("/stripe", post(place_deferred))
        .route("/list", post(list_all_orders))
        .route("/userorders", post(user_orders))
        .route("/status", post(update_status))
        .route("/confirm-payment", post(confirm_payment))
        .route("/webhook", post(webhook))
}

#[utoipa::path(
    post,
    path = "/api/order/place",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Cash-on-delivery order placed", body = ApiResponse<PlacedOrder>),
        (status = 400, description = "No items, too many items or bad address"),
        (status = 401, description = "Not authorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<PlacedOrder>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/pay-deferred",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Checkout session opened", body = ApiResponse<DeferredCheckout>),
        (status = 400, description = "No items, too many items or bad address"),
        (status = 501, description = "No payment provider configured; the order was still created"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_deferred(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<DeferredCheckout>>> {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());
    let resp = order_service::place_deferred_order(&state, &user, payload, origin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/list",
    responses(
        (status = 200, description = "All orders (admin only)", body = ApiResponse<OrderList>),
        (status = 401, description = "Not authorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_all_orders(&state, &admin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/userorders",
    responses(
        (status = 200, description = "Caller's orders", body = ApiResponse<OrderList>),
        (status = 401, description = "Not authorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn user_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_user_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 400, description = "Missing or invalid status"),
        (status = 401, description = "Not authorized"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_status(&state, &admin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/confirm-payment",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Order marked paid"),
        (status = 400, description = "Payment not completed"),
        (status = 401, description = "Not the order owner"),
        (status = 404, description = "Order not found"),
        (status = 501, description = "No payment provider configured"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<ConfirmPaymentRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = order_service::confirm_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/webhook",
    request_body(content = String, content_type = "application/json"),
    params(("stripe-signature" = String, Header, description = "Provider signature over the raw body")),
    responses(
        (status = 200, description = "Event handled"),
        (status = 401, description = "Signature rejected"),
        (status = 501, description = "No payment provider configured"),
    ),
    tag = "Orders"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<()>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let resp = order_service::handle_webhook(&state, &body, signature).await?;
    Ok(Json(resp))
}
