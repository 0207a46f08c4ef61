//! Order placement, payment finalization and status changes.
//!
//! Placement always runs validate, resolve the user, price, persist, clear
//! cart in that order, so a rejected request writes nothing.

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        ConfirmPaymentRequest, DeferredCheckout, OrderList, PlaceOrderRequest, PlacedOrder,
        UpdateStatusRequest,
    },
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    entity::Users,
    error::{AppError, AppResult},
    middleware::auth::{AdminUser, AuthUser},
    models::{LineItems, Order, OrderStatus, PaymentMethod},
    payments::{PaymentProvider, WebhookEvent},
    response::{ApiResponse, Meta},
    services::cart_service::clear_cart,
    state::AppState,
};

const PROVIDER_DISABLED: &str = "Online payment is disabled until a payment provider is configured.";

/// Result of a finalization attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalization {
    /// This call marked the order paid.
    Confirmed,
    /// The order had already been marked paid.
    AlreadyPaid,
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    let order = create_order(state, user, payload, PaymentMethod::CashOnDelivery).await?;
    Ok(ApiResponse::success(
        "Order Placed",
        PlacedOrder {
            order_id: order.id,
            amount: order.amount,
            currency: state.currency.clone(),
        },
        None,
    ))
}

/// Create the order for an external payment, then hand off to the provider.
/// The order and cart reset stay in place even when no provider is set up.
pub async fn place_deferred_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
    origin: Option<&str>,
) -> AppResult<ApiResponse<DeferredCheckout>> {
    let order = create_order(state, user, payload, PaymentMethod::Stripe).await?;

    let Some(provider) = state.payments.as_deref() else {
        tracing::warn!(order_id = %order.id, "deferred payment requested without a provider");
        return Err(AppError::ProviderUnavailable(format!(
            "{PROVIDER_DISABLED} Order {} was created unpaid.",
            order.id
        )));
    };

    let return_origin = origin
        .or(state.frontend_url.as_deref())
        .unwrap_or("http://localhost:5173");
    let session = provider
        .start_checkout(&order, &state.currency, return_origin)
        .await?;
    tracing::info!(
        order_id = %order.id,
        provider = provider.name(),
        session_id = %session.session_id,
        "checkout session opened"
    );

    Ok(ApiResponse::success(
        "Checkout started",
        DeferredCheckout {
            order_id: order.id,
            amount: order.amount,
            currency: state.currency.clone(),
            session_url: session.redirect_url,
        },
        None,
    ))
}

async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
    payment_method: PaymentMethod,
) -> AppResult<Order> {
    let (lines, address) = payload.validate()?;

    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let totals = state.pricing.quote(&state.orm, &lines).await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        items: Set(LineItems(lines)),
        address: Set(address),
        amount: Set(totals.total),
        payment_method: Set(payment_method),
        payment: Set(false),
        status: Set(OrderStatus::OrderPlaced),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Reset regardless of payment method, even before a deferred payment lands.
    if !clear_cart(&state.pool, user.user_id).await? {
        tracing::warn!(user_id = %user.user_id, order_id = %order.id, "user removed while the order was placed");
    }

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        subtotal = %totals.subtotal,
        amount = %totals.total,
        method = ?payment_method,
        "order placed"
    );
    audit::record(
        state,
        Some(user.user_id),
        "order_placed",
        "orders",
        serde_json::json!({ "order_id": order.id, "amount": order.amount.to_string() }),
    )
    .await;

    Ok(order_from_entity(order))
}

/// Mark an order paid once. Safe to repeat: a paid order is left alone.
///
/// The payment flag is written first. Clearing the owner's cart afterwards
/// is best-effort; a failure there is logged and does not fail the call.
pub async fn finalize_order(
    state: &AppState,
    order_id: Uuid,
    caller: Option<Uuid>,
) -> AppResult<Finalization> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if caller.is_some_and(|caller| caller != order.user_id) {
        return Err(AppError::unauthorized());
    }
    if order.payment {
        return Ok(Finalization::AlreadyPaid);
    }

    let updated = Orders::update_many()
        .col_expr(OrderCol::Payment, Expr::value(true))
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Paid))
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::Payment.eq(false))
        .exec(&state.orm)
        .await?;
    if updated.rows_affected == 0 {
        // A concurrent finalization got there first.
        return Ok(Finalization::AlreadyPaid);
    }

    if let Err(err) = clear_cart(&state.pool, order.user_id).await {
        tracing::warn!(error = %err, order_id = %order_id, "cart reset after payment failed");
    }

    tracing::info!(order_id = %order_id, user_id = %order.user_id, "order paid");
    audit::record(
        state,
        caller,
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order_id }),
    )
    .await;

    Ok(Finalization::Confirmed)
}

pub async fn confirm_payment(
    state: &AppState,
    user: &AuthUser,
    payload: ConfirmPaymentRequest,
) -> AppResult<ApiResponse<()>> {
    let provider = require_provider(state)?;

    if !provider.is_paid(payload.order_id, &payload.session_id).await? {
        return Err(AppError::BadRequest("Payment not completed".into()));
    }

    let message = match finalize_order(state, payload.order_id, Some(user.user_id)).await? {
        Finalization::Confirmed => "Payment confirmed",
        Finalization::AlreadyPaid => "Payment already confirmed",
    };
    Ok(ApiResponse::ok(message))
}

/// Handle a provider callback. The caller check is skipped; the signature
/// over the raw body is what authenticates the request.
pub async fn handle_webhook(
    state: &AppState,
    payload: &[u8],
    signature: Option<&str>,
) -> AppResult<ApiResponse<()>> {
    let provider = require_provider(state)?;
    let signature = signature.ok_or_else(AppError::unauthorized)?;

    match provider.verify_webhook(payload, signature)? {
        WebhookEvent::Paid { order_id } => {
            finalize_order(state, order_id, None).await?;
            Ok(ApiResponse::ok("Payment recorded"))
        }
        WebhookEvent::Ignored => Ok(ApiResponse::ok("Event ignored")),
    }
}

fn require_provider(state: &AppState) -> AppResult<&dyn PaymentProvider> {
    state
        .payments
        .as_deref()
        .ok_or_else(|| AppError::ProviderUnavailable(PROVIDER_DISABLED.into()))
}

/// Any listed status may follow any other; only membership is checked.
pub async fn update_status(
    state: &AppState,
    admin: &AdminUser,
    payload: UpdateStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let (Some(order_id), Some(status)) = (payload.order_id, payload.status) else {
        return Err(AppError::BadRequest(
            "orderId and status are required".into(),
        ));
    };
    let status = status
        .parse::<OrderStatus>()
        .map_err(|_| AppError::BadRequest("Invalid status value".into()))?;

    let existing = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let previous = existing.status;
    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    let order = active.update(&state.orm).await?;

    audit::record(
        state,
        None,
        "order_status_update",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "from": previous.as_str(),
            "to": status.as_str(),
            "admin": admin.email,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Status Updated",
        order_from_entity(order),
        None,
    ))
}

pub async fn list_user_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let items: Vec<Order> = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn list_all_orders(state: &AppState, _admin: &AdminUser) -> AppResult<ApiResponse<OrderList>> {
    let items: Vec<Order> = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        items: model.items,
        address: model.address,
        amount: model.amount,
        payment_method: model.payment_method,
        payment: model.payment,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
