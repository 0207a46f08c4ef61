mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde_json::{Value, json};
use uuid::Uuid;
use vault_storefront::{
    dto::{
        cart::AddToCartRequest,
        orders::{ConfirmPaymentRequest, PlaceOrderRequest, UpdateStatusRequest},
    },
    entity::Orders,
    error::AppError,
    middleware::auth::{AdminUser, AuthUser},
    models::{OrderLine, OrderStatus, PaymentMethod},
    payments::PaymentProvider,
    services::{
        cart_service,
        order_service::{self, Finalization},
    },
    state::AppState,
};

fn order_request(body: Value) -> PlaceOrderRequest {
    serde_json::from_value(body).unwrap()
}

fn admin() -> AdminUser {
    AdminUser {
        email: common::ADMIN_EMAIL.to_string(),
    }
}

async fn fill_cart(state: &AppState, user: &AuthUser) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            item_id: "anything".into(),
        },
    )
    .await?;
    Ok(())
}

async fn order_count(state: &AppState, user: &AuthUser) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(row.0)
}

#[tokio::test]
async fn place_order_prices_from_catalog_and_clears_cart() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 50).await?;
    fill_cart(&state, &user).await?;

    // The client-side price and amount are ignored.
    let resp = order_service::place_order(
        &state,
        &user,
        order_request(json!({
            "items": [{ "_id": product.to_string(), "quantity": 2, "price": 1 }],
            "amount": 1,
            "address": { "city": "Pune" }
        })),
    )
    .await?;
    let placed = resp.data.unwrap();
    assert_eq!(placed.amount, Decimal::from(110));
    assert_eq!(placed.currency, "inr");

    let order = Orders::find_by_id(placed.order_id)
        .one(&state.orm)
        .await?
        .expect("order persisted");
    assert_eq!(order.amount, Decimal::from(110));
    assert!(!order.payment);
    assert_eq!(order.status, OrderStatus::OrderPlaced);
    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.address, json!({ "city": "Pune" }));

    assert_eq!(common::cart_of(&state, &user).await?, json!({}));
    Ok(())
}

#[tokio::test]
async fn duplicate_and_unknown_lines_are_priced_independently() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 100).await?;

    let resp = order_service::place_order(
        &state,
        &user,
        order_request(json!({
            "items": [
                { "_id": product.to_string(), "quantity": 1 },
                { "_id": product.to_string(), "quantity": "2" },
                { "_id": "UNKNOWN", "quantity": 5 },
                { "_id": Uuid::new_v4().to_string(), "quantity": 3 }
            ]
        })),
    )
    .await?;
    assert_eq!(resp.data.unwrap().amount, Decimal::from(310));
    Ok(())
}

#[tokio::test]
async fn fractional_quantities_are_charged_and_kept() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 100).await?;

    let placed = order_service::place_order(
        &state,
        &user,
        order_request(json!({ "items": [{ "_id": product.to_string(), "quantity": 1.5 }] })),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(placed.amount, Decimal::from(160));

    let order = Orders::find_by_id(placed.order_id).one(&state.orm).await?.unwrap();
    assert_eq!(order.amount, Decimal::new(1600, 1));
    assert_eq!(
        order.items.0,
        vec![OrderLine {
            product_id: product.to_string(),
            quantity: Decimal::new(15, 1),
        }]
    );
    Ok(())
}

#[tokio::test]
async fn removed_user_cannot_place_an_order() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 50).await?;
    common::delete_user(&state, &user).await?;

    let request = || order_request(json!({ "items": [{ "_id": product.to_string(), "quantity": 1 }] }));
    let err = order_service::place_order(&state, &user, request()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = order_service::place_deferred_order(&state, &user, request(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(order_count(&state, &user).await?, 0);
    Ok(())
}

#[tokio::test]
async fn too_many_lines_writes_nothing() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    fill_cart(&state, &user).await?;

    let items: Vec<Value> = (0..51)
        .map(|_| json!({ "_id": Uuid::new_v4().to_string(), "quantity": 1 }))
        .collect();
    let err = order_service::place_order(&state, &user, order_request(json!({ "items": items })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    assert_eq!(order_count(&state, &user).await?, 0);
    assert_eq!(common::cart_of(&state, &user).await?, json!({ "anything": 1 }));
    Ok(())
}

#[tokio::test]
async fn deferred_without_provider_keeps_the_order_and_clears_the_cart() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 50).await?;
    fill_cart(&state, &user).await?;

    let err = order_service::place_deferred_order(
        &state,
        &user,
        order_request(json!({ "items": [{ "_id": product.to_string(), "quantity": 1 }] })),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::ProviderUnavailable(_)));

    assert_eq!(order_count(&state, &user).await?, 1);
    assert_eq!(common::cart_of(&state, &user).await?, json!({}));
    Ok(())
}

#[tokio::test]
async fn deferred_with_provider_returns_a_checkout_url() -> anyhow::Result<()> {
    let provider: Arc<dyn PaymentProvider> = Arc::new(common::FakePaymentProvider::settled());
    let Some(state) = common::db_state(Some(provider)).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 40).await?;

    let resp = order_service::place_deferred_order(
        &state,
        &user,
        order_request(json!({ "items": [{ "productId": product.to_string(), "quantity": 1 }] })),
        Some("https://shop.example"),
    )
    .await?;
    let checkout = resp.data.unwrap();
    assert_eq!(checkout.amount, Decimal::from(50));
    assert!(checkout.session_url.starts_with("https://shop.example/verify"));

    let order = Orders::find_by_id(checkout.order_id).one(&state.orm).await?.unwrap();
    assert_eq!(order.payment_method, PaymentMethod::Stripe);
    assert!(!order.payment);
    Ok(())
}

#[tokio::test]
async fn finalize_is_idempotent_and_owner_checked() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let owner = common::create_user(&state).await?;
    let stranger = common::create_user(&state).await?;
    let product = common::create_product(&state, 50).await?;

    let placed = order_service::place_order(
        &state,
        &owner,
        order_request(json!({ "items": [{ "_id": product.to_string(), "quantity": 1 }] })),
    )
    .await?
    .data
    .unwrap();

    let err = order_service::finalize_order(&state, placed.order_id, Some(stranger.user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let order = Orders::find_by_id(placed.order_id).one(&state.orm).await?.unwrap();
    assert!(!order.payment);

    fill_cart(&state, &owner).await?;
    let first = order_service::finalize_order(&state, placed.order_id, Some(owner.user_id)).await?;
    assert_eq!(first, Finalization::Confirmed);
    assert_eq!(common::cart_of(&state, &owner).await?, json!({}));

    let second = order_service::finalize_order(&state, placed.order_id, Some(owner.user_id)).await?;
    assert_eq!(second, Finalization::AlreadyPaid);

    let order = Orders::find_by_id(placed.order_id).one(&state.orm).await?.unwrap();
    assert!(order.payment);
    assert_eq!(order.status, OrderStatus::Paid);

    let err = order_service::finalize_order(&state, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn confirm_payment_and_webhook_finalize_through_the_provider() -> anyhow::Result<()> {
    let provider = Arc::new(common::FakePaymentProvider::default());
    let Some(state) = common::db_state(Some(provider.clone() as Arc<dyn PaymentProvider>)).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 50).await?;
    let order_id = order_service::place_deferred_order(
        &state,
        &user,
        order_request(json!({ "items": [{ "_id": product.to_string(), "quantity": 1 }] })),
        None,
    )
    .await?
    .data
    .unwrap()
    .order_id;

    let confirm = || ConfirmPaymentRequest {
        order_id,
        session_id: "cs_test".into(),
    };
    let err = order_service::confirm_payment(&state, &user, confirm())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let payload = json!({ "order_id": order_id.to_string() }).to_string();
    let err = order_service::handle_webhook(&state, payload.as_bytes(), Some("forged"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    order_service::handle_webhook(&state, payload.as_bytes(), Some(common::VALID_SIGNATURE)).await?;
    let order = Orders::find_by_id(order_id).one(&state.orm).await?.unwrap();
    assert!(order.payment);

    provider.paid.store(true, std::sync::atomic::Ordering::SeqCst);
    let resp = order_service::confirm_payment(&state, &user, confirm()).await?;
    assert_eq!(resp.message, "Payment already confirmed");
    Ok(())
}

#[tokio::test]
async fn admin_status_updates_and_listings() -> anyhow::Result<()> {
    let Some(state) = common::db_state(None).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 50).await?;
    let order_id = order_service::place_order(
        &state,
        &user,
        order_request(json!({ "items": [{ "_id": product.to_string(), "quantity": 1 }] })),
    )
    .await?
    .data
    .unwrap()
    .order_id;

    let update = |order_id: Option<Uuid>, status: Option<&str>| UpdateStatusRequest {
        order_id,
        status: status.map(str::to_string),
    };

    let resp =
        order_service::update_status(&state, &admin(), update(Some(order_id), Some("Shipped"))).await?;
    assert_eq!(resp.data.unwrap().status, OrderStatus::Shipped);

    // Any listed status may follow any other.
    order_service::update_status(&state, &admin(), update(Some(order_id), Some("Order Placed"))).await?;

    for (id, status) in [
        (Some(order_id), Some("Teleported")),
        (None, Some("Shipped")),
        (Some(order_id), None),
    ] {
        let err = order_service::update_status(&state, &admin(), update(id, status))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    let err = order_service::update_status(&state, &admin(), update(Some(Uuid::new_v4()), Some("Paid")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let mine = order_service::list_user_orders(&state, &user).await?;
    assert_eq!(mine.meta.unwrap().total, Some(1));
    let mine = mine.data.unwrap().items;
    assert_eq!(mine[0].id, order_id);
    assert_eq!(mine[0].status, OrderStatus::OrderPlaced);

    let all = order_service::list_all_orders(&state, &admin()).await?.data.unwrap().items;
    assert!(all.iter().any(|order| order.id == order_id));
    Ok(())
}
