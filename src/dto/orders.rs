use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Order, OrderLine},
    services::pricing::coerce_quantity,
};

/// Upper bound on lines per order; caps catalog lookups and payload size.
pub const MAX_ORDER_LINES: usize = 50;

/// A line as the client sends it. Extra fields such as a client-side price
/// are accepted and dropped.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineInput {
    #[serde(alias = "_id", alias = "productId")]
    pub id: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub quantity: Value,
}

impl From<&OrderLineInput> for OrderLine {
    fn from(input: &OrderLineInput) -> Self {
        OrderLine {
            product_id: input.id.trim().to_string(),
            quantity: coerce_quantity(&input.quantity),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<OrderLineInput>>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub address: Value,
}

impl PlaceOrderRequest {
    /// Check the line list and address shape before anything is written.
    pub fn validate(&self) -> AppResult<(Vec<OrderLine>, Value)> {
        let items = match self.items.as_deref() {
            Some(items) if !items.is_empty() => items,
            _ => return Err(AppError::BadRequest("No items provided".into())),
        };
        if items.len() > MAX_ORDER_LINES {
            return Err(AppError::BadRequest("Too many items".into()));
        }

        let address = match &self.address {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => self.address.clone(),
            _ => return Err(AppError::BadRequest("Address must be an object".into())),
        };

        Ok((items.iter().map(OrderLine::from).collect(), address))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeferredCheckout {
    pub order_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub session_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub order_id: Uuid,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}
