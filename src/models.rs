use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Public view of a user. The password hash and cart never leave the server here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub brand: Brand,
    pub images: ImageList,
    pub bestseller: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: LineItems,
    #[schema(value_type = Object)]
    pub address: serde_json::Value,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment: bool,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Per-user cart: product id to a strictly positive quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromJsonQueryResult)]
#[serde(transparent)]
pub struct CartMap(pub BTreeMap<String, i64>);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ImageList(pub Vec<String>);

/// One line of an order, captured when the order is placed. Quantities may
/// be fractional; they are never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub product_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromJsonQueryResult)]
#[serde(transparent)]
pub struct LineItems(pub Vec<OrderLine>);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    #[sea_orm(string_value = "ledger")]
    Ledger,
    #[sea_orm(string_value = "trezor")]
    Trezor,
    #[sea_orm(string_value = "keystone")]
    Keystone,
    #[sea_orm(string_value = "bitbox")]
    Bitbox,
    #[sea_orm(string_value = "gridplus")]
    Gridplus,
    #[sea_orm(string_value = "ellipal")]
    Ellipal,
    #[sea_orm(string_value = "secalot")]
    Secalot,
    #[sea_orm(string_value = "safepal")]
    Safepal,
}

impl Brand {
    pub const ALL: [Brand; 8] = [
        Brand::Ledger,
        Brand::Trezor,
        Brand::Keystone,
        Brand::Bitbox,
        Brand::Gridplus,
        Brand::Ellipal,
        Brand::Secalot,
        Brand::Safepal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Ledger => "ledger",
            Brand::Trezor => "trezor",
            Brand::Keystone => "keystone",
            Brand::Bitbox => "bitbox",
            Brand::Gridplus => "gridplus",
            Brand::Ellipal => "ellipal",
            Brand::Secalot => "secalot",
            Brand::Safepal => "safepal",
        }
    }
}

/// Brand names are matched case-insensitively and ignore surrounding whitespace.
impl FromStr for Brand {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Brand::ALL
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Order Placed")]
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Paid")]
    Paid,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::OrderPlaced,
        OrderStatus::Processing,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::OrderPlaced => "Order Placed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

/// Status labels are exact: "order placed" is not "Order Placed".
impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethod {
    /// Pay on delivery; settles without any provider round-trip.
    #[sea_orm(string_value = "COD")]
    #[serde(rename = "COD")]
    CashOnDelivery,
    /// Card payment through the external provider; needs finalization.
    #[sea_orm(string_value = "Stripe")]
    Stripe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value `{}`", self.0)
    }
}

impl std::error::Error for UnknownVariant {}
