use sea_orm::entity::prelude::*;

use crate::models::{LineItems, OrderStatus, PaymentMethod};

/// Orders point back at their user by id only; there is no foreign key,
/// so a removed user leaves its orders intact.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub items: LineItems,
    #[sea_orm(column_type = "JsonBinary")]
    pub address: Json,
    #[sea_orm(column_type = "Decimal(None)")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment: bool,
    pub status: OrderStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
