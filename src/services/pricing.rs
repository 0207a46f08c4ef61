//! Trusted order totals.
//!
//! Client-submitted prices and totals are never read; unit prices come from
//! the catalog and the delivery charge from configuration.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::products::{Column as ProdCol, Entity as Products},
    error::AppResult,
    models::OrderLine,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Totals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct PricingEngine {
    delivery_charge: i64,
}

impl PricingEngine {
    pub fn new(delivery_charge: i64) -> Self {
        Self { delivery_charge }
    }

    pub fn delivery_charge(&self) -> i64 {
        self.delivery_charge
    }

    /// Sum every line independently; duplicates are not merged and unknown
    /// products are priced at zero.
    pub fn totals(&self, lines: &[OrderLine], prices: &HashMap<String, i64>) -> Totals {
        let subtotal = lines.iter().fold(Decimal::ZERO, |acc, line| {
            let price = prices.get(&line.product_id).copied().unwrap_or(0);
            acc.saturating_add(Decimal::from(price).saturating_mul(line.quantity))
        });
        Totals {
            subtotal,
            total: subtotal.saturating_add(Decimal::from(self.delivery_charge)),
        }
    }

    /// Look up catalog prices for `lines` and compute their totals.
    pub async fn quote(&self, orm: &OrmConn, lines: &[OrderLine]) -> AppResult<Totals> {
        let prices = load_prices(orm, lines).await?;
        Ok(self.totals(lines, &prices))
    }
}

/// Map each line's product id, as the client spelled it, to the catalog price.
/// Ids that are not valid or not in the catalog are left out.
pub async fn load_prices(orm: &OrmConn, lines: &[OrderLine]) -> AppResult<HashMap<String, i64>> {
    let mut ids: Vec<Uuid> = lines
        .iter()
        .filter_map(|line| Uuid::parse_str(&line.product_id).ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let by_id: HashMap<Uuid, i64> = Products::find()
        .select_only()
        .column(ProdCol::Id)
        .column(ProdCol::Price)
        .filter(ProdCol::Id.is_in(ids))
        .into_tuple::<(Uuid, i64)>()
        .all(orm)
        .await?
        .into_iter()
        .collect();

    let prices = lines
        .iter()
        .filter_map(|line| {
            let id = Uuid::parse_str(&line.product_id).ok()?;
            by_id.get(&id).map(|price| (line.product_id.clone(), *price))
        })
        .collect();
    Ok(prices)
}

/// Client quantities arrive as numbers or numeric strings. Fractions are
/// kept; negative, non-finite or unparseable values count as zero.
pub fn coerce_quantity(raw: &Value) -> Decimal {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|q| q.is_finite() && *q >= 0.0)
        .and_then(|q| Decimal::try_from(q).ok())
        .map(|q| q.normalize())
        .unwrap_or(Decimal::ZERO)
}
