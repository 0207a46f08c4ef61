use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn},
    media::MediaStore,
    payments::PaymentProvider,
    security::{AdminAuthenticator, TokenKeys},
    services::pricing::PricingEngine,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub tokens: TokenKeys,
    pub admin: Arc<dyn AdminAuthenticator>,
    pub media: Arc<dyn MediaStore>,
    pub payments: Option<Arc<dyn PaymentProvider>>,
    pub pricing: PricingEngine,
    pub currency: String,
    /// Where the payment provider sends the shopper back to.
    pub frontend_url: Option<String>,
}
