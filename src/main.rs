use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_storefront::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    media::CloudinaryMediaStore,
    routes::build_app,
    security::{StaticAdminAuthenticator, TokenKeys},
    services::pricing::PricingEngine,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vault_storefront=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    tracing::info!("no payment provider configured; deferred payments are disabled");
    let state = AppState {
        orm: create_orm_conn(&pool),
        pool,
        tokens: TokenKeys::new(&config.jwt_secret),
        admin: Arc::new(StaticAdminAuthenticator::new(
            config.admin_email.clone(),
            config.admin_password.clone(),
        )),
        media: Arc::new(CloudinaryMediaStore::new(&config.cloudinary)),
        payments: None,
        pricing: PricingEngine::new(config.delivery_charge),
        currency: config.currency.clone(),
        frontend_url: config.frontend_origins.first().cloned(),
    };
    tracing::debug!(
        delivery_charge = state.pricing.delivery_charge(),
        currency = %state.currency,
        "pricing configured"
    );

    let app = build_app(state, &config.frontend_origins);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
