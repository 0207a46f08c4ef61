use std::env;

use anyhow::Context;
use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub admin_email: String,
    pub admin_password: SecretString,
    pub cloudinary: CloudinaryConfig,
    pub delivery_charge: i64,
    pub currency: String,
    pub frontend_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(4000);

        let delivery_charge = match env::var("DELIVERY_CHARGE") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|charge| *charge >= 0)
                .with_context(|| format!("DELIVERY_CHARGE must be a non-negative integer, got {raw:?}"))?,
            Err(_) => 10,
        };

        let frontend_origins = ["FRONTEND_URL", "FRONTEND_URL_ALT"]
            .into_iter()
            .filter_map(|key| env::var(key).ok())
            .filter(|origin| !origin.trim().is_empty())
            .collect();

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret: SecretString::from(required("JWT_SECRET")?),
            admin_email: required("ADMIN_EMAIL")?,
            admin_password: SecretString::from(required("ADMIN_PASSWORD")?),
            cloudinary: CloudinaryConfig {
                cloud_name: required("CLOUDINARY_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: SecretString::from(required("CLOUDINARY_SECRET_KEY")?),
            },
            delivery_charge,
            currency: env::var("CURRENCY").unwrap_or_else(|_| "inr".to_string()),
            frontend_origins,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} is not set"))
}
