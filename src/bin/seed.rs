use anyhow::Context;
use uuid::Uuid;
use vault_storefront::{
    db::{DbPool, create_pool, run_migrations},
    models::Brand,
    security::hash_password,
};

/// Demo catalog for local development: name, brand, price, bestseller.
const DEMO_PRODUCTS: [(&str, Brand, i64, bool); 6] = [
    ("Ledger Nano X", Brand::Ledger, 14900, true),
    ("Trezor Model T", Brand::Trezor, 17900, true),
    ("Keystone 3 Pro", Brand::Keystone, 14900, false),
    ("BitBox02", Brand::Bitbox, 11900, false),
    ("GridPlus Lattice1", Brand::Gridplus, 39700, false),
    ("SafePal S1", Brand::Safepal, 4999, true),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let user_id = ensure_user(&pool, "Demo Shopper", "shopper@example.com", "shopper123").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn ensure_user(pool: &DbPool, name: &str, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email}");
    Ok(row.0)
}

async fn seed_products(pool: &DbPool) -> anyhow::Result<()> {
    for (name, brand, price, bestseller) in DEMO_PRODUCTS {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, brand, images, bestseller)
            SELECT $1, $2, $3, $4, $5, '[]'::jsonb, $6
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(format!("{name} hardware wallet"))
        .bind(price)
        .bind(brand.as_str())
        .bind(bestseller)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
