use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{ProductForm, ProductList, ProductQuery},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::{Brand, ImageList, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all();

    let brand = query
        .brand
        .as_deref()
        .or(query.category.as_deref())
        .map(str::trim)
        .filter(|b| !b.is_empty());
    if let Some(brand) = brand {
        match brand.parse::<Brand>() {
            Ok(brand) => condition = condition.add(Column::Brand.eq(brand)),
            // Not a brand we sell: nothing can match.
            Err(_) => {
                return Ok(ApiResponse::success(
                    "Products",
                    ProductList { items: Vec::new() },
                    Some(Meta::total(0)),
                ));
            }
        }
    }

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        condition = condition.add(Expr::col(Column::Name).ilike(pattern));
    }

    if query.bestseller.as_deref() == Some("true") {
        condition = condition.add(Column::Bestseller.eq(true));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let items: Vec<Product> = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, raw_id: Option<String>) -> AppResult<ApiResponse<Product>> {
    let raw_id = required_id(raw_id, "productId is required")?;
    let product = find_product(state, &raw_id).await?;
    Ok(ApiResponse::success("Product", product_from_entity(product), None))
}

pub async fn add_product(
    state: &AppState,
    admin: &AdminUser,
    form: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    let name = form.name.as_deref().map(str::trim).unwrap_or_default().to_string();
    let price = form.price.as_deref().map(str::trim).unwrap_or_default();
    let brand = form
        .brand
        .as_deref()
        .or(form.category.as_deref())
        .map(str::trim)
        .unwrap_or_default();
    if name.is_empty() || price.is_empty() || brand.is_empty() {
        return Err(AppError::BadRequest(
            "name, price, and brand are required".into(),
        ));
    }

    let price = parse_price(price)?;
    let brand = brand
        .parse::<Brand>()
        .map_err(|_| AppError::BadRequest(format!("Unknown brand: {brand}")))?;

    // Upload before insert so a failed upload leaves no half-built product.
    let mut images = Vec::with_capacity(form.images.len());
    for image in form.images {
        let url = state.media.upload(image).await.map_err(|err| {
            AppError::Internal(anyhow::anyhow!(err).context("image upload failed"))
        })?;
        images.push(url);
    }

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(form.description.unwrap_or_default()),
        price: Set(price),
        brand: Set(brand),
        images: Set(ImageList(images)),
        bestseller: Set(form.bestseller.as_deref() == Some("true")),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, admin = %admin.email, "product added");
    audit::record(
        state,
        None,
        "product_add",
        "products",
        serde_json::json!({ "product_id": product.id, "admin": admin.email }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product Added",
        product_from_entity(product),
        None,
    ))
}

pub async fn remove_product(
    state: &AppState,
    admin: &AdminUser,
    raw_id: Option<String>,
) -> AppResult<ApiResponse<()>> {
    let raw_id = required_id(raw_id, "Product id is required")?;
    let product = find_product(state, &raw_id).await?;

    for reference in &product.images.0 {
        if let Err(err) = state.media.delete(reference).await {
            tracing::warn!(error = %err, reference, "image cleanup failed");
        }
    }

    Products::delete_by_id(product.id).exec(&state.orm).await?;

    audit::record(
        state,
        None,
        "product_remove",
        "products",
        serde_json::json!({ "product_id": product.id, "admin": admin.email }),
    )
    .await;

    Ok(ApiResponse::ok("Product Removed"))
}

async fn find_product(state: &AppState, raw_id: &str) -> AppResult<ProductModel> {
    let not_found = || AppError::NotFound("Product not found".into());
    let id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(not_found)
}

fn required_id(raw: Option<String>, message: &str) -> AppResult<String> {
    raw.map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

fn parse_price(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|price| *price >= 0)
        .ok_or_else(|| AppError::BadRequest("price must be a non-negative whole number".into()))
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        brand: model.brand,
        images: model.images,
        bestseller: model.bestseller,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
