use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State, multipart::MultipartRejection},
    routing::{get, post},
};

use crate::{
    dto::products::{
        ProductForm, ProductList, ProductQuery, ProductUpload, RemoveProductRequest,
        SingleProductRequest,
    },
    error::{AppError, AppResult},
    extract::ApiJson,
    media::{ImageUpload, MAX_IMAGE_BYTES, is_allowed_image},
    middleware::auth::AdminUser,
    models::Product,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

const IMAGE_FIELDS: [&str; 4] = ["image1", "image2", "image3", "image4"];

/// Four full-size images plus room for the text fields.
const ADD_PRODUCT_BODY_LIMIT: usize = IMAGE_FIELDS.len() * MAX_IMAGE_BYTES + 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_products))
        .route(
            "/add",
            post(add_product).layer(DefaultBodyLimit::max(ADD_PRODUCT_BODY_LIMIT)),
        )
        .route("/remove", post(remove_product))
        .route("/single", post(single_product))
}

#[utoipa::path(
    get,
    path = "/api/product/list",
    params(ProductQuery),
    responses(
        (status = 200, description = "List products, newest first", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/product/add",
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product added", body = ApiResponse<Product>),
        (status = 400, description = "Missing fields, unknown brand or bad image"),
        (status = 401, description = "Not authorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn add_product(
    State(state): State<AppState>,
    admin: AdminUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let multipart = multipart.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let form = read_product_form(multipart).await?;
    let resp = product_service::add_product(&state, &admin, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/product/remove",
    request_body = RemoveProductRequest,
    responses(
        (status = 200, description = "Product removed"),
        (status = 400, description = "Missing id"),
        (status = 401, description = "Not authorized"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn remove_product(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<RemoveProductRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = product_service::remove_product(&state, &admin, payload.id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/product/single",
    request_body = SingleProductRequest,
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 400, description = "Missing productId"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn single_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SingleProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, payload.product_id).await?;
    Ok(Json(resp))
}

async fn read_product_form(mut multipart: Multipart) -> AppResult<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if IMAGE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(err.body_text()))?;
            // Browsers send an empty part for an unused file input.
            if bytes.is_empty() {
                continue;
            }
            if bytes.len() > MAX_IMAGE_BYTES {
                return Err(AppError::BadRequest(format!("{name} exceeds 5 MB")));
            }
            if !is_allowed_image(&file_name, &content_type) {
                return Err(AppError::BadRequest(format!(
                    "{name} must be a jpeg, png or webp image"
                )));
            }
            form.images.push(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        match name.as_str() {
            "name" => form.name = Some(value),
            "description" => form.description = Some(value),
            "price" => form.price = Some(value),
            "brand" => form.brand = Some(value),
            "category" => form.category = Some(value),
            "bestseller" => form.bestseller = Some(value),
            _ => {}
        }
    }

    Ok(form)
}
