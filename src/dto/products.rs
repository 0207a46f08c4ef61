use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{media::ImageUpload, models::Product};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Brand slug, case-insensitive.
    pub brand: Option<String>,
    /// Legacy alias for `brand`.
    pub category: Option<String>,
    /// Case-insensitive name search.
    pub q: Option<String>,
    /// Only `true` filters.
    pub bestseller: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveProductRequest {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SingleProductRequest {
    #[serde(default)]
    pub product_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

/// Fields of the multipart add-product form, still unvalidated.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub brand: Option<String>,
    /// Legacy spelling of `brand`.
    pub category: Option<String>,
    pub bestseller: Option<String>,
    pub images: Vec<ImageUpload>,
}

/// Shape of the add-product form for the API docs.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ProductUpload {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub brand: String,
    pub bestseller: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image1: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image2: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image3: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image4: Option<Vec<u8>>,
}
