use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejections come back in the API envelope as 400s.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
