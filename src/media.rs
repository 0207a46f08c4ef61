//! Product image hosting.
//!
//! Handlers only see [`MediaStore`]; the Cloudinary client and the parsing of
//! its URL scheme stay in this module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use crate::config::CloudinaryConfig;

/// Upper bound for a single product image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media host rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the image and return its public URL.
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError>;

    /// Remove a previously uploaded image by the URL `upload` returned.
    async fn delete(&self, reference: &str) -> Result<(), MediaError>;
}

pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryMediaStore {
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{action}",
            self.cloud_name
        )
    }

    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        sign_params(params, self.api_secret.expose_secret())
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError> {
        let mut params = BTreeMap::new();
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let mut form = reqwest::multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("{status}: {body}")));
        }

        let uploaded: UploadResponse = response.json().await?;
        Ok(uploaded.secure_url)
    }

    async fn delete(&self, reference: &str) -> Result<(), MediaError> {
        let Some(public_id) = derive_public_id(reference) else {
            tracing::debug!(reference, "not a media host url, nothing to delete");
            return Ok(());
        };

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id);
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let mut form: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        form.push(("api_key".into(), self.api_key.clone()));
        form.push(("signature".into(), signature));
        form.push(("signature_algorithm".into(), "sha256".into()));

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MediaError::Rejected(response.status().to_string()));
        }

        let destroyed: DestroyResponse = response.json().await?;
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Rejected(other.to_string())),
        }
    }
}

/// Cloudinary request signature: sorted `key=value` pairs joined by `&`,
/// followed by the API secret, hashed with SHA-256.
fn sign_params(params: &BTreeMap<&str, String>, secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recover the public id from a delivery URL such as
/// `https://res.cloudinary.com/demo/image/upload/v1712/products/abc.jpg`
/// (gives `products/abc`). Anything that is not a media host upload URL
/// yields `None`.
pub fn derive_public_id(reference: &str) -> Option<String> {
    let url = Url::parse(reference).ok()?;
    if !url.host_str()?.ends_with("res.cloudinary.com") {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let upload_idx = segments.iter().position(|s| *s == "upload")?;
    let mut rest = &segments[upload_idx + 1..];

    if let Some(first) = rest.first() {
        let is_version = first.len() > 1
            && first.starts_with('v')
            && first[1..].chars().all(|c| c.is_ascii_digit());
        if is_version {
            rest = &rest[1..];
        }
    }
    if rest.is_empty() {
        return None;
    }

    let path = rest.join("/");
    match path.rfind('.') {
        Some(dot) if dot > 0 => Some(path[..dot].to_string()),
        _ => Some(path),
    }
}

/// Only jpeg, png and webp are accepted, and the extension must agree.
pub fn is_allowed_image(file_name: &str, content_type: &str) -> bool {
    let ext_ok = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "webp"));
    let mime_ok = matches!(content_type, "image/jpeg" | "image/png" | "image/webp");
    ext_ok && mime_ok
}
