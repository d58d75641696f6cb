//! Client for the Void Drop endpoint: a dumb key→blob store addressed by a
//! user-chosen channel key. Last writer wins, no conflict detection; the
//! only auth is key secrecy.

use std::env;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;

/// Channel keys shorter than this are never sent to the endpoint.
pub const MIN_CHANNEL_KEY_LEN: usize = 3;

#[derive(Clone, Debug)]
pub struct VoidConfig {
    pub api_base: String,
}

impl VoidConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let api_base = env::var("VOID_API_BASE")
            .map_err(|_| AppError::Config("VOID_API_BASE is not set".to_string()))?;
        Ok(Self { api_base })
    }
}

#[async_trait]
pub trait VoidClient: Send + Sync {
    /// Fetches the blob stored under `key`. `None` when the channel holds
    /// no data (empty or literal "null" body).
    async fn download(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Overwrites the blob under `key` unconditionally.
    async fn upload(&self, key: &str, body: &str) -> Result<(), AppError>;
}

pub struct VoidHttpClient {
    client: Client,
    config: VoidConfig,
}

impl VoidHttpClient {
    pub fn new(config: VoidConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl VoidClient for VoidHttpClient {
    async fn download(&self, key: &str) -> Result<Option<String>, AppError> {
        let url = format!("{}/{}", self.config.api_base, key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Remote(format!(
                "download failed with status {}",
                response.status()
            )));
        }

        let text = response.text().await.unwrap_or_default();
        if text.is_empty() || text == "null" {
            return Ok(None);
        }
        Ok(Some(text))
    }

    async fn upload(&self, key: &str, body: &str) -> Result<(), AppError> {
        let url = format!("{}/{}", self.config.api_base, key);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("upload failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Remote(format!(
                "upload failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Client used when no endpoint is configured; every channel reads empty.
pub struct NoopVoidClient;

#[async_trait]
impl VoidClient for NoopVoidClient {
    async fn download(&self, _key: &str) -> Result<Option<String>, AppError> {
        Ok(None)
    }

    async fn upload(&self, _key: &str, _body: &str) -> Result<(), AppError> {
        Ok(())
    }
}
