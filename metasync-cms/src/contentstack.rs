//! Contentstack live-preview implementation of [`CmsPort`].
//!
//! Uses the delivery API v3 with the `live_preview` hash and
//! `preview_token` headers on every request.

use std::time::Duration;

use async_trait::async_trait;
use metasync_model::{Asset, ContentType, Entry};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{CmsError, CmsResult};
use crate::port::CmsPort;

pub const DEFAULT_PREVIEW_URL: &str = "https://api.contentstack.io";

/// Credentials and endpoint for the live-preview delivery API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentstackConfig {
    pub delivery_token: String,
    pub preview_token: String,
    pub environment: String,
    pub api_key: String,
    /// Base URL of the preview API (e.g. `https://api.contentstack.io`).
    #[serde(default = "default_preview_url")]
    pub preview_url: String,
}

fn default_preview_url() -> String {
    DEFAULT_PREVIEW_URL.to_string()
}

impl Default for ContentstackConfig {
    fn default() -> Self {
        Self {
            delivery_token: String::new(),
            preview_token: String::new(),
            environment: String::new(),
            api_key: String::new(),
            preview_url: default_preview_url(),
        }
    }
}

impl ContentstackConfig {
    /// Checks that every credential is present.
    pub fn validate(&self) -> CmsResult<()> {
        let required = [
            ("deliveryToken", &self.delivery_token),
            ("previewToken", &self.preview_token),
            ("environment", &self.environment),
            ("apiKey", &self.api_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CmsError::Config(format!("{name} is required")));
            }
        }
        Ok(())
    }

    /// The preview URL without a trailing slash, falling back to the
    /// default when unset.
    pub fn base_url(&self) -> &str {
        let url = self.preview_url.trim_end_matches('/');
        if url.is_empty() { DEFAULT_PREVIEW_URL } else { url }
    }
}

#[derive(Debug, Deserialize)]
struct EntryEnvelope {
    entry: Option<Entry>,
}

#[derive(Debug, Deserialize)]
struct ContentTypeEnvelope {
    content_type: Option<ContentType>,
}

#[derive(Debug, Deserialize)]
struct AssetEnvelope {
    asset: Option<Asset>,
}

#[derive(Debug, Deserialize)]
struct GlobalFieldEnvelope {
    global_field: Option<ContentType>,
}

/// HTTP client for the Contentstack preview API.
pub struct ContentstackClient {
    config: ContentstackConfig,
    client: Client,
}

impl ContentstackClient {
    /// Validates `config` and builds the HTTP client.
    pub fn new(config: ContentstackConfig) -> CmsResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ContentstackConfig {
        &self.config
    }

    fn headers(&self, hash: &str) -> CmsResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let pairs = [
            ("access_token", self.config.delivery_token.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("live_preview", hash),
            ("preview_token", self.config.preview_token.as_str()),
        ];
        for (name, value) in pairs {
            let value = HeaderValue::from_str(value)
                .map_err(|e| CmsError::Config(format!("invalid {name} header: {e}")))?;
            headers.insert(HeaderName::from_static(name), value);
        }
        Ok(headers)
    }

    /// Issues a GET and returns the JSON body, mapping `error_code`
    /// responses to [`CmsError::Api`].
    async fn get_json(&self, path: &str, query: &[(&str, &str)], hash: &str) -> CmsResult<Value> {
        let url = format!("{}{}", self.config.base_url(), path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers(hash)?)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => Value::Null,
        };

        if let Some(code) = body.get("error_code") {
            let message = body
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("unknown CMS error")
                .to_string();
            error!("CMS request {} failed: {}", path, message);
            return Err(CmsError::Api {
                code: code.as_i64(),
                message,
            });
        }
        if !status.is_success() {
            error!("CMS request {} failed with status {}", path, status);
            return Err(CmsError::Api {
                code: None,
                message: format!("request failed with status {status}"),
            });
        }
        Ok(body)
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        hash: &str,
    ) -> CmsResult<T> {
        let body = self.get_json(path, query, hash).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetches an entry together with its content type schema and returns
    /// the response body untouched.
    pub async fn fetch_entry_with_schema(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
        hash: &str,
    ) -> CmsResult<Value> {
        self.get_json(
            &format!("/v3/content_types/{content_type_uid}/entries/{entry_uid}"),
            &[
                ("environment", self.config.environment.as_str()),
                ("include_schema", "true"),
            ],
            hash,
        )
        .await
    }
}

#[async_trait]
impl CmsPort for ContentstackClient {
    async fn get_entry(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
        hash: &str,
    ) -> CmsResult<Entry> {
        let envelope: EntryEnvelope = self
            .get_envelope(
                &format!("/v3/content_types/{content_type_uid}/entries/{entry_uid}"),
                &[("environment", self.config.environment.as_str())],
                hash,
            )
            .await?;
        envelope
            .entry
            .ok_or_else(|| CmsError::entry_not_found(content_type_uid, entry_uid))
    }

    async fn get_content_type(&self, content_type_uid: &str, hash: &str) -> CmsResult<ContentType> {
        let envelope: ContentTypeEnvelope = self
            .get_envelope(&format!("/v3/content_types/{content_type_uid}"), &[], hash)
            .await?;
        envelope
            .content_type
            .ok_or_else(|| CmsError::NotFound(format!("content type {content_type_uid}")))
    }

    async fn get_asset(&self, asset_uid: &str, hash: &str) -> CmsResult<Asset> {
        let envelope: AssetEnvelope = self
            .get_envelope(
                &format!("/v3/assets/{asset_uid}"),
                &[("include_metadata", "true")],
                hash,
            )
            .await?;
        envelope
            .asset
            .ok_or_else(|| CmsError::NotFound(format!("asset {asset_uid}")))
    }

    async fn get_global_field(&self, uid: &str, hash: &str) -> CmsResult<ContentType> {
        let envelope: GlobalFieldEnvelope = self
            .get_envelope(&format!("/v3/global_fields/{uid}"), &[], hash)
            .await?;
        envelope
            .global_field
            .ok_or_else(|| CmsError::NotFound(format!("global field {uid}")))
    }
}
