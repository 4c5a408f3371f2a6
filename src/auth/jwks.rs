//! Remote JWKS client: lazily fetches the realm's published keys and caches
//! them by `kid`.

use std::collections::HashMap;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::DecodingKey;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("failed to fetch key set: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("no usable key for kid '{0}'")]
    UnknownKid(String),
}

/// Cached map of `kid` -> verification key.
///
/// A remote key set fetches on first use and refetches once when asked for a
/// kid it does not know (key rotation). A preloaded key set never touches the
/// network; deployments that pin keys (and the test suites) use it.
pub struct KeySet {
    url: Option<String>,
    http: reqwest::Client,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl KeySet {
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            http: reqwest::Client::new(),
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn preloaded(keys: impl IntoIterator<Item = (String, DecodingKey)>) -> Self {
        Self {
            url: None,
            http: reqwest::Client::new(),
            keys: RwLock::new(keys.into_iter().collect()),
        }
    }

    /// Resolve the verification key for a token's `kid`.
    pub async fn key_for(&self, kid: &str) -> Result<DecodingKey, KeySetError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        self.refresh().await?;

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| KeySetError::UnknownKid(kid.to_string()))
    }

    async fn refresh(&self) -> Result<(), KeySetError> {
        let Some(url) = &self.url else {
            // Pinned key set; nothing to fetch.
            return Ok(());
        };

        let set: JwkSet = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut fresh = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    fresh.insert(kid, key);
                }
                Err(e) => {
                    tracing::warn!("skipping unusable key '{}' in key set: {}", kid, e);
                }
            }
        }

        tracing::debug!("refreshed key set from {}: {} keys", url, fresh.len());
        *self.keys.write().await = fresh;
        Ok(())
    }
}
