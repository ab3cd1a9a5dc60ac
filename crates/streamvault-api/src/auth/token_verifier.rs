//! RS256 bearer-token verification with a cached public-key set.
//!
//! The identity proxy signs tokens with rotating RSA keys published as a
//! JWKS document. The verifier owns its own `(keys, expires_at)` cache and
//! refreshes it on expiry; there is no ambient global state.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use streamvault_core::AppError;
use tokio::sync::RwLock;

use super::models::IdClaims;

/// JWKS (JSON Web Key Set) document
#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(rename = "kty")]
    key_type: String,
    #[serde(rename = "kid")]
    key_id: Option<String>,
    #[serde(rename = "n")]
    modulus: Option<String>,
    #[serde(rename = "e")]
    exponent: Option<String>,
}

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    expires_at: DateTime<Utc>,
}

pub struct TokenVerifier {
    certs_url: String,
    audience: Option<String>,
    cache_ttl_seconds: i64,
    cache: RwLock<Option<KeyCache>>,
}

impl TokenVerifier {
    /// # Arguments
    /// * `certs_url` - JWKS endpoint publishing the signing keys
    /// * `audience` - expected `aud` claim; `None` disables the audience check
    /// * `cache_ttl_seconds` - how long fetched keys stay cached
    pub fn new(certs_url: String, audience: Option<String>, cache_ttl_seconds: i64) -> Self {
        Self {
            certs_url,
            audience,
            cache_ttl_seconds,
            cache: RwLock::new(None),
        }
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, DecodingKey>, AppError> {
        let response = reqwest::get(&self.certs_url)
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to fetch signing keys: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "Signing-key endpoint returned {}",
                response.status()
            )));
        }

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to parse signing keys: {}", e)))?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            if jwk.key_type != "RSA" {
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (&jwk.key_id, &jwk.modulus, &jwk.exponent) else {
                continue;
            };
            let key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
                AppError::Unauthorized(format!("Failed to build RSA key: {}", e))
            })?;
            keys.insert(kid.clone(), key);
        }

        if keys.is_empty() {
            return Err(AppError::Unauthorized(
                "No usable RSA keys in signing-key document".to_string(),
            ));
        }

        Ok(keys)
    }

    /// Get the decoding key for a key id, refreshing the cache on expiry.
    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now() {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        // Cache miss, expiry, or unknown kid (rotation) - fetch fresh keys.
        let keys = self.fetch_keys().await?;
        let key = keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(format!("Key ID {} not found", kid)))?;

        let mut cache = self.cache.write().await;
        *cache = Some(KeyCache {
            keys,
            expires_at: Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds),
        });

        Ok(key)
    }

    /// Validate and decode a bearer token.
    pub async fn verify(&self, token: &str) -> Result<IdClaims, AppError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Token header missing key ID".to_string()))?;

        let decoding_key = self.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<IdClaims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                    AppError::Unauthorized("Invalid token audience".to_string())
                }
                _ => AppError::Unauthorized(format!("Invalid or expired token: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_kid_without_reachable_endpoint_is_unauthorized() {
        let verifier = TokenVerifier::new(
            "http://127.0.0.1:1/certs".to_string(),
            None,
            3600,
        );
        let err = match verifier.get_decoding_key("missing").await {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_before_key_fetch() {
        let verifier = TokenVerifier::new(
            "http://127.0.0.1:1/certs".to_string(),
            None,
            3600,
        );
        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
