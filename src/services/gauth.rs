use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::ServiceAccountKey;

const OAUTH_SCOPES: &str = "https://www.googleapis.com/auth/firebase.database \
     https://www.googleapis.com/auth/userinfo.email \
     https://www.googleapis.com/auth/firebase.messaging";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid service account key: {0}")]
    InvalidKey(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Mints OAuth2 access tokens from the service-account key via the JWT
/// bearer grant and caches them until shortly before expiry. One instance
/// is shared by the database store and the FCM provider.
pub struct TokenSource {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey) -> Result<Self, TokenError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        Ok(Self {
            key,
            signing_key,
            client: Client::new(),
            cached: Mutex::new(None),
        })
    }

    pub async fn token(&self) -> Result<String, TokenError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_SKEW_SECS > now {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken, TokenError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: OAUTH_SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                TokenError::Exchange(format!("request to {} failed: {}", self.key.token_uri, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Exchange(format!(
                "{} returned {}: {}",
                self.key.token_uri, status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::Exchange(format!("malformed token response: {}", e)))?;

        tracing::debug!(client_email = %self.key.client_email, "Minted Google OAuth access token");

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}
