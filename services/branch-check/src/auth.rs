//! GitHub App Authentication
//!
//! Signs the app JWT and exchanges it for an installation access token. The
//! token is cached and refreshed shortly before it expires.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{AuthError, GitHubApiError};
use crate::github::{apply_default_headers, error_for_status};

/// Refresh the cached token when less than this much validity is left
const REFRESH_MARGIN_SECS: i64 = 60;

/// JWT claims for GitHub App authentication
#[derive(Debug, Serialize)]
pub struct GitHubAppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issuer (GitHub App ID)
    pub iss: String,
}

/// App identity loaded once at startup
pub struct GitHubAppCredentials {
    app_id: u64,
    installation_id: u64,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for GitHubAppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAppCredentials")
            .field("app_id", &self.app_id)
            .field("installation_id", &self.installation_id)
            .finish_non_exhaustive()
    }
}

impl GitHubAppCredentials {
    /// Parse an RSA private key in PEM format.
    pub fn from_pem(
        app_id: u64,
        installation_id: u64,
        private_key_pem: &[u8],
    ) -> Result<Self, AuthError> {
        let encoding_key =
            EncodingKey::from_rsa_pem(private_key_pem).map_err(AuthError::InvalidKey)?;

        Ok(Self {
            app_id,
            installation_id,
            encoding_key,
        })
    }

    /// Read and parse the private key file.
    pub fn from_key_file(
        app_id: u64,
        installation_id: u64,
        private_key_path: &str,
    ) -> Result<Self, AuthError> {
        let key_data = fs::read(private_key_path).map_err(|source| AuthError::KeyRead {
            path: private_key_path.to_string(),
            source,
        })?;

        Self::from_pem(app_id, installation_id, &key_data)
    }

    pub fn installation_id(&self) -> u64 {
        self.installation_id
    }

    /// Generate a JWT valid for 10 minutes
    pub fn generate_jwt(&self) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::Clock)?
            .as_secs();

        let claims = GitHubAppClaims {
            iat: now.saturating_sub(60), // 60 seconds ago to account for clock skew
            exp: now + 600,              // Expires in 10 minutes
            iss: self.app_id.to_string(),
        };

        let header = Header::new(Algorithm::RS256);

        encode(&header, &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }
}

/// Response from the installation token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Hands out installation tokens, exchanging a new JWT only when the cached
/// token is close to expiry.
pub struct InstallationTokenProvider {
    credentials: GitHubAppCredentials,
    http_client: Client,
    api_url: String,
    cached: RwLock<Option<InstallationToken>>,
}

impl InstallationTokenProvider {
    pub fn new(credentials: GitHubAppCredentials, http_client: Client, api_url: &str) -> Self {
        Self {
            credentials,
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            cached: RwLock::new(None),
        }
    }

    /// A token valid for at least another minute
    pub async fn token(&self) -> Result<String, GitHubApiError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(current) = cached.as_ref() {
            if current.is_fresh(Utc::now()) {
                return Ok(current.token.clone());
            }
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Exchange a freshly signed JWT for an installation access token
    async fn exchange(&self) -> Result<InstallationToken, GitHubApiError> {
        let jwt = self.credentials.generate_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_url,
            self.credentials.installation_id()
        );

        debug!(installation_id = self.credentials.installation_id(), "Requesting installation token");

        let response = apply_default_headers(self.http_client.post(&url))
            .bearer_auth(jwt)
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let token = response
            .json::<InstallationToken>()
            .await
            .map_err(|e| GitHubApiError::Decode(e.to_string()))?;

        info!(
            installation_id = self.credentials.installation_id(),
            expires_at = %token.expires_at,
            "Installation token refreshed"
        );

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pem_is_rejected() {
        let err = GitHubAppCredentials::from_pem(1, 2, b"not a key").unwrap_err();
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }

    #[test]
    fn test_missing_key_file_is_reported() {
        let err =
            GitHubAppCredentials::from_key_file(1, 2, "/nonexistent/branch-check.pem").unwrap_err();
        assert!(matches!(err, AuthError::KeyRead { .. }));
        assert!(err.to_string().contains("/nonexistent/branch-check.pem"));
    }

    #[test]
    fn test_token_freshness() {
        let now = Utc::now();
        let token = InstallationToken {
            token: "ghs_example".to_string(),
            expires_at: now + Duration::minutes(30),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::minutes(29) + Duration::seconds(30)));
    }

    #[test]
    fn test_token_response_parsing() {
        let token: InstallationToken = serde_json::from_str(
            r#"{"token":"ghs_abc","expires_at":"2024-05-01T13:00:00Z","permissions":{"checks":"write"}}"#,
        )
        .unwrap();
        assert_eq!(token.token, "ghs_abc");
        assert_eq!(token.expires_at.to_rfc3339(), "2024-05-01T13:00:00+00:00");
    }
}
