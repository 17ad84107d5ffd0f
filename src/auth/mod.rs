//! DocuSign OAuth Module
//!
//! Obtains access tokens through the JWT-bearer grant: the service signs a
//! short assertion with the integration's RSA private key and exchanges it at
//! the OAuth server's token endpoint for a bearer token that impersonates the
//! configured user.
//!
//! ## Consent
//!
//! The grant only works after the impersonated user (or an administrator) has
//! granted consent to the integration key. When consent is missing the OAuth
//! server answers `consent_required`; this is surfaced as
//! [`DocuSignError::ConsentRequired`] and never handled automatically.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{DocuSignConfig, DocuSignCredentials};
use crate::error::DocuSignError;

/// OAuth grant type for the JWT-bearer flow.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Cached tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// ============================================================================
// WIRE STRUCTURES
// ============================================================================

/// Claims carried by the JWT assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Integration key
    pub iss: String,
    /// Impersonated user id
    pub sub: String,
    /// OAuth server host
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    pub scope: String,
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Response of `/oauth/userinfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub accounts: Vec<UserAccount>,
}

/// One account the user can act on.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
    pub account_id: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub base_uri: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

// ============================================================================
// TOKEN PROVIDER
// ============================================================================

/// Exchanges signed JWT assertions for DocuSign access tokens.
///
/// By default every call to [`JwtTokenProvider::access_token`] performs a new
/// exchange. With `cache_tokens` enabled the last token is reused until it is
/// within one minute of expiring.
pub struct JwtTokenProvider {
    client: Client,
    oauth_base_url: String,
    audience: String,
    integration_key: String,
    user_id: String,
    scope: String,
    lifetime_secs: u64,
    encoding_key: EncodingKey,
    cache: Option<RwLock<Option<CachedToken>>>,
}

impl JwtTokenProvider {
    /// Creates a token provider.
    ///
    /// The PEM key is parsed here, so a malformed key stops the service at
    /// startup instead of failing on the first request.
    ///
    /// # Arguments
    ///
    /// * `config` - DocuSign settings (OAuth URL, scope, lifetime, cache flag)
    /// * `credentials` - Resolved credentials with a normalized private key
    /// * `client` - Shared HTTP client
    ///
    /// # Returns
    ///
    /// * `Ok(JwtTokenProvider)` - Ready to request tokens
    /// * `Err(anyhow::Error)` - The OAuth URL or private key is invalid
    pub fn new(
        config: &DocuSignConfig,
        credentials: &DocuSignCredentials,
        client: Client,
    ) -> anyhow::Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| anyhow::anyhow!("DocuSign private key could not be parsed: {}", e))?;

        Ok(Self {
            client,
            oauth_base_url: config.oauth_base_url.trim_end_matches('/').to_string(),
            audience: config.oauth_audience()?,
            integration_key: credentials.integration_key.clone(),
            user_id: credentials.user_id.clone(),
            scope: config.scope.clone(),
            lifetime_secs: config.token_lifetime_secs,
            encoding_key,
            cache: config.cache_tokens.then(|| RwLock::new(None)),
        })
    }

    /// Builds and signs the JWT assertion (RS256).
    pub fn build_assertion(&self) -> Result<String, DocuSignError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let claims = AssertionClaims {
            iss: self.integration_key.clone(),
            sub: self.user_id.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.lifetime_secs,
            scope: self.scope.clone(),
        };

        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?)
    }

    /// Performs one JWT-bearer token exchange.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenResponse)` - Token issued
    /// * `Err(DocuSignError::ConsentRequired)` - Consent has not been granted
    /// * `Err(DocuSignError)` - Network failure or any other OAuth rejection
    pub async fn request_token(&self) -> Result<TokenResponse, DocuSignError> {
        let assertion = self.build_assertion()?;
        let url = format!("{}/oauth/token", self.oauth_base_url);

        debug!("Requesting DocuSign access token for user {}", self.user_id);
        let response = self
            .client
            .post(&url)
            .form(&[("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let token = response.json::<TokenResponse>().await?;
            if token.access_token.is_empty() {
                return Err(DocuSignError::UnexpectedResponse(
                    "token endpoint returned an empty access_token".to_string(),
                ));
            }
            return Ok(token);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<OAuthErrorBody>(&body) {
            Ok(err) if err.error == "consent_required" => {
                warn!(
                    "DocuSign consent required for integration key {}",
                    self.integration_key
                );
                Err(DocuSignError::ConsentRequired {
                    integration_key: self.integration_key.clone(),
                })
            }
            Ok(err) => Err(DocuSignError::OAuth {
                status: status.as_u16(),
                error: err.error,
                description: err.error_description,
            }),
            Err(_) => Err(DocuSignError::OAuth {
                status: status.as_u16(),
                error: if body.is_empty() { "unknown_error".to_string() } else { body },
                description: None,
            }),
        }
    }

    /// Returns a bearer token, reusing a cached one when caching is enabled.
    pub async fn access_token(&self) -> Result<String, DocuSignError> {
        let Some(cache) = &self.cache else {
            return Ok(self.request_token().await?.access_token);
        };

        if let Some(cached) = cache.read().await.as_ref() {
            if cached.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(cached.access_token.clone());
            }
        }

        let mut slot = cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(self.lifetime_secs));
        info!("Cached DocuSign access token for {}s", lifetime.as_secs());
        *slot = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    /// Fetches the user's profile and accounts for an access token.
    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo, DocuSignError> {
        let url = format!("{}/oauth/userinfo", self.oauth_base_url);
        let response = self.client.get(&url).bearer_auth(access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DocuSignError::OAuth {
                status: status.as_u16(),
                error: "userinfo_failed".to_string(),
                description: (!body.is_empty()).then_some(body),
            });
        }

        Ok(response.json::<UserInfo>().await?)
    }

    /// Individual consent URL for the integration key.
    ///
    /// Opening it as the impersonated user grants the consent the JWT grant
    /// requires.
    pub fn consent_url(&self, redirect_uri: &str) -> String {
        let base = format!("{}/oauth/auth", self.oauth_base_url);
        match Url::parse(&base) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("response_type", "code")
                    .append_pair("scope", &self.scope)
                    .append_pair("client_id", &self.integration_key)
                    .append_pair("redirect_uri", redirect_uri);
                url.to_string()
            }
            Err(_) => base,
        }
    }

    /// Integration key the provider authenticates as.
    pub fn integration_key(&self) -> &str {
        &self.integration_key
    }
}
