//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the DocuSign gateway.
//! Configuration includes the DocuSign endpoints, token settings, the names of the
//! environment variables holding credentials, and API server settings.
//!
//! Credentials themselves are never stored in the config file. The file names the
//! environment variables to read them from, and they are resolved once at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::credentials::{normalize_private_key, validate_private_key};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/docusign_gateway.toml";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "DOCUSIGN_GATEWAY_CONFIG_PATH";

/// Environment variable that overrides `docusign.base_path`.
pub const BASE_PATH_ENV: &str = "DOCUSIGN_BASE_PATH";

/// Environment variable that overrides `api.port`.
pub const PORT_ENV: &str = "PORT";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// DocuSign endpoints, token parameters and credential variable names
    #[serde(default)]
    pub docusign: DocuSignConfig,
    /// API server configuration (host, port, CORS, uploads)
    #[serde(default)]
    pub api: ApiConfig,
}

/// DocuSign connection settings.
///
/// The four `*_env` fields name the environment variables that hold the
/// credentials. Defaults match the variable names used by DocuSign's own
/// quick-start material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocuSignConfig {
    /// eSignature REST base path (demo environment by default)
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// OAuth server base URL; its host is also the JWT audience
    #[serde(default = "default_oauth_base_url")]
    pub oauth_base_url: String,
    /// Scope requested in the JWT assertion
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Requested token lifetime in seconds
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
    /// Reuse tokens until shortly before they expire instead of requesting one per call
    #[serde(default)]
    pub cache_tokens: bool,
    /// Email subject for envelopes created through the signature endpoint
    #[serde(default = "default_email_subject")]
    pub email_subject: String,
    /// Timeout for every outbound request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Where DocuSign sends the signer after embedded signing when the caller gives no `returnUrl`
    #[serde(default = "default_signing_return_url")]
    pub signing_return_url: String,
    #[serde(default = "default_integration_key_env")]
    pub integration_key_env: String,
    #[serde(default = "default_user_id_env")]
    pub user_id_env: String,
    #[serde(default = "default_account_id_env")]
    pub account_id_env: String,
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to bind the API server to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins for cross-origin requests ("*" allows any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Directory where uploaded files are staged for the duration of a request
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Maximum accepted multipart body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_base_path() -> String {
    "https://demo.docusign.net/restapi".to_string()
}

fn default_oauth_base_url() -> String {
    "https://account-d.docusign.com".to_string()
}

fn default_scope() -> String {
    "signature impersonation".to_string()
}

fn default_token_lifetime_secs() -> u64 {
    3600
}

fn default_email_subject() -> String {
    "Please sign this document".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_signing_return_url() -> String {
    "https://www.docusign.com".to_string()
}

fn default_integration_key_env() -> String {
    "DOCUSIGN_INTEGRATION_KEY".to_string()
}

fn default_user_id_env() -> String {
    "DOCUSIGN_USER_ID".to_string()
}

fn default_account_id_env() -> String {
    "DOCUSIGN_ACCOUNT_ID".to_string()
}

fn default_private_key_env() -> String {
    "DOCUSIGN_PRIVATE_KEY".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for DocuSignConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            oauth_base_url: default_oauth_base_url(),
            scope: default_scope(),
            token_lifetime_secs: default_token_lifetime_secs(),
            cache_tokens: false,
            email_subject: default_email_subject(),
            request_timeout_secs: default_request_timeout_secs(),
            signing_return_url: default_signing_return_url(),
            integration_key_env: default_integration_key_env(),
            user_id_env: default_user_id_env(),
            account_id_env: default_account_id_env(),
            private_key_env: default_private_key_env(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Credentials resolved from the environment at startup.
///
/// The private key is already normalized (see [`crate::credentials`]).
#[derive(Clone)]
pub struct DocuSignCredentials {
    pub integration_key: String,
    pub user_id: String,
    pub account_id: String,
    pub private_key: String,
}

impl fmt::Debug for DocuSignCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocuSignCredentials")
            .field("integration_key", &self.integration_key)
            .field("user_id", &self.user_id)
            .field("account_id", &self.account_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl DocuSignConfig {
    /// Resolves credentials from the process environment.
    ///
    /// # Returns
    ///
    /// * `Ok(DocuSignCredentials)` - All four variables are set and the key is valid
    /// * `Err(anyhow::Error)` - One or more variables are missing, or the key is malformed
    pub fn resolve_credentials(&self) -> anyhow::Result<DocuSignCredentials> {
        self.resolve_credentials_with(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through the given lookup function.
    ///
    /// Every missing (or empty) variable is reported in a single error so the
    /// operator can fix them all at once.
    pub fn resolve_credentials_with<F>(&self, lookup: F) -> anyhow::Result<DocuSignCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let names = [
            &self.integration_key_env,
            &self.user_id_env,
            &self.account_id_env,
            &self.private_key_env,
        ];

        let mut values = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match lookup(name).filter(|value| !value.trim().is_empty()) {
                Some(value) => values.push(value),
                None => missing.push(name.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(anyhow::anyhow!(
                "Missing required environment variables: {}. \
                 Set them in the environment or in a .env file.",
                missing.join(", ")
            ));
        }

        let private_key = normalize_private_key(&values[3]);
        validate_private_key(&private_key)?;

        Ok(DocuSignCredentials {
            integration_key: values[0].clone(),
            user_id: values[1].clone(),
            account_id: values[2].clone(),
            private_key,
        })
    }

    /// Host part of the OAuth base URL, used as the JWT `aud` claim.
    pub fn oauth_audience(&self) -> anyhow::Result<String> {
        let url = Url::parse(&self.oauth_base_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("OAuth base URL '{}' has no host", self.oauth_base_url))?;
        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates URLs and limits in the configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - A field is out of range or unparseable
    pub fn validate(&self) -> anyhow::Result<()> {
        for (field, value) in [
            ("docusign.base_path", &self.docusign.base_path),
            ("docusign.oauth_base_url", &self.docusign.oauth_base_url),
            ("docusign.signing_return_url", &self.docusign.signing_return_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| anyhow::anyhow!("Configuration error: {} '{}' is not a valid URL: {}", field, value, e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                anyhow::bail!("Configuration error: {} must use http or https (got '{}')", field, value);
            }
        }

        if self.docusign.token_lifetime_secs == 0 {
            anyhow::bail!("Configuration error: docusign.token_lifetime_secs must be greater than 0");
        }
        if self.docusign.request_timeout_secs == 0 {
            anyhow::bail!("Configuration error: docusign.request_timeout_secs must be greater than 0");
        }
        if self.docusign.scope.trim().is_empty() {
            anyhow::bail!("Configuration error: docusign.scope must not be empty");
        }
        if self.api.max_upload_bytes == 0 {
            anyhow::bail!("Configuration error: api.max_upload_bytes must be greater than 0");
        }
        if self.api.cors_origins.is_empty() {
            anyhow::bail!("Configuration error: api.cors_origins must list at least one origin (use \"*\" for any)");
        }

        Ok(())
    }

    /// Loads configuration from the TOML file and environment overrides.
    ///
    /// This function:
    /// 1. Reads the file named by `DOCUSIGN_GATEWAY_CONFIG_PATH` (or `config/docusign_gateway.toml`)
    /// 2. Falls back to built-in defaults when the file does not exist
    /// 3. Applies the `DOCUSIGN_BASE_PATH` and `PORT` overrides
    /// 4. Validates the result
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - The file is unreadable or invalid, or an override is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", config_path, e))?
        } else {
            tracing::info!("No configuration file at '{}', using defaults", config_path);
            Config::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `DOCUSIGN_BASE_PATH` and `PORT` overrides through the given lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_path) = lookup(BASE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.docusign.base_path = base_path;
        }
        if let Some(port) = lookup(PORT_ENV).filter(|v| !v.is_empty()) {
            self.api.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {} value '{}': {}", PORT_ENV, port, e))?;
        }
        Ok(())
    }
}
