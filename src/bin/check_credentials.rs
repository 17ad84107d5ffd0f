//! DocuSign Credential Check Utility
//!
//! This binary verifies that the configured credentials can obtain an access
//! token through the JWT-bearer grant, then lists the accounts the
//! impersonated user can reach.
//!
//! ## Usage
//!
//! ```bash
//! # Uses .env and config/docusign_gateway.toml like the gateway itself
//! cargo run --bin check_credentials
//!
//! # Custom redirect URI for the consent link
//! cargo run --bin check_credentials -- --redirect-uri https://example.com/callback
//! ```
//!
//! When DocuSign answers `consent_required`, the consent URL for the
//! integration key is printed. Open it as the impersonated user, then run the
//! check again.

use docusign_gateway::auth::JwtTokenProvider;
use docusign_gateway::config::Config;
use docusign_gateway::docusign::build_http_client;

fn preview(value: &str) -> String {
    if value.chars().count() > 20 {
        format!("{}...", value.chars().take(20).collect::<String>())
    } else {
        value.to_string()
    }
}

async fn run(redirect_uri: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let credentials = config.docusign.resolve_credentials()?;

    println!("Credentials:");
    println!("  Integration key: {}", preview(&credentials.integration_key));
    println!("  User id:         {}", preview(&credentials.user_id));
    println!("  Account id:      {}", preview(&credentials.account_id));
    println!("  Private key:     valid PEM");
    println!();

    let client = build_http_client(&config.docusign)?;
    let tokens = JwtTokenProvider::new(&config.docusign, &credentials, client)?;

    println!("Requesting access token from {} ...", config.docusign.oauth_base_url);
    let token = match tokens.request_token().await {
        Ok(token) => token,
        Err(e) if e.is_consent_required() => {
            let redirect_uri = redirect_uri.unwrap_or_else(|| config.docusign.signing_return_url.clone());
            println!("Consent is required for integration key {}.", tokens.integration_key());
            println!("Open this URL as the impersonated user to grant it:");
            println!("  {}", tokens.consent_url(&redirect_uri));
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    match token.expires_in {
        Some(secs) => println!("Access token obtained (expires in {}s)", secs),
        None => println!("Access token obtained"),
    }

    match tokens.user_info(&token.access_token).await {
        Ok(info) => {
            println!();
            println!("User: {} <{}>", info.name.as_deref().unwrap_or("-"), info.email.as_deref().unwrap_or("-"));
            for (i, account) in info.accounts.iter().enumerate() {
                let marker = if account.account_id == credentials.account_id { " (configured)" } else { "" };
                println!(
                    "  Account {}: {} ({}){}",
                    i + 1,
                    account.account_name.as_deref().unwrap_or("-"),
                    account.account_id,
                    marker
                );
                if let Some(base_uri) = &account.base_uri {
                    println!("    Base URI: {}", base_uri);
                }
            }
            if !info.accounts.iter().any(|a| a.account_id == credentials.account_id) {
                println!();
                println!("Warning: account {} is not listed for this user", credentials.account_id);
            }
        }
        // The token is still valid; user info is informational only
        Err(e) => println!("Could not retrieve user info: {}", e),
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let redirect_uri = args
        .iter()
        .position(|arg| arg == "--redirect-uri")
        .and_then(|i| args.get(i + 1).cloned());

    match run(redirect_uri).await {
        Ok(()) => println!("\nCredential check passed."),
        Err(e) => {
            eprintln!("\nCredential check failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
