//! DocuSign Gateway Service
//!
//! An HTTP service that accepts an HTML document and signer details, adds a
//! signature section to the document and sends it to DocuSign for signature.
//! It also exposes endpoints to query and manage envelopes (status, documents,
//! recipients, custom fields, expiration, embedded signing, void and resend).
//!
//! ## Credentials
//!
//! The integration key, impersonated user id, account id and RSA private key
//! are read from the environment (or a `.env` file) once at startup. Missing
//! or malformed credentials stop the service before it binds its port.

use anyhow::Result;
use tracing::info;

use docusign_gateway::api::ApiServer;
use docusign_gateway::config::{Config, CONFIG_PATH_ENV};
use docusign_gateway::DocuSignClient;

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point that initializes and runs the gateway.
///
/// This function:
/// 1. Loads `.env` and initializes logging
/// 2. Loads configuration from TOML file
/// 3. Resolves and validates the DocuSign credentials
/// 4. Builds the DocuSign client (parses the private key)
/// 5. Starts the API server
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; variables may come from the environment
    dotenvy::dotenv().ok();

    // Initialize structured logging for debugging and monitoring
    tracing_subscriber::fmt::init();

    info!("Starting DocuSign Gateway");

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for help flag
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("DocuSign Gateway");
        println!();
        println!("Usage: docusign-gateway [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <path>   Use custom config file path");
        println!("  --help, -h        Show this help message");
        println!();
        println!("Environment variables:");
        println!("  DOCUSIGN_GATEWAY_CONFIG_PATH   Path to config file (default: config/docusign_gateway.toml)");
        println!("  DOCUSIGN_INTEGRATION_KEY       Integration key (client id)");
        println!("  DOCUSIGN_USER_ID               Id of the user to impersonate");
        println!("  DOCUSIGN_ACCOUNT_ID            Account the envelopes belong to");
        println!("  DOCUSIGN_PRIVATE_KEY           RSA private key (PEM, \\n escapes allowed)");
        println!("  DOCUSIGN_BASE_PATH             eSignature REST base path override");
        println!("  PORT                           Listen port override");
        return Ok(());
    }

    // Check for custom config path
    let mut config_path = None;
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
            break;
        }
    }

    if let Some(path) = config_path {
        std::env::set_var(CONFIG_PATH_ENV, &path);
        info!("Using custom config: {}", path);
    }

    // Load configuration from config file (or DOCUSIGN_GATEWAY_CONFIG_PATH env var)
    let config = Config::load()?;
    info!("Configuration loaded successfully");

    let credentials = config.docusign.resolve_credentials()?;
    info!(
        "Credentials loaded for integration key {} (account {})",
        credentials.integration_key, credentials.account_id
    );

    let client = DocuSignClient::new(&config.docusign, &credentials)?;
    info!("DocuSign client initialized for {}", config.docusign.base_path);

    // Run the service (this blocks until shutdown)
    let api_server = ApiServer::new(config, client);
    api_server.run().await?;

    Ok(())
}
