//! Onramp CLI
//!
//! Command-line interface for exercising the Onramp onboarding backend.
//!
//! # Usage
//!
//! ```bash
//! # Verify an email address (prompts for the emailed code)
//! onramp request-code user@example.com
//! onramp verify-code user@example.com
//!
//! # Connect a platform with tokens from its OAuth SDK
//! onramp connect google --access-token ya29...
//!
//! # Forget the stored credential
//! onramp sign-out
//! ```

mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use onramp_client::{OnrampClient, OnrampError, PlatformTokens};
use onramp_core::{PlatformId, Secret};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onramp")]
#[command(about = "Email verification and platform onboarding against the Onramp backend")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep the credential in memory instead of the OS keyring
    #[arg(long, global = true)]
    memory_store: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check backend health
    Health,

    /// Email a verification code
    RequestCode {
        /// Email address to verify
        email: String,
    },

    /// Verify an emailed code and store the issued credential
    VerifyCode {
        /// Email address being verified
        email: String,

        /// The emailed code (prompted for when omitted)
        code: Option<String>,
    },

    /// Show whether an email address is verified
    EmailStatus {
        /// Email address to look up
        email: String,
    },

    /// Get the OAuth authorization URL for a platform
    AuthUrl {
        /// Platform name (e.g., google, spotify)
        platform: String,

        /// Where the platform should redirect after consent
        #[arg(short, long)]
        redirect_uri: String,
    },

    /// Connect a platform using tokens from its OAuth flow
    Connect {
        /// Platform name
        platform: String,

        #[arg(long)]
        access_token: String,

        #[arg(long)]
        refresh_token: Option<String>,

        #[arg(long)]
        id_token: Option<String>,
    },

    /// Revoke a platform connection
    Revoke {
        /// Platform name
        platform: String,
    },

    /// Submit the user's PIN
    SubmitPin {
        pin: String,
    },

    /// Refresh a platform access token
    Refresh {
        /// Platform name
        platform: String,

        #[arg(long)]
        refresh_token: String,
    },

    /// Forget the stored credential
    SignOut,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let client = session::build_client(cli.config.as_deref(), cli.memory_store)?;
    debug!(base_url = %client.base_url(), "Client ready");

    match cli.command {
        Commands::Health => health(&client).await,
        Commands::RequestCode { email } => request_code(&client, &email).await,
        Commands::VerifyCode { email, code } => verify_code(&client, &email, code).await,
        Commands::EmailStatus { email } => email_status(&client, &email).await,
        Commands::AuthUrl {
            platform,
            redirect_uri,
        } => auth_url(&client, &platform, &redirect_uri).await,
        Commands::Connect {
            platform,
            access_token,
            refresh_token,
            id_token,
        } => {
            let mut tokens = PlatformTokens::new(access_token);
            if let Some(token) = refresh_token {
                tokens = tokens.with_refresh_token(token);
            }
            if let Some(token) = id_token {
                tokens = tokens.with_id_token(token);
            }
            connect(&client, &platform, &tokens).await
        }
        Commands::Revoke { platform } => revoke(&client, &platform).await,
        Commands::SubmitPin { pin } => submit_pin(&client, Secret::new(pin)).await,
        Commands::Refresh {
            platform,
            refresh_token,
        } => refresh(&client, &platform, Secret::new(refresh_token)).await,
        Commands::SignOut => sign_out(&client).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn health(client: &OnrampClient) -> Result<()> {
    let health = client.health().check().await.context("health check failed")?;
    println!(
        "Backend: {} (version {})",
        health.status.as_deref().unwrap_or("unknown"),
        health.version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

async fn request_code(client: &OnrampClient, email: &str) -> Result<()> {
    let response = client.email().request_code(email).await?;
    println!(
        "{}",
        response
            .message
            .as_deref()
            .unwrap_or("Verification code sent")
    );
    if let Some(seconds) = response.expires_in {
        println!("  Code expires in {} seconds", seconds);
    }
    Ok(())
}

async fn verify_code(client: &OnrampClient, email: &str, code: Option<String>) -> Result<()> {
    let code = match code {
        Some(code) => code,
        None => prompt_code(email).await?,
    };

    let session = client.email().verify_code(email, &code).await?;
    println!("Email verified");
    if let Some(user_id) = &session.user_id {
        println!("  User: {}{}", user_id, if session.is_new_user { " (new)" } else { "" });
    }
    if let Some(expires_at) = session.expires_at {
        println!("  Session expires: {}", expires_at.to_rfc3339());
    }
    Ok(())
}

async fn prompt_code(email: &str) -> Result<String> {
    eprint!("Code sent to {}: ", email);
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read code")?;

    let code = line.trim();
    if code.is_empty() {
        return Err(OnrampError::UserCancelled.into());
    }
    Ok(code.to_string())
}

async fn email_status(client: &OnrampClient, email: &str) -> Result<()> {
    let status = client.email().status(email).await?;
    match (status.verified, status.verified_at) {
        (true, Some(at)) => println!("{} verified at {}", email, at.to_rfc3339()),
        (true, None) => println!("{} verified", email),
        (false, _) => println!("{} not verified", email),
    }
    Ok(())
}

async fn auth_url(client: &OnrampClient, platform: &str, redirect_uri: &str) -> Result<()> {
    let response = client
        .platforms()
        .authorization_url(&PlatformId::new(platform), redirect_uri)
        .await?;
    println!("{}", response.authorization_url);
    Ok(())
}

async fn connect(client: &OnrampClient, platform: &str, tokens: &PlatformTokens) -> Result<()> {
    let platform = PlatformId::new(platform);
    let response = client.platforms().connect(&platform, tokens).await?;
    if response.connected {
        println!("Connected {}", platform);
    } else {
        println!(
            "{} not connected: {}",
            platform,
            response.message.as_deref().unwrap_or("no reason given")
        );
    }
    Ok(())
}

async fn revoke(client: &OnrampClient, platform: &str) -> Result<()> {
    let platform = PlatformId::new(platform);
    if client.platforms().revoke(&platform).await? {
        println!("Revoked {}", platform);
    } else {
        println!("Backend did not confirm revoking {}", platform);
    }
    Ok(())
}

async fn submit_pin(client: &OnrampClient, pin: Secret) -> Result<()> {
    let response = client.pin().submit(&pin).await?;
    match response.accepted {
        Some(false) => println!(
            "PIN rejected: {}",
            response.message.as_deref().unwrap_or("no reason given")
        ),
        _ => println!("PIN accepted"),
    }
    Ok(())
}

async fn refresh(client: &OnrampClient, platform: &str, refresh_token: Secret) -> Result<()> {
    let response = client
        .platforms()
        .refresh(&PlatformId::new(platform), &refresh_token)
        .await?;
    println!("Access token: {}", response.access_token.expose());
    if let Some(expires_in) = response.expires_in {
        println!("  Expires in {} seconds", expires_in);
    }
    Ok(())
}

async fn sign_out(client: &OnrampClient) -> Result<()> {
    client.sign_out().await?;
    println!("Signed out");
    Ok(())
}
