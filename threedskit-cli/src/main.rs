//! Developer CLI for threedskit.
//!
//! Runs a full 3DS2 authentication against sandbox (or dev) endpoints with
//! the simulated device engine standing in for a platform SDK.

use std::{collections::HashMap, sync::Arc};

use clap::{Parser, Subcommand};
use eyre::{eyre, WrapErr};
use threedskit_core::{DeviceEngine, Region, ThreeDsConfig, ThreeDsService};

mod engine;

use engine::SimulatedDeviceEngine;

#[derive(Parser)]
#[command(name = "threedskit", about = "Developer CLI for the threedskit 3DS SDK")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs a sandbox authentication end-to-end with the simulated device
    /// engine and prints the terminal outcome as JSON.
    Authenticate {
        /// Merchant API key.
        #[arg(long, env = "BT_API_KEY")]
        api_key: String,

        /// Tokenized card to authenticate.
        #[arg(long)]
        token_id: String,

        /// Merchant backend endpoint producing authentication decisions.
        #[arg(long)]
        authentication_endpoint: String,

        /// Extra `name: value` header for the authentication endpoint.
        /// Repeatable.
        #[arg(long = "header")]
        headers: Vec<String>,

        /// Provider region of the merchant account.
        #[arg(long, default_value = "eu")]
        region: Region,

        /// Use the provider's live credentials instead of the test ones.
        #[arg(long)]
        live: bool,

        /// Challenge event the simulated engine resolves with: a
        /// transaction-status letter (Y, A, N, U, R), `cancel` or `timeout`.
        #[arg(long, default_value = "Y")]
        challenge_event: String,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Authenticate {
            api_key,
            token_id,
            authentication_endpoint,
            headers,
            region,
            live,
            challenge_event,
        } => {
            authenticate(
                api_key,
                token_id,
                authentication_endpoint,
                headers,
                region,
                live,
                challenge_event,
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn authenticate(
    api_key: String,
    token_id: String,
    authentication_endpoint: String,
    headers: Vec<String>,
    region: Region,
    live: bool,
    challenge_event: String,
) -> eyre::Result<()> {
    let engine = Arc::new(SimulatedDeviceEngine::new(challenge_event));

    let config = ThreeDsConfig {
        api_key,
        authentication_endpoint,
        authentication_headers: parse_headers(&headers)?,
        region,
        locale: None,
        sandbox: !live,
        api_base_url: None,
    };
    let service = ThreeDsService::new(config, engine as Arc<dyn DeviceEngine>)
        .wrap_err("invalid configuration")?;

    let warnings = service
        .initialize()
        .await
        .wrap_err("initialization failed")?;
    for warning in &warnings {
        log::warn!("device warning {}: {}", warning.id, warning.message);
    }

    let session = service
        .create_session(token_id)
        .await
        .wrap_err("session creation failed")?;
    log::info!(
        "session {} created for {} card (3DS {})",
        session.id,
        session.card_brand,
        session.recommended_version
    );

    let outcome = service
        .start_challenge(session.id)
        .await
        .wrap_err("authentication failed")?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Parses repeated `name: value` header arguments.
fn parse_headers(headers: &[String]) -> eyre::Result<HashMap<String, String>> {
    headers
        .iter()
        .map(|header| {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| eyre!("malformed header {header:?}, expected `name: value`"))?;
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        })
        .collect()
}
