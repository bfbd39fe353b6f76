//! N1NJ4 CLI - verification flow driver and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run the verification flow through the configured wallet endpoint
//! n1nj4 verify
//!
//! # Enter with a handed-over address (signature is NOT verified)
//! n1nj4 verify --handover-url "https://passport.n1nj4.io/?address=0x...&sig=0x..."
//!
//! # Look up the binding for an address
//! n1nj4 lookup 0xabc...123
//!
//! # Check NFT ownership only
//! n1nj4 check-nft 0xabc...123
//!
//! # Show the gating collection's on-chain name and symbol
//! n1nj4 contract-info
//!
//! # Apply PostgreSQL migrations
//! n1nj4 migrate
//! ```
//!
//! Configuration comes from the environment, see [`n1nj4_gate::config`].
//! Logs go to stderr; stdout carries the rendered flow and the passkey
//! hand-off JSON.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use n1nj4_gate::GateConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "n1nj4")]
#[command(author, version, about = "N1NJ4 NFT + passkey verification")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the verification flow
    Verify {
        /// Page URL carrying `address` and `sig` query parameters
        #[arg(long, conflicts_with_all = ["address", "sig"])]
        handover_url: Option<Url>,

        /// Handed-over address
        #[arg(long, requires = "sig")]
        address: Option<String>,

        /// Handed-over signature
        #[arg(long, requires = "address")]
        sig: Option<String>,

        /// Bind without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the binding stored for an address
    Lookup {
        /// Wallet address
        address: String,
    },
    /// Check whether an address holds the gating NFT
    CheckNft {
        /// Wallet address
        address: String,
    },
    /// Show the gating contract's name and symbol
    ContractInfo,
    /// Run database migrations
    Migrate,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &GateConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match GateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            render::fatal(&format!("Configuration error: {e}"));
            return ExitCode::from(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber).
    // Dropped on return so queued events are flushed.
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "n1nj4_gate=info,n1nj4_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &GateConfig) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Verify {
            handover_url,
            address,
            sig,
            yes,
        } => {
            let handover = commands::verify::handover_from_args(handover_url, address, sig)?;
            commands::verify::run(config, handover, yes).await?;
        }
        Commands::Lookup { address } => commands::inspect::lookup(config, &address).await?,
        Commands::CheckNft { address } => commands::inspect::check_nft(config, &address).await?,
        Commands::ContractInfo => commands::inspect::contract_info(config).await?,
        Commands::Migrate => commands::migrate::run(config).await?,
    }
    Ok(())
}
