//! EWS client binary.
//!
//! Run with: `ews-client --config config.yaml`
//!
//! Resolves the account's EWS endpoint through autodiscover (unless an
//! explicit URL is given), lists the searchable mailboxes, and prints one JSON
//! object per mailbox on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use ews_soap_client::{
    ClientConfig, ExchangeVersion, FailAction, GetSearchableMailboxes, Impersonation,
    NegotiationEngine, Operation, Session, SoapTransport,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Exchange Web Services client.
///
/// Command-line values override the configuration file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Account e-mail address
    #[arg(short, long, env = "EWS_EMAIL")]
    email: Option<String>,

    /// Account password
    #[arg(short, long, env = "EWS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Explicit EWS URL; skips autodiscover
    #[arg(long)]
    ews_url: Option<String>,

    /// Candidate Exchange version (repeatable, tried in order)
    #[arg(long = "exchange-version", value_parser = parse_version)]
    exchange_versions: Vec<ExchangeVersion>,

    /// Candidate autodiscover endpoint (repeatable, tried in order)
    #[arg(long = "endpoint")]
    endpoints: Vec<String>,

    /// SMTP address of a mailbox to impersonate
    #[arg(long)]
    impersonate: Option<String>,

    /// Only list mailboxes matching this filter
    #[arg(long)]
    search_filter: Option<String>,

    /// Exit with status 1 on the first failed request
    #[arg(long)]
    stop_on_error: bool,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn parse_version(value: &str) -> Result<ExchangeVersion, String> {
    value.parse().map_err(|e: ews_soap_client::EwsError| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for records
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting EWS client v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if args.config.exists() {
        info!("Config file: {}", args.config.display());
        ClientConfig::load(&args.config).context("Failed to load config file")?
    } else {
        info!("Config file not found, using defaults");
        ClientConfig::default()
    };
    apply_overrides(&mut config, &args);

    info!(
        email = %config.credentials.email_address,
        explicit_url = config.ews_url.is_some(),
        fail_action = ?config.settings.fail_action,
        "Configuration loaded"
    );

    let transport =
        SoapTransport::from_settings(&config.settings).context("Failed to create HTTP transport")?;
    let mut session = Session::from_config(&config).context("Invalid configuration")?;

    if !session.is_committed() {
        let negotiated = NegotiationEngine::new(&transport)
            .discover(&session)
            .context("Autodiscover failed")?;
        if let Some(ews_url) = negotiated.ews_url() {
            info!(ews_url = %ews_url, "Server reported EWS URL");
        }
        session = session.commit(&negotiated)?;
    }

    info!(
        endpoint = session.endpoint().unwrap_or_default(),
        version = ?session.version(),
        "Using endpoint"
    );

    let operation = GetSearchableMailboxes {
        search_filter: args.search_filter.clone(),
        ..Default::default()
    };
    let records = operation
        .run(&transport, &session, config.settings.fail_action)
        .context("GetSearchableMailboxes failed")?;

    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }

    info!(count = records.len(), "Done");
    Ok(())
}

fn apply_overrides(config: &mut ClientConfig, args: &Args) {
    if let Some(email) = &args.email {
        config.credentials.email_address = email.clone();
    }
    if let Some(password) = &args.password {
        config.credentials.password = password.clone();
    }
    if let Some(url) = &args.ews_url {
        config.ews_url = Some(url.clone());
    }
    if !args.exchange_versions.is_empty() {
        config.exchange_versions = args.exchange_versions.clone();
    }
    if !args.endpoints.is_empty() {
        config.autodiscover.endpoints = args.endpoints.clone();
    }
    if let Some(address) = &args.impersonate {
        config.impersonation = Some(Impersonation::SmtpAddress(address.clone()));
    }
    if args.stop_on_error {
        config.settings.fail_action = FailAction::Stop;
    }
    if let Some(timeout) = args.timeout_secs {
        config.settings.timeout_secs = timeout;
    }
}
