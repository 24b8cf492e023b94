use std::env;
use std::io::{self, IsTerminal, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use otech::api::{self, AppState};
use otech::config::{AppConfig, GEMINI_API_KEY_ENV, default_config_file};
use otech::gemini::GeminiClient;

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn async_serve(config: AppConfig, cmd: ServeCommand) -> Result<()> {
    handle_serve(config, cmd).await
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.common);

    let config = AppConfig::load(cli.common.config.as_deref())?;
    debug!(server = ?config.server, attachments = ?config.attachments, "loaded configuration");

    match cli.command {
        Command::Serve(cmd) => async_serve(config, cmd),
        Command::Config { command } => handle_config(&cli.common, &config, command),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Otech AI Assistant - chat server with CSV-aware prompts.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true, env = "OTECH_CONFIG")]
    config: Option<PathBuf>,
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Disable ANSI colors in output
    #[arg(long = "no-color", global = true)]
    no_color: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve(ServeCommand),
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Args)]
struct ServeCommand {
    /// Host address to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Output the effective configuration
    Show,
    /// Print the resolved config file path
    Path,
}

fn init_logging(common: &CommonOpts) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = if common.quiet {
        "error"
    } else {
        match common.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("otech={level},tower_http={level}")));

    if common.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .ok();
    } else {
        let disable_color = common.no_color
            || env::var_os("NO_COLOR").is_some()
            || !io::stderr().is_terminal();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(!disable_color),
            )
            .try_init()
            .ok();
    }
}

async fn handle_serve(config: AppConfig, cmd: ServeCommand) -> Result<()> {
    info!("Starting Otech assistant server...");

    let gemini = GeminiClient::new(&config.gemini).context("building Gemini client")?;
    if !gemini.has_api_key() {
        warn!(
            "No Gemini API key configured (set {} or gemini.api_key); every chat request will fail",
            GEMINI_API_KEY_ENV
        );
    }
    info!(
        model = gemini.model(),
        row_policy = ?config.attachments.row_policy,
        "Generation backend ready"
    );

    let state = AppState::with_backend(Arc::new(gemini), config.attachments.row_policy);
    let app = api::create_router(state, config.server.max_body_mb);

    let host = cmd.host.unwrap_or(config.server.host);
    let port = cmd.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running server")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn handle_config(common: &CommonOpts, config: &AppConfig, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            print!("{}", config.to_redacted_toml()?);
        }
        ConfigCommand::Path => {
            let path = match &common.config {
                Some(path) => path.clone(),
                None => default_config_file()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
