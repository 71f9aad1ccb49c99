// Entrypoint for the CLI application.
// - Keeps `main` small: resolve configuration, build the upload client and
//   either run a single upload or hand the client to the interactive menu.
// - Returns `anyhow::Result` so any failure ends with a non-zero exit code.

use anyhow::Context;
use clap::{Parser, Subcommand};
use label_scanner_cli::{
    ui, ClientConfig, ImageReference, ResponseShape, UploadClient, UploadKind,
};
use std::path::PathBuf;
use std::time::Duration;

/// Send blood-test and barcode photos to the health analysis service
#[derive(Parser)]
#[command(name = "label-scanner", version)]
struct Args {
    /// TOML config file (defaults to <config dir>/label-scanner/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Analysis server base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Upload endpoint path
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Response shape served by this deployment (verdict or scored)
    #[arg(long, global = true)]
    shape: Option<ResponseShape>,

    /// Name sent along with uploads
    #[arg(long, global = true)]
    username: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a photo of a blood-test report
    BloodTest {
        /// Image path or file:// URI
        image: String,
    },
    /// Analyze a photo of a product barcode
    Scan {
        /// Image path or file:// URI
        image: String,
    },
    /// Run the interactive menu (default)
    Interactive,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config =
        ClientConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.base_url {
        config = config.with_base_url(url);
    }
    if let Some(endpoint) = args.endpoint {
        config = config.with_endpoint(endpoint);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(shape) = args.shape {
        config = config.with_response_shape(shape);
    }
    if args.username.is_some() {
        config = config.with_username(args.username);
    }
    tracing::debug!(?config, "resolved configuration");

    let api = UploadClient::new(config).context("Failed to create upload client")?;

    match args.command.unwrap_or(Command::Interactive) {
        Command::BloodTest { image } => {
            upload_once(&api, ImageReference::new(image, UploadKind::BloodTest), args.json)
        }
        Command::Scan { image } => {
            upload_once(&api, ImageReference::new(image, UploadKind::Barcode), args.json)
        }
        Command::Interactive => ui::main_menu(api, args.json),
    }
}

fn upload_once(api: &UploadClient, image: ImageReference, json: bool) -> anyhow::Result<()> {
    let result = ui::upload_with_spinner(api, &image)?;
    ui::print_result(&result, json)
}
