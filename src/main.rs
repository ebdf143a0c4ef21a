//! CLI entry point: issues one API call through the logging pipeline.

use accountright_client::{BasicClient, PipelineConfig, RequestDescriptor, RequestHandler};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reqwest::Method;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "accountright_client")]
#[command(about = "Issue AccountRight API calls with full call telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a single call and log the decoded JSON response
    Call {
        /// Absolute URI to call
        #[arg(value_name = "URI")]
        uri: String,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request body (JSON text)
        #[arg(short, long)]
        body: Option<String>,

        /// Ask the server for a gzip-compressed response
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Extra request header as NAME:VALUE (repeatable)
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        headers: Vec<String>,

        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/accountright_client.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("accountright_client.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Call {
            uri,
            method,
            body,
            gzip,
            headers,
            timeout_secs,
        } => {
            let request = build_request(&uri, &method, body, gzip, &headers)?;
            call(request, timeout_secs).await?;
        }
    }

    Ok(())
}

fn build_request(
    uri: &str,
    method: &str,
    body: Option<String>,
    gzip: bool,
    headers: &[String],
) -> Result<RequestDescriptor> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{method}'"))?;

    let mut request = RequestDescriptor::new(method, uri)?;
    if let Some(body) = body {
        request = request
            .with_body(body)
            .with_header("content-type", "application/json")?;
    }
    if gzip {
        request = request.accept_gzip();
    }
    for header in headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header '{header}' is not NAME:VALUE");
        };
        request = request.with_header(name.trim(), value.trim())?;
    }
    Ok(request)
}

#[tracing::instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
async fn call(request: RequestDescriptor, timeout_secs: Option<u64>) -> Result<()> {
    let config = PipelineConfig::from_env()?;
    let handler = RequestHandler::from_config(BasicClient::new()?, &config).await;

    let cancel = CancellationToken::new();
    if let Some(secs) = timeout_secs {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            cancel.cancel();
        });
    }

    let envelope = handler
        .try_get_response::<serde_json::Value>(&request, &cancel)
        .await?;

    info!(
        status = ?envelope.status,
        location = envelope.location.as_deref(),
        "Call completed"
    );
    if let Some(entity) = envelope.entity {
        info!("{}", serde_json::to_string_pretty(&entity)?);
    }

    Ok(())
}
