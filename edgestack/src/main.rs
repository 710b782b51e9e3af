//! EdgeStack - CloudFront Lambda@Edge local emulator
//!
//! Serves a Lambda@Edge origin-request handler over plain HTTP so it can be
//! exercised locally without deployment. The built-in handler echoes the
//! origin-request event back as JSON.

mod config;

use clap::Parser;
use edgestack_cloudfront::{EdgeHandler, EdgeHeaders, EdgeResponse, EdgeService, HeaderEntry};
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;

/// Ports tried in sequence when the requested one is already bound.
const MAX_BIND_ATTEMPTS: u16 = 10;

#[derive(Parser, Debug)]
#[command(name = "edgestack")]
#[command(about = "CloudFront Lambda@Edge local emulator", long_about = None)]
struct Args {
    /// HTTP server port number
    #[arg(short, long, env = "EDGESTACK_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "EDGESTACK_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "EDGESTACK_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "edgestack={0},edgestack_cloudfront={0}",
                    args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "failed to load configuration, using defaults");
        Config::default()
    });

    let port = args.port.unwrap_or(config.server.port);
    let host = args.host.unwrap_or(config.server.host);

    let (service, mut error_events) = EdgeService::new(echo_handler())?;

    // Surface server-level handler failures in the process log.
    tokio::spawn(async move {
        while let Some(err) = error_events.recv().await {
            error!(error = %err, "handler failure");
        }
    });

    let listener = bind_with_retry(&host, port).await?;
    let bound = listener.local_addr()?.port();

    info!("HTTP server started. Listening on port {bound}");

    service.serve(listener).await?;

    Ok(())
}

/// Bind the requested port, moving to the next one when it is taken.
async fn bind_with_retry(host: &str, port: u16) -> std::io::Result<TcpListener> {
    let mut candidate = port;

    for _ in 0..MAX_BIND_ATTEMPTS {
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(err) if err.kind() == ErrorKind::AddrInUse => {
                warn!(port = candidate, "port already in use, trying the next one");
                candidate = candidate.checked_add(1).ok_or(err)?;
            }
            Err(err) => return Err(err),
        }
    }

    Err(ErrorKind::AddrInUse.into())
}

/// Built-in handler: echoes the origin-request event back as JSON, making
/// the emulator usable as a smoke-test endpoint without external code.
fn echo_handler() -> EdgeHandler {
    EdgeHandler::future(|event| async move {
        let body = serde_json::to_string_pretty(&event)?;

        let mut headers = EdgeHeaders::new();
        headers.insert(
            "content-type".to_string(),
            vec![HeaderEntry::new("Content-Type", "application/json")],
        );

        Ok(EdgeResponse {
            status: Some("200".to_string()),
            headers: Some(headers),
            body: Some(body),
            ..EdgeResponse::default()
        })
    })
}
