//! Command-line entry point for the pull request exporter.
//!
//! Domain settings (token, repositories, poll interval) come from the
//! environment; operational flags below can be given on the command line or
//! through their own environment variables.

use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use clap::Parser;
use gh_pr_exporter::{
    ApiUrlLocator, CyclePolicy, Error, Exporter, GithubApi, PullRequestMetrics, Scheduler,
    Settings, SourceClient, bind, serve,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command line interface of the exporter binary.
#[derive(Debug, Parser,)]
#[command(
    name = "gh-pr-exporter",
    version,
    about = "Export open GitHub pull requests as Prometheus gauges"
)]
struct Cli
{
    /// Socket address serving the `/metrics` endpoint.
    #[arg(
        long = "listen",
        env = "EXPORTER_LISTEN",
        value_name = "ADDR",
        default_value = "0.0.0.0:8080"
    )]
    listen: SocketAddr,

    /// Root of the GitHub REST API.
    #[arg(
        long = "api-base",
        env = "GITHUB_API_BASE",
        value_name = "URL",
        default_value = "https://api.github.com"
    )]
    api_base: String,

    /// Upper bound for every page request, in seconds.
    #[arg(
        long = "request-timeout",
        env = "GITHUB_REQUEST_TIMEOUT_SECONDS",
        value_name = "SECONDS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    request_timeout: u64,

    /// Whether a failed cycle terminates the process.
    #[arg(
        long = "on-cycle-error",
        env = "EXPORTER_ON_CYCLE_ERROR",
        value_enum,
        default_value_t = CyclePolicy::Exit
    )]
    on_cycle_error: CyclePolicy,
}

/// Entry point that reports fatal errors and sets the exit status.
#[tokio::main]
async fn main()
{
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),),
        )
        .init();

    let cli = Cli::parse();

    if let Err(error,) = run(cli,).await {
        error!("{}", error.to_display_string());
        process::exit(1,);
    }
}

/// Loads settings, starts the exposition server and drives the scheduler
/// until shutdown or a fatal cycle error.
///
/// # Errors
///
/// Propagates configuration, bind and fatal cycle errors.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let settings = Settings::from_env()?;
    info!(
        "Polling {} repositories every {:?}",
        settings.collections.len(),
        settings.poll_interval
    );

    let metrics = Arc::new(PullRequestMetrics::new()?,);
    let api = GithubApi::new(&settings.credential, &cli.api_base,)?;
    let exporter = Exporter::new(
        SourceClient::new(api, Duration::from_secs(cli.request_timeout,),),
        ApiUrlLocator,
        settings.collections,
        Arc::clone(&metrics,),
    );
    let scheduler = Scheduler::new(exporter, settings.poll_interval, cli.on_cycle_error,);

    let listener = bind(cli.listen,).await?;
    let (shutdown_tx, shutdown_rx,) = watch::channel(false,);
    let shutdown_tx = Arc::new(shutdown_tx,);

    let mut server_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(serve(listener, metrics, async move {
        let _ = server_shutdown.wait_for(|stop| *stop,).await;
    },),);

    let signals = {
        let shutdown_tx = Arc::clone(&shutdown_tx,);
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true,);
        },)
    };

    let outcome = scheduler.run(shutdown_rx,).await;
    let _ = shutdown_tx.send(true,);
    signals.abort();

    let served = match server.await {
        Ok(result,) => result,
        Err(join_error,) => {
            warn!("Metrics server task ended abnormally: {}", join_error);
            Ok((),)
        }
    };

    outcome?;
    served?;
    info!("Exporter stopped");
    Ok((),)
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal()
{
    let ctrl_c = async {
        if let Err(error,) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", error);
            std::future::pending::<(),>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate(),) {
            Ok(mut signal,) => {
                signal.recv().await;
            }
            Err(error,) => {
                warn!("Failed to install SIGTERM handler: {}", error);
                std::future::pending::<(),>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<(),>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
