//! `flakeid-server`: hands out Snowflake-style 64-bit IDs over TCP.
//!
//! Send the byte `0x50` and read back eight bytes, a big-endian `i64`. See
//! `flakeid-server --help` for the `serve`, `bench` and `probe` subcommands.

mod server;

use core::time::Duration;

use anyhow::Context;
use clap::Parser;
use server::config::{CliArgs, Command, GeneratorConfig, ServerConfig};
use server::service::{
    config::Generator,
    handler::{IdService, ServiceConfig},
};
use server::telemetry::init_telemetry;
use tokio::{net::TcpListener, signal};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_telemetry()?;

    match args.command {
        Command::Serve(args) => serve(ServerConfig::try_from(args)?).await,
        Command::Bench(args) => {
            let duration = Duration::from_millis(args.duration_ms);
            let config = GeneratorConfig::try_from(args.generator)?;
            bench(config, duration).await
        }
        Command::Probe(args) => {
            server::probe::run(&args.addr, args.count)
                .await
                .with_context(|| format!("probe of {} failed", args.addr))?;
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let generator = config.generator.build()?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    log_startup_info(&listener, &config);

    let service = IdService::new(
        generator,
        ServiceConfig {
            idle_timeout: config.idle_timeout,
        },
    );

    let accept = tokio::spawn({
        let service = service.clone();
        async move { service.serve(listener).await }
    });

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, terminating gracefully...");
    service.shutdown().await;
    accept.await??;

    tracing::info!("Service shut down successfully");
    Ok(())
}

async fn bench(config: GeneratorConfig, duration: Duration) -> anyhow::Result<()> {
    let machines = config.machine_ids.len();
    let generator: Generator = config.build()?;
    tracing::info!(?duration, machines, "Running benchmark");

    // Spins on a worker thread for the whole duration.
    let report = tokio::task::spawn_blocking(move || {
        server::bench::run(&generator, machines, duration)
    })
    .await??;

    println!("{report}");
    Ok(())
}

fn log_startup_info(listener: &TcpListener, config: &ServerConfig) {
    let addr = listener
        .local_addr()
        .map_or_else(|_| config.bind.clone(), |addr| addr.to_string());

    if cfg!(debug_assertions) {
        tracing::info!("Starting ID service on {} with full config: {:#?}", addr, config);
    } else {
        tracing::info!(
            "Starting ID service on {} with machine IDs {:?}",
            addr,
            config.generator.machine_ids
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
