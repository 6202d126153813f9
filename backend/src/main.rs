//! Fishcast - catch probability service
//!
//! Periodically combines weather readings with per-species preferences
//! and reports a catch probability, the best fishing windows and tips for
//! every configured species.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod external;
mod services;

use config::Config;
use services::{FishcastService, MqttPublisher, ReportSink};

#[derive(Parser)]
#[command(
    name = "fishcast",
    version,
    about = "Catch probability and best fishing windows per species"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Score all species now and then every loop interval
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
        /// Write JSON lines to stdout instead of publishing to MQTT
        #[arg(long)]
        stdout: bool,
    },
    /// Score every hour of tomorrow from the weather forecast
    Forecast,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env before logging so LOG_LEVEL and RUST_LOG apply
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::load()?;
    config.validate()?;

    tracing::info!("Starting Fishcast");
    tracing::info!("Environment: {}", config.environment);

    let interval = Duration::from_secs(config.loop_interval_secs);
    let mqtt = config.mqtt.clone();
    let service = FishcastService::new(config)?;

    let command = cli.command.unwrap_or(Command::Run {
        once: false,
        stdout: false,
    });
    match command {
        Command::Run { once, stdout } => {
            let sink = if stdout {
                ReportSink::Stdout
            } else {
                tracing::info!(broker = %mqtt.broker, port = mqtt.port, "Publishing to MQTT");
                ReportSink::Mqtt(MqttPublisher::connect(&mqtt))
            };
            if once {
                run_once(&service, &sink).await?;
            } else {
                run_loop(&service, &sink, interval).await;
            }
            sink.close().await;
        }
        Command::Forecast => {
            let now = chrono::Local::now().fixed_offset();
            let results = service.run_forecast(now).await?;
            services::write_reports(&results, std::io::stdout().lock())?;
        }
    }

    Ok(())
}

/// Logging goes to stderr; stdout carries the reports in `--stdout` mode.
/// `LOG_LEVEL=off|none|disable` installs no subscriber at all.
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .to_lowercase();
    if matches!(level.as_str(), "off" | "none" | "disable") {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("fishcast={level},shared={level}").into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_once(service: &FishcastService, sink: &ReportSink) -> anyhow::Result<()> {
    let now = chrono::Local::now().fixed_offset();
    let results = service.run_cycle(now).await?;
    sink.deliver(&results)?;
    Ok(())
}

/// Run cycles until Ctrl-C or SIGTERM. A failed cycle is logged and the
/// next one runs on schedule.
async fn run_loop(service: &FishcastService, sink: &ReportSink, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = run_once(service, sink).await {
                    tracing::error!("Cycle failed: {:#}", e);
                }
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
