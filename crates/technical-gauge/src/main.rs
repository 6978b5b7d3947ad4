mod config;
mod render;
mod source;

use analysis_core::{AnalysisResult, SignalStrength};
use analysis_orchestrator::{AnalysisOrchestrator, CycleOutcome, OrchestratorEvent, Trigger};
use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast::error::RecvError, watch};

use config::{search_tickers, AnalyzeArgs, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "technical_gauge=info,analysis_orchestrator=info,polygon_client=warn".into()
        })
    };

    // stdout is reserved for reports
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => analyze(args).await,
        Command::Watch { analysis, refresh_secs } => watch_symbol(analysis, refresh_secs).await,
        Command::Tickers { query } => {
            for ticker in search_tickers(query.as_deref().unwrap_or("")) {
                println!("{}", ticker);
            }
            Ok(())
        }
    }
}

fn build_orchestrator(args: &AnalyzeArgs) -> Result<Arc<AnalysisOrchestrator>> {
    let thresholds = args.thresholds()?;
    let source = args.bar_source()?;

    // The CLI never edits the selection, so the senders can go.
    let (_, params) = watch::channel(args.request_params());
    let (_, thresholds) = watch::channel(thresholds);

    Ok(AnalysisOrchestrator::new(source, params, thresholds))
}

fn print_result(result: &AnalysisResult, signal: SignalStrength, args: &AnalyzeArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&render::json_report(result, signal))?);
    } else {
        println!("{}", render::render_report(result, signal, args.use_color()));
        println!("{}\n", render::log_entry(result, chrono::Local::now().time()));
    }
    Ok(())
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let orchestrator = build_orchestrator(&args)?;

    match orchestrator.run_cycle(Trigger::Manual).await? {
        CycleOutcome::Published(result) => print_result(&result, result.signal, &args),
        CycleOutcome::Idle => bail!("no symbol given"),
        CycleOutcome::Busy => bail!("an analysis is already running"),
    }
}

async fn watch_symbol(args: AnalyzeArgs, refresh_secs: u64) -> Result<()> {
    let orchestrator = build_orchestrator(&args)?;
    let mut events = orchestrator.subscribe();
    let refresh = orchestrator.start_auto_refresh(Duration::from_secs(refresh_secs));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Ctrl-C received, stopping");
                break;
            }
            event = events.recv() => match event {
                Ok(OrchestratorEvent::Published { result, .. }) => {
                    let signal = orchestrator.current_signal().unwrap_or(result.signal);
                    print_result(&result, signal, &args)?;
                }
                Ok(OrchestratorEvent::Failed { symbol, error, .. }) => {
                    eprintln!(
                        "[{}] {} Analysis failed: {}",
                        chrono::Local::now().format("%H:%M:%S"),
                        symbol,
                        error
                    );
                }
                Ok(OrchestratorEvent::Busy { .. }) => {
                    tracing::debug!("refresh skipped, previous fetch still running");
                }
                Ok(OrchestratorEvent::Countdown { remaining_secs }) => {
                    tracing::trace!(remaining_secs, "next refresh");
                }
                Ok(OrchestratorEvent::Started { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    refresh.stop();
    Ok(())
}
