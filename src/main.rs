use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use wallet_settlement_engine::engine::{EngineConfig, SettlementEngine};
use wallet_settlement_engine::workflows::Ledger;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: wallet-settlement-engine [events].csv [log_level:optional] > [balances].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        eprintln!("Environment overrides: WALLET_MINIMUM_WITHDRAWAL, WALLET_OPERATION_TIMEOUT_MS");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    let config = EngineConfig::default().with_env_overrides();
    let engine = SettlementEngine::new(Ledger::in_memory(), config);

    let timer = Instant::now();
    engine.run(path).await?;
    let duration = timer.elapsed();

    info!("Processed events in: {duration:?}");

    write_results_to_stdout(&engine)?;

    engine.shutdown().await;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{level}', defaulting to 'error'");
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the balance report, so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(engine: &SettlementEngine) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "wallet,owner,balance,ledger_total")?;

    for item in engine.snapshot()? {
        writeln!(
            output,
            "{},{},{},{}",
            item.wallet.id,
            item.wallet.owner,
            item.wallet.balance,
            item.ledger_total
        )?;
    }

    output.flush()?;

    Ok(())
}
