//! Quoting engine binary: loads the runtime configuration, wires a
//! `crossbeam_channel` from either a file-driven replay harness or live
//! UNIX-domain venue sockets into the single-threaded core event loop, and
//! ticks a demo `Model`.

mod cli;
mod dispatch;
mod live;
mod replay;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use quoter_core::events::{Event, TimerEvent};
use quoter_core::instrument::Instrument;
use quoter_core::testing::StaticSpreadModel;
use quoter_core::utils::logger::init_logger;
use quoter_core::{Config, Dispatcher, Strategy};
use tracing::{info, warn};

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;
    if let Some(exchange) = args.exchange {
        config.exchange = exchange;
    }
    if let Some(symbol) = args.symbol {
        config.symbol = symbol;
    }
    if let Some(account) = args.account {
        config.account = account;
    }
    config.enable_trading |= args.enable_trading;
    config.simulation |= args.simulation;
    config.validate().context("validating configuration")?;

    init_logger(&args.log_level, args.json_logs);
    info!(exchange = %config.exchange, symbol = %config.symbol, simulation = config.simulation, enable_trading = config.enable_trading, "starting quoter");

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        warn!("received shutdown signal, draining in-flight events");
        shutdown_handler.store(true, Ordering::Relaxed);
    })
    .context("installing Ctrl+C handler")?;

    let (tx, rx) = crossbeam_channel::unbounded::<Event>();

    let dispatcher: Box<dyn Dispatcher> = if config.simulation {
        replay::spawn(config.endpoints.clone(), tx.clone(), shutdown.clone());
        Box::new(dispatch::SimulationDispatcher)
    } else {
        let sinks = live::connect(&config.endpoints, tx.clone(), shutdown.clone())
            .context("connecting to venue sockets")?;
        let sink = sinks
            .into_iter()
            .next()
            .context("live mode requires at least one venue socket")?;
        Box::new(live::LiveDispatcher::new(sink))
    };

    spawn_timer(tx.clone(), shutdown.clone(), config.sample_freq_secs);

    let symbol_regex = config.symbol_regex().context("compiling symbol filter")?;
    let model = Box::new(StaticSpreadModel::new(1.0, 0.01, 1.0));
    let mut strategy = Strategy::new(
        model,
        dispatcher,
        config.account.clone(),
        config.sample_freq_secs as f64,
        config.enable_trading,
        None,
    );

    run_loop(&mut strategy, rx, &config, &symbol_regex, &shutdown)?;

    info!("quoter shut down cleanly");
    Ok(())
}

fn spawn_timer(
    tx: crossbeam_channel::Sender<Event>,
    shutdown: Arc<AtomicBool>,
    period_secs: u64,
) {
    std::thread::spawn(move || {
        let tick = std::time::Duration::from_secs(period_secs.max(1));
        while !shutdown.load(Ordering::Relaxed) {
            std::thread::sleep(tick);
            let now_secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64();
            if tx.send(Event::Timer(TimerEvent { now_secs })).is_err() {
                break;
            }
        }
    });
}

/// The single-threaded core loop: the sole consumer of `rx`, dynamically
/// registering instruments the first time a matching `ReferenceData` event
/// arrives for a symbol the configured regex accepts.
fn run_loop(
    strategy: &mut Strategy,
    rx: Receiver<Event>,
    config: &Config,
    symbol_regex: &regex::Regex,
    shutdown: &AtomicBool,
) -> Result<()> {
    while let Ok(event) = rx.recv() {
        if let Event::ReferenceData(e) = &event {
            if e.exchange == config.exchange
                && symbol_regex.is_match(&e.symbol)
                && strategy.registry().lookup(&e.exchange, &e.symbol).is_none()
            {
                let mut instrument = Instrument::new(e.exchange.clone(), e.symbol.clone());
                if !config.account.is_empty() {
                    instrument = instrument.with_account(config.account.clone());
                }
                let iid = strategy.register_instrument(instrument);
                info!(exchange = %e.exchange, symbol = %e.symbol, iid, "registered instrument");
            }
        }

        if let Err(err) = strategy.dispatch(event) {
            tracing::error!(error = %err, "fatal reconciliation error, shutting down");
            return Err(err.into());
        }

        if shutdown.load(Ordering::Relaxed) && rx.is_empty() {
            break;
        }
    }
    Ok(())
}
