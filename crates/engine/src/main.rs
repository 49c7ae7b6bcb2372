use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use sentinel_engine::cli::{CheckScriptArgs, Commands, Opts, RunArgs};
use sentinel_engine::config::{self, EngineConfig};
use sentinel_engine::consumer::{self, ConsumerLoop};
use sentinel_engine::dispatch::{
    self, migrator, AlertStore, CommandSink, Dispatcher, LoggingSink, NatsAlertSink,
    PgAlertStore, PgCommandStore, PgSignalStore, SignalSink,
};
use sentinel_engine::event::Gateways;
use sentinel_engine::gateway::{seed, InMemoryDeviceStore, InMemoryRuleStore};
use sentinel_engine::metrics::EngineMetrics;
use sentinel_engine::script::{ScriptLimits, WasmScriptEvaluator, ENTRY_FN};
use sentinel_engine::shutdown::{self, wait_for_shutdown};
use sentinel_engine::tracker::Tracker;
use sentinel_engine::api::{self, ApiState};
use sentinel_engine::SentinelEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    match Opts::parse().command() {
        Commands::Run(args) => run(args).await,
        Commands::CheckScript(args) => check_script(args),
    }
}

fn load_config(args: &RunArgs) -> Result<EngineConfig> {
    let cfg = match &args.config {
        Some(path) => config::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config::apply_env(cfg)?)
}

async fn run(args: RunArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    let metrics = EngineMetrics::new();

    let rules = InMemoryRuleStore::new();
    let devices = InMemoryDeviceStore::new();
    if let Some(path) = &cfg.seed {
        seed::load_from_file(path)
            .with_context(|| format!("loading seed {}", path.display()))?
            .apply(&rules, &devices);
    }

    let scripts = WasmScriptEvaluator::new(cfg.script)?.with_metrics(metrics.clone());
    let gateways = Gateways {
        rules: Arc::new(rules),
        devices: Arc::new(devices),
        scripts: Arc::new(scripts),
    };

    tracing::info!(url = %cfg.nats.url, "connecting to NATS");
    let client = consumer::connect(&cfg.nats.url).await?;

    let signals: Arc<dyn SignalSink>;
    let commands: Arc<dyn CommandSink>;
    let mut alert_store: Option<Arc<dyn AlertStore>> = None;
    if let Some(url) = &cfg.database_url {
        let pool = dispatch::create_pool(url).await.context("connecting to database")?;
        let applied = migrator::run_migrations(&pool).await.context("running migrations")?;
        tracing::info!(applied = applied.len(), "database ready");
        signals = Arc::new(PgSignalStore::new(pool.clone()));
        if !cfg.signals_used {
            alert_store = Some(Arc::new(PgAlertStore::new(pool.clone())));
        }
        commands = Arc::new(PgCommandStore::new(pool));
    } else {
        tracing::warn!("no database configured, signals, alerts and commands are only logged");
        signals = Arc::new(LoggingSink);
        commands = Arc::new(LoggingSink);
    }
    let alerts = Arc::new(NatsAlertSink::new(client.clone(), cfg.nats.subjects.alerts.clone()));

    let (tx, rx) = dispatch::channel();
    let mut dispatcher = Dispatcher::new(signals, alerts, commands, metrics.clone());
    if let Some(store) = alert_store {
        dispatcher = dispatcher.with_alert_store(store);
    }
    let dispatcher_handle = tokio::spawn(dispatcher.run(rx));

    let tracker = Arc::new(Tracker::new(
        gateways.rules.clone(),
        gateways.devices.clone(),
        tx,
        metrics.clone(),
        Duration::from_secs(cfg.correlation.ttl_secs),
    ));
    let sweeper = tracker.spawn_sweeper(Duration::from_secs(cfg.correlation.sweep_interval_secs));
    let engine = SentinelEngine::new(gateways, tracker, metrics.clone());

    let listener = tokio::net::TcpListener::bind(&cfg.api_addr)
        .await
        .with_context(|| format!("binding {}", cfg.api_addr))?;
    tracing::info!(api_addr = %cfg.api_addr, "engine API server starting");
    let api_state = ApiState::new(metrics, Arc::clone(engine.tracker()));
    let mut api_handle = tokio::spawn(api::serve(listener, api_state));

    let subscriptions = consumer::subscribe_inbound(&client, &cfg.nats.subjects).await?;
    let mut consumer_handle = tokio::spawn(ConsumerLoop::new(subscriptions, engine).run());
    tracing::info!("engine running");

    let (api_finished, consumer_finished) = tokio::select! {
        _ = wait_for_shutdown() => (false, false),
        r = &mut api_handle => {
            match r {
                Ok(Ok(())) => tracing::warn!("API server stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "API server failed"),
                Err(e) => tracing::error!(error = %e, "API task failed"),
            }
            (true, false)
        }
        r = &mut consumer_handle => {
            if let Err(e) = r {
                tracing::error!(error = %e, "consumer task failed");
            }
            (false, true)
        }
    };

    // The dispatcher stops once every holder of the tracker is gone: the
    // consumer's engine, the API, the sweeper and in-flight evaluations.
    if !consumer_finished {
        shutdown::stop("consumer", consumer_handle).await;
    }
    if !api_finished {
        shutdown::stop("api", api_handle).await;
    }
    shutdown::stop("sweeper", sweeper).await;
    shutdown::drain(
        "dispatcher",
        dispatcher_handle,
        Duration::from_secs(cfg.shutdown_grace_secs),
    )
    .await;
    if let Err(e) = client.flush().await {
        tracing::warn!(error = %e, "NATS flush failed");
    }
    tracing::info!("engine stopped");
    Ok(())
}

fn check_script(args: CheckScriptArgs) -> Result<()> {
    let source = std::fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let evaluator = WasmScriptEvaluator::new(ScriptLimits::default())?;
    evaluator
        .check(&source)
        .with_context(|| format!("checking {}", args.path.display()))?;
    println!("{}: ok, exports {ENTRY_FN}", args.path.display());
    Ok(())
}
