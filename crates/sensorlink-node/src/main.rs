use anyhow::{Context, Result};
use clap::Parser;
use sensorlink_hardware::mock::MockBoard;
use sensorlink_network::{
    DispatchExit, MqttSession, RetryPolicy, TransportError, run_dispatch, run_heartbeat,
};
use sensorlink_node::{Args, NodeConfig, Poller, RESTART_EXIT_CODE, simulation};
use sensorlink_protocol::ProtocolHandler;
use sensorlink_registry::Registry;
use sensorlink_storage::{BrokerSettings, FsBlobStore, TopicList};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn setup_tracing(level: Option<&str>) {
    let filter = level
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => info!("SIGTERM received"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Cancel `token` on Ctrl-C or SIGTERM.
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                info!("shutdown requested");
                token.cancel();
            }
            Err(e) => error!(error = %e, "signal handling unavailable"),
        }
    });
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    setup_tracing(args.log_level.as_deref());
    info!(version = sensorlink_core::VERSION, "sensorlink node starting");

    let store = FsBlobStore::open(&args.storage_dir)
        .await
        .context("Failed to open configuration storage")?;
    let saved = BrokerSettings::load(&store).await.unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable broker settings");
        None
    });
    let config = NodeConfig::resolve(&args, saved.as_ref()).context("Invalid configuration")?;
    if args.save_broker {
        config.broker_settings().save(&store).await?;
    }
    info!(
        device = %config.device_id,
        broker = %config.broker_host,
        port = config.broker_port,
        simulate = config.simulate,
        "configuration resolved"
    );

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    // Without real chip drivers the node runs on the in-memory board; the
    // simulated one also answers every bus address and moves over time.
    let board = if config.simulate {
        MockBoard::simulated()
    } else {
        MockBoard::new()
    };
    let mut registry = Registry::new(board.shared(), store.clone());
    if let Err(e) = registry.load_all().await {
        warn!(error = %e, "starting without stored peripherals");
    }
    let registry = registry.into_shared();

    let topics = match TopicList::load_or_default(&store, &config.device_id).await {
        Ok(topics) => topics,
        Err(e) => {
            warn!(error = %e, "topic list unusable, using defaults");
            TopicList::defaults_for(&config.device_id)
        }
    };

    let session = match MqttSession::connect(
        &config.mqtt_settings(),
        topics.iter().map(str::to_string).collect(),
        config.reconnect_policy(),
        cancel.clone(),
    )
    .await
    {
        Ok(session) => session,
        Err(TransportError::Closed) => {
            info!("shutdown requested before the broker answered");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            error!(error = %e, "broker unreachable, requesting restart");
            return Ok(ExitCode::from(RESTART_EXIT_CODE));
        }
    };
    let MqttSession {
        transport,
        mut inbound,
        task: event_task,
    } = session;

    let mut tasks = vec![
        tokio::spawn(run_heartbeat(
            transport.clone(),
            config.device_id.clone(),
            config.heartbeat_identity(),
            config.heartbeat_interval,
            cancel.clone(),
        )),
        tokio::spawn(
            Poller::new(
                registry.clone(),
                transport.clone(),
                config.device_id.clone(),
                config.telemetry_interval,
                config.keypad_tick,
            )
            .run(cancel.clone()),
        ),
    ];
    if config.simulate {
        tasks.push(tokio::spawn(simulation::animate(
            board.clone(),
            simulation::ANIMATION_STEP,
            cancel.clone(),
        )));
    }

    let handler = ProtocolHandler::new(config.device_id.clone(), registry);
    let exit = run_dispatch(
        &handler,
        &transport,
        &mut inbound,
        RetryPolicy::default(),
        &cancel,
    )
    .await;

    cancel.cancel();
    if let Err(e) = transport.disconnect() {
        warn!(error = %e, "disconnect failed");
    }
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "task ended abnormally");
        }
    }
    if let Err(e) = event_task.await {
        warn!(error = %e, "event task ended abnormally");
    }

    match exit {
        DispatchExit::Cancelled => {
            info!("sensorlink node stopped");
            Ok(ExitCode::SUCCESS)
        }
        DispatchExit::Restart | DispatchExit::Disconnected => {
            info!(?exit, "restarting");
            Ok(ExitCode::from(RESTART_EXIT_CODE))
        }
    }
}
