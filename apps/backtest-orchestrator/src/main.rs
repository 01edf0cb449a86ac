//! Backtest Orchestrator Binary
//!
//! Starts the Quantbench backtest orchestrator.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin backtest-orchestrator
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORCHESTRATOR_WORKER_PROGRAM`: Worker executable launched once per job
//!
//! ## Optional
//! - `ORCHESTRATOR_WORKER_ARGS`: Arguments placed before the per-job arguments
//! - `ORCHESTRATOR_WORKER_DIR`: Working directory for workers
//! - `ORCHESTRATOR_WORKER_CAPACITY`: Concurrent jobs per task (default: 4)
//! - `ORCHESTRATOR_POLL_INTERVAL_SECS`: Scheduler poll interval (default: 5)
//! - `ORCHESTRATOR_TERMINATION_GRACE_SECS`: SIGTERM-to-SIGKILL grace (default: 3)
//! - `ORCHESTRATOR_HTTP_HOST`: HTTP bind host (default: 0.0.0.0)
//! - `ORCHESTRATOR_HTTP_PORT`: HTTP server port (default: 8080)
//! - `ORCHESTRATOR_UNIVERSE_FILE`: JSON file mapping index codes to symbols
//! - `RUST_LOG`: Log level (default: info)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use backtest_orchestrator::application::ports::LogSink;
use backtest_orchestrator::application::use_cases::{
    CancelTaskUseCase, GetTaskUseCase, RestartTaskUseCase, SubmitTaskUseCase,
};
use backtest_orchestrator::domain::shared::{IndexCode, Symbol};
use backtest_orchestrator::infrastructure::config::Settings;
use backtest_orchestrator::infrastructure::http::{AppState, create_router};
use backtest_orchestrator::infrastructure::logging::TracingLogSink;
use backtest_orchestrator::infrastructure::persistence::{
    InMemorySymbolResultRepository, InMemoryTaskRepository,
};
use backtest_orchestrator::infrastructure::universe::StaticUniverse;
use backtest_orchestrator::orchestrator::{PoolRegistry, ProcessRunner, TaskRunner, TaskScheduler};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Concrete type alias for the task runner over the in-memory adapters.
type ConcreteTaskRunner =
    TaskRunner<InMemoryTaskRepository, InMemorySymbolResultRepository, StaticUniverse>;

/// Concrete type alias for the task scheduler over the in-memory adapters.
type ConcreteTaskScheduler =
    TaskScheduler<InMemoryTaskRepository, InMemorySymbolResultRepository, StaticUniverse>;

/// Application use cases wired together for dependency injection.
struct UseCases {
    submit_task: Arc<SubmitTaskUseCase<InMemoryTaskRepository>>,
    cancel_task: Arc<CancelTaskUseCase<InMemoryTaskRepository>>,
    restart_task: Arc<RestartTaskUseCase<InMemoryTaskRepository>>,
    get_task: Arc<GetTaskUseCase<InMemoryTaskRepository, InMemorySymbolResultRepository>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    tracing::info!("Starting Quantbench Backtest Orchestrator");

    let settings = Settings::from_env().context("failed to load configuration")?;
    log_config(&settings);

    let tasks = Arc::new(InMemoryTaskRepository::new());
    let results = Arc::new(InMemorySymbolResultRepository::new());
    let universe = Arc::new(load_universe()?);
    let pools = PoolRegistry::new();

    let log_sink: Arc<dyn LogSink> = Arc::new(TracingLogSink::new());
    let process_runner = Arc::new(ProcessRunner::new(
        log_sink,
        settings.orchestrator.termination_grace,
    ));

    let runner = Arc::new(TaskRunner::new(
        Arc::clone(&tasks),
        Arc::clone(&results),
        universe,
        process_runner,
        pools.clone(),
        settings.orchestrator.clone(),
    ));

    let shutdown_token = CancellationToken::new();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let scheduler_handle = start_scheduler(
        Arc::clone(&tasks),
        runner,
        &settings,
        shutdown_token.clone(),
    );

    let use_cases = create_use_cases(&tasks, &results, pools);
    let http_handle = start_http_server(&settings, &use_cases, shutdown_tx.clone()).await?;

    tracing::info!("Backtest orchestrator ready");

    await_shutdown(http_handle, scheduler_handle, shutdown_token).await;

    tracing::info!("Backtest orchestrator stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Initialize the tracing subscriber with environment filter.
///
/// Uses a static directive string that is a compile-time constant guaranteed
/// to parse.
#[allow(clippy::expect_used)]
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "backtest_orchestrator=info"
                    .parse()
                    .expect("static directive 'backtest_orchestrator=info' is valid"),
            ),
        )
        .init();
}

/// Log the parsed configuration.
fn log_config(settings: &Settings) {
    tracing::info!(
        bind_addr = %settings.server.bind_addr(),
        worker_program = %settings.orchestrator.worker.program,
        worker_capacity = settings.orchestrator.worker_capacity,
        poll_interval_secs = settings.orchestrator.poll_interval.as_secs(),
        termination_grace_secs = settings.orchestrator.termination_grace.as_secs(),
        "Configuration loaded"
    );
}

/// Load the static index universe from `ORCHESTRATOR_UNIVERSE_FILE`.
///
/// The file maps index codes to constituent symbols:
/// `{"000300": ["SHSE.600000", "SHSE.600036"]}`. Without it, index tasks
/// fail resolution while explicit symbol-list tasks run normally.
fn load_universe() -> anyhow::Result<StaticUniverse> {
    let Some(path) = std::env::var_os("ORCHESTRATOR_UNIVERSE_FILE") else {
        tracing::info!("No universe file configured; index expansion is disabled");
        return Ok(StaticUniverse::new());
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read universe file {}", path.to_string_lossy()))?;
    let indices: HashMap<String, Vec<String>> =
        serde_json::from_str(&raw).context("universe file is not a JSON index-to-symbols map")?;

    let mut universe = StaticUniverse::new();
    for (index, symbols) in indices {
        universe = universe.with_index(
            IndexCode::new(index),
            symbols.into_iter().map(Symbol::new).collect(),
        );
    }

    tracing::info!(indices = universe.len(), "Universe file loaded");
    Ok(universe)
}

/// Create all application use cases with their dependencies.
fn create_use_cases(
    tasks: &Arc<InMemoryTaskRepository>,
    results: &Arc<InMemorySymbolResultRepository>,
    pools: PoolRegistry,
) -> UseCases {
    UseCases {
        submit_task: Arc::new(SubmitTaskUseCase::new(Arc::clone(tasks))),
        cancel_task: Arc::new(CancelTaskUseCase::new(Arc::clone(tasks), pools)),
        restart_task: Arc::new(RestartTaskUseCase::new(Arc::clone(tasks))),
        get_task: Arc::new(GetTaskUseCase::new(Arc::clone(tasks), Arc::clone(results))),
    }
}

/// Start the polling scheduler on its own task.
fn start_scheduler(
    tasks: Arc<InMemoryTaskRepository>,
    runner: Arc<ConcreteTaskRunner>,
    settings: &Settings,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let scheduler: ConcreteTaskScheduler =
        TaskScheduler::new(tasks, runner, settings.orchestrator.poll_interval, shutdown);

    tokio::spawn(async move {
        scheduler.run().await;
    })
}

/// Start the HTTP server with graceful shutdown support.
async fn start_http_server(
    settings: &Settings,
    use_cases: &UseCases,
    shutdown_tx: broadcast::Sender<()>,
) -> anyhow::Result<JoinHandle<()>> {
    let http_state = AppState {
        submit_task: Arc::clone(&use_cases.submit_task),
        cancel_task: Arc::clone(&use_cases.cancel_task),
        restart_task: Arc::clone(&use_cases.restart_task),
        get_task: Arc::clone(&use_cases.get_task),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let app = create_router(http_state);

    let http_addr: SocketAddr = settings
        .server
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", settings.server.bind_addr()))?;

    tracing::info!(%http_addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  POST /api/v1/tasks");
    tracing::info!("  GET  /api/v1/tasks/{{task_id}}");
    tracing::info!("  POST /api/v1/tasks/{{task_id}}/cancel");
    tracing::info!("  POST /api/v1/tasks/{{task_id}}/restart");

    let listener = TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;
    let http_server =
        axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown_tx));

    let handle = tokio::spawn(async move {
        if let Err(e) = http_server.await {
            tracing::error!("HTTP server error: {e}");
        }
    });

    Ok(handle)
}

/// Wait for the HTTP server to stop, then wind down background services.
async fn await_shutdown(
    http_handle: JoinHandle<()>,
    scheduler_handle: JoinHandle<()>,
    shutdown_token: CancellationToken,
) {
    let _ = http_handle.await;
    tracing::info!("HTTP server stopped");

    // Stop the polling loop; in-flight runners keep their own cancellation.
    shutdown_token.cancel();

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler_handle)
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Scheduler did not stop within the shutdown timeout"
        );
    } else {
        tracing::info!("Scheduler stopped");
    }
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is intentional because:
/// - Signal handlers are critical for graceful shutdown
/// - Failure to install handlers means the process cannot respond to termination signals
/// - It is better to fail fast during startup than to have an unresponsive process
#[allow(clippy::expect_used)]
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    let _ = shutdown_tx.send(());

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
