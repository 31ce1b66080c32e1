//! Server bootstrap: builds the infrastructure, wires the state, starts the
//! maintenance scheduler, and serves the router until shutdown.

use std::sync::Arc;

use devhub_cache::CacheManager;
use devhub_core::config::AppConfig;
use devhub_core::error::AppError;
use devhub_core::traits::StorageProvider;
use devhub_database::Stores;
use devhub_storage::LocalStorageProvider;
use devhub_worker::CronScheduler;

use crate::router::build_router;
use crate::state::AppState;

/// Runs the DevHub server with the given configuration.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DevHub server...");

    // ── Step 1: Document store ───────────────────────────────────
    tracing::info!(
        "Initializing document store (provider: {})...",
        config.database.provider
    );
    let stores = Stores::from_config(&config.database).await?;

    // ── Step 2: Cache ────────────────────────────────────────────
    tracing::info!(
        "Initializing cache (provider: {})...",
        config.cache.provider
    );
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    // ── Step 3: Object store ─────────────────────────────────────
    let storage: Arc<dyn StorageProvider> =
        Arc::new(LocalStorageProvider::new(&config.storage.root_path).await?);
    tracing::info!(root = %config.storage.root_path, "Object store ready");

    // ── Step 4: Maintenance scheduler ────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let executor = Arc::new(devhub_worker::default_executor(
            &stores,
            Arc::clone(&storage),
            &config.worker,
        ));
        let scheduler = CronScheduler::new(executor).await?;
        scheduler.register_default_tasks(&config.worker).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Maintenance scheduler disabled");
        None
    };

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::build(config, stores, cache, storage);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("DevHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    tracing::info!("DevHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
