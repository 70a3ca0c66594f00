//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::activity::manager::{ActivityManager, ActivityReport};
use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::ConnectivityError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::activity;

/// Run the connectivity service until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    reports_tx: Option<mpsc::Sender<ActivityReport>>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConnectivityError> {
    info!("Initializing device connectivity service...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, reports_tx, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start service: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    reports_tx: Option<mpsc::Sender<ActivityReport>>,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), ConnectivityError> {
    let app_state = AppState::init(options).await?;

    if options.enable_activity_worker {
        init_activity_worker(
            options.activity_worker.clone(),
            app_state.activity.clone(),
            reports_tx,
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    init_server(options, &app_state, shutdown_manager, shutdown_tx.subscribe()).await
}

fn init_activity_worker(
    options: activity::Options,
    manager: Arc<ActivityManager>,
    reports_tx: Option<mpsc::Sender<ActivityReport>>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConnectivityError> {
    info!("Initializing activity worker...");

    let activity_handle = tokio::spawn(async move {
        activity::run(
            &options,
            manager,
            reports_tx,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_activity_worker_handle(activity_handle)
}

async fn init_server(
    options: &AppOptions,
    app_state: &AppState,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConnectivityError> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::new(
        app_state.connectivity.clone(),
        app_state.registry.clone(),
        app_state.activity.clone(),
        options.base_url.clone(),
    );

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    server_handle: Option<JoinHandle<Result<(), ConnectivityError>>>,
    activity_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            server_handle: None,
            activity_worker_handle: None,
        }
    }

    fn with_activity_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConnectivityError> {
        if self.activity_worker_handle.is_some() {
            return Err(ConnectivityError::ShutdownError(
                "activity_worker_handle already set".to_string(),
            ));
        }
        self.activity_worker_handle = Some(handle);
        Ok(())
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), ConnectivityError>>,
    ) -> Result<(), ConnectivityError> {
        if self.server_handle.is_some() {
            return Err(ConnectivityError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ConnectivityError> {
        let _ = self.shutdown_tx.send(());

        let max_delay = self.lifecycle_options.max_shutdown_delay;
        match tokio::time::timeout(max_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Shutdown timed out after {:?}, forcing shutdown...", max_delay);
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ConnectivityError> {
        info!("Shutting down device connectivity service...");

        // 1. Activity worker
        if let Some(handle) = self.activity_worker_handle.take() {
            handle
                .await
                .map_err(|e| ConnectivityError::ShutdownError(e.to_string()))?;
        }

        // 2. HTTP server
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| ConnectivityError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
