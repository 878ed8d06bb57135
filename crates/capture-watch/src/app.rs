use crate::{
    AppCommand, AppResult, BadgeIndicator, DemoSession, QueryConsumer, TabSessions,
    config::Config, server,
};

use capture_watch_core::{Coordinator, CoordinatorHandle, Indicator};

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, mpsc, watch},
    task::JoinHandle,
};
use tracing::{error, info, instrument};

const COMMAND_CAPACITY: usize = 32;
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Main application state.
///
/// Owns the Coordinator, the open tabs and the query server. Tab lifecycle
/// and shutdown requests arrive on `command_rx`.
pub struct App {
    pub(crate) config: Config,
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) coordinator_task: JoinHandle<()>,
    pub(crate) badges: Arc<BadgeIndicator>,
    pub(crate) sessions: Arc<Mutex<TabSessions>>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Start the Coordinator and prepare an empty tab set.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn new(config: Config) -> Self {
        let badges = Arc::new(BadgeIndicator::new());
        let (coordinator, coordinator_task) = Coordinator::spawn(
            Arc::clone(&badges) as Arc<dyn Indicator>,
            config.indicator.style(),
            config.coordinator.channel_capacity,
        );

        let sessions = Arc::new(Mutex::new(TabSessions::new(
            coordinator.clone(),
            config.timing.pipeline_timing(),
        )));

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            coordinator,
            coordinator_task,
            badges,
            sessions,
            command_tx,
            command_rx,
            shutdown_tx,
        }
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Capture-Watch starting");

        let consumer = QueryConsumer::new(self.coordinator.clone(), Arc::clone(&self.sessions));

        let listener = server::bind(self.config.server_addr()).await?;
        let server_handle = tokio::spawn(server::serve(
            listener,
            server::router(consumer.clone()),
            self.shutdown_tx.subscribe(),
        ));
        info!(url = %self.config.server_url(), "Query API available");

        let demo_handle = self.config.demo.enabled.then(|| {
            let demo = DemoSession {
                sessions: Arc::clone(&self.sessions),
                consumer,
                badges: Arc::clone(&self.badges),
                command_tx: self.command_tx.clone(),
                config: self.config.demo.clone(),
            };
            tokio::spawn(async move {
                if let Err(e) = demo.run().await {
                    error!(error = ?e, "Demo session failed");
                }
            })
        });

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Interrupt received"),
                        Err(e) => error!(error = ?e, "Failed to listen for interrupt"),
                    }
                    break;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::CloseTab { tab_id } => {
                            if let Err(e) = self.sessions.lock().await.close_tab(tab_id).await {
                                error!(tab_id = %tab_id, error = ?e, "Failed to close tab");
                            }
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }
            }
        }

        if let Some(handle) = demo_handle {
            handle.abort();
        }

        if let Err(e) = self.sessions.lock().await.close_all().await {
            error!(error = ?e, "Failed to close open tabs");
        }

        let _ = self.shutdown_tx.send(true);
        self.coordinator.shutdown();

        match tokio::time::timeout(TEARDOWN_TIMEOUT, server_handle).await {
            Ok(Ok(Ok(()))) => info!("Query server stopped cleanly"),
            Ok(Ok(Err(e))) => error!(error = ?e, "Query server failed"),
            Ok(Err(e)) => error!(error = ?e, "Query server task panicked"),
            Err(_) => info!("Query server did not stop within timeout, will be cleaned up on exit"),
        }

        match tokio::time::timeout(TEARDOWN_TIMEOUT, self.coordinator_task).await {
            Ok(Ok(())) => info!("Coordinator stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Coordinator task panicked"),
            Err(_) => info!("Coordinator did not stop within timeout"),
        }

        info!("Capture-Watch shut down successfully");

        Ok(())
    }
}
