//! Wires the ledger core, its adapters and the pipeline together.

use std::sync::Arc;

use payroll_ledger::{EventDispatcher, InMemoryEventLog, InMemoryLedgerStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::RuntimeConfig;
use crate::metrics_server;
use crate::pipeline::{Pipeline, PipelineError, PipelineReport};
use crate::recorder::PrometheusRecorder;
use crate::source::EventSource;

/// The indexer runtime.
pub struct IndexerRuntime {
    config: RuntimeConfig,
    store: Arc<InMemoryLedgerStore>,
    event_log: Arc<InMemoryEventLog>,
    dispatcher: Arc<EventDispatcher>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl IndexerRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        info!(
            events_path = ?config.events_path,
            channel_capacity = config.channel_capacity,
            strict_ordering = config.strict_ordering,
            "Creating indexer runtime"
        );

        let store = Arc::new(InMemoryLedgerStore::new());
        let event_log = Arc::new(InMemoryEventLog::new());
        let dispatcher = Arc::new(
            EventDispatcher::new(store.clone(), event_log.clone(), config.ledger_config())
                .with_metrics(Arc::new(PrometheusRecorder)),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            store,
            event_log,
            dispatcher,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<InMemoryLedgerStore> {
        Arc::clone(&self.store)
    }

    pub fn event_log(&self) -> Arc<InMemoryEventLog> {
        Arc::clone(&self.event_log)
    }

    pub fn dispatcher(&self) -> Arc<EventDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Spawn the metrics endpoint. Port zero disables it.
    pub fn start_metrics_server(&self, port: u16) -> Option<JoinHandle<()>> {
        if port == 0 {
            info!("Metrics endpoint disabled");
            return None;
        }
        let dispatcher = self.dispatcher();
        let shutdown = self.shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = metrics_server::serve(port, dispatcher, shutdown).await {
                error!(port, error = %e, "Metrics server failed");
            }
        }))
    }

    /// Apply `source` until it ends, fails, or shutdown is requested.
    pub async fn run(&self, source: Box<dyn EventSource>) -> Result<PipelineReport, PipelineError> {
        let pipeline = Pipeline::new(self.dispatcher(), self.config.channel_capacity);
        pipeline.run(source, self.shutdown_rx.clone()).await
    }

    /// Signal every task to stop.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
    }
}
