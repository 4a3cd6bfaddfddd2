//! # Payroll Indexer Runtime
//!
//! Connects the payroll ledgers to an ordered event feed.
//!
//! ## Modular Structure
//!
//! - `config` - Environment-driven runtime settings
//! - `source` - Event feeds (JSON lines from a file or stdin)
//! - `pipeline` - Reader task, bounded channel and the dispatch loop
//! - `recorder` - Ledger metrics forwarded to Prometheus
//! - `metrics_server` - `/metrics` and `/health` over HTTP
//! - `runtime` - Wiring and shutdown
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs, metrics registry)
//! 2. Load and validate `RuntimeConfig`
//! 3. Start the metrics endpoint (unless disabled)
//! 4. Open the event feed and run the pipeline until it ends, fails, or
//!    Ctrl+C is pressed

pub mod config;
pub mod metrics_server;
pub mod pipeline;
pub mod recorder;
pub mod runtime;
pub mod source;

pub use config::{ConfigError, EventsPath, RuntimeConfig};
pub use pipeline::{Pipeline, PipelineError, PipelineReport};
pub use recorder::PrometheusRecorder;
pub use runtime::IndexerRuntime;
pub use source::{EventSource, JsonLinesSource, SourceError};
