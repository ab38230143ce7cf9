//! 🌋 mordex — the transcript ingestion pipeline for Mount Doom Visitor
//! Services.
//!
//! One does not simply walk transcripts into Mordor. One authenticates,
//! streams them over a long-lived connection, pushes them through a bounded
//! queue into a worker pool, persists raw and processed forms, submits the
//! results back upstream, and dead-letters whatever the network chews up
//! along the way. Then one drains gracefully. 🦆
//!
//! ```text
//! upstream stream ─→ producer ─→ [bounded queue] ─→ worker pool ─→ store
//!                                                        │            │
//!                                                        │            └─→ submit upstream
//!                                                        └─→ dead-letter sink (failures)
//! ```

pub mod app_config;
pub mod common;
pub mod processing;
pub mod progress;
pub mod queues;
pub mod storage;
pub mod supervisor;
pub mod transport;
pub mod workers;

use anyhow::{Context, Result};

use app_config::AppConfig;
use supervisor::{RunReport, Supervisor};

/// 🚀 Run the whole pipeline: start it, stream until a stop signal arrives,
/// drain, and report what happened.
pub async fn run(config: AppConfig) -> Result<RunReport> {
    Supervisor::new(config)
        .run()
        .await
        .context("Failed to run the transcript pipeline")
}
