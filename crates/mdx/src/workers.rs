//! 🧵 Workers: the backbone of mordex, the unsung heroes, the ones who
//! actually move transcripts while the supervisor takes all the credit in
//! the sprint retro.
//!
//! 🚀 This module is like a factory floor, except instead of hard hats
//! we wear `#[derive(Debug)]` and instead of OSHA violations
//! we have borrow checker violations. 🦆
//!
//! ⚠️ "If you're reading this, the code review went poorly."

use std::sync::Arc;

// 🎉 anyhowwwww.... it's useful! Like duct tape for error handling.
// This is pretty much across the whole world of mordex —
// the universal donor of Result types 🩸
use anyhow::Result;
use tokio::task::JoinHandle;

pub mod pipeline_worker;

use crate::processing::Pipeline;
use crate::progress::PipelineProgress;
use crate::queues::{DeadLetterSink, WorkQueue};
use crate::storage::StoreBackend;
use crate::transport::{ApiClient, AuthSession};
use pipeline_worker::PipelineWorker;

/// 🏗️ A background worker, that does work. duh.
///
/// 🎯 The trait that all workers must implement, like a social contract
/// but enforced by the compiler instead of polite society.
pub trait Worker {
    /// 🚀 Start the worker. Returns a JoinHandle because we trust
    /// but verify. Mostly verify. Okay, we don't trust at all.
    fn start(self) -> JoinHandle<Result<()>>;
}

/// 📦 Everything a worker shares with its nineteen siblings: the client and
/// session for submissions, the store, the pipeline, the dead-letter sink,
/// and the scoreboard. Clone is cheap — it's `Arc`s all the way down.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub client: Arc<ApiClient>,
    pub session: AuthSession,
    pub store: Arc<StoreBackend>,
    pub pipeline: Arc<Pipeline>,
    pub dlq: DeadLetterSink,
    pub progress: Arc<PipelineProgress>,
}

/// 🧵 Unleash the workers! Like releasing the Kraken, but with more
/// structured concurrency and fewer tentacles.
///
/// Spawns `count` pipeline workers, all draining the same queue. Each handle
/// resolves when its worker dequeues a stop sentinel and clocks out.
pub fn spawn_pool(
    count: usize,
    queue: &WorkQueue,
    ctx: &WorkerContext,
) -> Vec<JoinHandle<Result<()>>> {
    (0..count)
        .map(|id| PipelineWorker::new(id, queue.clone(), ctx.clone()).start())
        .collect()
}
