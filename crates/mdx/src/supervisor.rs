//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 *[dramatic orchestral music swells]*
//! 🎬 "In a world where workers toil endlessly..."
//! 🎬 "One supervisor dared to manage them all."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor module — part middle manager, part helicopter parent,
//! part air traffic controller for transcripts.
//!
//! The lifecycle is a straight line with no U-turns:
//!
//! ```text
//! Starting → Running → Draining → Stopped
//! ```
//!
//! - **Starting**: open the store, build the client, authenticate, open the
//!   stream, launch the producer and the worker pool. Any failure here is
//!   fatal — a pipeline that cannot start does not get to half-start.
//! - **Running**: the producer pulls from the stream and enqueues under
//!   backpressure; the workers drain. Ends when the stop signal arrives.
//! - **Draining**: stop the producer's enqueuing, push one sentinel per
//!   worker, join the pool, cancel the stream subscription. In-flight items
//!   finish; nothing gets cut off mid-pipeline.
//! - **Stopped**: drain the dead-letter sink, report the count, flush the
//!   store, fetch upstream stats if the upstream is still speaking to us.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::app_config::AppConfig;
use crate::processing::Pipeline;
use crate::progress::PipelineProgress;
use crate::queues::{DeadLetterSink, WorkQueue};
use crate::storage::{Store, StoreBackend};
use crate::transport::{ApiClient, StreamEvent, TranscriptStream};
use crate::workers::{WorkerContext, spawn_pool};

/// 🚦 The four stations of a pipeline's life. Transitions go one way;
/// there is no state for "Running, but again."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Starting,
    Running,
    Draining,
    Stopped,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lifecycle::Starting => "starting",
            Lifecycle::Running => "running",
            Lifecycle::Draining => "draining",
            Lifecycle::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// 📊 What a completed run has to show for itself. The dead-letter count is
/// the drained count — the number that was actually sitting in the sink when
/// the music stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub enqueued: u64,
    pub processed: u64,
    pub dead_lettered: u64,
}

/// 📦 The Supervisor: because even async tasks need someone hovering over
/// them asking "is it done yet?" every 5 milliseconds.
#[derive(Debug)]
pub struct Supervisor {
    /// 🔧 The sacred scrolls of configuration, passed down from main()
    /// through the ancient ritual of .clone()
    config: AppConfig,
    lifecycle: Lifecycle,
}

impl Supervisor {
    /// 🚀 Birth of a Supervisor. It's like a baby, but less crying.
    /// Actually no, there's plenty of crying. Mostly from the developer.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Starting,
        }
    }

    fn transition(&mut self, next: Lifecycle) {
        info!(from = %self.lifecycle, to = %next, "🚦 lifecycle transition");
        self.lifecycle = next;
    }

    /// 🚀 Run the pipeline until an interrupt or terminate signal arrives,
    /// then drain gracefully and report.
    pub async fn run(self) -> Result<RunReport> {
        self.run_with_shutdown(shutdown_signal()).await
    }

    /// 🚀 Run the pipeline until `shutdown` resolves. The signal handling is
    /// split out so tests can pull the plug on a schedule instead of sending
    /// themselves SIGTERM like maniacs.
    pub async fn run_with_shutdown(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<RunReport> {
        // ===== Starting: everything here is fatal on failure =====
        let store = Arc::new(
            StoreBackend::from_config(&self.config.store)
                .await
                .context("💀 fatal: the store would not open; not starting a pipeline with nowhere to put records")?,
        );
        let client = Arc::new(ApiClient::new(self.config.api.clone())?);

        // 🏥 Best-effort probe. Informative, never fatal — authenticate is
        // about to have the final word anyway.
        if client.health_check().await {
            info!("🏥 upstream reports healthy");
        } else {
            warn!("🏥 upstream health check failed; proceeding to authenticate anyway");
        }

        let session = client
            .authenticate()
            .await
            .context("💀 fatal: authentication failed at startup; not starting a pipeline we cannot submit from")?;

        let queue = WorkQueue::bounded(self.config.runtime.queue_capacity);
        let dlq = DeadLetterSink::new();
        let progress = Arc::new(PipelineProgress::new());

        let stream = client
            .stream_transcripts(&session)
            .await
            .context("💀 fatal: the transcript stream would not open")?;

        // 🛑 The producer's off switch. One permit is enough: the producer
        // checks it at every pull and every enqueue.
        let stop_producing = Arc::new(Notify::new());
        let producer = tokio::spawn(produce(
            stream,
            queue.clone(),
            stop_producing.clone(),
            progress.clone(),
        ));

        let ctx = WorkerContext {
            client: client.clone(),
            session: session.clone(),
            store: store.clone(),
            pipeline: Arc::new(Pipeline::new()),
            dlq: dlq.clone(),
            progress: progress.clone(),
        };
        let worker_count = self.config.runtime.concurrency;
        let workers = spawn_pool(worker_count, &queue, &ctx);
        info!(workers = worker_count, queue_capacity = queue.capacity(), "🧵 worker pool launched");

        // 🎨 Render ticker — one redraw per second, owned here so the hot
        // path never draws a table.
        let ticker = {
            let progress = progress.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(1));
                loop {
                    interval.tick().await;
                    progress.render();
                }
            })
        };

        // ===== Running: the long middle =====
        self.transition(Lifecycle::Running);
        shutdown.await;
        info!("🛑 shutdown signal received, terminating workers...");

        // ===== Draining: finish what's in flight, start nothing new =====
        self.transition(Lifecycle::Draining);
        stop_producing.notify_one();

        // 🏁 One sentinel per worker. They queue up behind any remaining real
        // work, which is exactly why every in-flight item still gets done.
        for _ in 0..worker_count {
            queue
                .put_stop()
                .await
                .context("💀 could not deliver a stop sentinel; the queue closed early")?;
        }

        for outcome in futures::future::join_all(workers).await {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(%err, "💀 a worker exited with an error"),
                Err(join_err) => error!(%join_err, "💀 a worker task panicked"),
            }
        }
        match producer.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!("💀 producer ended with an error: {err:#}"),
            Err(join_err) => error!(%join_err, "💀 producer task panicked"),
        }
        ticker.abort();

        // ===== Stopped: count the dead, flush the ledgers, say goodnight =====
        self.transition(Lifecycle::Stopped);
        let dead_letters = dlq.drain();
        if !dead_letters.is_empty() {
            warn!("🗑️ {} transcripts in dead-letter sink", dead_letters.len());
        }
        store
            .close()
            .await
            .context("💀 store refused to flush at shutdown; records may be stranded in a buffer")?;

        // 📊 A parting glance at the upstream's books. Best-effort: if the
        // upstream is already gone, that's a debug line, not a problem.
        match client.get_stats(&session).await {
            Ok(stats) => info!(stats = %stats, "📊 upstream stats at shutdown"),
            Err(err) => debug!(%err, "📊 could not fetch upstream stats at shutdown"),
        }

        progress.finish();
        let snap = progress.snapshot();
        let report = RunReport {
            enqueued: snap.enqueued,
            processed: snap.processed,
            dead_lettered: dead_letters.len() as u64,
        };
        info!(
            enqueued = report.enqueued,
            processed = report.processed,
            dead_lettered = report.dead_lettered,
            "🏁 pipeline stopped"
        );
        Ok(report)
    }
}

/// 🔄 The producer loop: pull from the stream, enqueue under backpressure,
/// stop the moment the supervisor says stop.
///
/// Both awaits race against the stop notification, so after the signal the
/// producer enqueues nothing further — not even an item it had already
/// pulled. Better to drop one unprocessed stream record at shutdown than to
/// sneak work past the drain.
///
/// Stream end and stream failure both end the loop; the supervisor learns
/// which from the returned result. Reconnecting is a policy decision that
/// belongs upstairs, and upstairs has currently decided "no."
async fn produce(
    mut stream: TranscriptStream,
    queue: WorkQueue,
    stop: Arc<Notify>,
    progress: Arc<PipelineProgress>,
) -> Result<()> {
    let outcome = loop {
        let event = tokio::select! {
            _ = stop.notified() => {
                info!("🛑 producer: stop requested");
                break Ok(());
            }
            event = stream.next() => event,
        };
        match event {
            Ok(StreamEvent::Item(transcript)) => {
                let transcript_id = transcript.transcript_id.clone();
                tokio::select! {
                    _ = stop.notified() => {
                        info!(%transcript_id, "🛑 producer: stop requested mid-enqueue; dropping the in-flight item");
                        break Ok(());
                    }
                    put_result = queue.put(*transcript) => {
                        put_result?;
                        progress.record_enqueued();
                        debug!(%transcript_id, "📥 enqueued");
                    }
                }
            }
            Ok(StreamEvent::Closed) => {
                info!("📡 upstream closed the transcript stream; producer going home");
                break Ok(());
            }
            Err(err) => break Err(err),
        }
    };
    // 🗑️ Either way the subscription is spent. Tear it down on purpose.
    stream.cancel();
    outcome
}

/// 🛑 Resolves when the process is told to wrap it up: SIGINT (ctrl-c) or,
/// on unix, SIGTERM — the polite double-tap every orchestrator sends.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                outcome = tokio::signal::ctrl_c() => {
                    if let Err(err) = outcome {
                        error!(%err, "ctrl-c handler failed; treating as shutdown");
                    }
                }
                _ = sigterm.recv() => {}
            }
        }
        Err(err) => {
            warn!(%err, "could not install SIGTERM handler; listening for ctrl-c only");
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(%err, "ctrl-c handler failed; treating as shutdown");
            }
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "ctrl-c handler failed; treating as shutdown");
    }
}
