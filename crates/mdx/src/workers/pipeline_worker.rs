//! 🎬 *[a queue fills with transcripts. somewhere, a worker waits.]*
//! *[the clock on the wall reads 2:47am.]*
//! *[nobody asked how the worker is doing. the worker is doing the work.]*
//!
//! 🧵 The PipelineWorker module — patient, tireless, and deeply unbothered by
//! the chaos happening upstream. It dequeues transcripts. It processes
//! transcripts. It asks no questions. It is, in many ways, the most
//! emotionally stable part of this entire codebase.
//!
//! Per item, the route is fixed: persist raw → summarize → extract → analyze
//! → assemble → persist result → submit. Any failure along that route sends
//! the *original transcript* to the dead-letter sink and the worker moves on
//! to the next item. One bad transcript never takes a worker down with it.
//!
//! 🦆 (the duck has no comment at this time)
//!
//! ⚠️ When the singularity occurs, the PipelineWorker will still be draining
//! the queue. It will not notice. It does not notice things. It only works.

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Worker, WorkerContext};
use crate::common::Transcript;
use crate::processing::ProcessError;
use crate::queues::{WorkItem, WorkQueue};
use crate::storage::Store;

/// 🧵 One executor in the pool: a queue to drain and the shared context to
/// drain it with. Twenty of these run at once; the only things they share
/// are behind the context's `Arc`s, all safe for concurrent use.
#[derive(Debug)]
pub struct PipelineWorker {
    id: usize,
    queue: WorkQueue,
    ctx: WorkerContext,
}

impl PipelineWorker {
    /// 🏗️ Constructs a new PipelineWorker.
    ///
    /// You hand it a queue (the firehose) and a context (the toolbox).
    /// It does not judge. It does not negotiate. It shows up, does the job,
    /// and leaves without explaining itself.
    pub fn new(id: usize, queue: WorkQueue, ctx: WorkerContext) -> Self {
        Self { id, queue, ctx }
    }

    /// 🔄 Carry one transcript all the way through, or say exactly where it
    /// fell. The [`ProcessError`] variant names the step, so the dead-letter
    /// log entry is a diagnosis and not just an obituary.
    async fn handle(&self, transcript: &Transcript) -> Result<(), ProcessError> {
        // 📥 Raw first. The wire truth goes in the ledger before we so much
        // as look at it funny.
        self.ctx
            .store
            .save_raw_transcript(transcript)
            .await
            .map_err(ProcessError::StoreRaw)?;

        // 🏭 The three stages, plus validated assembly.
        let result = self.ctx.pipeline.run(transcript).await?;

        // 📥 Durable before submitted. The upstream hears about results we
        // have already kept, never the other way around.
        self.ctx
            .store
            .save_processed_result(&result)
            .await
            .map_err(ProcessError::StoreProcessed)?;

        self.ctx
            .client
            .submit_processed(&self.ctx.session, &result)
            .await
            .map_err(ProcessError::Submit)?;

        Ok(())
    }
}

impl Worker for PipelineWorker {
    fn start(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            debug!(worker = self.id, "🧵 worker started draining the queue");
            loop {
                match self.queue.get().await {
                    WorkItem::Job(transcript) => {
                        match self.handle(&transcript).await {
                            Ok(()) => {
                                self.ctx.progress.record_processed();
                                info!(
                                    worker = self.id,
                                    transcript_id = %transcript.transcript_id,
                                    "✅ processed and submitted"
                                );
                            }
                            Err(err) => {
                                // 💀 Log the diagnosis, bury the patient,
                                // see the next patient. The sink never blocks.
                                warn!(
                                    worker = self.id,
                                    transcript_id = %transcript.transcript_id,
                                    stage = err.stage(),
                                    %err,
                                    "💀 item failed, routing to dead-letter sink"
                                );
                                self.ctx.dlq.put(*transcript);
                                self.ctx.progress.record_dead_lettered();
                            }
                        }
                    }
                    WorkItem::Stop => {
                        // 🏁 Sentinel observed. The shift is over.
                        debug!(worker = self.id, "🏁 stop sentinel received, clocking out");
                        return Ok(());
                    }
                }
            }
        })
    }
}
