//! ✉️ Queues — the plumbing between the producer and the worker pool.
//!
//! 🎬 *[a channel fills with transcripts. somewhere, twenty workers wait.]*
//! *[the clock on the wall reads 2:47am.]*
//! *[nobody asked for this ingestion pipeline. and yet, here we are.]*
//!
//! Two channels, two personalities:
//!
//! - [`WorkQueue`]: bounded FIFO. When it's full, `put` makes the producer
//!   wait. That waiting IS the backpressure. Remove the bound and the next
//!   traffic spike eats your heap like a hobbit eats second breakfast.
//! - [`DeadLetterSink`]: unbounded FIFO for transcripts whose processing went
//!   sideways. `put` never waits on a consumer, because the one thing a
//!   failure handler must not do is hang.
//!
//! 🦆 (the duck queues like everyone else. no cutting.)
//!
//! ⚠️ FIFO is per-producer. With one worker you get strict order. With twenty
//! workers you get "roughly chronological", which is all anyone can promise
//! once concurrency enters the room.

use anyhow::{Context, Result};
use tracing::warn;

use crate::common::Transcript;

/// 📦 One unit of channel traffic: either actual work, or the polite
/// "no more work" sentinel that tells a worker to clock out.
///
/// The supervisor pushes exactly one `Stop` per worker at shutdown; a worker
/// exits after observing it. Boxed transcript because these structs are
/// chunky and the channel shouldn't be doing cardio.
#[derive(Debug)]
pub enum WorkItem {
    Job(Box<Transcript>),
    Stop,
}

/// ✉️ The bounded work queue — a capacity-limited FIFO between the stream
/// producer and the worker pool.
///
/// Cloning is cheap and shares the same channel: the producer holds one
/// clone, every worker holds another. `async_channel` handles the concurrent
/// `put`/`get` safety; we handle the semantics.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    tx: async_channel::Sender<WorkItem>,
    rx: async_channel::Receiver<WorkItem>,
    capacity: usize,
}

impl WorkQueue {
    /// 🏗️ Build a queue with a fixed capacity. The capacity is the contract:
    /// at most this many items in flight, producer waits for the rest.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// 📥 Enqueue one transcript. Suspends while the queue is full — this is
    /// where the producer feels the workers' pace, and slows to match it.
    pub async fn put(&self, transcript: Transcript) -> Result<()> {
        self.tx
            .send(WorkItem::Job(Box::new(transcript)))
            .await
            .context("💀 Work queue is closed; the shift ended while we were still enqueuing")
    }

    /// 🏁 Enqueue one `Stop` sentinel. Call once per worker at shutdown.
    /// Subject to the same backpressure as real work — sentinels wait in
    /// line like everyone else, which is exactly why drain order works out.
    pub async fn put_stop(&self) -> Result<()> {
        self.tx
            .send(WorkItem::Stop)
            .await
            .context("💀 Work queue is closed; could not deliver the stop sentinel")
    }

    /// 📤 Dequeue the next item. Suspends while empty. A closed channel is
    /// answered with `Stop`, so a worker can treat "channel gone" and
    /// "sentinel received" as the same instruction: go home.
    pub async fn get(&self) -> WorkItem {
        match self.rx.recv().await {
            Ok(item) => item,
            Err(_) => WorkItem::Stop,
        }
    }

    /// 📊 Items currently queued. Never exceeds `capacity` — the channel
    /// enforces what the docs promise.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// 📏 The configured capacity, for anyone auditing the backpressure math.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// 🗑️ The dead-letter sink — an unbounded FIFO where transcripts land when
/// processing, persistence, or submission failed for good.
///
/// Not persisted. A crash between insertion and the shutdown drain loses the
/// in-memory record, so every insertion also leaves a `warn!` with the
/// transcript id — the logs keep the forensic trail even when the process
/// doesn't get to say goodbye.
#[derive(Debug, Clone)]
pub struct DeadLetterSink {
    tx: async_channel::Sender<Transcript>,
    rx: async_channel::Receiver<Transcript>,
}

impl DeadLetterSink {
    /// 🏗️ A fresh, empty sink. May it stay that way. (It won't.)
    pub fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self { tx, rx }
    }

    /// 📥 Drop one transcript into the sink. Never waits on a consumer —
    /// unbounded means the only thing between us and the push is an
    /// allocation, and if allocations are failing we have bigger news.
    pub fn put(&self, transcript: Transcript) {
        warn!(
            transcript_id = %transcript.transcript_id,
            "🗑️ transcript routed to the dead-letter sink"
        );
        // Channel can only be closed if the sink itself was dropped, and we
        // hold a clone right here. The unreachable arm stays quiet.
        let _ = self.tx.try_send(transcript);
    }

    /// 📊 Items currently sitting in the sink.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// 🗑️ Drain the sink completely. Called once, at shutdown, after the
    /// workers have gone home — there is no concurrent writer left, so what
    /// we collect here is the full and final count.
    pub fn drain(&self) -> Vec<Transcript> {
        let mut drained = Vec::with_capacity(self.rx.len());
        while let Ok(t) = self.rx.try_recv() {
            drained.push(t);
        }
        drained
    }
}

impl Default for DeadLetterSink {
    fn default() -> Self {
        Self::new()
    }
}
