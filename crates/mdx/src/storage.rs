//! 🗄️ Storage — where the real persistence happens.
//!
//! 🚰 Raw transcripts go in as received, processed results go in as derived,
//! and both are keyed by `transcript_id`. The actual database engine is
//! somebody else's department; this module owns the interface the pipeline
//! needs from it and ships two backends that honor it.
//!
//! 🎭 This module is the casting agency. Need records gone at exit? In-memory.
//! Need them to survive a restart and be greppable at 3am? File-backed
//! NDJSON. We've got a backend for that. We've got backends for days.
//!
//! # Contract
//! - Both saves are keyed by `transcript_id`. A duplicate key is a constraint
//!   violation and comes back as an error — never a silent merge.
//! - A successful save is durable (flushed) before it returns, because the
//!   worker submits upstream right after, and "persisted" must mean it.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not
//! question the duck.

use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::StoreConfig;
use crate::common::{ProcessedResult, Transcript};

pub mod file_store;
pub mod in_mem_store;

pub use file_store::FileStore;
pub use in_mem_store::InMemoryStore;

/// 🗄️ A store that keeps raw transcripts and their processed results.
///
/// `&self` everywhere: the whole worker pool shares one store behind an
/// `Arc`, so each backend carries its own interior locking. Sources have
/// state; stores have locks. Everyone has something.
#[async_trait]
pub trait Store: std::fmt::Debug {
    /// 📥 Persist one raw transcript, exactly as it came off the wire.
    /// Errors on a duplicate `transcript_id`.
    async fn save_raw_transcript(&self, transcript: &Transcript) -> Result<()>;

    /// 📥 Persist one processed result. Errors on a duplicate
    /// `transcript_id`. Durable before return — the upstream submission that
    /// follows must never outrun the ledger.
    async fn save_processed_result(&self, result: &ProcessedResult) -> Result<()>;

    /// 🗑️ Flush and finalize. Call at shutdown. Skipping it is a bug.
    /// It is also considered rude.
    async fn close(&self) -> Result<()>;
}

/// 🎭 The many faces of a Store — wraps a concrete backend, dispatches via
/// match, keeps the supervisor blissfully ignorant of where records actually
/// land. Ignorance is a feature. It's called "abstraction."
#[derive(Debug)]
pub enum StoreBackend {
    InMemory(InMemoryStore),
    File(FileStore),
}

impl StoreBackend {
    /// 🏗️ Resolve a backend from config. The file backend touches the disk
    /// here (directory creation, ledger replay), so a bad `data_dir` fails
    /// at startup instead of at transcript five thousand.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        match config {
            StoreConfig::InMemory => Ok(StoreBackend::InMemory(InMemoryStore::new())),
            StoreConfig::File(file_config) => {
                Ok(StoreBackend::File(FileStore::open(file_config).await?))
            }
        }
    }
}

#[async_trait]
impl Store for StoreBackend {
    async fn save_raw_transcript(&self, transcript: &Transcript) -> Result<()> {
        match self {
            StoreBackend::InMemory(s) => s.save_raw_transcript(transcript).await,
            StoreBackend::File(s) => s.save_raw_transcript(transcript).await,
        }
    }

    async fn save_processed_result(&self, result: &ProcessedResult) -> Result<()> {
        match self {
            StoreBackend::InMemory(s) => s.save_processed_result(result).await,
            StoreBackend::File(s) => s.save_processed_result(result).await,
        }
    }

    async fn close(&self) -> Result<()> {
        match self {
            StoreBackend::InMemory(s) => s.close().await,
            StoreBackend::File(s) => s.close().await,
        }
    }
}
