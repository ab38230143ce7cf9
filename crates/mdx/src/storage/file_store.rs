//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The disk was quiet. Too quiet. A lone process had been tasked with keeping
//! two ledgers — just two files, they said. Simple, they said. What could go
//! wrong?
//!
//! The directory didn't exist. The disk was full. A previous run left half
//! the ids already written, and somebody was about to write them again.
//!
//! [`FileStore`] is the durable backend: two append-only NDJSON ledgers under
//! one data directory, a BufWriter so we're not doing a syscall per field
//! like some kind of 1995 CGI script, and an explicit flush per record so
//! "saved" means "on disk" and not "in a buffer with aspirations."
//!
//! 🚰 Transcript → serde_json → BufWriter → flush → ledger
//! 💀 Disk full → your problem now
//! 🦆 (mandatory, no notes)

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::{
    fs::{File, OpenOptions},
    io::{self, AsyncBufReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::app_config::FileStoreConfig;
use crate::common::{ProcessedResult, Transcript};
use crate::storage::Store;

// 📂 The two ledgers. Raw is the wire truth; processed is what we made of it.
const RAW_LEDGER: &str = "raw_transcripts.ndjson";
const PROCESSED_LEDGER: &str = "processed_results.ndjson";

/// 🔑 The one field we care about when replaying a ledger at open. Everything
/// else in the line can be whatever it wants to be.
#[derive(Deserialize)]
struct LedgerKey {
    transcript_id: String,
}

/// 📂 One ledger: an append writer plus the set of ids already written.
/// The id set is the uniqueness constraint; the file is the durability.
#[derive(Debug)]
struct Ledger {
    writer: io::BufWriter<File>,
    ids: HashSet<String>,
}

impl Ledger {
    /// 🚀 Open (or create) a ledger file, replaying existing lines to rebuild
    /// the id set. A restart must not forget what it already wrote — that is
    /// the entire difference between "durable" and "optimistic."
    async fn open(path: &Path) -> Result<Self> {
        let mut ids = HashSet::new();
        if path.exists() {
            let existing = File::open(path).await.context(format!(
                "💀 Ledger '{}' exists but would not open for replay. \
                 The file is there. We can see it. It will not talk to us.",
                path.display()
            ))?;
            let mut reader = io::BufReader::new(existing);
            let mut line = String::new();
            loop {
                line.clear();
                let bytes_read = reader.read_line(&mut line).await?;
                if bytes_read == 0 {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LedgerKey>(&line) {
                    Ok(key) => {
                        ids.insert(key.transcript_id);
                    }
                    Err(err) => {
                        // ⚠️ A corrupt line can't be keyed, so it can't guard
                        // uniqueness. Log it and keep replaying.
                        warn!(ledger = %path.display(), %err, "skipping unparseable ledger line");
                    }
                }
            }
            debug!(ledger = %path.display(), known_ids = ids.len(), "📖 ledger replayed");
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .context(format!(
                "💀 The ledger '{}' could not be conjured into existence. \
                 We stared at the path. The path stared back. \
                 One of us was wrong about the permissions. It was us.",
                path.display()
            ))?;

        Ok(Self {
            writer: io::BufWriter::new(file),
            ids,
        })
    }

    /// 📥 Append one keyed record, flushing before return. Rejects keys the
    /// ledger has already seen — this run or any run before it.
    async fn append(&mut self, key: &str, record: &serde_json::Value, what: &str) -> Result<()> {
        if self.ids.contains(key) {
            bail!("duplicate transcript_id '{key}' in {what} ledger");
        }
        let mut line = serde_json::to_string(record)
            .context("💀 A record refused to serialize. serde_json has seen everything, except this.")?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        // ✅ Flush now. The worker submits upstream the moment we return, and
        // a record that only exists in a BufWriter does not count as kept.
        self.writer.flush().await?;
        self.ids.insert(key.to_string());
        Ok(())
    }
}

/// 📂 FileStore — the durable backend. Two ledgers, one lock.
///
/// The mutex serializes writers across the worker pool, which also means
/// NDJSON lines never interleave. Twenty workers, one pen.
#[derive(Debug)]
pub struct FileStore {
    inner: tokio::sync::Mutex<FileStoreInner>,
    data_dir: PathBuf,
}

#[derive(Debug)]
struct FileStoreInner {
    raw: Ledger,
    processed: Ledger,
}

impl FileStore {
    /// 🚀 Open the store: create the data directory if needed, open both
    /// ledgers, replay their id sets. Fails loudly here rather than quietly
    /// five thousand transcripts later.
    pub async fn open(config: &FileStoreConfig) -> Result<Self> {
        let data_dir = PathBuf::from(&config.data_dir);
        tokio::fs::create_dir_all(&data_dir).await.context(format!(
            "💀 Data directory '{}' refused to exist. We asked nicely. \
             The filesystem said 'new phone who dis'.",
            data_dir.display()
        ))?;

        let raw = Ledger::open(&data_dir.join(RAW_LEDGER)).await?;
        let processed = Ledger::open(&data_dir.join(PROCESSED_LEDGER)).await?;

        Ok(Self {
            inner: tokio::sync::Mutex::new(FileStoreInner { raw, processed }),
            data_dir,
        })
    }

    /// 📂 Where the ledgers live, for log lines and nosy operators.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[async_trait]
impl Store for FileStore {
    async fn save_raw_transcript(&self, transcript: &Transcript) -> Result<()> {
        // 📦 The raw record: identity columns up front for grep-ability,
        // the full transcript as payload, receipt time stamped here.
        let record = serde_json::json!({
            "transcript_id": transcript.transcript_id,
            "session_id": transcript.session_id,
            "received_at": Utc::now(),
            "data": transcript,
        });
        let mut inner = self.inner.lock().await;
        inner
            .raw
            .append(&transcript.transcript_id, &record, "raw transcript")
            .await
    }

    async fn save_processed_result(&self, result: &ProcessedResult) -> Result<()> {
        let record = serde_json::json!({
            "transcript_id": result.transcript_id,
            "processed_at": result.processing_timestamp,
            "summary": result.summary,
            "structured": result.structured_data,
            "analysis": result.analysis,
        });
        let mut inner = self.inner.lock().await;
        inner
            .processed
            .append(&result.transcript_id, &record, "processed result")
            .await
    }

    /// 🗑️ Final flush for both ledgers. The BufWriter empties its soul to
    /// disk, the inode rests easy, the shift ends.
    async fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.raw.writer.flush().await?;
        inner.processed.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Analysis;
    use crate::common::test_fixtures::sample_transcript;
    use crate::processing::extractor::extract_structured_data;

    fn processed_for(id: &str) -> ProcessedResult {
        let t = sample_transcript(id);
        let analysis = Analysis::new(0.5, "high".into(), "medium".into(), vec![]).unwrap();
        ProcessedResult::assemble(&t, "a summary".into(), extract_structured_data(&t), analysis)
            .unwrap()
    }

    #[tokio::test]
    async fn the_one_where_records_actually_reach_the_disk() {
        let dir = tempfile::tempdir().expect("💀 No temp dir. The OS is having a day.");
        let config = FileStoreConfig {
            data_dir: dir.path().to_string_lossy().into_owned(),
        };

        let store = FileStore::open(&config).await.unwrap();
        store.save_raw_transcript(&sample_transcript("t1")).await.unwrap();
        store.save_processed_result(&processed_for("t1")).await.unwrap();
        store.close().await.unwrap();

        // 🧪 Read the ledgers back with plain std fs — flushed means readable.
        let raw_text = std::fs::read_to_string(dir.path().join(RAW_LEDGER)).unwrap();
        let raw_lines: Vec<&str> = raw_text.lines().collect();
        assert_eq!(raw_lines.len(), 1);
        let raw_record: serde_json::Value = serde_json::from_str(raw_lines[0]).unwrap();
        assert_eq!(raw_record["transcript_id"], "t1");
        assert_eq!(raw_record["data"]["session_id"], "s-t1");
        assert!(raw_record["received_at"].is_string());

        let processed_text =
            std::fs::read_to_string(dir.path().join(PROCESSED_LEDGER)).unwrap();
        let processed_record: serde_json::Value =
            serde_json::from_str(processed_text.lines().next().unwrap()).unwrap();
        assert_eq!(processed_record["transcript_id"], "t1");
        assert_eq!(processed_record["summary"], "a summary");
        assert_eq!(
            processed_record["structured"]["visitor_details"]["permit_status"],
            "pending"
        );
    }

    #[tokio::test]
    async fn the_one_where_the_ledger_remembers_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileStoreConfig {
            data_dir: dir.path().to_string_lossy().into_owned(),
        };

        // 🧪 First run writes t1 and shuts down like a good citizen.
        {
            let store = FileStore::open(&config).await.unwrap();
            store.save_raw_transcript(&sample_transcript("t1")).await.unwrap();
            store.close().await.unwrap();
        }

        // 🔄 Second run replays the ledger and must refuse a second t1.
        let store = FileStore::open(&config).await.unwrap();
        let err = store
            .save_raw_transcript(&sample_transcript("t1"))
            .await
            .expect_err("💀 The restarted ledger forgot t1. Amnesia is not durability.");
        assert!(err.to_string().contains("duplicate transcript_id 't1'"));

        // ✅ A fresh id is still welcome.
        store.save_raw_transcript(&sample_transcript("t2")).await.unwrap();
        store.close().await.unwrap();

        let raw_text = std::fs::read_to_string(dir.path().join(RAW_LEDGER)).unwrap();
        assert_eq!(raw_text.lines().count(), 2);
    }

    #[tokio::test]
    async fn the_one_where_duplicates_bounce_within_a_run_too() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileStoreConfig {
            data_dir: dir.path().to_string_lossy().into_owned(),
        };
        let store = FileStore::open(&config).await.unwrap();

        store.save_processed_result(&processed_for("t1")).await.unwrap();
        let err = store
            .save_processed_result(&processed_for("t1"))
            .await
            .expect_err("💀 Two processed results for one transcript. The ledger is not a diary.");
        assert!(err.to_string().contains("processed result ledger"));
    }
}
