//! # Previously, on Mordex...
//!
//! 🎬 The records needed somewhere to live. Somewhere fast. Somewhere with no
//! disk, no fsync, no survivors after process exit. Somewhere, in short,
//! entirely unsuitable for production and perfect for tests.
//!
//! That somewhere was this module.
//!
//! [`InMemoryStore`] keeps both ledgers in `Mutex`-guarded maps behind `Arc`s,
//! so a test can clone the store, hand it to the pipeline, and then peek
//! inside to see what actually got written — great for assertions, great for
//! trust issues, great for both.
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. If you're deploying this to prod, please
//! also deploy a therapist.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::common::{ProcessedResult, Transcript};
use crate::storage::Store;

/// 📦 A store that never forgets. Until the process exits. Then it forgets
/// everything at once, which is arguably a kind of work-life balance.
///
/// Clone-able because tests need to peek inside after handing a copy off to
/// the worker pool. The `Arc`s mean every clone shares the same maps.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    /// 🔒 The raw ledger: transcript_id → the transcript, verbatim.
    raw: Arc<tokio::sync::Mutex<HashMap<String, Transcript>>>,
    /// 🔒 The processed ledger: transcript_id → the derived result.
    processed: Arc<tokio::sync::Mutex<HashMap<String, ProcessedResult>>>,
    /// 📜 Insertion order of processed results. The maps shrug at ordering
    /// questions; this Vec answers them, which is exactly what a test
    /// asserting "t1 before t2" needs.
    processed_order: Arc<tokio::sync::Mutex<Vec<String>>>,
}

impl InMemoryStore {
    /// 🚀 A fresh store: two empty maps, full of potential, unmarred by data.
    /// This is the most hopeful they will ever be. Downhill from here.
    pub fn new() -> Self {
        Self::default()
    }

    /// 🧪 How many raw transcripts landed. For assertions.
    pub async fn raw_count(&self) -> usize {
        self.raw.lock().await.len()
    }

    /// 🧪 How many processed results landed. For assertions.
    pub async fn processed_count(&self) -> usize {
        self.processed.lock().await.len()
    }

    /// 🧪 Processed transcript ids, in the order they were saved.
    pub async fn processed_order(&self) -> Vec<String> {
        self.processed_order.lock().await.clone()
    }

    /// 🧪 Fetch one processed result back out, if it exists.
    pub async fn get_processed(&self, transcript_id: &str) -> Option<ProcessedResult> {
        self.processed.lock().await.get(transcript_id).cloned()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn save_raw_transcript(&self, transcript: &Transcript) -> Result<()> {
        let mut raw = self.raw.lock().await;
        if raw.contains_key(&transcript.transcript_id) {
            // 💀 Same key, second visit. The ledger does not do reruns.
            bail!(
                "duplicate transcript_id '{}' in raw transcript store",
                transcript.transcript_id
            );
        }
        raw.insert(transcript.transcript_id.clone(), transcript.clone());
        Ok(())
    }

    async fn save_processed_result(&self, result: &ProcessedResult) -> Result<()> {
        let mut processed = self.processed.lock().await;
        if processed.contains_key(&result.transcript_id) {
            bail!(
                "duplicate transcript_id '{}' in processed result store",
                result.transcript_id
            );
        }
        processed.insert(result.transcript_id.clone(), result.clone());
        self.processed_order
            .lock()
            .await
            .push(result.transcript_id.clone());
        Ok(())
    }

    /// 🗑️ Closes with all the ceremony of closing a browser tab. We live in
    /// RAM; when this drops, the OS reclaims everything faster than HR
    /// reclaims your badge on your last day.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_fixtures::sample_transcript;
    use crate::common::Analysis;
    use crate::common::ProcessedResult;
    use crate::processing::extractor::extract_structured_data;

    fn processed_for(id: &str) -> ProcessedResult {
        let t = sample_transcript(id);
        let analysis = Analysis::new(0.5, "high".into(), "medium".into(), vec![]).unwrap();
        ProcessedResult::assemble(&t, "a summary".into(), extract_structured_data(&t), analysis)
            .unwrap()
    }

    #[tokio::test]
    async fn the_one_where_the_same_key_cannot_check_in_twice() {
        let store = InMemoryStore::new();
        let t = sample_transcript("t1");

        store.save_raw_transcript(&t).await.unwrap();
        let err = store
            .save_raw_transcript(&t)
            .await
            .expect_err("💀 A duplicate raw save went through. The constraint was decorative.");
        assert!(err.to_string().contains("duplicate transcript_id 't1'"));
        assert_eq!(store.raw_count().await, 1);

        store.save_processed_result(&processed_for("t1")).await.unwrap();
        let err = store
            .save_processed_result(&processed_for("t1"))
            .await
            .expect_err("💀 A duplicate processed save went through too. A theme develops.");
        assert!(err.to_string().contains("duplicate"));
        assert_eq!(store.processed_count().await, 1);
    }

    #[tokio::test]
    async fn the_one_where_clones_share_one_memory() {
        // 🧪 Clone first, write through the clone, read through the original.
        let store = InMemoryStore::new();
        let observer = store.clone();

        store.save_processed_result(&processed_for("t1")).await.unwrap();
        store.save_processed_result(&processed_for("t2")).await.unwrap();

        assert_eq!(observer.processed_order().await, vec!["t1", "t2"]);
        assert!(observer.get_processed("t1").await.is_some());
        assert!(observer.get_processed("t9").await.is_none());
    }
}
