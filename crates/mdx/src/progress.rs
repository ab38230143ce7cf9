//! 📊 progress.rs — "Are we there yet?" — every pipeline, every time, forever.
//!
//! 🚀 This module answers the age-old question: "how fast are transcripts
//! moving?" With cold hard numbers, a spinner, and a table so comfy it has
//! lumbar support.
//!
//! ⚠️  The stream is unbounded, so there is no total, no percent, and no ETA.
//! A progress bar with no destination is just a speedometer. We lean into it.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::ProgressBar;

// 🔄 Rate window width. Five seconds keeps the displayed rate from looking
// like a seismograph during normal operation.
const RATE_WINDOW: Duration = Duration::from_secs(5);

/// 🔢 Formats a number with commas for the 3 people in the audience who like
/// readability. "1000000 docs" → "1,000,000 docs" — you're welcome, eyes.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ Formats a Duration into MM:SS or HH:MM:SS.
/// If it shows HH:MM:SS, you should probably call your mom. It's been a while.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📊 Shared pipeline counters plus the live terminal display.
///
/// One instance, `Arc`-shared by the producer (enqueued), every worker
/// (processed / dead-lettered), and the supervisor's render ticker. Counters
/// are atomics — the hot path pays one `fetch_add`, never a lock. The rate
/// window is the only locked state, and only the ticker touches it.
pub struct PipelineProgress {
    /// ⏱️ When this whole adventure started. Hopefully not too long ago.
    start_time: Instant,
    /// 📥 Transcripts the producer pushed into the work queue.
    enqueued: AtomicU64,
    /// ✅ Transcripts fully processed, persisted, and submitted.
    processed: AtomicU64,
    /// 🗑️ Transcripts routed to the dead-letter sink.
    dead_lettered: AtomicU64,
    /// 🎨 The terminal spinner (indicatif does the redraw magic).
    progress_bar: ProgressBar,
    /// 🔄 Sliding window of (timestamp, processed_total) for the rate math.
    /// VecDeque because we pop from the front — a bouncer for old samples.
    rate_samples: std::sync::Mutex<VecDeque<(Instant, u64)>>,
}

impl std::fmt::Debug for PipelineProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 🎭 custom Debug impl because ProgressBar is a diva and doesn't derive it
        f.debug_struct("PipelineProgress")
            .field("enqueued", &self.enqueued.load(Ordering::Relaxed))
            .field("processed", &self.processed.load(Ordering::Relaxed))
            .field("dead_lettered", &self.dead_lettered.load(Ordering::Relaxed))
            .finish()
    }
}

/// 📊 A point-in-time copy of the counters, for end-of-run reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub enqueued: u64,
    pub processed: u64,
    pub dead_lettered: u64,
}

impl PipelineProgress {
    /// 🚀 Spin up the counters and the spinner. Zero everywhere, optimism
    /// implied.
    pub fn new() -> Self {
        let start_time = Instant::now();
        let mut rate_samples = VecDeque::new();
        // 🔄 seed the window with t=0 so we don't divide by zero like animals
        rate_samples.push_back((start_time, 0u64));

        Self {
            start_time,
            enqueued: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            dead_lettered: AtomicU64::new(0),
            progress_bar: ProgressBar::new_spinner(),
            rate_samples: std::sync::Mutex::new(rate_samples),
        }
    }

    /// 📥 The producer enqueued one transcript.
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// ✅ A worker carried one transcript all the way through.
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// 🗑️ A worker gave up on one transcript.
    pub fn record_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    /// 📊 Copy the current counters out.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
        }
    }

    /// 📈 Current processing rate over the sliding window, in docs/sec.
    fn processed_per_sec(&self) -> f64 {
        let now = Instant::now();
        let processed = self.processed.load(Ordering::Relaxed);

        // 🔒 Poisoning only happens if a ticker panicked mid-render; the
        // sample deque is still perfectly usable data, so take it back.
        let mut samples = self
            .rate_samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // 🔄 evict samples older than the window from the front of the queue
        while let Some(&(timestamp, _)) = samples.front() {
            if now.duration_since(timestamp) > RATE_WINDOW && samples.len() > 1 {
                samples.pop_front();
            } else {
                break;
            }
        }
        samples.push_back((now, processed));

        if let Some(&(oldest_time, oldest_processed)) = samples.front() {
            let elapsed = now.duration_since(oldest_time).as_secs_f64();
            if elapsed > 0.0 {
                return processed.saturating_sub(oldest_processed) as f64 / elapsed;
            }
        }
        0.0
    }

    /// 🎨 Re-render the live display. Called by the supervisor's ticker,
    /// once a second; the hot path never pays for terminal drawing.
    ///
    /// Layout (3 rows x 2 cols):
    /// ```text
    /// | <docs/s>        <processed>
    /// | <enqueued>      <in flight>
    /// | <dead-lettered> <elapsed>
    /// ```
    pub fn render(&self) {
        let snap = self.snapshot();
        let rate = self.processed_per_sec();
        let in_flight = snap
            .enqueued
            .saturating_sub(snap.processed)
            .saturating_sub(snap.dead_lettered);
        let elapsed_fmt = format_duration(self.start_time.elapsed());

        // 🍽️ two columns, right-aligned, no borders (preset: NOTHING) —
        // NOTHING preset because we're minimalists. also the borders looked bad.
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![
            Cell::new(format!("{:.1} Docs/s", rate)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Processed", format_number(snap.processed)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} Enqueued", format_number(snap.enqueued)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} In flight", format_number(in_flight)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} Dead-lettered", format_number(snap.dead_lettered)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} elapsed", elapsed_fmt)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar.set_message(format!("transcript pipeline\n{table}"));
        self.progress_bar.tick();
    }

    /// ✅ Final render, then park the spinner. We made it. Or we were told to
    /// stop. Same energy, same table.
    pub fn finish(&self) {
        self.render();
        self.progress_bar.finish();
    }
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self::new()
    }
}
