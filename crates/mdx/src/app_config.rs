//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the
//! fridge. In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
///
/// 🎯 Everything the pipeline needs to know about itself: where the upstream
/// lives, where records land, and how many workers to unleash.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Upstream API coordinates and credentials.
    pub api: ApiConfig,
    /// 🗄️ Where raw transcripts and processed results get persisted.
    pub store: StoreConfig,
    /// 🧵 Concurrency and queue knobs. Configurable, unlike my children.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 📡 Everything needed to talk to the transcript service: a key, an address,
/// and a pain tolerance (expressed in retry attempts).
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// 🔒 The API key exchanged for a bearer token at startup. If this is in
    /// plaintext in your config file, I've already filed a complaint with the
    /// Department of Security Choices.
    pub api_key: String,
    /// 📡 Base URL of the upstream service. Include scheme + port. Yes, all
    /// of it. Yes, I know it worked in dev without the scheme. I know.
    pub base_url: String,
    /// 🔄 Total attempts for retryable calls (authenticate, submit).
    /// 3 means: try, try again, try one more time, then go lie down.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// ⏱️ Per-request timeout for unary calls, in seconds. The streaming read
    /// is exempt — streams are long-term relationships.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// 🔄 3 attempts — enough to ride out a hiccup, not enough to DDoS anyone.
fn default_max_retries() -> usize {
    3
}

// ⏱️ 60 seconds — the upstream has until one full minute of my life to answer.
fn default_request_timeout_secs() -> u64 {
    60
}

/// 🗄️ The many homes a record can have — a polymorphic casting call for
/// storage destinations, resolved into a `StoreBackend` at startup.
#[derive(Debug, Deserialize, Clone)]
pub enum StoreConfig {
    /// 🧪 RAM only. Gone when the process is. Tests love it; ops should not.
    InMemory,
    /// 📂 Append-only NDJSON files under a data directory. Durable enough to
    /// survive a restart, simple enough to `grep` during an incident.
    File(FileStoreConfig),
}

/// 📂 Config for the file-backed store. One directory, two ledgers.
#[derive(Debug, Deserialize, Clone)]
pub struct FileStoreConfig {
    /// 📂 Directory for `raw_transcripts.ndjson` and `processed_results.ndjson`.
    /// Created if missing. Not created if the filesystem has other plans.
    pub data_dir: String,
}

/// 🧵 Runtime knobs: how wide the worker pool is and how much backpressure
/// the work queue applies before the producer takes a nap.
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// 🧵 Worker pool size. 20 workers, one queue, zero mercy.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// 📦 Bounded work queue capacity. When it's full, the producer waits.
    /// That's not a bug. That's the entire point.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

// 🧵 20 workers — matches what the upstream service can take before it starts
// sending us passive-aggressive 429s.
fn default_concurrency() -> usize {
    20
}

// 📦 1000 queued transcripts — roughly "a busy minute" of headroom.
fn default_queue_capacity() -> usize {
    1000
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power
/// of hoping.
///
/// 🔧 Merges environment variables (MDX_*, `__` splits nesting, so
/// `MDX_API__API_KEY` lands in `api.api_key`) with an optional TOML file.
/// TOML wins on conflicts.
///
/// 📐 DESIGN NOTE (no cap, this is tribal knowledge):
///   - If `config_file_name` is None  → env vars only. No file. No assumptions.
///   - If `config_file_name` is Some  → env vars + TOML file, merged.
///
/// 💀 Returns an error if config is unparseable. Which it will be. Check the
/// error message though — it's contextual, informative, and written with
/// love. Or despair. Hard to tell at 3am.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    // 🏗️ Start with env vars as the base layer — like a good sourdough starter.
    let config = Figment::new().merge(Env::prefixed("MDX_").split("__"));

    // 🎯 Conditionally layer in TOML only if a file was actually provided.
    // No file? No problem. We trust the env. Like a golden retriever trusts everyone.
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (MDX_*). \
             The file exists in our hearts, but apparently not on disk.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (MDX_*). \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_test_config(contents: &str) -> std::path::PathBuf {
        let timestamp_of_questionable_life_choices = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("💀 Clock went backwards. Time is a flat bug report.")
            .as_nanos();
        let temp_path = std::env::temp_dir().join(format!(
            "mdx_app_config_{timestamp_of_questionable_life_choices}.toml"
        ));

        // 🧪 We write a real file here because Figment wants TOML from disk, like it's method acting.
        fs::write(&temp_path, contents)
            .expect("💀 Failed to write test config. The filesystem said 'new phone who dis'.");
        temp_path
    }

    #[test]
    fn the_one_where_every_knob_finds_its_socket() {
        let config_path = write_test_config(
            r#"
            [api]
            api_key = "candidate-api-key"
            base_url = "https://transcripts.example/api"
            max_retries = 5
            request_timeout_secs = 30

            [store.File]
            data_dir = "/var/lib/mdx"

            [runtime]
            concurrency = 4
            queue_capacity = 64
            "#,
        );

        let app_config = load_config(Some(config_path.as_path()))
            .expect("💀 A fully specified config should parse. This is the easy mode.");

        assert_eq!(app_config.api.api_key, "candidate-api-key");
        assert_eq!(app_config.api.max_retries, 5);
        assert_eq!(app_config.api.request_timeout_secs, 30);
        assert_eq!(app_config.runtime.concurrency, 4);
        assert_eq!(app_config.runtime.queue_capacity, 64);
        match app_config.store {
            StoreConfig::File(file_config) => {
                assert_eq!(file_config.data_dir, "/var/lib/mdx");
            }
            honestly_who_knows => panic!(
                "💀 Expected a File store config, but serde took us to {:?}. Plot twist energy.",
                honestly_who_knows
            ),
        }

        fs::remove_file(config_path)
            .expect("💀 Failed to remove test config. Even the trash has trust issues.");
    }

    #[test]
    fn the_one_where_defaults_show_up_uninvited_but_helpful() {
        let config_path = write_test_config(
            r#"
            store = "InMemory"

            [api]
            api_key = "k"
            base_url = "https://transcripts.example/api"
            "#,
        );

        let app_config = load_config(Some(config_path.as_path()))
            .expect("💀 Default-laden config should parse. Serde left us on read otherwise.");

        assert_eq!(app_config.api.max_retries, 3);
        assert_eq!(app_config.api.request_timeout_secs, 60);
        assert_eq!(app_config.runtime.concurrency, 20);
        assert_eq!(app_config.runtime.queue_capacity, 1000);
        assert!(matches!(app_config.store, StoreConfig::InMemory));

        fs::remove_file(config_path)
            .expect("💀 Failed to remove test config. The janitor quit mid-scene.");
    }
}
