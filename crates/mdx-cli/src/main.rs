//! 🚀 mdx-cli — the front door, the bouncer, the maitre d' of mordex.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the real code do the heavy lifting.
//! Like a manager. 🦆

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 🚀 main() — where it all begins. The genesis. The big bang.
/// The "I pressed Enter and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args (or don't, we're not picky)
/// 3. Load config (the moment of truth)
/// 4. Run the thing (send it and pray 🙏)
/// 5. Handle errors (cry)
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 Set up tracing — because println! debugging is a lifestyle choice
    // we're trying to move past, like flip phones and cargo shorts
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 🎯 One optional arg: the config file path. Default: the ol' reliable.
    let args: Vec<String> = std::env::args().collect();
    let path_arg = match args.get(1) {
        Some(s) => s.as_str(),
        None => "mdx.toml",
    };

    // 🔒 Validate the config file exists before we get too emotionally attached.
    // Missing file is fine — env vars might carry the whole config on their own.
    let config_file = std::path::Path::new(path_arg);
    let config_file_if_it_exists = match config_file.try_exists().context(format!(
        "💀 Could not even check whether the configuration file exists. Maybe it's a \
         pwd/cwd relative-path issue — use an absolute path, to be absolutely certain. \
         Was checking here: '{}'",
        config_file.display()
    ))? {
        true => Some(config_file),
        false => None,
    };

    // 🔧 Load the config — this is the moment where we find out if the TOML is valid
    // or if someone put a tab where a space should be (looking at you, Kevin)
    let app_config = mdx::app_config::load_config(config_file_if_it_exists).context(
        "💀 Couldn't load the configuration. Take a look at the file and the MDX_* \
         environment, and make sure you didn't forget something obvious",
    )?;

    // 🚀 SEND IT. Streams until SIGINT/SIGTERM, then drains and reports.
    let result = mdx::run(app_config).await;

    match result {
        Ok(report) => {
            // ✅ If we got here, the pipeline drained cleanly. Pop the champagne. 🍾
            info!(
                enqueued = report.enqueued,
                processed = report.processed,
                dead_lettered = report.dead_lettered,
                "🏁 mordex finished"
            );
            Ok(())
        }
        Err(err) => {
            // 💀 Error handling: the part where we find out what went wrong
            // and print it in a way that's helpful at 3am
            error!("💀 error: {}", err);
            // 🧅 peel the onion of sadness, one tear-jerking layer at a time
            let mut the_vibes_are_giving_connection_issues = false;
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
                // 🕵️ sniff the cause like a truffle pig hunting for connection problems
                let cause_str = cause.to_string();
                if cause_str.contains("error sending request")
                    || cause_str.contains("connection refused")
                    || cause_str.contains("Connection refused")
                    || cause_str.contains("tcp connect error")
                    || cause_str.contains("dns error")
                {
                    the_vibes_are_giving_connection_issues = true;
                }
            }

            // 📡 if it smells like a connection problem, it's probably a connection problem
            // like when your wifi icon has full bars but nothing loads
            if the_vibes_are_giving_connection_issues {
                error!(
                    "🔧 hint: looks like the transcript service isn't reachable. \
                    Double-check the base_url in your config, and that the upstream \
                    is actually up — its /v1/health endpoint is a good first knock. \
                    Even servers need a nudge sometimes. ☕"
                );
            }

            // 🗑️ Exit with prejudice. Process exitus maximus.
            std::process::exit(1);
        }
    }
}
