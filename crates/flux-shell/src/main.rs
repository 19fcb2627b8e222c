//! Flux Shell
//!
//! Headless harness around the content blocker. Sets up logging, loads the
//! persisted policy, and classifies URLs given as arguments (or stdin lines
//! when run without arguments), printing one decision per URL. The summary
//! line at the end is what the browser's status bar shows when it polls the
//! blocked count.

use anyhow::Result;
use flux_blocker::{ContentBlocker, RequestContext, ResourceType};
use std::io::BufRead;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

mod settings;

use settings::BlockerSettings;

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    // Initialize logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    info!("Flux shell starting...");

    let settings = BlockerSettings::load();
    // First run: persist the defaults, like the browser does
    if !settings::config_path().exists() {
        if let Err(e) = settings.save() {
            warn!("Could not save default settings: {e:#}");
        }
    }

    let blocker = ContentBlocker::new()?;
    settings.apply_to(&blocker);

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        info!("No URLs on the command line, reading from stdin");
        classify_lines(&blocker, std::io::stdin().lock())?;
    } else {
        for url in &urls {
            classify_one(&blocker, url);
        }
    }

    let stats = blocker.stats();
    info!(
        "{} of {} requests blocked ({} ads, {} trackers)",
        stats.blocked, stats.total_requests, stats.ads_blocked, stats.trackers_blocked
    );

    Ok(())
}

/// Classify each non-empty line of the reader.
fn classify_lines(blocker: &ContentBlocker, reader: impl BufRead) -> Result<()> {
    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        classify_one(blocker, url);
    }
    Ok(())
}

/// Classify a single URL and print the decision.
fn classify_one(blocker: &ContentBlocker, url: &str) {
    let context = RequestContext {
        resource_type: ResourceType::from_path(url),
    };
    let decision = blocker.classify_with_context(url, Some(&context));
    println!("{decision}\t{url}");
}
