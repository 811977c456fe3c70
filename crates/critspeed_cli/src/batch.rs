use crate::config::{run_config, ConfigFormat};
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    /// Config path and error chain of every failed run.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// All configuration files (`*.toml`, `*.yaml`, `*.yml`) below `dir`, sorted.
pub fn discover_configs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory {}", current.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read entry in {}", current.display()))?
                .path();
            if path.is_dir() {
                pending.push(path);
            } else if ConfigFormat::from_path(&path).is_some() {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Runs every config under `dir` on a pool of `workers` threads.
///
/// A failing config is recorded in the summary and never stops the others.
pub fn run_batch(dir: &Path, workers: usize) -> Result<BatchSummary> {
    let configs = discover_configs(dir)?;
    if configs.is_empty() {
        bail!(
            "No configuration files ({}) found under {}",
            ConfigFormat::EXTENSIONS.join(", "),
            dir.display()
        );
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .context("Failed to build batch thread pool")?;

    let total = configs.len();
    log::info!(
        "Processing {total} configurations on {} workers",
        pool.current_num_threads()
    );
    let completed = AtomicUsize::new(0);

    let outcomes: Vec<(PathBuf, Result<PathBuf>)> = pool.install(|| {
        configs
            .par_iter()
            .map(|path| {
                let outcome = run_config(path, None);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                log::info!("[{done}/{total}] {}", path.display());
                (path.clone(), outcome)
            })
            .collect()
    });

    let mut summary = BatchSummary::default();
    for (path, outcome) in outcomes {
        summary.processed += 1;
        match outcome {
            Ok(_) => summary.succeeded += 1,
            Err(err) => {
                log::error!("{}: {err:#}", path.display());
                summary.failed.push((path, format!("{err:#}")));
            }
        }
    }

    log::info!(
        "Batch finished: {} processed, {} succeeded, {} failed",
        summary.processed,
        summary.succeeded,
        summary.failed.len()
    );
    Ok(summary)
}
