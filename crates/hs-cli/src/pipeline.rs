//! Region-processing pipeline.
//!
//! One run: resolve inputs → init the engine session → create the output
//! store → process each region sequentially → finalize the store. Regions
//! share no state; each rebuilds its dataset from the full resolved file
//! set, so two regions over the same tree stay fully isolated.
//!
//! Failure policy: config and resolution errors fire before the store
//! exists, so nothing is written. Once region processing has begun, any
//! region failure aborts the whole run — a partial store (recognizable by
//! its missing manifest) is left on disk but never silently completed,
//! because partial groups are too easy to mistake for complete output
//! downstream.

use std::path::PathBuf;

use hs_table::{ColumnExpr, FilledHistogram, TableError, chain, fill_histogram};

use crate::config::{RegionConfig, RunConfig};
use crate::error::{PipelineError, Result};
use crate::resolve::resolve_patterns;
use crate::store::OutputStore;

/// Command-line knobs that modify a run without touching the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip this many rows of every chained dataset.
    pub first_event: usize,
    /// Cap the number of rows processed per region.
    pub max_events: Option<usize>,
    /// Thread-count hint; overrides `global.num_threads`.
    pub num_threads: Option<usize>,
}

/// Execute a full run.
pub fn run(cfg: &RunConfig, opts: &RunOptions) -> Result<()> {
    let patterns = cfg.input_patterns()?;
    let files = resolve_patterns(patterns)?;

    tracing::info!(n = files.len(), "input files to process:");
    for f in &files {
        tracing::info!("\t{}", f.display());
    }

    let threads = opts.num_threads.or(cfg.global.num_threads);
    hs_table::session::init(threads, &cfg.global.libraries)?;

    let mut store = OutputStore::create(&cfg.global.output_file)?;
    tracing::debug!(path = %store.root().display(), "output store created");

    for region in &cfg.regions {
        tracing::info!(region = %region.name, "processing region");
        let histograms = process_region(region, &files, opts)
            .map_err(|e| PipelineError::Region { region: region.name.clone(), source: e })?;
        store.write_region(&region.name, &histograms)?;
    }

    store.finalize()?;
    tracing::info!(path = %cfg.global.output_file.display(), "output store finalized");
    Ok(())
}

/// Assemble, derive, select, and fill every histogram of one region.
///
/// Results accumulate in an ordered collection — one entry per histogram
/// request, none dropped or overwritten, even when the list is empty.
fn process_region(
    region: &RegionConfig,
    files: &[PathBuf],
    opts: &RunOptions,
) -> std::result::Result<Vec<FilledHistogram>, TableError> {
    let mut frame = chain(files, &region.tree_name)?;
    tracing::debug!(rows = frame.n_rows(), tree = %region.tree_name, "chained dataset assembled");

    if opts.first_event > 0 || opts.max_events.is_some() {
        frame = frame.window(opts.first_event, opts.max_events);
        tracing::debug!(rows = frame.n_rows(), "event window applied");
    }

    for col in &region.extra_columns {
        let expr = ColumnExpr::parse(&col.expression)?;
        frame.define(&col.name, &expr)?;
    }

    let selection = ColumnExpr::parse(&region.selection)?;
    let frame = frame.filter(&selection)?;
    tracing::debug!(rows = frame.n_rows(), selection = %region.selection, "selection applied");

    let weight = region.weight.as_deref().map(ColumnExpr::parse).transpose()?;

    let mut results = Vec::with_capacity(region.histograms.len());
    for request in &region.histograms {
        let value = ColumnExpr::parse(&request.expression)?;
        let filled = fill_histogram(&frame, &request.definition, &value, weight.as_ref())?;
        tracing::debug!(
            name = %filled.name,
            entries = filled.entries,
            "histogram filled"
        );
        results.push(filled);
    }
    Ok(results)
}
