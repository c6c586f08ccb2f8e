//! Hierarchical output store.
//!
//! The store is a directory, recreated at the start of every run. Each
//! region writes one document under `regions/` holding its filled histograms
//! in declaration order. Finalization writes `meta.json` (run metadata) and
//! `manifest.json` (sorted file list with sizes and sha256 digests) and
//! consumes the store — a finalized store cannot be written to again, and a
//! store without a manifest is recognizably a partial run.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use hs_table::FilledHistogram;

use crate::error::{PipelineError, Result};

/// Store format version recorded in the manifest.
const STORE_VERSION: u32 = 1;

/// A writable output store.
///
/// Lifecycle: [`create`](Self::create) → [`write_region`](Self::write_region)
/// once per region → [`finalize`](Self::finalize). `finalize` takes the
/// store by value, so writes after finalization are unrepresentable.
#[derive(Debug)]
pub struct OutputStore {
    root: PathBuf,
    regions: Vec<String>,
    n_histograms: usize,
}

#[derive(Debug, Serialize)]
struct RegionDocument<'a> {
    region: &'a str,
    histograms: &'a [FilledHistogram],
}

#[derive(Debug, Serialize)]
struct Manifest {
    store_version: u32,
    files: Vec<ManifestFile>,
}

#[derive(Debug, Serialize)]
struct ManifestFile {
    path: String,
    bytes: u64,
    sha256: String,
}

#[derive(Debug, Serialize)]
struct Meta {
    tool: String,
    tool_version: String,
    created_unix_ms: u128,
    regions: Vec<String>,
    n_histograms: usize,
}

impl OutputStore {
    /// Create a fresh store at `path`, replacing anything already there.
    pub fn create(path: &Path) -> Result<Self> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)?;
        } else if path.exists() {
            std::fs::remove_file(path)?;
        }
        std::fs::create_dir_all(path.join("regions"))?;
        Ok(OutputStore { root: path.to_path_buf(), regions: Vec::new(), n_histograms: 0 })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one region group with its histograms, in the given order.
    ///
    /// A region may be written at most once per run.
    pub fn write_region(&mut self, name: &str, histograms: &[FilledHistogram]) -> Result<()> {
        if self.regions.iter().any(|r| r == name) {
            return Err(PipelineError::Store(format!("region '{name}' already written")));
        }
        let doc = RegionDocument { region: name, histograms };
        let path = self.root.join("regions").join(format!("{name}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(&doc).map_err(io_like)?)?;
        self.regions.push(name.to_string());
        self.n_histograms += histograms.len();
        Ok(())
    }

    /// Flush metadata and close the store.
    pub fn finalize(self) -> Result<()> {
        let created_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PipelineError::Store(e.to_string()))?
            .as_millis();
        let meta = Meta {
            tool: "histsteer".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            created_unix_ms,
            regions: self.regions,
            n_histograms: self.n_histograms,
        };
        std::fs::write(
            self.root.join("meta.json"),
            serde_json::to_string_pretty(&meta).map_err(io_like)?,
        )?;

        let mut files = Vec::new();
        for path in walk_files(&self.root)? {
            if path.file_name().and_then(|s| s.to_str()) == Some("manifest.json") {
                continue;
            }
            let bytes = std::fs::metadata(&path)?.len();
            let sha256 = sha256_file(&path)?;
            let rel = path.strip_prefix(&self.root).unwrap_or(&path);
            files.push(ManifestFile {
                path: rel.display().to_string(),
                bytes,
                sha256,
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let manifest = Manifest { store_version: STORE_VERSION, files };
        std::fs::write(
            self.root.join("manifest.json"),
            serde_json::to_string_pretty(&manifest).map_err(io_like)?,
        )?;
        Ok(())
    }
}

fn io_like(e: serde_json::Error) -> PipelineError {
    PipelineError::Store(e.to_string())
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut h = Sha256::new();
    h.update(std::fs::read(path)?);
    let out = h.finalize();
    let mut s = String::with_capacity(64);
    for b in out {
        s.push_str(&format!("{:02x}", b));
    }
    Ok(s)
}

fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let p = entry?.path();
        if p.is_dir() {
            out.extend(walk_files(&p)?);
        } else {
            out.push(p);
        }
    }
    Ok(out)
}
