//! Run configuration (YAML) parsing + semantic validation.
//!
//! One YAML file drives a whole run: global settings plus an ordered list of
//! regions. Mandatory keys are enforced by the deserializer (non-optional
//! fields); semantic checks that serde cannot express happen in
//! [`RunConfig::validate`]. The absence of `global.input_files` is
//! deliberately *not* a config error here — the pipeline reports it as the
//! distinct [`PipelineError::MissingInputPattern`] because it is the most
//! common misconfiguration and deserves its own message.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use hs_table::HistogramDef;

use crate::error::{PipelineError, Result};

/// Top-level run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Global settings shared by all regions.
    pub global: GlobalConfig,
    /// Ordered list of regions to process.
    pub regions: Vec<RegionConfig>,
}

/// The `global:` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    /// Output store path, recreated each run.
    pub output_file: PathBuf,
    /// Comma-separated glob patterns for input files.
    #[serde(default)]
    pub input_files: Option<String>,
    /// Module paths preloaded at session init.
    #[serde(default)]
    pub libraries: Vec<PathBuf>,
    /// Thread-count hint for the engine.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

/// One analysis region: a named selection over a tree, with histograms.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    /// Unique region name; also the output group key.
    pub name: String,
    /// Name of the tree within each input file.
    pub tree_name: String,
    /// Boolean selection expression (mandatory; use `1` to keep all rows).
    pub selection: String,
    /// Weight expression; absent means unweighted.
    #[serde(default)]
    pub weight: Option<String>,
    /// Derived columns, applied in order before the selection.
    #[serde(default)]
    pub extra_columns: Vec<ColumnDef>,
    /// Histograms to fill, in order. May be empty.
    pub histograms: Vec<HistogramRequest>,
}

/// A derived-column definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    /// Column name; redefining an existing name shadows it.
    pub name: String,
    /// Expression over existing (original or previously derived) columns.
    pub expression: String,
}

/// One histogram request within a region.
#[derive(Debug, Clone, Deserialize)]
pub struct HistogramRequest {
    /// Binning and axis metadata, passed to the engine verbatim.
    pub definition: HistogramDef,
    /// Expression for the value to histogram.
    pub expression: String,
}

impl RunConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let cfg: RunConfig = serde_yaml_ng::from_slice(&bytes)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Semantic checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        for region in &self.regions {
            if region.name.is_empty() {
                return Err(PipelineError::Config("region with empty name".into()));
            }
            if region.name.contains(['/', '\\']) {
                return Err(PipelineError::Config(format!(
                    "region name '{}' must not contain path separators",
                    region.name
                )));
            }
            if seen.contains(&region.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate region name '{}'",
                    region.name
                )));
            }
            seen.push(&region.name);

            if region.tree_name.is_empty() {
                return Err(PipelineError::Config(format!(
                    "region '{}': empty tree_name",
                    region.name
                )));
            }
            if region.selection.trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "region '{}': empty selection",
                    region.name
                )));
            }
            for hist in &region.histograms {
                hist.definition.bin_edges().map_err(|e| {
                    PipelineError::Config(format!("region '{}': {e}", region.name))
                })?;
            }
        }
        Ok(())
    }

    /// The configured input pattern string, or [`PipelineError::MissingInputPattern`].
    pub fn input_patterns(&self) -> Result<&str> {
        match self.global.input_files.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Ok(p),
            _ => Err(PipelineError::MissingInputPattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<RunConfig> {
        let cfg: RunConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    const MINIMAL: &str = r#"
global:
  output_file: out/store
  input_files: "data/*.json"
regions:
  - name: signal
    tree_name: events
    selection: "pt > 20"
    histograms:
      - definition: { name: h_pt, bins: 50, low: 0, high: 500 }
        expression: pt
"#;

    #[test]
    fn minimal_config_parses() {
        let cfg = parse(MINIMAL).unwrap();
        assert_eq!(cfg.regions.len(), 1);
        let r = &cfg.regions[0];
        assert_eq!(r.name, "signal");
        assert!(r.weight.is_none());
        assert!(r.extra_columns.is_empty());
        assert_eq!(r.histograms[0].definition.name, "h_pt");
        assert_eq!(cfg.input_patterns().unwrap(), "data/*.json");
    }

    #[test]
    fn missing_mandatory_keys_fail() {
        // No selection.
        let err = parse(
            r#"
global: { output_file: out }
regions:
  - name: r
    tree_name: t
    histograms: []
"#,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)), "{err}");

        // No regions key.
        assert!(parse("global: { output_file: out }").is_err());

        // No output_file.
        assert!(parse("global: {}\nregions: []").is_err());
    }

    #[test]
    fn missing_input_files_is_distinct() {
        let cfg = parse(
            r#"
global: { output_file: out }
regions: []
"#,
        )
        .unwrap();
        assert!(matches!(
            cfg.input_patterns().unwrap_err(),
            PipelineError::MissingInputPattern
        ));

        // Empty string counts as missing too.
        let cfg = parse(
            r#"
global: { output_file: out, input_files: "  " }
regions: []
"#,
        )
        .unwrap();
        assert!(matches!(
            cfg.input_patterns().unwrap_err(),
            PipelineError::MissingInputPattern
        ));
    }

    #[test]
    fn duplicate_region_names_rejected() {
        let err = parse(
            r#"
global: { output_file: out, input_files: "x" }
regions:
  - { name: r, tree_name: t, selection: "1", histograms: [] }
  - { name: r, tree_name: t, selection: "1", histograms: [] }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate region"), "{err}");
    }

    #[test]
    fn region_name_with_separator_rejected() {
        let err = parse(
            r#"
global: { output_file: out }
regions:
  - { name: "a/b", tree_name: t, selection: "1", histograms: [] }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("path separators"), "{err}");
    }

    #[test]
    fn bad_histogram_definition_rejected() {
        let err = parse(
            r#"
global: { output_file: out }
regions:
  - name: r
    tree_name: t
    selection: "1"
    histograms:
      - definition: { name: h }
        expression: x
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("binning"), "{err}");
    }

    #[test]
    fn non_finite_binning_rejected() {
        // YAML happily expresses NaN and infinity; validation must not
        // let them reach the filler.
        let err = parse(
            r#"
global: { output_file: out }
regions:
  - name: r
    tree_name: t
    selection: "1"
    histograms:
      - definition: { name: h, edges: [0, .nan, 1] }
        expression: x
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("finite"), "{err}");

        let err = parse(
            r#"
global: { output_file: out }
regions:
  - name: r
    tree_name: t
    selection: "1"
    histograms:
      - definition: { name: h, bins: 2, low: -.inf, high: .inf }
        expression: x
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("finite"), "{err}");
    }

    #[test]
    fn empty_histograms_list_is_valid() {
        let cfg = parse(
            r#"
global: { output_file: out, input_files: "x" }
regions:
  - { name: r, tree_name: t, selection: "1", histograms: [] }
"#,
        )
        .unwrap();
        assert!(cfg.regions[0].histograms.is_empty());
    }

    #[test]
    fn extra_columns_and_weight_parse() {
        let cfg = parse(
            r#"
global: { output_file: out, input_files: "x", num_threads: 4, libraries: [/tmp] }
regions:
  - name: r
    tree_name: t
    selection: "pt > 20"
    weight: "w_mc * 2"
    extra_columns:
      - { name: pt2, expression: "pt * pt" }
      - { name: pt2, expression: "pt2 + 1" }
    histograms:
      - definition: { name: h, edges: [0, 1, 5] }
        expression: pt2
"#,
        )
        .unwrap();
        let r = &cfg.regions[0];
        assert_eq!(r.weight.as_deref(), Some("w_mc * 2"));
        assert_eq!(r.extra_columns.len(), 2);
        assert_eq!(cfg.global.num_threads, Some(4));
    }
}
