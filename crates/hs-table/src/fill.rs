//! Weighted 1-D histogram filling.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::expr::ColumnExpr;
use crate::frame::Frame;

/// Caller-specified binning and axis metadata for one histogram.
///
/// Exactly one binning form must be given: uniform (`bins`/`low`/`high`) or
/// explicit `edges` (strictly ascending, at least two values).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramDef {
    /// Histogram name (key within its region group).
    pub name: String,
    /// Axis title, free-form.
    #[serde(default)]
    pub title: String,
    /// Number of uniform bins.
    #[serde(default)]
    pub bins: Option<usize>,
    /// Lower axis edge for uniform binning.
    #[serde(default)]
    pub low: Option<f64>,
    /// Upper axis edge for uniform binning.
    #[serde(default)]
    pub high: Option<f64>,
    /// Explicit bin edges (alternative to uniform binning).
    #[serde(default)]
    pub edges: Option<Vec<f64>>,
}

impl HistogramDef {
    /// Shorthand for a uniform definition.
    pub fn uniform(name: &str, bins: usize, low: f64, high: f64) -> Self {
        HistogramDef {
            name: name.to_string(),
            title: String::new(),
            bins: Some(bins),
            low: Some(low),
            high: Some(high),
            edges: None,
        }
    }

    /// Resolve the definition into concrete bin edges.
    pub fn bin_edges(&self) -> Result<Vec<f64>> {
        let uniform = (self.bins, self.low, self.high);
        match (&self.edges, uniform) {
            (Some(_), (Some(_), _, _) | (_, Some(_), _) | (_, _, Some(_))) => {
                Err(self.invalid("give either edges or bins/low/high, not both"))
            }
            (Some(edges), _) => {
                if edges.len() < 2 {
                    return Err(self.invalid("edges needs at least two values"));
                }
                if edges.iter().any(|e| !e.is_finite()) {
                    return Err(self.invalid("edges must be finite"));
                }
                if edges.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(self.invalid("edges must be strictly ascending"));
                }
                Ok(edges.clone())
            }
            (None, (Some(bins), Some(low), Some(high))) => {
                if bins == 0 {
                    return Err(self.invalid("bins must be at least 1"));
                }
                if !low.is_finite() || !high.is_finite() {
                    return Err(self.invalid("low and high must be finite"));
                }
                if !(low < high) {
                    return Err(self.invalid("low must be less than high"));
                }
                let width = (high - low) / bins as f64;
                Ok((0..=bins).map(|i| low + width * i as f64).collect())
            }
            _ => Err(self.invalid("binning incomplete: need edges or bins/low/high")),
        }
    }

    fn invalid(&self, reason: &str) -> TableError {
        TableError::Definition { name: self.name.clone(), reason: reason.to_string() }
    }
}

/// One filled histogram, as persisted into the output store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilledHistogram {
    /// Histogram name.
    pub name: String,
    /// Axis title.
    pub title: String,
    /// Bin edges (length = number of bins + 1).
    pub bin_edges: Vec<f64>,
    /// Sum of weights per bin.
    pub bin_content: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sumw2: Vec<f64>,
    /// Sum of weights below the first edge.
    pub underflow: f64,
    /// Sum of weights at or above the last edge.
    pub overflow: f64,
    /// Rows that landed in a bin.
    pub entries: u64,
}

/// Fill one weighted histogram of `value` over every row of `frame`.
///
/// Weight is 1 per row when `weight` is `None`. Rows outside the axis are
/// recorded as under/overflow, not binned. An all-zero weight expression
/// yields a zero-weight histogram, not an error.
pub fn fill_histogram(
    frame: &Frame,
    def: &HistogramDef,
    value: &ColumnExpr,
    weight: Option<&ColumnExpr>,
) -> Result<FilledHistogram> {
    let edges = def.bin_edges()?;
    let n_bins = edges.len() - 1;

    let values = frame.eval(value)?;
    let weights = weight.map(|w| frame.eval(w)).transpose()?;

    let mut out = FilledHistogram {
        name: def.name.clone(),
        title: def.title.clone(),
        bin_edges: edges,
        bin_content: vec![0.0; n_bins],
        sumw2: vec![0.0; n_bins],
        underflow: 0.0,
        overflow: 0.0,
        entries: 0,
    };

    for (row, &v) in values.iter().enumerate() {
        let w = weights.as_ref().map_or(1.0, |ws| ws[row]);
        match locate_bin(&out.bin_edges, v) {
            Bin::Under => out.underflow += w,
            Bin::Over => out.overflow += w,
            Bin::At(b) => {
                out.bin_content[b] += w;
                out.sumw2[b] += w * w;
                out.entries += 1;
            }
        }
    }

    Ok(out)
}

enum Bin {
    Under,
    Over,
    At(usize),
}

/// Bin lookup over sorted finite edges; lower edge inclusive, upper
/// exclusive. [`HistogramDef::bin_edges`] guarantees finite edges, so the
/// `partial_cmp` below cannot see NaN on the edge side.
fn locate_bin(edges: &[f64], v: f64) -> Bin {
    if v < edges[0] || v.is_nan() {
        return Bin::Under;
    }
    if v >= edges[edges.len() - 1] {
        return Bin::Over;
    }
    let idx = match edges.binary_search_by(|e| e.partial_cmp(&v).unwrap()) {
        Ok(i) => i,
        Err(i) => i - 1,
    };
    Bin::At(idx.min(edges.len() - 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::from_columns(vec![
            ("x".into(), vec![0.5, 1.5, 2.5, 0.7, -1.0, 3.5]),
            ("w".into(), vec![2.0, 3.0, 1.0, 1.0, 5.0, 5.0]),
        ])
        .unwrap()
    }

    #[test]
    fn unweighted_fill() {
        let def = HistogramDef::uniform("h", 3, 0.0, 3.0);
        let v = ColumnExpr::parse("x").unwrap();
        let h = fill_histogram(&frame(), &def, &v, None).unwrap();
        assert_eq!(h.bin_content, vec![2.0, 1.0, 1.0]);
        assert_eq!(h.underflow, 1.0);
        assert_eq!(h.overflow, 1.0);
        assert_eq!(h.entries, 4);
    }

    #[test]
    fn weighted_fill_tracks_sumw2() {
        let def = HistogramDef::uniform("h", 3, 0.0, 3.0);
        let v = ColumnExpr::parse("x").unwrap();
        let w = ColumnExpr::parse("w").unwrap();
        let h = fill_histogram(&frame(), &def, &v, Some(&w)).unwrap();
        assert_eq!(h.bin_content, vec![3.0, 3.0, 1.0]);
        assert_eq!(h.sumw2, vec![5.0, 9.0, 1.0]);
        assert_eq!(h.underflow, 5.0);
        assert_eq!(h.overflow, 5.0);
    }

    #[test]
    fn zero_weight_everywhere_is_not_an_error() {
        let def = HistogramDef::uniform("h", 3, 0.0, 3.0);
        let v = ColumnExpr::parse("x").unwrap();
        let w = ColumnExpr::parse("0").unwrap();
        let h = fill_histogram(&frame(), &def, &v, Some(&w)).unwrap();
        assert_eq!(h.bin_content, vec![0.0, 0.0, 0.0]);
        // Rows still land in bins; their weight is just zero.
        assert_eq!(h.entries, 4);
    }

    #[test]
    fn expression_valued_variable() {
        let def = HistogramDef::uniform("h", 2, 0.0, 10.0);
        let v = ColumnExpr::parse("x * 2").unwrap();
        let h = fill_histogram(&frame(), &def, &v, None).unwrap();
        assert_eq!(h.bin_content, vec![3.0, 2.0]);
    }

    #[test]
    fn empty_frame_fills_empty_histogram() {
        let f = Frame::from_columns(vec![("x".into(), vec![])]).unwrap();
        let def = HistogramDef::uniform("h", 2, 0.0, 1.0);
        let v = ColumnExpr::parse("x").unwrap();
        let h = fill_histogram(&f, &def, &v, None).unwrap();
        assert_eq!(h.entries, 0);
        assert_eq!(h.bin_content, vec![0.0, 0.0]);
    }

    #[test]
    fn explicit_edges() {
        let def = HistogramDef {
            name: "h".into(),
            title: String::new(),
            bins: None,
            low: None,
            high: None,
            edges: Some(vec![0.0, 1.0, 4.0]),
        };
        let v = ColumnExpr::parse("x").unwrap();
        let h = fill_histogram(&frame(), &def, &v, None).unwrap();
        assert_eq!(h.bin_content, vec![2.0, 3.0]);
        assert_eq!(h.overflow, 0.0);
    }

    #[test]
    fn uniform_edges_cover_range() {
        let def = HistogramDef::uniform("h", 4, 0.0, 2.0);
        let edges = def.bin_edges().unwrap();
        assert_eq!(edges.len(), 5);
        assert_eq!(edges[0], 0.0);
        assert_eq!(edges[4], 2.0);
    }

    #[test]
    fn definition_validation() {
        let mut def = HistogramDef::uniform("h", 0, 0.0, 1.0);
        assert!(def.bin_edges().is_err());

        def = HistogramDef::uniform("h", 2, 1.0, 1.0);
        assert!(def.bin_edges().is_err());

        // Both forms at once.
        def = HistogramDef::uniform("h", 2, 0.0, 1.0);
        def.edges = Some(vec![0.0, 1.0]);
        assert!(def.bin_edges().is_err());

        // Neither form.
        def = HistogramDef {
            name: "h".into(),
            title: String::new(),
            bins: None,
            low: None,
            high: None,
            edges: None,
        };
        assert!(def.bin_edges().is_err());

        // Unsorted edges.
        def.edges = Some(vec![0.0, 2.0, 1.0]);
        assert!(def.bin_edges().is_err());
    }

    #[test]
    fn non_finite_binning_rejected() {
        // NaN compares false everywhere, so the ascending check alone
        // would let it through; it must be rejected outright.
        let mut def = HistogramDef {
            name: "h".into(),
            title: String::new(),
            bins: None,
            low: None,
            high: None,
            edges: Some(vec![0.0, f64::NAN, 1.0]),
        };
        let err = def.bin_edges().unwrap_err();
        assert!(err.to_string().contains("finite"), "{err}");

        def.edges = Some(vec![0.0, f64::INFINITY]);
        assert!(def.bin_edges().is_err());

        // Infinite uniform bounds satisfy low < high but would produce
        // NaN interior edges.
        let def = HistogramDef::uniform("h", 2, f64::NEG_INFINITY, f64::INFINITY);
        assert!(def.bin_edges().is_err());

        let def = HistogramDef::uniform("h", 2, f64::NAN, 1.0);
        assert!(def.bin_edges().is_err());

        // Filling with such a definition errors instead of panicking.
        let frame = Frame::from_columns(vec![("x".into(), vec![0.5])]).unwrap();
        let bad = HistogramDef {
            name: "h".into(),
            title: String::new(),
            bins: None,
            low: None,
            high: None,
            edges: Some(vec![0.0, f64::NAN, 1.0]),
        };
        let v = ColumnExpr::parse("x").unwrap();
        assert!(fill_histogram(&frame, &bad, &v, None).is_err());
    }

    #[test]
    fn lower_edge_inclusive_upper_exclusive() {
        let edges = vec![0.0, 1.0, 2.0];
        assert!(matches!(locate_bin(&edges, 0.0), Bin::At(0)));
        assert!(matches!(locate_bin(&edges, 1.0), Bin::At(1)));
        assert!(matches!(locate_bin(&edges, 2.0), Bin::Over));
        assert!(matches!(locate_bin(&edges, -0.1), Bin::Under));
    }
}
