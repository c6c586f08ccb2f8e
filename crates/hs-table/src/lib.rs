//! # hs-table
//!
//! Columnar tree engine for histsteer.
//!
//! Reads tree files (JSON documents mapping tree names to named numeric
//! columns), chains the same-named tree across many files into one [`Frame`],
//! evaluates string expressions over columns, and fills weighted 1-D
//! histograms.
//!
//! ## Example
//!
//! ```no_run
//! use hs_table::{ColumnExpr, HistogramDef, chain, fill_histogram};
//! use std::path::PathBuf;
//!
//! let files = vec![PathBuf::from("a.json"), PathBuf::from("b.json")];
//! let frame = chain(&files, "events").unwrap();
//! let sel = ColumnExpr::parse("pt > 20").unwrap();
//! let frame = frame.filter(&sel).unwrap();
//! let def = HistogramDef::uniform("h_pt", 50, 0.0, 500.0);
//! let value = ColumnExpr::parse("pt").unwrap();
//! let h = fill_histogram(&frame, &def, &value, None).unwrap();
//! println!("entries: {}", h.entries);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod error;
pub mod expr;
pub mod file;
pub mod fill;
pub mod frame;
pub mod session;

pub use chain::chain;
pub use error::{Result, TableError};
pub use expr::ColumnExpr;
pub use file::TreeFile;
pub use fill::{FilledHistogram, HistogramDef, fill_histogram};
pub use frame::Frame;
pub use session::Session;
