// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! hspkit: grouped access to tabular alignment-search output
//!
//! This library reads the fifteen-column tabular output of pairwise
//! alignment searches, one HSP per line, and rebuilds it as a hierarchy of
//! query [`Record`]s, subject [`Hit`]s and [`Hsp`]s.
//!
//! # Features
//!
//! - **Streaming I/O**: records are grouped on the fly, one query at a time
//! - **Ranking**: order hits by their best HSP and pick the best hit
//! - **Filtering**: drop HSPs below identity/coverage thresholds
//!
//! The search must be run with the output format in [`tabular::OUTFMT`].
//!
//! # Example
//!
//! ```rust,no_run
//! use hspkit::prelude::*;
//!
//! let input = TabularFile::open("hits.tsv", OpenMode::Read).unwrap();
//! let filter = IdentityCoverageFilter::new(90.0, 80.0);
//!
//! for record in RecordReader::new(input).unwrap() {
//!     let mut record = record.unwrap();
//!     record.filter_by(&filter);
//!     if let Some(best) = record.best_by(&BestHspRanking) {
//!         println!("{}\t{}", record.qseqid(), best.sseqid());
//!     }
//! }
//! ```

pub mod config;
pub mod filtering;
pub mod parsing;
pub mod ranking;
pub mod reader;
pub mod record;
pub mod tabular;
pub mod validation;
pub mod writer;

// Re-export commonly used types
pub use reader::RecordReader;
pub use record::{Hit, Hsp, Record};
pub use tabular::{HspError, Result, Row, RowChannel};
pub use writer::RecordWriter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::filtering::{HspFilter, IdentityCoverageFilter};
    pub use crate::ranking::{BestHspRanking, HitRanking};
    pub use crate::reader::RecordReader;
    pub use crate::record::{Hit, Hsp, Record};
    pub use crate::tabular::{
        HspError, OpenMode, Row, RowChannel, TabularFile, TabularReader, TabularWriter,
    };
    pub use crate::writer::RecordWriter;
}
