//! Grouping validation for streaming reads.
//!
//! The record reader groups rows by contiguity. This module checks that
//! the input actually is grouped:
//! 1. All rows for a query are contiguous (no interleaving of queries)
//! 2. Within a query, all rows for a subject are contiguous

use crate::tabular::Row;
use rustc_hash::FxHashSet;

/// Inline grouping validator for use within the reading loop.
///
/// Validation happens as rows are consumed, so the input is read only once.
#[derive(Debug, Default)]
pub struct GroupingValidator {
    prev_query: Option<String>,
    prev_subject: Option<String>,
    seen_queries: FxHashSet<String>,
    seen_subjects: FxHashSet<String>,
    row_count: usize,
}

impl GroupingValidator {
    /// Create a new grouping validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows validated so far.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Validate that the given row continues the current group or opens a
    /// new one that has not been seen before.
    pub fn validate(&mut self, row: &Row) -> Result<(), String> {
        self.row_count += 1;

        match self.prev_query.as_deref() {
            Some(query) if query == row.qseqid => {
                if let Some(subject) = self.prev_subject.as_deref() {
                    if subject != row.sseqid {
                        if self.seen_subjects.contains(&row.sseqid) {
                            return Err(format!(
                                "subject '{}' for query '{}' was seen earlier (rows for a subject must be contiguous)",
                                row.sseqid, row.qseqid
                            ));
                        }
                        self.seen_subjects.insert(subject.to_string());
                    }
                }
            }
            prev => {
                if self.seen_queries.contains(&row.qseqid) {
                    return Err(format!(
                        "query '{}' was seen earlier (rows for a query must be contiguous)",
                        row.qseqid
                    ));
                }
                if let Some(query) = prev {
                    self.seen_queries.insert(query.to_string());
                }
                self.seen_subjects.clear();
            }
        }

        if self.prev_query.as_deref() != Some(row.qseqid.as_str()) {
            self.prev_query = Some(row.qseqid.clone());
        }
        if self.prev_subject.as_deref() != Some(row.sseqid.as_str()) {
            self.prev_subject = Some(row.sseqid.clone());
        }

        Ok(())
    }
}
