//! Streaming group-by reader: rows in, [`Record`]s out.
//!
//! # Algorithm
//!
//! Rows are consumed one at a time while a single pending record is held:
//! 1. With no pending record, start one from the row's query
//! 2. If the row's query matches the pending record, append its HSP
//!    (into the last hit when the subject matches, else into a new hit)
//! 3. If not, the pending record is complete: emit it and start a new one
//!    from the current row
//! 4. At end of input, emit the pending record if there is one
//!
//! # Memory Complexity
//!
//! O(h) where h = HSPs of the largest query; the file is never materialized.
//!
//! # Requirements
//!
//! Rows for one query, and for one subject within a query, must be
//! adjacent. Non-adjacent rows are not merged: they produce a separate
//! record (or hit). Strict grouping turns that case into an error.

use crate::config::is_strict_grouping;
use crate::record::Record;
use crate::tabular::{HspError, Result, RowChannel};
use crate::validation::GroupingValidator;
use std::fmt;

/// Outcome of a single [`RecordReader::step`].
#[derive(Debug)]
pub enum Step {
    /// A row was absorbed into the pending record.
    Pending,
    /// A record is complete.
    Complete(Record),
    /// Input is exhausted and no record is pending.
    Exhausted,
}

/// Statistics from reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadStats {
    pub rows_read: usize,
    pub records_read: usize,
}

impl fmt::Display for ReadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows_read={}, records_read={}",
            self.rows_read, self.records_read
        )
    }
}

/// Groups the rows of a readable channel into records.
pub struct RecordReader<C: RowChannel> {
    channel: C,
    pending: Option<Record>,
    validator: Option<GroupingValidator>,
    stats: ReadStats,
    done: bool,
}

impl<C: RowChannel> RecordReader<C> {
    /// Create a reader over a readable channel.
    ///
    /// Strict grouping follows [`crate::config::is_strict_grouping`].
    pub fn new(channel: C) -> Result<Self> {
        if !channel.readable() {
            return Err(HspError::Precondition(format!(
                "{} is not readable",
                channel.name()
            )));
        }
        Ok(Self {
            channel,
            pending: None,
            validator: is_strict_grouping().then(GroupingValidator::new),
            stats: ReadStats::default(),
            done: false,
        })
    }

    /// Enable or disable strict grouping for this reader.
    pub fn strict(mut self, enabled: bool) -> Self {
        self.validator = enabled.then(GroupingValidator::new);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.validator.is_some()
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    /// Give back the channel, positioned after the last row read.
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Advance by one row.
    pub fn step(&mut self) -> Result<Step> {
        let Some(row) = self.channel.read_row()? else {
            return Ok(match self.pending.take() {
                Some(record) => {
                    self.stats.records_read += 1;
                    tracing::debug!(source = self.channel.name(), stats = %self.stats, "end of input");
                    Step::Complete(record)
                }
                None => Step::Exhausted,
            });
        };
        self.stats.rows_read += 1;

        if let Some(validator) = self.validator.as_mut() {
            validator
                .validate(&row)
                .map_err(|message| HspError::Grouping {
                    source_name: self.channel.name().to_string(),
                    line: self.channel.line_number(),
                    message,
                })?;
        }

        let boundary = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.qseqid() != row.qseqid);
        let completed = if boundary { self.pending.take() } else { None };

        let pending = self
            .pending
            .get_or_insert_with(|| Record::new(row.qseqid.as_str(), row.qlen));
        pending.create(&row.sseqid, row.slen, row.hsp);

        Ok(match completed {
            Some(record) => {
                self.stats.records_read += 1;
                tracing::trace!(qseqid = record.qseqid(), hits = record.count(), "record complete");
                Step::Complete(record)
            }
            None => Step::Pending,
        })
    }

    /// Read the next complete record, or `None` at end of input.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            match self.step()? {
                Step::Pending => continue,
                Step::Complete(record) => return Ok(Some(record)),
                Step::Exhausted => return Ok(None),
            }
        }
    }
}

impl<C: RowChannel> Iterator for RecordReader<C> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
