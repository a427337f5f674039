//! HSP filters: prune weak HSPs from a record, then drop hits left empty.

use crate::record::{Hsp, Record};

/// A predicate over HSPs.
pub trait HspFilter {
    /// Returns true if the HSP should be kept.
    fn keep_hsp(&self, hsp: &Hsp) -> bool;

    /// Remove rejected HSPs from every hit, then remove hits without HSPs.
    ///
    /// Surviving hits and HSPs keep their order. Returns the number of HSPs
    /// removed.
    fn filter(&self, record: &mut Record) -> usize {
        let mut removed = 0;
        record.retain_hits(|hit| {
            removed += hit.retain_hsps(|hsp| self.keep_hsp(hsp));
            !hit.is_empty()
        });
        removed
    }
}

/// Keeps HSPs reaching both a percent identity and a query coverage
/// threshold.
///
/// Thresholds are not range-checked: values at or below zero keep
/// everything, values above 100 keep nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityCoverageFilter {
    pub min_pident: f64,
    pub min_qcovhsp: f64,
}

impl IdentityCoverageFilter {
    pub fn new(min_pident: f64, min_qcovhsp: f64) -> Self {
        Self {
            min_pident,
            min_qcovhsp,
        }
    }
}

impl HspFilter for IdentityCoverageFilter {
    #[inline]
    fn keep_hsp(&self, hsp: &Hsp) -> bool {
        !(hsp.pident() < self.min_pident || hsp.qcovhsp() < self.min_qcovhsp)
    }
}

impl Record {
    /// Filter this record in place, returning the number of HSPs removed.
    pub fn filter_by<F: HspFilter + ?Sized>(&mut self, filter: &F) -> usize {
        filter.filter(self)
    }
}
