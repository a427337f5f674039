//! Ranking strategies for the hits of a record.
//!
//! A strategy reduces each hit to a representative HSP and orders hits by
//! comparing representatives. Sorting is stable, so hits that compare equal
//! keep the order they were added in.

use crate::record::{Hit, Hsp, Record};
use std::cmp::Ordering;

/// A total order over the hits of one record.
pub trait HitRanking {
    /// The HSP that stands for the whole hit, or `None` for an empty hit.
    fn representative<'a>(&self, hit: &'a Hit) -> Option<&'a Hsp>;

    /// Order two representatives; `Less` means `a` ranks first.
    fn compare_hsps(&self, a: &Hsp, b: &Hsp) -> Ordering;

    /// Order two hits. Empty hits rank after every non-empty hit and
    /// compare equal to each other.
    fn compare_hits(&self, a: &Hit, b: &Hit) -> Ordering {
        match (self.representative(a), self.representative(b)) {
            (Some(x), Some(y)) => self.compare_hsps(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Stable in-place sort of the record's hits.
    fn sort(&self, record: &mut Record) {
        record.sort_hits_by(|a, b| self.compare_hits(a, b));
    }

    /// The first hit under this order, or `None` if the record is empty.
    fn best<'a>(&self, record: &'a Record) -> Option<&'a Hit> {
        record
            .hits()
            .iter()
            .filter(|hit| !hit.is_empty())
            .min_by(|a, b| self.compare_hits(a, b))
    }
}

/// Ranks hits by their best HSP: lowest e-value, then highest bit score.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestHspRanking;

impl BestHspRanking {
    pub fn new() -> Self {
        Self
    }
}

impl HitRanking for BestHspRanking {
    /// The HSP with the lowest e-value; ties go to the higher bit score, then
    /// to the HSP added first.
    fn representative<'a>(&self, hit: &'a Hit) -> Option<&'a Hsp> {
        hit.hsps().iter().min_by(|a, b| self.compare_hsps(a, b))
    }

    #[inline]
    fn compare_hsps(&self, a: &Hsp, b: &Hsp) -> Ordering {
        a.evalue()
            .total_cmp(&b.evalue())
            .then_with(|| b.bitscore().total_cmp(&a.bitscore()))
    }
}

impl Record {
    /// Sort hits with the given ranking.
    pub fn sort_by_ranking<R: HitRanking + ?Sized>(&mut self, ranking: &R) {
        ranking.sort(self);
    }

    /// Best hit under the given ranking.
    pub fn best_by<R: HitRanking + ?Sized>(&self, ranking: &R) -> Option<&Hit> {
        ranking.best(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hsp(bitscore: f64, evalue: f64) -> Hsp {
        Hsp::new(1, 100, 1, 100, 0, 0, 100, 100.0, 100.0, bitscore, evalue)
    }

    fn hit(sseqid: &str, scores: &[(f64, f64)]) -> Hit {
        let mut hit = Hit::new(sseqid, 1000);
        for &(bitscore, evalue) in scores {
            hit.add(hsp(bitscore, evalue));
        }
        hit
    }

    fn ids(record: &Record) -> Vec<&str> {
        record.hits().iter().map(Hit::sseqid).collect()
    }

    #[test]
    fn test_representative_prefers_lowest_evalue_then_bitscore() {
        let ranking = BestHspRanking::new();
        let h = hit("s", &[(150.0, 1e-30), (182.0, 1e-48), (185.0, 1e-48)]);
        assert_eq!(ranking.representative(&h).unwrap().bitscore(), 185.0);

        assert!(ranking.representative(&Hit::new("empty", 10)).is_none());
    }

    #[test]
    fn test_representative_full_tie_takes_first() {
        let ranking = BestHspRanking::new();
        let mut h = Hit::new("s", 1000);
        h.add(Hsp::new(1, 50, 1, 50, 0, 0, 50, 100.0, 50.0, 90.0, 1e-20));
        h.add(Hsp::new(51, 100, 51, 100, 0, 0, 50, 100.0, 50.0, 90.0, 1e-20));
        assert_eq!(ranking.representative(&h).unwrap().qstart(), 1);
    }

    #[test]
    fn test_sort_and_best() {
        let mut record = Record::new("q", 100);
        record.add(Hit::new("empty", 10));
        record.add(hit("a", &[(182.0, 1e-48)]));
        record.add(hit("b", &[(185.0, 8.22e-50)]));

        let ranking = BestHspRanking::new();
        assert_eq!(ranking.best(&record).unwrap().sseqid(), "b");

        ranking.sort(&mut record);
        assert_eq!(ids(&record), ["b", "a", "empty"]);
    }

    #[test]
    fn test_bitscore_breaks_evalue_tie() {
        let mut record = Record::new("q", 100);
        record.add(hit("low", &[(100.0, 1e-10)]));
        record.add(hit("high", &[(120.0, 1e-10)]));

        record.sort_by_ranking(&BestHspRanking);
        assert_eq!(ids(&record), ["high", "low"]);
    }

    #[test]
    fn test_tie_break_follows_insertion_order() {
        let ranking = BestHspRanking::new();

        let mut record = Record::new("q", 100);
        record.add(hit("first", &[(185.0, 8.22e-50)]));
        record.add(hit("second", &[(185.0, 8.22e-50)]));
        assert_eq!(ranking.best(&record).unwrap().sseqid(), "first");

        let mut reversed = Record::new("q", 100);
        reversed.add(hit("second", &[(185.0, 8.22e-50)]));
        reversed.add(hit("first", &[(185.0, 8.22e-50)]));
        assert_eq!(reversed.best_by(&ranking).unwrap().sseqid(), "second");

        ranking.sort(&mut reversed);
        assert_eq!(ids(&reversed), ["second", "first"]);
    }

    #[test]
    fn test_empty_hits_keep_relative_order() {
        let mut record = Record::new("q", 100);
        record.add(Hit::new("e1", 10));
        record.add(Hit::new("e2", 10));
        record.add(hit("a", &[(50.0, 1e-3)]));
        record.add(Hit::new("e3", 10));

        BestHspRanking.sort(&mut record);
        assert_eq!(ids(&record), ["a", "e1", "e2", "e3"]);
    }

    #[test]
    fn test_best_of_empty_record() {
        let ranking = BestHspRanking::new();
        assert!(ranking.best(&Record::new("q", 100)).is_none());

        let mut record = Record::new("q", 100);
        record.add(Hit::new("e1", 10));
        assert!(ranking.best(&record).is_none());
    }
}
