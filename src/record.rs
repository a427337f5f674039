//! Core hierarchy types: one query's [`Record`], its subject [`Hit`]s and
//! their aligned segments ([`Hsp`]).

use std::fmt;

/// A high-scoring segment pair: one aligned region between a query and a
/// subject, with its scoring statistics.
///
/// Query coordinates are 1-based. `sstart` may be greater than `send` for
/// alignments on the reverse strand of the subject; no normalization is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsp {
    qstart: u64,
    qend: u64,
    sstart: u64,
    send: u64,
    mismatch: u64,
    gapopen: u64,
    length: u64,
    pident: f64,
    qcovhsp: f64,
    bitscore: f64,
    evalue: f64,
}

impl Hsp {
    /// Create a new HSP from its eleven tabular fields, in column order.
    #[inline]
    pub fn new(
        qstart: u64,
        qend: u64,
        sstart: u64,
        send: u64,
        mismatch: u64,
        gapopen: u64,
        length: u64,
        pident: f64,
        qcovhsp: f64,
        bitscore: f64,
        evalue: f64,
    ) -> Self {
        Self {
            qstart,
            qend,
            sstart,
            send,
            mismatch,
            gapopen,
            length,
            pident,
            qcovhsp,
            bitscore,
            evalue,
        }
    }

    /// Start of the alignment in the query.
    #[inline]
    pub fn qstart(&self) -> u64 {
        self.qstart
    }

    /// End of the alignment in the query.
    #[inline]
    pub fn qend(&self) -> u64 {
        self.qend
    }

    /// Start of the alignment in the subject.
    #[inline]
    pub fn sstart(&self) -> u64 {
        self.sstart
    }

    /// End of the alignment in the subject.
    #[inline]
    pub fn send(&self) -> u64 {
        self.send
    }

    #[inline]
    pub fn mismatch(&self) -> u64 {
        self.mismatch
    }

    #[inline]
    pub fn gapopen(&self) -> u64 {
        self.gapopen
    }

    /// Alignment length.
    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Percentage of identical matches.
    #[inline]
    pub fn pident(&self) -> f64 {
        self.pident
    }

    /// Percentage of the query covered by this HSP.
    #[inline]
    pub fn qcovhsp(&self) -> f64 {
        self.qcovhsp
    }

    #[inline]
    pub fn bitscore(&self) -> f64 {
        self.bitscore
    }

    /// Expect value; lower is better.
    #[inline]
    pub fn evalue(&self) -> f64 {
        self.evalue
    }

    /// Returns true if the subject coordinates run backwards.
    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.sstart > self.send
    }
}

/// Float formatting shared by the `Display` impls and the tabular writer.
///
/// `ryu` gives the shortest text that parses back to the same value. It
/// switches to exponent notation only below `1e-5` (`8.22e-50`), so an input
/// written as `1e-5` is re-emitted as `0.00001`.
pub(crate) fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let mut buf = ryu::Buffer::new();
    f.write_str(buf.format(value))
}

impl fmt::Display for Hsp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
            self.qstart, self.qend, self.sstart, self.send, self.mismatch, self.gapopen, self.length
        )?;
        write_float(f, self.pident)?;
        f.write_str("\t")?;
        write_float(f, self.qcovhsp)?;
        f.write_str("\t")?;
        write_float(f, self.bitscore)?;
        f.write_str("\t")?;
        write_float(f, self.evalue)
    }
}

/// All HSPs between one query and one subject sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    sseqid: String,
    slen: u64,
    hsps: Vec<Hsp>,
}

impl Hit {
    /// Create an empty hit for a subject.
    pub fn new(sseqid: impl Into<String>, slen: u64) -> Self {
        Self {
            sseqid: sseqid.into(),
            slen,
            hsps: Vec::new(),
        }
    }

    /// Subject sequence id.
    #[inline]
    pub fn sseqid(&self) -> &str {
        &self.sseqid
    }

    /// Subject sequence length.
    #[inline]
    pub fn slen(&self) -> u64 {
        self.slen
    }

    /// HSPs in the order they were added.
    #[inline]
    pub fn hsps(&self) -> &[Hsp] {
        &self.hsps
    }

    /// Append an HSP.
    pub fn add(&mut self, hsp: Hsp) {
        self.hsps.push(hsp);
    }

    /// Build an HSP from its fields, append it and return a reference to it.
    pub fn create(
        &mut self,
        qstart: u64,
        qend: u64,
        sstart: u64,
        send: u64,
        mismatch: u64,
        gapopen: u64,
        length: u64,
        pident: f64,
        qcovhsp: f64,
        bitscore: f64,
        evalue: f64,
    ) -> &Hsp {
        self.hsps.push(Hsp::new(
            qstart, qend, sstart, send, mismatch, gapopen, length, pident, qcovhsp, bitscore,
            evalue,
        ));
        &self.hsps[self.hsps.len() - 1]
    }

    /// Number of HSPs.
    #[inline]
    pub fn count(&self) -> usize {
        self.hsps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hsps.is_empty()
    }

    /// Keep only the HSPs matching the predicate, preserving order.
    ///
    /// Returns the number of HSPs removed.
    pub fn retain_hsps<F: FnMut(&Hsp) -> bool>(&mut self, keep: F) -> usize {
        let before = self.hsps.len();
        self.hsps.retain(keep);
        before - self.hsps.len()
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hsp) in self.hsps.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}\t{}\t{}", self.sseqid, self.slen, hsp)?;
        }
        Ok(())
    }
}

/// All hits reported for a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    qseqid: String,
    qlen: u64,
    hits: Vec<Hit>,
}

impl Record {
    /// Create a record with no hits.
    pub fn new(qseqid: impl Into<String>, qlen: u64) -> Self {
        Self {
            qseqid: qseqid.into(),
            qlen,
            hits: Vec::new(),
        }
    }

    /// Query sequence id.
    #[inline]
    pub fn qseqid(&self) -> &str {
        &self.qseqid
    }

    /// Query sequence length.
    #[inline]
    pub fn qlen(&self) -> u64 {
        self.qlen
    }

    #[inline]
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Mutable access to the hits, for in-place edits of their HSPs.
    ///
    /// The slice cannot grow or shrink; use [`Record::add`] or
    /// [`Record::retain_hits`] for that.
    #[inline]
    pub fn hits_mut(&mut self) -> &mut [Hit] {
        &mut self.hits
    }

    /// Append a hit.
    pub fn add(&mut self, hit: Hit) {
        self.hits.push(hit);
    }

    /// Append an HSP for `sseqid`.
    ///
    /// The HSP joins the last hit when that hit is for the same subject;
    /// otherwise a new hit is opened. Earlier hits are never searched, so a
    /// subject that re-appears after another subject gets a second hit.
    pub fn create(&mut self, sseqid: &str, slen: u64, hsp: Hsp) -> &Hit {
        let reuse_last = self
            .hits
            .last()
            .is_some_and(|last| last.sseqid == sseqid);
        if !reuse_last {
            self.hits.push(Hit::new(sseqid, slen));
        }
        let last = self.hits.len() - 1;
        self.hits[last].add(hsp);
        &self.hits[last]
    }

    /// Number of hits, including empty ones.
    #[inline]
    pub fn count(&self) -> usize {
        self.hits.len()
    }

    /// Total number of HSPs across all hits.
    pub fn hsp_count(&self) -> usize {
        self.hits.iter().map(Hit::count).sum()
    }

    /// A record is empty when it has no hits or all of its hits are empty.
    pub fn is_empty(&self) -> bool {
        self.hits.iter().all(Hit::is_empty)
    }

    /// Stable in-place sort of the hits.
    pub fn sort_hits_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Hit, &Hit) -> std::cmp::Ordering,
    {
        self.hits.sort_by(compare);
    }

    /// Keep only the hits matching the predicate, preserving order.
    ///
    /// The predicate may prune each hit's HSPs before deciding.
    pub fn retain_hits<F: FnMut(&mut Hit) -> bool>(&mut self, keep: F) {
        self.hits.retain_mut(keep);
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for hit in self.hits.iter().filter(|h| !h.is_empty()) {
            for hsp in &hit.hsps {
                if !first {
                    f.write_str("\n")?;
                }
                first = false;
                write!(
                    f,
                    "{}\t{}\t{}\t{}\t{}",
                    self.qseqid, self.qlen, hit.sseqid, hit.slen, hsp
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hsp(sstart: u64, send: u64, evalue: f64) -> Hsp {
        Hsp::new(3, 100, sstart, send, 0, 0, 98, 100.0, 98.0, 182.0, evalue)
    }

    #[test]
    fn test_hsp_equality_is_field_wise() {
        let a = hsp(3, 100, 1.06e-48);
        let b = hsp(3, 100, 1.06e-48);
        let c = hsp(814, 911, 1.06e-48);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hsp_reverse_strand_not_normalized() {
        let h = hsp(911, 814, 1e-10);
        assert!(h.is_reverse());
        assert_eq!(h.sstart(), 911);
        assert_eq!(h.send(), 814);
    }

    #[test]
    fn test_hsp_accessors() {
        let h = Hsp::new(3, 100, 814, 911, 2, 1, 98, 97.5, 98.0, 182.0, 1.06e-48);
        assert_eq!((h.qstart(), h.qend()), (3, 100));
        assert_eq!((h.sstart(), h.send()), (814, 911));
        assert_eq!((h.mismatch(), h.gapopen(), h.length()), (2, 1, 98));
        assert_eq!(h.pident(), 97.5);
        assert_eq!(h.qcovhsp(), 98.0);
        assert_eq!(h.bitscore(), 182.0);
        assert_eq!(h.evalue(), 1.06e-48);
        assert!(!h.is_reverse());
    }

    #[test]
    fn test_hsp_display() {
        let h = Hsp::new(1, 100, 1, 100, 0, 0, 100, 100.0, 100.0, 185.0, 8.22e-50);
        assert_eq!(
            h.to_string(),
            "1\t100\t1\t100\t0\t0\t100\t100.0\t100.0\t185.0\t8.22e-50"
        );
    }

    #[test]
    fn test_hit_create_and_count() {
        let mut hit = Hit::new("ref2", 1722);
        assert!(hit.is_empty());

        let created = *hit.create(3, 100, 3, 100, 0, 0, 98, 100.0, 98.0, 182.0, 1.06e-48);
        assert_eq!(created, hsp(3, 100, 1.06e-48));
        hit.add(hsp(814, 911, 1.06e-48));

        assert_eq!(hit.count(), 2);
        assert_eq!(hit.hsps()[1].sstart(), 814);
    }

    #[test]
    fn test_record_create_appends_to_last_hit() {
        let mut record = Record::new("seq1", 100);
        record.create("ref1", 100, hsp(1, 100, 8.22e-50));
        record.create("ref2", 1722, hsp(3, 100, 1.06e-48));
        record.create("ref2", 1722, hsp(814, 911, 1.06e-48));

        assert_eq!(record.count(), 2);
        assert_eq!(record.hits()[0].count(), 1);
        assert_eq!(record.hits()[1].count(), 2);
        assert_eq!(record.hsp_count(), 3);
    }

    #[test]
    fn test_record_create_reopens_non_adjacent_subject() {
        let mut record = Record::new("seq1", 100);
        record.create("ref1", 100, hsp(1, 100, 1e-5));
        record.create("ref2", 1722, hsp(3, 100, 1e-5));
        record.create("ref1", 100, hsp(5, 50, 1e-5));

        assert_eq!(record.count(), 3);
        assert_eq!(record.hits()[0].sseqid(), "ref1");
        assert_eq!(record.hits()[2].sseqid(), "ref1");
    }

    #[test]
    fn test_record_hits_mut() {
        let mut record = Record::new("seq1", 100);
        record.create("ref1", 100, hsp(1, 100, 1e-5));
        record.create("ref2", 1722, hsp(3, 100, 1e-5));
        record.create("ref2", 1722, hsp(814, 911, 1e-5));

        let removed = record.hits_mut()[1].retain_hsps(|h| h.sstart() < 500);
        assert_eq!(removed, 1);
        record.hits_mut()[0].add(hsp(5, 60, 1e-5));

        assert_eq!(record.count(), 2);
        assert_eq!(record.hits()[0].count(), 2);
        assert_eq!(record.hits()[1].hsps(), &[hsp(3, 100, 1e-5)]);

        assert!(Record::new("seq0", 10).hits_mut().is_empty());
    }

    #[test]
    fn test_small_evalue_display() {
        // Exponent form is kept only below 1e-5.
        assert_eq!(hsp(1, 100, 3e-35).to_string().rsplit('\t').next(), Some("3e-35"));
        let text = hsp(1, 100, 1e-5).to_string();
        let last = text.rsplit('\t').next().unwrap();
        assert_eq!(last, "0.00001");
        assert_eq!(last.parse::<f64>().unwrap(), 1e-5);
    }

    #[test]
    fn test_record_empty() {
        let mut record = Record::new("seq1", 100);
        assert!(record.is_empty());

        record.add(Hit::new("ref1", 100));
        record.add(Hit::new("ref2", 200));
        assert_eq!(record.count(), 2);
        assert!(record.is_empty());
        assert_eq!(record.to_string(), "");

        record.create("ref2", 200, hsp(1, 100, 1e-5));
        assert!(!record.is_empty());
    }

    #[test]
    fn test_record_display_skips_empty_hits() {
        let mut record = Record::new("seq1", 100);
        record.add(Hit::new("empty", 10));
        record.create("ref1", 100, hsp(1, 100, 1e-5));
        record.create("ref1", 100, hsp(5, 60, 1e-5));

        let text = record.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("seq1\t100\tref1\t100\t3\t100\t1\t100\t"));
        assert_eq!(lines[1].split('\t').count(), 15);
    }

    #[test]
    fn test_hit_display() {
        let mut hit = Hit::new("ref1", 100);
        assert_eq!(hit.to_string(), "");
        hit.add(hsp(1, 100, 1e-5));
        assert!(hit.to_string().starts_with("ref1\t100\t3\t100\t"));
    }
}
