//! Flattening writer: [`Record`]s in, rows out.

use crate::record::Record;
use crate::tabular::{HspError, Result, Row, RowChannel};

/// Writes records to a writable channel, one row per HSP.
pub struct RecordWriter<C: RowChannel> {
    channel: C,
}

impl<C: RowChannel> RecordWriter<C> {
    /// Create a writer over a writable channel.
    pub fn new(channel: C) -> Result<Self> {
        if !channel.writable() {
            return Err(HspError::Precondition(format!(
                "{} is not writable",
                channel.name()
            )));
        }
        Ok(Self { channel })
    }

    /// Write every HSP of every non-empty hit, in order.
    ///
    /// Returns the number of rows written; empty records write nothing.
    pub fn write(&mut self, record: &Record) -> Result<usize> {
        let mut written = 0;
        for hit in record.hits().iter().filter(|h| !h.is_empty()) {
            for hsp in hit.hsps() {
                let row = Row::new(
                    record.qseqid(),
                    record.qlen(),
                    hit.sseqid(),
                    hit.slen(),
                    *hsp,
                );
                self.channel.write_row(&row)?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Write a sequence of records, returning the total number of rows.
    pub fn write_all<'a, I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut written = 0;
        for record in records {
            written += self.write(record)?;
        }
        Ok(written)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.channel.flush()
    }

    /// Flush and give back the channel.
    pub fn into_inner(mut self) -> Result<C> {
        self.channel.flush()?;
        Ok(self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RecordReader;
    use crate::record::{Hit, Hsp};
    use crate::tabular::{TabularReader, TabularWriter};

    fn hsp(sstart: u64, send: u64) -> Hsp {
        Hsp::new(3, 100, sstart, send, 0, 0, 98, 100.0, 98.0, 182.0, 1.06e-48)
    }

    fn example_record() -> Record {
        let mut record = Record::new("seq1", 100);
        record.create(
            "ref1",
            100,
            Hsp::new(1, 100, 1, 100, 0, 0, 100, 100.0, 100.0, 185.0, 8.22e-50),
        );
        record.create("ref2", 1722, hsp(3, 100));
        record.create("ref2", 1722, hsp(814, 911));
        record.create("ref2", 1722, hsp(1625, 1722));
        record
    }

    fn write_to_string(records: &[Record]) -> (usize, String) {
        let mut writer = RecordWriter::new(TabularWriter::new(Vec::new())).unwrap();
        let n = writer.write_all(records).unwrap();
        let bytes = writer.into_inner().unwrap().finish().unwrap();
        (n, String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_write_rows_in_order() {
        let (n, text) = write_to_string(&[example_record()]);
        assert_eq!(n, 4);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("seq1\t100\tref1\t100\t1\t100\t1\t100\t"));
        assert!(lines[2].starts_with("seq1\t100\tref2\t1722\t3\t100\t814\t911\t"));
        assert_eq!(text, format!("{}\n", example_record()));
    }

    #[test]
    fn test_empty_records_write_nothing() {
        let mut all_empty = Record::new("seq1", 100);
        all_empty.add(Hit::new("ref1", 100));
        let (n, text) = write_to_string(&[Record::new("seq0", 10), all_empty]);

        assert_eq!(n, 0);
        assert!(text.is_empty());
    }

    #[test]
    fn test_empty_hits_are_skipped() {
        let mut record = example_record();
        record.add(Hit::new("ref3", 50));
        let (n, _) = write_to_string(&[record]);
        assert_eq!(n, 4);
    }

    #[test]
    fn test_round_trip() {
        let mut second = Record::new("seq2", 250);
        second.create("ref9", 3000, hsp(2900, 2803));

        let original = vec![example_record(), second];
        let (_, text) = write_to_string(&original);

        let reader = RecordReader::new(TabularReader::new(text.as_bytes()))
            .unwrap()
            .strict(false);
        let reread: Vec<Record> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(reread, original);
    }

    #[test]
    fn test_ids_that_would_break_the_layout_fail() {
        let mut writer = RecordWriter::new(TabularWriter::new(Vec::new())).unwrap();

        let mut tabbed = Record::new("seq1", 100);
        tabbed.create("ref\tX", 100, hsp(1, 100));
        let err = writer.write(&tabbed).unwrap_err();
        assert!(matches!(err, HspError::Format { .. }));

        let mut unnamed = Record::new("", 100);
        unnamed.create("ref1", 100, hsp(1, 100));
        assert!(writer.write(&unnamed).is_err());

        let bytes = writer.into_inner().unwrap().finish().unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_requires_writable_channel() {
        let result = RecordWriter::new(TabularReader::new(&b""[..]));
        assert!(matches!(result, Err(HspError::Precondition(_))));
    }
}
