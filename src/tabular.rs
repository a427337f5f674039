//! Row-level access to tabular alignment-search output.
//!
//! Every line holds one HSP in exactly fifteen tab-separated columns, as
//! produced by a search run with [`OUTFMT`]. A [`RowChannel`] is either a
//! source ([`TabularReader`]) or a sink ([`TabularWriter`]) of typed
//! [`Row`]s; [`TabularFile`] opens one of the two on a path.

use crate::parsing::{check_field, check_id, parse_row, should_skip_line, trim_line_end};
use crate::record::Hsp;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Number of columns in every row.
pub const COLUMNS: usize = 15;

/// Column names, in file order.
pub const COLUMN_NAMES: [&str; COLUMNS] = [
    "qseqid", "qlen", "sseqid", "slen", "qstart", "qend", "sstart", "send", "mismatch",
    "gapopen", "length", "pident", "qcovhsp", "bitscore", "evalue",
];

/// Output format argument that makes the search tool write this layout.
pub const OUTFMT: &str = "6 qseqid qlen sseqid slen qstart qend sstart send mismatch gapopen length pident qcovhsp bitscore evalue";

/// Errors that can occur while reading, grouping or writing rows.
#[derive(Error, Debug)]
pub enum HspError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(
        "Invalid row in {source_name} at line {line}: {message} \
         (columns must be tab-separated in the order: {layout})",
        layout = COLUMN_NAMES.join(", ")
    )]
    Format {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("{0}")]
    Precondition(String),

    #[error("Invalid open mode '{0}' (expected 'r' or 'w')")]
    InvalidMode(String),

    #[error("Input not grouped in {source_name} at line {line}: {message}")]
    Grouping {
        source_name: String,
        line: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, HspError>;

/// One line of tabular output: query and subject columns plus one HSP.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub qseqid: String,
    pub qlen: u64,
    pub sseqid: String,
    pub slen: u64,
    pub hsp: Hsp,
}

impl Row {
    pub fn new(
        qseqid: impl Into<String>,
        qlen: u64,
        sseqid: impl Into<String>,
        slen: u64,
        hsp: Hsp,
    ) -> Self {
        Self {
            qseqid: qseqid.into(),
            qlen,
            sseqid: sseqid.into(),
            slen,
            hsp,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.qseqid, self.qlen, self.sseqid, self.slen, self.hsp
        )
    }
}

/// A sequential source or sink of rows.
///
/// A channel is opened either for reading or for writing. Calling the
/// operation of the other mode fails with [`HspError::Precondition`].
pub trait RowChannel {
    /// Name used in error messages (usually the file path).
    fn name(&self) -> &str;

    fn readable(&self) -> bool;

    fn writable(&self) -> bool;

    /// Read the next row, or `None` at end of input.
    fn read_row(&mut self) -> Result<Option<Row>>;

    /// Write one row.
    fn write_row(&mut self, row: &Row) -> Result<()>;

    /// Line number of the last row read, or rows written so far.
    fn line_number(&self) -> usize;

    /// Flush buffered output. A no-op for readable channels.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Iterate over the remaining rows.
    fn rows(&mut self) -> RowIter<'_, Self>
    where
        Self: Sized,
    {
        RowIter { channel: self }
    }
}

impl<C: RowChannel + ?Sized> RowChannel for &mut C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn readable(&self) -> bool {
        (**self).readable()
    }

    fn writable(&self) -> bool {
        (**self).writable()
    }

    fn read_row(&mut self) -> Result<Option<Row>> {
        (**self).read_row()
    }

    fn write_row(&mut self, row: &Row) -> Result<()> {
        (**self).write_row(row)
    }

    fn line_number(&self) -> usize {
        (**self).line_number()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Iterator over rows of a readable channel.
pub struct RowIter<'a, C: RowChannel> {
    channel: &'a mut C,
}

impl<C: RowChannel> Iterator for RowIter<'_, C> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.channel.read_row().transpose()
    }
}

fn not_readable(name: &str) -> HspError {
    HspError::Precondition(format!("{} is not readable", name))
}

fn not_writable(name: &str) -> HspError {
    HspError::Precondition(format!("{} is not writable", name))
}

/// A streaming reader of tabular rows.
pub struct TabularReader<R: Read> {
    reader: BufReader<R>,
    name: String,
    line_number: usize,
    buffer: Vec<u8>,
}

impl TabularReader<File> {
    /// Open a tabular file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "opened tabular file for reading");
        Ok(Self::with_name(file, path.display().to_string()))
    }
}

impl<R: Read> TabularReader<R> {
    /// Create a reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self::with_name(reader, "<input>")
    }

    /// Create a reader whose errors refer to `name`.
    pub fn with_name(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader: BufReader::new(reader),
            name: name.into(),
            line_number: 0,
            buffer: Vec::with_capacity(256),
        }
    }

    fn format_error(&self, message: String) -> HspError {
        HspError::Format {
            source_name: self.name.clone(),
            line: self.line_number,
            message,
        }
    }
}

impl<R: Read> RowChannel for TabularReader<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn readable(&self) -> bool {
        true
    }

    fn writable(&self) -> bool {
        false
    }

    fn read_row(&mut self) -> Result<Option<Row>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = trim_line_end(&self.buffer);
            if should_skip_line(line) {
                continue;
            }

            return match parse_row(line) {
                Ok(row) => Ok(Some(row)),
                Err(message) => Err(self.format_error(message)),
            };
        }
    }

    fn write_row(&mut self, _row: &Row) -> Result<()> {
        Err(not_writable(&self.name))
    }

    fn line_number(&self) -> usize {
        self.line_number
    }
}

/// Buffer size for TabularWriter (64 KB).
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// A buffered writer of tabular rows.
///
/// Integers go through itoa and floats through ryu, so every value written
/// parses back to exactly the same value.
pub struct TabularWriter<W: Write> {
    writer: BufWriter<W>,
    name: String,
    rows_written: usize,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl TabularWriter<File> {
    /// Create (or truncate) a tabular file at a path.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        tracing::debug!(path = %path.display(), "opened tabular file for writing");
        Ok(Self::with_name(file, path.display().to_string()))
    }
}

impl<W: Write> TabularWriter<W> {
    /// Create a writer over any sink.
    pub fn new(output: W) -> Self {
        Self::with_name(output, "<output>")
    }

    /// Create a writer whose errors refer to `name`.
    pub fn with_name(output: W, name: impl Into<String>) -> Self {
        Self {
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, output),
            name: name.into(),
            rows_written: 0,
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write a row given as raw text fields.
    ///
    /// Fails unless there are exactly fifteen fields and each one parses as
    /// the type of its column.
    pub fn write_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        if fields.len() != COLUMNS {
            return Err(self.format_error(format!(
                "row is supposed to have {} columns, but it has {}",
                COLUMNS,
                fields.len()
            )));
        }
        for (column, field) in fields.iter().enumerate() {
            check_field(field.as_ref(), column).map_err(|message| self.format_error(message))?;
        }

        for (column, field) in fields.iter().enumerate() {
            if column > 0 {
                self.writer.write_all(b"\t")?;
            }
            self.writer.write_all(field.as_ref().as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and return the underlying sink.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| HspError::Io(e.into_error()))
    }

    /// Errors refer to the row that was about to be written.
    fn format_error(&self, message: String) -> HspError {
        HspError::Format {
            source_name: self.name.clone(),
            line: self.rows_written + 1,
            message,
        }
    }

    #[inline]
    fn write_int(&mut self, n: u64) -> io::Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        self.writer.write_all(b"\t")
    }

    #[inline]
    fn write_float(&mut self, f: f64) -> io::Result<()> {
        self.writer.write_all(self.ryu_buf.format(f).as_bytes())
    }
}

impl<W: Write> RowChannel for TabularWriter<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn readable(&self) -> bool {
        false
    }

    fn writable(&self) -> bool {
        true
    }

    fn read_row(&mut self) -> Result<Option<Row>> {
        Err(not_readable(&self.name))
    }

    fn write_row(&mut self, row: &Row) -> Result<()> {
        for (id, column) in [(&row.qseqid, 0), (&row.sseqid, 2)] {
            check_id(id.as_bytes(), column).map_err(|message| self.format_error(message))?;
        }

        self.writer.write_all(row.qseqid.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.write_int(row.qlen)?;
        self.writer.write_all(row.sseqid.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.write_int(row.slen)?;

        let hsp = &row.hsp;
        for n in [
            hsp.qstart(),
            hsp.qend(),
            hsp.sstart(),
            hsp.send(),
            hsp.mismatch(),
            hsp.gapopen(),
            hsp.length(),
        ] {
            self.write_int(n)?;
        }
        for (i, f) in [hsp.pident(), hsp.qcovhsp(), hsp.bitscore(), hsp.evalue()]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                self.writer.write_all(b"\t")?;
            }
            self.write_float(f)?;
        }
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    fn line_number(&self) -> usize {
        self.rows_written
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Mode a [`TabularFile`] is opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

impl FromStr for OpenMode {
    type Err = HspError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" => Ok(OpenMode::Read),
            "w" => Ok(OpenMode::Write),
            _ => Err(HspError::InvalidMode(s.to_string())),
        }
    }
}

/// A tabular file opened on a path, either for reading or for writing.
///
/// The file is closed when the value is dropped. Call [`RowChannel::flush`]
/// before dropping a writable file to observe write errors.
pub enum TabularFile {
    Reader(TabularReader<File>),
    Writer(TabularWriter<File>),
}

impl TabularFile {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        match mode {
            OpenMode::Read => TabularReader::from_path(path).map(TabularFile::Reader),
            OpenMode::Write => TabularWriter::create(path).map(TabularFile::Writer),
        }
    }

    pub fn mode(&self) -> OpenMode {
        match self {
            TabularFile::Reader(_) => OpenMode::Read,
            TabularFile::Writer(_) => OpenMode::Write,
        }
    }

    fn channel(&self) -> &dyn RowChannel {
        match self {
            TabularFile::Reader(r) => r,
            TabularFile::Writer(w) => w,
        }
    }

    fn channel_mut(&mut self) -> &mut dyn RowChannel {
        match self {
            TabularFile::Reader(r) => r,
            TabularFile::Writer(w) => w,
        }
    }
}

impl RowChannel for TabularFile {
    fn name(&self) -> &str {
        self.channel().name()
    }

    fn readable(&self) -> bool {
        self.channel().readable()
    }

    fn writable(&self) -> bool {
        self.channel().writable()
    }

    fn read_row(&mut self) -> Result<Option<Row>> {
        self.channel_mut().read_row()
    }

    fn write_row(&mut self, row: &Row) -> Result<()> {
        self.channel_mut().write_row(row)
    }

    fn line_number(&self) -> usize {
        self.channel().line_number()
    }

    fn flush(&mut self) -> Result<()> {
        self.channel_mut().flush()
    }
}

impl fmt::Debug for TabularFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TabularFile({:?}, {:?})", self.name(), self.mode())
    }
}
