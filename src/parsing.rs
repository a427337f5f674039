//! Zero-copy field parsing for tabular alignment rows.
//!
//! Lines are split with memchr and integer columns are parsed straight
//! from bytes; only the two sequence ids are allocated.

use crate::record::Hsp;
use crate::tabular::{Row, COLUMNS};
use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty, contains non-digit characters,
/// or does not fit in a u64.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Strip a trailing `\n` or `\r\n`.
#[inline(always)]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Check if a line carries no row (blank, or a `#` comment line as written
/// by the commented tabular output variant).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace) || line[0] == b'#'
}

/// Split a line into exactly [`COLUMNS`] tab-separated fields.
///
/// Returns the number of fields found on mismatch.
#[inline]
pub fn split_fields(line: &[u8]) -> Result<[&[u8]; COLUMNS], usize> {
    let empty: &[u8] = &[];
    let mut fields = [empty; COLUMNS];
    let mut rest = line;
    let mut count = 0;
    loop {
        let end = memchr(b'\t', rest);
        let field = &rest[..end.unwrap_or(rest.len())];
        if count < COLUMNS {
            fields[count] = field;
        }
        count += 1;
        match end {
            Some(tab) => rest = &rest[tab + 1..],
            None => break,
        }
    }
    if count == COLUMNS {
        Ok(fields)
    } else {
        Err(count)
    }
}

/// Parse one line (without its terminator) into a [`Row`].
///
/// On failure returns a message naming the offending column.
pub fn parse_row(line: &[u8]) -> Result<Row, String> {
    let fields = split_fields(line)
        .map_err(|found| format!("expected {} columns, found {}", COLUMNS, found))?;

    let qseqid = parse_id(fields[0], 0)?;
    let qlen = parse_int(fields[1], 1)?;
    let sseqid = parse_id(fields[2], 2)?;
    let slen = parse_int(fields[3], 3)?;

    let hsp = Hsp::new(
        parse_int(fields[4], 4)?,
        parse_int(fields[5], 5)?,
        parse_int(fields[6], 6)?,
        parse_int(fields[7], 7)?,
        parse_int(fields[8], 8)?,
        parse_int(fields[9], 9)?,
        parse_int(fields[10], 10)?,
        parse_float(fields[11], 11)?,
        parse_float(fields[12], 12)?,
        parse_float(fields[13], 13)?,
        parse_float(fields[14], 14)?,
    );

    Ok(Row {
        qseqid,
        qlen,
        sseqid,
        slen,
        hsp,
    })
}

/// Check a single text field against the type of its column.
pub fn check_field(field: &str, column: usize) -> Result<(), String> {
    match column {
        0 | 2 => parse_id(field.as_bytes(), column).map(drop),
        1 | 3..=10 => parse_int(field.as_bytes(), column).map(drop),
        _ => parse_float(field.as_bytes(), column).map(drop),
    }
}

/// Check that a sequence id can be written as a single tabular field:
/// non-empty and free of tabs and line breaks.
pub fn check_id(bytes: &[u8], column: usize) -> Result<(), String> {
    if bytes.is_empty() {
        return Err(format!("empty {} column", column_name(column)));
    }
    if let Some(pos) = memchr::memchr3(b'\t', b'\n', b'\r', bytes) {
        return Err(format!(
            "{} contains a {} character: '{}'",
            column_name(column),
            if bytes[pos] == b'\t' { "tab" } else { "line break" },
            String::from_utf8_lossy(bytes).escape_debug()
        ));
    }
    Ok(())
}

fn parse_id(bytes: &[u8], column: usize) -> Result<String, String> {
    check_id(bytes, column)?;
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| format!("{} is not valid UTF-8", column_name(column)))
}

#[inline]
fn parse_int(bytes: &[u8], column: usize) -> Result<u64, String> {
    parse_u64_fast(bytes).ok_or_else(|| {
        format!(
            "invalid integer in {} column: '{}'",
            column_name(column),
            String::from_utf8_lossy(bytes)
        )
    })
}

#[inline]
fn parse_float(bytes: &[u8], column: usize) -> Result<f64, String> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            format!(
                "invalid number in {} column: '{}'",
                column_name(column),
                String::from_utf8_lossy(bytes)
            )
        })
}

fn column_name(column: usize) -> &'static str {
    crate::tabular::COLUMN_NAMES[column]
}
