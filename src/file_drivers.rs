use crate::batch_parser::parse_batch;
use crate::config::DEFAULT_READ_BUFFER_SIZE;
use crate::error::{EngineError, LineRejection, Result};
use crate::models::LogRecord;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, trace};

/// Count the lines of a file without parsing them.
///
/// Counts `\n` terminators, plus one for a final line that has no terminator,
/// so the result agrees with [`BufRead::lines`].
pub fn count_lines<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
    let count = count_reader_lines(file).map_err(|e| EngineError::io(path, e))?;
    debug!(path = %path.display(), lines = count, "counted lines");
    Ok(count)
}

/// [`count_lines`] over any reader
pub fn count_reader_lines<R: Read>(reader: R) -> io::Result<usize> {
    let mut reader = BufReader::with_capacity(DEFAULT_READ_BUFFER_SIZE, reader);
    let mut count = 0;
    let mut last_byte = None;

    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if buf.is_empty() {
            break;
        }
        count += memchr::memchr_iter(b'\n', buf).count();
        last_byte = buf.last().copied();
        let consumed = buf.len();
        reader.consume(consumed);
    }

    if matches!(last_byte, Some(b) if b != b'\n') {
        count += 1;
    }
    Ok(count)
}

/// Read a whole file once and return every record in it.
///
/// Lines are parsed `internal_chunk_size` at a time; the chunk size only
/// bounds the temporary line buffer and never changes the result.
pub fn load_file_batch<P: AsRef<Path>>(path: P, internal_chunk_size: usize) -> Result<Vec<LogRecord>> {
    let path = path.as_ref();
    let chunk_size = EngineError::check_chunk_size("internal_chunk_size", internal_chunk_size)?;
    let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
    debug!(path = %path.display(), chunk_size, "loading file");

    let mut lines = LineReader::new(BufReader::with_capacity(DEFAULT_READ_BUFFER_SIZE, file));
    let mut records = Vec::new();
    let mut pending: Vec<String> = Vec::with_capacity(chunk_size);
    let mut undecodable = 0usize;

    while let Some(line) = lines.next_line().map_err(|e| EngineError::io(path, e))? {
        match line {
            Ok(text) => pending.push(text.to_owned()),
            Err(rejection) => {
                undecodable += 1;
                trace!(%rejection, "skipping line");
            }
        }
        if pending.len() >= chunk_size {
            records.extend(parse_batch(pending.drain(..)));
        }
    }
    records.extend(parse_batch(pending));

    debug!(
        path = %path.display(),
        lines = lines.lines_read(),
        records = records.len(),
        undecodable,
        "file loaded"
    );
    Ok(records)
}

/// Byte-level line reader that keeps going past invalid UTF-8.
///
/// Each call yields one physical line with its `\n` / `\r\n` terminator removed.
pub(crate) struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    lines_read: usize,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            lines_read: 0,
        }
    }

    /// Lines returned so far
    pub(crate) fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// True when no bytes are left. Fills the buffer but consumes nothing.
    pub(crate) fn is_exhausted(&mut self) -> io::Result<bool> {
        Ok(self.reader.fill_buf()?.is_empty())
    }

    /// `Ok(None)` at end of input; a line that is not UTF-8 comes back as
    /// `Some(Err(LineRejection::InvalidUtf8))`.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<std::result::Result<&str, LineRejection>>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.lines_read += 1;

        let mut line = self.buf.as_slice();
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped.strip_suffix(b"\r").unwrap_or(stripped);
        }
        Ok(Some(std::str::from_utf8(line).map_err(|_| LineRejection::InvalidUtf8)))
    }
}
