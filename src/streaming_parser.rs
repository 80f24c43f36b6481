use crate::config::{DEFAULT_READ_BUFFER_SIZE, DEFAULT_STREAM_CHUNK_SIZE};
use crate::error::{EngineError, LineRejection, Result};
use crate::file_drivers::LineReader;
use crate::models::LogRecord;
use crate::parsers::parse_line_detailed;
use crate::statistics::ParsingStatistics;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Configuration for the chunked streaming driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Parsed records per callback
    pub chunk_size: usize,
    /// Read buffer size in bytes
    pub buffer_size: usize,
    /// Total line count, when the caller already knows it. Passed to every
    /// callback; without it only the final callback carries a total.
    pub total_lines_hint: Option<usize>,
    /// Collect [`ParsingStatistics`] while streaming
    pub collect_statistics: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
            total_lines_hint: None,
            collect_statistics: false,
        }
    }
}

/// Driver states. `Stopped` and `Done` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Reading,
    Dispatching,
    /// The callback asked to stop
    Stopped,
    /// End of input reached
    Done,
}

/// Outcome of one streaming pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Records parsed and handed to the callback
    pub records: usize,
    /// Physical lines read
    pub lines_read: usize,
    /// Lines that produced no record
    pub rejected: usize,
    /// Callbacks made
    pub chunks: usize,
    /// True when the callback stopped the pass early
    pub cancelled: bool,
}

/// Single-pass chunked parser with a cancellable per-chunk callback.
///
/// The callback receives `(records, current_line, total_lines)` and returns
/// `true` to keep going or `false` to stop. Nothing is read after a `false`.
pub struct StreamingParser {
    config: StreamingConfig,
    statistics: Option<ParsingStatistics>,
}

impl StreamingParser {
    /// Create a streaming parser with the default configuration
    pub fn new() -> Self {
        Self::with_config(StreamingConfig::default())
    }

    pub fn with_config(config: StreamingConfig) -> Self {
        let statistics = config.collect_statistics.then(ParsingStatistics::new);
        Self { config, statistics }
    }

    /// Stream the file at `path`
    pub fn stream_file<P, F>(&mut self, path: P, on_chunk: F) -> Result<StreamSummary>
    where
        P: AsRef<Path>,
        F: FnMut(Vec<LogRecord>, usize, Option<usize>) -> bool,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
        let source = path.display().to_string();
        self.stream_reader(file, &source, on_chunk)
    }

    /// Stream any reader; `source` names it in errors and logs
    pub fn stream_reader<R, F>(&mut self, reader: R, source: &str, mut on_chunk: F) -> Result<StreamSummary>
    where
        R: Read,
        F: FnMut(Vec<LogRecord>, usize, Option<usize>) -> bool,
    {
        let chunk_size = EngineError::check_chunk_size("chunk_size", self.config.chunk_size)?;
        let start = Instant::now();
        debug!(source, chunk_size, "streaming started");

        let mut lines = LineReader::new(BufReader::with_capacity(self.config.buffer_size.max(1), reader));
        let mut pending: Vec<LogRecord> = Vec::with_capacity(chunk_size);
        let mut summary = StreamSummary::default();
        let mut last_dispatched_line = 0;
        let mut at_eof = false;
        let mut state = StreamState::Reading;

        loop {
            match state {
                StreamState::Reading => {
                    let line = lines.next_line().map_err(|e| EngineError::io(source, e))?;
                    match line {
                        Some(Ok(text)) => match parse_line_detailed(text) {
                            Ok(parsed) => {
                                if let Some(stats) = self.statistics.as_mut() {
                                    stats.record_success(&parsed);
                                }
                                pending.push(parsed.record);
                            }
                            Err(rejection) => self.reject(&mut summary, rejection),
                        },
                        Some(Err(rejection)) => self.reject(&mut summary, rejection),
                        None => at_eof = true,
                    }

                    if pending.len() >= chunk_size {
                        // A chunk that ends exactly at end of input is the final dispatch.
                        if !at_eof {
                            at_eof = lines.is_exhausted().map_err(|e| EngineError::io(source, e))?;
                        }
                        state = StreamState::Dispatching;
                    } else if at_eof {
                        // Flush what is left, or at least report final progress.
                        let unreported = lines.lines_read() > last_dispatched_line;
                        state = if !pending.is_empty() || unreported {
                            StreamState::Dispatching
                        } else {
                            StreamState::Done
                        };
                    }
                }
                StreamState::Dispatching => {
                    let chunk = std::mem::replace(&mut pending, Vec::with_capacity(chunk_size));
                    let current_line = lines.lines_read();
                    let total = if at_eof {
                        Some(current_line)
                    } else {
                        self.config.total_lines_hint
                    };

                    summary.records += chunk.len();
                    summary.chunks += 1;
                    last_dispatched_line = current_line;
                    trace!(source, records = chunk.len(), current_line, "dispatching chunk");

                    let keep_going = on_chunk(chunk, current_line, total);
                    state = if at_eof {
                        StreamState::Done
                    } else if keep_going {
                        StreamState::Reading
                    } else {
                        info!(source, current_line, records = summary.records, "streaming cancelled by consumer");
                        summary.cancelled = true;
                        StreamState::Stopped
                    };
                }
                StreamState::Stopped | StreamState::Done => break,
            }
        }

        summary.lines_read = lines.lines_read();
        if let Some(stats) = self.statistics.as_mut() {
            stats.record_elapsed(start.elapsed());
        }
        debug!(
            source,
            records = summary.records,
            lines = summary.lines_read,
            rejected = summary.rejected,
            cancelled = summary.cancelled,
            "streaming finished"
        );
        Ok(summary)
    }

    fn reject(&mut self, summary: &mut StreamSummary, rejection: LineRejection) {
        summary.rejected += 1;
        if let Some(stats) = self.statistics.as_mut() {
            stats.record_rejection(rejection);
        }
    }

    /// Statistics gathered so far, if enabled
    pub fn statistics(&self) -> Option<&ParsingStatistics> {
        self.statistics.as_ref()
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }
}

impl Default for StreamingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream `path` once, calling `on_chunk` for every `chunk_size` records and
/// once more at end of file. Returns the number of records parsed before the
/// pass ended, whether by end of file or by the callback returning `false`.
pub fn stream_file<P, F>(path: P, chunk_size: usize, on_chunk: F) -> Result<usize>
where
    P: AsRef<Path>,
    F: FnMut(Vec<LogRecord>, usize, Option<usize>) -> bool,
{
    let mut parser = StreamingParser::with_config(StreamingConfig {
        chunk_size,
        ..StreamingConfig::default()
    });
    parser.stream_file(path, on_chunk).map(|summary| summary.records)
}
