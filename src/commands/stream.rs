use crate::cli::StreamArgs;
use crate::commands::output::{print_run_summary, RecordWriter};
use crate::commands::{CommandResult, RecordFilter};
use crate::config::EngineConfig;
use crate::file_drivers::count_lines;
use crate::models::LogRecord;
use crate::streaming_parser::{StreamSummary, StreamingConfig, StreamingParser};
use crossbeam_channel::{bounded, Receiver};
use std::io::{stdout, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use tracing::debug;

/// Chunks buffered between the parsing thread and the printer
const CHANNEL_CAPACITY: usize = 4;

/// One callback's worth of output from the streaming parser
#[derive(Debug)]
pub struct Chunk {
    pub records: Vec<LogRecord>,
    pub current_line: usize,
    pub total_lines: Option<usize>,
}

/// Run the streaming parser on a worker thread.
///
/// Chunks arrive on the returned receiver. Dropping the receiver cancels the
/// pass at the next chunk boundary.
pub fn spawn_stream(
    path: PathBuf,
    config: StreamingConfig,
) -> (Receiver<Chunk>, thread::JoinHandle<crate::error::Result<StreamSummary>>) {
    let (tx, rx) = bounded(CHANNEL_CAPACITY);
    let handle = thread::spawn(move || {
        let mut parser = StreamingParser::with_config(config);
        parser.stream_file(&path, |records, current_line, total_lines| {
            tx.send(Chunk {
                records,
                current_line,
                total_lines,
            })
            .is_ok()
        })
    });
    (rx, handle)
}

pub fn run_stream(args: StreamArgs, config: &EngineConfig) -> CommandResult {
    let start = Instant::now();
    let filter = RecordFilter::from_args(&args.filter)?;

    let mut streaming = config.streaming_config();
    if let Some(chunk_size) = args.chunk_size {
        streaming.chunk_size = chunk_size;
    }
    if args.progress {
        streaming.total_lines_hint = Some(count_lines(&args.file)?);
    }

    let (rx, handle) = spawn_stream(args.file.clone(), streaming);
    let mut writer = RecordWriter::new(args.output, stdout().lock()).with_highlight(filter.grep());
    let limit = args.limit.unwrap_or(usize::MAX);
    let mut chunks = 0;

    for chunk in rx.iter() {
        chunks += 1;
        let remaining = limit - writer.written();
        writer.write_all(chunk.records.iter().filter(|r| filter.matches(r)).take(remaining))?;

        if args.progress {
            match chunk.total_lines {
                Some(total) if total > 0 => eprintln!(
                    "progress: {}/{} lines ({:.1}%)",
                    chunk.current_line,
                    total,
                    chunk.current_line as f64 / total as f64 * 100.0
                ),
                _ => eprintln!("progress: {} lines", chunk.current_line),
            }
        }

        let chunk_limit_hit = args.max_chunks.is_some_and(|max| chunks >= max);
        if chunk_limit_hit || writer.written() >= limit {
            debug!(chunks, written = writer.written(), "stopping stream early");
            break;
        }
    }
    // Closing the channel is what tells the worker to stop.
    drop(rx);

    let summary = handle.join().map_err(|_| "streaming worker panicked")??;
    let written = writer.written();
    let mut out = writer.finish()?;
    out.flush()?;

    if args.progress || summary.cancelled {
        print_run_summary(
            if summary.cancelled { "Stopped after" } else { "Streamed" },
            written,
            Some(summary.lines_read),
            start.elapsed(),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn log_file(lines: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..lines {
            writeln!(file, "01-25 12:34:56.000  {}  -  -  Tag: line {}", i, i).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn config(chunk_size: usize) -> StreamingConfig {
        StreamingConfig {
            chunk_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_worker_delivers_every_chunk() {
        let file = log_file(25);
        let (rx, handle) = spawn_stream(file.path().to_path_buf(), config(10));
        let chunks: Vec<Chunk> = rx.iter().collect();
        let summary = handle.join().unwrap().unwrap();

        assert_eq!(chunks.iter().map(|c| c.records.len()).collect::<Vec<_>>(), vec![10, 10, 5]);
        assert_eq!(chunks.last().unwrap().total_lines, Some(25));
        assert_eq!(summary.records, 25);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_dropping_receiver_cancels_worker() {
        let file = log_file(1_000);
        let (rx, handle) = spawn_stream(file.path().to_path_buf(), config(10));
        let first = rx.recv().unwrap();
        assert_eq!(first.records.len(), 10);
        drop(rx);

        let summary = handle.join().unwrap().unwrap();
        assert!(summary.cancelled);
        assert!(summary.records < 1_000);
    }

    #[test]
    fn test_worker_reports_missing_file() {
        let (rx, handle) = spawn_stream(PathBuf::from("/nonexistent/stream.log"), config(10));
        assert!(rx.iter().next().is_none());
        assert!(handle.join().unwrap().is_err());
    }
}
