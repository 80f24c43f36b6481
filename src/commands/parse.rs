use crate::cli::ParseArgs;
use crate::commands::output::{print_run_summary, RecordWriter};
use crate::commands::{expand_globs, CommandResult, RecordFilter};
use crate::config::EngineConfig;
use crate::file_drivers::load_file_batch;
use crate::models::LogRecord;
use rayon::prelude::*;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

pub fn run_parse(args: ParseArgs, config: &EngineConfig) -> CommandResult {
    let start = Instant::now();
    let files = expand_globs(&args.files)?;

    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let filter = RecordFilter::from_args(&args.filter)?;
    let loaded = load_files(&files, config.batch_chunk_size)?;
    let loaded_records: usize = loaded.iter().map(|(_, records)| records.len()).sum();

    let output: Box<dyn Write> = match args.output_file {
        Some(ref path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(stdout().lock()),
    };
    let highlight = if args.highlight { filter.grep() } else { None };
    let mut writer = RecordWriter::new(args.output, output).with_highlight(highlight);

    let limit = args.limit.unwrap_or(usize::MAX);
    let selected = loaded
        .iter()
        .flat_map(|(_, records)| records.iter())
        .filter(|record| filter.matches(record))
        .take(limit);
    writer.write_all(selected)?;

    let written = writer.written();
    writer.finish()?;
    debug!(files = files.len(), loaded_records, written, "parse finished");

    if args.output_file.is_some() {
        print_run_summary("Parsed", written, None, start.elapsed());
    }
    Ok(())
}

/// Load every file in parallel; results keep the input order
pub fn load_files(files: &[PathBuf], chunk_size: usize) -> CommandResult<Vec<(PathBuf, Vec<LogRecord>)>> {
    let loaded: Result<Vec<_>, _> = files
        .par_iter()
        .map(|path| load_file_batch(path, chunk_size).map(|records| (path.clone(), records)))
        .collect();
    Ok(loaded?)
}
