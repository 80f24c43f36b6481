use crate::cli::{OutputFormat, StatsArgs};
use crate::commands::output::{json_document, print_stats_summary};
use crate::commands::{expand_globs, CommandResult};
use crate::config::EngineConfig;
use crate::statistics::ParsingStatistics;
use crate::streaming_parser::StreamingParser;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct StatsReport<'a> {
    files: &'a [PathBuf],
    statistics: &'a ParsingStatistics,
    top_tags: Vec<(&'a str, usize)>,
}

pub fn run_stats(args: StatsArgs, config: &EngineConfig) -> CommandResult {
    let files = expand_globs(&args.files)?;
    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let stats = collect_statistics(&files, config)?;

    match args.output {
        OutputFormat::Json | OutputFormat::Ndjson => {
            let report = StatsReport {
                files: &files,
                statistics: &stats,
                top_tags: stats.top_tags(args.top),
            };
            println!("{}", json_document(&report, args.output)?);
        }
        _ => print_stats_summary(&stats, files.len(), args.top),
    }
    Ok(())
}

/// Stream every file once with statistics enabled and merge the results
pub fn collect_statistics(files: &[PathBuf], config: &EngineConfig) -> CommandResult<ParsingStatistics> {
    let per_file: Result<Vec<_>, _> = files
        .par_iter()
        .map(|path| file_statistics(path, config))
        .collect();

    let mut total = ParsingStatistics::new();
    for stats in per_file? {
        total.merge(&stats);
    }
    Ok(total)
}

fn file_statistics(path: &Path, config: &EngineConfig) -> crate::error::Result<ParsingStatistics> {
    let mut streaming = config.streaming_config();
    streaming.collect_statistics = true;

    let mut parser = StreamingParser::with_config(streaming);
    parser.stream_file(path, |_, _, _| true)?;
    Ok(parser.statistics().cloned().unwrap_or_default())
}
