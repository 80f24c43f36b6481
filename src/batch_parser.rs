use crate::models::LogRecord;
use crate::parsers::{parse_line, parse_line_detailed};
use crate::statistics::ParsingStatistics;
use std::time::Instant;

/// Parse every line, keeping only the ones that produce a record.
///
/// Output order follows input order. An empty input gives an empty output.
pub fn parse_batch<I>(lines: I) -> Vec<LogRecord>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| parse_line(line.as_ref()))
        .collect()
}

/// [`parse_batch`] that also records counters into `stats`
pub fn parse_batch_with_stats<I>(lines: I, stats: &mut ParsingStatistics) -> Vec<LogRecord>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let start = Instant::now();
    let lines = lines.into_iter();
    let mut records = Vec::with_capacity(lines.size_hint().0);

    for line in lines {
        match parse_line_detailed(line.as_ref()) {
            Ok(parsed) => {
                stats.record_success(&parsed);
                records.push(parsed.record);
            }
            Err(rejection) => stats.record_rejection(rejection),
        }
    }

    stats.record_elapsed(start.elapsed());
    records
}
