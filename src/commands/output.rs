use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::models::{DisplayChannel, LogLevel, LogRecord};
use crate::statistics::ParsingStatistics;
use colored::*;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    Plain(W),
}

/// Writes records in one of the CLI output formats.
///
/// JSON output is a single array across all `write_record` calls, so
/// [`RecordWriter::finish`] must be called to close it.
pub struct RecordWriter<W: Write> {
    format: OutputFormat,
    highlight: Option<Regex>,
    sink: Sink<W>,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        let sink = match format {
            OutputFormat::Csv => Sink::Csv(csv::Writer::from_writer(writer)),
            _ => Sink::Plain(writer),
        };
        Self {
            format,
            highlight: None,
            sink,
            written: 0,
        }
    }

    /// Highlight matches of `pattern` in table output
    pub fn with_highlight(mut self, pattern: Option<&Regex>) -> Self {
        self.highlight = pattern.cloned();
        self
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_record(&mut self, record: &LogRecord) -> CommandResult {
        match &mut self.sink {
            Sink::Csv(writer) => writer.serialize(record)?,
            Sink::Plain(writer) => match self.format {
                OutputFormat::Json => {
                    let separator = if self.written == 0 { "[\n" } else { ",\n" };
                    write!(writer, "{}  {}", separator, serde_json::to_string(record)?)?;
                }
                OutputFormat::Ndjson => writeln!(writer, "{}", serde_json::to_string(record)?)?,
                OutputFormat::Raw => writeln!(writer, "{}", format_raw(record))?,
                _ => writeln!(writer, "{}", format_table(record, self.highlight.as_ref()))?,
            },
        }
        self.written += 1;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, records: I) -> CommandResult
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Close the output and hand back the underlying writer
    pub fn finish(self) -> CommandResult<W> {
        match self.sink {
            Sink::Csv(writer) => Ok(writer.into_inner().map_err(|e| e.into_error())?),
            Sink::Plain(mut writer) => {
                if self.format == OutputFormat::Json {
                    let close = if self.written == 0 { "[]\n" } else { "\n]\n" };
                    writer.write_all(close.as_bytes())?;
                }
                writer.flush()?;
                Ok(writer)
            }
        }
    }
}

/// Render a single summary document: one compact line for NDJSON, pretty otherwise
pub fn json_document<T: Serialize>(value: &T, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Ndjson => serde_json::to_string(value),
        _ => serde_json::to_string_pretty(value),
    }
}

fn colored_level(level: LogLevel) -> ColoredString {
    let code = level.as_str();
    match level {
        LogLevel::Fatal | LogLevel::Assert => code.red().bold(),
        LogLevel::Error => code.red(),
        LogLevel::Warn => code.yellow(),
        LogLevel::Info => code.green(),
        LogLevel::Debug => code.blue(),
        LogLevel::Verbose | LogLevel::Silent | LogLevel::Unknown => code.dimmed(),
    }
}

fn colored_display(display: DisplayChannel) -> ColoredString {
    let label = format!("{:<10}", display.to_string());
    match display {
        DisplayChannel::Main => label.dimmed(),
        DisplayChannel::Cluster => label.magenta(),
        DisplayChannel::Ivi => label.cyan(),
        DisplayChannel::Passenger => label.blue(),
        DisplayChannel::Display(_) => label.white(),
    }
}

fn format_table(record: &LogRecord, highlight: Option<&Regex>) -> String {
    let message = match highlight {
        Some(pattern) => pattern
            .replace_all(&record.message, |caps: &regex::Captures| {
                caps[0].to_string().on_yellow().black().to_string()
            })
            .to_string(),
        None => record.message.clone(),
    };

    format!(
        "{} {} {:>5} {:>5} {} {}: {}",
        record.timestamp.cyan(),
        colored_level(record.level),
        record.pid_str().dimmed(),
        record.tid_str().dimmed(),
        colored_display(record.display),
        record.tag.bold(),
        message
    )
}

/// Threadtime-style text line
pub fn format_raw(record: &LogRecord) -> String {
    format!(
        "{} {:>5} {:>5} {} {}: {}",
        record.timestamp,
        record.pid_str(),
        record.tid_str(),
        record.level,
        record.tag,
        record.message
    )
}

/// Short run summary for stderr
pub fn print_run_summary(label: &str, records: usize, lines: Option<usize>, elapsed: Duration) {
    let elapsed = humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64));
    match lines {
        Some(lines) => eprintln!(
            "{} {} records from {} lines in {}",
            label.cyan().bold(),
            records.to_string().white().bold(),
            lines,
            elapsed
        ),
        None => eprintln!("{} {} records in {}", label.cyan().bold(), records.to_string().white().bold(), elapsed),
    }
}

/// Colored statistics summary
pub fn print_stats_summary(stats: &ParsingStatistics, files: usize, top: usize) {
    let total = stats.total_lines.max(1) as f64;

    println!("\n{}", "═".repeat(50).cyan());
    println!("{}", "SUMMARY".cyan().bold());
    println!("{}", "═".repeat(50).cyan());
    println!("Files:            {}", files.to_string().white().bold());
    println!("Total lines:      {}", stats.total_lines.to_string().white().bold());
    println!(
        "Records:          {} ({:.1}%)",
        stats.records.to_string().green(),
        stats.success_rate()
    );
    println!(
        "Rejected:         {} ({:.1}%)",
        stats.rejected().to_string().yellow(),
        stats.rejected() as f64 / total * 100.0
    );
    println!(
        "Elapsed:          {}",
        humantime::format_duration(Duration::from_millis(stats.elapsed().as_millis() as u64))
    );
    if let Some(throughput) = stats.throughput() {
        println!("Throughput:       {:.0} lines/s", throughput);
    }

    if !stats.rejections.is_empty() {
        println!("\n{}:", "Rejections".dimmed());
        for (reason, count) in &stats.rejections {
            println!("  {:20} {:>8}", reason.name(), count);
        }
    }

    if !stats.layout_distribution.is_empty() {
        println!("\n{}:", "Layouts".dimmed());
        for (layout, count) in &stats.layout_distribution {
            println!("  {:20} {:>8}", layout.name(), count);
        }
    }

    if !stats.level_distribution.is_empty() {
        println!("\n{}:", "Level Distribution".cyan().bold());
        let records = stats.records.max(1) as f64;
        for (level, count) in &stats.level_distribution {
            let share = *count as f64 / records;
            let bar = "█".repeat((share * 40.0) as usize);
            println!("  {:3} {:>8} ({:5.1}%) {}", colored_level(*level), count, share * 100.0, bar.green());
        }
    }

    if !stats.display_distribution.is_empty() {
        println!("\n{}:", "Displays".cyan().bold());
        for (display, count) in &stats.display_distribution {
            println!("  {} {:>8}", colored_display(*display), count);
        }
    }

    let tags = stats.top_tags(top);
    if !tags.is_empty() {
        println!("\n{} {} tags:", "Top".cyan().bold(), tags.len());
        for (tag, count) in tags {
            println!("  {:40} {:>8}", tag, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_line;

    fn sample() -> Vec<LogRecord> {
        [
            "01-25 12:34:56.789  1234  -  -  E  MyTag: Hello, world",
            "01-25 12:34:57.000  E  -  -  10  -  E  Svc: \"quoted\"",
        ]
        .iter()
        .map(|line| parse_line(line).unwrap())
        .collect()
    }

    fn render(format: OutputFormat, records: &[LogRecord]) -> String {
        let mut writer = RecordWriter::new(format, Vec::new());
        writer.write_all(records).unwrap();
        assert_eq!(writer.written(), records.len());
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_json_is_one_array() {
        let out = render(OutputFormat::Json, &sample());
        let parsed: Vec<LogRecord> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(render(OutputFormat::Json, &[]).trim(), "[]");
    }

    #[test]
    fn test_ndjson_lines() {
        let out = render(OutputFormat::Ndjson, &sample());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["tid"], "-");
        assert_eq!(value["display"], "Main");
    }

    #[test]
    fn test_csv_has_header_and_quoting() {
        let out = render(OutputFormat::Csv, &sample());
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["timestamp", "level", "pid", "tid", "tag", "message", "display"]
        );
        let rows: Vec<LogRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, sample());
    }

    #[test]
    fn test_json_document_ndjson_is_one_line() {
        let value = serde_json::json!({ "files": ["a.log", "b.log"], "total": 3 });
        let line = json_document(&value, OutputFormat::Ndjson).unwrap();
        assert_eq!(line.lines().count(), 1);
        assert_eq!(serde_json::from_str::<serde_json::Value>(&line).unwrap(), value);

        let pretty = json_document(&value, OutputFormat::Json).unwrap();
        assert!(pretty.lines().count() > 1);
    }

    #[test]
    fn test_raw_line() {
        let out = render(OutputFormat::Raw, &sample()[..1]);
        assert_eq!(out, "01-25 12:34:56.789  1234     - E MyTag: Hello, world\n");
    }

    #[test]
    fn test_table_contains_fields() {
        colored::control::set_override(false);
        let out = render(OutputFormat::Table, &sample()[..1]);
        assert!(out.contains("MyTag: Hello, world"));
        assert!(out.contains("Main"));
    }
}
