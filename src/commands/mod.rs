pub mod count;
pub mod output;
pub mod parse;
pub mod stats;
pub mod stream;

pub use count::run_count;
pub use parse::run_parse;
pub use stats::run_stats;
pub use stream::run_stream;

use crate::cli::FilterArgs;
use crate::config::EngineConfig;
use crate::models::{DisplayChannel, LogLevel, LogRecord};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use glob::glob;
use regex::Regex;
use std::error::Error;
use std::path::{Path, PathBuf};

pub type CommandResult<T = ()> = Result<T, Box<dyn Error>>;

/// Load the engine config named by `--config`, or the defaults
pub fn load_config(path: Option<&Path>) -> CommandResult<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::from_json_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

pub fn expand_globs(patterns: &[PathBuf]) -> CommandResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();
        if pattern_str.contains('*') || pattern_str.contains('?') || pattern_str.contains('[') {
            for entry in glob(&pattern_str)? {
                files.push(entry?);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}

/// Parse a `--since` / `--until` value into local wall-clock time
pub fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    // Relative, e.g. "90s ago" or "1h 30m ago"
    let duration = humantime::parse_duration(s.trim_end_matches("ago").trim()).ok()?;
    let now = Local::now().naive_local();
    Some(now - chrono::Duration::from_std(duration).ok()?)
}

/// Parse a `--display` value: a channel name or a numeric display id
pub fn parse_display(s: &str) -> Option<DisplayChannel> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "main" => Some(DisplayChannel::Main),
        "cluster" => Some(DisplayChannel::Cluster),
        "ivi" | "infotainment" => Some(DisplayChannel::Ivi),
        "passenger" => Some(DisplayChannel::Passenger),
        _ => s
            .parse::<u32>()
            .ok()
            .map(DisplayChannel::from_id)
            .or_else(|| DisplayChannel::try_from(s.to_string()).ok()),
    }
}

/// Filters compiled once from [`FilterArgs`] and applied to each record
#[derive(Debug, Default)]
pub struct RecordFilter {
    levels: Option<Vec<LogLevel>>,
    tag: Option<String>,
    grep: Option<Regex>,
    display: Option<DisplayChannel>,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
    year: i32,
}

impl RecordFilter {
    pub fn from_args(args: &FilterArgs) -> CommandResult<Self> {
        let levels = match &args.level {
            Some(names) => {
                let mut levels = Vec::with_capacity(names.len());
                for name in names {
                    let level = LogLevel::from_str(name).ok_or_else(|| format!("unknown level '{}'", name))?;
                    levels.push(level);
                }
                Some(levels)
            }
            None => None,
        };
        let grep = match &args.grep {
            Some(pattern) => Some(Regex::new(&format!("(?i){}", pattern))?),
            None => None,
        };
        let display = match &args.display {
            Some(value) => Some(parse_display(value).ok_or_else(|| format!("unknown display '{}'", value))?),
            None => None,
        };
        let since = match &args.since {
            Some(value) => Some(parse_time(value).ok_or_else(|| format!("cannot parse time '{}'", value))?),
            None => None,
        };
        let until = match &args.until {
            Some(value) => Some(parse_time(value).ok_or_else(|| format!("cannot parse time '{}'", value))?),
            None => None,
        };

        Ok(Self {
            levels,
            tag: args.tag.as_ref().map(|t| t.to_lowercase()),
            grep,
            display,
            since,
            until,
            year: args.year.unwrap_or_else(|| Local::now().year()),
        })
    }

    /// The compiled `--grep` pattern, for highlighting
    pub fn grep(&self) -> Option<&Regex> {
        self.grep.as_ref()
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(ref levels) = self.levels {
            if !levels.contains(&record.level) {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !record.tag.to_lowercase().contains(tag.as_str()) {
                return false;
            }
        }
        if let Some(display) = self.display {
            if record.display != display {
                return false;
            }
        }
        if let Some(ref pattern) = self.grep {
            if !pattern.is_match(&record.message) {
                return false;
            }
        }

        if self.since.is_some() || self.until.is_some() {
            // Records whose timestamp is not a real date cannot be placed in a range.
            let Some(ts) = record.timestamp_in_year(self.year) else {
                return false;
            };
            if self.since.is_some_and(|start| ts < start) {
                return false;
            }
            if self.until.is_some_and(|end| ts > end) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_line;

    fn record(line: &str) -> LogRecord {
        parse_line(line).unwrap()
    }

    fn filter(args: FilterArgs) -> RecordFilter {
        RecordFilter::from_args(&args).unwrap()
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(
            parse_time("2025-01-25 12:34:56"),
            NaiveDate::from_ymd_opt(2025, 1, 25).unwrap().and_hms_opt(12, 34, 56)
        );
        assert_eq!(
            parse_time("2025-01-25"),
            NaiveDate::from_ymd_opt(2025, 1, 25).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_time("1h ago").is_some());
        assert!(parse_time("yesterday-ish").is_none());
    }

    #[test]
    fn test_parse_display() {
        assert_eq!(parse_display("Cluster"), Some(DisplayChannel::Cluster));
        assert_eq!(parse_display("ivi"), Some(DisplayChannel::Ivi));
        assert_eq!(parse_display("0"), Some(DisplayChannel::Main));
        assert_eq!(parse_display("7"), Some(DisplayChannel::Display(7)));
        assert_eq!(parse_display("Display 9"), Some(DisplayChannel::Display(9)));
        assert_eq!(parse_display("dashboard"), None);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let r = record("01-25 12:34:56.789  1234  -  -  MyTag: Hello");
        assert!(RecordFilter::default().matches(&r));
        assert!(filter(FilterArgs::default()).matches(&r));
    }

    #[test]
    fn test_level_tag_and_grep() {
        let r = record("01-25 12:34:56.789  E  -  -  12  13  E  AudioService: focus lost");
        let f = filter(FilterArgs {
            level: Some(vec!["E".into(), "warn".into()]),
            tag: Some("audio".into()),
            grep: Some("FOCUS".into()),
            ..Default::default()
        });
        assert!(f.matches(&r));

        let f = filter(FilterArgs {
            level: Some(vec!["I".into()]),
            ..Default::default()
        });
        assert!(!f.matches(&r));
    }

    #[test]
    fn test_display_filter() {
        let cluster = record("01-25 12:34:56.789 I/VhalCluster( 10 11 ) speed=42");
        let main = record("01-25 12:34:56.789 I/Launcher( 10 11 ) resumed");
        let f = filter(FilterArgs {
            display: Some("cluster".into()),
            ..Default::default()
        });
        assert!(f.matches(&cluster));
        assert!(!f.matches(&main));
    }

    #[test]
    fn test_time_range_uses_year() {
        let r = record("01-25 12:34:56.789  1  -  -  Tag: x");
        let inside = filter(FilterArgs {
            since: Some("2024-01-25 12:00:00".into()),
            until: Some("2024-01-25 13:00:00".into()),
            year: Some(2024),
            ..Default::default()
        });
        assert!(inside.matches(&r));

        let other_year = filter(FilterArgs {
            since: Some("2024-01-25 12:00:00".into()),
            year: Some(2023),
            ..Default::default()
        });
        assert!(!other_year.matches(&r));
    }

    #[test]
    fn test_bad_filter_values_are_errors() {
        let bad_level = FilterArgs {
            level: Some(vec!["loud".into()]),
            ..Default::default()
        };
        assert!(RecordFilter::from_args(&bad_level).is_err());

        let bad_regex = FilterArgs {
            grep: Some("(".into()),
            ..Default::default()
        };
        assert!(RecordFilter::from_args(&bad_regex).is_err());
    }
}
