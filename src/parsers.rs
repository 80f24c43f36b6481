use crate::classifier::classify;
use crate::error::LineRejection;
use crate::models::*;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Raw fields extracted by a layout matcher, borrowed from the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFields<'a> {
    pub level: LogLevel,
    pub pid: Option<&'a str>,
    pub tid: Option<&'a str>,
    pub tag: &'a str,
    pub message: &'a str,
}

/// Recognises one line layout in the text that follows the timestamp
pub trait LayoutMatcher: Send + Sync {
    fn layout(&self) -> Layout;

    /// Extract fields from `rest`, or `None` when the layout does not fit
    fn match_fields<'a>(&self, rest: &'a str) -> Option<RawFields<'a>>;
}

pub mod detailed_threadtime;
pub mod level_tag;
pub mod simple_threadtime;

pub use detailed_threadtime::DetailedThreadtimeMatcher;
pub use level_tag::LevelTagMatcher;
pub use simple_threadtime::SimpleThreadtimeMatcher;

/// Compiled patterns shared by every parse call
struct PatternSet {
    timestamp: Regex,
    matchers: Vec<Box<dyn LayoutMatcher>>,
}

static PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| PatternSet {
    timestamp: Regex::new(
        r"^([0-9]{2}-[0-9]{2}\s+[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3})(?:\s+(.*))?$",
    )
    .expect("timestamp pattern is valid"),
    // First match wins.
    matchers: vec![
        Box::new(DetailedThreadtimeMatcher::new()),
        Box::new(SimpleThreadtimeMatcher::new()),
        Box::new(LevelTagMatcher::new()),
    ],
});

/// A record together with the layout that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub record: LogRecord,
    pub layout: Layout,
}

/// Parse one line into a record, or `None` for anything that is not a
/// recognised logcat line.
pub fn parse_line(line: &str) -> Option<LogRecord> {
    parse_line_detailed(line).ok().map(|parsed| parsed.record)
}

/// Like [`parse_line`] but reports the matched layout or why the line was rejected
pub fn parse_line_detailed(line: &str) -> Result<ParsedLine, LineRejection> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LineRejection::Blank);
    }

    let patterns = &*PATTERNS;
    let caps = patterns.timestamp.captures(line).ok_or(LineRejection::MissingTimestamp)?;
    let timestamp = group(&caps, 1).ok_or(LineRejection::MissingTimestamp)?;
    // A bare timestamp still has to go through the layouts to be rejected.
    let rest = group(&caps, 2).unwrap_or("");

    for matcher in &patterns.matchers {
        if let Some(fields) = matcher.match_fields(rest) {
            let record = build_record(timestamp, fields)?;
            return Ok(ParsedLine {
                record,
                layout: matcher.layout(),
            });
        }
    }

    Err(LineRejection::NoLayoutMatched)
}

/// The layouts tried by the matcher, in priority order
pub fn layouts() -> Vec<Layout> {
    PATTERNS.matchers.iter().map(|m| m.layout()).collect()
}

fn build_record(timestamp: &str, fields: RawFields<'_>) -> Result<LogRecord, LineRejection> {
    let tag = fields.tag.trim();
    if tag.is_empty() {
        return Err(LineRejection::EmptyTag);
    }
    let message = fields.message.trim();

    Ok(LogRecord {
        timestamp: timestamp.to_string(),
        level: fields.level,
        pid: parse_id(fields.pid)?,
        tid: parse_id(fields.tid)?,
        tag: tag.to_string(),
        message: message.to_string(),
        display: classify(tag, message),
    })
}

fn parse_id(raw: Option<&str>) -> Result<Option<u32>, LineRejection> {
    match raw {
        None => Ok(None),
        Some(ABSENT) => Ok(None),
        Some(digits) => digits
            .parse::<u32>()
            .map(Some)
            .map_err(|_| LineRejection::InvalidId),
    }
}

/// Capture group as a slice of the haystack
pub(crate) fn group<'h>(caps: &Captures<'h>, index: usize) -> Option<&'h str> {
    caps.get(index).map(|m| m.as_str())
}

/// Level letter captured by a matcher; the patterns only admit valid codes
pub(crate) fn level_group(caps: &Captures<'_>, index: usize) -> Option<LogLevel> {
    group(caps, index)?.chars().next().and_then(LogLevel::from_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_simple_threadtime_with_level_token() {
        let record = parse_line("01-25 12:34:56.789  1234  -  -  E  MyTag: Hello").unwrap();
        assert_eq!(record.timestamp, "01-25 12:34:56.789");
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.pid, Some(1234));
        assert_eq!(record.tid, None);
        assert_eq!(record.tag, "MyTag");
        assert_eq!(record.message, "Hello");
        assert_eq!(record.display, DisplayChannel::Main);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "timestamp": "01-25 12:34:56.789",
                "level": "E",
                "pid": "1234",
                "tid": "-",
                "tag": "MyTag",
                "message": "Hello",
                "display": "Main",
            })
        );
    }

    #[test]
    fn test_standard_threadtime_is_not_a_recognised_layout() {
        let line = "01-25 12:34:56.789  1234  5678  E  Tag: Message";
        assert_eq!(parse_line_detailed(line), Err(LineRejection::NoLayoutMatched));
        assert!(parse_line(line).is_none());
    }

    #[test]
    fn test_detailed_threadtime_takes_priority() {
        let parsed =
            parse_line_detailed("03-17 16:13:38.811  I  -  -  1702  2395  W  WindowManager: focus changed")
                .unwrap();
        assert_eq!(parsed.layout, Layout::DetailedThreadtime);
        assert_eq!(parsed.record.level, LogLevel::Warn);
        assert_eq!(parsed.record.pid, Some(1702));
        assert_eq!(parsed.record.tid, Some(2395));
        assert_eq!(parsed.record.tag, "WindowManager");
        assert_eq!(parsed.record.message, "focus changed");
    }

    #[test]
    fn test_level_tag_layout() {
        let parsed = parse_line_detailed("01-25 12:34:56.789 D/CarService( 812  901 ) boot completed").unwrap();
        assert_eq!(parsed.layout, Layout::LevelTag);
        assert_eq!(parsed.record.level, LogLevel::Debug);
        assert_eq!(parsed.record.tag, "CarService");
        assert_eq!(parsed.record.pid, Some(812));
        assert_eq!(parsed.record.tid, Some(901));
        assert_eq!(parsed.record.message, "boot completed");
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(parse_line_detailed(""), Err(LineRejection::Blank));
        assert_eq!(parse_line_detailed("   \t "), Err(LineRejection::Blank));
        assert_eq!(
            parse_line_detailed("\tat com.android.server.Foo.bar(Foo.java:42)"),
            Err(LineRejection::MissingTimestamp)
        );
        assert_eq!(
            parse_line_detailed("--------- beginning of main"),
            Err(LineRejection::MissingTimestamp)
        );
        assert_eq!(
            parse_line_detailed("01-25 12:34:56.789  99999999999  -  -  Tag: overflow"),
            Err(LineRejection::InvalidId)
        );
        assert_eq!(
            parse_line_detailed("01-25 12:34:56.789 E/  ( 1 2 ) nothing"),
            Err(LineRejection::EmptyTag)
        );
    }

    #[test]
    fn test_bare_timestamp_matches_no_layout() {
        assert_eq!(parse_line_detailed("01-25 12:34:56.789"), Err(LineRejection::NoLayoutMatched));
        assert_eq!(parse_line_detailed("01-25 12:34:56.789   "), Err(LineRejection::NoLayoutMatched));
        assert_eq!(
            parse_line_detailed("01-25 12:34:56.7890  1  -  -  Tag: x"),
            Err(LineRejection::MissingTimestamp)
        );
    }

    #[test]
    fn test_message_keeps_delimiters() {
        let record = parse_line("01-25 12:34:56.789  1234  -  -  Net: url=http://host:80/a - b").unwrap();
        assert_eq!(record.tag, "Net");
        assert_eq!(record.message, "url=http://host:80/a - b");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let a = parse_line("  01-25 12:34:56.789  1234  -  -  Tag: body  \r").unwrap();
        let b = parse_line("01-25 12:34:56.789  1234  -  -  Tag: body").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_layout_priority_order() {
        assert_eq!(
            layouts(),
            vec![Layout::DetailedThreadtime, Layout::SimpleThreadtime, Layout::LevelTag]
        );
    }

    #[quickcheck]
    fn prop_parse_line_is_deterministic(line: String) -> bool {
        parse_line_detailed(&line) == parse_line_detailed(&line)
    }

    #[quickcheck]
    fn prop_generated_simple_lines_parse(pid: u32, tag: String, message: String) -> bool {
        let tag: String = tag.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let message: String = message.chars().filter(|c| !c.is_control()).collect();
        // A leading single-letter token would be read as the level.
        if tag.is_empty() || tag.len() == 1 {
            return true;
        }
        let line = format!("01-25 12:34:56.789  {}  -  -  {}: {}", pid, tag, message);
        match parse_line(&line) {
            Some(record) => {
                record.pid == Some(pid)
                    && record.tid.is_none()
                    && record.tag == tag
                    && record.message == message.trim()
                    && record.level == LogLevel::Unknown
            }
            None => false,
        }
    }
}
