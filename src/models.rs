use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel used at the record boundary for absent ids and unknown levels
pub const ABSENT: &str = "-";

/// Single-character logcat severity codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "V")]
    Verbose,
    #[serde(rename = "D")]
    Debug,
    #[serde(rename = "I")]
    Info,
    #[serde(rename = "W")]
    Warn,
    #[serde(rename = "E")]
    Error,
    #[serde(rename = "F")]
    Fatal,
    #[serde(rename = "A")]
    Assert,
    #[serde(rename = "S")]
    Silent,
    /// The layout carried no level field
    #[serde(rename = "-")]
    Unknown,
}

impl LogLevel {
    /// Map a logcat level letter to a level. Only upper-case codes are accepted,
    /// which is what the device emits.
    pub fn from_code(code: char) -> Option<LogLevel> {
        match code {
            'V' => Some(LogLevel::Verbose),
            'D' => Some(LogLevel::Debug),
            'I' => Some(LogLevel::Info),
            'W' => Some(LogLevel::Warn),
            'E' => Some(LogLevel::Error),
            'F' => Some(LogLevel::Fatal),
            'A' => Some(LogLevel::Assert),
            'S' => Some(LogLevel::Silent),
            _ => None,
        }
    }

    /// Parse a level from user input: a code letter (any case), a full name, or `-`
    pub fn from_str(s: &str) -> Option<LogLevel> {
        let s = s.trim();
        if s == ABSENT {
            return Some(LogLevel::Unknown);
        }
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return LogLevel::from_code(c.to_ascii_uppercase());
        }
        match s.to_lowercase().as_str() {
            "verbose" | "trace" => Some(LogLevel::Verbose),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "fatal" => Some(LogLevel::Fatal),
            "assert" => Some(LogLevel::Assert),
            "silent" => Some(LogLevel::Silent),
            "unknown" => Some(LogLevel::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "V",
            LogLevel::Debug => "D",
            LogLevel::Info => "I",
            LogLevel::Warn => "W",
            LogLevel::Error => "E",
            LogLevel::Fatal => "F",
            LogLevel::Assert => "A",
            LogLevel::Silent => "S",
            LogLevel::Unknown => ABSENT,
        }
    }

    /// True for E, F and A
    pub fn is_error(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Fatal | LogLevel::Assert)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Virtual display channel a record is routed to on a multi-display head unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DisplayChannel {
    Main,
    Cluster,
    Ivi,
    Passenger,
    /// A numeric display id with no named channel
    Display(u32),
}

impl DisplayChannel {
    /// Map an explicit display id to its channel
    pub fn from_id(id: u32) -> DisplayChannel {
        match id {
            0 => DisplayChannel::Main,
            1 => DisplayChannel::Cluster,
            2 => DisplayChannel::Ivi,
            n => DisplayChannel::Display(n),
        }
    }

    /// Channel name without the numeric id
    pub fn name(&self) -> &'static str {
        match self {
            DisplayChannel::Main => "Main",
            DisplayChannel::Cluster => "Cluster",
            DisplayChannel::Ivi => "IVI",
            DisplayChannel::Passenger => "Passenger",
            DisplayChannel::Display(_) => "Display",
        }
    }
}

impl fmt::Display for DisplayChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayChannel::Display(n) => write!(f, "Display {}", n),
            other => f.write_str(other.name()),
        }
    }
}

impl From<DisplayChannel> for String {
    fn from(channel: DisplayChannel) -> Self {
        channel.to_string()
    }
}

impl TryFrom<String> for DisplayChannel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "Main" => Ok(DisplayChannel::Main),
            "Cluster" => Ok(DisplayChannel::Cluster),
            "IVI" => Ok(DisplayChannel::Ivi),
            "Passenger" => Ok(DisplayChannel::Passenger),
            other => other
                .strip_prefix("Display")
                .map(str::trim)
                .and_then(|id| id.parse::<u32>().ok())
                .map(DisplayChannel::Display)
                .ok_or_else(|| format!("unknown display channel '{}'", value)),
        }
    }
}

/// Line layouts recognised by the pattern matcher, in match priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layout {
    DetailedThreadtime,
    SimpleThreadtime,
    LevelTag,
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Layout::DetailedThreadtime => "detailed threadtime",
            Layout::SimpleThreadtime => "simple threadtime",
            Layout::LevelTag => "level/tag",
        }
    }
}

/// One parsed logcat line.
///
/// Serializes to a flat map with exactly the keys `timestamp`, `level`, `pid`,
/// `tid`, `tag`, `message` and `display`, all strings. Absent ids and the unknown
/// level are written as `-`, the convention of the raw log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRecord {
    /// `MM-DD HH:MM:SS.mmm`, kept verbatim
    pub timestamp: String,
    pub level: LogLevel,
    #[serde(with = "id_sentinel")]
    pub pid: Option<u32>,
    #[serde(with = "id_sentinel")]
    pub tid: Option<u32>,
    pub tag: String,
    pub message: String,
    pub display: DisplayChannel,
}

impl LogRecord {
    /// Interpret the timestamp in the given calendar year.
    ///
    /// Logcat timestamps carry no year, so the caller has to supply one.
    /// Returns `None` for impossible dates such as `02-30`.
    pub fn timestamp_in_year(&self, year: i32) -> Option<NaiveDateTime> {
        let normalized = self.timestamp.split_whitespace().collect::<Vec<_>>().join(" ");
        let with_year = format!("{}-{}", year, normalized);
        NaiveDateTime::parse_from_str(&with_year, "%Y-%m-%d %H:%M:%S%.3f").ok()
    }

    pub fn pid_str(&self) -> String {
        id_to_string(self.pid)
    }

    pub fn tid_str(&self) -> String {
        id_to_string(self.tid)
    }
}

fn id_to_string(id: Option<u32>) -> String {
    id.map(|v| v.to_string()).unwrap_or_else(|| ABSENT.to_string())
}

/// Serde adapter writing `Option<u32>` as a string with `-` for `None`
mod id_sentinel {
    use super::ABSENT;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(ABSENT),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw == ABSENT || raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<u32>().map(Some).map_err(de::Error::custom)
    }
}
