use crate::models::{Layout, LogLevel};
use crate::parsers::{group, level_group, LayoutMatcher, RawFields};
use regex::Regex;

/// `pid  -  -  [L]  tag: message`
///
/// No tid. A single level letter standing alone before the tag is picked up;
/// without it the level is [`LogLevel::Unknown`].
pub struct SimpleThreadtimeMatcher {
    pattern: Regex,
}

impl SimpleThreadtimeMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^([0-9]+)\s+-\s+-\s+(?:([VDIWEAFS])\s+)?([^:]+):\s*(.*)$")
                .expect("simple threadtime pattern is valid"),
        }
    }
}

impl Default for SimpleThreadtimeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutMatcher for SimpleThreadtimeMatcher {
    fn layout(&self) -> Layout {
        Layout::SimpleThreadtime
    }

    fn match_fields<'a>(&self, rest: &'a str) -> Option<RawFields<'a>> {
        let caps = self.pattern.captures(rest)?;
        let level = match caps.get(2) {
            Some(_) => level_group(&caps, 2)?,
            None => LogLevel::Unknown,
        };
        Some(RawFields {
            level,
            pid: Some(group(&caps, 1)?),
            tid: None,
            tag: group(&caps, 3)?,
            message: group(&caps, 4)?,
        })
    }
}
