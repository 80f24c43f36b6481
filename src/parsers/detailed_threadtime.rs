use crate::models::Layout;
use crate::parsers::{group, level_group, LayoutMatcher, RawFields};
use regex::Regex;

/// `L  -  -  pid  tid  L  tag: message`
///
/// The level is printed twice; the one next to the tag is used. A tid of `-`
/// is accepted and treated as absent.
pub struct DetailedThreadtimeMatcher {
    pattern: Regex,
}

impl DetailedThreadtimeMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"^[VDIWEAFS]\s+-\s+-\s+([0-9]+)\s+([0-9]+|-)\s+([VDIWEAFS])\s+([^:]+):\s*(.*)$",
            )
            .expect("detailed threadtime pattern is valid"),
        }
    }
}

impl Default for DetailedThreadtimeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutMatcher for DetailedThreadtimeMatcher {
    fn layout(&self) -> Layout {
        Layout::DetailedThreadtime
    }

    fn match_fields<'a>(&self, rest: &'a str) -> Option<RawFields<'a>> {
        let caps = self.pattern.captures(rest)?;
        Some(RawFields {
            pid: Some(group(&caps, 1)?),
            tid: Some(group(&caps, 2)?),
            level: level_group(&caps, 3)?,
            tag: group(&caps, 4)?,
            message: group(&caps, 5)?,
        })
    }
}
