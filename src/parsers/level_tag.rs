use crate::models::Layout;
use crate::parsers::{group, level_group, LayoutMatcher, RawFields};
use regex::Regex;

/// `L/tag(  pid  tid  ) message`
///
/// Either id may be missing from the parentheses. The `):` spelling of the
/// logcat `time` format is accepted as well.
pub struct LevelTagMatcher {
    pattern: Regex,
}

impl LevelTagMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"^([VDIWEAFS])/([^(]+)\(\s*([0-9]+)?(?:\s+([0-9]+))?\s*\)\s*:?\s*(.*)$",
            )
            .expect("level/tag pattern is valid"),
        }
    }
}

impl Default for LevelTagMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutMatcher for LevelTagMatcher {
    fn layout(&self) -> Layout {
        Layout::LevelTag
    }

    fn match_fields<'a>(&self, rest: &'a str) -> Option<RawFields<'a>> {
        let caps = self.pattern.captures(rest)?;
        Some(RawFields {
            level: level_group(&caps, 1)?,
            tag: group(&caps, 2)?,
            pid: group(&caps, 3),
            tid: group(&caps, 4),
            message: group(&caps, 5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogLevel;

    #[test]
    fn test_pid_and_tid() {
        let matcher = LevelTagMatcher::new();
        let fields = matcher.match_fields("I/ActivityManager(  512  530 ) Start proc").unwrap();
        assert_eq!(fields.level, LogLevel::Info);
        assert_eq!(fields.tag, "ActivityManager");
        assert_eq!(fields.pid, Some("512"));
        assert_eq!(fields.tid, Some("530"));
        assert_eq!(fields.message, "Start proc");
    }

    #[test]
    fn test_pid_only_with_colon() {
        let matcher = LevelTagMatcher::new();
        let fields = matcher.match_fields("W/InputReader( 1234): device removed").unwrap();
        assert_eq!(fields.pid, Some("1234"));
        assert_eq!(fields.tid, None);
        assert_eq!(fields.message, "device removed");
    }

    #[test]
    fn test_empty_parentheses() {
        let matcher = LevelTagMatcher::new();
        let fields = matcher.match_fields("E/Tag() boom").unwrap();
        assert_eq!(fields.pid, None);
        assert_eq!(fields.tid, None);
    }

    #[test]
    fn test_rejects_non_numeric_ids() {
        let matcher = LevelTagMatcher::new();
        assert!(matcher.match_fields("E/Tag( main ) boom").is_none());
        assert!(matcher.match_fields("E Tag( 1 2 ) boom").is_none());
    }
}
