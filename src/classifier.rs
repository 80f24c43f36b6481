//! Virtual display classification for multi-display automotive builds.
//!
//! Android Automotive head units drive several displays (main, instrument
//! cluster, IVI, passenger screens) from one log stream. The channel is not a
//! field of the log line, so it is inferred from the tag and message text.

use crate::models::DisplayChannel;
use regex::Regex;
use std::sync::LazyLock;

static DISPLAY_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)display(?:\s*id)?(?:\s*[:=]\s*|\s+)([0-9]+)").expect("display id pattern is valid")
});

/// Assign a display channel to a record.
///
/// Rules, first match wins:
/// 1. an explicit display id in the message, then the tag (`0` Main, `1` Cluster,
///    `2` IVI, anything else `Display(n)`)
/// 2. `passenger` in the tag or message
/// 3. `cluster` in the tag, then `infotainment` in the tag or `ivi` as a
///    whole word of it (`CarIVIService`, `ivi_hal`, but not `ActivityManager`)
/// 4. Main
pub fn classify(tag: &str, message: &str) -> DisplayChannel {
    if let Some(id) = explicit_display_id(message).or_else(|| explicit_display_id(tag)) {
        return DisplayChannel::from_id(id);
    }

    let tag_lower = tag.to_ascii_lowercase();
    if tag_lower.contains("passenger") || contains_ignore_ascii_case(message, "passenger") {
        return DisplayChannel::Passenger;
    }

    // "ivi" is also a substring of "activity", so it has to be a word of its own.
    if tag_lower.contains("cluster") {
        DisplayChannel::Cluster
    } else if tag_lower.contains("infotainment") || tag_words(tag).any(|w| w.eq_ignore_ascii_case("ivi")) {
        DisplayChannel::Ivi
    } else {
        DisplayChannel::Main
    }
}

/// First `displayId`/`display` number in `text` that fits in a `u32`
pub fn explicit_display_id(text: &str) -> Option<u32> {
    DISPLAY_ID_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| m.as_str().parse::<u32>().ok())
}

/// Split a tag into words at non-alphanumeric characters and camel-case
/// humps. An upper-case run keeps its last letter for the next word when a
/// lower-case letter follows, so `CarIVIService` gives `Car`, `IVI`, `Service`.
fn tag_words(tag: &str) -> impl Iterator<Item = &str> {
    let chars: Vec<(usize, char)> = tag.char_indices().collect();
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &(pos, c)) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if let Some(s) = start.take() {
                words.push(&tag[s..pos]);
            }
            continue;
        }
        match start {
            None => start = Some(pos),
            Some(s) => {
                let prev = chars[i - 1].1;
                let next_lower = chars.get(i + 1).is_some_and(|&(_, n)| n.is_lowercase());
                let hump = c.is_uppercase()
                    && (prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower));
                if hump {
                    words.push(&tag[s..pos]);
                    start = Some(pos);
                }
            }
        }
    }
    if let Some(s) = start {
        words.push(&tag[s..]);
    }
    words.into_iter()
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
