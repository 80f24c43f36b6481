use crate::error::LineRejection;
use crate::models::*;
use crate::parsers::ParsedLine;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::time::Duration;

/// Counters collected over one or more parsing passes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingStatistics {
    /// Lines offered to the parser
    pub total_lines: usize,
    /// Lines that produced a record
    pub records: usize,
    /// Rejected lines by reason
    pub rejections: BTreeMap<LineRejection, usize>,
    pub level_distribution: BTreeMap<LogLevel, usize>,
    pub display_distribution: BTreeMap<DisplayChannel, usize>,
    pub layout_distribution: BTreeMap<Layout, usize>,
    pub tag_counts: HashMap<String, usize>,
    /// Wall time spent in the passes, in microseconds
    pub elapsed_micros: u64,
}

impl ParsingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, parsed: &ParsedLine) {
        self.total_lines += 1;
        self.records += 1;
        *self.level_distribution.entry(parsed.record.level).or_insert(0) += 1;
        *self.display_distribution.entry(parsed.record.display).or_insert(0) += 1;
        *self.layout_distribution.entry(parsed.layout).or_insert(0) += 1;
        match self.tag_counts.get_mut(parsed.record.tag.as_str()) {
            Some(count) => *count += 1,
            None => {
                self.tag_counts.insert(parsed.record.tag.clone(), 1);
            }
        }
    }

    pub fn record_rejection(&mut self, rejection: LineRejection) {
        self.total_lines += 1;
        *self.rejections.entry(rejection).or_insert(0) += 1;
    }

    pub fn record_elapsed(&mut self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.elapsed_micros = self.elapsed_micros.saturating_add(micros);
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_micros)
    }

    /// Number of lines that produced no record
    pub fn rejected(&self) -> usize {
        self.rejections.values().sum()
    }

    /// Records as a percentage of lines seen
    pub fn success_rate(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (self.records as f64 / self.total_lines as f64) * 100.0
        }
    }

    /// Lines per second over the recorded wall time
    pub fn throughput(&self) -> Option<f64> {
        if self.elapsed_micros == 0 {
            None
        } else {
            Some(self.total_lines as f64 / (self.elapsed_micros as f64 / 1_000_000.0))
        }
    }

    /// Most frequent tags, ties broken by name
    pub fn top_tags(&self, n: usize) -> Vec<(&str, usize)> {
        let mut tags: Vec<(&str, usize)> = self
            .tag_counts
            .iter()
            .map(|(tag, count)| (tag.as_str(), *count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        tags.truncate(n);
        tags
    }

    /// Fold another pass into this one
    pub fn merge(&mut self, other: &ParsingStatistics) {
        self.total_lines += other.total_lines;
        self.records += other.records;
        for (key, count) in &other.rejections {
            *self.rejections.entry(*key).or_insert(0) += count;
        }
        for (key, count) in &other.level_distribution {
            *self.level_distribution.entry(*key).or_insert(0) += count;
        }
        for (key, count) in &other.display_distribution {
            *self.display_distribution.entry(*key).or_insert(0) += count;
        }
        for (key, count) in &other.layout_distribution {
            *self.layout_distribution.entry(*key).or_insert(0) += count;
        }
        for (tag, count) in &other.tag_counts {
            *self.tag_counts.entry(tag.clone()).or_insert(0) += count;
        }
        self.elapsed_micros = self.elapsed_micros.saturating_add(other.elapsed_micros);
    }

    /// Plain-text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        let _ = writeln!(report, "=== Parsing Statistics Report ===");
        let _ = writeln!(report, "Total lines: {}", self.total_lines);
        let _ = writeln!(report, "Records: {} ({:.2}%)", self.records, self.success_rate());
        let _ = writeln!(report, "Rejected: {}", self.rejected());

        if !self.rejections.is_empty() {
            let _ = writeln!(report, "\n--- Rejections ---");
            for (reason, count) in &self.rejections {
                let _ = writeln!(report, "{}: {}", reason.name(), count);
            }
        }

        if !self.layout_distribution.is_empty() {
            let _ = writeln!(report, "\n--- Layouts ---");
            for (layout, count) in &self.layout_distribution {
                let _ = writeln!(report, "{}: {}", layout.name(), count);
            }
        }

        if !self.level_distribution.is_empty() {
            let _ = writeln!(report, "\n--- Levels ---");
            for (level, count) in &self.level_distribution {
                let _ = writeln!(report, "{}: {}", level, count);
            }
        }

        if !self.display_distribution.is_empty() {
            let _ = writeln!(report, "\n--- Displays ---");
            for (display, count) in &self.display_distribution {
                let _ = writeln!(report, "{}: {}", display, count);
            }
        }

        if let Some(throughput) = self.throughput() {
            let _ = writeln!(report, "\nThroughput: {:.0} lines/second", throughput);
        }

        report
    }
}
