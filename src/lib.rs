pub mod models;
pub mod error;
pub mod parsers;
pub mod classifier;
pub mod statistics;
pub mod config;
pub mod batch_parser;
pub mod file_drivers;
pub mod streaming_parser;
pub mod cli;
pub mod commands;


pub use models::*;
pub use error::{EngineError, LineRejection, Result};
pub use parsers::{layouts, parse_line, parse_line_detailed, ParsedLine};
pub use classifier::{classify, explicit_display_id};
pub use statistics::ParsingStatistics;
pub use config::EngineConfig;
pub use batch_parser::{parse_batch, parse_batch_with_stats};
pub use file_drivers::{count_lines, load_file_batch};
pub use streaming_parser::{stream_file, StreamState, StreamSummary, StreamingConfig, StreamingParser};
