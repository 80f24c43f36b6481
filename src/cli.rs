use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logcat-engine")]
#[command(author, version, about = "Fast parser for Android logcat dumps with display-channel classification")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Number of parallel threads for multi-file commands (0 = auto-detect)
    #[arg(long, short = 'j', global = true, default_value = "0")]
    pub parallel: usize,

    /// JSON file with engine settings (chunk sizes, read buffer)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse log files and print the records
    Parse(ParseArgs),

    /// Count lines without parsing
    Count(CountArgs),

    /// Parse one file in chunks, printing as records arrive
    Stream(StreamArgs),

    /// Show parsing statistics
    Stats(StatsArgs),
}

/// Record filters shared by `parse` and `stream`
#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// Keep only these levels (V, D, I, W, E, F, A, S or full names)
    #[arg(long, short, value_delimiter = ',')]
    pub level: Option<Vec<String>>,

    /// Keep records whose tag contains this text (case-insensitive)
    #[arg(long, short)]
    pub tag: Option<String>,

    /// Regex searched in the message (case-insensitive)
    #[arg(long, short)]
    pub grep: Option<String>,

    /// Keep only this display (main, cluster, ivi, passenger or a number)
    #[arg(long, short)]
    pub display: Option<String>,

    /// Start time (e.g. "2025-01-25 12:00:00", "2025-01-25", "1h ago")
    #[arg(long)]
    pub since: Option<String>,

    /// End time
    #[arg(long)]
    pub until: Option<String>,

    /// Year used to place timestamps for --since/--until (default: current year)
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Args)]
pub struct ParseArgs {
    /// Log files to parse (supports glob patterns)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Highlight --grep matches in table output
    #[arg(long, short = 'H')]
    pub highlight: bool,

    /// Maximum number of records
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output file (default: stdout)
    #[arg(long, short = 'O')]
    pub output_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CountArgs {
    /// Files to count (supports glob patterns)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format (table or json)
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct StreamArgs {
    /// Log file to stream
    #[arg(required = true)]
    pub file: PathBuf,

    /// Records per chunk (overrides the config file)
    #[arg(long, short)]
    pub chunk_size: Option<usize>,

    /// Stop after this many chunks
    #[arg(long)]
    pub max_chunks: Option<usize>,

    /// Stop once this many records have been printed
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Count lines first so progress can show a total
    #[arg(long, short)]
    pub progress: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Log files to analyze (supports glob patterns)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Show top N tags
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Output format (table or json)
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON array
    Json,
    /// Newline-delimited JSON
    Ndjson,
    /// CSV with a header row
    Csv,
    /// Logcat-style text lines
    Raw,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Raw => write!(f, "raw"),
        }
    }
}
