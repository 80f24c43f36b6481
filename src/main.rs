use clap::Parser;
use logcat_engine::cli::{Cli, Commands};
use logcat_engine::commands::{load_config, run_count, run_parse, run_stats, run_stream};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.parallel > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.parallel)
            .build_global()?;
    }
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse(args) => run_parse(args, &config),
        Commands::Count(args) => run_count(args),
        Commands::Stream(args) => run_stream(args, &config),
        Commands::Stats(args) => run_stats(args, &config),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
