use anyhow::{Context, Result};
use qcsearch::cli::{parse_args, setup_logging, Commands, InspectArgs, SearchArgs};
use qcsearch::data::preprocessing::median_of;
use qcsearch::{SearchMode, SearchRunner};
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", qcsearch::info());

    let result = match cli.command {
        Commands::Models(args) => run_search(args, SearchMode::Models),
        Commands::Pipelines(args) => run_search(args, SearchMode::Pipelines),
        Commands::Inspect(args) => run_inspect(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_search(args: SearchArgs, mode: SearchMode) -> Result<()> {
    let config = args.resolve().context("Invalid configuration")?;
    info!("Starting {:?} search...", mode);
    info!("Metrics store: {:?}", config.database);
    info!("Output directory: {:?}", config.output_dir);

    let database = config.database.clone();
    let output_dir = config.output_dir.clone();
    let report = SearchRunner::new(config, mode)
        .run()
        .with_context(|| format!("Search over {:?} failed", database))?;

    info!("\n=== Search Results ===");
    for row in &report.relative_error_table().rows {
        let cells: Vec<String> = row.1.iter().map(|v| format!("{:.1}", v)).collect();
        info!("{:>16}: {}", row.0, cells.join(" "));
    }
    info!("Results saved to: {:?}", output_dir.join(mode.results_file()));

    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let config = args.resolve().context("Invalid configuration")?;
    let runner = SearchRunner::new(config, SearchMode::Models);

    let signals = runner
        .load_signals()
        .with_context(|| format!("Failed to load {:?}", runner.config().database))?;

    println!("\n=== Signal Features ===");
    println!("Runs: {}", signals.n_samples());
    println!("Signal features: {}", signals.n_features());
    for (name, column) in signals.names.iter().zip(signals.values.columns()) {
        println!("  {:<32} median {:.4}", name, median_of(column));
    }
    println!("=======================\n");

    Ok(())
}
