use evolver_runner::{ClockKind, SimulationConfig};

fn print_help() {
    eprintln!(
        r#"Evolver - event-driven stock market simulator

USAGE:
    evolver [OPTIONS]

OPTIONS:
    --config <PATH>     Load the run configuration from a JSON file
    --json              Print the full result as JSON on stdout
    --system-clock      Pace the run against the wall clock
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # One year of synthetic prices with defaults
    evolver

    # Run with config file
    evolver --config run.json
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut print_json = false;
    let mut system_clock = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            "--json" => print_json = true,
            "--system-clock" => system_clock = true,
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            SimulationConfig::from_file(&path)?
        }
        None => {
            log::info!("Using default configuration");
            SimulationConfig::default()
        }
    };

    if system_clock {
        config.evolver.clock = ClockKind::System;
    }

    log::info!(
        "Run: {} to {} ({:?} clock), {} synthetic stocks, decider {:?}, policy {:?}",
        config.evolver.start,
        config.evolver.end,
        config.evolver.clock,
        config.synthetic.stocks,
        config.strategy.decision,
        config.strategy.policy
    );

    let result = evolver_runner::run_synthetic(&config).await?;

    log::info!("Trades confirmed: {}", result.outcomes.confirmed);
    log::info!("Trades rejected: {}", result.outcomes.rejected);
    log::info!("Pending decisions: {}", result.pending_decisions);
    log::info!("Final cash: {}", result.final_portfolio.cash);
    log::info!("Final value: {}", result.final_value());
    match result.annualized_return {
        Some(cagr) => log::info!("Annualized return: {:.2}%", cagr * 100.0),
        None => log::info!("Annualized return: n/a"),
    }

    if print_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
