use clap::Parser;
use flight_processor::cli::{args::Args, commands, commands::RunStats};
use flight_processor::{Error, Result};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    let args = Args::parse();

    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(run_until_interrupted(args)) {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(error.exit_code());
        }
    }
}

/// Run the command, cancelling ingestion when Ctrl-C arrives
async fn run_until_interrupted(args: Args) -> Result<RunStats> {
    let cancel = CancellationToken::new();

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
        cancel.cancel();
    };

    tokio::select! {
        result = commands::run(args, cancel.clone()) => result,
        _ = shutdown_signal => {
            eprintln!("\nReceived CTRL+C, stopping at the next batch...");
            Err(Error::processing_interrupted("Processing interrupted by user"))
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Flight Processor - Flight-Parameter Recording Analyzer");
    println!("======================================================");
    println!();
    println!("Stream flight-parameter CSV recordings into a bounded sample, classify");
    println!("every parameter and export filtered, gap-filled series.");
    println!();
    println!("USAGE:");
    println!("    flight-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    summary     Show headers, row counts and per-parameter metadata");
    println!("    export      Write filtered and gap-filled series as CSV or JSON");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Summarize a recording:");
    println!("    flight-processor summary flight.csv");
    println!();
    println!("    # Export two parameters with linear gap filling:");
    println!("    flight-processor export flight.csv --parameters ALT,IAS \\");
    println!("                            --interpolation linear --output series.csv");
    println!();
    println!("    # Machine-readable summary with a forced units row:");
    println!("    flight-processor summary flight.csv --units-row present --format json");
    println!();
    println!("EXIT CODES:");
    println!("    0    success");
    println!("    1    usage or configuration error");
    println!("    2    unreadable or malformed recording");
    println!("    130  interrupted");
    println!();
    println!("For detailed help on any command, use:");
    println!("    flight-processor <COMMAND> --help");
}
