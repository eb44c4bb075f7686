use anyhow::Context;
use clap::Parser;
use gcpv_watcher::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    if let Err(error) = run_main(args) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

fn run_main(args: Args) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // Cancel the running command when Ctrl+C is received
        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                    shutdown_token.cancel();
                }
                Err(e) => eprintln!("Failed to install CTRL+C signal handler: {}", e),
            }
        });

        commands::run(args, cancellation_token)
            .await
            .context("gcpv-watcher failed")
    })
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("GCPV Watcher - FinishLynx race list synchronizer");
    println!("================================================");
    println!();
    println!("Watches a directory of GCPV race exports and keeps the FinishLynx");
    println!("Lynx.evt race list in sync with them.");
    println!();
    println!("USAGE:");
    println!("    gcpv-watcher <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    watch       Watch an export directory and keep Lynx.evt up to date");
    println!("    convert     Convert one export file and print the race list");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Watch exports and update the FinishLynx directory:");
    println!("    gcpv-watcher watch --watch-dir C:\\GCPV\\exports --output-dir C:\\Lynx");
    println!();
    println!("    # Preview the conversion of one export:");
    println!("    gcpv-watcher convert heats.csv --config appconfig.json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    gcpv-watcher <COMMAND> --help");
}
