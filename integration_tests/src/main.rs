//! Bench tests for a LoRa-E5 module on a USB-UART adapter.
//!
//! Drives the module with the firmware's own command channel, so a pass
//! here means the node will talk to the same module.

mod device;

use clap::Parser;
use colored::Colorize;

use device::{open_modem, resolve_port};
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Bench tests for a LoRa-E5 module")]
struct Args {
    /// Serial port for the module (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate (defaults to the firmware's UART setting)
    #[arg(short, long)]
    baud: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port)?;

    println!("{}", "LoRa-E5 Bench Tests".bold());
    println!("Port: {}", port);
    println!();

    println!("Connecting to module...");
    let mut modem = open_modem(&port, args.baud)?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&mut modem);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
