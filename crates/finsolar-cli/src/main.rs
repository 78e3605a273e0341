mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::annuity::{FvArgs, NperArgs, NpvArgs, PmtArgs, PvArgs, RateArgs};
use commands::solar::{DaylightArgs, EventArgs};
use finsolar_core::solar::events::SolarEvent;

/// Annuity time-value and sunrise/sunset calculations
#[derive(Parser)]
#[command(
    name = "finsolar",
    version,
    about = "Annuity time-value and sunrise/sunset calculations",
    long_about = "A CLI for spreadsheet-style annuity formulas (PMT, NPER, PV, FV, NPV, RATE) \
                  and for estimating sunrise, sunset and day length at a location. \
                  RATE and the solar events are found by bounded iteration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Periodic payment of an annuity (PMT)
    Pmt(PmtArgs),
    /// Number of periods of an annuity (NPER)
    Nper(NperArgs),
    /// Present value of an annuity (PV)
    Pv(PvArgs),
    /// Future value of an annuity (FV)
    Fv(FvArgs),
    /// Net present value of a cash-flow series (NPV)
    Npv(NpvArgs),
    /// Periodic interest rate of an annuity (RATE), solved by secant iteration
    Rate(RateArgs),
    /// Local sunrise time
    Sunrise(EventArgs),
    /// Local sunset time
    Sunset(EventArgs),
    /// Sunrise, sunset and day length
    Daylight(DaylightArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Pmt(args) => commands::annuity::run_pmt(args),
        Commands::Nper(args) => commands::annuity::run_nper(args),
        Commands::Pv(args) => commands::annuity::run_pv(args),
        Commands::Fv(args) => commands::annuity::run_fv(args),
        Commands::Npv(args) => commands::annuity::run_npv(args),
        Commands::Rate(args) => commands::annuity::run_rate(args),
        Commands::Sunrise(args) => commands::solar::run_event(args, SolarEvent::Sunrise),
        Commands::Sunset(args) => commands::solar::run_event(args, SolarEvent::Sunset),
        Commands::Daylight(args) => commands::solar::run_daylight(args),
        Commands::Version => {
            println!("finsolar {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
