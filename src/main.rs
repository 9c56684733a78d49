//! ridelog - personal ride and fuel ledger with odometer photo scanning
//!
//! Records rides and fuel purchases for a shared vehicle and fills odometer
//! readings from photos via the scan subsystem.

mod capture;
mod config;
mod ledger;
mod scan;
mod storage;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::capture::{CaptureSource, FileCapture};
use crate::config::AppConfig;
use crate::ledger::balance::summarize;
use crate::ledger::{FuelPurchase, Ride};
use crate::scan::{RecognitionEngine, ScanError, ScanSession, ScanState};
use crate::storage::Database;

/// ridelog - shared vehicle ledger
#[derive(Parser, Debug)]
#[command(name = "ridelog")]
#[command(about = "Personal ride and fuel ledger with odometer photo scanning")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan an odometer photo and print the confirmed reading
    Scan(ScanArgs),
    /// Manage rides
    Ride {
        #[command(subcommand)]
        action: RideCommand,
    },
    /// Manage fuel purchases
    Fuel {
        #[command(subcommand)]
        action: FuelCommand,
    },
    /// Show cost and balance overview
    Summary,
    /// Dump the ledger as JSON
    Export,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Photo of the odometer
    image: PathBuf,

    /// Previously known reading used for disambiguation
    #[arg(long)]
    reference: Option<f64>,

    /// Recognition language tag (defaults to the configured one)
    #[arg(long)]
    lang: Option<String>,

    /// Accept the best candidate without prompting
    #[arg(long)]
    accept: bool,
}

#[derive(Subcommand, Debug)]
enum RideCommand {
    /// Record a ride
    Add {
        /// Day of the ride (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Driver name (defaults to the first configured driver)
        #[arg(long)]
        driver: Option<String>,

        /// Odometer at departure (defaults to the last recorded end reading)
        #[arg(long)]
        start: Option<f64>,

        /// Odometer at arrival
        #[arg(long, conflicts_with = "scan")]
        end: Option<f64>,

        /// Scan the end reading from a photo instead
        #[arg(long, value_name = "IMAGE")]
        scan: Option<PathBuf>,

        /// Free-form note
        #[arg(long)]
        description: Option<String>,
    },
    /// List recorded rides
    List,
    /// Remove a ride by id
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
enum FuelCommand {
    /// Record a fuel purchase
    Add {
        /// Day of the purchase (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Payer name (defaults to the first configured driver)
        #[arg(long)]
        payer: Option<String>,

        /// Amount paid in EUR
        #[arg(long)]
        amount: f64,

        /// Liters bought
        #[arg(long)]
        liters: f64,
    },
    /// List recorded fuel purchases
    List,
    /// Remove a fuel purchase by id
    Remove { id: i64 },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_or_create_config();

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => storage::get_data_dir()?.join("ledger.sqlite3"),
    };
    let db = Database::open(&db_path)?;

    match cli.command {
        Command::Scan(args) => cmd_scan(&config, args),
        Command::Ride { action } => cmd_ride(&config, &db, action),
        Command::Fuel { action } => cmd_fuel(&config, &db, action),
        Command::Summary => cmd_summary(&config, &db),
        Command::Export => cmd_export(&db),
    }
}

/// Load configuration from file or create default
fn load_or_create_config() -> AppConfig {
    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(config) = config::load_config(&config_path) {
                info!("Loaded configuration from {:?}", config_path);
                return config;
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

fn cmd_scan(config: &AppConfig, args: ScanArgs) -> Result<()> {
    match scan_reading(config, &args.image, args.reference, args.lang, args.accept)? {
        Some(value) => {
            println!("{}", format_km(value));
            Ok(())
        }
        None => {
            eprintln!("Scan cancelled.");
            Ok(())
        }
    }
}

/// Run one scan session from photo to confirmed value
///
/// Returns `None` when the user dismisses the scan. Failures come back as
/// errors with a recapture hint matching the failure kind.
fn scan_reading(
    config: &AppConfig,
    image: &Path,
    reference: Option<f64>,
    lang: Option<String>,
    auto_accept: bool,
) -> Result<Option<f64>> {
    let language = lang.unwrap_or_else(|| config.scan.language.clone());
    let engine = recognition_engine()?;

    // A capture failure leaves the session untouched in Idle
    let captured = FileCapture::new(image).capture()?;

    let mut session = ScanSession::new(reference);
    session.capture(captured);

    if session.preprocess() {
        session.recognize_with(engine, &language, |percent| {
            eprint!("\rScanning... {percent:3}%");
            let _ = std::io::stderr().flush();
        });
        eprintln!();
    }

    match session.state().clone() {
        ScanState::AwaitingConfirmation(resolution) => {
            let Some(best) = resolution.best else {
                bail!("resolution without best candidate");
            };

            if auto_accept {
                session.accept(best);
            } else {
                confirm_interactively(&mut session, best, &resolution.alternatives)?;
            }
            Ok(session.confirmed_value())
        }
        ScanState::Failed(error) => {
            session.dismiss();
            let hint = match error {
                ScanError::Decode(_) => "Could not read the photo. Take a new picture.",
                ScanError::Recognition(_) => "Scanning failed. Try again with a new photo.",
                ScanError::NoReadingFound => {
                    "No odometer reading found. Try a clearer photo or enter the value manually."
                }
            };
            Err(anyhow::Error::new(error).context(hint))
        }
        state => bail!("scan ended in unexpected state {state:?}"),
    }
}

/// Ask the user to accept the best reading, pick an alternative, or dismiss
fn confirm_interactively(
    session: &mut ScanSession,
    best: f64,
    alternatives: &[f64],
) -> Result<()> {
    println!("Recognized reading: {} km", format_km(best));
    if !alternatives.is_empty() {
        let listed: Vec<String> = alternatives.iter().map(|v| format_km(*v)).collect();
        println!("Other values found: {}", listed.join(", "));
    }

    loop {
        print!("Accept? [Y/n or alternative value]: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        let answer = line.trim();

        if answer.is_empty() || answer.eq_ignore_ascii_case("y") {
            session.accept(best);
            return Ok(());
        }
        if answer.eq_ignore_ascii_case("n") {
            session.dismiss();
            return Ok(());
        }
        if let Ok(value) = answer.parse::<f64>() {
            if session.accept(value) {
                return Ok(());
            }
        }
        println!("Not one of the offered values.");
    }
}

fn cmd_ride(config: &AppConfig, db: &Database, action: RideCommand) -> Result<()> {
    match action {
        RideCommand::Add {
            date,
            driver,
            start,
            end,
            scan,
            description,
        } => {
            let start = match start {
                Some(value) => value,
                None => db
                    .last_end_km()?
                    .context("No previous ride; pass --start")?,
            };

            let end = match (end, scan) {
                (Some(value), _) => value,
                (None, Some(image)) => {
                    scan_reading(config, &image, Some(start), None, false)?
                        .context("Scan cancelled; ride not recorded")?
                }
                (None, None) => bail!("Pass --end or --scan <IMAGE>"),
            };

            let driver = driver
                .or_else(|| config.ledger.drivers.first().cloned())
                .context("No driver; pass --driver or configure drivers")?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());

            let ride = Ride::new(date, driver, start, end, description)?;
            let id = db.insert_ride(&ride)?;
            println!(
                "Recorded ride #{id}: {} -> {} ({} km)",
                format_km(ride.start_km),
                format_km(ride.end_km),
                ride.distance_km
            );
            Ok(())
        }
        RideCommand::List => {
            for ride in db.list_rides()? {
                println!(
                    "#{:<4} {}  {:<10} {:>9} -> {:>9}  {:>7.1} km  {}",
                    ride.id,
                    ride.date,
                    ride.driver,
                    format_km(ride.start_km),
                    format_km(ride.end_km),
                    ride.distance_km,
                    ride.description.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        RideCommand::Remove { id } => {
            if db.delete_ride(id)? {
                println!("Removed ride #{id}");
            } else {
                bail!("No ride with id {id}");
            }
            Ok(())
        }
    }
}

fn cmd_fuel(config: &AppConfig, db: &Database, action: FuelCommand) -> Result<()> {
    match action {
        FuelCommand::Add {
            date,
            payer,
            amount,
            liters,
        } => {
            let payer = payer
                .or_else(|| config.ledger.drivers.first().cloned())
                .context("No payer; pass --payer or configure drivers")?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());

            let purchase = FuelPurchase::new(date, payer, amount, liters)?;
            let id = db.insert_fuel_purchase(&purchase)?;
            println!(
                "Recorded fuel purchase #{id}: EUR {:.2} ({:.1} L)",
                purchase.amount_eur, purchase.liters
            );
            Ok(())
        }
        FuelCommand::List => {
            for purchase in db.list_fuel_purchases()? {
                println!(
                    "#{:<4} {}  {:<10} EUR {:>7.2}  {:>6.1} L",
                    purchase.id, purchase.date, purchase.payer, purchase.amount_eur, purchase.liters
                );
            }
            Ok(())
        }
        FuelCommand::Remove { id } => {
            if db.delete_fuel_purchase(id)? {
                println!("Removed fuel purchase #{id}");
            } else {
                bail!("No fuel purchase with id {id}");
            }
            Ok(())
        }
    }
}

fn cmd_summary(config: &AppConfig, db: &Database) -> Result<()> {
    let rides = db.list_rides()?;
    let purchases = db.list_fuel_purchases()?;
    let summary = summarize(&rides, &purchases, &config.ledger);

    println!("Consumption:    1 : {}", summary.km_per_liter);
    println!("Fuel price:     EUR {:.3}/L", summary.price_per_liter);
    println!("Price per km:   EUR {:.3}", summary.cost_per_km);
    println!(
        "Total driven:   {:.1} km (EUR {:.2})",
        summary.total_km, summary.total_cost_eur
    );
    println!(
        "Fuel bought:    EUR {:.2} ({:.1} L)",
        summary.total_paid_eur, summary.total_liters
    );

    if !summary.drivers.is_empty() {
        println!();
        for driver in &summary.drivers {
            println!(
                "{:<12} {:>8.1} km   paid EUR {:>7.2}   balance {}{:.2}",
                driver.driver,
                driver.km,
                driver.paid_eur,
                if driver.balance_eur >= 0.0 { "+" } else { "-" },
                driver.balance_eur.abs()
            );
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct LedgerExport {
    rides: Vec<Ride>,
    fuel_purchases: Vec<FuelPurchase>,
}

fn cmd_export(db: &Database) -> Result<()> {
    let export = LedgerExport {
        rides: db.list_rides()?,
        fuel_purchases: db.list_fuel_purchases()?,
    };
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

#[cfg(feature = "tesseract")]
fn recognition_engine() -> Result<Arc<dyn RecognitionEngine>> {
    Ok(Arc::new(scan::recognize::TesseractEngine))
}

#[cfg(not(feature = "tesseract"))]
fn recognition_engine() -> Result<Arc<dyn RecognitionEngine>> {
    bail!("This build has no recognition engine; rebuild with --features tesseract")
}

/// Render a reading without a trailing .0 for whole kilometers
fn format_km(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_km() {
        assert_eq!(format_km(4800.0), "4800");
        assert_eq!(format_km(99.5), "99.5");
    }
}
