//! Command implementations for the GCPV watcher CLI
//!
//! `watch` runs the watcher until cancelled, printing each notification as it
//! arrives. `convert` is a dry run over a single export file.

use crate::app::models::Race;
use crate::app::services::converter::convert_races;
use crate::app::services::evt::render_evt;
use crate::app::services::export_parser::ExportParser;
use crate::app::services::roster::{RosterSnapshot, describe_lanes, describe_racers};
use crate::app::services::row_source::FileRowSource;
use crate::app::services::watcher::{WatchEvent, WatchOrchestrator};
use crate::cli::args::{Args, Commands, ConvertArgs, Verbosity, WatchArgs};
use crate::config::AppConfig;
use crate::{Error, Result};
use colored::Colorize;
use std::path::Path;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Main entry point for CLI command execution
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<()> {
    let command = args
        .command
        .ok_or_else(|| Error::configuration("No command given"))?;

    setup_logging(command.verbosity());

    match command {
        Commands::Watch(watch_args) => run_watch(watch_args, cancellation_token).await,
        Commands::Convert(convert_args) => run_convert(convert_args),
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(verbosity: &Verbosity) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = verbosity.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gcpv_watcher={}", log_level)));

    let initialized = if verbosity.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        // Standard logging with timestamps
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if initialized.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

fn load_configuration(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = AppConfig::resolve_path(explicit)?;
    AppConfig::load(&path)
}

async fn run_watch(args: WatchArgs, cancellation_token: CancellationToken) -> Result<()> {
    args.validate()?;
    let config = load_configuration(args.config_file.as_deref())?;

    let watcher = WatchOrchestrator::new(&args.watch_dir, &args.output_dir, &config)?;
    let mut events = watcher.subscribe();

    println!("{}", "GCPV Watcher".bold());
    println!("  Exports:   {}", args.watch_dir.display());
    println!("  FinishLynx: {}", args.output_dir.display());
    println!("  Pattern:   {}", config.export_file_pattern);
    println!();

    let ring_bell = config.enable_notification_sound && !args.verbosity.quiet;
    let detailed = args.verbosity.verbose > 0;

    // Startup events are buffered in the receiver and printed below
    watcher.start().await?;
    println!("{}", "Watching for changes. Press Ctrl+C to stop.".green());

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => print_event(&event, detailed, ring_bell),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Skipped {} notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    watcher.stop();
    let races = watcher.races().await;
    info!("Watcher stopped with {} races in the race list", races.len());
    println!("Stopped. {} races in Lynx.evt.", races.len());
    Ok(())
}

fn print_event(event: &WatchEvent, detailed: bool, ring_bell: bool) {
    if let Some(line) = format_event(event, detailed) {
        println!("{}", line);
    }

    if ring_bell {
        if let WatchEvent::FileProcessed {
            stats: Some(stats), ..
        } = event
        {
            if stats.has_changes() {
                print!("\x07");
            }
        }
    }
}

/// Console line for a notification
pub fn format_event(event: &WatchEvent, detailed: bool) -> Option<String> {
    match event {
        WatchEvent::FileProcessed { message, .. } => {
            Some(format!("{} {}", "✓".green(), message))
        }
        WatchEvent::Error { message } => Some(format!("{} {}", "✗".red(), message.red())),
        WatchEvent::Fatal { message } => Some(format!(
            "{} {}",
            "FATAL:".red().bold(),
            message.red().bold()
        )),
        WatchEvent::RacesUpdated { races, roster } => {
            let mut line = format!(
                "{} {}",
                "↻".cyan(),
                format!("Lynx.evt now lists {} races", races.len()).cyan()
            );
            if detailed {
                for race in races.iter() {
                    line.push_str(&format!("\n    {}", format_race(race, roster)));
                }
            }
            Some(line)
        }
    }
}

fn format_race(race: &Race, roster: &RosterSnapshot) -> String {
    let header = format!("{:>5}  {} [{} laps]", race.race_number(), race.title(), race.laps());
    if roster.is_empty() || race.racers().is_empty() {
        return format!("{} {}", header, describe_racers(race.racers()));
    }

    let lanes = describe_lanes(race.racers(), roster)
        .lines()
        .map(|line| format!("\n        {}", line))
        .collect::<String>();
    format!("{}{}", header, lanes)
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let config = load_configuration(args.config_file.as_deref())?;
    let (text, count) = convert_file(&args.input, &config)?;

    print!("{}", text);
    eprintln!(
        "{} {} races converted from {}",
        "✓".green(),
        count,
        args.input.display()
    );
    Ok(())
}

/// Parse and convert one export file, rendering it as race list text
///
/// Returns the text and the number of races it contains.
pub fn convert_file(path: &Path, config: &AppConfig) -> Result<(String, usize)> {
    let parser = ExportParser::from_config(config);
    let exports = parser.parse(&FileRowSource::new(path))?;
    let races = convert_races(&exports);
    let text = render_evt(&races)?;
    Ok((text, races.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::RosterEntry;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config() -> AppConfig {
        use crate::config::KeyFieldConfig;
        AppConfig::default()
            .with_key_field("track_params", KeyFieldConfig::new("Event :", 1))
            .with_key_field(
                "race_group",
                KeyFieldConfig::new("Event :", 2).with_stop_words(["male", "female"]),
            )
            .with_key_field("stage", KeyFieldConfig::new("Stage :", 1))
            .with_key_field("race_number", KeyFieldConfig::new("Race", 1))
            .with_key_field("lane", KeyFieldConfig::new("Lane", 3))
            .with_key_field("racer", KeyFieldConfig::new("Skaters", 3))
            .with_key_field("affiliation", KeyFieldConfig::new("Club", 3))
    }

    #[test]
    fn test_convert_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("heats.csv");
        fs::write(
            &path,
            "Event :,1500 111M,Open Men B male,Stage :,Heat,Race,25A,Lane,Skaters,Club,2,\"963 White, Gale\",Hamilton\n\
             Event :,1500 111M,Open Men B male,Stage :,Heat,Race,25A,Lane,Skaters,Club,1,\"689 Dixon, Frankie\",Hamilton\n",
        )
        .unwrap();

        let (text, count) = convert_file(&path, &config()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            text,
            "25A,,,Open Men B (1500 111M) Heat,,,,,,,,,13.5\n,689,1\n,963,2\n\n"
        );
    }

    #[test]
    fn test_convert_missing_file() {
        let err = convert_file(&PathBuf::from("/no/such/export.csv"), &config()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_format_events() {
        colored::control::set_override(false);

        let processed = WatchEvent::FileProcessed {
            path: PathBuf::from("/exports/a.csv"),
            message: "Processed \"a.csv\": 1 added (1A)".to_string(),
            stats: None,
        };
        assert_eq!(
            format_event(&processed, false).unwrap(),
            "✓ Processed \"a.csv\": 1 added (1A)"
        );

        let error = WatchEvent::error("Error processing file a.csv");
        assert_eq!(format_event(&error, false).unwrap(), "✗ Error processing file a.csv");

        let race = Race::new("1A", "Open (500) Final", 5.0, HashMap::from([(7, 1)])).unwrap();
        let updated = WatchEvent::RacesUpdated {
            races: Arc::new(vec![race]),
            roster: Default::default(),
        };
        assert_eq!(format_event(&updated, false).unwrap(), "↻ Lynx.evt now lists 1 races");
        assert_eq!(
            format_event(&updated, true).unwrap(),
            "↻ Lynx.evt now lists 1 races\n       1A  Open (500) Final [5 laps] Racer 7 (Lane 1)"
        );

        let race = Race::new("1A", "Open (500) Final", 5.0, HashMap::from([(7, 1)])).unwrap();
        let roster = RosterSnapshot::new(HashMap::from([(
            7,
            RosterEntry {
                id: 7,
                last_name: "Dixon".to_string(),
                first_name: "Frankie".to_string(),
                affiliation: "Hamilton".to_string(),
            },
        )]));
        let with_roster = WatchEvent::RacesUpdated {
            races: Arc::new(vec![race]),
            roster,
        };
        assert_eq!(
            format_event(&with_roster, true).unwrap(),
            "↻ Lynx.evt now lists 1 races\n       1A  Open (500) Final [5 laps]\n        Lane  1,    7 - Frankie Dixon (Hamilton)"
        );
    }
}
