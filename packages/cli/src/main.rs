#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for the geofence validation engine.
//!
//! ```text
//! geofence zones list [--all]
//! geofence zones create <definition.json>
//! geofence zones update <id> <update.json>
//! geofence zones toggle <id>
//! geofence validate <lat> <lon> [--project N] [--employee N] [--at RFC3339] [--record]
//! geofence process <sample-id>
//! geofence stats [--project N] [--employee N] [--from YYYY-MM-DD] [--to YYYY-MM-DD]
//! geofence coverage [same filters as stats]
//! geofence violations [--limit N] [--project N]
//! geofence nearest <lat> <lon> [--project N]
//! geofence config
//! ```
//!
//! Zones and samples live in a JSON data file (`--data`, default
//! `geofence.json`). Set `RUST_LOG=info` to see violation events as they
//! are delivered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use geofence_analytics::parse_date;
use geofence_analytics_models::SampleFilter;
use geofence_config::GeofenceConfig;
use geofence_database::InMemoryStore;
use geofence_service::GeofenceService;
use geofence_spatial_models::Coordinate;
use geofence_validation::ChannelSink;
use geofence_validation_models::NewLocationSample;
use geofence_zone_models::{Zone, ZoneDefinition, ZoneUpdate};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "geofence", about = "Validate employee check-ins against work zones")]
struct Cli {
    /// JSON data file holding zones and samples
    #[arg(long, global = true, default_value = "geofence.json")]
    data: PathBuf,

    /// TOML configuration overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage zones
    Zones {
        #[command(subcommand)]
        command: ZoneCommands,
    },
    /// Validate a location against the applicable zones
    Validate {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        /// Project the check-in belongs to
        #[arg(long)]
        project: Option<i64>,
        /// Employee checking in
        #[arg(long)]
        employee: Option<i64>,
        /// Check-in time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Store the check-in as a sample and record any violations
        #[arg(long)]
        record: bool,
    },
    /// Validate a stored sample and record the outcome
    Process {
        /// Sample ID
        sample_id: i64,
    },
    /// Compliance statistics
    Stats(FilterArgs),
    /// Geographic coverage of check-ins
    Coverage(FilterArgs),
    /// Most recent violations, newest first
    Violations {
        /// Maximum number of violation batches to show
        #[arg(long)]
        limit: Option<usize>,
        /// Only this project's samples
        #[arg(long)]
        project: Option<i64>,
    },
    /// Find the zone nearest to a location
    Nearest {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        /// Project the location belongs to
        #[arg(long)]
        project: Option<i64>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ZoneCommands {
    /// List zones
    List {
        /// Include inactive zones
        #[arg(long)]
        all: bool,
    },
    /// Create a zone from a JSON definition file
    Create {
        /// Path to the zone definition
        definition: PathBuf,
    },
    /// Apply a JSON partial update to a zone
    Update {
        /// Zone ID
        id: i64,
        /// Path to the update payload
        update: PathBuf,
    },
    /// Activate an inactive zone or deactivate an active one
    Toggle {
        /// Zone ID
        id: i64,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Only this project's samples
    #[arg(long)]
    project: Option<i64>,
    /// Only this employee's samples
    #[arg(long)]
    employee: Option<i64>,
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Option<chrono::NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    to: Option<chrono::NaiveDate>,
}

impl From<FilterArgs> for SampleFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            project_id: args.project,
            employee_id: args.employee,
            date_from: args.from,
            date_to: args.to,
        }
    }
}

impl Commands {
    /// Whether the command changes the data file.
    const fn mutates(&self) -> bool {
        match self {
            Self::Zones { command } => !matches!(command, ZoneCommands::List { .. }),
            Self::Validate { record, .. } => *record,
            Self::Process { .. } => true,
            Self::Stats(_)
            | Self::Coverage(_)
            | Self::Violations { .. }
            | Self::Nearest { .. }
            | Self::Config => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GeofenceConfig::load(path)?,
        None => GeofenceConfig::default(),
    };
    let store = Arc::new(InMemoryStore::load(&cli.data)?);

    let (sink, mut events) = ChannelSink::new();
    let consumer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let zones: Vec<&str> = event
                .violations
                .iter()
                .map(|v| v.zone_name.as_str())
                .collect();
            log::info!(
                "Violation event: sample {} (employee {:?}) outside {zones:?}",
                event.sample.id,
                event.sample.employee_id
            );
        }
    });

    let service = GeofenceService::new(store.clone(), Arc::new(sink), config);
    let mutates = cli.command.mutates();
    let outcome = run(&service, cli.command);

    // Closes the event channel so the consumer drains and exits.
    drop(service);
    consumer.await?;
    outcome?;

    if mutates {
        store.save(&cli.data)?;
    }

    Ok(())
}

fn run(
    service: &GeofenceService<InMemoryStore>,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Zones { command } => run_zones(service, command)?,
        Commands::Validate {
            latitude,
            longitude,
            project,
            employee,
            at,
            record,
        } => {
            if record {
                let sample = service.record_sample(NewLocationSample {
                    coordinates: Coordinate::new(latitude, longitude),
                    project_id: project,
                    employee_id: employee,
                    recorded_at: at.unwrap_or_else(Utc::now),
                })?;
                let result = service.process_sample(sample.id)?;
                println!("Recorded sample {}", sample.id);
                print_json(&result)?;
            } else {
                let result = match at {
                    Some(at) => service.validate_location_at(
                        latitude,
                        longitude,
                        project,
                        employee,
                        at.with_timezone(&Local).naive_local(),
                    )?,
                    None => service.validate_location(latitude, longitude, project, employee)?,
                };
                print_json(&result)?;
            }
        }
        Commands::Process { sample_id } => print_json(&service.process_sample(sample_id)?)?,
        Commands::Stats(filter) => print_json(&service.get_statistics(&filter.into())?)?,
        Commands::Coverage(filter) => print_json(&service.get_coverage(&filter.into())?)?,
        Commands::Violations { limit, project } => {
            let records = service.recent_violations(limit, project)?;
            if records.is_empty() {
                println!("No violations recorded.");
            } else {
                print_json(&records)?;
            }
        }
        Commands::Nearest {
            latitude,
            longitude,
            project,
        } => match service.find_nearest_zone(latitude, longitude, project)? {
            Some(nearest) => print_json(&nearest)?,
            None => println!("No applicable zones."),
        },
        Commands::Config => print!("{}", service.config().to_toml_string()?),
    }

    Ok(())
}

fn run_zones(
    service: &GeofenceService<InMemoryStore>,
    command: ZoneCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ZoneCommands::List { all } => print_zone_table(&service.list_zones(all)?),
        ZoneCommands::Create { definition } => {
            let definition: ZoneDefinition = read_json(&definition)?;
            print_json(&service.create_zone(definition)?)?;
        }
        ZoneCommands::Update { id, update } => {
            let update: ZoneUpdate = read_json(&update)?;
            print_json(&service.update_zone(id, update)?)?;
        }
        ZoneCommands::Toggle { id } => {
            let zone = service.toggle_zone_active(id)?;
            println!(
                "Zone {} '{}' is now {}",
                zone.id,
                zone.name,
                if zone.active { "active" } else { "inactive" }
            );
        }
    }

    Ok(())
}

fn print_zone_table(zones: &[Zone]) {
    if zones.is_empty() {
        println!("No zones found.");
        return;
    }

    println!(
        "{:<6} {:<30} {:<16} {:<8} {:<8} {:<8} ACTIVE",
        "ID", "NAME", "TYPE", "SHAPE", "RADIUS", "PROJECT"
    );
    println!("{}", "-".repeat(90));

    for zone in zones {
        let name = if zone.name.chars().count() > 30 {
            format!("{}...", zone.name.chars().take(27).collect::<String>())
        } else {
            zone.name.clone()
        };
        let project = zone
            .project_id
            .map_or_else(|| "global".to_string(), |p| p.to_string());

        println!(
            "{:<6} {:<30} {:<16} {:<8} {:<8} {:<8} {}",
            zone.id,
            name,
            zone.zone_type.label(),
            if zone.is_polygon() { "polygon" } else { "circle" },
            zone.radius_meters,
            project,
            if zone.active { "yes" } else { "no" }
        );
    }

    println!("\n{} zone(s)", zones.len());
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
