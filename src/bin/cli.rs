//! TrailScribe CLI
//!
//! Command-line access to the local store and sync rounds.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailscribe::error::{Result, TrailScribeError};
use trailscribe::storage::{
    DataSource, Entity, KmlDataSource, MapDataSource, SampleDataSource, Storage,
};
use trailscribe::sync::{JsonFileTransport, SyncSession};
use trailscribe::types::*;

#[derive(Parser)]
#[command(name = "trailscribe")]
#[command(about = "TrailScribe field data CLI")]
#[command(version)]
struct Cli {
    /// Database path
    #[arg(
        long,
        env = "TRAILSCRIBE_DB_PATH",
        default_value = "~/.local/share/trailscribe/trailscribe.db"
    )]
    db_path: String,

    /// Storage mode (local or cloud-safe)
    #[arg(long, env = "TRAILSCRIBE_STORAGE_MODE", default_value = "local")]
    storage_mode: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Field samples
    #[command(subcommand)]
    Samples(SampleCommand),
    /// Offline maps
    #[command(subcommand)]
    Maps(LayerCommand),
    /// KML overlays
    #[command(subcommand)]
    Kmls(LayerCommand),
    /// Synchronization
    #[command(subcommand)]
    Sync(SyncCommand),
}

#[derive(Subcommand)]
enum SampleCommand {
    /// List all samples
    List,
    /// Record a sample
    Add {
        name: String,
        /// Longitude
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        /// Latitude
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        /// Elevation
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        z: f64,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        custom_field: String,
        #[arg(long, default_value = "0")]
        map_id: i64,
    },
    /// Delete a sample by ID
    Delete { id: i64 },
    /// Load the development samples into an empty store
    Seed,
}

#[derive(Subcommand)]
enum LayerCommand {
    /// List all entries
    List,
    /// Register an entry
    Add(LayerArgs),
    /// Delete an entry by ID
    Delete { id: i64 },
}

#[derive(Args)]
struct LayerArgs {
    name: String,
    /// Resource file
    #[arg(short, long)]
    file: String,
    #[arg(short, long, default_value = "EPSG:4326")]
    projection: String,
    /// Bounding box as minX,minY,maxX,maxY
    #[arg(long, allow_hyphen_values = true)]
    bbox: String,
    /// Zoom range as min,max
    #[arg(long, default_value = "0,18")]
    zoom: String,
    #[arg(short, long, default_value = "")]
    description: String,
}

#[derive(Subcommand)]
enum SyncCommand {
    /// Show the checkpoint and last error
    Status,
    /// Print the pending payload as JSON
    Export,
    /// Run a round through JSON files
    Run {
        /// Where to write the outgoing payload
        #[arg(long)]
        outbox: String,
        /// Where to read the incoming payload from
        #[arg(long)]
        inbox: String,
    },
}

fn parse_numbers<T: std::str::FromStr>(raw: &str, expected: usize, what: &str) -> Result<Vec<T>> {
    let values: Vec<T> = raw
        .split(',')
        .map(|part| part.trim().parse::<T>())
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|_| TrailScribeError::InvalidInput(format!("malformed {}: {}", what, raw)))?;
    if values.len() != expected {
        return Err(TrailScribeError::InvalidInput(format!(
            "{} needs {} comma-separated values, got {}",
            what,
            expected,
            values.len()
        )));
    }
    Ok(values)
}

fn parse_bbox(raw: &str) -> Result<BoundingBox> {
    let v = parse_numbers::<f64>(raw, 4, "bbox")?;
    BoundingBox::new(v[0], v[1], v[2], v[3])
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn delete_by_id<E: Entity>(source: &DataSource<E>, id: i64) -> Result<()> {
    if source.remove(id)? {
        println!("Deleted {} #{}", E::KIND, id);
    } else {
        println!("No {} #{}", E::KIND, id);
    }
    Ok(())
}

fn run_samples(storage: Storage, command: SampleCommand) -> Result<()> {
    let samples = SampleDataSource::new(storage);
    match command {
        SampleCommand::List => print_json(&samples.get_all()?)?,
        SampleCommand::Add {
            name,
            x,
            y,
            z,
            description,
            custom_field,
            map_id,
        } => {
            let stamp = now();
            let sample = Sample {
                meta: SyncMetadata::new(name, ""),
                description,
                time: stamp.clone(),
                x,
                y,
                z,
                custom_field,
                last_modified: stamp,
                user_id: 0,
                map_id,
                expedition_id: 0,
            };
            let stored = samples.insert(&sample)?;
            println!("Created sample #{}", stored.meta.id);
        }
        SampleCommand::Delete { id } => delete_by_id(&samples, id)?,
        SampleCommand::Seed => {
            let count = samples.seed_defaults()?;
            println!("Seeded {} samples", count);
        }
    }
    Ok(())
}

fn run_maps(storage: Storage, command: LayerCommand) -> Result<()> {
    let maps = MapDataSource::new(storage);
    match command {
        LayerCommand::List => print_json(&maps.get_all()?)?,
        LayerCommand::Add(args) => {
            let zoom = parse_numbers::<i32>(&args.zoom, 2, "zoom")?;
            let map = Map::try_new(
                SyncMetadata::new(args.name, args.file),
                args.description,
                args.projection,
                (zoom[0], zoom[1]),
                parse_bbox(&args.bbox)?,
                now(),
            )?;
            let stored = maps.insert(&map)?;
            println!("Registered map #{}", stored.meta.id);
        }
        LayerCommand::Delete { id } => delete_by_id(&maps, id)?,
    }
    Ok(())
}

fn run_kmls(storage: Storage, command: LayerCommand) -> Result<()> {
    let kmls = KmlDataSource::new(storage);
    match command {
        LayerCommand::List => print_json(&kmls.get_all()?)?,
        LayerCommand::Add(args) => {
            let zoom = parse_numbers::<i32>(&args.zoom, 2, "zoom")?;
            let kml = Kml::try_new(
                SyncMetadata::new(args.name, args.file),
                args.description,
                args.projection,
                (zoom[0], zoom[1]),
                parse_bbox(&args.bbox)?,
                now(),
            )?;
            let stored = kmls.insert(&kml)?;
            println!("Registered KML #{}", stored.meta.id);
        }
        LayerCommand::Delete { id } => delete_by_id(&kmls, id)?,
    }
    Ok(())
}

fn run_sync(storage: Storage, command: SyncCommand) -> Result<()> {
    let session = SyncSession::new(storage);
    match command {
        SyncCommand::Status => print_json(&session.status()?)?,
        SyncCommand::Export => println!("{}", session.pending()?.to_json()?),
        SyncCommand::Run { outbox, inbox } => {
            let transport = JsonFileTransport::new(
                shellexpand::tilde(&outbox).to_string(),
                shellexpand::tilde(&inbox).to_string(),
            );
            let report = session.run(&transport)?;
            print_json(&report)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Expand ~ in path
    let db_path = shellexpand::tilde(&cli.db_path).to_string();

    let config = StorageConfig {
        db_path,
        storage_mode: cli.storage_mode.parse()?,
    };
    let storage = Storage::open(config)?;

    match cli.command {
        Commands::Samples(command) => run_samples(storage, command),
        Commands::Maps(command) => run_maps(storage, command),
        Commands::Kmls(command) => run_kmls(storage, command),
        Commands::Sync(command) => run_sync(storage, command),
    }
}
