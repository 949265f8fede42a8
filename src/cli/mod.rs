pub mod records;
pub mod ride;
pub mod shutdown;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use records::print_records;
use ride::{print_status, process_ride_command, process_tap_command};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    journey::{
        controller::TripController,
        storage::{journey_store::JourneyStore, kv_storage::FileKeyValueStore},
    },
    trip::CommuteKind,
    utils::{
        clock::DefaultClock,
        dir::{application_path, log_path, store_path},
        logging::{enable_logging, LoggingConfig},
    },
};

#[derive(Parser, Debug)]
#[command(name = "journeytrack", version, long_about = None)]
#[command(about = "Tap-driven tracker for multi-leg commutes", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable trace logging")]
    log: bool,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console", global = true)]
    log_console: bool,
    #[arg(long = "log-filter", global = true, help = "Log level, overrides --log and RUST_LOG")]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(
        about = "Open the timer screen. Resumes the trip in progress or starts a new one of the given kind"
    )]
    Ride {
        #[arg(long, short, value_enum, help = "Kind of commute to start")]
        kind: Option<CommuteKind>,
    },
    #[command(about = "Mark a single leg boundary without opening the timer screen")]
    Tap {
        #[arg(long, short, value_enum, help = "Kind of commute to start if none is running")]
        kind: CommuteKind,
    },
    #[command(about = "Show the trip in progress")]
    Status {},
    #[command(about = "List recorded journeys, most recent first")]
    Records {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = application_path(args.dir)?;
    let level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    enable_logging(LoggingConfig {
        directory: log_path(&app_dir),
        level,
        console: args.log_console,
    })?;
    info!("Using application directory {app_dir:?}");

    let store = FileKeyValueStore::open(store_path(&app_dir)).await?;
    let controller = Arc::new(TripController::new(JourneyStore::new(store)));

    match args.commands {
        Commands::Ride { kind } => {
            process_ride_command(controller, kind.unwrap_or_default(), DefaultClock).await
        }
        Commands::Tap { kind } => {
            process_tap_command(controller.as_ref(), kind, &DefaultClock).await
        }
        Commands::Status {} => {
            print_status(controller.as_ref(), &DefaultClock);
            Ok(())
        }
        Commands::Records {} => print_records(&controller.journey_list()),
    }
}
