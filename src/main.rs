//! via-fanout: fan-out trace geometry for PCB via design
//!
//! Command-line front end over the layout engine. Reads a design JSON file
//! and prints derived geometry, reference issues, hit-test or snap results,
//! or the design with a newly placed instance.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use via_fanout::config::{self, Config};
use via_fanout::geometry::Point;
use via_fanout::layout::{self, picking};
use via_fanout::model::{Design, InstanceId, InstanceType, PlacementOptions, StoreResult};
use via_fanout::project;

/// Fan-out trace geometry, anchors and picking for PCB via design.
///
/// Every command reads a design JSON file with the board outline, padstacks
/// and placed instances.
#[derive(Parser, Debug)]
#[command(name = "via-fanout")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print anchors, feed paths, stubs and antipads of every instance as JSON
    Route {
        /// Design file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,
    },

    /// Report broken references; exits with failure if any are found
    Check {
        /// Design file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,
    },

    /// Print the name of the instance at a board position
    Hit {
        /// Design file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,

        /// X coordinate in board units
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Y coordinate in board units
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },

    /// Snap a board position to the nearest anchor feature
    Snap {
        /// Design file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,

        /// X coordinate in board units
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Y coordinate in board units
        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Pixels per board unit (defaults to the configured zoom scale)
        #[arg(long)]
        scale: Option<f64>,
    },

    /// Place a new instance and print the updated design as JSON
    Place {
        /// Design file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,

        /// Kind of instance to place
        #[arg(long, value_enum)]
        kind: KindArg,

        /// X coordinate in board units (rounded to the placement grid)
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Y coordinate in board units (rounded to the placement grid)
        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Instance name (generated when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Padstack index
        #[arg(long)]
        padstack: Option<usize>,

        /// Name of the parent instance for dogbones and via arrays
        #[arg(long)]
        parent: Option<String>,
    },
}

/// Instance kinds accepted by `place`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum KindArg {
    Single,
    Ground,
    Differential,
    DiffGround,
    Dogbone,
    SurroundViaArray,
}

impl From<KindArg> for InstanceType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Single => Self::Single,
            KindArg::Ground => Self::Ground,
            KindArg::Differential => Self::Differential,
            KindArg::DiffGround => Self::DiffGround,
            KindArg::Dogbone => Self::Dogbone,
            KindArg::SurroundViaArray => Self::SurroundViaArray,
        }
    }
}

impl Command {
    fn design_path(&self) -> &Path {
        match self {
            Self::Route { design }
            | Self::Check { design }
            | Self::Hit { design, .. }
            | Self::Snap { design, .. }
            | Self::Place { design, .. } => design,
        }
    }
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints a value as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Failed to serialise output");
            ExitCode::FAILURE
        }
    }
}

/// Places an instance and links it to `parent`, if given.
fn place_instance(
    design: &mut Design,
    kind: InstanceType,
    at: Point,
    name: Option<&str>,
    padstack: Option<usize>,
    parent: Option<InstanceId>,
    options: &PlacementOptions,
) -> StoreResult<InstanceId> {
    let id = design.instances.place(kind, at, name, padstack, options)?;
    if parent.is_some() {
        design.instances.connect(id, parent)?;
    }
    Ok(id)
}

fn run(command: &Command, design: &mut Design, cfg: &Config) -> ExitCode {
    match command {
        Command::Route { .. } => {
            if let Err(e) = project::verify_references(design, cfg.validation.strict_references) {
                error!(error = %e, "Refusing to route");
                return ExitCode::FAILURE;
            }
            print_json(&layout::route_design(design))
        }
        Command::Check { .. } => {
            let issues = layout::check_references(design);
            for issue in &issues {
                println!("{issue}");
            }
            info!(issues = issues.len(), "Reference check complete");
            if issues.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Hit { x, y, .. } => match picking::hit_test(Point::new(*x, *y), design) {
            Some(id) => {
                let name = design.instances.get(id).map_or_else(|| id.to_string(), |i| i.name.clone());
                println!("{name}");
                ExitCode::SUCCESS
            }
            None => {
                info!(x, y, "Nothing at position");
                ExitCode::FAILURE
            }
        },
        Command::Snap { x, y, scale, .. } => {
            let scale = scale.unwrap_or(cfg.picking.zoom_scale);
            let snapped = picking::snap(Point::new(*x, *y), cfg.picking.snap_distance_px, scale, design);
            print_json(&snapped)
        }
        Command::Place {
            kind,
            x,
            y,
            name,
            padstack,
            parent,
            ..
        } => {
            let parent_id = match parent.as_deref() {
                None => None,
                Some(parent) => match design.instances.find_by_name(parent) {
                    Some(found) => Some(found.id),
                    None => {
                        error!(name = parent, "No parent instance with that name");
                        return ExitCode::FAILURE;
                    }
                },
            };
            let placed = place_instance(
                design,
                (*kind).into(),
                Point::new(*x, *y),
                name.as_deref(),
                *padstack,
                parent_id,
                &cfg.placement_options(),
            );
            match placed {
                Ok(id) => {
                    info!(%id, "Placed instance");
                    print_json(&*design)
                }
                Err(e) => {
                    error!(error = %e, "Placement failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Entry point for the via-fanout tool.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_or_default(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nDefault config path: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting via-fanout");

    let mut design = match project::load_design(args.command.design_path()) {
        Ok(design) => design,
        Err(e) => {
            eprintln!("Design error: {e}");
            if let Some(source) = std::error::Error::source(&e) {
                eprintln!("  caused by: {source}");
            }
            return ExitCode::FAILURE;
        }
    };

    run(&args.command, &mut design, &cfg)
}
