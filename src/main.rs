//! # Undercroft Main Entry Point
//!
//! Generates one level from the command line and prints its dump and statistics.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use undercroft::{
    Direction, GenerationConfig, Generator, LevelGenerator, LevelRequest, Position, TextDisplay,
    UndercroftResult, View,
};

/// Side of the entrance that opens into the level.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum Incoming {
    Up,
    Right,
    Down,
    Left,
}

impl From<Incoming> for Direction {
    fn from(incoming: Incoming) -> Self {
        match incoming {
            Incoming::Up => Direction::Up,
            Incoming::Right => Direction::Right,
            Incoming::Down => Direction::Down,
            Incoming::Left => Direction::Left,
        }
    }
}

/// What the dump shows.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum ViewArg {
    Tiles,
    Descriptions,
    Features,
}

impl From<ViewArg> for View {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Tiles => View::Tiles,
            ViewArg::Descriptions => View::Descriptions,
            ViewArg::Features => View::Features,
        }
    }
}

/// Command line arguments for the Undercroft generator.
#[derive(Parser, Debug)]
#[command(name = "undercroft")]
#[command(about = "Generates fully connected tile-grid dungeon levels")]
#[command(version)]
struct Args {
    /// Random seed; overrides the seed of a loaded config
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid width in tiles
    #[arg(long, default_value_t = undercroft::config::DEFAULT_LEVEL_WIDTH)]
    width: u32,

    /// Grid height in tiles
    #[arg(long, default_value_t = undercroft::config::DEFAULT_LEVEL_HEIGHT)]
    height: u32,

    /// Entrance column; defaults to the middle of the bottom row
    #[arg(long)]
    start_x: Option<i32>,

    /// Entrance row
    #[arg(long, default_value_t = 0)]
    start_y: i32,

    /// Side of the entrance that opens into the level
    #[arg(long, value_enum, default_value = "up")]
    incoming: Incoming,

    /// Depth of the level
    #[arg(long, default_value_t = 0)]
    level: u32,

    /// JSON file with generation settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print ASCII glyphs instead of box drawing
    #[arg(long)]
    ascii: bool,

    /// What the dump shows
    #[arg(long, value_enum, default_value = "tiles")]
    view: ViewArg,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> UndercroftResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    log::info!("Starting Undercroft v{}", undercroft::VERSION);

    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let start = Position::new(args.start_x.unwrap_or(args.width as i32 / 2), args.start_y);
    let request = LevelRequest::new(args.level, args.width, args.height, start, args.incoming.into());
    let generator = LevelGenerator::new(request);
    log::debug!("using {} with seed {}", generator.generator_type(), config.seed);

    let mut rng = undercroft::generation::utils::create_rng(&config);
    let level = generator.generate(&config, &mut rng)?;

    let display = TextDisplay::new()
        .with_ascii(args.ascii)
        .with_view(args.view.into());
    print!("{}", display.render_level(&level));
    Ok(())
}

/// Initializes logging.
///
/// `RUST_LOG` takes precedence over `--log-level` when set.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .format_timestamp(None)
            .init();
    }
}
