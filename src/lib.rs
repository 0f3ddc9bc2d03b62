//! # Undercroft
//!
//! Procedural generation of fully connected tile-grid dungeon levels.
//!
//! ## Architecture Overview
//!
//! A level is a fixed-size grid where every position holds one tile archetype
//! taken from a static catalog. Generation is a pipeline of planning passes that
//! either all succeed or abandon the attempt as a whole:
//!
//! - **World Model**: positions, directions, cells and the grid that owns them
//! - **Generation System**: catalog, growth, rooms, doors, solver and theme diffusion
//! - **Rendering System**: plain-text glyph dumps used for debugging and the CLI
//!
//! Every planning pass returns [`Attempt`], and only the top-level
//! [`LevelGenerator`] inspects the failure, discards the grid and starts over.

pub mod generation;
pub mod rendering;
pub mod utils;
pub mod world;

pub use world::{Cell, Coords, Direction, Dirs, Door, DoorType, GenerationStats, Grid, Level, Position};

pub use generation::{
    Attempt, Description, GenerationConfig, GenerationInfeasible, Generator, LevelGenerator,
    LevelRequest, Room, RoomKind, TileFlags, TileId, TileType,
};

pub use rendering::{TextDisplay, View};

/// Core error type for the Undercroft generator.
#[derive(thiserror::Error, Debug)]
pub enum UndercroftError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generation configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Grid size, start position or incoming direction cannot describe a level
    #[error("Invalid level request: {0}")]
    InvalidRequest(String),

    /// A finished level breaks one of the level invariants
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Every allowed attempt was abandoned
    #[error("Generation gave up after {attempts} attempts (last: {last})")]
    AttemptsExhausted {
        attempts: u32,
        last: GenerationInfeasible,
    },

    /// The caller's wall-clock budget ran out between attempts
    #[error("Generation exceeded its {budget_ms}ms budget after {attempts} attempts")]
    BudgetExceeded { attempts: u32, budget_ms: u64 },
}

/// Result type used throughout the Undercroft codebase.
pub type UndercroftResult<T> = Result<T, UndercroftError>;

/// Version information for the generator.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generator configuration constants.
pub mod config {
    /// Default level width in tiles
    pub const DEFAULT_LEVEL_WIDTH: u32 = 20;

    /// Default level height in tiles
    pub const DEFAULT_LEVEL_HEIGHT: u32 = 20;

    /// Smallest grid side accepted by a level request
    pub const MIN_LEVEL_SIDE: u32 = 5;

    /// Largest grid side accepted by a level request
    pub const MAX_LEVEL_SIDE: u32 = 200;

    /// Default number of whole attempts before giving up
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5_000;
}
