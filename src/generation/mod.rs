//! # Generation Module
//!
//! Procedural generation of tile-grid dungeon levels.
//!
//! A level is planned by a fixed sequence of passes over one [`Grid`]:
//! entrance, room placement, room merge, mines, exits and connections,
//! catacombs, corridor growth, doors, solving, keys, stairs and finally theme
//! diffusion. Every pass returns [`Attempt`]; the first failure abandons the
//! grid and [`LevelGenerator`] starts again from a blank one.

pub mod catalog;
pub mod connect;
pub mod descriptions;
pub mod doors;
pub mod dungeon;
pub mod growth;
pub mod merge;
pub mod rooms;
pub mod solver;

pub use catalog::{TileFlags, TileId, TileType};
pub use descriptions::Description;
pub use dungeon::{generate, LevelGenerator, LevelRequest};

use crate::world::{Grid, Position};
use crate::{UndercroftError, UndercroftResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reason an in-progress attempt was abandoned.
///
/// Never fatal: the attempt loop discards the grid and retries.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationInfeasible {
    #[error("growth stalled at {percent_filled}% filled with nothing left to substitute")]
    GrowthExhausted { percent_filled: u32 },

    #[error("no room could be placed")]
    NoRoomsPlaced,

    #[error("room outline walk got stuck at ({x}, {y})")]
    MergeWalkStuck { x: i32, y: i32 },

    #[error("room {room} has no wall that can become an exit")]
    RoomUnconnectable { room: usize },

    #[error("{unvisited} cells are unreachable from the entrance")]
    Disconnected { unvisited: usize },

    #[error("no dead end qualifies for the down stairs")]
    NoStairsCandidate,

    #[error("no cell can hold the key for the locked door at ({x}, {y})")]
    NoKeyCandidate { x: i32, y: i32 },

    #[error("flood reached an incompatible cell at ({x}, {y})")]
    FloodIncompatible { x: i32, y: i32 },

    #[error("no {conversion} conversion for {tile}")]
    UnknownConversion {
        conversion: &'static str,
        tile: String,
    },

    #[error("room exits did not settle")]
    ExitsUnresolved,
}

/// Result of one planning step inside an attempt.
pub type Attempt<T> = Result<T, GenerationInfeasible>;

/// Configuration for level generation.
///
/// Chances are percentages in `0..=100`. Tier thresholds are ascending
/// percentile rolls; each threshold met adds one to the sampled count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Minimum number of rooms per level (mines included)
    pub min_rooms: u32,
    /// Maximum number of rooms per level (mines included)
    pub max_rooms: u32,
    /// Minimum room side, walls included
    pub min_room_size: u32,
    /// Maximum room side, walls included
    pub max_room_size: u32,
    /// Chebyshev radius around the entrance kept free of rooms, mines and doors
    pub start_margin: u32,
    /// Anchor draws per room before the room is skipped
    pub max_placement_attempts: u32,
    /// Chance that a large rectangular room gets rounded corners
    pub round_room_chance: u32,
    /// Chance that a room is L-shaped instead of rectangular
    pub irregular_chance: u32,
    pub mine_min_length: u32,
    pub mine_max_length: u32,
    pub mine_thresholds: Vec<u32>,
    pub catacomb_thresholds: Vec<u32>,
    /// Chance that a regular or portcullis door is locked
    pub lock_chance: u32,
    /// Chance that an unlocked door starts open
    pub open_chance: u32,
    /// Whole attempts before giving up
    pub max_attempts: u32,
    /// Optional wall-clock budget across all attempts
    pub time_budget_ms: Option<u64>,
}

impl GenerationConfig {
    /// Creates the default generation configuration with the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.min_room_size >= 3);
    /// assert!(config.max_room_size >= config.min_room_size);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            min_rooms: 2,
            max_rooms: 5,
            min_room_size: 3,
            max_room_size: 7,
            start_margin: 2,
            max_placement_attempts: 50,
            round_room_chance: 20,
            irregular_chance: 50,
            mine_min_length: 5,
            mine_max_length: 9,
            mine_thresholds: vec![75, 95],
            catacomb_thresholds: vec![70, 92, 98],
            lock_chance: 25,
            open_chance: 50,
            max_attempts: crate::config::DEFAULT_MAX_ATTEMPTS,
            time_budget_ms: None,
        }
    }

    /// Creates a configuration for testing with fewer, smaller rooms.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            min_rooms: 1,
            max_rooms: 3,
            max_room_size: 5,
            mine_min_length: 4,
            mine_max_length: 6,
            max_attempts: 20_000,
            ..Self::new(seed)
        }
    }

    /// Creates a configuration for large, busy levels.
    pub fn for_detailed_generation(seed: u64) -> Self {
        Self {
            min_rooms: 4,
            max_rooms: 9,
            max_room_size: 9,
            round_room_chance: 30,
            mine_max_length: 12,
            lock_chance: 35,
            max_attempts: 20_000,
            ..Self::new(seed)
        }
    }

    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> UndercroftResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects inconsistent settings.
    pub fn validate(&self) -> UndercroftResult<()> {
        let invalid = |message: String| Err(UndercroftError::InvalidConfig(message));

        if self.min_rooms == 0 {
            return invalid("min_rooms must be at least 1".to_string());
        }
        if self.min_rooms > self.max_rooms {
            return invalid(format!(
                "min_rooms ({}) exceeds max_rooms ({})",
                self.min_rooms, self.max_rooms
            ));
        }
        if self.min_room_size < 3 || self.min_room_size > self.max_room_size {
            return invalid(format!(
                "room size range {}..={} must start at 3 or more and be non-empty",
                self.min_room_size, self.max_room_size
            ));
        }
        if self.mine_min_length < 3 || self.mine_min_length > self.mine_max_length {
            return invalid(format!(
                "mine length range {}..={} must start at 3 or more and be non-empty",
                self.mine_min_length, self.mine_max_length
            ));
        }
        for (name, chance) in [
            ("round_room_chance", self.round_room_chance),
            ("irregular_chance", self.irregular_chance),
            ("lock_chance", self.lock_chance),
            ("open_chance", self.open_chance),
        ] {
            if chance > 100 {
                return invalid(format!("{} must be a percentage, got {}", name, chance));
            }
        }
        for (name, thresholds) in [
            ("mine_thresholds", &self.mine_thresholds),
            ("catacomb_thresholds", &self.catacomb_thresholds),
        ] {
            let ascending = thresholds.windows(2).all(|pair| pair[0] < pair[1]);
            if !ascending || thresholds.iter().any(|t| *t > 100) {
                return invalid(format!("{} must be ascending percentages", name));
            }
        }
        if self.max_attempts == 0 || self.max_placement_attempts == 0 {
            return invalid("attempt limits must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// What a room arena entry was built as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    /// Walled room made of room archetypes
    Regular,
    /// Three-wide block of corridor archetypes
    Mine,
    /// Regular room remapped to corridor archetypes
    Catacombs,
}

/// A room in the grid's room arena.
///
/// Cells are referenced by flat grid index, never by handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: usize,
    pub kind: RoomKind,
    /// Bottom-left cell of the room's outline
    pub origin: Position,
    /// Outline cells: walls, corners and exits
    pub walls: Vec<usize>,
    /// Interior cells
    pub space: Vec<usize>,
    pub description: Description,
    pub round: bool,
}

impl Room {
    /// Creates an empty room.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::{Position, Room, RoomKind};
    ///
    /// let room = Room::new(0, RoomKind::Regular, Position::new(4, 5));
    /// assert_eq!(room.origin, Position::new(4, 5));
    /// assert!(room.is_empty());
    /// ```
    pub fn new(id: usize, kind: RoomKind, origin: Position) -> Self {
        Self {
            id,
            kind,
            origin,
            walls: Vec::new(),
            space: Vec::new(),
            description: Description::Undecided,
            round: false,
        }
    }

    /// Every cell index of the room, outline first.
    pub fn cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.walls.iter().chain(self.space.iter()).copied()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.walls.contains(&index) || self.space.contains(&index)
    }

    /// Number of cells in the room.
    pub fn len(&self) -> usize {
        self.walls.len() + self.space.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty() && self.space.is_empty()
    }

    /// Whether doors and atomic theme resolution apply to this room.
    pub fn is_walled(&self) -> bool {
        self.kind == RoomKind::Regular
    }
}

/// Trait for procedural generators.
///
/// All generators share this interface so the binary and the tests can drive
/// them the same way.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> UndercroftResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> UndercroftResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::world::{Direction, Level};
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Samples a count from tiered percentile bands.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::generation::utils::band_count;
    ///
    /// let tiers = [70, 92, 98];
    /// assert_eq!(band_count(10, &tiers), 0);
    /// assert_eq!(band_count(70, &tiers), 1);
    /// assert_eq!(band_count(95, &tiers), 2);
    /// assert_eq!(band_count(99, &tiers), 3);
    /// ```
    pub fn band_count(roll: u32, thresholds: &[u32]) -> u32 {
        thresholds.iter().filter(|threshold| roll >= **threshold).count() as u32
    }

    /// Checks every invariant of a finished level.
    pub fn validate_level(level: &Level) -> UndercroftResult<()> {
        let grid = &level.grid;
        let fail = |message: String| Err(UndercroftError::InvalidLevel(message));

        if !grid.is_full() {
            return fail(format!("level is only {:.1}% filled", grid.percent_filled()));
        }

        let mut stairs = Vec::new();
        for cell in grid.cells() {
            let pos = cell.position();
            let tile = cell.tile_type();

            if cell.available_connections != grid.open_connections(pos).len() as u32 {
                return fail(format!("stale available connections at {}", pos));
            }
            if !grid.fits(pos, cell.tile) {
                return fail(format!("{} at {} does not fit its neighbors", tile.name, pos));
            }
            if !cell.visited || cell.sequence.is_none() {
                return fail(format!("cell {} was never reached", pos));
            }
            if tile.is_stairs_down() {
                stairs.push(pos);
            }
            if cell.description.is_flooded() {
                if tile.is_flooding_incompatible() || tile.is_entrance() {
                    return fail(format!("flooded {} at {}", tile.name, pos));
                }
                let flooded_neighbor = Direction::ALL.into_iter().any(|direction| {
                    grid.linked(pos, direction)
                        && grid
                            .neighbor(pos, direction)
                            .is_some_and(|other| other.description.is_flooded())
                });
                if !flooded_neighbor {
                    return fail(format!("isolated flooded cell at {}", pos));
                }
            }
        }

        if !grid.tile(grid.start).is_entrance() {
            return fail(format!("no entrance at {}", grid.start));
        }

        let recorded = grid.stairs_position()?;
        match stairs.as_slice() {
            [pos] if *pos == recorded => {
                let tile = grid.tile(*pos);
                let coords = grid.coords(*pos);
                let backed = tile
                    .connects
                    .directions()
                    .any(|direction| coords.at_edge(direction.opposite()));
                if backed {
                    return fail(format!("stairs at {} back onto the grid edge", pos));
                }
            }
            _ => return fail(format!("expected exactly one down stairs, found {}", stairs.len())),
        }

        for door_pos in &grid.locked_doors {
            let door_sequence = grid.cell(*door_pos).and_then(|cell| cell.sequence);
            let has_key = grid.cells().any(|cell| {
                cell.has_key
                    && matches!((cell.sequence, door_sequence), (Some(key), Some(door)) if key < door)
            });
            if !has_key {
                return fail(format!("locked door at {} has no earlier key", door_pos));
            }
        }

        for room in &grid.rooms {
            let has_exit = room.cells().any(|index| {
                let pos = grid.position_of(index);
                grid.tile(pos).connects.directions().any(|direction| {
                    let outside = pos.step(direction);
                    grid.in_bounds(outside) && grid.room_of(outside) != Some(room.id)
                })
            });
            if !has_exit {
                return fail(format!("room {} has no exit", room.id));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert!(config.min_room_size >= 3);
        assert!(config.max_room_size >= config.min_room_size);
        assert!(config.min_rooms <= config.max_rooms);
        assert!(config.validate().is_ok());
        assert!(GenerationConfig::for_testing(1).validate().is_ok());
        assert!(GenerationConfig::for_detailed_generation(1).validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_ranges() {
        let mut config = GenerationConfig::new(1);
        config.min_rooms = 6;
        config.max_rooms = 2;
        assert!(matches!(config.validate(), Err(UndercroftError::InvalidConfig(_))));

        let mut config = GenerationConfig::new(1);
        config.min_room_size = 2;
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::new(1);
        config.lock_chance = 101;
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::new(1);
        config.catacomb_thresholds = vec![90, 80];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: GenerationConfig = serde_json::from_str(r#"{"seed": 9, "max_rooms": 8}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.max_rooms, 8);
        assert_eq!(config.min_rooms, GenerationConfig::default().min_rooms);
    }

    #[test]
    fn test_room_membership() {
        let mut room = Room::new(2, RoomKind::Regular, Position::new(1, 1));
        assert!(room.is_empty());
        assert!(room.is_walled());

        room.walls.extend([10, 11, 12]);
        room.space.push(20);
        assert_eq!(room.len(), 4);
        assert!(room.contains(11));
        assert!(room.contains(20));
        assert!(!room.contains(21));
        assert_eq!(room.cells().collect::<Vec<_>>(), vec![10, 11, 12, 20]);

        room.kind = RoomKind::Mine;
        assert!(!room.is_walled());
    }

    #[test]
    fn test_utils_rng_creation() {
        use rand::Rng;

        let config = GenerationConfig::new(12345);
        let mut a = utils::create_rng(&config);
        let mut b = utils::create_rng(&config);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn test_band_count_tiers() {
        assert_eq!(utils::band_count(0, &[]), 0);
        assert_eq!(utils::band_count(74, &[75, 95]), 0);
        assert_eq!(utils::band_count(75, &[75, 95]), 1);
        assert_eq!(utils::band_count(99, &[75, 95]), 2);
    }

    #[test]
    fn test_infeasible_messages() {
        let reason = GenerationInfeasible::Disconnected { unvisited: 3 };
        assert_eq!(reason.to_string(), "3 cells are unreachable from the entrance");

        let reason = GenerationInfeasible::UnknownConversion {
            conversion: "dead-end-to-stairs",
            tile: "straight-up-down".to_string(),
        };
        assert!(reason.to_string().contains("dead-end-to-stairs"));
    }
}
