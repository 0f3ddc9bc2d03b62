//! # Dungeon Generation
//!
//! The whole-attempt pipeline that turns a level request into a finished level.
//!
//! One attempt runs every planning pass on a fresh grid:
//! 1. Place the entrance and stamp rooms away from it
//! 2. Merge overlapping rooms, then add mines
//! 3. Give every room an exit and wire exits together, then convert catacombs
//! 4. Grow corridors until the grid is full
//! 5. Roll doors, solve, place the stairs and the keys
//! 6. Diffuse themes and complete floods
//!
//! Any pass may give up with [`GenerationInfeasible`]; the attempt loop logs the
//! reason, drops the grid and starts over until the attempt or time budget runs out.

use crate::config::{DEFAULT_LEVEL_HEIGHT, DEFAULT_LEVEL_WIDTH, MAX_LEVEL_SIDE, MIN_LEVEL_SIDE};
use crate::generation::{
    connect, descriptions, doors, growth, merge, rooms, solver, utils, Attempt, GenerationConfig,
    GenerationInfeasible, Generator,
};
use crate::world::{Direction, GenerationStats, Grid, Level, Position};
use crate::{UndercroftError, UndercroftResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Where and how big the level should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRequest {
    /// Depth of the level; recorded on the result only
    pub level_index: u32,
    pub width: u32,
    pub height: u32,
    /// Entrance position
    pub start: Position,
    /// Side of the entrance that opens into the level
    pub incoming: Direction,
}

impl LevelRequest {
    /// Creates a request for a level of the given size.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::{Direction, LevelRequest, Position};
    ///
    /// let request = LevelRequest::new(0, 15, 15, Position::new(7, 0), Direction::Up);
    /// assert!(request.validate().is_ok());
    ///
    /// let outward = LevelRequest::new(0, 15, 15, Position::new(7, 0), Direction::Down);
    /// assert!(outward.validate().is_err());
    /// ```
    pub fn new(level_index: u32, width: u32, height: u32, start: Position, incoming: Direction) -> Self {
        Self {
            level_index,
            width,
            height,
            start,
            incoming,
        }
    }

    /// Rejects sizes outside the supported range and entrances that open outside the grid.
    pub fn validate(&self) -> UndercroftResult<()> {
        let invalid = |message: String| Err(UndercroftError::InvalidRequest(message));

        for (name, side) in [("width", self.width), ("height", self.height)] {
            if !(MIN_LEVEL_SIDE..=MAX_LEVEL_SIDE).contains(&side) {
                return invalid(format!(
                    "{} {} outside {}..={}",
                    name, side, MIN_LEVEL_SIDE, MAX_LEVEL_SIDE
                ));
            }
        }
        let in_bounds = |pos: Position| {
            pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
        };
        if !in_bounds(self.start) {
            return invalid(format!("start {} is outside the grid", self.start));
        }
        if !in_bounds(self.start.step(self.incoming)) {
            return invalid(format!(
                "entrance at {} facing {} opens outside the grid",
                self.start, self.incoming
            ));
        }
        Ok(())
    }

    /// Rejects requests whose start margin leaves no space for the smallest room.
    ///
    /// A room clear of the margin square lies wholly beside it or wholly above
    /// or below it, so one of those four strips must hold a minimum-size room.
    pub fn check_room_space(&self, config: &GenerationConfig) -> UndercroftResult<()> {
        let (width, height) = (self.width as i64, self.height as i64);
        let margin = config.start_margin as i64;
        let side = config.min_room_size as i64;
        let (x, y) = (self.start.x as i64, self.start.y as i64);

        let left = x - margin;
        let right = width - (x + margin + 1);
        let below = y - margin;
        let above = height - (y + margin + 1);
        let fits = (left.max(right) >= side && height >= side) || (below.max(above) >= side && width >= side);
        if fits {
            Ok(())
        } else {
            Err(UndercroftError::InvalidRequest(format!(
                "{}x{} level has no space for a {}x{} room outside the start margin of {}",
                self.width, self.height, side, side, margin
            )))
        }
    }
}

impl Default for LevelRequest {
    fn default() -> Self {
        Self::new(
            0,
            DEFAULT_LEVEL_WIDTH,
            DEFAULT_LEVEL_HEIGHT,
            Position::new(DEFAULT_LEVEL_WIDTH as i32 / 2, 0),
            Direction::Up,
        )
    }
}

/// Generator that retries the full planning pipeline until a level comes out.
#[derive(Debug, Clone, Default)]
pub struct LevelGenerator {
    pub request: LevelRequest,
}

impl LevelGenerator {
    pub fn new(request: LevelRequest) -> Self {
        Self { request }
    }

    /// Runs one attempt on a fresh grid.
    fn attempt(&self, config: &GenerationConfig, rng: &mut StdRng) -> Attempt<Grid> {
        let request = &self.request;
        let mut grid = Grid::new(request.width, request.height, request.start, request.incoming);
        grid.place_entrance()?;

        let plan = rooms::plan_room_counts(config, rng);
        let placements = rooms::place_rooms(&mut grid, config, plan.rooms, rng)?;
        merge::merge_rooms(&mut grid, &placements)?;
        rooms::place_mines(&mut grid, config, plan.mines, rng)?;

        connect::connect(&mut grid, rng)?;
        connect::convert_catacombs(&mut grid, plan.catacombs, rng)?;
        growth::grow(&mut grid, rng)?;

        doors::place_doors(&mut grid, config, rng)?;
        let stairs = solver::solve(&mut grid, rng)?;
        solver::place_stairs(&mut grid, stairs)?;
        doors::place_keys(&mut grid, rng)?;

        descriptions::diffuse(&mut grid, rng)?;
        Ok(grid)
    }

    fn budget_spent(config: &GenerationConfig, started: Instant) -> Option<u64> {
        config
            .time_budget_ms
            .filter(|budget| started.elapsed() >= Duration::from_millis(*budget))
    }
}

impl Generator<Level> for LevelGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> UndercroftResult<Level> {
        config.validate()?;
        self.request.validate()?;
        self.request.check_room_space(config)?;

        let started = Instant::now();
        let mut last = None;
        for attempt in 1..=config.max_attempts {
            if let Some(budget_ms) = Self::budget_spent(config, started) {
                return Err(UndercroftError::BudgetExceeded {
                    attempts: attempt - 1,
                    budget_ms,
                });
            }

            match self.attempt(config, rng) {
                Ok(grid) => {
                    let stats = GenerationStats::collect(&grid, attempt, started.elapsed());
                    let level = Level::new(self.request.level_index, grid, stats);
                    self.validate(&level, config)?;
                    log::info!("level {} generated: {}", level.index, level.stats.summary());
                    return Ok(level);
                }
                Err(reason) => {
                    log::debug!("attempt {} abandoned: {}", attempt, reason);
                    last = Some(reason);
                }
            }
        }

        Err(UndercroftError::AttemptsExhausted {
            attempts: config.max_attempts,
            last: last.unwrap_or(GenerationInfeasible::NoRoomsPlaced),
        })
    }

    fn validate(&self, level: &Level, _config: &GenerationConfig) -> UndercroftResult<()> {
        utils::validate_level(level)
    }

    fn generator_type(&self) -> &'static str {
        "LevelGenerator"
    }
}

/// Generates one level with a random source seeded from `config`.
///
/// # Examples
///
/// ```
/// use undercroft::generation::generate;
/// use undercroft::{GenerationConfig, LevelRequest};
///
/// let level = generate(LevelRequest::default(), &GenerationConfig::new(3)).unwrap();
/// assert_eq!(level.grid.percent_filled(), 100.0);
/// assert!(level.stairs().is_some());
/// ```
pub fn generate(request: LevelRequest, config: &GenerationConfig) -> UndercroftResult<Level> {
    let mut rng = utils::create_rng(config);
    LevelGenerator::new(request).generate(config, &mut rng)
}
