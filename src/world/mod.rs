//! # World Module
//!
//! Geometry and storage for a level under construction.
//!
//! This module contains the building blocks every generation pass works on:
//! - Positions, cardinal directions and direction sets
//! - Edge-aware coordinates
//! - Cells, doors and the grid that owns them
//! - Finished levels and their statistics

pub mod cell;
pub mod grid;
pub mod level;

pub use cell::*;
pub use grid::*;
pub use level::*;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate on the level grid.
///
/// The origin is the bottom-left position; `y` grows upwards.
///
/// # Examples
///
/// ```
/// use undercroft::{Direction, Position};
///
/// let pos = Position::new(7, 0);
/// assert_eq!(pos.step(Direction::Up), Position::new(7, 1));
/// assert_eq!(pos.step(Direction::Left), Position::new(6, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the adjacent position in the given direction.
    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    /// Returns the position offset by the given deltas.
    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    /// Calculates the Euclidean distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.euclidean_distance(pos2), 5.0);
    /// ```
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Chebyshev distance, used for square margins around a position.
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    /// Returns the 4 cardinal adjacent positions paired with their direction.
    pub fn cardinal_neighbors(self) -> [(Direction, Position); 4] {
        Direction::ALL.map(|direction| (direction, self.step(direction)))
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All four directions in clockwise order starting at `Up`.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::Direction;
    ///
    /// assert_eq!(Direction::Up.delta(), (0, 1));
    /// assert_eq!(Direction::Left.delta(), (-1, 0));
    /// ```
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    /// Converts a position delta to a direction.
    ///
    /// Returns None if the delta isn't a unit cardinal step.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, 1) => Some(Direction::Up),
            (1, 0) => Some(Direction::Right),
            (0, -1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            _ => None,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// The heading after a quarter turn counter-clockwise.
    pub fn turn_left(self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }

    /// The heading after a quarter turn clockwise.
    pub fn turn_right(self) -> Direction {
        self.turn_left().opposite()
    }

    /// Whether this direction runs along the y axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// The single-direction set for this direction.
    pub const fn bit(self) -> Dirs {
        match self {
            Direction::Up => Dirs::UP,
            Direction::Right => Dirs::RIGHT,
            Direction::Down => Dirs::DOWN,
            Direction::Left => Dirs::LEFT,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// A set of cardinal directions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    pub struct Dirs: u8 {
        const UP = 0b0001;
        const RIGHT = 0b0010;
        const DOWN = 0b0100;
        const LEFT = 0b1000;
    }
}

impl Dirs {
    /// Whether the set contains the given direction.
    pub fn has(self, direction: Direction) -> bool {
        self.contains(direction.bit())
    }

    /// Number of directions in the set.
    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }

    /// Iterates the contained directions in `Direction::ALL` order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.has(*d))
    }

    /// The set rotated half a turn, e.g. `UP | LEFT` becomes `DOWN | RIGHT`.
    pub fn opposite(self) -> Dirs {
        self.directions().fold(Dirs::empty(), |acc, d| acc | d.opposite().bit())
    }

    /// True for a two-direction set whose directions are perpendicular.
    pub fn is_corner_pair(self) -> bool {
        self.count() == 2 && self != (Dirs::UP | Dirs::DOWN) && self != (Dirs::LEFT | Dirs::RIGHT)
    }
}

impl From<Direction> for Dirs {
    fn from(direction: Direction) -> Self {
        direction.bit()
    }
}

/// A grid position that knows which grid edges it touches.
///
/// Built against fixed grid bounds; `direction` lets a position double as a
/// directional marker (e.g. the entrance heading).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
    pub at_top: bool,
    pub at_right: bool,
    pub at_bottom: bool,
    pub at_left: bool,
    pub direction: Option<Direction>,
}

impl Coords {
    /// Creates coordinates for a position on a `width` x `height` grid.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::{Coords, Direction};
    ///
    /// let coords = Coords::new(0, 3, 10, 10);
    /// assert!(coords.at_edge(Direction::Left));
    /// assert!(!coords.at_edge(Direction::Up));
    /// ```
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            at_top: y == height as i32 - 1,
            at_right: x == width as i32 - 1,
            at_bottom: y == 0,
            at_left: x == 0,
            direction: None,
        }
    }

    /// Tags the coordinates with a direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Whether the position sits on the grid edge in the given direction.
    pub fn at_edge(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.at_top,
            Direction::Right => self.at_right,
            Direction::Down => self.at_bottom,
            Direction::Left => self.at_left,
        }
    }

    /// The set of grid edges this position touches.
    pub fn edges(&self) -> Dirs {
        Direction::ALL
            .into_iter()
            .filter(|d| self.at_edge(*d))
            .fold(Dirs::empty(), |acc, d| acc | d.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_step() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.step(Direction::Up), Position::new(5, 6));
        assert_eq!(pos.step(Direction::Right), Position::new(6, 5));
        assert_eq!(pos.step(Direction::Down), Position::new(5, 4));
        assert_eq!(pos.step(Direction::Left), Position::new(4, 5));
    }

    #[test]
    fn test_position_distances() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.euclidean_distance(pos2), 5.0);
        assert_eq!(pos1.chebyshev_distance(pos2), 4);
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_direction_turns() {
        for direction in Direction::ALL {
            assert_eq!(direction.turn_left().turn_right(), direction);
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(direction.turn_left().turn_left(), direction.opposite());
        }
        assert_eq!(Direction::Up.turn_left(), Direction::Left);
        assert_eq!(Direction::Up.turn_right(), Direction::Right);
    }

    #[test]
    fn test_direction_delta_round_trip() {
        for direction in Direction::ALL {
            let (dx, dy) = direction.delta();
            assert_eq!(Direction::from_delta(dx, dy), Some(direction));
        }
        assert_eq!(Direction::from_delta(1, 1), None);
    }

    #[test]
    fn test_dirs_helpers() {
        let corner = Dirs::DOWN | Dirs::LEFT;
        assert!(corner.is_corner_pair());
        assert_eq!(corner.opposite(), Dirs::UP | Dirs::RIGHT);
        assert_eq!(corner.count(), 2);
        assert_eq!(
            corner.directions().collect::<Vec<_>>(),
            vec![Direction::Down, Direction::Left]
        );
        assert!(!(Dirs::UP | Dirs::DOWN).is_corner_pair());
    }

    #[test]
    fn test_coords_edges() {
        let corner = Coords::new(0, 0, 15, 15);
        assert_eq!(corner.edges(), Dirs::DOWN | Dirs::LEFT);

        let top_right = Coords::new(14, 14, 15, 15);
        assert_eq!(top_right.edges(), Dirs::UP | Dirs::RIGHT);

        let inner = Coords::new(7, 7, 15, 15).with_direction(Direction::Up);
        assert!(inner.edges().is_empty());
        assert_eq!(inner.direction, Some(Direction::Up));
    }
}
