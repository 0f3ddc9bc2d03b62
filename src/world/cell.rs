//! # Cells and Doors
//!
//! Per-position generation state.

use super::{Coords, Direction, Position};
use crate::generation::{Description, TileId, TileType};
use serde::{Deserialize, Serialize};

/// Species of a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorType {
    Regular,
    Portcullis,
    Secret,
}

/// A door on one edge of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Edge of the owning cell the door sits on
    pub direction: Direction,
    pub open: bool,
    pub locked: bool,
    pub door_type: DoorType,
}

impl Door {
    /// Creates a closed, unlocked door.
    pub fn new(direction: Direction, door_type: DoorType) -> Self {
        Self {
            direction,
            open: false,
            locked: false,
            door_type,
        }
    }
}

/// Mutable generation state for one filled grid position.
///
/// Empty positions have no `Cell` at all; the grid stores `Option<Cell>`.
#[derive(Debug, Clone)]
pub struct Cell {
    pub coords: Coords,
    pub tile: TileId,
    /// Connections of `tile` that still point at an empty in-bounds neighbor
    pub available_connections: u32,
    /// Solve visit order; `None` until the solver reaches the cell
    pub sequence: Option<u32>,
    pub merged: bool,
    pub visited: bool,
    pub attach_blocked: bool,
    pub exit_impossible: bool,
    pub has_key: bool,
    pub is_catacombs: bool,
    pub doors: Vec<Door>,
    /// Index of the owning room in `Grid::rooms`
    pub room: Option<usize>,
    pub description: Description,
    pub description_weight: u32,
}

impl Cell {
    /// Creates a freshly placed cell.
    pub fn new(coords: Coords, tile: TileId) -> Self {
        Self {
            coords,
            tile,
            available_connections: 0,
            sequence: None,
            merged: false,
            visited: false,
            attach_blocked: false,
            exit_impossible: false,
            has_key: false,
            is_catacombs: false,
            doors: Vec::new(),
            room: None,
            description: Description::Undecided,
            description_weight: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.coords.position()
    }

    /// The cell's tile archetype.
    pub fn tile_type(&self) -> &'static TileType {
        self.tile.info()
    }

    pub fn has_doors(&self) -> bool {
        !self.doors.is_empty()
    }

    pub fn has_locked_door(&self) -> bool {
        self.doors.iter().any(|door| door.locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::catalog;
    use crate::world::Dirs;

    #[test]
    fn test_new_cell_defaults() {
        let tile = catalog::corridor(Dirs::UP | Dirs::DOWN).unwrap();
        let cell = Cell::new(Coords::new(3, 4, 10, 10), tile);

        assert_eq!(cell.position(), Position::new(3, 4));
        assert_eq!(cell.sequence, None);
        assert!(!cell.visited);
        assert!(!cell.has_doors());
        assert_eq!(cell.description, Description::Undecided);
        assert_eq!(cell.tile_type().connects, Dirs::UP | Dirs::DOWN);
    }

    #[test]
    fn test_locked_door_detection() {
        let tile = catalog::corridor(Dirs::LEFT | Dirs::RIGHT).unwrap();
        let mut cell = Cell::new(Coords::new(1, 1, 10, 10), tile);

        cell.doors.push(Door::new(Direction::Left, DoorType::Secret));
        assert!(cell.has_doors());
        assert!(!cell.has_locked_door());

        let mut locked = Door::new(Direction::Right, DoorType::Portcullis);
        locked.locked = true;
        cell.doors.push(locked);
        assert!(cell.has_locked_door());
    }
}
