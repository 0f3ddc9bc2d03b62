//! # Grid
//!
//! Flat row-major storage for a level under construction.

use super::{Cell, Coords, Direction, Position};
use crate::generation::{catalog, Attempt, GenerationInfeasible, Room, TileId, TileType};
use crate::{UndercroftError, UndercroftResult};

/// A fixed-size grid of optional cells.
///
/// Row-major storage, index = `y * width + x`, with `y = 0` at the bottom.
/// Every pass iterates in index order so a seeded run is reproducible.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Option<Cell>>,
    /// Room arena; cells refer to rooms by index
    pub rooms: Vec<Room>,
    pub start: Position,
    /// Direction the entrance opens towards
    pub incoming: Direction,
    /// Cells holding at least one locked door
    pub locked_doors: Vec<Position>,
    pub stairs: Option<Position>,
}

impl Grid {
    /// Creates an empty grid.
    pub fn new(width: u32, height: u32, start: Position, incoming: Direction) -> Self {
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
            rooms: Vec::new(),
            start,
            incoming,
            locked_doors: Vec::new(),
            stairs: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width as i32 && pos.y < self.height as i32
    }

    /// Flat index of an in-bounds position.
    pub fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    pub fn position_of(&self, index: usize) -> Position {
        let width = self.width as usize;
        Position::new((index % width) as i32, (index / width) as i32)
    }

    /// Edge-aware coordinates for a position.
    pub fn coords(&self, pos: Position) -> Coords {
        Coords::new(pos.x, pos.y, self.width, self.height)
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).and_then(|index| self.cells[index].as_ref())
    }

    pub fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        let index = self.index(pos)?;
        self.cells[index].as_mut()
    }

    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    pub fn cell_at_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index).and_then(Option::as_mut)
    }

    /// Iterates the filled cells in index order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut().flatten()
    }

    /// Archetype at a position; empty positions and out-of-bounds yield the empty archetype.
    pub fn tile(&self, pos: Position) -> &'static TileType {
        self.cell(pos).map_or(TileId::EMPTY.info(), Cell::tile_type)
    }

    /// In bounds and not yet filled.
    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.index(pos).is_some_and(|index| self.cells[index].is_none())
    }

    /// Positions that are still empty, in index order.
    pub fn empty_positions(&self) -> Vec<Position> {
        (0..self.cells.len())
            .filter(|index| self.cells[*index].is_none())
            .map(|index| self.position_of(index))
            .collect()
    }

    /// Places or replaces the archetype at `pos`.
    ///
    /// An existing cell keeps its planning state. Available connections are
    /// recounted for the position and its neighbors.
    pub fn set_tile(&mut self, pos: Position, tile: TileId) {
        let Some(index) = self.index(pos) else {
            return;
        };
        let coords = self.coords(pos);
        if let Some(cell) = self.cells[index].as_mut() {
            cell.tile = tile;
        } else {
            self.cells[index] = Some(Cell::new(coords, tile));
        }
        self.recount(pos);
        for (_, neighbor) in pos.cardinal_neighbors() {
            self.recount(neighbor);
        }
    }

    /// Empties a position.
    pub fn clear(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            self.cells[index] = None;
            for (_, neighbor) in pos.cardinal_neighbors() {
                self.recount(neighbor);
            }
        }
    }

    /// Connections of the archetype at `pos` that point at an empty in-bounds neighbor.
    pub fn open_connections(&self, pos: Position) -> Vec<Direction> {
        self.tile(pos)
            .connects
            .directions()
            .filter(|direction| self.is_empty_at(pos.step(*direction)))
            .collect()
    }

    fn recount(&mut self, pos: Position) {
        let available = self.open_connections(pos).len() as u32;
        if let Some(cell) = self.cell_mut(pos) {
            cell.available_connections = available;
        }
    }

    /// Whether `tile` may sit at `pos` given the grid edges and every filled neighbor.
    pub fn fits(&self, pos: Position, tile: TileId) -> bool {
        let info = tile.info();
        let coords = self.coords(pos);
        Direction::ALL.into_iter().all(|direction| {
            if coords.at_edge(direction) {
                !info.connects_in(direction)
            } else {
                info.compatible_with(self.tile(pos.step(direction)), direction)
            }
        })
    }

    /// Fraction of filled positions, as a percentage.
    pub fn percent_filled(&self) -> f64 {
        if self.cells.is_empty() {
            return 100.0;
        }
        let filled = self.cells.iter().filter(|cell| cell.is_some()).count();
        filled as f64 * 100.0 / self.cells.len() as f64
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The filled neighbor in `direction`.
    pub fn neighbor(&self, pos: Position, direction: Direction) -> Option<&Cell> {
        self.cell(pos.step(direction))
    }

    /// Whether movement may leave `pos` towards `direction`.
    ///
    /// Requires the cell to be traversable that way and both sides to mate.
    /// Traversal is one-directional: a round corner can be entered but not left.
    pub fn can_traverse(&self, pos: Position, direction: Direction) -> bool {
        let here = self.tile(pos);
        let there = self.tile(pos.step(direction));
        here.traversable_in(direction) && here.connects_to(there, direction)
    }

    /// Traversable in at least one direction across the shared edge.
    pub fn linked(&self, pos: Position, direction: Direction) -> bool {
        self.can_traverse(pos, direction) || self.can_traverse(pos.step(direction), direction.opposite())
    }

    /// Room index of the cell at `pos`.
    pub fn room_of(&self, pos: Position) -> Option<usize> {
        self.cell(pos).and_then(|cell| cell.room)
    }

    /// Places the entrance cell at `start`, opening towards `incoming`.
    pub fn place_entrance(&mut self) -> Attempt<()> {
        let tile = catalog::entrance(self.incoming).ok_or(GenerationInfeasible::UnknownConversion {
            conversion: "direction-to-entrance",
            tile: self.incoming.to_string(),
        })?;
        self.set_tile(self.start, tile);
        Ok(())
    }

    /// The position holding the down stairs.
    pub fn stairs_position(&self) -> UndercroftResult<Position> {
        self.stairs
            .ok_or_else(|| UndercroftError::InvalidLevel("level has no down stairs".to_string()))
    }
}
