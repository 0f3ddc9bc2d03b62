//! # Room Merge
//!
//! Turns overlapping room stamps into single rooms with one clean outline.
//!
//! Stamps that overlap form a component. Each component's outline is walked
//! from its bottom-left corner keeping the outside on the left; the walk must
//! close on itself. Afterwards single-cell holes are filled with room space and
//! every cell is re-inferred from the component's membership.

use crate::generation::rooms::{classify, Footprint, ShapeCell};
use crate::generation::{catalog, Attempt, GenerationInfeasible, Room, RoomKind, TileId};
use crate::world::{Direction, Dirs, Grid, Position};
use std::collections::{BTreeSet, VecDeque};

/// Set of positions belonging to one component.
#[derive(Debug, Clone)]
pub struct Membership {
    width: i32,
    height: i32,
    inside: Vec<bool>,
    count: usize,
}

impl Membership {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            inside: vec![false; (width * height) as usize],
            count: 0,
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        let in_bounds = pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height;
        in_bounds.then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.index(pos).is_some_and(|index| self.inside[index])
    }

    pub fn insert(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            if !self.inside[index] {
                self.inside[index] = true;
                self.count += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Member positions in row-major order.
    pub fn positions(&self) -> Vec<Position> {
        self.inside
            .iter()
            .enumerate()
            .filter(|(_, inside)| **inside)
            .map(|(index, _)| Position::new(index as i32 % self.width, index as i32 / self.width))
            .collect()
    }

    pub fn classify(&self, pos: Position) -> ShapeCell {
        classify(pos, |p| self.contains(p))
    }
}

fn is_stamped(grid: &Grid, pos: Position) -> bool {
    grid.cell(pos)
        .is_some_and(|cell| cell.room.is_some() && cell.tile_type().is_room_type())
}

/// Groups stamped room cells into components.
///
/// Neighbors join when either side declares the shared edge inside its room.
pub fn components(grid: &Grid) -> Vec<Membership> {
    let mut assigned = vec![false; grid.len()];
    let mut found = Vec::new();

    for index in 0..grid.len() {
        let start = grid.position_of(index);
        if assigned[index] || !is_stamped(grid, start) {
            continue;
        }
        let mut member = Membership::new(grid.width(), grid.height());
        let mut queue = VecDeque::from([start]);
        assigned[index] = true;

        while let Some(pos) = queue.pop_front() {
            member.insert(pos);
            for (direction, other) in pos.cardinal_neighbors() {
                let Some(other_index) = grid.index(other) else {
                    continue;
                };
                if assigned[other_index] || !is_stamped(grid, other) {
                    continue;
                }
                let joined = grid.tile(pos).room_connects.has(direction)
                    || grid.tile(other).room_connects.has(direction.opposite());
                if joined {
                    assigned[other_index] = true;
                    queue.push_back(other);
                }
            }
        }
        found.push(member);
    }
    found
}

/// Walks the outline of a component clockwise from its bottom-left corner.
///
/// At every step the walk prefers turning left, then straight, then right.
/// With none of those open the cell is a corner and the walk turns right on
/// the spot. Returns the visited positions; fails if the walk cannot move at
/// all or does not close within a bounded number of steps.
pub fn walk_outline(member: &Membership, start: Position) -> Attempt<Vec<Position>> {
    let mut pos = start;
    let mut heading = Direction::Up;
    let mut visited = vec![start];
    let mut turns_in_place = 0;
    let limit = 8 * member.len() + 8;

    for _ in 0..limit {
        let next = [heading.turn_left(), heading, heading.turn_right()]
            .into_iter()
            .find(|direction| member.contains(pos.step(*direction)));
        let Some(next) = next else {
            // Two turns on the spot have looked in every direction.
            turns_in_place += 1;
            if turns_in_place == 2 {
                return Err(GenerationInfeasible::MergeWalkStuck { x: pos.x, y: pos.y });
            }
            heading = heading.turn_right();
            continue;
        };
        turns_in_place = 0;
        if pos == start && next == Direction::Up && visited.len() > 1 {
            return Ok(visited);
        }
        heading = next;
        pos = pos.step(next);
        visited.push(pos);
    }

    Err(GenerationInfeasible::MergeWalkStuck { x: pos.x, y: pos.y })
}

/// Empty positions whose four neighbors are all members.
fn isolated_gaps(grid: &Grid, member: &Membership) -> Vec<Position> {
    let mut gaps = BTreeSet::new();
    for pos in member.positions() {
        for (_, other) in pos.cardinal_neighbors() {
            let enclosed = other
                .cardinal_neighbors()
                .iter()
                .all(|(_, around)| member.contains(*around));
            if grid.is_empty_at(other) && enclosed {
                gaps.insert((other.y, other.x));
            }
        }
    }
    gaps.into_iter().map(|(y, x)| Position::new(x, y)).collect()
}

fn set_shape(grid: &mut Grid, pos: Position, tile: TileId, room: usize) {
    grid.set_tile(pos, tile);
    if let Some(cell) = grid.cell_mut(pos) {
        cell.room = Some(room);
        cell.merged = true;
    }
}

/// Merges every stamped component into one regular room and rebuilds the room arena.
///
/// A component stays round only when a single round stamp formed it.
pub fn merge_rooms(grid: &mut Grid, placements: &[Footprint]) -> Attempt<()> {
    let stamp_of: Vec<Option<usize>> = (0..grid.len())
        .map(|index| grid.cell_at(index).and_then(|cell| cell.room))
        .collect();
    let mut rooms = Vec::new();

    for mut member in components(grid) {
        let id = rooms.len();
        let positions = member.positions();
        let Some(start) = positions.first().copied() else {
            continue;
        };

        let stamps: BTreeSet<usize> = positions
            .iter()
            .filter_map(|pos| grid.index(*pos).and_then(|index| stamp_of[index]))
            .collect();

        let start_tile = member.classify(start).tile()?;
        if !start_tile.info().is_clean_start_wall() {
            return Err(GenerationInfeasible::MergeWalkStuck {
                x: start.x,
                y: start.y,
            });
        }
        for gap in isolated_gaps(grid, &member) {
            member.insert(gap);
        }
        let mut outline = BTreeSet::new();
        for pos in walk_outline(&member, start)? {
            if outline.insert((pos.y, pos.x)) {
                let tile = member.classify(pos).tile()?;
                set_shape(grid, pos, tile, id);
            }
        }

        // Clean pass: members the walk never reached.
        let mut room = Room::new(id, RoomKind::Regular, start);
        for pos in member.positions() {
            let tile = member.classify(pos).tile()?;
            if !outline.contains(&(pos.y, pos.x)) {
                set_shape(grid, pos, tile, id);
            }
            if let Some(index) = grid.index(pos) {
                if tile.info().is_room_space() {
                    room.space.push(index);
                } else {
                    room.walls.push(index);
                }
            }
        }

        room.round = match stamps.iter().collect::<Vec<_>>().as_slice() {
            [only] => placements.get(**only).is_some_and(|footprint| footprint.round),
            _ => false,
        };
        if room.round {
            round_corners(grid, &room)?;
        }
        rooms.push(room);
    }

    log::trace!("merged {} stamps into {} rooms", placements.len(), rooms.len());
    grid.rooms = rooms;
    Ok(())
}

fn round_corners(grid: &mut Grid, room: &Room) -> Attempt<()> {
    for index in &room.walls {
        let pos = grid.position_of(*index);
        let Some(tile) = grid.cell(pos).map(|cell| cell.tile) else {
            continue;
        };
        if tile.info().is_outer_corner() {
            grid.set_tile(pos, catalog::round_for(tile)?);
        }
    }
    Ok(())
}

/// The outward directions of a room cell that are still closed.
pub fn closed_outward(tile: TileId) -> Dirs {
    let info = tile.info();
    info.room_wall_direction - info.connects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::rooms::{stamp, Quadrant, RoomShape};

    fn grid() -> Grid {
        let mut grid = Grid::new(20, 20, Position::new(10, 0), Direction::Up);
        grid.place_entrance().unwrap();
        grid
    }

    #[test]
    fn test_walk_closes_around_rectangle() {
        let mut member = Membership::new(10, 10);
        for pos in Footprint::rectangle(Position::new(1, 1), 3, 3).positions() {
            member.insert(pos);
        }
        let path = walk_outline(&member, Position::new(1, 1)).unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.first(), path.last());
        assert!(!path.contains(&Position::new(2, 2)));
    }

    #[test]
    fn test_walk_follows_inner_corner() {
        let mut footprint = Footprint::rectangle(Position::new(0, 0), 6, 6);
        footprint.shape = RoomShape::Irregular {
            cut: Quadrant::TopRight,
            reduce_x: 2,
            reduce_y: 2,
        };
        let mut member = Membership::new(10, 10);
        for pos in footprint.positions() {
            member.insert(pos);
        }
        let path = walk_outline(&member, Position::new(0, 0)).unwrap();
        assert!(path.contains(&Position::new(3, 3)));
        assert!(!path.contains(&Position::new(2, 2)));
    }

    #[test]
    fn test_walk_turns_at_dead_end_corner() {
        let mut member = Membership::new(5, 5);
        member.insert(Position::new(1, 1));
        member.insert(Position::new(1, 2));
        let path = walk_outline(&member, Position::new(1, 1)).unwrap();
        assert_eq!(
            path,
            vec![Position::new(1, 1), Position::new(1, 2), Position::new(1, 1)]
        );
    }

    #[test]
    fn test_walk_stuck_on_single_cell() {
        let mut member = Membership::new(5, 5);
        member.insert(Position::new(1, 1));
        let result = walk_outline(&member, Position::new(1, 1));
        assert_eq!(result, Err(GenerationInfeasible::MergeWalkStuck { x: 1, y: 1 }));
    }

    #[test]
    fn test_overlapping_stamps_merge_into_one_room() {
        let mut grid = grid();
        let a = Footprint::rectangle(Position::new(2, 6), 5, 5);
        let b = Footprint::rectangle(Position::new(5, 8), 5, 5);
        stamp(&mut grid, &a, 0).unwrap();
        stamp(&mut grid, &b, 1).unwrap();

        merge_rooms(&mut grid, &[a, b]).unwrap();
        assert_eq!(grid.rooms.len(), 1);

        let room = &grid.rooms[0];
        assert_eq!(room.origin, Position::new(2, 6));
        assert_eq!(room.len(), a.area() + b.area() - 6);
        assert!(!room.round);

        // The old walls inside the overlap became room space.
        assert!(grid.tile(Position::new(6, 9)).is_room_space());
        assert!(grid.tile(Position::new(5, 9)).is_room_space());
        assert!(grid.tile(Position::new(5, 10)).is_inner_corner());
        assert!(grid.tile(Position::new(6, 8)).is_inner_corner());
        assert_eq!(grid.tile(Position::new(7, 8)).room_wall_direction, Dirs::DOWN);
        for index in room.cells() {
            let cell = grid.cell_at(index).unwrap();
            assert!(cell.merged);
            assert_eq!(cell.room, Some(0));
        }
    }

    #[test]
    fn test_touching_stamps_stay_apart() {
        let mut grid = grid();
        let a = Footprint::rectangle(Position::new(2, 6), 4, 4);
        let b = Footprint::rectangle(Position::new(6, 6), 4, 4);
        stamp(&mut grid, &a, 0).unwrap();
        stamp(&mut grid, &b, 1).unwrap();

        merge_rooms(&mut grid, &[a, b]).unwrap();
        assert_eq!(grid.rooms.len(), 2);
        assert_eq!(grid.room_of(Position::new(5, 7)), Some(0));
        assert_eq!(grid.room_of(Position::new(6, 7)), Some(1));
    }

    #[test]
    fn test_round_room_gets_round_corners() {
        let mut grid = grid();
        let mut footprint = Footprint::rectangle(Position::new(3, 8), 5, 6);
        footprint.round = true;
        stamp(&mut grid, &footprint, 0).unwrap();

        merge_rooms(&mut grid, &[footprint]).unwrap();
        assert!(grid.rooms[0].round);
        for corner in [(3, 8), (7, 8), (3, 13), (7, 13)] {
            let tile = grid.tile(Position::new(corner.0, corner.1));
            assert!(tile.is_round_corner(), "{:?}", corner);
        }
        assert!(closed_outward(grid.cell(Position::new(5, 8)).unwrap().tile).has(Direction::Down));
    }
}
