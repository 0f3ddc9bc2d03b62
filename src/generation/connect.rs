//! # Room Connection
//!
//! Guarantees every room an exit and wires exits to whatever lies beyond them.
//!
//! Regular rooms open exits by swapping a wall or corner for the matching exit
//! archetype. Mines open exits by upgrading a perimeter corridor to a junction.
//! An exit facing a cell that cannot answer it is closed again, which may
//! leave a room without exits; the loop in [`connect`] then repeats.

use crate::generation::{catalog, Attempt, GenerationInfeasible, RoomKind, TileId};
use crate::world::{Direction, Dirs, Grid, Position};
use rand::seq::SliceRandom;
use rand::Rng;

/// Rounds of exit assertion and wiring before the attempt is abandoned.
pub const MAX_CONNECT_ROUNDS: usize = 8;

fn kind_of(grid: &Grid, pos: Position) -> Option<RoomKind> {
    grid.room_of(pos)
        .and_then(|room| grid.rooms.get(room))
        .map(|room| room.kind)
}

/// Outward sides of a cell that could carry an exit.
///
/// Walls and square corners face outward on their wall sides; mine cells face
/// outward wherever the neighbor is not part of the same mine.
pub fn outward_directions(grid: &Grid, pos: Position) -> Dirs {
    let Some(cell) = grid.cell(pos) else {
        return Dirs::empty();
    };
    let tile = cell.tile_type();
    match kind_of(grid, pos) {
        Some(RoomKind::Regular) if tile.is_room_type() => {
            if tile.is_inner_corner() || tile.is_round_corner() || tile.is_room_space() {
                Dirs::empty()
            } else {
                tile.room_wall_direction
            }
        }
        Some(RoomKind::Mine) => Direction::ALL
            .into_iter()
            .filter(|direction| grid.room_of(pos.step(*direction)) != cell.room)
            .fold(Dirs::empty(), |acc, direction| acc | direction.bit()),
        _ => Dirs::empty(),
    }
}

/// Whether the cell at `pos` can open an exit facing `toward`.
pub fn exit_compatible(grid: &Grid, pos: Position, toward: Direction) -> bool {
    outward_directions(grid, pos).has(toward)
}

/// The archetype of `pos` with `toward` opened.
fn opened(grid: &Grid, pos: Position, toward: Direction) -> Attempt<TileId> {
    let tile = grid.tile(pos);
    if tile.is_corridor() {
        catalog::corridor(tile.connects | toward.bit()).ok_or_else(|| GenerationInfeasible::UnknownConversion {
            conversion: "junction-upgrade",
            tile: tile.name.clone(),
        })
    } else {
        catalog::exit_for(tile.id, toward.bit())
    }
}

/// The archetype of `pos` with `toward` closed.
fn closed(grid: &Grid, pos: Position, toward: Direction) -> Attempt<TileId> {
    let tile = grid.tile(pos);
    if tile.is_corridor() {
        catalog::corridor(tile.connects - toward.bit()).ok_or_else(|| GenerationInfeasible::UnknownConversion {
            conversion: "junction-repair",
            tile: tile.name.clone(),
        })
    } else {
        catalog::with_exits(tile.id, tile.exit_directions() - toward.bit())
    }
}

/// Whether an exit towards `direction` could be answered by the neighbor.
fn exit_target_ok(grid: &Grid, pos: Position, direction: Direction) -> bool {
    let target = pos.step(direction);
    grid.is_empty_at(target) || exit_compatible(grid, target, direction.opposite())
}

/// Exits of a room: edges where a room cell connects to something outside the room.
pub fn room_exits(grid: &Grid, room: usize) -> Vec<(Position, Direction)> {
    let Some(entry) = grid.rooms.get(room) else {
        return Vec::new();
    };
    let mut exits = Vec::new();
    for index in entry.cells() {
        let pos = grid.position_of(index);
        for direction in grid.tile(pos).connects.directions() {
            let target = pos.step(direction);
            if grid.in_bounds(target) && grid.room_of(target) != Some(room) {
                exits.push((pos, direction));
            }
        }
    }
    exits
}

/// Opens one exit on a room that has none.
///
/// Candidates are cells with an outward side facing an empty or
/// exit-compatible position. Corners pick one axis, the other axis, or both,
/// each a third of the time, falling back to whatever is eligible.
///
/// Cells whose closed outward sides all face unusable neighbors are marked
/// `exit_impossible` and skipped from then on; neighbors only fill up before
/// growth, so such a cell never becomes eligible again.
pub fn assert_exit<R: Rng>(grid: &mut Grid, room: usize, rng: &mut R) -> Attempt<()> {
    let cells: Vec<usize> = grid
        .rooms
        .get(room)
        .map(|entry| entry.cells().collect())
        .unwrap_or_default();

    let mut candidates: Vec<(Position, Dirs)> = Vec::new();
    let mut hopeless = Vec::new();
    for index in &cells {
        if grid.cell_at(*index).is_some_and(|cell| cell.exit_impossible) {
            continue;
        }
        let pos = grid.position_of(*index);
        let closed_sides = outward_directions(grid, pos) - grid.tile(pos).connects;
        let eligible = closed_sides
            .directions()
            .filter(|direction| exit_target_ok(grid, pos, *direction))
            .fold(Dirs::empty(), |acc, direction| acc | direction.bit());
        if !eligible.is_empty() {
            candidates.push((pos, eligible));
        } else if !closed_sides.is_empty() {
            hopeless.push(*index);
        }
    }
    for index in hopeless {
        if let Some(cell) = grid.cell_at_mut(index) {
            cell.exit_impossible = true;
        }
    }

    let Some((pos, eligible)) = candidates.choose(rng).copied() else {
        for index in cells {
            if let Some(cell) = grid.cell_at_mut(index) {
                cell.exit_impossible = true;
            }
        }
        return Err(GenerationInfeasible::RoomUnconnectable { room });
    };

    let sides: Vec<Direction> = eligible.directions().collect();
    let chosen = match sides.as_slice() {
        [first, second] => match rng.gen_range(0..3) {
            0 => vec![*first],
            1 => vec![*second],
            _ => vec![*first, *second],
        },
        _ => sides.choose(rng).copied().into_iter().collect(),
    };

    for direction in chosen {
        let tile = opened(grid, pos, direction)?;
        grid.set_tile(pos, tile);
    }
    log::trace!("room {} opened an exit at {}", room, pos);
    Ok(())
}

/// Wires one exit edge. Returns whether anything changed.
fn wire(grid: &mut Grid, pos: Position, direction: Direction) -> Attempt<bool> {
    let target = pos.step(direction);
    if !grid.in_bounds(target) {
        let tile = closed(grid, pos, direction)?;
        grid.set_tile(pos, tile);
        return Ok(true);
    }
    if grid.is_empty_at(target) || grid.tile(target).connects_in(direction.opposite()) {
        return Ok(false);
    }
    let tile_pos = if exit_compatible(grid, target, direction.opposite()) {
        let tile = opened(grid, target, direction.opposite())?;
        (target, tile)
    } else {
        let tile = closed(grid, pos, direction)?;
        (pos, tile)
    };
    grid.set_tile(tile_pos.0, tile_pos.1);
    Ok(true)
}

/// Wires every exit of every regular room to its outward neighbor.
pub fn connect_rooms(grid: &mut Grid) -> Attempt<bool> {
    wire_kind(grid, RoomKind::Regular)
}

/// Repairs mine junctions whose outward connection is not answered.
pub fn repair_junctions(grid: &mut Grid) -> Attempt<bool> {
    wire_kind(grid, RoomKind::Mine)
}

fn wire_kind(grid: &mut Grid, kind: RoomKind) -> Attempt<bool> {
    let mut changed = false;
    for room in 0..grid.rooms.len() {
        if grid.rooms[room].kind != kind {
            continue;
        }
        for (pos, direction) in room_exits(grid, room) {
            if grid.tile(pos).connects_in(direction) {
                changed |= wire(grid, pos, direction)?;
            }
        }
    }
    Ok(changed)
}

/// Repeats exit assertion, wiring and junction repair until every room has an
/// answered exit.
pub fn connect<R: Rng>(grid: &mut Grid, rng: &mut R) -> Attempt<()> {
    for round in 0..MAX_CONNECT_ROUNDS {
        let mut changed = false;
        for room in 0..grid.rooms.len() {
            if room_exits(grid, room).is_empty() {
                assert_exit(grid, room, rng)?;
                changed = true;
            }
        }
        changed |= connect_rooms(grid)?;
        changed |= repair_junctions(grid)?;

        let settled = (0..grid.rooms.len()).all(|room| !room_exits(grid, room).is_empty());
        if settled && !changed {
            log::trace!("room exits settled after {} rounds", round + 1);
            return Ok(());
        }
    }
    Err(GenerationInfeasible::ExitsUnresolved)
}

/// Remaps up to `count` regular, square-cornered rooms to plain corridors.
///
/// At least one regular room always survives. Returns the number converted.
pub fn convert_catacombs<R: Rng>(grid: &mut Grid, count: u32, rng: &mut R) -> Attempt<usize> {
    let regular: Vec<usize> = grid
        .rooms
        .iter()
        .filter(|room| room.kind == RoomKind::Regular)
        .map(|room| room.id)
        .collect();
    let mut eligible: Vec<usize> = regular
        .iter()
        .copied()
        .filter(|room| !grid.rooms[*room].round)
        .collect();
    let wanted = (count as usize).min(regular.len().saturating_sub(1));
    eligible.shuffle(rng);
    eligible.truncate(wanted);
    eligible.sort_unstable();

    for room in &eligible {
        let cells: Vec<usize> = grid.rooms[*room].cells().collect();
        for index in cells {
            let pos = grid.position_of(index);
            let Some(tile) = grid.cell(pos).map(|cell| cell.tile) else {
                continue;
            };
            grid.set_tile(pos, catalog::corridor_equivalent(tile)?);
            if let Some(cell) = grid.cell_mut(pos) {
                cell.is_catacombs = true;
            }
        }
        grid.rooms[*room].kind = RoomKind::Catacombs;
    }
    Ok(eligible.len())
}
