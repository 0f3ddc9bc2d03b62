//! # Doors and Keys
//!
//! Door species, locks and key placement.
//!
//! Doors go on connecting edges of corridors and room exits. Mines, catacombs
//! and the area around the entrance stay door-free, and a cell next to a doored
//! cell never gets doors of its own. Every locked door later receives a key on
//! a cell the solver reached earlier.

use crate::generation::{Attempt, GenerationConfig, GenerationInfeasible, RoomKind};
use crate::utils::{percent, roll_percentile};
use crate::world::{Direction, Door, DoorType, Grid, Position};
use rand::seq::SliceRandom;
use rand::Rng;

/// Percentile rolls at or above this give a portcullis.
pub const PORTCULLIS_ROLL: u32 = 60;

/// Percentile rolls at or above this give a secret door.
pub const SECRET_ROLL: u32 = 75;

/// Door species for a percentile roll.
pub fn door_type_for(roll: u32) -> DoorType {
    match roll {
        roll if roll >= SECRET_ROLL => DoorType::Secret,
        roll if roll >= PORTCULLIS_ROLL => DoorType::Portcullis,
        _ => DoorType::Regular,
    }
}

fn roll_door<R: Rng>(direction: Direction, config: &GenerationConfig, rng: &mut R) -> Door {
    let mut door = Door::new(direction, door_type_for(roll_percentile(rng)));
    if door.door_type != DoorType::Secret {
        door.locked = percent(config.lock_chance, rng);
        if !door.locked {
            door.open = percent(config.open_chance, rng);
        }
    }
    door
}

/// Whether a cell at `pos` may carry doors.
fn door_eligible(grid: &Grid, pos: Position, margin: u32) -> bool {
    let Some(cell) = grid.cell(pos) else {
        return false;
    };
    let tile = cell.tile_type();
    if tile.is_entrance() || tile.is_stairs_down() || cell.is_catacombs {
        return false;
    }
    let in_mine_or_catacombs = cell
        .room
        .and_then(|room| grid.rooms.get(room))
        .is_some_and(|room| room.kind != RoomKind::Regular);
    if in_mine_or_catacombs || pos.chebyshev_distance(grid.start) <= margin {
        return false;
    }
    let suppressed = pos
        .cardinal_neighbors()
        .iter()
        .any(|(_, other)| grid.cell(*other).is_some_and(|cell| cell.has_doors()));
    !suppressed
}

/// Edges of the cell at `pos` that could hold a door.
fn door_directions(grid: &Grid, pos: Position) -> Vec<Direction> {
    let tile = grid.tile(pos);
    let sides = if tile.is_room_type() {
        tile.exit_directions()
    } else if tile.is_corridor() {
        tile.connects
    } else {
        return Vec::new();
    };
    sides
        .directions()
        .filter(|direction| grid.tile(pos.step(*direction)).connects_in(direction.opposite()))
        .collect()
}

/// Rolls doors on every eligible cell. Returns the number of doors placed.
///
/// Locked cells are recorded in [`Grid::locked_doors`].
pub fn place_doors<R: Rng>(grid: &mut Grid, config: &GenerationConfig, rng: &mut R) -> Attempt<usize> {
    let mut placed = 0;
    grid.locked_doors.clear();

    for index in 0..grid.len() {
        let pos = grid.position_of(index);
        if !door_eligible(grid, pos, config.start_margin) {
            continue;
        }
        let probability = grid.tile(pos).door_probability;
        let mut doors = Vec::new();
        for direction in door_directions(grid, pos) {
            if percent(probability, rng) {
                doors.push(roll_door(direction, config, rng));
            }
        }
        if doors.is_empty() {
            continue;
        }

        placed += doors.len();
        let locked = doors.iter().any(|door| door.locked);
        if let Some(cell) = grid.cell_at_mut(index) {
            cell.doors = doors;
        }
        if locked {
            grid.locked_doors.push(pos);
        }
    }

    log::trace!("placed {} doors, {} cells locked", placed, grid.locked_doors.len());
    Ok(placed)
}

/// Places one key per locked cell on an earlier, door-free cell.
///
/// Locked cells are handled in solve order so every key precedes its door.
pub fn place_keys<R: Rng>(grid: &mut Grid, rng: &mut R) -> Attempt<usize> {
    let mut locked: Vec<(u32, Position)> = Vec::new();
    for pos in &grid.locked_doors {
        let sequence = grid
            .cell(*pos)
            .and_then(|cell| cell.sequence)
            .ok_or(GenerationInfeasible::NoKeyCandidate { x: pos.x, y: pos.y })?;
        locked.push((sequence, *pos));
    }
    locked.sort_unstable();

    for (sequence, door) in &locked {
        let candidates: Vec<usize> = (0..grid.len())
            .filter(|index| {
                grid.cell_at(*index).is_some_and(|cell| {
                    let tile = cell.tile_type();
                    cell.sequence.is_some_and(|key| key < *sequence)
                        && !cell.has_doors()
                        && !cell.has_key
                        && !tile.is_entrance()
                        && !tile.is_stairs_down()
                })
            })
            .collect();
        let index = candidates
            .choose(rng)
            .copied()
            .ok_or(GenerationInfeasible::NoKeyCandidate { x: door.x, y: door.y })?;
        if let Some(cell) = grid.cell_at_mut(index) {
            cell.has_key = true;
        }
    }
    Ok(locked.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::catalog;
    use crate::world::Dirs;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A vertical corridor from the entrance to the top edge.
    fn spine(height: u32) -> Grid {
        let mut grid = Grid::new(3, height, Position::new(1, 0), Direction::Up);
        grid.place_entrance().unwrap();
        let straight = catalog::corridor(Dirs::UP | Dirs::DOWN).unwrap();
        for y in 1..height as i32 - 1 {
            grid.set_tile(Position::new(1, y), straight);
        }
        grid.set_tile(Position::new(1, height as i32 - 1), catalog::corridor(Dirs::DOWN).unwrap());
        grid
    }

    fn number(grid: &mut Grid) {
        for y in 0..grid.height() as i32 {
            if let Some(cell) = grid.cell_mut(Position::new(1, y)) {
                cell.sequence = Some(y as u32);
                cell.visited = true;
            }
        }
    }

    #[test]
    fn test_door_species_bands() {
        assert_eq!(door_type_for(0), DoorType::Regular);
        assert_eq!(door_type_for(59), DoorType::Regular);
        assert_eq!(door_type_for(60), DoorType::Portcullis);
        assert_eq!(door_type_for(74), DoorType::Portcullis);
        assert_eq!(door_type_for(75), DoorType::Secret);
        assert_eq!(door_type_for(99), DoorType::Secret);
    }

    #[test]
    fn test_doors_respect_margin_and_suppression() {
        let mut config = GenerationConfig::for_testing(1);
        config.start_margin = 2;
        for seed in 0..20 {
            let mut grid = spine(12);
            let mut rng = StdRng::seed_from_u64(seed);
            place_doors(&mut grid, &config, &mut rng).unwrap();

            for y in 0..=2 {
                assert!(!grid.cell(Position::new(1, y)).unwrap().has_doors());
            }
            for y in 3..11 {
                let here = grid.cell(Position::new(1, y)).unwrap().has_doors();
                let above = grid.cell(Position::new(1, y + 1)).unwrap().has_doors();
                assert!(!(here && above), "adjacent doors at y={}", y);
            }
        }
    }

    #[test]
    fn test_locked_doors_recorded() {
        let mut grid = spine(12);
        let mut config = GenerationConfig::for_testing(1);
        config.start_margin = 0;
        config.lock_chance = 100;
        // Every roll comes back as zero: every door is placed, regular and locked.
        let mut rng = StepRng::new(0, 0);
        let placed = place_doors(&mut grid, &config, &mut rng).unwrap();
        assert!(placed > 0);
        assert!(!grid.locked_doors.is_empty());
        for pos in &grid.locked_doors {
            let cell = grid.cell(*pos).unwrap();
            assert!(cell.doors.iter().all(|door| door.door_type == DoorType::Regular && door.locked));
            assert!(!cell.doors.iter().any(|door| door.open));
        }
    }

    #[test]
    fn test_keys_precede_their_doors() {
        let mut grid = spine(12);
        number(&mut grid);
        let door_pos = Position::new(1, 8);
        let mut door = Door::new(Direction::Up, DoorType::Regular);
        door.locked = true;
        grid.cell_mut(door_pos).unwrap().doors.push(door);
        grid.locked_doors.push(door_pos);

        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(place_keys(&mut grid, &mut rng).unwrap(), 1);
        let key = grid.cells().find(|cell| cell.has_key).unwrap();
        assert!(key.sequence.unwrap() < 8);
        assert!(key.sequence.unwrap() > 0);
    }

    #[test]
    fn test_key_without_earlier_cell_fails() {
        let mut grid = spine(6);
        number(&mut grid);
        let door_pos = Position::new(1, 1);
        grid.locked_doors.push(door_pos);

        let mut rng = StdRng::seed_from_u64(2);
        let result = place_keys(&mut grid, &mut rng);
        assert_eq!(result, Err(GenerationInfeasible::NoKeyCandidate { x: 1, y: 1 }));
    }
}
