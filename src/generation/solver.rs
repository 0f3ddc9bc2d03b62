//! # Solver
//!
//! Depth-first reachability from the entrance.
//!
//! The walk stamps every reached cell with a strictly increasing sequence and
//! marks it visited. Dead ends are judged for the down stairs in post-order,
//! so a later, farther dead end can replace an earlier pick.

use crate::generation::{catalog, Attempt, GenerationInfeasible};
use crate::world::{Direction, Grid, Position};
use rand::Rng;

/// Running choice of the down-stairs cell.
#[derive(Debug, Clone, Copy, Default)]
struct StairsPick {
    best: Option<(Position, f64)>,
}

impl StairsPick {
    /// Considers a dead end at `pos` whose only connection is `connection`.
    fn consider<R: Rng>(&mut self, grid: &Grid, pos: Position, connection: Direction, rng: &mut R) {
        if grid.coords(pos).at_edge(connection.opposite()) {
            return;
        }
        let distance = pos.euclidean_distance(grid.start);
        let max_distance = ((grid.width() - 1) as f64).hypot((grid.height() - 1) as f64);
        let accept = match self.best {
            None => true,
            Some((_, best)) if distance >= best => {
                let chance = if max_distance > 0.0 {
                    (distance * 100.0 / max_distance).round() as u32
                } else {
                    100
                };
                rng.gen_range(0..100) < chance
            }
            Some(_) => false,
        };
        if accept {
            self.best = Some((pos, distance));
        }
    }
}

/// Walks the grid from the entrance and picks the down-stairs cell.
///
/// Fails when any cell is left unreached or no dead end qualifies.
pub fn solve<R: Rng>(grid: &mut Grid, rng: &mut R) -> Attempt<Position> {
    for cell in grid.cells_mut() {
        cell.visited = false;
        cell.sequence = None;
    }

    let start = grid.start;
    let mut sequence = 0;
    let mut pick = StairsPick::default();
    let mut stack: Vec<(Position, usize)> = Vec::new();

    if let Some(cell) = grid.cell_mut(start) {
        cell.visited = true;
        cell.sequence = Some(sequence);
        stack.push((start, 0));
    }

    while let Some((pos, next)) = stack.last().copied() {
        if let Some(direction) = Direction::ALL.get(next).copied() {
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            if !grid.can_traverse(pos, direction) {
                continue;
            }
            let target = pos.step(direction);
            if let Some(cell) = grid.cell_mut(target) {
                if !cell.visited {
                    sequence += 1;
                    cell.visited = true;
                    cell.sequence = Some(sequence);
                    stack.push((target, 0));
                }
            }
            continue;
        }

        stack.pop();
        let tile = grid.tile(pos);
        if tile.is_dead_end() {
            if let Some(connection) = tile.connects.directions().next() {
                pick.consider(grid, pos, connection, rng);
            }
        }
    }

    let unvisited = grid.cells().filter(|cell| !cell.visited).count() + grid.empty_positions().len();
    if unvisited > 0 {
        return Err(GenerationInfeasible::Disconnected { unvisited });
    }
    pick.best
        .map(|(pos, _)| pos)
        .ok_or(GenerationInfeasible::NoStairsCandidate)
}

/// Turns the dead end at `pos` into the down stairs.
pub fn place_stairs(grid: &mut Grid, pos: Position) -> Attempt<()> {
    let tile = catalog::stairs_for(grid.tile(pos).id)?;
    grid.set_tile(pos, tile);
    grid.stairs = Some(pos);
    Ok(())
}
