//! # Corridor Growth
//!
//! Fills the grid by attaching new cells to open connections of filled ones.
//!
//! Each pass visits filled cells in index order and attaches one weighted
//! corridor draw at a random open side. Passes repeat until nothing changes.
//! A stalled, incomplete grid is nudged by force growth, which swaps one
//! placed cell for a substitute that opens towards an empty neighbor.

use crate::generation::{catalog, Attempt, GenerationInfeasible, TileId};
use crate::world::{Direction, Grid, Position};
use rand::seq::SliceRandom;
use rand::Rng;

/// Fills `target` with the first weighted draw that fits there.
fn attach<R: Rng>(grid: &mut Grid, target: Position, rng: &mut R) -> bool {
    let mut pool = catalog::growth_types(&grid.coords(target));
    while let Some(tile) = catalog::draw_weighted(&mut pool, rng) {
        if grid.fits(target, tile) {
            grid.set_tile(target, tile);
            return true;
        }
    }
    false
}

/// One growth pass. Returns whether any cell was attached.
pub fn grow_pass<R: Rng>(grid: &mut Grid, rng: &mut R) -> bool {
    let mut changed = false;
    for index in 0..grid.len() {
        let Some(cell) = grid.cell_at(index) else {
            continue;
        };
        if cell.attach_blocked || cell.available_connections == 0 {
            continue;
        }
        let pos = grid.position_of(index);
        let mut open = grid.open_connections(pos);
        open.shuffle(rng);

        let attached = open
            .into_iter()
            .any(|direction| attach(grid, pos.step(direction), rng));
        if attached {
            changed = true;
        } else if let Some(cell) = grid.cell_at_mut(index) {
            cell.attach_blocked = true;
        }
    }
    changed
}

/// Swaps one filled cell for a substitute that opens towards an empty neighbor.
///
/// Returns whether a swap happened.
pub fn force_growth<R: Rng>(grid: &mut Grid, rng: &mut R) -> bool {
    let mut candidates: Vec<Position> = grid
        .cells()
        .filter(|cell| cell.tile_type().force_growth_compatible())
        .map(|cell| cell.position())
        .filter(|pos| {
            Direction::ALL
                .into_iter()
                .any(|direction| grid.is_empty_at(pos.step(direction)))
        })
        .collect();
    candidates.shuffle(rng);

    for pos in candidates {
        let current = grid.tile(pos).id;
        let mut substitutes: Vec<TileId> = catalog::substitutes(current)
            .into_iter()
            .filter(|tile| grid.fits(pos, *tile))
            .filter(|tile| {
                tile.info()
                    .connects
                    .directions()
                    .any(|direction| grid.is_empty_at(pos.step(direction)))
            })
            .collect();
        substitutes.shuffle(rng);
        if let Some(tile) = substitutes.first().copied() {
            log::trace!("force growth swapped {} at {} for {}", current.info().name, pos, tile.info().name);
            grid.set_tile(pos, tile);
            for cell in grid.cells_mut() {
                cell.attach_blocked = false;
            }
            return true;
        }
    }
    false
}

/// Grows until the grid is full.
///
/// Fails with [`GenerationInfeasible::GrowthExhausted`] when neither a growth
/// pass nor force growth makes progress.
pub fn grow<R: Rng>(grid: &mut Grid, rng: &mut R) -> Attempt<()> {
    let limit = grid.len() * 4;
    for _ in 0..limit {
        while grow_pass(grid, rng) {}
        if grid.is_full() {
            return Ok(());
        }
        if !force_growth(grid, rng) {
            break;
        }
    }
    Err(GenerationInfeasible::GrowthExhausted {
        percent_filled: grid.percent_filled() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Dirs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(width: u32, height: u32) -> Grid {
        let mut grid = Grid::new(width, height, Position::new(width as i32 / 2, 0), Direction::Up);
        grid.place_entrance().unwrap();
        grid
    }

    #[test]
    fn test_pass_attaches_to_entrance() {
        let mut grid = grid(7, 7);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(grow_pass(&mut grid, &mut rng));

        let above = Position::new(3, 1);
        assert!(!grid.is_empty_at(above));
        assert!(grid.tile(above).connects_in(Direction::Down));
        assert_eq!(grid.cell(Position::new(3, 0)).unwrap().available_connections, 0);
    }

    #[test]
    fn test_grow_fills_grid() {
        let mut filled = 0;
        for seed in 0..10 {
            let mut grid = grid(9, 9);
            let mut rng = StdRng::seed_from_u64(seed);
            if grow(&mut grid, &mut rng).is_ok() {
                filled += 1;
                assert!(grid.is_full());
                for cell in grid.cells() {
                    assert!(grid.fits(cell.position(), cell.tile));
                    assert_eq!(cell.available_connections, 0);
                }
            }
        }
        assert!(filled > 0);
    }

    #[test]
    fn test_force_growth_opens_towards_empty() {
        let mut grid = grid(5, 5);
        // A dead end pointing down at the entrance, with nothing open elsewhere.
        let dead_end = catalog::corridor(Dirs::DOWN).unwrap();
        grid.set_tile(Position::new(2, 1), dead_end);
        assert!(!grow_pass(&mut grid, &mut StdRng::seed_from_u64(0)));

        let mut rng = StdRng::seed_from_u64(2);
        assert!(force_growth(&mut grid, &mut rng));
        let swapped = grid.tile(Position::new(2, 1));
        assert!(swapped.connects_in(Direction::Down));
        assert!(swapped.connects.count() > 1);
        assert!(grid.cell(Position::new(2, 1)).unwrap().available_connections > 0);
    }

    #[test]
    fn test_grow_fails_without_substitutes() {
        // Two entrances facing off the grid leave a gap nothing can attach to.
        let mut grid = Grid::new(3, 1, Position::new(0, 0), Direction::Up);
        let entrance = catalog::entrance(Direction::Up).unwrap();
        grid.set_tile(Position::new(0, 0), entrance);
        grid.set_tile(Position::new(2, 0), entrance);

        let mut rng = StdRng::seed_from_u64(0);
        let result = grow(&mut grid, &mut rng);
        assert_eq!(result, Err(GenerationInfeasible::GrowthExhausted { percent_filled: 66 }));
        assert!(grid.is_empty_at(Position::new(1, 0)));
    }

    #[test]
    fn test_force_growth_without_candidates() {
        // The entrance alone is not substitutable.
        let mut grid = grid(5, 5);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!force_growth(&mut grid, &mut rng));
    }
}
