//! # Description Diffusion
//!
//! Environmental themes spread outward from the entrance.
//!
//! Every unit (a walled room or mine as a whole, otherwise a single cell)
//! inherits the strongest theme among its linked neighbors at a reduced
//! weight, or with the complementary chance draws a fresh theme at full
//! weight. Flooded themes then grow across same-theme neighbors, and flooded
//! regions of a single cell dry out again.

use crate::generation::{Attempt, GenerationInfeasible, RoomKind};
use crate::utils::{percent, weighted_pick};
use crate::world::{Direction, Grid, Position};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Weight given to a freshly drawn theme and to the entrance seed.
pub const FULL_WEIGHT: u32 = 100;

/// Smallest flooded region that survives flood completion.
pub const MIN_FLOOD_SIZE: usize = 2;

/// An environmental theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Description {
    /// Not decided yet; never present in a finished level
    #[default]
    Undecided,
    Constructed,
    ConstructedFlooded,
    Cavern,
    CavernFlooded,
    Mines,
    MinesFlooded,
}

impl Description {
    /// Every theme a fresh draw can produce.
    pub const THEMES: [Description; 6] = [
        Description::Constructed,
        Description::ConstructedFlooded,
        Description::Cavern,
        Description::CavernFlooded,
        Description::Mines,
        Description::MinesFlooded,
    ];

    /// Bias of this theme in a fresh draw.
    pub fn weight(self) -> u32 {
        match self {
            Description::Undecided => 0,
            Description::Constructed => 50,
            Description::Cavern => 30,
            Description::Mines => 15,
            Description::ConstructedFlooded | Description::CavernFlooded => 4,
            Description::MinesFlooded => 3,
        }
    }

    /// Weight lost each time the theme is inherited.
    pub fn weight_reduction(self) -> u32 {
        match self {
            Description::Undecided => 0,
            Description::Constructed => 10,
            Description::Cavern => 15,
            Description::Mines => 20,
            Description::ConstructedFlooded | Description::CavernFlooded | Description::MinesFlooded => 25,
        }
    }

    pub fn is_undecided(self) -> bool {
        self == Description::Undecided
    }

    pub fn is_flooded(self) -> bool {
        matches!(
            self,
            Description::ConstructedFlooded | Description::CavernFlooded | Description::MinesFlooded
        )
    }

    /// The flooded variant of this theme.
    pub fn flooded(self) -> Description {
        match self {
            Description::Constructed => Description::ConstructedFlooded,
            Description::Cavern => Description::CavernFlooded,
            Description::Mines => Description::MinesFlooded,
            other => other,
        }
    }

    /// The dry variant of this theme.
    pub fn unflooded(self) -> Description {
        match self {
            Description::ConstructedFlooded => Description::Constructed,
            Description::CavernFlooded => Description::Cavern,
            Description::MinesFlooded => Description::Mines,
            other => other,
        }
    }

    /// Glyph used by the description view; flooded themes are upper case.
    pub fn glyph(self) -> char {
        match self {
            Description::Undecided => '?',
            Description::Constructed => 'c',
            Description::ConstructedFlooded => 'C',
            Description::Cavern => 'v',
            Description::CavernFlooded => 'V',
            Description::Mines => 'm',
            Description::MinesFlooded => 'M',
        }
    }
}

impl std::fmt::Display for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Description::Undecided => "undecided",
            Description::Constructed => "constructed",
            Description::ConstructedFlooded => "constructed (flooded)",
            Description::Cavern => "cavern",
            Description::CavernFlooded => "cavern (flooded)",
            Description::Mines => "mines",
            Description::MinesFlooded => "mines (flooded)",
        };
        f.write_str(name)
    }
}

/// Draws a fresh theme, never `exclude`, and flooded only when `allow_flooded`.
pub fn draw_theme<R: Rng>(exclude: Option<Description>, allow_flooded: bool, rng: &mut R) -> Description {
    let candidates: Vec<Description> = Description::THEMES
        .into_iter()
        .filter(|theme| Some(*theme) != exclude)
        .filter(|theme| allow_flooded || !theme.is_flooded())
        .collect();
    let weights: Vec<u32> = candidates.iter().map(|theme| theme.weight()).collect();
    weighted_pick(&weights, rng)
        .map(|index| candidates[index])
        .unwrap_or(Description::Constructed)
}

/// Cells resolved together.
struct Unit {
    cells: Vec<Position>,
    room: Option<usize>,
}

fn units(grid: &Grid) -> Vec<Unit> {
    let mut units: Vec<Unit> = Vec::new();
    let mut room_unit: Vec<Option<usize>> = vec![None; grid.rooms.len()];

    for cell in grid.cells() {
        let pos = cell.position();
        let atomic_room = cell
            .room
            .filter(|room| grid.rooms.get(*room).is_some_and(|r| r.kind != RoomKind::Catacombs));
        match atomic_room {
            Some(room) => match room_unit[room] {
                Some(unit) => units[unit].cells.push(pos),
                None => {
                    room_unit[room] = Some(units.len());
                    units.push(Unit {
                        cells: vec![pos],
                        room: Some(room),
                    });
                }
            },
            None => units.push(Unit {
                cells: vec![pos],
                room: None,
            }),
        }
    }
    units
}

fn is_resolved(grid: &Grid, unit: &Unit) -> bool {
    unit.cells
        .iter()
        .all(|pos| grid.cell(*pos).is_some_and(|cell| !cell.description.is_undecided()))
}

/// Strongest resolved theme linked to the unit from outside; ties break at random.
fn strongest_neighbor<R: Rng>(grid: &Grid, unit: &Unit, rng: &mut R) -> Option<(Description, u32)> {
    let mut best: Vec<(Description, u32)> = Vec::new();
    for pos in &unit.cells {
        for direction in Direction::ALL {
            if !grid.linked(*pos, direction) {
                continue;
            }
            let other = pos.step(direction);
            if unit.room.is_some() && grid.room_of(other) == unit.room {
                continue;
            }
            let Some(cell) = grid.cell(other) else {
                continue;
            };
            if cell.description.is_undecided() {
                continue;
            }
            let candidate = (cell.description, cell.description_weight);
            match best.first().map(|(_, weight)| *weight) {
                Some(weight) if candidate.1 < weight => {}
                Some(weight) if candidate.1 == weight => best.push(candidate),
                _ => best = vec![candidate],
            }
        }
    }
    best.choose(rng).copied()
}

fn assign(grid: &mut Grid, unit: &Unit, description: Description, weight: u32) {
    for pos in &unit.cells {
        if let Some(cell) = grid.cell_mut(*pos) {
            cell.description = description;
            cell.description_weight = weight;
        }
    }
    if let Some(room) = unit.room.and_then(|room| grid.rooms.get_mut(room)) {
        room.description = description;
    }
}

/// Resolves one unit. Returns whether it was resolved.
fn resolve<R: Rng>(grid: &mut Grid, unit: &Unit, forced: bool, rng: &mut R) -> bool {
    let tiles: Vec<_> = unit.cells.iter().map(|pos| grid.tile(*pos)).collect();
    let incompatible = tiles
        .iter()
        .any(|tile| tile.is_flooding_incompatible() || tile.is_entrance());
    let allow_flooded = !incompatible && tiles.iter().any(|tile| tile.is_flooding_transition());

    let (description, weight) = match strongest_neighbor(grid, unit, rng) {
        Some((inherited, weight)) => {
            if percent(FULL_WEIGHT.saturating_sub(weight), rng) {
                (draw_theme(Some(inherited), allow_flooded, rng), FULL_WEIGHT)
            } else {
                let description = if incompatible { inherited.unflooded() } else { inherited };
                (description, weight.saturating_sub(inherited.weight_reduction()))
            }
        }
        None if forced => (draw_theme(None, allow_flooded, rng), FULL_WEIGHT),
        None => return false,
    };

    assign(grid, unit, description, weight);
    true
}

/// Resolves a theme for every cell, then completes floods.
pub fn diffuse<R: Rng>(grid: &mut Grid, rng: &mut R) -> Attempt<()> {
    for cell in grid.cells_mut() {
        cell.description = Description::Undecided;
        cell.description_weight = 0;
    }
    for room in &mut grid.rooms {
        room.description = Description::Undecided;
    }
    let start = grid.start;
    if let Some(entrance) = grid.cell_mut(start) {
        entrance.description = Description::Constructed;
        entrance.description_weight = FULL_WEIGHT;
    }

    let units = units(grid);
    let mut forced = false;
    for pass in 0..=units.len() {
        let mut progress = false;
        for unit in &units {
            if !is_resolved(grid, unit) && resolve(grid, unit, forced, rng) {
                progress = true;
            }
        }
        if units.iter().all(|unit| is_resolved(grid, unit)) {
            log::trace!("themes settled after {} passes", pass + 1);
            break;
        }
        forced = !progress;
    }

    complete_floods(grid)
}

fn flood_blocked(grid: &Grid, pos: Position) -> bool {
    let tile = grid.tile(pos);
    tile.is_flooding_incompatible() || tile.is_entrance()
}

/// Positions flooded together with `pos`: its whole room for rooms and mines.
fn flood_targets(grid: &Grid, pos: Position) -> Vec<Position> {
    match grid.room_of(pos).and_then(|room| grid.rooms.get(room)) {
        Some(room) if room.kind != RoomKind::Catacombs => {
            room.cells().map(|index| grid.position_of(index)).collect()
        }
        _ => vec![pos],
    }
}

/// Spreads flooded themes across linked cells of the same dry theme, then
/// dries out flooded regions smaller than [`MIN_FLOOD_SIZE`].
pub fn complete_floods(grid: &mut Grid) -> Attempt<()> {
    let mut queue: VecDeque<Position> = VecDeque::new();
    for cell in grid.cells() {
        if cell.description.is_flooded() {
            let pos = cell.position();
            if flood_blocked(grid, pos) {
                return Err(GenerationInfeasible::FloodIncompatible { x: pos.x, y: pos.y });
            }
            queue.push_back(pos);
        }
    }

    while let Some(pos) = queue.pop_front() {
        let Some(flood) = grid.cell(pos).map(|cell| cell.description) else {
            continue;
        };
        for direction in Direction::ALL {
            if !grid.linked(pos, direction) {
                continue;
            }
            let other = pos.step(direction);
            let same_dry_theme = grid
                .cell(other)
                .is_some_and(|cell| cell.description == flood.unflooded());
            if !same_dry_theme {
                continue;
            }
            let targets = flood_targets(grid, other);
            if let Some(blocked) = targets.iter().find(|target| flood_blocked(grid, **target)) {
                return Err(GenerationInfeasible::FloodIncompatible {
                    x: blocked.x,
                    y: blocked.y,
                });
            }
            for target in targets {
                if let Some(cell) = grid.cell_mut(target) {
                    cell.description = flood;
                }
                queue.push_back(target);
            }
            if let Some(room) = grid.room_of(other).and_then(|room| grid.rooms.get_mut(room)) {
                if room.kind != RoomKind::Catacombs {
                    room.description = flood;
                }
            }
        }
    }

    let mut seen = vec![false; grid.len()];
    for index in 0..grid.len() {
        let flooded = grid
            .cell_at(index)
            .is_some_and(|cell| cell.description.is_flooded());
        if seen[index] || !flooded {
            continue;
        }
        let region = flooded_region(grid, grid.position_of(index), &mut seen);
        if region.len() < MIN_FLOOD_SIZE {
            for pos in region {
                if let Some(cell) = grid.cell_mut(pos) {
                    cell.description = cell.description.unflooded();
                }
            }
        }
    }

    Ok(())
}

fn flooded_region(grid: &Grid, start: Position, seen: &mut [bool]) -> Vec<Position> {
    let Some(flood) = grid.cell(start).map(|cell| cell.description) else {
        return Vec::new();
    };
    let mut region = Vec::new();
    let mut stack = vec![start];
    if let Some(index) = grid.index(start) {
        seen[index] = true;
    }

    while let Some(pos) = stack.pop() {
        region.push(pos);
        for direction in Direction::ALL {
            if !grid.linked(pos, direction) {
                continue;
            }
            let other = pos.step(direction);
            let Some(index) = grid.index(other) else {
                continue;
            };
            let same = grid.cell(other).is_some_and(|cell| cell.description == flood);
            if same && !seen[index] {
                seen[index] = true;
                stack.push(other);
            }
        }
    }
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::catalog;
    use crate::world::Dirs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Entrance at (0,0) facing Up, then a vertical corridor ending in a dead end at (0,3).
    fn corridor_grid() -> Grid {
        let mut grid = Grid::new(1, 4, Position::new(0, 0), Direction::Up);
        grid.place_entrance().unwrap();
        let vertical = catalog::corridor(Dirs::UP | Dirs::DOWN).unwrap();
        grid.set_tile(Position::new(0, 1), vertical);
        grid.set_tile(Position::new(0, 2), vertical);
        grid.set_tile(Position::new(0, 3), catalog::corridor(Dirs::DOWN).unwrap());
        grid
    }

    #[test]
    fn test_variant_mapping() {
        for theme in Description::THEMES {
            assert_eq!(theme.flooded().unflooded(), theme.unflooded());
            assert!(theme.flooded().is_flooded());
            assert!(!theme.unflooded().is_flooded());
            assert!(theme.weight() > 0);
        }
        assert_eq!(Description::default(), Description::Undecided);
    }

    #[test]
    fn test_draw_theme_exclusions() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..500 {
            let theme = draw_theme(Some(Description::Constructed), false, &mut rng);
            assert_ne!(theme, Description::Constructed);
            assert!(!theme.is_flooded());
        }
    }

    #[test]
    fn test_diffuse_resolves_every_cell() {
        let mut resolved = 0;
        for seed in 0..50 {
            let mut grid = corridor_grid();
            let mut rng = StdRng::seed_from_u64(seed);
            match diffuse(&mut grid, &mut rng) {
                Ok(()) => {
                    resolved += 1;
                    assert!(grid.cells().all(|cell| !cell.description.is_undecided()));
                    let entrance = grid.cell(Position::new(0, 0)).unwrap();
                    assert_eq!(entrance.description, Description::Constructed);
                }
                // A flood drawn further along may run back into the entrance.
                Err(GenerationInfeasible::FloodIncompatible { .. }) => {}
                Err(other) => panic!("unexpected failure: {}", other),
            }
        }
        assert!(resolved > 0);
    }

    #[test]
    fn test_first_step_inherits_from_entrance() {
        let mut grid = corridor_grid();
        let mut rng = StdRng::seed_from_u64(1);
        diffuse(&mut grid, &mut rng).unwrap();

        // A full-weight neighbor is always inherited.
        let first = grid.cell(Position::new(0, 1)).unwrap();
        assert_eq!(first.description, Description::Constructed);
        assert_eq!(first.description_weight, FULL_WEIGHT - 10);
    }

    #[test]
    fn test_flood_spreads_along_same_theme() {
        let mut grid = corridor_grid();
        for cell in grid.cells_mut() {
            cell.description = Description::Cavern;
        }
        grid.cell_mut(Position::new(0, 0)).unwrap().description = Description::Constructed;
        grid.cell_mut(Position::new(0, 3)).unwrap().description = Description::CavernFlooded;

        complete_floods(&mut grid).unwrap();
        for y in 1..4 {
            let cell = grid.cell(Position::new(0, y)).unwrap();
            assert_eq!(cell.description, Description::CavernFlooded);
        }
        assert_eq!(grid.cell(Position::new(0, 0)).unwrap().description, Description::Constructed);
    }

    #[test]
    fn test_flood_into_entrance_fails() {
        let mut grid = corridor_grid();
        for cell in grid.cells_mut() {
            cell.description = Description::Constructed;
        }
        grid.cell_mut(Position::new(0, 3)).unwrap().description = Description::ConstructedFlooded;

        let result = complete_floods(&mut grid);
        assert_eq!(result, Err(GenerationInfeasible::FloodIncompatible { x: 0, y: 0 }));
    }

    #[test]
    fn test_single_flooded_cell_dries_out() {
        let mut grid = corridor_grid();
        grid.cell_mut(Position::new(0, 0)).unwrap().description = Description::Constructed;
        grid.cell_mut(Position::new(0, 1)).unwrap().description = Description::Cavern;
        grid.cell_mut(Position::new(0, 2)).unwrap().description = Description::MinesFlooded;
        grid.cell_mut(Position::new(0, 3)).unwrap().description = Description::Cavern;

        complete_floods(&mut grid).unwrap();
        assert_eq!(grid.cell(Position::new(0, 2)).unwrap().description, Description::Mines);
    }
}
