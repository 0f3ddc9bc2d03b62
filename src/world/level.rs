//! # Levels
//!
//! A finished, validated grid plus the statistics of the run that produced it.

use super::{Grid, Position};
use crate::generation::{Description, RoomKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters collected while generating one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Whole attempts used, including the successful one
    pub attempts: u32,
    pub elapsed: Duration,
    pub rooms: usize,
    pub mines: usize,
    pub catacombs: usize,
    pub doors: usize,
    pub locked_doors: usize,
    pub keys: usize,
    pub flooded_cells: usize,
}

impl GenerationStats {
    /// Collects the counters of a finished grid.
    pub fn collect(grid: &Grid, attempts: u32, elapsed: Duration) -> Self {
        let count_kind = |kind: RoomKind| grid.rooms.iter().filter(|room| room.kind == kind).count();
        Self {
            attempts,
            elapsed,
            rooms: count_kind(RoomKind::Regular),
            mines: count_kind(RoomKind::Mine),
            catacombs: count_kind(RoomKind::Catacombs),
            doors: grid.cells().map(|cell| cell.doors.len()).sum(),
            locked_doors: grid
                .cells()
                .flat_map(|cell| cell.doors.iter())
                .filter(|door| door.locked)
                .count(),
            keys: grid.cells().filter(|cell| cell.has_key).count(),
            flooded_cells: grid
                .cells()
                .filter(|cell| cell.description.is_flooded())
                .count(),
        }
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        format!(
            "attempts={} elapsed={}ms rooms={} mines={} catacombs={} doors={} locked={} keys={} flooded={}",
            self.attempts,
            self.elapsed.as_millis(),
            self.rooms,
            self.mines,
            self.catacombs,
            self.doors,
            self.locked_doors,
            self.keys,
            self.flooded_cells
        )
    }
}

impl std::fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

/// A generated dungeon level.
#[derive(Debug, Clone)]
pub struct Level {
    /// Depth index this level was requested for
    pub index: u32,
    pub grid: Grid,
    pub stats: GenerationStats,
}

impl Level {
    pub fn new(index: u32, grid: Grid, stats: GenerationStats) -> Self {
        Self { index, grid, stats }
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn start(&self) -> Position {
        self.grid.start
    }

    pub fn stairs(&self) -> Option<Position> {
        self.grid.stairs
    }

    /// Positions of cells holding a key, in index order.
    pub fn key_positions(&self) -> Vec<Position> {
        self.grid
            .cells()
            .filter(|cell| cell.has_key)
            .map(|cell| cell.position())
            .collect()
    }

    /// Number of cells carrying the given theme.
    pub fn description_count(&self, description: Description) -> usize {
        self.grid
            .cells()
            .filter(|cell| cell.description == description)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Direction;

    #[test]
    fn test_summary_lists_counters() {
        let stats = GenerationStats {
            attempts: 3,
            elapsed: Duration::from_millis(12),
            rooms: 2,
            mines: 1,
            ..GenerationStats::default()
        };
        let summary = stats.summary();
        assert!(summary.contains("attempts=3"));
        assert!(summary.contains("elapsed=12ms"));
        assert!(summary.contains("rooms=2"));
        assert!(summary.contains("mines=1"));
        assert_eq!(stats.to_string(), summary);
    }

    #[test]
    fn test_collect_on_empty_grid() {
        let grid = Grid::new(6, 6, Position::new(3, 0), Direction::Up);
        let stats = GenerationStats::collect(&grid, 1, Duration::ZERO);
        assert_eq!(stats.rooms, 0);
        assert_eq!(stats.doors, 0);
        assert_eq!(stats.keys, 0);

        let level = Level::new(4, grid, stats);
        assert_eq!(level.index, 4);
        assert_eq!(level.start(), Position::new(3, 0));
        assert!(level.stairs().is_none());
        assert!(level.key_positions().is_empty());
    }
}
