//! # Text Display
//!
//! Renders a grid as rows of glyphs with a row gutter on the left and a column
//! gutter underneath. The top row of the dump is the top of the grid.

use crate::world::{Cell, Grid, Level, Position};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// What each position of a dump shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// The tile archetype glyph
    #[default]
    Tiles,
    /// The theme each cell was given
    Descriptions,
    /// Entrance, stairs, keys, doors and room membership
    Features,
}

/// Plain-text grid renderer.
///
/// # Examples
///
/// ```
/// use undercroft::{Direction, Grid, Position, TextDisplay};
///
/// let mut grid = Grid::new(5, 5, Position::new(2, 0), Direction::Up);
/// grid.place_entrance().unwrap();
/// let dump = TextDisplay::new().with_ascii(true).render(&grid);
/// assert_eq!(dump.lines().count(), 6);
/// assert!(dump.lines().nth(4).unwrap().ends_with("<  "));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDisplay {
    /// Use the ASCII glyph of each archetype instead of box drawing
    pub ascii: bool,
    pub view: View,
}

impl TextDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ascii(mut self, ascii: bool) -> Self {
        self.ascii = ascii;
        self
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    fn glyph(&self, grid: &Grid, pos: Position, cell: Option<&Cell>) -> char {
        let Some(cell) = cell else {
            return ' ';
        };
        let tile = cell.tile_type();
        match self.view {
            View::Tiles if self.ascii => tile.ascii,
            View::Tiles => tile.glyph,
            View::Descriptions => cell.description.glyph(),
            View::Features => {
                if pos == grid.start {
                    '@'
                } else if tile.is_stairs_down() {
                    '>'
                } else if cell.has_key {
                    'k'
                } else if cell.has_locked_door() {
                    'L'
                } else if cell.has_doors() {
                    'D'
                } else if cell.room.is_some() && !cell.is_catacombs {
                    '.'
                } else {
                    '#'
                }
            }
        }
    }

    /// Renders the grid, top row first.
    pub fn render(&self, grid: &Grid) -> String {
        let mut out = String::new();
        for y in (0..grid.height() as i32).rev() {
            let _ = write!(out, "{:>3} ", y);
            for x in 0..grid.width() as i32 {
                let pos = Position::new(x, y);
                out.push(self.glyph(grid, pos, grid.cell(pos)));
            }
            out.push('\n');
        }
        out.push_str("    ");
        for x in 0..grid.width() {
            let _ = write!(out, "{}", x % 10);
        }
        out.push('\n');
        out
    }

    /// Renders a finished level followed by its statistics line.
    pub fn render_level(&self, level: &Level) -> String {
        let mut out = format!("level {}\n", level.index);
        out.push_str(&self.render(&level.grid));
        out.push_str(&level.stats.summary());
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::catalog;
    use crate::world::{Direction, Dirs, Door, DoorType};

    fn grid() -> Grid {
        let mut grid = Grid::new(4, 3, Position::new(1, 0), Direction::Up);
        grid.place_entrance().unwrap();
        grid.set_tile(Position::new(1, 1), catalog::corridor(Dirs::DOWN | Dirs::UP).unwrap());
        grid.set_tile(Position::new(1, 2), catalog::corridor(Dirs::DOWN).unwrap());
        grid
    }

    #[test]
    fn test_gutters_and_orientation() {
        let dump = TextDisplay::new().with_ascii(true).render(&grid());
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "  2  |  ");
        assert_eq!(lines[1], "  1  |  ");
        assert_eq!(lines[2], "  0  <  ");
        assert_eq!(lines[3], "    0123");
    }

    #[test]
    fn test_features_view() {
        let mut grid = grid();
        let mut door = Door::new(Direction::Down, DoorType::Regular);
        door.locked = true;
        grid.cell_mut(Position::new(1, 1)).unwrap().doors.push(door);
        grid.cell_mut(Position::new(1, 2)).unwrap().has_key = true;

        let dump = TextDisplay::new().with_view(View::Features).render(&grid);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "  2  k  ");
        assert_eq!(lines[1], "  1  L  ");
        assert_eq!(lines[2], "  0  @  ");
    }

    #[test]
    fn test_descriptions_view_shows_undecided() {
        let dump = TextDisplay::new().with_view(View::Descriptions).render(&grid());
        assert!(dump.lines().nth(1).unwrap().contains('?'));
    }
}
