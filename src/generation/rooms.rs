//! # Room Placement
//!
//! Sizing, shaping and stamping rooms and mines onto the grid.
//!
//! Rooms are stamped independently and may overlap; the merge pass turns
//! overlapping stamps into one outline afterwards. Mines are placed after the
//! merge on empty ground only.

use crate::generation::catalog::{self, CORNERS};
use crate::generation::utils::band_count;
use crate::generation::{Attempt, GenerationConfig, GenerationInfeasible, Room, RoomKind, TileId};
use crate::utils::{percent, roll_percentile};
use crate::world::{Direction, Dirs, Grid, Position};
use rand::seq::SliceRandom;
use rand::Rng;

/// Mines are always three cells wide.
pub const MINE_WIDTH: u32 = 3;

/// Smallest side for which a round room may be drawn.
pub const MIN_ROUND_SIDE: u32 = 5;

/// How many rooms of each kind an attempt should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPlan {
    /// Regular rooms to stamp
    pub rooms: u32,
    pub mines: u32,
    /// Regular rooms to convert afterwards
    pub catacombs: u32,
}

/// Draws the room count and splits off mines and catacombs.
///
/// Mines are capped so at least one regular room remains.
pub fn plan_room_counts<R: Rng>(config: &GenerationConfig, rng: &mut R) -> RoomPlan {
    let total = rng.gen_range(config.min_rooms..=config.max_rooms);
    let mines = band_count(roll_percentile(rng), &config.mine_thresholds).min(total.saturating_sub(1));
    let catacombs = band_count(roll_percentile(rng), &config.catacomb_thresholds);
    RoomPlan {
        rooms: total - mines,
        mines,
        catacombs,
    }
}

/// Corner of the bounding rectangle cut away from an L-shaped room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
        Quadrant::TopLeft,
        Quadrant::TopRight,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomShape {
    Rectangle,
    /// Rectangle minus a `reduce_x` by `reduce_y` block at the `cut` corner
    Irregular {
        cut: Quadrant,
        reduce_x: u32,
        reduce_y: u32,
    },
}

/// Classification of a position relative to a set of room positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeCell {
    Empty,
    Space,
    Wall { outward: Direction },
    Corner { outward: Dirs },
    InnerCorner { missing: Dirs },
    /// Member whose neighborhood no room archetype can express
    Pinched,
}

impl ShapeCell {
    /// The room archetype for this classification.
    pub fn tile(self) -> Attempt<TileId> {
        let tile = match self {
            ShapeCell::Space => catalog::room_shape(Dirs::all(), None),
            ShapeCell::Wall { outward } => catalog::room_shape(Dirs::all() - outward.bit(), None),
            ShapeCell::Corner { outward } => catalog::room_shape(Dirs::all() - outward, None),
            ShapeCell::InnerCorner { missing } => catalog::room_shape(Dirs::all(), Some(missing)),
            ShapeCell::Empty | ShapeCell::Pinched => None,
        };
        tile.ok_or_else(|| GenerationInfeasible::UnknownConversion {
            conversion: "outline-to-room",
            tile: format!("{:?}", self),
        })
    }
}

/// Classifies `pos` by which of its neighbors satisfy `member`.
pub fn classify(pos: Position, member: impl Fn(Position) -> bool) -> ShapeCell {
    if !member(pos) {
        return ShapeCell::Empty;
    }
    let inside = Direction::ALL
        .into_iter()
        .filter(|direction| member(pos.step(*direction)))
        .fold(Dirs::empty(), |acc, direction| acc | direction.bit());

    match inside.count() {
        4 => {
            let missing: Vec<Dirs> = CORNERS
                .into_iter()
                .filter(|pair| !member(diagonal(pos, *pair)))
                .collect();
            match missing.as_slice() {
                [] => ShapeCell::Space,
                [pair] => ShapeCell::InnerCorner { missing: *pair },
                _ => ShapeCell::Pinched,
            }
        }
        3 => match (Dirs::all() - inside).directions().next() {
            Some(outward) => ShapeCell::Wall { outward },
            None => ShapeCell::Pinched,
        },
        2 if inside.is_corner_pair() => ShapeCell::Corner {
            outward: Dirs::all() - inside,
        },
        _ => ShapeCell::Pinched,
    }
}

fn diagonal(pos: Position, pair: Dirs) -> Position {
    pair.directions().fold(pos, |acc, direction| acc.step(direction))
}

/// Bounding rectangle and shape of one stamped room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    /// Bottom-left corner of the bounding rectangle
    pub origin: Position,
    pub width: u32,
    pub height: u32,
    pub shape: RoomShape,
    pub round: bool,
}

impl Footprint {
    pub fn rectangle(origin: Position, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
            shape: RoomShape::Rectangle,
            round: false,
        }
    }

    /// Whether `pos` belongs to the room.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::generation::rooms::{Footprint, Quadrant, RoomShape};
    /// use undercroft::Position;
    ///
    /// let mut room = Footprint::rectangle(Position::new(2, 2), 5, 4);
    /// assert!(room.contains(Position::new(6, 5)));
    /// assert!(!room.contains(Position::new(7, 5)));
    ///
    /// room.shape = RoomShape::Irregular { cut: Quadrant::TopRight, reduce_x: 2, reduce_y: 1 };
    /// assert!(!room.contains(Position::new(6, 5)));
    /// assert!(room.contains(Position::new(6, 4)));
    /// ```
    pub fn contains(&self, pos: Position) -> bool {
        let dx = pos.x - self.origin.x;
        let dy = pos.y - self.origin.y;
        let (w, h) = (self.width as i32, self.height as i32);
        if dx < 0 || dy < 0 || dx >= w || dy >= h {
            return false;
        }
        match self.shape {
            RoomShape::Rectangle => true,
            RoomShape::Irregular { cut, reduce_x, reduce_y } => {
                let (rx, ry) = (reduce_x as i32, reduce_y as i32);
                let in_cut_x = match cut {
                    Quadrant::BottomLeft | Quadrant::TopLeft => dx < rx,
                    Quadrant::BottomRight | Quadrant::TopRight => dx >= w - rx,
                };
                let in_cut_y = match cut {
                    Quadrant::BottomLeft | Quadrant::BottomRight => dy < ry,
                    Quadrant::TopLeft | Quadrant::TopRight => dy >= h - ry,
                };
                !(in_cut_x && in_cut_y)
            }
        }
    }

    /// Member positions in row-major order.
    pub fn positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for dy in 0..self.height as i32 {
            for dx in 0..self.width as i32 {
                let pos = self.origin.offset(dx, dy);
                if self.contains(pos) {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    pub fn area(&self) -> usize {
        self.positions().len()
    }

    /// Classification of `pos` within this footprint alone.
    pub fn classify(&self, pos: Position) -> ShapeCell {
        classify(pos, |p| self.contains(p))
    }
}

fn random_footprint<R: Rng>(anchor: Position, config: &GenerationConfig, rng: &mut R) -> Footprint {
    let width = rng.gen_range(config.min_room_size..=config.max_room_size);
    let height = rng.gen_range(config.min_room_size..=config.max_room_size);
    let mut footprint = Footprint::rectangle(anchor, width, height);

    if width >= 4 && height >= 4 && percent(config.irregular_chance, rng) {
        let cut = Quadrant::ALL.choose(rng).copied().unwrap_or(Quadrant::TopRight);
        footprint.shape = RoomShape::Irregular {
            cut,
            reduce_x: rng.gen_range(1..=width - 3),
            reduce_y: rng.gen_range(1..=height - 3),
        };
    } else if width >= MIN_ROUND_SIDE && height >= MIN_ROUND_SIDE {
        footprint.round = percent(config.round_room_chance, rng);
    }
    footprint
}

fn outside_margin(grid: &Grid, pos: Position, margin: u32) -> bool {
    pos.chebyshev_distance(grid.start) > margin
}

/// Whether the footprint may be stamped onto the grid as it stands.
pub fn can_place(grid: &Grid, footprint: &Footprint, margin: u32) -> bool {
    footprint.positions().into_iter().all(|pos| {
        if !grid.in_bounds(pos) || !outside_margin(grid, pos, margin) {
            return false;
        }
        match grid.cell(pos) {
            None => true,
            Some(cell) => {
                let existing = cell.tile_type();
                if !existing.is_room_type() || cell.room.is_none() {
                    return false;
                }
                // Opposite corners stacked on one cell leave a pinch no archetype can express.
                match footprint.classify(pos) {
                    ShapeCell::Corner { outward } => {
                        !(existing.is_room_corner() && existing.room_wall_direction == outward.opposite())
                    }
                    _ => true,
                }
            }
        }
    })
}

/// Stamps a footprint, tagging every cell with the placement index.
pub fn stamp(grid: &mut Grid, footprint: &Footprint, placement: usize) -> Attempt<()> {
    for pos in footprint.positions() {
        let tile = footprint.classify(pos).tile()?;
        grid.set_tile(pos, tile);
        if let Some(cell) = grid.cell_mut(pos) {
            cell.room = Some(placement);
            cell.merged = false;
        }
    }
    Ok(())
}

/// Places up to `count` rooms. Returns the stamped footprints in placement order.
///
/// A room that finds no valid anchor within the configured attempts is skipped.
pub fn place_rooms<R: Rng>(
    grid: &mut Grid,
    config: &GenerationConfig,
    count: u32,
    rng: &mut R,
) -> Attempt<Vec<Footprint>> {
    let mut placed = Vec::new();
    for _ in 0..count {
        for _ in 0..config.max_placement_attempts {
            let Some(anchor) = grid.empty_positions().choose(rng).copied() else {
                break;
            };
            let footprint = random_footprint(anchor, config, rng);
            if can_place(grid, &footprint, config.start_margin) {
                stamp(grid, &footprint, placed.len())?;
                placed.push(footprint);
                break;
            }
        }
    }

    if placed.is_empty() {
        return Err(GenerationInfeasible::NoRoomsPlaced);
    }
    log::trace!("placed {} of {} rooms", placed.len(), count);
    Ok(placed)
}

fn near_mine(grid: &Grid, pos: Position) -> bool {
    (-1..=1).any(|dy| {
        (-1..=1).any(|dx| {
            grid.room_of(pos.offset(dx, dy))
                .and_then(|room| grid.rooms.get(room))
                .is_some_and(|room| room.kind == RoomKind::Mine)
        })
    })
}

/// Places up to `count` mines on empty ground and registers them as rooms.
///
/// Each mine cell is the corridor archetype connecting to its in-mine neighbors,
/// giving elbows at the corners, tees along the sides and crossings on the spine.
pub fn place_mines<R: Rng>(
    grid: &mut Grid,
    config: &GenerationConfig,
    count: u32,
    rng: &mut R,
) -> Attempt<usize> {
    let mut placed = 0;
    for _ in 0..count {
        for _ in 0..config.max_placement_attempts {
            let Some(anchor) = grid.empty_positions().choose(rng).copied() else {
                break;
            };
            let length = rng.gen_range(config.mine_min_length..=config.mine_max_length);
            let (width, height) = if rng.gen_bool(0.5) {
                (length, MINE_WIDTH)
            } else {
                (MINE_WIDTH, length)
            };
            let footprint = Footprint::rectangle(anchor, width, height);
            let positions = footprint.positions();
            let clear = positions.iter().all(|pos| {
                grid.is_empty_at(*pos)
                    && outside_margin(grid, *pos, config.start_margin)
                    && !near_mine(grid, *pos)
            });
            if clear {
                build_mine(grid, &footprint)?;
                placed += 1;
                break;
            }
        }
    }
    log::trace!("placed {} of {} mines", placed, count);
    Ok(placed)
}

/// Builds a mine on the footprint's cells and registers it as a room.
pub fn build_mine(grid: &mut Grid, footprint: &Footprint) -> Attempt<()> {
    let id = grid.rooms.len();
    let mut room = Room::new(id, RoomKind::Mine, footprint.origin);

    for pos in footprint.positions() {
        let inside = Direction::ALL
            .into_iter()
            .filter(|direction| footprint.contains(pos.step(*direction)))
            .fold(Dirs::empty(), |acc, direction| acc | direction.bit());
        let tile = catalog::corridor(inside).ok_or_else(|| GenerationInfeasible::UnknownConversion {
            conversion: "mine-mask-to-corridor",
            tile: format!("{:?}", inside),
        })?;
        grid.set_tile(pos, tile);
        if let Some(cell) = grid.cell_mut(pos) {
            cell.room = Some(id);
            cell.merged = true;
        }
        if let Some(index) = grid.index(pos) {
            if inside.count() == 4 {
                room.space.push(index);
            } else {
                room.walls.push(index);
            }
        }
    }

    grid.rooms.push(room);
    Ok(())
}
