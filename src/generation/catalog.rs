//! # Tile Catalog
//!
//! The immutable table of tile archetypes.
//!
//! Every archetype describes three different edge relations:
//! - `connects`: the tile mates with a neighbor across that edge
//! - `traversable`: movement may leave the tile across that edge
//! - `room_connects`: the neighbor across that edge belongs to the same room
//!
//! The table is built once on first use and never mutated afterwards. Cells
//! refer to archetypes by [`TileId`], an index into the table.

use crate::generation::{Attempt, GenerationInfeasible};
use crate::utils::weighted_pick;
use crate::world::{Coords, Direction, Dirs};
use bitflags::bitflags;
use rand::Rng;
use std::sync::LazyLock;

/// Identity of a tile archetype (index into the catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u8);

impl TileId {
    /// The empty archetype. Never stored in a cell.
    pub const EMPTY: TileId = TileId(0);

    /// The archetype this id refers to.
    pub fn info(self) -> &'static TileType {
        &catalog()[self.0 as usize]
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Classification flags of a tile archetype.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u16 {
        const EMPTY = 1 << 0;
        const CORRIDOR = 1 << 1;
        const JUNCTION = 1 << 2;
        const DEAD_END = 1 << 3;
        const ENTRANCE = 1 << 4;
        const STAIRS_DOWN = 1 << 5;
        const ROOM = 1 << 6;
        const ROOM_EXIT = 1 << 7;
        const ROOM_CORNER = 1 << 8;
        const INNER_CORNER = 1 << 9;
        const ROUND_CORNER = 1 << 10;
        /// Outline walks start on this archetype (the bottom-left corner)
        const CLEAN_START_WALL = 1 << 11;
        /// A fresh flooded theme may start on this archetype
        const FLOODING_TRANSITION = 1 << 12;
        /// This archetype must never be flooded
        const FLOODING_INCOMPATIBLE = 1 << 13;
        /// Force growth may swap this archetype for a substitute
        const FORCE_GROWTH = 1 << 14;
    }
}

/// An immutable tile archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileType {
    pub id: TileId,
    pub name: String,
    pub connects: Dirs,
    pub traversable: Dirs,
    pub room_connects: Dirs,
    pub flags: TileFlags,
    /// Outward sides of a room wall or corner; the missing diagonal of an inner corner
    pub room_wall_direction: Dirs,
    /// Bias for weighted random selection during growth
    pub weight: u32,
    /// Percent chance per eligible edge of carrying a door
    pub door_probability: u32,
    pub glyph: char,
    pub ascii: char,
}

/// Outward side pairs of the four outer corners: bottom-left, bottom-right, top-left, top-right.
pub const CORNERS: [Dirs; 4] = [
    Dirs::DOWN.union(Dirs::LEFT),
    Dirs::DOWN.union(Dirs::RIGHT),
    Dirs::UP.union(Dirs::LEFT),
    Dirs::UP.union(Dirs::RIGHT),
];

const CORRIDOR_GLYPHS: [char; 16] = [
    ' ', '╵', '╶', '└', '╷', '│', '┌', '├', '╴', '┘', '─', '┴', '┐', '┤', '┬', '┼',
];

static CATALOG: LazyLock<Vec<TileType>> = LazyLock::new(build_catalog);

/// The full catalog, indexed by [`TileId`].
pub fn catalog() -> &'static [TileType] {
    &CATALOG
}

impl TileType {
    fn blank(name: String, glyph: char, ascii: char, flags: TileFlags) -> Self {
        Self {
            id: TileId::EMPTY,
            name,
            connects: Dirs::empty(),
            traversable: Dirs::empty(),
            room_connects: Dirs::empty(),
            flags,
            room_wall_direction: Dirs::empty(),
            weight: 0,
            door_probability: 0,
            glyph,
            ascii,
        }
    }

    fn corridor(connects: Dirs) -> Self {
        let count = connects.count();
        let straight = connects == (Dirs::UP | Dirs::DOWN) || connects == (Dirs::LEFT | Dirs::RIGHT);
        let (kind, weight, door_probability) = match count {
            1 => ("dead-end", 6, 8),
            2 if straight => ("straight", 30, 6),
            2 => ("elbow", 18, 3),
            3 => ("tee", 8, 2),
            _ => ("cross", 3, 2),
        };

        let mut flags = TileFlags::CORRIDOR | TileFlags::FORCE_GROWTH;
        if count == 1 {
            flags |= TileFlags::DEAD_END | TileFlags::FLOODING_TRANSITION;
        }
        if count >= 3 {
            flags |= TileFlags::JUNCTION;
        }

        let ascii = if connects.difference(Dirs::UP | Dirs::DOWN).is_empty() {
            '|'
        } else if connects.difference(Dirs::LEFT | Dirs::RIGHT).is_empty() {
            '-'
        } else {
            '+'
        };

        let mut tile = Self::blank(
            format!("{}-{}", kind, dirs_label(connects)),
            CORRIDOR_GLYPHS[connects.bits() as usize],
            ascii,
            flags,
        );
        tile.connects = connects;
        tile.traversable = connects;
        tile.weight = weight;
        tile.door_probability = door_probability;
        tile
    }

    fn stairs_down(direction: Direction) -> Self {
        let mut tile = Self::blank(
            format!("stairs-down-{}", direction),
            '▼',
            '>',
            TileFlags::STAIRS_DOWN | TileFlags::FLOODING_INCOMPATIBLE,
        );
        tile.connects = direction.bit();
        tile.traversable = direction.bit();
        tile
    }

    fn entrance(direction: Direction) -> Self {
        let mut tile = Self::blank(
            format!("entrance-{}", direction),
            '▲',
            '<',
            TileFlags::ENTRANCE | TileFlags::FLOODING_INCOMPATIBLE,
        );
        tile.connects = direction.bit();
        tile.traversable = direction.bit();
        tile
    }

    fn room(name: String, glyph: char, ascii: char, flags: TileFlags, room_connects: Dirs) -> Self {
        let mut tile = Self::blank(name, glyph, ascii, flags | TileFlags::ROOM);
        tile.connects = room_connects;
        tile.traversable = room_connects;
        tile.room_connects = room_connects;
        tile
    }

    fn room_space() -> Self {
        Self::room(
            "room-space".to_string(),
            '·',
            '.',
            TileFlags::FLOODING_TRANSITION,
            Dirs::all(),
        )
    }

    fn room_wall(outward: Direction) -> Self {
        let (glyph, ascii) = if outward.is_vertical() { ('═', '-') } else { ('║', '|') };
        let mut tile = Self::room(
            format!("wall-{}", outward),
            glyph,
            ascii,
            TileFlags::FORCE_GROWTH,
            Dirs::all() - outward.bit(),
        );
        tile.room_wall_direction = outward.bit();
        tile
    }

    fn outer_corner(outward: Dirs) -> Self {
        let mut flags = TileFlags::ROOM_CORNER | TileFlags::FORCE_GROWTH;
        if outward == CORNERS[0] {
            flags |= TileFlags::CLEAN_START_WALL;
        }
        let mut tile = Self::room(
            format!("corner-{}", dirs_label(outward)),
            corner_glyph(outward, ['╚', '╝', '╔', '╗']),
            '+',
            flags,
            Dirs::all() - outward,
        );
        tile.room_wall_direction = outward;
        tile
    }

    fn inner_corner(missing: Dirs) -> Self {
        let mut tile = Self::room(
            format!("inner-corner-{}", dirs_label(missing)),
            corner_glyph(missing, ['╗', '╔', '╝', '╚']),
            '+',
            TileFlags::ROOM_CORNER | TileFlags::INNER_CORNER,
            Dirs::all(),
        );
        tile.room_wall_direction = missing;
        tile
    }

    fn wall_exit(outward: Direction) -> Self {
        let (glyph, ascii) = if outward.is_vertical() { ('╪', '=') } else { ('╫', 'H') };
        let room_connects = Dirs::all() - outward.bit();
        let mut tile = Self::room(
            format!("exit-{}", outward),
            glyph,
            ascii,
            TileFlags::ROOM_EXIT,
            room_connects,
        );
        tile.connects = Dirs::all();
        tile.traversable = Dirs::all();
        tile.room_wall_direction = outward.bit();
        tile.door_probability = 45;
        tile
    }

    fn corner_exit(outward: Dirs, exits: Dirs) -> Self {
        let room_connects = Dirs::all() - outward;
        let mut tile = Self::room(
            format!("corner-exit-{}-open-{}", dirs_label(outward), dirs_label(exits)),
            '╬',
            '#',
            TileFlags::ROOM_EXIT | TileFlags::ROOM_CORNER,
            room_connects,
        );
        tile.connects = room_connects | exits;
        tile.traversable = room_connects | exits;
        tile.room_wall_direction = outward;
        tile.door_probability = 30;
        tile
    }

    fn round_corner(outward: Dirs) -> Self {
        let mut tile = Self::room(
            format!("round-corner-{}", dirs_label(outward)),
            corner_glyph(outward, ['╰', '╯', '╭', '╮']),
            'o',
            TileFlags::ROOM_CORNER | TileFlags::ROUND_CORNER,
            Dirs::all() - outward,
        );
        tile.traversable = Dirs::empty();
        tile.room_wall_direction = outward;
        tile
    }

    pub fn is_empty(&self) -> bool {
        self.flags.contains(TileFlags::EMPTY)
    }

    pub fn is_corridor(&self) -> bool {
        self.flags.contains(TileFlags::CORRIDOR)
    }

    pub fn is_junction(&self) -> bool {
        self.flags.contains(TileFlags::JUNCTION)
    }

    pub fn is_dead_end(&self) -> bool {
        self.flags.contains(TileFlags::DEAD_END)
    }

    pub fn is_entrance(&self) -> bool {
        self.flags.contains(TileFlags::ENTRANCE)
    }

    pub fn is_stairs_down(&self) -> bool {
        self.flags.contains(TileFlags::STAIRS_DOWN)
    }

    pub fn is_room_type(&self) -> bool {
        self.flags.contains(TileFlags::ROOM)
    }

    pub fn is_room_exit(&self) -> bool {
        self.flags.contains(TileFlags::ROOM_EXIT)
    }

    pub fn is_room_corner(&self) -> bool {
        self.flags.contains(TileFlags::ROOM_CORNER)
    }

    pub fn is_inner_corner(&self) -> bool {
        self.flags.contains(TileFlags::INNER_CORNER)
    }

    pub fn is_round_corner(&self) -> bool {
        self.flags.contains(TileFlags::ROUND_CORNER)
    }

    /// A closed, square outer corner.
    pub fn is_outer_corner(&self) -> bool {
        self.is_room_corner() && !self.is_inner_corner() && !self.is_round_corner() && !self.is_room_exit()
    }

    /// Room space: every side belongs to the room.
    pub fn is_room_space(&self) -> bool {
        self.is_room_type() && self.room_wall_direction.is_empty()
    }

    pub fn is_clean_start_wall(&self) -> bool {
        self.flags.contains(TileFlags::CLEAN_START_WALL)
    }

    pub fn is_flooding_transition(&self) -> bool {
        self.flags.contains(TileFlags::FLOODING_TRANSITION)
    }

    pub fn is_flooding_incompatible(&self) -> bool {
        self.flags.contains(TileFlags::FLOODING_INCOMPATIBLE)
    }

    pub fn force_growth_compatible(&self) -> bool {
        self.flags.contains(TileFlags::FORCE_GROWTH)
    }

    pub fn connects_in(&self, direction: Direction) -> bool {
        self.connects.has(direction)
    }

    pub fn traversable_in(&self, direction: Direction) -> bool {
        self.traversable.has(direction)
    }

    /// Room wall sides that are currently open.
    pub fn exit_directions(&self) -> Dirs {
        if self.is_room_type() && !self.is_inner_corner() {
            self.connects & self.room_wall_direction
        } else {
            Dirs::empty()
        }
    }

    /// Whether the two archetypes agree about the shared edge.
    ///
    /// `direction` points from `self` towards `other`. Empty archetypes are
    /// compatible with everything; otherwise both must connect or both must not.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercroft::generation::catalog;
    /// use undercroft::{Direction, Dirs};
    ///
    /// let vertical = catalog::corridor(Dirs::UP | Dirs::DOWN).unwrap().info();
    /// let horizontal = catalog::corridor(Dirs::LEFT | Dirs::RIGHT).unwrap().info();
    /// assert!(vertical.compatible_with(vertical, Direction::Up));
    /// assert!(!vertical.compatible_with(horizontal, Direction::Up));
    /// // Neither side opens onto the shared edge.
    /// assert!(vertical.compatible_with(vertical, Direction::Right));
    /// assert!(!vertical.compatible_with(horizontal, Direction::Right));
    /// ```
    pub fn compatible_with(&self, other: &TileType, direction: Direction) -> bool {
        self.is_empty()
            || other.is_empty()
            || self.connects_in(direction) == other.connects_in(direction.opposite())
    }

    /// Whether both sides declare a connection across the shared edge.
    pub fn connects_to(&self, other: &TileType, direction: Direction) -> bool {
        self.connects_in(direction) && other.connects_in(direction.opposite())
    }
}

fn dirs_label(dirs: Dirs) -> String {
    dirs.directions()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

fn corner_glyph(pair: Dirs, glyphs: [char; 4]) -> char {
    CORNERS
        .iter()
        .position(|corner| *corner == pair)
        .map(|index| glyphs[index])
        .unwrap_or('?')
}

fn build_catalog() -> Vec<TileType> {
    let mut types = vec![TileType::blank("empty".to_string(), ' ', ' ', TileFlags::EMPTY)];

    for bits in 1..16u8 {
        types.push(TileType::corridor(Dirs::from_bits_truncate(bits)));
    }
    for direction in Direction::ALL {
        types.push(TileType::stairs_down(direction));
    }
    for direction in Direction::ALL {
        types.push(TileType::entrance(direction));
    }

    types.push(TileType::room_space());
    for direction in Direction::ALL {
        types.push(TileType::room_wall(direction));
    }
    for corner in CORNERS {
        types.push(TileType::outer_corner(corner));
    }
    for corner in CORNERS {
        types.push(TileType::inner_corner(corner));
    }
    for direction in Direction::ALL {
        types.push(TileType::wall_exit(direction));
    }
    for corner in CORNERS {
        for exits in corner.directions().map(Dirs::from).chain(std::iter::once(corner)) {
            types.push(TileType::corner_exit(corner, exits));
        }
    }
    for corner in CORNERS {
        types.push(TileType::round_corner(corner));
    }

    for (index, tile) in types.iter_mut().enumerate() {
        tile.id = TileId(index as u8);
    }
    types
}

fn find(predicate: impl Fn(&TileType) -> bool) -> Option<TileId> {
    catalog().iter().find(|tile| predicate(tile)).map(|tile| tile.id)
}

fn unknown(conversion: &'static str, tile: TileId) -> GenerationInfeasible {
    GenerationInfeasible::UnknownConversion {
        conversion,
        tile: tile.info().name.clone(),
    }
}

/// Every non-empty archetype legal at the given coordinates.
///
/// Positions on a grid edge exclude archetypes that would connect past it.
pub fn types_for(coords: &Coords) -> Vec<TileId> {
    let edges = coords.edges();
    catalog()
        .iter()
        .filter(|tile| !tile.is_empty() && (tile.connects & edges).is_empty())
        .map(|tile| tile.id)
        .collect()
}

/// Archetypes growth may attach at the given coordinates.
pub fn growth_types(coords: &Coords) -> Vec<TileId> {
    types_for(coords)
        .into_iter()
        .filter(|id| id.info().weight > 0)
        .collect()
}

/// Draws one archetype from `pool` by weight and removes it from the pool.
pub fn draw_weighted<R: Rng>(pool: &mut Vec<TileId>, rng: &mut R) -> Option<TileId> {
    let weights: Vec<u32> = pool.iter().map(|id| id.info().weight).collect();
    let index = weighted_pick(&weights, rng)?;
    Some(pool.remove(index))
}

/// The corridor archetype with exactly the given connections.
pub fn corridor(connects: Dirs) -> Option<TileId> {
    find(|tile| tile.is_corridor() && tile.connects == connects)
}

/// The entrance archetype opening towards `direction`.
pub fn entrance(direction: Direction) -> Option<TileId> {
    find(|tile| tile.is_entrance() && tile.connects == direction.bit())
}

/// The room archetype for a cell whose same-room neighbors are `room_connects`.
///
/// `missing_diagonal` names a lone diagonal outside the room, which turns a
/// fully surrounded cell into an inner corner.
pub fn room_shape(room_connects: Dirs, missing_diagonal: Option<Dirs>) -> Option<TileId> {
    match room_connects.count() {
        4 => match missing_diagonal {
            Some(missing) => find(|tile| tile.is_inner_corner() && tile.room_wall_direction == missing),
            None => find(|tile| tile.is_room_space()),
        },
        3 => {
            let outward = Dirs::all() - room_connects;
            find(|tile| {
                tile.is_room_type()
                    && !tile.is_room_corner()
                    && !tile.is_room_exit()
                    && tile.room_wall_direction == outward
            })
        }
        2 if room_connects.is_corner_pair() => {
            let outward = Dirs::all() - room_connects;
            find(|tile| tile.is_outer_corner() && tile.room_wall_direction == outward)
        }
        _ => None,
    }
}

/// The exit archetype of a wall or corner with `exits` opened.
///
/// Exits already open on `tile` stay open.
pub fn exit_for(tile: TileId, exits: Dirs) -> Attempt<TileId> {
    let info = tile.info();
    let opened = info.exit_directions() | exits;
    let eligible = info.is_room_type()
        && !info.is_inner_corner()
        && !info.is_round_corner()
        && !opened.is_empty()
        && info.room_wall_direction.contains(opened);
    if !eligible {
        return Err(unknown("wall-to-exit", tile));
    }
    find(|candidate| {
        candidate.is_room_exit()
            && candidate.room_connects == info.room_connects
            && candidate.connects == info.room_connects | opened
    })
    .ok_or_else(|| unknown("wall-to-exit", tile))
}

/// The closed wall or corner archetype behind an exit.
pub fn wall_for(tile: TileId) -> Attempt<TileId> {
    let info = tile.info();
    if !info.is_room_exit() {
        return Err(unknown("exit-to-wall", tile));
    }
    find(|candidate| {
        candidate.is_room_type()
            && !candidate.is_room_exit()
            && !candidate.is_inner_corner()
            && !candidate.is_round_corner()
            && candidate.room_connects == info.room_connects
            && candidate.room_wall_direction == info.room_wall_direction
    })
    .ok_or_else(|| unknown("exit-to-wall", tile))
}

/// Changes the open outward sides of a room wall, corner or exit to exactly `exits`.
pub fn with_exits(tile: TileId, exits: Dirs) -> Attempt<TileId> {
    let info = tile.info();
    let base = if info.is_room_exit() { wall_for(tile)? } else { tile };
    if exits.is_empty() {
        Ok(base)
    } else {
        exit_for(base, exits)
    }
}

/// The down-stairs counterpart of a dead end.
pub fn stairs_for(tile: TileId) -> Attempt<TileId> {
    let info = tile.info();
    if !info.is_dead_end() {
        return Err(unknown("dead-end-to-stairs", tile));
    }
    find(|candidate| candidate.is_stairs_down() && candidate.connects == info.connects)
        .ok_or_else(|| unknown("dead-end-to-stairs", tile))
}

/// The rounded counterpart of a square outer corner.
pub fn round_for(tile: TileId) -> Attempt<TileId> {
    let info = tile.info();
    if !info.is_outer_corner() {
        return Err(unknown("corner-to-round", tile));
    }
    find(|candidate| candidate.is_round_corner() && candidate.room_wall_direction == info.room_wall_direction)
        .ok_or_else(|| unknown("corner-to-round", tile))
}

/// The plain corridor archetype with the same connections.
pub fn corridor_equivalent(tile: TileId) -> Attempt<TileId> {
    corridor(tile.info().connects).ok_or_else(|| unknown("room-to-corridor", tile))
}

/// Archetypes force growth may swap `tile` for.
///
/// Corridors swap for other corridors; closed walls and corners open into exits
/// of the same room shape.
pub fn substitutes(tile: TileId) -> Vec<TileId> {
    let info = tile.info();
    if !info.force_growth_compatible() {
        return Vec::new();
    }
    catalog()
        .iter()
        .filter(|candidate| candidate.id != tile)
        .filter(|candidate| {
            if info.is_corridor() {
                candidate.is_corridor()
            } else {
                candidate.is_room_exit() && candidate.room_connects == info.room_connects
            }
        })
        .map(|candidate| candidate.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_catalog_ids_match_positions() {
        for (index, tile) in catalog().iter().enumerate() {
            assert_eq!(tile.id.index(), index);
        }
        assert!(TileId::EMPTY.info().is_empty());
    }

    #[test]
    fn test_catalog_traversal_subset_of_connections() {
        for tile in catalog() {
            assert!(tile.connects.contains(tile.traversable), "{}", tile.name);
            assert!(tile.connects.contains(tile.room_connects), "{}", tile.name);
        }
    }

    #[test]
    fn test_every_corridor_mask_present() {
        for bits in 1..16u8 {
            let connects = Dirs::from_bits_truncate(bits);
            let id = corridor(connects).unwrap();
            assert_eq!(id.info().connects, connects);
            assert_eq!(id.info().is_dead_end(), connects.count() == 1);
            assert_eq!(id.info().is_junction(), connects.count() >= 3);
        }
    }

    #[test]
    fn test_compatibility_rules() {
        let vertical = corridor(Dirs::UP | Dirs::DOWN).unwrap().info();
        let dead_end_down = corridor(Dirs::DOWN).unwrap().info();
        let empty = TileId::EMPTY.info();

        assert!(vertical.compatible_with(dead_end_down, Direction::Up));
        assert!(vertical.connects_to(dead_end_down, Direction::Up));
        assert!(!vertical.compatible_with(dead_end_down, Direction::Down));
        assert!(empty.compatible_with(vertical, Direction::Left));
        assert!(vertical.compatible_with(empty, Direction::Up));
        assert!(!vertical.connects_to(empty, Direction::Up));
    }

    #[test]
    fn test_types_for_excludes_outward_connections() {
        let corner = Coords::new(0, 0, 10, 10);
        for id in types_for(&corner) {
            let connects = id.info().connects;
            assert!(!connects.has(Direction::Down));
            assert!(!connects.has(Direction::Left));
        }

        let centre = Coords::new(5, 5, 10, 10);
        assert_eq!(types_for(&centre).len(), catalog().len() - 1);
    }

    #[test]
    fn test_room_shape_lookup() {
        let space = room_shape(Dirs::all(), None).unwrap();
        assert!(space.info().is_room_space());

        let bottom_wall = room_shape(Dirs::all() - Dirs::DOWN, None).unwrap();
        assert_eq!(bottom_wall.info().room_wall_direction, Dirs::DOWN);

        let bottom_left = room_shape(Dirs::UP | Dirs::RIGHT, None).unwrap();
        assert!(bottom_left.info().is_outer_corner());
        assert!(bottom_left.info().is_clean_start_wall());

        let inner = room_shape(Dirs::all(), Some(Dirs::DOWN | Dirs::LEFT)).unwrap();
        assert!(inner.info().is_inner_corner());

        assert!(room_shape(Dirs::UP | Dirs::DOWN, None).is_none());
        assert!(room_shape(Dirs::UP, None).is_none());
    }

    #[test]
    fn test_exit_conversions() {
        let wall = room_shape(Dirs::all() - Dirs::LEFT, None).unwrap();
        let exit = exit_for(wall, Dirs::LEFT).unwrap();
        assert!(exit.info().is_room_exit());
        assert_eq!(exit.info().connects, Dirs::all());
        assert_eq!(wall_for(exit).unwrap(), wall);
        assert!(exit_for(wall, Dirs::UP).is_err());

        let corner = room_shape(Dirs::UP | Dirs::RIGHT, None).unwrap();
        let one_side = exit_for(corner, Dirs::DOWN).unwrap();
        assert_eq!(one_side.info().exit_directions(), Dirs::DOWN);
        let both = exit_for(one_side, Dirs::LEFT).unwrap();
        assert_eq!(both.info().exit_directions(), Dirs::DOWN | Dirs::LEFT);
        assert_eq!(with_exits(both, Dirs::empty()).unwrap(), corner);
        assert_eq!(with_exits(both, Dirs::LEFT).unwrap().info().exit_directions(), Dirs::LEFT);
    }

    #[test]
    fn test_stairs_and_round_conversions() {
        let dead_end = corridor(Dirs::RIGHT).unwrap();
        let stairs = stairs_for(dead_end).unwrap();
        assert!(stairs.info().is_stairs_down());
        assert_eq!(stairs.info().connects, Dirs::RIGHT);
        assert!(stairs_for(corridor(Dirs::UP | Dirs::DOWN).unwrap()).is_err());

        let corner = room_shape(Dirs::DOWN | Dirs::LEFT, None).unwrap();
        let round = round_for(corner).unwrap();
        assert!(round.info().is_round_corner());
        assert_eq!(round.info().connects, corner.info().connects);
        assert!(round.info().traversable.is_empty());
    }

    #[test]
    fn test_substitutes_stay_in_family() {
        let straight = corridor(Dirs::UP | Dirs::DOWN).unwrap();
        let subs = substitutes(straight);
        assert_eq!(subs.len(), 14);
        assert!(subs.iter().all(|id| id.info().is_corridor()));

        let wall = room_shape(Dirs::all() - Dirs::UP, None).unwrap();
        let subs = substitutes(wall);
        assert_eq!(subs.len(), 1);
        assert!(subs[0].info().is_room_exit());

        let space = room_shape(Dirs::all(), None).unwrap();
        assert!(substitutes(space).is_empty());
    }

    #[test]
    fn test_draw_weighted_removes_choice() {
        let mut pool = growth_types(&Coords::new(4, 4, 9, 9));
        let before = pool.len();
        let mut rng = StepRng::new(0, 0);
        let drawn = draw_weighted(&mut pool, &mut rng).unwrap();
        assert_eq!(pool.len(), before - 1);
        assert!(!pool.contains(&drawn));
    }
}
