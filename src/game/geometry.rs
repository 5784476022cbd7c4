//! Board geometry: the diamond grid, distances, and move candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::UnitKind;

/// Radius of the diamond board. A cell is on the board iff `|x| + |y| <= GRID_SIZE`.
pub const GRID_SIZE: i32 = 8;

/// Range of a long-range unit, in Manhattan distance.
pub const LONG_RANGE_REACH: i32 = 3;

/// King-move offsets, orthogonal first.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset from the center square.
    pub x: i32,
    /// Vertical offset from the center square.
    pub y: i32,
}

/// The center square.
pub const CENTER: Position = Position::new(0, 0);

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this cell lies on the diamond board.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        is_valid_position(self.x, self.y)
    }

    /// Whether this is the center square.
    #[must_use]
    pub const fn is_center(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Manhattan (taxicab) distance to another cell.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev (king-move) distance to another cell.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// The same cell reflected through the center square.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        Self::new(-self.x, -self.y)
    }

    /// The on-board king-move neighbors of this cell.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        NEIGHBOR_OFFSETS
            .into_iter()
            .map(move |(dx, dy)| Position::new(self.x + dx, self.y + dy))
            .filter(|p| p.is_valid())
    }

    /// Board label: file `a..q` for x in -8..=8, rank `1..17` counting up from y = 8.
    ///
    /// Returns `None` for cells outside the label square.
    #[must_use]
    pub fn label(self) -> Option<String> {
        if self.x.unsigned_abs() > GRID_SIZE.unsigned_abs()
            || self.y.unsigned_abs() > GRID_SIZE.unsigned_abs()
        {
            return None;
        }
        let file = u8::try_from(self.x + GRID_SIZE).ok()?;
        let rank = GRID_SIZE - self.y + 1;
        Some(format!("{}{rank}", char::from(b'a' + file)))
    }

    /// Parse a label produced by [`Position::label`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let mut chars = label.chars();
        let file = chars.next()?;
        if !file.is_ascii_lowercase() {
            return None;
        }
        let rank: i32 = chars.as_str().parse().ok()?;
        let x = i32::from(u8::try_from(file).ok()? - b'a') - GRID_SIZE;
        let y = GRID_SIZE + 1 - rank;
        let pos = Self::new(x, y);
        (pos.label().as_deref() == Some(label)).then_some(pos)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => write!(f, "({},{})", self.x, self.y),
        }
    }
}

/// Whether `(x, y)` lies on the diamond board.
#[must_use]
pub const fn is_valid_position(x: i32, y: i32) -> bool {
    // Coordinates come straight from clients; any i32 must be answerable
    match x.unsigned_abs().checked_add(y.unsigned_abs()) {
        Some(distance) => distance <= GRID_SIZE.unsigned_abs(),
        None => false,
    }
}

/// Whether `pos` is the center square.
#[must_use]
pub const fn is_center_square(pos: Position) -> bool {
    pos.is_center()
}

/// Whether a unit of `kind` standing on `source` can strike `target`.
///
/// Infantry reach the eight surrounding cells; long-range units reach any
/// cell within Manhattan distance 3. A unit never reaches its own cell.
#[must_use]
pub fn is_in_attack_range(source: Position, target: Position, kind: UnitKind) -> bool {
    if source == target {
        return false;
    }
    match kind {
        UnitKind::Infantry => source.chebyshev(target) <= 1,
        UnitKind::LongRange => source.manhattan(target) <= LONG_RANGE_REACH,
    }
}

/// Every cell on the board, row by row from the top.
pub fn all_positions() -> impl Iterator<Item = Position> {
    (-GRID_SIZE..=GRID_SIZE).flat_map(|y| {
        let width = GRID_SIZE - y.abs();
        (-width..=width).map(move |x| Position::new(x, y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_position_diamond() {
        assert!(is_valid_position(0, 0));
        assert!(is_valid_position(8, 0));
        assert!(is_valid_position(4, -4));
        assert!(!is_valid_position(5, 4));
        assert!(!is_valid_position(0, 9));
    }

    #[test]
    fn test_valid_position_extreme_coordinates() {
        assert!(!is_valid_position(i32::MAX, 1));
        assert!(!is_valid_position(i32::MIN, 0));
        assert!(!is_valid_position(0, i32::MIN));
        assert!(!is_valid_position(i32::MIN, i32::MIN));
        assert_eq!(Position::new(i32::MIN, 0).label(), None);
        assert_eq!(Position::new(i32::MIN, 0).to_string(), "(-2147483648,0)");
    }

    #[test]
    fn test_all_positions_count() {
        // 2r^2 + 2r + 1 cells in a diamond of radius r
        assert_eq!(all_positions().count(), 145);
        assert!(all_positions().all(Position::is_valid));
    }

    #[test]
    fn test_neighbors_interior_and_edge() {
        assert_eq!(CENTER.neighbors().count(), 8);
        // The tip of the diamond keeps only the three inward cells
        let tip = Position::new(8, 0);
        let adj: Vec<_> = tip.neighbors().collect();
        assert_eq!(adj.len(), 3);
        assert!(adj.contains(&Position::new(7, 0)));
        assert!(adj.contains(&Position::new(7, 1)));
        assert!(adj.contains(&Position::new(7, -1)));
    }

    #[test]
    fn test_infantry_range() {
        let src = Position::new(1, -2);
        assert!(is_in_attack_range(src, Position::new(2, -1), UnitKind::Infantry));
        assert!(is_in_attack_range(src, Position::new(1, -3), UnitKind::Infantry));
        assert!(!is_in_attack_range(src, Position::new(3, -2), UnitKind::Infantry));
        assert!(!is_in_attack_range(src, src, UnitKind::Infantry));
    }

    #[test]
    fn test_long_range_reach() {
        let src = Position::new(0, -2);
        assert!(is_in_attack_range(src, Position::new(0, 1), UnitKind::LongRange));
        assert!(is_in_attack_range(src, Position::new(2, -1), UnitKind::LongRange));
        assert!(!is_in_attack_range(src, Position::new(2, 0), UnitKind::LongRange));
        assert!(!is_in_attack_range(src, src, UnitKind::LongRange));
    }

    #[test]
    fn test_labels() {
        assert_eq!(CENTER.label().as_deref(), Some("i9"));
        assert_eq!(Position::new(-8, 0).label().as_deref(), Some("a9"));
        assert_eq!(Position::new(0, 8).label().as_deref(), Some("i1"));
        assert_eq!(Position::new(0, -8).label().as_deref(), Some("i17"));
        assert_eq!(Position::from_label("i9"), Some(CENTER));
        assert_eq!(Position::from_label("i17"), Some(Position::new(0, -8)));
        assert_eq!(Position::from_label("z1"), None);
        assert_eq!(Position::from_label("i0"), None);
        assert_eq!(Position::from_label("i09"), None);
    }

    #[test]
    fn test_labels_reversible_on_board() {
        for pos in all_positions() {
            let label = pos.label().unwrap();
            assert_eq!(Position::from_label(&label), Some(pos), "label {label}");
        }
    }
}
