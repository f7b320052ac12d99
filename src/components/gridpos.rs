//! Integer grid cell coordinates.
//!
//! The world grid uses screen orientation: `x` grows to the right and `y`
//! grows downward, so "up" is `(0, -1)`. Multi-cell sprites are keyed by their
//! bottom-left cell and extend toward negative `y`.

use std::fmt;

/// A cell in the world grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell displaced by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Parse the `"x,y"` key used by world files.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }

    /// The `"x,y"` key used by world files.
    pub fn to_key(self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// True when `x` is odd, also for negative columns.
    pub fn odd_column(self) -> bool {
        self.x.rem_euclid(2) == 1
    }

    /// True when `y` is odd, also for negative rows.
    pub fn odd_row(self) -> bool {
        self.y.rem_euclid(2) == 1
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        let pos = GridPos::new(-3, 17);
        assert_eq!(pos.to_key(), "-3,17");
        assert_eq!(GridPos::parse_key("-3,17"), Some(pos));
        assert_eq!(GridPos::parse_key(" 4 , 5 "), Some(GridPos::new(4, 5)));
    }

    #[test]
    fn test_parse_key_rejects_garbage() {
        assert_eq!(GridPos::parse_key("12"), None);
        assert_eq!(GridPos::parse_key("a,b"), None);
    }

    #[test]
    fn test_parity_handles_negative_cells() {
        assert!(GridPos::new(-1, 0).odd_column());
        assert!(!GridPos::new(-2, 0).odd_column());
        assert!(GridPos::new(0, -3).odd_row());
    }
}
