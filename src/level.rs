//! Static wall layout
//!
//! A layout is a character grid on the block pitch: `#` is a wall tile,
//! `.` and spaces are empty, anything else is skipped without a tile.

use crate::board::Bounds;
use crate::tetromino::{CELL, HALF_CELL};
use serde::Serialize;

/// The classic well: 10 columns by 24 rows with walls on three sides
pub const CLASSIC_LAYOUT: &str = "\
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
#..........#
############";

/// A wall tile, by its center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WallTile {
    pub x: i32,
    pub y: i32,
    pub column: usize,
    pub row: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LevelMap {
    origin: (i32, i32),
    tiles: Vec<WallTile>,
}

impl LevelMap {
    /// Parse layout text with its top-left tile corner at `origin`
    pub fn parse(text: &str, origin: (i32, i32)) -> Self {
        let mut tiles = Vec::new();
        for (row, line) in text.lines().enumerate() {
            for (column, symbol) in line.chars().enumerate() {
                match symbol {
                    '#' => tiles.push(WallTile {
                        x: origin.0 + column as i32 * CELL + HALF_CELL,
                        y: origin.1 + row as i32 * CELL + HALF_CELL,
                        column,
                        row,
                    }),
                    '.' | ' ' => {}
                    other => tracing::debug!(row, column, ?other, "skipping unknown layout symbol"),
                }
            }
        }
        Self { origin, tiles }
    }

    pub fn tiles(&self) -> &[WallTile] {
        &self.tiles
    }

    /// Container between the outermost wall columns and above the bottom wall row.
    /// `None` if the walls don't enclose at least one cell.
    pub fn container(&self) -> Option<Bounds> {
        let first_column = self.tiles.iter().map(|t| t.column).min()?;
        let last_column = self.tiles.iter().map(|t| t.column).max()?;
        let bottom_row = self.tiles.iter().map(|t| t.row).max()?;

        if last_column <= first_column + 1 || bottom_row == 0 {
            return None;
        }

        Some(Bounds {
            left: self.origin.0 + (first_column as i32 + 1) * CELL,
            right: self.origin.0 + last_column as i32 * CELL,
            top: self.origin.1,
            floor: self.origin.1 + bottom_row as i32 * CELL,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_layout() {
        let level = LevelMap::parse(CLASSIC_LAYOUT, (128, 16));
        assert_eq!(level.tiles().len(), 24 * 2 + 12);
        assert_eq!(level.container(), Some(Bounds::default()));
        assert_eq!(level.tiles()[0], WallTile { x: 144, y: 32, column: 0, row: 0 });
    }

    #[test]
    fn test_unknown_symbols_are_skipped() {
        let level = LevelMap::parse("#?..#\n#.%.#\n#####", (0, 0));
        assert_eq!(level.tiles().len(), 4 + 5);
        assert_eq!(
            level.container(),
            Some(Bounds {
                left: 32,
                right: 128,
                top: 0,
                floor: 64
            })
        );
    }

    #[test]
    fn test_open_layout_has_no_container() {
        assert_eq!(LevelMap::parse("....", (0, 0)).container(), None);
        assert_eq!(LevelMap::parse("##", (0, 0)).container(), None);
    }
}
