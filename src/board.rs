//! Landed-block field and collision queries
//!
//! Landed blocks are kept sparsely, keyed by entity id. Row grouping and
//! occupancy lookups are linear scans; the field never holds more than a
//! few hundred blocks.

use crate::block::{Block, BlockKind};
use crate::factory::EntityId;
use crate::tetromino::{CELL, HALF_CELL};
use serde::Serialize;
use std::collections::BTreeMap;

/// Container edges in world units. Block centers lie strictly inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub floor: i32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            left: 160,
            right: 480,
            top: 16,
            floor: 784,
        }
    }
}

impl Bounds {
    /// Number of columns, i.e. the block count of a full row
    pub fn columns(&self) -> usize {
        ((self.right - self.left) / CELL).max(0) as usize
    }

    pub fn rows(&self) -> usize {
        ((self.floor - self.top) / CELL).max(0) as usize
    }

    /// Center y of the topmost playable row
    pub fn top_row(&self) -> i32 {
        self.top + HALF_CELL
    }

    /// Center y of the lowest row
    pub fn bottom_row(&self) -> i32 {
        self.floor - HALF_CELL
    }

    /// Center x of each column, left to right
    pub fn column_centers(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.columns() as i32).map(move |c| self.left + c * CELL + HALF_CELL)
    }

    /// Whether a block centered at (x, y) is outside the walls or at/below the floor
    pub fn rejects(&self, x: i32, y: i32) -> bool {
        x - HALF_CELL < self.left || x + HALF_CELL > self.right || y + HALF_CELL > self.floor
    }
}

/// The landed stack
#[derive(Debug, Clone)]
pub struct Board {
    bounds: Bounds,
    blocks: BTreeMap<EntityId, Block>,
}

impl Board {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            blocks: BTreeMap::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Add a block to the stack, flipping it to landed
    pub fn insert(&mut self, mut block: Block) {
        block.land();
        self.blocks.insert(block.id, block);
    }

    /// Live landed blocks (pending deletions excluded)
    pub fn landed(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks
            .values()
            .filter(|b| b.is_landed() && !b.is_marked_for_deletion())
    }

    pub fn get(&self, id: EntityId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.landed().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if a landed block sits exactly at (x, y)
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.landed().any(|b| b.x == x && b.y == y)
    }

    /// True if a landed block overlaps the point within half a cell
    pub fn overlaps(&self, x: i32, y: i32) -> bool {
        self.landed()
            .any(|b| (b.x - x).abs() < HALF_CELL && (b.y - y).abs() < HALF_CELL)
    }

    /// Check candidate block centers against the stack, the walls and the floor
    pub fn would_collide(&self, cells: &[(i32, i32)]) -> bool {
        cells
            .iter()
            .any(|&(x, y)| self.bounds.rejects(x, y) || self.is_occupied(x, y))
    }

    /// Group landed blocks by row and keep the rows holding exactly `count` blocks.
    /// Keys are row center y values, so iteration runs top row first.
    pub fn rows_with_count(&self, count: usize) -> BTreeMap<i32, Vec<EntityId>> {
        let mut rows: BTreeMap<i32, Vec<EntityId>> = BTreeMap::new();
        for block in self.landed() {
            rows.entry(block.y).or_default().push(block.id);
        }
        rows.retain(|_, ids| ids.len() == count);
        rows
    }

    /// Move every live landed block at or above row `y` down by `delta_y`
    pub fn shift_rows_above(&mut self, y: i32, delta_y: i32) {
        for block in self.blocks.values_mut() {
            if block.is_landed() && !block.marked_for_deletion && block.y <= y {
                block.y += delta_y;
            }
        }
    }

    /// Smallest downward distance that rests the given cells on the floor or on
    /// the nearest landed block in the same column
    pub fn drop_distance(&self, cells: &[(i32, i32)]) -> i32 {
        cells
            .iter()
            .map(|&(x, y)| {
                let to_floor = self.bounds.bottom_row() - y;
                self.landed()
                    .filter(|b| b.x == x && b.y > y)
                    .map(|b| b.y - CELL - y)
                    .fold(to_floor, i32::min)
            })
            .min()
            .unwrap_or(0)
            .max(0)
    }

    pub fn set_flashing(&mut self, ids: &[EntityId], flashing: bool) {
        for id in ids {
            if let Some(block) = self.blocks.get_mut(id) {
                block.flashing = flashing;
            }
        }
    }

    pub fn mark_for_deletion(&mut self, ids: &[EntityId]) {
        for id in ids {
            if let Some(block) = self.blocks.get_mut(id) {
                block.marked_for_deletion = true;
            }
        }
    }

    /// Game-over wipe: blocks inside the container are marked for deletion,
    /// blocks poking above the top edge turn grey
    pub fn grey_out(&mut self) {
        let top = self.bounds.top;
        for block in self.blocks.values_mut() {
            if block.y > top {
                block.marked_for_deletion = true;
            } else {
                block.kind = BlockKind::Grey;
            }
        }
    }

    /// Remove blocks marked for deletion, returning how many went
    pub fn sweep(&mut self) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|_, b| !b.marked_for_deletion);
        before - self.blocks.len()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
