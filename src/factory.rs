//! Object factory: hands out entity ids and builds blocks and pieces

use crate::block::{Block, BlockKind};
use crate::board::Bounds;
use crate::piece::FallingPiece;
use crate::tetromino::{Rotation, TetrominoType};
use serde::Serialize;

/// Shared numeric id for pieces and blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Default)]
pub struct ObjectFactory {
    next_id: u32,
}

impl ObjectFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn create_block(&mut self, x: i32, y: i32, kind: TetrominoType, owner: EntityId) -> Block {
        let id = self.next_id();
        Block::new(id, x, y, BlockKind::Piece(kind), Some(owner))
    }

    /// Build a piece at pivot (x, y) in its spawn rotation, with its 4 blocks
    pub fn create_piece(&mut self, x: i32, y: i32, kind: TetrominoType) -> FallingPiece {
        let id = self.next_id();
        let blocks = kind
            .shape(Rotation::North)
            .map(|(dx, dy)| self.create_block(x + dx, y + dy, kind, id));
        FallingPiece::new(id, kind, x, y, blocks)
    }

    pub fn create_filler_row_block(&mut self, x: i32, y: i32) -> Block {
        let id = self.next_id();
        let mut block = Block::new(id, x, y, BlockKind::Grey, None);
        block.land();
        block
    }

    /// One full grey row at center height `y`
    pub fn create_filler_row(&mut self, y: i32, bounds: &Bounds) -> Vec<Block> {
        bounds
            .column_centers()
            .map(|x| self.create_filler_row_block(x, y))
            .collect()
    }
}
