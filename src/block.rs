//! Block entities and their per-tick contact probe

use crate::board::Board;
use crate::factory::EntityId;
use crate::tetromino::{CELL, HALF_CELL, TetrominoType};
use serde::Serialize;

/// What a block was made from. `Grey` is the filler sentinel used for the
/// game-over fill rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Piece(TetrominoType),
    Grey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockState {
    Falling,
    Landed,
    /// Reserved. Nothing transitions into this state.
    Frozen,
}

/// One cell-sized block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: EntityId,
    pub x: i32,
    pub y: i32,
    pub kind: BlockKind,
    pub state: BlockState,
    /// The falling piece driving this block. Cleared once landed.
    pub owner: Option<EntityId>,
    /// Shown grey during the row-clear flash
    pub flashing: bool,
    pub(crate) marked_for_deletion: bool,
}

/// Movement constraints one block reports back to its piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Contact {
    pub grounded: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
}

impl Block {
    pub fn new(id: EntityId, x: i32, y: i32, kind: BlockKind, owner: Option<EntityId>) -> Self {
        Self {
            id,
            x,
            y,
            kind,
            state: BlockState::Falling,
            owner,
            flashing: false,
            marked_for_deletion: false,
        }
    }

    pub fn is_landed(&self) -> bool {
        self.state == BlockState::Landed
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    /// Flip to the landed state and drop the owner association
    pub fn land(&mut self) {
        self.state = BlockState::Landed;
        self.owner = None;
    }

    /// Re-derive this block's contacts from the current landed stack
    pub fn probe(&self, board: &Board) -> Contact {
        let bounds = board.bounds();

        let grounded =
            self.y + HALF_CELL >= bounds.floor || board.is_occupied(self.x, self.y + CELL);
        let blocked_left =
            self.x - HALF_CELL <= bounds.left || board.is_occupied(self.x - CELL, self.y);
        let blocked_right =
            self.x + HALF_CELL >= bounds.right || board.is_occupied(self.x + CELL, self.y);

        Contact {
            grounded,
            blocked_left,
            blocked_right,
        }
    }
}
