//! Active falling piece logic

use crate::block::{Block, Contact};
use crate::board::Board;
use crate::factory::EntityId;
use crate::input::InputFrame;
use crate::srs::resolve_kick;
use crate::tetromino::{CELL, Rotation, TetrominoType};

/// Result of one gravity step
#[derive(Debug, Clone, PartialEq)]
pub enum Drive {
    /// Moved down one cell
    Fell,
    /// Came to rest; these blocks now belong to the stack
    Landed([Block; 4]),
}

/// What the piece did with one tick of input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PieceUpdate {
    pub moved: bool,
    pub rotated: bool,
    /// Distance dropped, if a hard drop happened
    pub hard_dropped: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lateral {
    Left,
    Right,
}

/// A falling piece and the 4 blocks it drives
#[derive(Debug, Clone)]
pub struct FallingPiece {
    pub id: EntityId,
    pub kind: TetrominoType,
    pub rotation: Rotation,
    /// Pivot position
    pub x: i32,
    pub y: i32,
    blocks: [Block; 4],
    is_falling: bool,
    can_move_left: bool,
    can_move_right: bool,
    lateral_timer: u32,
    /// Direction resolved on the previous tick
    lateral: Option<Lateral>,
    active: bool,
    marked_for_deletion: bool,
}

impl FallingPiece {
    pub(crate) fn new(id: EntityId, kind: TetrominoType, x: i32, y: i32, blocks: [Block; 4]) -> Self {
        Self {
            id,
            kind,
            rotation: Rotation::North,
            x,
            y,
            blocks,
            is_falling: true,
            can_move_left: true,
            can_move_right: true,
            lateral_timer: 0,
            lateral: None,
            active: true,
            marked_for_deletion: false,
        }
    }

    pub fn blocks(&self) -> &[Block; 4] {
        &self.blocks
    }

    /// Block centers for the current pivot and rotation
    pub fn cells(&self) -> [(i32, i32); 4] {
        self.cells_at(self.x, self.y, self.rotation)
    }

    pub fn cells_at(&self, x: i32, y: i32, rotation: Rotation) -> [(i32, i32); 4] {
        self.kind.shape(rotation).map(|(dx, dy)| (x + dx, y + dy))
    }

    pub fn is_falling(&self) -> bool {
        self.is_falling
    }

    pub fn can_move_left(&self) -> bool {
        self.can_move_left
    }

    pub fn can_move_right(&self) -> bool {
        self.can_move_right
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    /// Reset the movement flags, then let every block veto them
    pub fn refresh_contacts(&mut self, board: &Board) {
        let contact = self
            .blocks
            .iter()
            .map(|b| b.probe(board))
            .fold(Contact::default(), |acc, c| Contact {
                grounded: acc.grounded || c.grounded,
                blocked_left: acc.blocked_left || c.blocked_left,
                blocked_right: acc.blocked_right || c.blocked_right,
            });

        self.is_falling = !contact.grounded;
        self.can_move_left = !contact.blocked_left;
        self.can_move_right = !contact.blocked_right;
    }

    /// Apply one tick of input: lateral auto-repeat, rotation, hard drop
    pub fn update(&mut self, input: &InputFrame, board: &Board, lateral_delay: u32) -> PieceUpdate {
        let mut outcome = PieceUpdate::default();
        if !self.active || self.marked_for_deletion {
            return outcome;
        }

        self.refresh_contacts(board);

        let lateral = match (input.held.left, input.held.right) {
            (true, false) => Some(Lateral::Left),
            (false, true) => Some(Lateral::Right),
            _ => None,
        };
        // A new direction moves on its first tick
        if lateral != self.lateral {
            self.lateral_timer = lateral_delay;
            self.lateral = lateral;
        }
        match lateral {
            Some(direction) => {
                if self.lateral_timer >= lateral_delay {
                    self.lateral_timer = 0;
                    outcome.moved = match direction {
                        Lateral::Left => self.move_left(board),
                        Lateral::Right => self.move_right(board),
                    };
                }
                self.lateral_timer += 1;
            }
            None => self.lateral_timer = 0,
        }

        if input.pressed.rotate {
            outcome.rotated = self.rotate(board);
        }

        if input.pressed.hard_drop {
            outcome.hard_dropped = Some(self.hard_drop(board));
        }

        outcome
    }

    /// Try to move left, returns true if successful
    pub fn move_left(&mut self, board: &Board) -> bool {
        if !self.can_move_left {
            return false;
        }
        self.translate(-CELL, 0);
        self.refresh_contacts(board);
        true
    }

    /// Try to move right, returns true if successful
    pub fn move_right(&mut self, board: &Board) -> bool {
        if !self.can_move_right {
            return false;
        }
        self.translate(CELL, 0);
        self.refresh_contacts(board);
        true
    }

    /// Rotate clockwise, kicking off walls, floor or blocks when the plain
    /// rotation doesn't fit. Leaves the piece untouched when nothing fits.
    pub fn rotate(&mut self, board: &Board) -> bool {
        let next = self.rotation.cw();

        let shift = if board.would_collide(&self.cells_at(self.x, self.y, next)) {
            resolve_kick(self.kind, next, (self.x, self.y), board)
        } else {
            Some((0, 0))
        };

        let Some((sx, sy)) = shift else {
            tracing::trace!(kind = ?self.kind, rotation = ?self.rotation, "rotation reverted");
            return false;
        };

        self.rotation = next;
        self.x += sx;
        self.y += sy;
        self.sync_blocks();
        self.refresh_contacts(board);
        true
    }

    /// Drop straight onto the floor or the stack and stop falling.
    /// Returns the distance dropped.
    pub fn hard_drop(&mut self, board: &Board) -> i32 {
        let distance = board.drop_distance(&self.cells());
        self.translate(0, distance);
        self.refresh_contacts(board);
        self.is_falling = false;
        distance
    }

    /// Gravity step: fall one cell, or land if something is underneath
    pub fn drive(&mut self, board: &Board) -> Drive {
        if !self.is_falling {
            self.marked_for_deletion = true;
            for block in &mut self.blocks {
                block.land();
            }
            return Drive::Landed(self.blocks.clone());
        }

        self.translate(0, CELL);
        self.refresh_contacts(board);
        Drive::Fell
    }

    /// Move the pivot, re-placing the blocks from the shape table
    pub(crate) fn relocate(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.sync_blocks();
    }

    pub(crate) fn activate(&mut self, board: &Board) {
        self.active = true;
        self.lateral_timer = 0;
        self.lateral = None;
        self.refresh_contacts(board);
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.x += dx;
        self.y += dy;
        for block in &mut self.blocks {
            block.x += dx;
            block.y += dy;
        }
    }

    fn sync_blocks(&mut self) {
        let cells = self.cells();
        for (block, (x, y)) in self.blocks.iter_mut().zip(cells) {
            block.x = x;
            block.y = y;
        }
    }
}
