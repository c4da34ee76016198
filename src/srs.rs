//! Rotation kick data and kick resolution
//!
//! A simplified SRS-style kick system. Each (type, target rotation) lists
//! kick candidates: a test point relative to the pivot, the bound it guards
//! and the shift applied when that point has crossed the bound or lands on
//! a landed block. Candidates are tried in table order and the first one
//! whose shifted placement is clear wins.

use crate::board::Board;
use crate::tetromino::{CELL, HALF_CELL, Rotation, TetrominoType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Which side of the axis the candidate guards: `Neg` is left/top, `Pos` is right/floor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KickCandidate {
    pub dx: i32,
    pub dy: i32,
    pub axis: Axis,
    pub sign: Sign,
    pub offset: i32,
}

const fn left(dx: i32, dy: i32, offset: i32) -> KickCandidate {
    KickCandidate { dx, dy, axis: Axis::X, sign: Sign::Neg, offset }
}

const fn right(dx: i32, dy: i32, offset: i32) -> KickCandidate {
    KickCandidate { dx, dy, axis: Axis::X, sign: Sign::Pos, offset }
}

const fn down(dx: i32, dy: i32, offset: i32) -> KickCandidate {
    KickCandidate { dx, dy, axis: Axis::Y, sign: Sign::Pos, offset }
}

const fn up(dx: i32, dy: i32, offset: i32) -> KickCandidate {
    KickCandidate { dx, dy, axis: Axis::Y, sign: Sign::Neg, offset }
}

const C: i32 = CELL;

type KickRow = [&'static [KickCandidate]; 4];

const I_KICKS: KickRow = [
    &[left(-16, 0, 2 * C), left(-48, 0, C), right(16, 0, -2 * C), right(48, 0, -C)],
    &[down(16, C, -2 * C), down(16, 2 * C, -C), up(16, -C, C)],
    &[left(-16, C, 2 * C), left(-48, C, C), right(16, C, -2 * C), right(48, C, -C)],
    &[down(-16, C, -2 * C), down(-16, 2 * C, -C), up(-16, -C, C)],
];

const L_KICKS: KickRow = [
    &[left(-C, 0, C), right(C, -C, -C), right(C, 0, -C)],
    &[right(C, C, -C), down(0, C, -C), down(C, C, -C)],
    &[left(-C, 0, C), left(-C, C, C), right(C, 0, -C), down(-C, C, -C)],
    &[left(-C, -C, C), down(0, C, -C)],
];

const J_KICKS: KickRow = [
    &[left(-C, -C, C), left(-C, 0, C), right(C, 0, -C)],
    &[right(C, -C, -C), down(0, C, -C)],
    &[left(-C, 0, C), right(C, 0, -C), right(C, C, -C), down(C, C, -C)],
    &[left(-C, C, C), down(-C, C, -C), down(0, C, -C)],
];

const S_KICKS: KickRow = [
    &[left(-C, 0, C), right(C, -C, -C)],
    &[right(C, 0, -C), right(C, C, -C), down(C, C, -C)],
    &[left(-C, C, C), right(C, 0, -C), down(-C, C, -C), down(0, C, -C)],
    &[left(-C, -C, C), left(-C, 0, C), down(0, C, -C)],
];

const Z_KICKS: KickRow = [
    &[left(-C, -C, C), right(C, 0, -C)],
    &[right(C, -C, -C), right(C, 0, -C), down(0, C, -C)],
    &[left(-C, 0, C), right(C, C, -C), down(0, C, -C), down(C, C, -C)],
    &[left(-C, 0, C), left(-C, C, C), down(-C, C, -C)],
];

const T_KICKS: KickRow = [
    &[left(-C, 0, C), right(C, 0, -C)],
    &[right(C, 0, -C), down(0, C, -C)],
    &[left(-C, 0, C), right(C, 0, -C), down(0, C, -C)],
    &[left(-C, 0, C), down(0, C, -C)],
];

/// Kick candidates for rotating into `rotation`, in the order they are tried
pub fn kicks(piece_type: TetrominoType, rotation: Rotation) -> &'static [KickCandidate] {
    let r = rotation.index();
    match piece_type {
        TetrominoType::O => &[],
        TetrominoType::I => I_KICKS[r],
        TetrominoType::L => L_KICKS[r],
        TetrominoType::J => J_KICKS[r],
        TetrominoType::S => S_KICKS[r],
        TetrominoType::Z => Z_KICKS[r],
        TetrominoType::T => T_KICKS[r],
    }
}

impl KickCandidate {
    /// Whether the test point has crossed the bound this candidate guards
    fn crosses_wall(&self, x: i32, y: i32, board: &Board) -> bool {
        let bounds = board.bounds();
        match (self.axis, self.sign) {
            (Axis::X, Sign::Neg) => x - HALF_CELL < bounds.left,
            (Axis::X, Sign::Pos) => x + HALF_CELL > bounds.right,
            (Axis::Y, Sign::Neg) => y - HALF_CELL < bounds.top,
            (Axis::Y, Sign::Pos) => y + HALF_CELL > bounds.floor,
        }
    }

    fn shift(&self) -> (i32, i32) {
        match self.axis {
            Axis::X => (self.offset, 0),
            Axis::Y => (0, self.offset),
        }
    }
}

/// Find the shift that makes a rejected rotation fit.
///
/// `pivot` is the piece pivot and `rotation` the state being rotated into.
/// Returns `None` when no candidate applies or every applicable one still
/// collides.
pub fn resolve_kick(
    piece_type: TetrominoType,
    rotation: Rotation,
    pivot: (i32, i32),
    board: &Board,
) -> Option<(i32, i32)> {
    let shape = piece_type.shape(rotation);

    for (idx, kick) in kicks(piece_type, rotation).iter().enumerate() {
        let (tx, ty) = (pivot.0 + kick.dx, pivot.1 + kick.dy);

        let wall = kick.crosses_wall(tx, ty, board);
        if !wall && !board.overlaps(tx, ty) {
            continue;
        }

        let (sx, sy) = kick.shift();
        let cells = shape.map(|(dx, dy)| (pivot.0 + sx + dx, pivot.1 + sy + dy));
        if board.would_collide(&cells) {
            tracing::trace!(?piece_type, ?rotation, idx, wall, "kick rejected");
            continue;
        }

        tracing::trace!(?piece_type, ?rotation, idx, wall, sx, sy, "kick accepted");
        return Some((sx, sy));
    }

    None
}
