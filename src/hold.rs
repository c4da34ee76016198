//! Hold slot: parks the active piece and swaps it back later

use crate::board::Board;
use crate::piece::FallingPiece;
use crate::tetromino::{SpawnClass, TetrominoType};

/// Pivot delta applied when a piece of class `[from]` hands its place to a
/// piece of class `[to]`. Classes are indexed O, I, Default.
const SWAP_DELTAS: [[(i32, i32); 3]; 3] = [
    [(0, 0), (0, -16), (-16, 16)],
    [(0, 16), (0, 0), (-16, 32)],
    [(16, -16), (16, -32), (0, 0)],
];

fn swap_delta(from: SpawnClass, to: SpawnClass) -> (i32, i32) {
    SWAP_DELTAS[from.index()][to.index()]
}

/// What happened to a hold request
#[derive(Debug)]
pub enum HoldOutcome {
    /// The slot was empty; the piece is parked and a fresh one must spawn
    Stored,
    /// The parked piece took over; this is the new active piece
    Swapped(FallingPiece),
    /// The parked piece doesn't fit where the active one is; nothing changed
    Blocked(FallingPiece),
}

#[derive(Debug, Clone, Default)]
pub struct HoldSlot {
    cached: Option<FallingPiece>,
}

impl HoldSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held_kind(&self) -> Option<TetrominoType> {
        self.cached.as_ref().map(|p| p.kind)
    }

    pub fn cached(&self) -> Option<&FallingPiece> {
        self.cached.as_ref()
    }

    pub fn clear(&mut self) {
        self.cached = None;
    }

    /// Park `current`, swapping in the cached piece if there is one.
    ///
    /// The cached piece keeps its rotation and is re-aligned onto the
    /// current pivot. If it would collide there the swap is abandoned and
    /// `current` comes back untouched.
    pub fn exchange(&mut self, mut current: FallingPiece, board: &Board) -> HoldOutcome {
        let Some(mut cached) = self.cached.take() else {
            current.deactivate();
            tracing::debug!(kind = ?current.kind, "piece stored in hold");
            self.cached = Some(current);
            return HoldOutcome::Stored;
        };

        let (dx, dy) = swap_delta(current.kind.spawn_class(), cached.kind.spawn_class());
        let (x, y) = (current.x + dx, current.y + dy);

        if board.would_collide(&cached.cells_at(x, y, cached.rotation)) {
            tracing::debug!(held = ?cached.kind, active = ?current.kind, "swap blocked");
            self.cached = Some(cached);
            return HoldOutcome::Blocked(current);
        }

        cached.relocate(x, y);
        cached.activate(board);
        current.deactivate();
        tracing::debug!(held = ?current.kind, active = ?cached.kind, "pieces swapped");
        self.cached = Some(current);
        HoldOutcome::Swapped(cached)
    }
}
