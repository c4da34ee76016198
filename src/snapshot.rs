//! Read-only view of a game for renderers

use crate::block::BlockKind;
use crate::board::Bounds;
use crate::game::{AssemblyState, Game, GameState};
use crate::level::WallTile;
use crate::tetromino::{Rotation, TetrominoType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieceView {
    pub kind: TetrominoType,
    pub rotation: Rotation,
    pub pivot: (i32, i32),
    pub cells: [(i32, i32); 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    pub x: i32,
    pub y: i32,
    pub kind: BlockKind,
    pub flashing: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub assembly: AssemblyState,
    pub state: GameState,
    pub bounds: Bounds,
    pub active: Option<PieceView>,
    pub hold: Option<TetrominoType>,
    pub next: Vec<TetrominoType>,
    pub landed: Vec<BlockView>,
    pub walls: Vec<WallTile>,
    pub score: u64,
    pub high_score: u64,
    pub rows_cleared: u32,
    /// Gravity period in milliseconds
    pub fall_period: f64,
}

impl GameSnapshot {
    pub fn capture(game: &Game) -> Self {
        let score = game.score();
        Self {
            assembly: game.assembly(),
            state: game.state(),
            bounds: game.board().bounds(),
            active: game.active().map(|p| PieceView {
                kind: p.kind,
                rotation: p.rotation,
                pivot: (p.x, p.y),
                cells: p.cells(),
            }),
            hold: game.hold_slot().held_kind(),
            next: game.preview(),
            landed: game
                .board()
                .landed()
                .map(|b| BlockView {
                    x: b.x,
                    y: b.y,
                    kind: b.kind,
                    flashing: b.flashing,
                })
                .collect(),
            walls: game.walls().to_vec(),
            score: score.points,
            high_score: score.high_score,
            rows_cleared: score.rows_cleared,
            fall_period: score.fall_period,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Control, InputSnapshot};
    use std::time::Duration;

    #[test]
    fn test_capture_after_spawn() {
        let mut game = Game::with_seed(8);
        game.update(Duration::ZERO, InputSnapshot::default());
        let snapshot = GameSnapshot::capture(&game);

        assert_eq!(snapshot.assembly, AssemblyState::Falling);
        assert_eq!(snapshot.state, GameState::Classic);
        assert_eq!(snapshot.next.len(), 4);
        assert!(snapshot.landed.is_empty());
        assert_eq!(snapshot.walls.len(), 60);
        assert_eq!(snapshot.fall_period, 1000.0);

        let active = snapshot.active.as_ref().map(|p| p.cells);
        assert_eq!(active, game.active().map(|p| p.cells()));
    }

    #[test]
    fn test_landed_blocks_and_json() {
        let mut game = Game::with_seed(8);
        game.update(Duration::ZERO, InputSnapshot::default());
        game.update(
            Duration::from_millis(16),
            InputSnapshot::default().with(Control::HardDrop),
        );
        let snapshot = GameSnapshot::capture(&game);
        assert!(snapshot.active.is_none());
        assert_eq!(snapshot.landed.len(), 4);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"assembly\":\"Landed\""));
        assert!(json.contains("\"state\":\"Classic\""));
    }
}
