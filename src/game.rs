//! Core game state and the piece assembly state machine

use crate::board::{Board, Bounds};
use crate::factory::{EntityId, ObjectFactory};
use crate::hold::{HoldOutcome, HoldSlot};
use crate::input::{InputFrame, InputSnapshot};
use crate::level::{LevelMap, WallTile, CLASSIC_LAYOUT};
use crate::piece::{Drive, FallingPiece};
use crate::queue::PieceQueue;
use crate::score::{Score, ScorePolicy};
use crate::settings::GameplaySettings;
use crate::tetromino::{CELL, TetrominoType};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Where the current piece is in its spawn, fall, land, clear cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssemblyState {
    Falling = 0,
    Landed = 1,
    LineFound = 2,
    Compacting = 3,
    ScreenFilled = 4,
    Spawning = 5,
}

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameState {
    Classic,
    GameOver,
}

/// The main game struct
pub struct Game {
    /// Landed blocks and the container
    board: Board,
    factory: ObjectFactory,
    /// Upcoming pieces
    queue: PieceQueue,
    hold: HoldSlot,
    /// Current falling piece
    active: Option<FallingPiece>,
    /// Score tracking
    score: Score,
    rules: GameplaySettings,
    walls: Vec<WallTile>,
    assembly: AssemblyState,
    state: GameState,
    /// Time banked towards the next gravity tick, in milliseconds
    accum_ms: f64,
    /// Time spent flashing the found rows
    remove_row_timer: f64,
    /// Full rows waiting to be cleared, keyed by row center y
    found_rows: BTreeMap<i32, Vec<EntityId>>,
    /// Next filler row during the game-over fill
    fill_cursor_y: i32,
    previous_input: InputSnapshot,
    soft_drop: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::with_seed(rand::random())
    }
}

impl Game {
    /// Create a game inside the container described by `level`, falling back
    /// to the classic container when the layout doesn't enclose one
    pub fn new(rules: GameplaySettings, level: &LevelMap, seed: u64) -> Self {
        let bounds = level.container().unwrap_or_else(|| {
            tracing::warn!("layout has no container, using the classic well");
            Bounds::default()
        });

        Self {
            board: Board::new(bounds),
            factory: ObjectFactory::new(),
            queue: PieceQueue::with_seed(seed),
            hold: HoldSlot::new(),
            active: None,
            score: Score::new(ScorePolicy::from(&rules)),
            rules,
            walls: level.tiles().to_vec(),
            assembly: AssemblyState::Spawning,
            state: GameState::Classic,
            accum_ms: 0.0,
            remove_row_timer: 0.0,
            found_rows: BTreeMap::new(),
            fill_cursor_y: bounds.bottom_row(),
            previous_input: InputSnapshot::default(),
            soft_drop: false,
        }
    }

    /// Classic rules and well with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        let level = LevelMap::parse(CLASSIC_LAYOUT, (128, 16));
        Self::new(GameplaySettings::default(), &level, seed)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<&FallingPiece> {
        self.active.as_ref()
    }

    pub fn hold_slot(&self) -> &HoldSlot {
        &self.hold
    }

    /// Get preview of next pieces
    pub fn preview(&self) -> Vec<TetrominoType> {
        self.queue.preview().collect()
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn walls(&self) -> &[WallTile] {
        &self.walls
    }

    pub fn assembly(&self) -> AssemblyState {
        self.assembly
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn found_rows(&self) -> impl Iterator<Item = i32> + '_ {
        self.found_rows.keys().copied()
    }

    /// Seed the best score, e.g. from the high-score file
    pub fn set_high_score(&mut self, high_score: u64) {
        self.score.high_score = self.score.high_score.max(high_score);
    }

    /// Start a fresh session. The high score is kept.
    pub fn restart(&mut self) {
        self.board.clear();
        self.hold.clear();
        self.active = None;
        self.queue.reset();
        self.score.reset();
        self.reset_assembly();
        self.previous_input = InputSnapshot::default();
        self.state = GameState::Classic;
        tracing::info!("game restarted");
    }

    /// Advance the simulation by one frame
    pub fn update(&mut self, delta: Duration, input: InputSnapshot) {
        let frame = InputFrame::between(self.previous_input, input);
        self.previous_input = input;

        if self.state != GameState::Classic {
            return;
        }

        let dt = delta.as_secs_f64() * 1000.0;
        match self.assembly {
            AssemblyState::Spawning => {
                self.spawn();
                if self.assembly == AssemblyState::Falling {
                    self.accum_ms += dt;
                }
            }
            AssemblyState::Falling | AssemblyState::Landed => self.step_gravity(&frame, dt),
            AssemblyState::LineFound => self.flash_rows(dt),
            AssemblyState::Compacting => self.compact(),
            AssemblyState::ScreenFilled => self.fill_screen(),
        }

        self.sweep();
    }

    fn set_assembly(&mut self, next: AssemblyState) {
        if self.assembly != next {
            tracing::debug!(from = ?self.assembly, to = ?next, "assembly state");
            self.assembly = next;
        }
    }

    fn current_period(&self) -> f64 {
        let soft = self.soft_drop && self.assembly == AssemblyState::Falling;
        self.score.effective_period(soft).max(1.0)
    }

    fn step_gravity(&mut self, frame: &InputFrame, dt: f64) {
        if self.assembly == AssemblyState::Falling {
            if frame.pressed.hold {
                self.hold();
                if self.assembly != AssemblyState::Falling {
                    return;
                }
            }

            let soft_drop = frame.held.down && !frame.held.hard_drop;
            if soft_drop && !self.soft_drop {
                // Time banked under the slower period doesn't carry over
                self.soft_drop = true;
                self.accum_ms = self.accum_ms.min(self.current_period());
            }
            self.soft_drop = soft_drop;

            if let Some(piece) = self.active.as_mut() {
                let outcome = piece.update(frame, &self.board, self.rules.lateral_delay_frames);
                if outcome.hard_dropped.is_some() {
                    // Land on this frame's tick
                    self.accum_ms = self.accum_ms.max(self.current_period());
                }
            }
        }

        self.accum_ms += dt;
        loop {
            let period = self.current_period();
            if self.accum_ms < period {
                break;
            }
            self.accum_ms -= period;

            match self.assembly {
                AssemblyState::Falling => self.drive_active(),
                AssemblyState::Landed => self.scan_landed(),
                _ => break,
            }
        }
    }

    fn hold(&mut self) {
        let Some(current) = self.active.take() else {
            return;
        };

        match self.hold.exchange(current, &self.board) {
            HoldOutcome::Stored => self.set_assembly(AssemblyState::Spawning),
            HoldOutcome::Swapped(piece) | HoldOutcome::Blocked(piece) => self.active = Some(piece),
        }
    }

    fn drive_active(&mut self) {
        let Some(piece) = self.active.as_mut() else {
            self.set_assembly(AssemblyState::Spawning);
            return;
        };

        if let Drive::Landed(blocks) = piece.drive(&self.board) {
            tracing::debug!(kind = ?piece.kind, x = piece.x, y = piece.y, "piece landed");
            for block in blocks {
                self.board.insert(block);
            }
            self.soft_drop = false;
            self.set_assembly(AssemblyState::Landed);
        }
    }

    fn scan_landed(&mut self) {
        let bounds = self.board.bounds();
        if self.board.landed().any(|b| b.y <= bounds.top_row()) {
            self.top_out();
            return;
        }

        let rows = self.board.rows_with_count(bounds.columns());
        if rows.is_empty() {
            self.set_assembly(AssemblyState::Spawning);
        } else {
            tracing::debug!(rows = ?rows.keys().collect::<Vec<_>>(), "full rows found");
            self.found_rows = rows;
            self.remove_row_timer = 0.0;
            self.set_assembly(AssemblyState::LineFound);
        }
    }

    fn flash_rows(&mut self, dt: f64) {
        self.remove_row_timer += dt;

        let grey = if self.remove_row_timer < self.rules.row_clear_ms {
            let period = self.rules.flash_period_ms;
            period > 0.0 && self.remove_row_timer % period < period / 2.0
        } else {
            self.set_assembly(AssemblyState::Compacting);
            false
        };

        for ids in self.found_rows.values() {
            self.board.set_flashing(ids, grey);
        }
    }

    fn compact(&mut self) {
        // Top row first, so rows below keep their recorded positions
        for (y, ids) in std::mem::take(&mut self.found_rows) {
            self.board.mark_for_deletion(&ids);
            self.board.shift_rows_above(y, CELL);
            self.score.credit_row();
        }
        tracing::debug!(
            points = self.score.points,
            rows = self.score.rows_cleared,
            "rows cleared"
        );

        self.remove_row_timer = 0.0;
        self.set_assembly(AssemblyState::Spawning);
    }

    fn spawn(&mut self) {
        let kind = self.queue.pop();
        let bounds = self.board.bounds();
        let (x, y) = kind.spawn_position(bounds.left, bounds.top);
        let mut piece = self.factory.create_piece(x, y, kind);

        if self.board.would_collide(&piece.cells()) {
            tracing::info!(?kind, "no room to spawn");
            self.top_out();
            return;
        }

        tracing::debug!(?kind, x, y, "spawned piece");
        piece.refresh_contacts(&self.board);
        self.active = Some(piece);
        self.set_assembly(AssemblyState::Falling);
    }

    fn top_out(&mut self) {
        tracing::info!(points = self.score.points, "stack reached the top");
        self.active = None;
        self.board.grey_out();
        self.fill_cursor_y = self.board.bounds().bottom_row();
        self.set_assembly(AssemblyState::ScreenFilled);
    }

    fn fill_screen(&mut self) {
        let bounds = self.board.bounds();
        for _ in 0..self.rules.fill_rows_per_tick.max(1) {
            if self.fill_cursor_y < bounds.top {
                break;
            }
            for block in self.factory.create_filler_row(self.fill_cursor_y, &bounds) {
                self.board.insert(block);
            }
            self.fill_cursor_y -= CELL;
        }

        if self.fill_cursor_y < bounds.top {
            tracing::info!(
                points = self.score.points,
                high_score = self.score.high_score,
                "game over"
            );
            self.state = GameState::GameOver;
            self.reset_assembly();
        }
    }

    fn reset_assembly(&mut self) {
        self.assembly = AssemblyState::Spawning;
        self.accum_ms = 0.0;
        self.remove_row_timer = 0.0;
        self.found_rows.clear();
        self.fill_cursor_y = self.board.bounds().bottom_row();
        self.soft_drop = false;
        self.score.reset_period();
    }

    /// Deferred deletion: drop everything marked during this frame
    fn sweep(&mut self) {
        if self.active.as_ref().is_some_and(|p| p.is_marked_for_deletion()) {
            self.active = None;
        }
        self.board.sweep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::input::Control;

    const SECOND: Duration = Duration::from_millis(1000);
    const IDLE: InputSnapshot = InputSnapshot {
        left: false,
        right: false,
        down: false,
        rotate: false,
        hard_drop: false,
        hold: false,
    };

    fn spawned() -> Game {
        let mut game = Game::with_seed(11);
        game.update(Duration::ZERO, IDLE);
        game
    }

    fn fill_row(game: &mut Game, y: i32, skip: Option<i32>) {
        let bounds = game.board.bounds();
        for x in bounds.column_centers() {
            if Some(x) != skip {
                let block = game.factory.create_filler_row_block(x, y);
                game.board.insert(block);
            }
        }
    }

    fn pivot(game: &Game) -> Option<(i32, i32)> {
        game.active().map(|p| (p.x, p.y))
    }

    #[test]
    fn test_first_update_spawns() {
        let mut game = Game::with_seed(3);
        assert_eq!(game.assembly(), AssemblyState::Spawning);
        let next = game.preview()[0];

        game.update(Duration::ZERO, IDLE);
        assert_eq!(game.assembly(), AssemblyState::Falling);
        let piece = game.active().map(|p| p.kind);
        assert_eq!(piece, Some(next));
        assert_eq!(pivot(&game), Some(next.spawn_position(160, 16)));
        assert_eq!(game.preview().len(), 4);
    }

    #[test]
    fn test_gravity_one_cell_per_period() {
        let mut game = spawned();
        let (x, y) = pivot(&game).unwrap();

        game.update(Duration::from_millis(600), IDLE);
        assert_eq!(pivot(&game), Some((x, y)));
        game.update(Duration::from_millis(400), IDLE);
        assert_eq!(pivot(&game), Some((x, y + CELL)));
    }

    #[test]
    fn test_large_delta_runs_several_ticks() {
        let mut game = spawned();
        let (x, y) = pivot(&game).unwrap();
        game.update(3 * SECOND, IDLE);
        assert_eq!(pivot(&game), Some((x, y + 3 * CELL)));
    }

    #[test]
    fn test_soft_drop_uses_min_period() {
        let mut game = spawned();
        let (x, y) = pivot(&game).unwrap();
        let down = IDLE.with(Control::Down);

        game.update(Duration::from_millis(50), down);
        assert_eq!(pivot(&game), Some((x, y + CELL)));

        // Hard drop held too: back to the normal period
        let both = down.with(Control::HardDrop);
        game.previous_input = both;
        game.update(Duration::from_millis(50), both);
        assert_eq!(pivot(&game), Some((x, y + CELL)));
    }

    #[test]
    fn test_soft_drop_after_idle_moves_one_cell() {
        let mut game = spawned();
        let (x, y) = pivot(&game).unwrap();

        game.update(Duration::from_millis(900), IDLE);
        assert_eq!(pivot(&game), Some((x, y)));
        game.update(Duration::from_millis(16), IDLE.with(Control::Down));
        assert_eq!(pivot(&game), Some((x, y + CELL)));
        game.update(Duration::from_millis(16), IDLE.with(Control::Down));
        assert_eq!(pivot(&game), Some((x, y + CELL)));
    }

    #[test]
    fn test_spawn_frame_counts_towards_gravity() {
        let mut game = Game::with_seed(11);
        game.update(Duration::from_millis(400), IDLE);
        let (x, y) = pivot(&game).unwrap();

        game.update(Duration::from_millis(600), IDLE);
        assert_eq!(pivot(&game), Some((x, y + CELL)));
    }

    #[test]
    fn test_hard_drop_lands_then_respawns() {
        let mut game = spawned();
        let kind = game.active().map(|p| p.kind).unwrap();

        game.update(Duration::from_millis(16), IDLE.with(Control::HardDrop));
        assert_eq!(game.assembly(), AssemblyState::Landed);
        assert!(game.active().is_none());
        assert_eq!(game.board().len(), 4);
        assert!(game.board().landed().all(|b| b.kind == BlockKind::Piece(kind)));
        assert_eq!(game.board().landed().map(|b| b.y).max(), Some(768));

        game.update(SECOND, IDLE);
        assert_eq!(game.assembly(), AssemblyState::Spawning);
        game.update(Duration::ZERO, IDLE);
        assert_eq!(game.assembly(), AssemblyState::Falling);
    }

    #[test]
    fn test_line_clear_cycle() {
        let mut game = spawned();
        game.active = None;
        fill_row(&mut game, 768, None);
        let extra = game.factory.create_filler_row_block(176, 736);
        game.board.insert(extra);
        game.assembly = AssemblyState::Landed;

        game.update(SECOND, IDLE);
        assert_eq!(game.assembly(), AssemblyState::LineFound);
        assert_eq!(game.found_rows().collect::<Vec<_>>(), vec![768]);

        game.update(Duration::from_millis(100), IDLE);
        assert!(game.board().landed().filter(|b| b.y == 768).all(|b| b.flashing));
        game.update(Duration::from_millis(50), IDLE);
        assert!(game.board().landed().all(|b| !b.flashing));

        game.update(Duration::from_millis(350), IDLE);
        assert_eq!(game.assembly(), AssemblyState::Compacting);

        game.update(Duration::ZERO, IDLE);
        assert_eq!(game.assembly(), AssemblyState::Spawning);
        assert_eq!(game.board().len(), 1);
        assert!(game.board().is_occupied(176, 768));
        assert_eq!(game.score().points, 40);
        assert_eq!(game.score().rows_cleared, 1);
    }

    #[test]
    fn test_two_o_pieces_complete_a_row() {
        let mut game = spawned();
        game.active = None;
        // Two O pieces side by side at the bottom left
        for x in [176, 208, 240, 272] {
            for y in [736, 768] {
                let block = game.factory.create_filler_row_block(x, y);
                game.board.insert(block);
            }
        }
        for x in [304, 336, 368, 400, 432, 464] {
            let block = game.factory.create_filler_row_block(x, 736);
            game.board.insert(block);
        }
        assert_eq!(game.board().rows_with_count(10).len(), 1);

        game.assembly = AssemblyState::Landed;
        game.update(SECOND, IDLE);
        assert_eq!(game.assembly(), AssemblyState::LineFound);
        assert_eq!(game.found_rows().collect::<Vec<_>>(), vec![736]);
    }

    #[test]
    fn test_each_row_credited_once() {
        let mut game = spawned();
        game.active = None;
        fill_row(&mut game, 704, None);
        fill_row(&mut game, 736, Some(304));
        fill_row(&mut game, 768, None);
        game.assembly = AssemblyState::Landed;

        game.update(SECOND, IDLE);
        game.update(SECOND, IDLE);
        game.update(Duration::ZERO, IDLE);
        assert_eq!(game.assembly(), AssemblyState::Spawning);
        assert_eq!(game.score().points, 80);
        assert_eq!(game.score().rows_cleared, 2);
        // The partial row drops to the floor
        assert_eq!(game.board().len(), 9);
        assert!(game.board().landed().all(|b| b.y == 768));
        assert!(!game.board().is_occupied(304, 768));
    }

    #[test]
    fn test_top_out_fills_screen_then_game_over() {
        let mut game = spawned();
        game.active = None;
        let block = game.factory.create_filler_row_block(304, 32);
        game.board.insert(block);
        game.assembly = AssemblyState::Landed;

        game.update(SECOND, IDLE);
        assert_eq!(game.assembly(), AssemblyState::ScreenFilled);
        assert!(game.board().is_empty());

        for _ in 0..11 {
            game.update(Duration::from_millis(16), IDLE);
            assert_eq!(game.state(), GameState::Classic);
        }
        game.update(Duration::from_millis(16), IDLE);
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.assembly(), AssemblyState::Spawning);
        assert_eq!(game.board().len(), 240);
        assert!(game.board().landed().all(|b| b.kind == BlockKind::Grey));

        // Frozen until restarted
        game.update(SECOND, IDLE);
        assert_eq!(game.state(), GameState::GameOver);
    }

    #[test]
    fn test_zero_fill_rate_still_ends_game() {
        let mut game = spawned();
        game.rules.fill_rows_per_tick = 0;
        game.active = None;
        let block = game.factory.create_filler_row_block(304, 32);
        game.board.insert(block);
        game.assembly = AssemblyState::Landed;

        game.update(SECOND, IDLE);
        assert_eq!(game.assembly(), AssemblyState::ScreenFilled);
        for _ in 0..24 {
            game.update(Duration::from_millis(16), IDLE);
        }
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.board().len(), 240);
    }

    #[test]
    fn test_blocked_spawn_tops_out() {
        let mut game = Game::with_seed(5);
        for (x, y) in [(304, 32), (336, 32), (304, 64)] {
            let block = game.factory.create_filler_row_block(x, y);
            game.board.insert(block);
        }
        game.update(Duration::ZERO, IDLE);
        assert_eq!(game.assembly(), AssemblyState::ScreenFilled);
        assert!(game.active().is_none());
    }

    #[test]
    fn test_hold_then_swap() {
        let mut game = spawned();
        let first = game.active().map(|p| p.kind).unwrap();

        game.update(Duration::ZERO, IDLE.with(Control::Hold));
        assert_eq!(game.assembly(), AssemblyState::Spawning);
        assert_eq!(game.hold_slot().held_kind(), Some(first));

        game.update(Duration::ZERO, IDLE);
        let second = game.active().map(|p| p.kind).unwrap();

        // Holding the key doesn't repeat
        game.update(Duration::ZERO, IDLE.with(Control::Hold));
        assert_eq!(game.active().map(|p| p.kind), Some(first));
        assert_eq!(game.hold_slot().held_kind(), Some(second));
        game.update(Duration::ZERO, IDLE.with(Control::Hold));
        assert_eq!(game.active().map(|p| p.kind), Some(first));
        assert_eq!(game.hold_slot().held_kind(), Some(second));
    }

    #[test]
    fn test_restart_keeps_high_score() {
        let mut game = spawned();
        game.set_high_score(1200);
        game.update(Duration::from_millis(16), IDLE.with(Control::HardDrop));
        game.restart();

        assert_eq!(game.state(), GameState::Classic);
        assert_eq!(game.assembly(), AssemblyState::Spawning);
        assert!(game.board().is_empty());
        assert!(game.active().is_none());
        assert_eq!(game.hold_slot().held_kind(), None);
        assert_eq!(game.score().points, 0);
        assert_eq!(game.score().high_score, 1200);
    }

    #[test]
    fn test_active_blocks_follow_pivot() {
        let mut game = spawned();
        let inputs = [
            IDLE.with(Control::Left),
            IDLE,
            IDLE.with(Control::Rotate),
            IDLE.with(Control::Right),
            IDLE.with(Control::Rotate),
            IDLE,
        ];
        for input in inputs {
            game.update(Duration::from_millis(16), input);
            if let Some(piece) = game.active() {
                let blocks: Vec<(i32, i32)> = piece.blocks().iter().map(|b| (b.x, b.y)).collect();
                assert_eq!(blocks, piece.cells().to_vec());
            }
        }
    }
}
