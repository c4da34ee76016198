//! Invariants that must hold for any input sequence: active blocks follow
//! their pivot, landed cells never overlap, and row scans are stable.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;
use tetronimo::input::{Control, InputSnapshot};
use tetronimo::{AssemblyState, Game, GameState};

fn snapshot_from_bits(bits: u8) -> InputSnapshot {
    let mut input = InputSnapshot::default();
    for (i, control) in Control::all().into_iter().enumerate() {
        input.set(control, bits & (1 << i) != 0);
    }
    input
}

fn assert_invariants(game: &Game) -> Result<(), TestCaseError> {
    if let Some(piece) = game.active() {
        let blocks: Vec<(i32, i32)> = piece.blocks().iter().map(|b| (b.x, b.y)).collect();
        prop_assert_eq!(blocks, piece.cells().to_vec());
    }

    let board = game.board();
    let bounds = board.bounds();
    let mut seen = HashSet::new();
    for block in board.landed() {
        prop_assert!(seen.insert((block.x, block.y)), "duplicate landed cell {:?}", (block.x, block.y));
        prop_assert!(block.x > bounds.left && block.x < bounds.right);
        prop_assert!(block.y <= bounds.bottom_row());
        prop_assert!(block.owner.is_none());
    }

    let columns = bounds.columns();
    prop_assert_eq!(board.rows_with_count(columns), board.rows_with_count(columns));
    Ok(())
}

#[test]
fn idle_game_tops_out_and_stops() {
    let mut game = Game::with_seed(20261018);
    for _ in 0..20_000 {
        if game.state() == GameState::GameOver {
            break;
        }
        game.update(Duration::from_millis(100), InputSnapshot::default());
        assert_invariants(&game).unwrap();
    }
    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(game.assembly(), AssemblyState::Spawning);
    assert_eq!(game.score().points, 0);
}

proptest! {
    #[test]
    fn random_inputs_keep_engine_invariants(
        seed in any::<u64>(),
        frames in prop::collection::vec((0u8..64, 0u64..250), 1..400),
    ) {
        let mut game = Game::with_seed(seed);
        let mut points = 0;
        let mut rows = 0;

        for (bits, ms) in frames {
            game.update(Duration::from_millis(ms), snapshot_from_bits(bits));
            assert_invariants(&game)?;

            prop_assert!(game.score().points >= points);
            prop_assert!(game.score().rows_cleared >= rows);
            prop_assert_eq!(game.score().points, 40 * u64::from(game.score().rows_cleared));
            points = game.score().points;
            rows = game.score().rows_cleared;

            if game.state() == GameState::GameOver {
                break;
            }
        }
    }

    #[test]
    fn hard_drops_always_land_in_bounds(seed in any::<u64>(), moves in prop::collection::vec(0u8..4, 1..60)) {
        let mut game = Game::with_seed(seed);
        for step in moves {
            let lateral = match step {
                0 => InputSnapshot::default().with(Control::Left),
                1 => InputSnapshot::default().with(Control::Right),
                2 => InputSnapshot::default().with(Control::Rotate),
                _ => InputSnapshot::default(),
            };
            game.update(Duration::from_millis(16), lateral);
            game.update(Duration::from_millis(16), InputSnapshot::default().with(Control::HardDrop));
            game.update(Duration::from_millis(16), InputSnapshot::default());
            assert_invariants(&game)?;
            if game.state() == GameState::GameOver {
                break;
            }
        }
    }
}
