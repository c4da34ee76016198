//! tetronimo - a classic-mode Tetris engine
//!
//! A fixed-timestep simulation: pieces spawn, fall, kick off walls and
//! stacks on rotation, land, clear full rows and eventually fill the well.
//! The terminal front end lives in the binary.

pub mod block;
pub mod board;
pub mod factory;
pub mod game;
pub mod highscore;
pub mod hold;
pub mod input;
pub mod level;
pub mod piece;
pub mod queue;
pub mod score;
pub mod settings;
pub mod snapshot;
pub mod srs;
pub mod tetromino;

pub use game::{AssemblyState, Game, GameState};
pub use input::InputSnapshot;
pub use snapshot::GameSnapshot;
