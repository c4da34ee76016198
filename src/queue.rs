//! Lookahead queue of upcoming pieces
//!
//! Uniform random draw per pop, no bag. The generator is seeded once when
//! the queue is built so a seed reproduces the whole piece sequence.

use crate::tetromino::TetrominoType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Number of upcoming pieces kept ready
pub const DEPTH: usize = 4;

#[derive(Debug, Clone)]
pub struct PieceQueue {
    rng: ChaCha8Rng,
    upcoming: VecDeque<TetrominoType>,
}

impl PieceQueue {
    pub fn with_seed(seed: u64) -> Self {
        let mut queue = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            upcoming: VecDeque::with_capacity(DEPTH + 1),
        };
        queue.refill();
        queue
    }

    /// Take the next piece and append a fresh random one
    pub fn pop(&mut self) -> TetrominoType {
        let roll = self.roll();
        self.upcoming.push_back(roll);
        self.upcoming.pop_front().unwrap_or(roll)
    }

    /// Upcoming pieces, next first
    pub fn preview(&self) -> impl Iterator<Item = TetrominoType> + '_ {
        self.upcoming.iter().copied()
    }

    /// Discard the lookahead and draw a new one from the same generator
    pub fn reset(&mut self) {
        self.upcoming.clear();
        self.refill();
    }

    fn refill(&mut self) {
        while self.upcoming.len() < DEPTH {
            let roll = self.roll();
            self.upcoming.push_back(roll);
        }
    }

    fn roll(&mut self) -> TetrominoType {
        TetrominoType::from_index(self.rng.gen_range(0..7))
    }
}
