//! RNG module - 7-bag random piece generation
//!
//! Implements the "7-bag" randomization algorithm: each bag contains one of each
//! piece (I, O, T, S, Z, J, L), shuffled. Draws from the bag until empty, then
//! generates a new bag.
//!
//! The shuffle source is any seedable `rand` generator; the default is
//! `ChaCha8Rng`, which gives the same sequence for the same seed on every platform.

use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::PieceKind;

/// Number of pieces in one bag
pub const BAG_SIZE: usize = PieceKind::ALL.len();

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct PieceQueue<R = ChaCha8Rng> {
    /// Pieces left in the current bag, next piece last
    bag: ArrayVec<PieceKind, BAG_SIZE>,
    /// RNG for shuffling
    rng: R,
}

impl PieceQueue<ChaCha8Rng> {
    /// Create a new piece queue with the given seed
    pub fn new(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore + Clone> PieceQueue<R> {
    /// Create a queue that shuffles with the given generator
    pub fn with_rng(rng: R) -> Self {
        let mut queue = Self {
            bag: ArrayVec::new(),
            rng,
        };
        queue.refill_bag();
        queue
    }

    fn shuffled_bag(rng: &mut R) -> ArrayVec<PieceKind, BAG_SIZE> {
        let mut bag: ArrayVec<PieceKind, BAG_SIZE> = PieceKind::ALL.into_iter().collect();
        bag.shuffle(rng);
        bag
    }

    /// Generate a new shuffled bag
    fn refill_bag(&mut self) {
        self.bag = Self::shuffled_bag(&mut self.rng);
    }

    /// Peek at the next piece without removing it
    ///
    /// When the current bag is empty the next bag is previewed with a clone of the
    /// generator, so the preview always matches the following `draw()`.
    pub fn peek(&self) -> PieceKind {
        if let Some(&kind) = self.bag.last() {
            return kind;
        }
        let mut preview_rng = self.rng.clone();
        let next_bag = Self::shuffled_bag(&mut preview_rng);
        next_bag[next_bag.len() - 1]
    }

    /// Draw the next piece from the queue
    pub fn draw(&mut self) -> PieceKind {
        if self.bag.is_empty() {
            self.refill_bag();
        }
        // A freshly refilled bag always holds BAG_SIZE pieces.
        self.bag.pop().unwrap_or(PieceKind::I)
    }

    /// Pieces left in the current bag before a refill
    pub fn remaining(&self) -> usize {
        self.bag.len()
    }

    /// Throw away the rest of the current bag; the next draw starts a new one
    pub fn reset(&mut self) {
        self.bag.clear();
    }
}

impl Default for PieceQueue {
    fn default() -> Self {
        Self::new(1)
    }
}
