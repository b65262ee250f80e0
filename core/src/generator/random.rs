use rand::prelude::*;

use super::*;

/// Thread-local cryptographically secure generator, used by default.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn shuffle(&mut self, cells: &mut [Coord2]) {
        cells.shuffle(&mut rand::rng());
    }
}

/// Reproducible placement: the same seed and first click yield the same board.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    seed: u64,
    rng: SmallRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn shuffle(&mut self, cells: &mut [Coord2]) {
        cells.shuffle(&mut self.rng);
    }
}

/// Puts the listed cells first, in the listed order, and keeps the rest as is.
///
/// Not random at all: it pins an exact layout, e.g. to replay a known board.
/// Cells that are not candidates (out of bounds or next to the first click)
/// are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptedRandom {
    order: Vec<Coord2>,
}

impl ScriptedRandom {
    pub fn new(order: Vec<Coord2>) -> Self {
        Self { order }
    }
}

impl RandomSource for ScriptedRandom {
    fn shuffle(&mut self, cells: &mut [Coord2]) {
        cells.sort_by_key(|coords| {
            self.order
                .iter()
                .position(|wanted| wanted == coords)
                .unwrap_or(usize::MAX)
        });
    }
}
