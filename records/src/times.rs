use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sweeper_core::{Completion, Difficulty};

/// Fastest win seen for each difficulty, in milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BestTimes {
    times: BTreeMap<Difficulty, u64>,
}

impl BestTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `completion` if it beats the current best. Returns whether it did.
    pub fn record(&mut self, completion: Completion) -> bool {
        let Completion {
            difficulty,
            elapsed_ms,
        } = completion;

        match self.times.get(&difficulty) {
            Some(&best) if best <= elapsed_ms => false,
            previous => {
                log::debug!(
                    "New best for {}: {} ms (was {:?})",
                    difficulty,
                    elapsed_ms,
                    previous
                );
                self.times.insert(difficulty, elapsed_ms);
                true
            }
        }
    }

    /// Best time in whole seconds, rounded down.
    pub fn best_time(&self, difficulty: Difficulty) -> Option<u64> {
        self.best_time_ms(difficulty).map(|ms| ms / 1000)
    }

    pub fn best_time_ms(&self, difficulty: Difficulty) -> Option<u64> {
        self.times.get(&difficulty).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Difficulty, u64)> + '_ {
        self.times.iter().map(|(&difficulty, &ms)| (difficulty, ms))
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn reset_all(&mut self) {
        self.times.clear();
    }
}
