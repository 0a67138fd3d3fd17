use serde::{Deserialize, Serialize};

use polytag_core::player::PlayerId;
use polytag_core::time::ticks_to_secs;

/// Elapsed-time tracking for one round, counted in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundClock {
    elapsed_ticks: u64,
    duration_ticks: u64,
}

impl RoundClock {
    pub fn new(duration_ticks: u64) -> Self {
        Self {
            elapsed_ticks: 0,
            duration_ticks,
        }
    }

    /// Advance one tick. Returns `true` once the duration has been reached.
    pub fn tick(&mut self) -> bool {
        if !self.is_over() {
            self.elapsed_ticks += 1;
        }
        self.is_over()
    }

    pub fn is_over(&self) -> bool {
        self.elapsed_ticks >= self.duration_ticks
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn elapsed_secs(&self, tick_rate: f32) -> f32 {
        ticks_to_secs(self.elapsed_ticks, tick_rate)
    }

    pub fn remaining_ticks(&self) -> u64 {
        self.duration_ticks.saturating_sub(self.elapsed_ticks)
    }
}

/// Final outcome: whoever is not "it" when time runs out wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub winner: PlayerId,
    pub loser: PlayerId,
}

impl RoundResult {
    pub fn from_tagger(tagger: PlayerId) -> Self {
        Self {
            winner: tagger.opponent(),
            loser: tagger,
        }
    }
}
