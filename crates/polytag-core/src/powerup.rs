use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::player::PlayerId;

/// Trait for game-specific power-up kind enums.
pub trait PowerUpKind: Clone + Copy + PartialEq + Serialize + DeserializeOwned {
    /// Reference duration in seconds for this power-up.
    fn duration_secs(&self) -> f32;
}

/// A power-up currently affecting play, counted down in whole ticks.
///
/// The timer never holds zero while alive: construction clamps to one tick,
/// and `tick` reports expiry on the transition to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ActivePowerUp<K: PowerUpKind> {
    pub kind: K,
    /// Player who picked the power-up up.
    pub owner: PlayerId,
    pub remaining_ticks: u32,
}

impl<K: PowerUpKind> ActivePowerUp<K> {
    pub fn new(kind: K, owner: PlayerId, duration_ticks: u32) -> Self {
        Self {
            kind,
            owner,
            remaining_ticks: duration_ticks.max(1),
        }
    }

    /// Count down one tick. Returns `true` on the tick the timer runs out.
    pub fn tick(&mut self) -> bool {
        if self.remaining_ticks == 0 {
            return false;
        }
        self.remaining_ticks -= 1;
        self.remaining_ticks == 0
    }

    /// Restart the countdown without changing kind or owner.
    pub fn refresh(&mut self, duration_ticks: u32) {
        self.remaining_ticks = duration_ticks.max(1);
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ticks == 0
    }
}
