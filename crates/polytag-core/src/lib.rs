pub mod player;
pub mod powerup;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::player::Intent;

    /// No movement, no jump.
    pub fn idle() -> Intent {
        Intent::default()
    }

    /// Hold left.
    pub fn left() -> Intent {
        Intent::new(-1, false)
    }

    /// Hold right.
    pub fn right() -> Intent {
        Intent::new(1, false)
    }

    /// Jump in place.
    pub fn jump() -> Intent {
        Intent::new(0, true)
    }

    /// The same intent for both players.
    pub fn both(intent: Intent) -> [Intent; 2] {
        [intent, intent]
    }

    /// `n` ticks of the given per-player intents.
    pub fn script(intents: [Intent; 2], n: usize) -> Vec<[Intent; 2]> {
        vec![intents; n]
    }
}
