use serde::{Deserialize, Serialize};

/// One of the two players in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    /// Both players in arena order.
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// The other player.
    pub fn opponent(self) -> PlayerId {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// Stable slot index, usable to address per-player arrays.
    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerId::One => write!(f, "player 1"),
            PlayerId::Two => write!(f, "player 2"),
        }
    }
}

/// Movement intent produced by the input layer for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// -1 (left), 0, +1 (right).
    pub move_dir: i8,
    pub jump: bool,
}

impl Intent {
    pub fn new(move_dir: i8, jump: bool) -> Self {
        Self { move_dir, jump }
    }

    /// Horizontal direction clamped to -1, 0 or +1.
    pub fn direction(&self) -> i32 {
        i32::from(self.move_dir.signum())
    }
}
