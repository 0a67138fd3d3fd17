use serde::{Deserialize, Serialize};

use polytag_core::player::PlayerId;

use crate::buffs::BuffKind;
use crate::geometry::Point;

/// Notable things that happened during one tick, in the order they happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BuffSpawned { kind: BuffKind, at: Point },
    BuffPickedUp { player: PlayerId, kind: BuffKind },
    /// A pickup of a kind the player already had; the timer restarted.
    BuffRefreshed { player: PlayerId, kind: BuffKind },
    BuffExpired { player: PlayerId, kind: BuffKind },
    TeleportStarted { player: PlayerId, target: Point },
    TeleportFinished { player: PlayerId },
    PortalsRespawned { positions: [Point; 2] },
    TagTransferred { from: PlayerId, to: PlayerId },
    TagBlocked { tagger: PlayerId, shielded: PlayerId },
    RoundComplete { winner: PlayerId },
}
