use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use polytag_core::player::PlayerId;

use crate::geometry::Point;
use crate::level::LevelConfig;
use crate::physics::{Body, Contact};
use crate::portals::TeleportState;

/// Movement stats for one player.
///
/// `speed` and `jump` are derived: base value times every active modifier.
/// Buff effects only touch their own modifier and call `recompute`, so
/// removing one modifier never clobbers another, and removing the only
/// modifier restores the base value exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub base_speed: f32,
    pub base_jump: f32,
    pub base_size: i32,
    pub speed: f32,
    pub jump: f32,
    /// Speed buff multiplier, 1.0 when inactive.
    pub speed_boost: f32,
    /// Jump buff multiplier, 1.0 when inactive.
    pub jump_boost: f32,
    /// Freeze slow factor imposed by the opponent, 1.0 when inactive.
    pub slow: f32,
    pub shield: bool,
    pub frozen: bool,
}

impl PlayerStats {
    pub fn from_level(config: &LevelConfig) -> Self {
        Self {
            base_speed: config.player_speed,
            base_jump: config.player_jump,
            base_size: config.player_size,
            speed: config.player_speed,
            jump: config.player_jump,
            speed_boost: 1.0,
            jump_boost: 1.0,
            slow: 1.0,
            shield: false,
            frozen: false,
        }
    }

    pub fn recompute(&mut self) {
        self.speed = self.base_speed * self.speed_boost * self.slow;
        self.jump = self.base_jump * self.jump_boost;
    }
}

/// Vertical motion carried between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub velocity_y: f32,
    pub on_ground: bool,
    pub on_ceiling: bool,
}

impl From<Contact> for Motion {
    fn from(c: Contact) -> Self {
        Self {
            velocity_y: c.velocity_y,
            on_ground: c.on_ground,
            on_ceiling: c.on_ceiling,
        }
    }
}

/// Everything the simulation owns for one player.
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    pub id: PlayerId,
    pub body: Body,
    pub stats: PlayerStats,
    pub motion: Motion,
    pub teleport: TeleportState,
}

impl PlayerSlot {
    pub fn new(id: PlayerId, spawn: Point, config: &LevelConfig) -> Self {
        Self {
            id,
            body: Body::new(spawn.x, spawn.y, config.player_size, config.player_size),
            stats: PlayerStats::from_level(config),
            motion: Motion::default(),
            teleport: TeleportState::default(),
        }
    }
}

/// Both players, addressed by `PlayerId`. Effects that reach across to the
/// opponent resolve it here at call time.
#[derive(Debug, Clone)]
pub struct Players {
    slots: [PlayerSlot; 2],
}

impl Players {
    /// Player one spawns right of center, player two left of it.
    pub fn spawn(config: &LevelConfig, offset: i32) -> Self {
        let y = config.height / 2;
        let cx = config.width / 2;
        Self {
            slots: [
                PlayerSlot::new(PlayerId::One, Point::new(cx + offset, y), config),
                PlayerSlot::new(PlayerId::Two, Point::new(cx - offset, y), config),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerSlot> {
        self.slots.iter_mut()
    }

    /// Whether the two bodies currently overlap.
    pub fn in_contact(&self) -> bool {
        let a = self.slots[0].body.rect();
        let b = self.slots[1].body.rect();
        a.collides(&b)
    }
}

impl Index<PlayerId> for Players {
    type Output = PlayerSlot;

    fn index(&self, id: PlayerId) -> &PlayerSlot {
        &self.slots[id.index()]
    }
}

impl IndexMut<PlayerId> for Players {
    fn index_mut(&mut self, id: PlayerId) -> &mut PlayerSlot {
        &mut self.slots[id.index()]
    }
}
