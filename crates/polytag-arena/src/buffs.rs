use std::f32::consts::TAU;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use polytag_core::player::PlayerId;
use polytag_core::powerup::{self, PowerUpKind};

use crate::config::BuffConfig;
use crate::events::GameEvent;
use crate::geometry::{Point, Rect};
use crate::level::{Level, Placement};
use crate::physics::Body;
use crate::player::Players;

/// Buff catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    Speed,
    Jump,
    Size,
    Shield,
    Freeze,
}

impl BuffKind {
    pub const ALL: [BuffKind; 5] = [
        BuffKind::Speed,
        BuffKind::Jump,
        BuffKind::Size,
        BuffKind::Shield,
        BuffKind::Freeze,
    ];
}

impl PowerUpKind for BuffKind {
    fn duration_secs(&self) -> f32 {
        match self {
            BuffKind::Speed | BuffKind::Jump | BuffKind::Size => 5.0,
            BuffKind::Shield => 10.0,
            BuffKind::Freeze => 3.0,
        }
    }
}

/// Countdown for a buff that has been picked up.
pub type AppliedBuff = powerup::ActivePowerUp<BuffKind>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuffState {
    OnField,
    Applied,
}

/// A buff lying in the level or affecting a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffInstance {
    pub x: f32,
    pub y: f32,
    pub kind: BuffKind,
    /// Visual bob phase in radians. Frozen once applied.
    pub bob_phase: f32,
    applied: Option<AppliedBuff>,
}

impl BuffInstance {
    pub fn on_field(kind: BuffKind, at: Point) -> Self {
        Self {
            x: at.x as f32,
            y: at.y as f32,
            kind,
            bob_phase: 0.0,
            applied: None,
        }
    }

    pub fn state(&self) -> BuffState {
        if self.applied.is_some() {
            BuffState::Applied
        } else {
            BuffState::OnField
        }
    }

    /// Zero while on the field.
    pub fn remaining_ticks(&self) -> u32 {
        self.applied.as_ref().map_or(0, |a| a.remaining_ticks)
    }

    pub fn applied_to(&self) -> Option<PlayerId> {
        self.applied.as_ref().map(|a| a.owner)
    }

    /// Square pickup area around the anchor point.
    pub fn pickup_rect(&self, radius: i32) -> Rect {
        Rect::new(
            self.x.round() as i32 - radius,
            self.y.round() as i32 - radius,
            radius * 2,
            radius * 2,
        )
    }

    /// Where the renderer should draw the buff this frame.
    pub fn display_y(&self, amplitude: f32) -> f32 {
        self.y + self.bob_phase.sin() * amplitude
    }
}

/// What an effect changed, so the caller knows whether masks were rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    StatsChanged,
    BodyResized(PlayerId),
}

/// Everything an effect may touch. The opponent is reached through
/// `players` by id, never through a stored reference.
pub struct EffectContext<'a> {
    pub owner: PlayerId,
    pub players: &'a mut Players,
    pub level: &'a Level,
    pub config: &'a BuffConfig,
}

/// Apply/remove pair for one buff kind.
pub trait BuffEffect {
    fn apply(&self, ctx: &mut EffectContext<'_>) -> EffectOutcome;
    fn remove(&self, ctx: &mut EffectContext<'_>) -> EffectOutcome;
}

impl BuffEffect for BuffKind {
    fn apply(&self, ctx: &mut EffectContext<'_>) -> EffectOutcome {
        let owner = ctx.owner;
        match self {
            BuffKind::Speed => {
                let stats = &mut ctx.players[owner].stats;
                stats.speed_boost = ctx.config.speed_multiplier;
                stats.recompute();
                EffectOutcome::StatsChanged
            },
            BuffKind::Jump => {
                let stats = &mut ctx.players[owner].stats;
                stats.jump_boost = ctx.config.jump_multiplier;
                stats.recompute();
                EffectOutcome::StatsChanged
            },
            BuffKind::Size => {
                let base = ctx.players[owner].stats.base_size;
                let [dw, dh] = ctx.config.grow_by;
                resize(
                    &mut ctx.players[owner].body,
                    base + dw,
                    base + dh,
                    ctx.level,
                    ctx.config,
                );
                EffectOutcome::BodyResized(owner)
            },
            BuffKind::Shield => {
                ctx.players[owner].stats.shield = true;
                EffectOutcome::StatsChanged
            },
            BuffKind::Freeze => {
                let stats = &mut ctx.players[owner.opponent()].stats;
                stats.slow = ctx.config.freeze_factor;
                stats.frozen = true;
                stats.recompute();
                EffectOutcome::StatsChanged
            },
        }
    }

    fn remove(&self, ctx: &mut EffectContext<'_>) -> EffectOutcome {
        let owner = ctx.owner;
        match self {
            BuffKind::Speed => {
                let stats = &mut ctx.players[owner].stats;
                stats.speed_boost = 1.0;
                stats.recompute();
                EffectOutcome::StatsChanged
            },
            BuffKind::Jump => {
                let stats = &mut ctx.players[owner].stats;
                stats.jump_boost = 1.0;
                stats.recompute();
                EffectOutcome::StatsChanged
            },
            BuffKind::Size => {
                let base = ctx.players[owner].stats.base_size;
                resize(&mut ctx.players[owner].body, base, base, ctx.level, ctx.config);
                EffectOutcome::BodyResized(owner)
            },
            BuffKind::Shield => {
                ctx.players[owner].stats.shield = false;
                EffectOutcome::StatsChanged
            },
            BuffKind::Freeze => {
                let stats = &mut ctx.players[owner.opponent()].stats;
                stats.slow = 1.0;
                stats.frozen = false;
                stats.recompute();
                EffectOutcome::StatsChanged
            },
        }
    }
}

/// Resize keeping the floor-side edge, then push away from the floor one
/// pixel at a time until clear. After `grow_attempts` pushes the body is
/// moved a further `grow_fallback` pixels and left there.
fn resize(body: &mut Body, width: i32, height: i32, level: &Level, config: &BuffConfig) {
    let gravity = level.gravity_dir();
    body.resize_anchored(width, height, gravity);

    if !body.push_clear(level, config.grow_attempts) {
        warn!(
            attempts = config.grow_attempts,
            fallback = config.grow_fallback,
            "resize could not clear terrain, applying fallback push"
        );
        body.translate(0, gravity.up_step() * config.grow_fallback);
    }
}

/// All buffs in play, on the field and applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuffField {
    buffs: Vec<BuffInstance>,
}

impl BuffField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffs(&self) -> &[BuffInstance] {
        &self.buffs
    }

    pub fn on_field_count(&self) -> usize {
        self.buffs.iter().filter(|b| b.applied.is_none()).count()
    }

    /// Drop a buff at a fixed point.
    pub fn place(&mut self, kind: BuffKind, at: Point) {
        self.buffs.push(BuffInstance::on_field(kind, at));
    }

    /// Roll for a new buff. At most `max_on_field` unclaimed buffs exist at
    /// once; the kind is drawn uniformly from the catalog.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        level: &Level,
        config: &BuffConfig,
    ) -> Option<&BuffInstance> {
        if self.on_field_count() >= config.max_on_field {
            return None;
        }
        if !rng.random_bool(config.spawn_chance) {
            return None;
        }
        let kind = *config.catalog.choose(rng)?;
        let at = level.spawn_point(rng, Placement {
            clearance: config.spawn_clearance,
            edge_margin: config.edge_margin,
            vertical_margin: config.radius,
        });
        debug!(?kind, x = at.x, y = at.y, "buff spawned");
        self.place(kind, at);
        self.buffs.last()
    }

    /// Claim every field buff touching `id`'s body. A kind the player
    /// already holds restarts that timer instead of applying twice.
    ///
    /// Returns `true` if the player's body was resized.
    pub fn check_pickup(
        &mut self,
        id: PlayerId,
        players: &mut Players,
        level: &Level,
        config: &BuffConfig,
        tick_rate: f32,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let rect = players[id].body.rect();
        let mut resized = false;
        let mut i = 0;
        while i < self.buffs.len() {
            let buff = &self.buffs[i];
            if buff.applied.is_some() || !buff.pickup_rect(config.radius).collides(&rect) {
                i += 1;
                continue;
            }
            let kind = buff.kind;
            let ticks = config.duration_ticks(kind, tick_rate);

            let held = self.buffs.iter_mut().find_map(|b| {
                b.applied
                    .as_mut()
                    .filter(|a| a.owner == id && a.kind == kind)
            });
            if let Some(held) = held {
                held.refresh(ticks);
                self.buffs.remove(i);
                debug!(player = %id, ?kind, "buff refreshed");
                events.push(GameEvent::BuffRefreshed { player: id, kind });
                continue;
            }

            self.buffs[i].applied = Some(AppliedBuff::new(kind, id, ticks));
            let outcome = kind.apply(&mut EffectContext {
                owner: id,
                players,
                level,
                config,
            });
            resized |= outcome == EffectOutcome::BodyResized(id);
            debug!(player = %id, ?kind, ticks, "buff picked up");
            events.push(GameEvent::BuffPickedUp { player: id, kind });
            i += 1;
        }
        resized
    }

    /// Advance bobbing on field buffs and count down applied ones, removing
    /// each effect on the tick its timer reaches zero.
    ///
    /// Returns, per player index, whether that player's body was resized.
    pub fn tick(
        &mut self,
        players: &mut Players,
        level: &Level,
        config: &BuffConfig,
        events: &mut Vec<GameEvent>,
    ) -> [bool; 2] {
        let mut resized = [false; 2];
        let mut i = 0;
        while i < self.buffs.len() {
            let buff = &mut self.buffs[i];
            let expired = match buff.applied.as_mut() {
                Some(applied) => applied.tick(),
                None => {
                    buff.bob_phase = (buff.bob_phase + config.bob_speed) % TAU;
                    false
                },
            };
            if !expired {
                i += 1;
                continue;
            }

            let buff = self.buffs.remove(i);
            let Some(owner) = buff.applied_to() else {
                continue;
            };
            let outcome = buff.kind.remove(&mut EffectContext {
                owner,
                players,
                level,
                config,
            });
            if let EffectOutcome::BodyResized(id) = outcome {
                resized[id.index()] = true;
            }
            debug!(player = %owner, kind = ?buff.kind, "buff expired");
            events.push(GameEvent::BuffExpired {
                player: owner,
                kind: buff.kind,
            });
        }
        resized
    }
}
