pub mod buffs;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod level;
pub mod physics;
pub mod player;
pub mod portals;
pub mod round;
pub mod tagging;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use polytag_core::player::{Intent, PlayerId};

use buffs::{BuffField, BuffKind, BuffState};
use config::ArenaConfig;
use error::{ConfigError, LevelError};
use events::GameEvent;
use geometry::{Point, Rect};
use level::{Level, LevelConfig};
use physics::MotionLimits;
use player::Players;
use portals::{PortalPair, TeleportStep};
use round::{RoundClock, RoundResult};
use tagging::{TagOutcome, TagState};

/// A buff lying in the level, as the renderer needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleBuff {
    pub kind: BuffKind,
    pub x: f32,
    pub y: f32,
    /// `y` with the visual bob applied.
    pub display_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalView {
    pub visible: bool,
    pub positions: [Point; 2],
}

/// Snapshot handed to the render layer after every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameState {
    /// Body rectangles, indexed by `PlayerId::index`.
    pub bodies: [Rect; 2],
    /// Set when a body was resized this tick and its mask rebuilt.
    pub masks_changed: [bool; 2],
    pub teleport_progress: [f32; 2],
    pub tagger: PlayerId,
    pub elapsed_secs: f32,
    pub buffs: Vec<VisibleBuff>,
    pub portals: PortalView,
    pub round_over: bool,
    pub winner: Option<PlayerId>,
    pub events: Vec<GameEvent>,
}

impl FrameState {
    pub fn to_bytes(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

/// The whole simulation for one two-player round.
///
/// Owned by a single thread and advanced by `tick`; renderers read the
/// returned `FrameState`, never the arena itself.
pub struct TagArena {
    level: Level,
    config: ArenaConfig,
    players: Players,
    buffs: BuffField,
    portals: PortalPair,
    tag: TagState,
    clock: RoundClock,
    result: Option<RoundResult>,
    rng: StdRng,
}

impl TagArena {
    pub fn new(level: Level, config: ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        config.validate_for(level.config())?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let tagger = if rng.random_bool(0.5) {
            PlayerId::One
        } else {
            PlayerId::Two
        };
        let players = Players::spawn(level.config(), config.spawn_offset);
        let landing = config.largest_body(level.config());
        let portals = PortalPair::spawn(&mut rng, &level, &config.portals, landing);
        let clock = RoundClock::new(config.round_duration_ticks());
        debug!(level = %level.config().name, %tagger, "round started");

        Ok(Self {
            level,
            config,
            players,
            buffs: BuffField::new(),
            portals,
            tag: TagState::new(tagger),
            clock,
            result: None,
            rng,
        })
    }

    /// Swap in a new level and start a fresh round on it. A rejected level
    /// leaves the current round untouched.
    pub fn load_level(&mut self, config: LevelConfig) -> Result<(), LevelError> {
        let level = Level::load(config)?;
        self.config.validate_for(level.config())?;
        self.level = level;
        self.restart();
        Ok(())
    }

    /// Start a fresh round on the current level, keeping the RNG stream.
    pub fn restart(&mut self) {
        self.players = Players::spawn(self.level.config(), self.config.spawn_offset);
        self.buffs = BuffField::new();
        let landing = self.config.largest_body(self.level.config());
        self.portals =
            PortalPair::spawn(&mut self.rng, &self.level, &self.config.portals, landing);
        let tagger = if self.rng.random_bool(0.5) {
            PlayerId::One
        } else {
            PlayerId::Two
        };
        self.tag = TagState::new(tagger);
        self.clock = RoundClock::new(self.config.round_duration_ticks());
        self.result = None;
        debug!(level = %self.level.config().name, %tagger, "round restarted");
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    pub fn buffs(&self) -> &BuffField {
        &self.buffs
    }

    pub fn portals(&self) -> &PortalPair {
        &self.portals
    }

    pub fn tag(&self) -> &TagState {
        &self.tag
    }

    pub fn clock(&self) -> &RoundClock {
        &self.clock
    }

    pub fn result(&self) -> Option<RoundResult> {
        self.result
    }

    pub fn is_round_over(&self) -> bool {
        self.result.is_some()
    }

    /// Advance the simulation by one tick.
    ///
    /// Buff changes land before movement so they affect this tick's motion;
    /// portals run after movement and tagging so a teleport overrides the
    /// resolved position. Once the round is over the final frame is returned
    /// unchanged.
    pub fn tick(&mut self, intents: [Intent; 2]) -> FrameState {
        if self.is_round_over() {
            return self.frame();
        }

        let mut events = Vec::new();
        let mut masks_changed = [false; 2];
        let tick_rate = self.config.tick_rate_hz;

        // 1. Spawn
        if let Some(buff) = self
            .buffs
            .spawn(&mut self.rng, &self.level, &self.config.buffs)
        {
            events.push(GameEvent::BuffSpawned {
                kind: buff.kind,
                at: Point::new(buff.x as i32, buff.y as i32),
            });
        }

        // 2. Expiry
        let expired = self.buffs.tick(
            &mut self.players,
            &self.level,
            &self.config.buffs,
            &mut events,
        );
        for (changed, resized) in masks_changed.iter_mut().zip(expired) {
            *changed |= resized;
        }

        // 3. Pickup
        for id in PlayerId::ALL {
            if self.buffs.check_pickup(
                id,
                &mut self.players,
                &self.level,
                &self.config.buffs,
                tick_rate,
                &mut events,
            ) {
                masks_changed[id.index()] = true;
            }
        }

        // 4. Movement
        for id in PlayerId::ALL {
            self.move_player(id, intents[id.index()]);
        }

        // 5. Bounds
        let area = self.level.play_area();
        for slot in self.players.iter_mut() {
            slot.body.clamp_within(&area);
        }

        // 6. Tag
        let overlapping = self.players.in_contact();
        let target_shielded = self.players[self.tag.target()].stats.shield;
        match self.tag.update(overlapping, target_shielded) {
            Some(TagOutcome::Transferred { from, to }) => {
                debug!(%from, %to, "tag transferred");
                events.push(GameEvent::TagTransferred { from, to });
            },
            Some(TagOutcome::Blocked { tagger, shielded }) => {
                debug!(%tagger, %shielded, "tag blocked by shield");
                events.push(GameEvent::TagBlocked { tagger, shielded });
            },
            None => {},
        }

        // 7. Portals
        for id in PlayerId::ALL {
            let slot = &mut self.players[id];
            let step = portals::handle_teleport(
                &mut slot.body,
                &mut slot.teleport,
                &mut self.portals,
                &self.level,
                &self.config.portals,
                tick_rate,
            );
            match step {
                TeleportStep::Started(target) => {
                    debug!(player = %id, x = target.x, y = target.y, "teleport started");
                    events.push(GameEvent::TeleportStarted { player: id, target });
                },
                TeleportStep::Finished => {
                    debug!(player = %id, "teleport finished");
                    events.push(GameEvent::TeleportFinished { player: id });
                },
                TeleportStep::Idle | TeleportStep::InTransit => {},
            }
        }

        // 8. Portal cooldown
        let landing = self.config.largest_body(self.level.config());
        if self
            .portals
            .tick_cooldown(&mut self.rng, &self.level, &self.config.portals, landing)
        {
            events.push(GameEvent::PortalsRespawned {
                positions: self.portals.positions,
            });
        }

        // 9. Clock
        if self.clock.tick() {
            let result = RoundResult::from_tagger(self.tag.tagger);
            info!(winner = %result.winner, "round complete");
            events.push(GameEvent::RoundComplete {
                winner: result.winner,
            });
            self.result = Some(result);
        }

        self.snapshot(events, masks_changed)
    }

    /// Current state with no events attached.
    pub fn frame(&self) -> FrameState {
        self.snapshot(Vec::new(), [false; 2])
    }

    fn move_player(&mut self, id: PlayerId, intent: Intent) {
        let gravity = self.level.gravity();
        let max_fall = self.level.config().player_max_fall;
        let step_height = self.config.step_height;
        let slot = &mut self.players[id];

        if slot.teleport.is_active() {
            slot.motion.on_ground = false;
            slot.motion.on_ceiling = false;
            return;
        }

        let dx = (intent.direction() as f32 * slot.stats.speed).round() as i32;
        let jump = slot.stats.jump.abs();
        if intent.jump {
            if gravity > 0.0 && slot.motion.on_ground {
                slot.motion.velocity_y = -jump;
                slot.motion.on_ground = false;
            } else if gravity < 0.0 && slot.motion.on_ceiling {
                slot.motion.velocity_y = jump;
                slot.motion.on_ceiling = false;
            }
        }

        let limits = MotionLimits {
            gravity,
            max_fall,
            max_jump: Some(jump.max(max_fall)),
            step_height,
        };
        let contact = physics::resolve(
            &mut slot.body,
            &self.level,
            dx,
            slot.motion.velocity_y,
            &limits,
        );
        slot.motion = contact.into();
    }

    fn snapshot(&self, events: Vec<GameEvent>, masks_changed: [bool; 2]) -> FrameState {
        let amplitude = self.config.buffs.bob_amplitude;
        FrameState {
            bodies: PlayerId::ALL.map(|id| self.players[id].body.rect()),
            masks_changed,
            teleport_progress: PlayerId::ALL.map(|id| self.players[id].teleport.progress()),
            tagger: self.tag.tagger,
            elapsed_secs: self.clock.elapsed_secs(self.config.tick_rate_hz),
            buffs: self
                .buffs
                .buffs()
                .iter()
                .filter(|b| b.state() == BuffState::OnField)
                .map(|b| VisibleBuff {
                    kind: b.kind,
                    x: b.x,
                    y: b.y,
                    display_y: b.display_y(amplitude),
                })
                .collect(),
            portals: PortalView {
                visible: self.portals.active,
                positions: self.portals.positions,
            },
            round_over: self.result.is_some(),
            winner: self.result.map(|r| r.winner),
            events,
        }
    }
}
