use serde::{Deserialize, Serialize};

use polytag_core::powerup::PowerUpKind;
use polytag_core::time::{REFERENCE_TICK_RATE, secs_to_ticks};

use crate::buffs::BuffKind;
use crate::error::ConfigError;
use crate::level::LevelConfig;
use crate::physics::STEP_HEIGHT;

/// Per-kind buff durations in seconds of wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffDurations {
    pub speed: f32,
    pub jump: f32,
    pub size: f32,
    pub shield: f32,
    pub freeze: f32,
}

impl Default for BuffDurations {
    fn default() -> Self {
        Self {
            speed: BuffKind::Speed.duration_secs(),
            jump: BuffKind::Jump.duration_secs(),
            size: BuffKind::Size.duration_secs(),
            shield: BuffKind::Shield.duration_secs(),
            freeze: BuffKind::Freeze.duration_secs(),
        }
    }
}

impl BuffDurations {
    pub fn secs(&self, kind: BuffKind) -> f32 {
        match kind {
            BuffKind::Speed => self.speed,
            BuffKind::Jump => self.jump,
            BuffKind::Size => self.size,
            BuffKind::Shield => self.shield,
            BuffKind::Freeze => self.freeze,
        }
    }
}

/// Buff spawning, pickup and effect tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffConfig {
    /// Probability of a spawn attempt succeeding on any tick.
    pub spawn_chance: f64,
    /// Cap on buffs lying in the level, not yet picked up.
    pub max_on_field: usize,
    /// Half-size of the square pickup area.
    pub radius: i32,
    /// Distance of a spawn above (or below) its polygon.
    pub spawn_clearance: i32,
    /// Inset from the polygon's horizontal extent.
    pub edge_margin: i32,
    /// Bob phase advance per tick (radians).
    pub bob_speed: f32,
    /// Visual bob height in pixels.
    pub bob_amplitude: f32,
    pub speed_multiplier: f32,
    pub jump_multiplier: f32,
    /// Width/height added by the size buff.
    pub grow_by: [i32; 2],
    /// One-pixel push-outs tried before the fallback.
    pub grow_attempts: u32,
    /// Extra push applied when the push-outs run out.
    pub grow_fallback: i32,
    /// Opponent speed factor while frozen.
    pub freeze_factor: f32,
    pub durations: BuffDurations,
    /// Kinds the spawner draws from, uniformly.
    pub catalog: Vec<BuffKind>,
}

impl Default for BuffConfig {
    fn default() -> Self {
        Self {
            spawn_chance: 0.01,
            max_on_field: 3,
            radius: 30,
            spawn_clearance: 20,
            edge_margin: 20,
            bob_speed: 0.083,
            bob_amplitude: 6.0,
            speed_multiplier: 2.0,
            jump_multiplier: 1.5,
            grow_by: [15, 15],
            grow_attempts: 200,
            grow_fallback: 10,
            freeze_factor: 0.1,
            durations: BuffDurations::default(),
            catalog: BuffKind::ALL.to_vec(),
        }
    }
}

impl BuffConfig {
    pub fn duration_ticks(&self, kind: BuffKind, tick_rate: f32) -> u32 {
        secs_to_ticks(self.durations.secs(kind), tick_rate).max(1)
    }
}

/// Portal placement and teleport animation tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub radius: i32,
    /// Distance of a portal above (or below) its polygon.
    pub clearance: i32,
    pub edge_margin: i32,
    /// Exit offset away from the floor, so the exit portal does not re-trigger.
    pub exit_margin: i32,
    /// Teleport progress gained per tick.
    pub teleport_increment: f32,
    /// Fraction of the remaining distance covered per tick while in transit.
    pub easing: f32,
    pub cooldown_secs: f32,
    /// Redraws allowed for a portal whose landing spot is blocked.
    pub placement_attempts: u32,
    /// One-pixel push-outs tried when a teleport lands in terrain.
    pub exit_attempts: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            radius: 20,
            clearance: 15,
            edge_margin: 20,
            exit_margin: 30,
            teleport_increment: 0.02,
            easing: 0.1,
            cooldown_secs: 10.0,
            placement_attempts: 32,
            exit_attempts: 200,
        }
    }
}

impl PortalConfig {
    /// Ticks a teleport takes: progress gains `teleport_increment` per tick
    /// and the teleport completes on the first tick it would reach 1.
    pub fn teleport_ticks(&self) -> u32 {
        let inc = self.teleport_increment;
        let mut ticks = (1.0 / inc).ceil().max(1.0);
        // The quotient can round either way across an exact multiple.
        if ticks > 1.0 && (ticks - 1.0) * inc >= 1.0 {
            ticks -= 1.0;
        } else if ticks * inc < 1.0 {
            ticks += 1.0;
        }
        ticks as u32
    }

    pub fn cooldown_ticks(&self, tick_rate: f32) -> u32 {
        secs_to_ticks(self.cooldown_secs, tick_rate)
    }
}

/// Top-level arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub tick_rate_hz: f32,
    pub round_duration_secs: f32,
    pub step_height: u32,
    /// Horizontal offset of each player's spawn from the play-area center.
    pub spawn_offset: i32,
    /// Fixed RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub buffs: BuffConfig,
    pub portals: PortalConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: REFERENCE_TICK_RATE,
            round_duration_secs: 60.0,
            step_height: STEP_HEIGHT,
            spawn_offset: 20,
            seed: None,
            buffs: BuffConfig::default(),
            portals: PortalConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("POLYTAG_ARENA_CONFIG")
            .unwrap_or_else(|_| "config/arena.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    ArenaConfig::default()
                },
            },
            Err(_) => ArenaConfig::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidTickRate(self.tick_rate_hz));
        }
        if !self.round_duration_secs.is_finite() || self.round_duration_secs <= 0.0 {
            return Err(ConfigError::InvalidRoundDuration(self.round_duration_secs));
        }
        let inc = self.portals.teleport_increment;
        if !inc.is_finite() || inc <= 0.0 || inc > 1.0 {
            return Err(ConfigError::InvalidTeleportIncrement(inc));
        }
        if !(0.0..=1.0).contains(&self.buffs.spawn_chance) {
            return Err(ConfigError::InvalidSpawnChance(self.buffs.spawn_chance));
        }
        if self.buffs.catalog.is_empty() {
            return Err(ConfigError::EmptyBuffCatalog);
        }
        for (name, radius) in [
            ("buffs.radius", self.buffs.radius),
            ("portals.radius", self.portals.radius),
        ] {
            if radius < 0 {
                return Err(ConfigError::NegativeRadius { name, radius });
            }
        }
        let easing = self.portals.easing;
        if !(0.0..=1.0).contains(&easing) {
            return Err(ConfigError::InvalidEasing(easing));
        }
        if self.buffs.grow_fallback <= 0 {
            return Err(ConfigError::InvalidGrowFallback(self.buffs.grow_fallback));
        }
        Ok(())
    }

    /// Checks that depend on the level: the size buff must leave the body
    /// with a positive extent on both axes.
    pub fn validate_for(&self, level: &LevelConfig) -> Result<(), ConfigError> {
        let size = level.player_size;
        let [dw, dh] = self.buffs.grow_by;
        if size + dw <= 0 || size + dh <= 0 {
            return Err(ConfigError::InvalidGrowBy {
                player_size: size,
                grow_by: self.buffs.grow_by,
            });
        }
        Ok(())
    }

    /// Edge lengths of the largest body a player can have on `level`.
    pub fn largest_body(&self, level: &LevelConfig) -> (i32, i32) {
        let [dw, dh] = self.buffs.grow_by;
        (
            level.player_size + dw.max(0),
            level.player_size + dh.max(0),
        )
    }

    pub fn round_duration_ticks(&self) -> u64 {
        u64::from(secs_to_ticks(self.round_duration_secs, self.tick_rate_hz)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelPreset;

    #[test]
    fn defaults_are_valid() {
        assert!(ArenaConfig::default().validate().is_ok());
    }

    #[test]
    fn reference_durations_in_ticks() {
        let cfg = BuffConfig::default();
        assert_eq!(cfg.duration_ticks(BuffKind::Speed, 60.0), 300);
        assert_eq!(cfg.duration_ticks(BuffKind::Shield, 60.0), 600);
        assert_eq!(cfg.duration_ticks(BuffKind::Freeze, 60.0), 180);
        assert_eq!(cfg.duration_ticks(BuffKind::Freeze, 30.0), 90);
    }

    #[test]
    fn teleport_takes_fifty_ticks_by_default() {
        assert_eq!(PortalConfig::default().teleport_ticks(), 50);
        assert_eq!(PortalConfig::default().cooldown_ticks(60.0), 600);
    }

    #[test]
    fn teleport_ticks_round_up_partial_increments() {
        let with = |inc| PortalConfig {
            teleport_increment: inc,
            ..Default::default()
        };
        assert_eq!(with(0.3).teleport_ticks(), 4);
        assert_eq!(with(0.25).teleport_ticks(), 4);
        assert_eq!(with(0.1).teleport_ticks(), 10);
        assert_eq!(with(1.0).teleport_ticks(), 1);
    }

    #[test]
    fn round_lasts_sixty_seconds() {
        assert_eq!(ArenaConfig::default().round_duration_ticks(), 3600);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut cfg = ArenaConfig::default();
        cfg.tick_rate_hz = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidTickRate(_))));

        let mut cfg = ArenaConfig::default();
        cfg.portals.teleport_increment = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTeleportIncrement(_))
        ));

        let mut cfg = ArenaConfig::default();
        cfg.buffs.catalog.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyBuffCatalog)));

        let mut cfg = ArenaConfig::default();
        cfg.buffs.spawn_chance = 2.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidSpawnChance(_))
        ));

        let mut cfg = ArenaConfig::default();
        cfg.round_duration_secs = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidRoundDuration(_))
        ));
    }

    #[test]
    fn rejects_negative_radius_and_out_of_range_easing() {
        let mut cfg = ArenaConfig::default();
        cfg.portals.radius = -1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NegativeRadius {
                name: "portals.radius",
                radius: -1
            })
        ));

        let mut cfg = ArenaConfig::default();
        cfg.buffs.radius = -5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NegativeRadius { name: "buffs.radius", .. })
        ));

        for easing in [-0.1, 1.5, f32::NAN] {
            let mut cfg = ArenaConfig::default();
            cfg.portals.easing = easing;
            assert!(matches!(cfg.validate(), Err(ConfigError::InvalidEasing(_))));
        }

        let mut cfg = ArenaConfig::default();
        cfg.buffs.grow_fallback = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidGrowFallback(0))
        ));
    }

    #[test]
    fn shrinking_grow_by_must_leave_a_positive_body() {
        let level = LevelPreset::Plains.config();
        let mut cfg = ArenaConfig::default();
        cfg.buffs.grow_by = [-40, -40];
        assert!(cfg.validate().is_ok());
        assert!(matches!(
            cfg.validate_for(&level),
            Err(ConfigError::InvalidGrowBy {
                player_size: 22,
                grow_by: [-40, -40]
            })
        ));

        cfg.buffs.grow_by = [0, -22];
        assert!(cfg.validate_for(&level).is_err());

        cfg.buffs.grow_by = [-21, -21];
        assert!(cfg.validate_for(&level).is_ok());
        assert_eq!(cfg.largest_body(&level), (22, 22));
    }

    #[test]
    fn largest_body_includes_growth() {
        let cfg = ArenaConfig::default();
        assert_eq!(cfg.largest_body(&LevelPreset::Plains.config()), (37, 37));
    }

    #[test]
    fn parses_bundled_arena_file() {
        let cfg = ArenaConfig::from_toml(include_str!("../../../config/arena.toml")).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.buffs.catalog.len(), 5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = ArenaConfig::from_toml("round_duration_secs = 30.0\n[buffs]\nmax_on_field = 1\n")
            .unwrap();
        assert_eq!(cfg.round_duration_secs, 30.0);
        assert_eq!(cfg.buffs.max_on_field, 1);
        assert_eq!(cfg.buffs.radius, 30);
        assert_eq!(cfg.portals, PortalConfig::default());
    }

    #[test]
    fn unknown_buff_kind_is_rejected_at_load() {
        let err = ArenaConfig::from_toml("[buffs]\ncatalog = [\"speed\", \"teleport\"]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        // SAFETY: test-only env mutation; no other test reads this variable.
        unsafe {
            std::env::set_var("POLYTAG_ARENA_CONFIG", "/nonexistent/arena.toml");
        }
        assert_eq!(ArenaConfig::load(), ArenaConfig::default());
    }
}
