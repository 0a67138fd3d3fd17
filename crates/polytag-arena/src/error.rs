use thiserror::Error;

/// Rejected level configuration. Raised once, at load time.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no polygons")]
    NoPolygons,

    #[error("polygon {index} has {vertices} vertices, at least 3 are required")]
    DegeneratePolygon { index: usize, vertices: usize },

    #[error("play area {width}x{height} must be positive and at most {max} per side", max = crate::level::MAX_LEVEL_SIZE)]
    InvalidPlayArea { width: i32, height: i32 },

    #[error("player size {0} must be positive and fit the play area")]
    InvalidPlayerSize(i32),

    #[error("{0} must be finite")]
    NonFinite(&'static str),

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("level config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("level does not fit the arena config: {0}")]
    Arena(#[from] ConfigError),
}

/// Rejected arena tunables. Raised when a `TagArena` is constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tick rate {0} Hz must be positive and finite")]
    InvalidTickRate(f32),

    #[error("round duration {0}s must be positive and finite")]
    InvalidRoundDuration(f32),

    #[error("teleport increment {0} must be in (0, 1]")]
    InvalidTeleportIncrement(f32),

    #[error("buff spawn chance {0} must be in [0, 1]")]
    InvalidSpawnChance(f64),

    #[error("buff catalog is empty")]
    EmptyBuffCatalog,

    #[error("{name} {radius} must not be negative")]
    NegativeRadius { name: &'static str, radius: i32 },

    #[error("portal easing {0} must be in [0, 1]")]
    InvalidEasing(f32),

    #[error("grow fallback {0} must be positive")]
    InvalidGrowFallback(i32),

    #[error("grow_by {grow_by:?} shrinks a {player_size}px player to nothing")]
    InvalidGrowBy { player_size: i32, grow_by: [i32; 2] },

    #[error("arena config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
