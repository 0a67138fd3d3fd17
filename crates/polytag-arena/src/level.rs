use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;
use crate::geometry::{Mask, Point, Rect};

/// Default play-area edge length in pixels.
pub const DEFAULT_LEVEL_SIZE: i32 = 1400;
/// Largest accepted play-area edge length in pixels.
pub const MAX_LEVEL_SIZE: i32 = 16_384;
/// Thickness of the slab used by the built-in levels.
const SLAB_THICKNESS: i32 = 100;

/// External level description: terrain polygons plus per-level movement constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_level_size")]
    pub width: i32,
    #[serde(default = "default_level_size")]
    pub height: i32,
    /// Filled terrain polygons, each an ordered list of `(x, y)` vertices.
    pub polygons: Vec<Vec<(i32, i32)>>,
    /// Signed per-tick acceleration. Negative flips "down" to the top of the screen.
    pub gravity: f32,
    pub player_jump: f32,
    /// Edge length of the square player body.
    pub player_size: i32,
    pub player_speed: f32,
    pub player_max_fall: f32,
}

fn default_level_size() -> i32 {
    DEFAULT_LEVEL_SIZE
}

impl LevelConfig {
    pub fn from_toml(content: &str) -> Result<Self, LevelError> {
        Ok(toml::from_str(content)?)
    }
}

/// The four levels shipped with the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPreset {
    Snow,
    Desert,
    Plains,
    Gravity,
}

impl LevelPreset {
    pub const ALL: [LevelPreset; 4] = [
        LevelPreset::Snow,
        LevelPreset::Desert,
        LevelPreset::Plains,
        LevelPreset::Gravity,
    ];

    pub fn config(self) -> LevelConfig {
        let w = DEFAULT_LEVEL_SIZE;
        let h = DEFAULT_LEVEL_SIZE;
        let floor = vec![(0, h - SLAB_THICKNESS), (0, h), (w, h), (w, h - SLAB_THICKNESS)];
        let (name, polygons, gravity, jump, size, speed, max_fall) = match self {
            LevelPreset::Snow => ("snow", vec![floor], 0.5, 15.0, 10, 50.0, 15.0),
            LevelPreset::Desert => ("desert", vec![floor], 0.6, 18.0, 25, 8.0, 18.0),
            LevelPreset::Plains => ("plains", vec![floor], 0.5, 15.0, 22, 7.0, 15.0),
            LevelPreset::Gravity => {
                let ceiling = vec![(0, SLAB_THICKNESS), (0, 0), (w, 0), (w, SLAB_THICKNESS)];
                ("gravity", vec![ceiling], -0.7, 20.0, 20, 9.0, 20.0)
            },
        };
        LevelConfig {
            name: name.to_string(),
            width: w,
            height: h,
            polygons,
            gravity,
            player_jump: jump,
            player_size: size,
            player_speed: speed,
            player_max_fall: max_fall,
        }
    }
}

/// Which way gravity pulls bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GravityDir {
    Down,
    Up,
}

impl GravityDir {
    pub fn from_gravity(gravity: f32) -> Self {
        if gravity < 0.0 {
            GravityDir::Up
        } else {
            GravityDir::Down
        }
    }

    /// One pixel away from the floor, as a y delta.
    pub fn up_step(self) -> i32 {
        match self {
            GravityDir::Down => -1,
            GravityDir::Up => 1,
        }
    }
}

/// Where to put a pickup or portal relative to a terrain polygon.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    /// Distance from the polygon's walkable edge.
    pub clearance: i32,
    /// Inset from the polygon's left and right extent.
    pub edge_margin: i32,
    /// Minimum distance from the top and bottom of the play area.
    pub vertical_margin: i32,
}

#[derive(Debug, Clone)]
struct TerrainMask {
    origin: Point,
    mask: Mask,
}

/// Loaded, validated level with per-polygon occupancy masks.
#[derive(Debug, Clone)]
pub struct Level {
    config: LevelConfig,
    terrain: Vec<TerrainMask>,
}

impl Level {
    /// Validate `config` and rasterize its polygons.
    pub fn load(config: LevelConfig) -> Result<Self, LevelError> {
        validate(&config)?;
        let terrain = config
            .polygons
            .iter()
            .map(|verts| rasterize(verts, config.width, config.height))
            .collect();
        Ok(Self { config, terrain })
    }

    pub fn preset(preset: LevelPreset) -> Result<Self, LevelError> {
        Self::load(preset.config())
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn gravity(&self) -> f32 {
        self.config.gravity
    }

    pub fn gravity_dir(&self) -> GravityDir {
        GravityDir::from_gravity(self.config.gravity)
    }

    pub fn play_area(&self) -> Rect {
        Rect::new(0, 0, self.config.width, self.config.height)
    }

    /// Whether the pixel at `p` belongs to any terrain polygon.
    pub fn is_solid(&self, p: Point) -> bool {
        self.terrain
            .iter()
            .any(|t| t.mask.get(p.x - t.origin.x, p.y - t.origin.y))
    }

    /// Whether `mask` placed with its top-left at `at` touches any terrain.
    pub fn overlaps(&self, mask: &Mask, at: Point) -> bool {
        self.terrain
            .iter()
            .any(|t| t.mask.overlaps(mask, (at.x - t.origin.x, at.y - t.origin.y)))
    }

    /// Random point beside the walkable edge of a random polygon: above its
    /// top under normal gravity, below its bottom when gravity is inverted.
    pub fn spawn_point<R: Rng + ?Sized>(&self, rng: &mut R, placement: Placement) -> Point {
        let index = rng.random_range(0..self.config.polygons.len());
        let verts = &self.config.polygons[index];
        let (min_x, max_x, min_y, max_y) = bounds(verts);

        let lo = min_x + placement.edge_margin;
        let hi = max_x - placement.edge_margin;
        let x = if lo <= hi {
            rng.random_range(lo..=hi)
        } else {
            (min_x + max_x) / 2
        };

        let y = match self.gravity_dir() {
            GravityDir::Down => min_y - placement.clearance,
            GravityDir::Up => max_y + placement.clearance,
        };
        let top = placement.vertical_margin;
        let bottom = self.config.height - placement.vertical_margin;
        let y = if top <= bottom { y.clamp(top, bottom) } else { self.config.height / 2 };

        Point::new(x, y)
    }
}

fn validate(config: &LevelConfig) -> Result<(), LevelError> {
    let side = 1..=MAX_LEVEL_SIZE;
    if !side.contains(&config.width) || !side.contains(&config.height) {
        return Err(LevelError::InvalidPlayArea {
            width: config.width,
            height: config.height,
        });
    }
    if config.polygons.is_empty() {
        return Err(LevelError::NoPolygons);
    }
    if let Some((index, verts)) = config
        .polygons
        .iter()
        .enumerate()
        .find(|(_, verts)| verts.len() < 3)
    {
        return Err(LevelError::DegeneratePolygon {
            index,
            vertices: verts.len(),
        });
    }
    if config.player_size <= 0
        || config.player_size > config.width
        || config.player_size > config.height
    {
        return Err(LevelError::InvalidPlayerSize(config.player_size));
    }
    if !config.gravity.is_finite() {
        return Err(LevelError::NonFinite("gravity"));
    }
    for (name, value) in [
        ("player_jump", config.player_jump),
        ("player_speed", config.player_speed),
        ("player_max_fall", config.player_max_fall),
    ] {
        if !value.is_finite() {
            return Err(LevelError::NonFinite(name));
        }
        if value <= 0.0 {
            return Err(LevelError::NonPositive(name));
        }
    }
    Ok(())
}

fn bounds(verts: &[(i32, i32)]) -> (i32, i32, i32, i32) {
    let min_x = verts.iter().map(|v| v.0).min().unwrap_or(0);
    let max_x = verts.iter().map(|v| v.0).max().unwrap_or(0);
    let min_y = verts.iter().map(|v| v.1).min().unwrap_or(0);
    let max_y = verts.iter().map(|v| v.1).max().unwrap_or(0);
    (min_x, max_x, min_y, max_y)
}

/// Scanline fill sampling pixel centers, clipped to the play area.
fn rasterize(verts: &[(i32, i32)], area_width: i32, area_height: i32) -> TerrainMask {
    let (min_x, max_x, min_y, max_y) = bounds(verts);
    let x0 = min_x.clamp(0, area_width);
    let x1 = max_x.clamp(0, area_width);
    let y0 = min_y.clamp(0, area_height);
    let y1 = max_y.clamp(0, area_height);
    let mut mask = Mask::empty(x1 - x0, y1 - y0);

    let n = verts.len();
    let mut crossings: Vec<f32> = Vec::with_capacity(n);
    for y in y0..y1 {
        crossings.clear();
        let yf = y as f32 + 0.5;
        for i in 0..n {
            let (ax, ay) = (verts[i].0 as f32, verts[i].1 as f32);
            let (bx, by) = (verts[(i + 1) % n].0 as f32, verts[(i + 1) % n].1 as f32);
            if (ay <= yf && by > yf) || (by <= yf && ay > yf) {
                crossings.push(ax + (yf - ay) / (by - ay) * (bx - ax));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let start = ((pair[0] - 0.5).ceil() as i32).max(x0);
            let end = ((pair[1] - 0.5).ceil() as i32).min(x1);
            for x in start..end {
                mask.set(x - x0, y - y0);
            }
        }
    }

    TerrainMask {
        origin: Point::new(x0, y0),
        mask,
    }
}
