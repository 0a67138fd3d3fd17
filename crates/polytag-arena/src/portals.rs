use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PortalConfig;
use crate::geometry::{Mask, Point, Rect};
use crate::level::{GravityDir, Level, Placement};
use crate::physics::Body;

/// Per-player teleport animation.
///
/// Progress gains `increment` per tick and the body snaps onto the target
/// on tick `total`, the first tick progress would reach 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeleportState {
    target: Option<Point>,
    elapsed: u32,
    total: u32,
    increment: f32,
}

impl TeleportState {
    pub fn begin(&mut self, target: Point, total_ticks: u32, increment: f32) {
        self.target = Some(target);
        self.elapsed = 0;
        self.total = total_ticks.max(1);
        self.increment = increment;
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<Point> {
        self.target
    }

    /// In `[0, 1)` while active, 0 at rest.
    pub fn progress(&self) -> f32 {
        (self.elapsed as f32 * self.increment).min(1.0)
    }

    /// One animation step: ease the body's center toward the target, or on
    /// the last step snap onto it and return to rest. An eased step that
    /// would enter terrain is skipped and the body holds its position.
    /// Returns `true` on the snapping step.
    pub fn advance(&mut self, body: &mut Body, easing: f32, level: &Level) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        self.elapsed += 1;
        if self.elapsed >= self.total {
            body.set_center(target);
            *self = Self::default();
            return true;
        }
        let c = body.center();
        let x = c.x as f32 + (target.x - c.x) as f32 * easing;
        let y = c.y as f32 + (target.y - c.y) as f32 * easing;
        let mut eased = body.clone();
        eased.set_center(Point::new(x.round() as i32, y.round() as i32));
        if !eased.overlaps_terrain(level) {
            *body = eased;
        }
        false
    }
}

/// The two linked portals. Using either closes both until the cooldown
/// runs out and a fresh pair is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalPair {
    pub active: bool,
    pub positions: [Point; 2],
    pub cooldown_ticks: u32,
}

impl PortalPair {
    pub fn new(positions: [Point; 2]) -> Self {
        Self {
            active: true,
            positions,
            cooldown_ticks: 0,
        }
    }

    /// Draw a fresh open pair. `landing` is the size of the largest body
    /// that may come out of either portal.
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        level: &Level,
        config: &PortalConfig,
        landing: (i32, i32),
    ) -> Self {
        Self::new(draw_positions(rng, level, config, landing))
    }

    /// Index of the portal whose radius the body's center is inside.
    pub fn entered_by(&self, body: &Body, radius: i32) -> Option<usize> {
        if !self.active {
            return None;
        }
        let center = body.center();
        let reach = (radius + body.width() / 2) as f32;
        self.positions.iter().position(|&p| center.distance(p) < reach)
    }

    /// Landing point for a body entering portal `entered`: the other portal,
    /// moved `margin` pixels away from the floor.
    pub fn exit_point(&self, entered: usize, margin: i32, gravity: GravityDir) -> Point {
        landing_point(self.positions[1 - entered.min(1)], margin, gravity)
    }

    pub fn close(&mut self, cooldown_ticks: u32) {
        self.active = false;
        self.cooldown_ticks = cooldown_ticks;
    }

    /// Count down while closed. Once the cooldown is already at zero the
    /// pair is redrawn and reopened; returns `true` on that tick.
    pub fn tick_cooldown<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        level: &Level,
        config: &PortalConfig,
        landing: (i32, i32),
    ) -> bool {
        if self.active {
            return false;
        }
        if self.cooldown_ticks > 0 {
            self.cooldown_ticks -= 1;
            return false;
        }
        self.positions = draw_positions(rng, level, config, landing);
        self.active = true;
        debug!(positions = ?self.positions, "portals respawned");
        true
    }
}

fn landing_point(portal: Point, margin: i32, gravity: GravityDir) -> Point {
    Point::new(portal.x, portal.y + gravity.up_step() * margin)
}

/// Draw two portal positions, redrawing any whose landing spot cannot hold
/// a `landing`-sized body.
fn draw_positions<R: Rng + ?Sized>(
    rng: &mut R,
    level: &Level,
    config: &PortalConfig,
    landing: (i32, i32),
) -> [Point; 2] {
    let placement = Placement {
        clearance: config.clearance,
        edge_margin: config.edge_margin,
        vertical_margin: config.radius,
    };
    let (w, h) = landing;
    let mask = Mask::filled(w, h);
    let gravity = level.gravity_dir();
    let clear = |p: Point| {
        let mut rect = Rect::new(0, 0, w, h);
        rect.set_center(landing_point(p, config.exit_margin, gravity));
        !level.overlaps(&mask, Point::new(rect.x, rect.y))
    };

    let mut draw = || {
        let mut p = level.spawn_point(&mut *rng, placement);
        for _ in 0..config.placement_attempts {
            if clear(p) {
                return p;
            }
            p = level.spawn_point(&mut *rng, placement);
        }
        if !clear(p) {
            warn!(
                x = p.x,
                y = p.y,
                attempts = config.placement_attempts,
                "no clear portal landing found, keeping last draw"
            );
        }
        p
    };
    [draw(), draw()]
}

/// What a player's portal handling did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportStep {
    Idle,
    Started(Point),
    InTransit,
    Finished,
}

/// Drive one player's teleport for a tick. An active teleport only
/// animates; otherwise touching an open portal starts one and closes the
/// pair. A snap that lands in terrain is pushed out against gravity.
pub fn handle_teleport(
    body: &mut Body,
    teleport: &mut TeleportState,
    portals: &mut PortalPair,
    level: &Level,
    config: &PortalConfig,
    tick_rate: f32,
) -> TeleportStep {
    if teleport.is_active() {
        if !teleport.advance(body, config.easing, level) {
            return TeleportStep::InTransit;
        }
        if !body.push_clear(level, config.exit_attempts) {
            let rect = body.rect();
            warn!(
                x = rect.x,
                y = rect.y,
                attempts = config.exit_attempts,
                "teleport landed in terrain and could not be pushed clear"
            );
        }
        return TeleportStep::Finished;
    }
    let Some(entered) = portals.entered_by(body, config.radius) else {
        return TeleportStep::Idle;
    };
    let target = portals.exit_point(entered, config.exit_margin, level.gravity_dir());
    teleport.begin(target, config.teleport_ticks(), config.teleport_increment);
    portals.close(config.cooldown_ticks(tick_rate));
    TeleportStep::Started(target)
}
