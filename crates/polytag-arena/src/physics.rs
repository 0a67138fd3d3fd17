use serde::{Deserialize, Serialize};

use crate::geometry::{Mask, Point, Rect};
use crate::level::{GravityDir, Level};

/// Default ledge height a walking body can climb, in pixels.
pub const STEP_HEIGHT: u32 = 10;

/// A player's collidable rectangle with its occupancy mask.
///
/// The mask always matches the rectangle's dimensions; every resize goes
/// through `resize_anchored`, which rebuilds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    rect: Rect,
    mask: Mask,
}

impl Body {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
            mask: Mask::filled(width, height),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn position(&self) -> Point {
        Point::new(self.rect.x, self.rect.y)
    }

    pub fn width(&self) -> i32 {
        self.rect.width
    }

    pub fn height(&self) -> i32 {
        self.rect.height
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn set_center(&mut self, center: Point) {
        self.rect.set_center(center);
    }

    pub fn set_position(&mut self, p: Point) {
        self.rect.x = p.x;
        self.rect.y = p.y;
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.rect.x += dx;
        self.rect.y += dy;
    }

    /// Change size keeping the horizontal center and the floor-side edge
    /// (bottom under normal gravity, top when inverted), then rebuild the mask.
    pub fn resize_anchored(&mut self, width: i32, height: i32, gravity: GravityDir) {
        let center_x = self.rect.center().x;
        let old_bottom = self.rect.bottom();
        let old_top = self.rect.y;

        self.rect.width = width;
        self.rect.height = height;
        self.rect.x = center_x - width / 2;
        self.rect.y = match gravity {
            GravityDir::Down => old_bottom - height,
            GravityDir::Up => old_top,
        };
        self.mask = Mask::filled(width, height);
    }

    pub fn clamp_within(&mut self, area: &Rect) {
        self.rect.clamp_within(area);
    }

    pub fn overlaps_terrain(&self, level: &Level) -> bool {
        level.overlaps(&self.mask, self.position())
    }

    /// Push away from the floor one pixel at a time, at most `attempts`
    /// times, until clear of terrain. Returns whether the body ended clear.
    pub fn push_clear(&mut self, level: &Level, attempts: u32) -> bool {
        let up = level.gravity_dir().up_step();
        for _ in 0..attempts {
            if !self.overlaps_terrain(level) {
                return true;
            }
            self.translate(0, up);
        }
        !self.overlaps_terrain(level)
    }
}

/// Per-player bounds on vertical motion for one resolution step.
#[derive(Debug, Clone, Copy)]
pub struct MotionLimits {
    pub gravity: f32,
    /// Cap on positive (downward) velocity.
    pub max_fall: f32,
    /// Cap on the magnitude of negative velocity. `None` reuses `max_fall`.
    pub max_jump: Option<f32>,
    pub step_height: u32,
}

/// Outcome of one resolution step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub velocity_y: f32,
    pub on_ground: bool,
    pub on_ceiling: bool,
}

/// Move `body` by `dx` horizontally (climbing ledges up to `step_height`),
/// then integrate gravity into `velocity_y` and advance one pixel at a time
/// until the displacement is used up or terrain is hit.
///
/// A body that starts clear of terrain ends clear of terrain.
pub fn resolve(
    body: &mut Body,
    level: &Level,
    dx: i32,
    velocity_y: f32,
    limits: &MotionLimits,
) -> Contact {
    let mut contact = Contact::default();

    if dx != 0 {
        body.translate(dx, 0);
        if body.overlaps_terrain(level) {
            let up = GravityDir::from_gravity(limits.gravity).up_step();
            let mut raised = 0;
            let mut cleared = false;
            while raised < limits.step_height {
                body.translate(0, up);
                raised += 1;
                if !body.overlaps_terrain(level) {
                    cleared = true;
                    break;
                }
            }
            if !cleared {
                body.translate(-dx, -up * raised as i32);
            }
        }
    }

    let mut vy = if velocity_y.is_finite() {
        velocity_y + limits.gravity
    } else {
        limits.gravity
    };
    let up_cap = limits.max_jump.map_or(limits.max_fall, f32::abs);
    vy = vy.min(limits.max_fall).max(-up_cap);

    let steps = (vy.abs().round() as u32).max(1);
    let dir = if vy < 0.0 { -1 } else { 1 };
    for _ in 0..steps {
        body.translate(0, dir);
        if body.overlaps_terrain(level) {
            body.translate(0, -dir);
            vy = 0.0;
            if dir > 0 {
                contact.on_ground = true;
            } else {
                contact.on_ceiling = true;
            }
            break;
        }
    }

    contact.velocity_y = vy;
    contact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelConfig, LevelPreset};

    fn plains() -> Level {
        Level::preset(LevelPreset::Plains).unwrap()
    }

    fn limits(gravity: f32) -> MotionLimits {
        MotionLimits {
            gravity,
            max_fall: 15.0,
            max_jump: None,
            step_height: STEP_HEIGHT,
        }
    }

    /// Plains floor plus one extra block.
    fn level_with_block(block: Vec<(i32, i32)>) -> Level {
        let mut config: LevelConfig = LevelPreset::Plains.config();
        config.polygons.push(block);
        Level::load(config).unwrap()
    }

    #[test]
    fn falling_body_lands_exactly_on_floor() {
        let level = plains();
        let mut body = Body::new(500, 1300 - 22 - 50, 22, 22);
        let mut vy = 0.0;
        let mut landed = false;
        for _ in 0..200 {
            let c = resolve(&mut body, &level, 0, vy, &limits(0.5));
            vy = c.velocity_y;
            if c.on_ground {
                landed = true;
                break;
            }
        }
        assert!(landed, "body should land");
        assert_eq!(vy, 0.0);
        assert_eq!(body.rect().bottom(), 1300);
    }

    #[test]
    fn resting_body_stays_grounded() {
        let level = plains();
        let mut body = Body::new(500, 1278, 22, 22);
        for _ in 0..10 {
            let c = resolve(&mut body, &level, 0, 0.0, &limits(0.5));
            assert!(c.on_ground);
            assert_eq!(c.velocity_y, 0.0);
            assert_eq!(body.rect().y, 1278);
        }
    }

    #[test]
    fn fall_speed_is_capped() {
        let level = plains();
        let mut body = Body::new(500, 100, 22, 22);
        let c = resolve(&mut body, &level, 0, 40.0, &limits(0.5));
        assert_eq!(c.velocity_y, 15.0);
        assert_eq!(body.rect().y, 115);
    }

    #[test]
    fn jump_cap_is_independent_of_fall_cap() {
        let level = plains();
        let mut body = Body::new(500, 600, 22, 22);
        let lim = MotionLimits {
            max_jump: Some(27.0),
            ..limits(0.5)
        };
        let c = resolve(&mut body, &level, 0, -40.0, &lim);
        assert_eq!(c.velocity_y, -27.0);

        let mut body = Body::new(500, 600, 22, 22);
        let c = resolve(&mut body, &level, 0, -40.0, &limits(0.5));
        assert_eq!(c.velocity_y, -15.0, "symmetric cap without max_jump");
    }

    #[test]
    fn ceiling_hit_zeroes_velocity() {
        let level = level_with_block(vec![(400, 500), (700, 500), (700, 520), (400, 520)]);
        let mut body = Body::new(500, 530, 22, 22);
        let c = resolve(&mut body, &level, 0, -14.0, &limits(0.5));
        assert!(c.on_ceiling);
        assert!(!c.on_ground);
        assert_eq!(c.velocity_y, 0.0);
        assert_eq!(body.rect().y, 520);
    }

    #[test]
    fn zero_velocity_steps_toward_positive_y() {
        let level = plains();
        let mut body = Body::new(500, 600, 22, 22);
        let lim = MotionLimits {
            gravity: 0.0,
            ..limits(0.0)
        };
        let c = resolve(&mut body, &level, 0, 0.0, &lim);
        assert_eq!(body.rect().y, 601);
        assert_eq!(c.velocity_y, 0.0);
    }

    #[test]
    fn climbs_low_step() {
        // 6px step starting at x=530.
        let level = level_with_block(vec![(530, 1294), (800, 1294), (800, 1300), (530, 1300)]);
        let mut body = Body::new(505, 1278, 22, 22);
        resolve(&mut body, &level, 7, 0.0, &limits(0.5));
        assert_eq!(body.rect().x, 512);
        assert_eq!(body.rect().bottom(), 1294);
        assert!(!body.overlaps_terrain(&level));
    }

    #[test]
    fn wall_blocks_and_reverts_fully() {
        // 40px wall starting at x=530.
        let level = level_with_block(vec![(530, 1260), (560, 1260), (560, 1300), (530, 1300)]);
        let mut body = Body::new(505, 1278, 22, 22);
        let c = resolve(&mut body, &level, 7, 0.0, &limits(0.5));
        assert_eq!(body.rect().x, 505, "horizontal move reverted");
        assert_eq!(body.rect().y, 1278, "partial raise undone");
        assert!(c.on_ground);
    }

    #[test]
    fn inverted_gravity_rests_on_ceiling() {
        let level = Level::preset(LevelPreset::Gravity).unwrap();
        let mut body = Body::new(500, 160, 20, 20);
        let mut vy = 0.0;
        let mut on_ceiling = false;
        for _ in 0..200 {
            let c = resolve(&mut body, &level, 0, vy, &limits(-0.7));
            vy = c.velocity_y;
            on_ceiling = c.on_ceiling;
            if on_ceiling {
                break;
            }
        }
        assert!(on_ceiling);
        assert_eq!(body.rect().y, 100);
    }

    #[test]
    fn inverted_gravity_steps_down_onto_ledge() {
        let mut config = LevelPreset::Gravity.config();
        config
            .polygons
            .push(vec![(530, 100), (800, 100), (800, 106), (530, 106)]);
        let level = Level::load(config).unwrap();
        let mut body = Body::new(505, 100, 20, 20);
        resolve(&mut body, &level, 9, 0.0, &limits(-0.7));
        assert_eq!(body.rect().x, 514);
        assert_eq!(body.rect().y, 106);
    }

    #[test]
    fn non_finite_velocity_is_discarded() {
        let level = plains();
        let mut body = Body::new(500, 600, 22, 22);
        let c = resolve(&mut body, &level, 0, f32::NAN, &limits(0.5));
        assert_eq!(c.velocity_y, 0.5);
    }

    #[test]
    fn resize_keeps_center_and_floor_edge() {
        let mut body = Body::new(100, 1278, 22, 22);
        let cx = body.center().x;
        body.resize_anchored(37, 37, GravityDir::Down);
        assert_eq!(body.rect().bottom(), 1300);
        assert!((body.center().x - cx).abs() <= 1);
        assert_eq!(body.mask().width(), 37);
        assert_eq!(body.mask().count(), 37 * 37);

        let mut body = Body::new(100, 100, 20, 20);
        body.resize_anchored(35, 35, GravityDir::Up);
        assert_eq!(body.rect().y, 100);
    }

    #[test]
    fn push_clear_moves_against_gravity() {
        let level = plains();
        let mut body = Body::new(100, 1290, 22, 22);
        assert!(body.push_clear(&level, 20));
        assert_eq!(body.rect().bottom(), 1300);

        let level = Level::preset(LevelPreset::Gravity).unwrap();
        let mut body = Body::new(100, 90, 20, 20);
        assert!(body.push_clear(&level, 20));
        assert_eq!(body.rect().y, 100);
    }

    #[test]
    fn push_clear_gives_up_after_attempts() {
        let level = plains();
        let mut body = Body::new(100, 1320, 22, 22);
        assert!(!body.push_clear(&level, 5));
        assert_eq!(body.rect().y, 1315);
        assert!(body.overlaps_terrain(&level));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn body_never_ends_inside_terrain(
                moves in proptest::collection::vec((-1i32..=1, any::<bool>()), 10..120)
            ) {
                let level = Level::load(
                    LevelConfig::from_toml(include_str!("../../../config/levels/ledges.toml"))
                        .unwrap(),
                )
                .unwrap();
                let mut body = Body::new(600, 1200, 22, 22);
                let mut vy = 0.0f32;
                let mut on_ground = false;
                let lim = MotionLimits {
                    max_jump: Some(15.0),
                    ..limits(0.5)
                };

                for (dir, jump) in moves {
                    if jump && on_ground {
                        vy = -15.0;
                    }
                    let c = resolve(&mut body, &level, dir * 7, vy, &lim);
                    vy = c.velocity_y;
                    on_ground = c.on_ground;
                    body.clamp_within(&level.play_area());
                    prop_assert!(
                        !body.overlaps_terrain(&level),
                        "body at {:?} overlaps terrain",
                        body.rect()
                    );
                }
            }

            #[test]
            fn velocity_stays_within_caps(
                start_vy in -100.0f32..100.0,
                gravity in -2.0f32..2.0,
            ) {
                let level = plains();
                let mut body = Body::new(500, 600, 22, 22);
                let lim = MotionLimits {
                    gravity,
                    max_fall: 15.0,
                    max_jump: Some(20.0),
                    step_height: STEP_HEIGHT,
                };
                let c = resolve(&mut body, &level, 0, start_vy, &lim);
                prop_assert!(c.velocity_y <= 15.0 && c.velocity_y >= -20.0);
            }
        }
    }
}
