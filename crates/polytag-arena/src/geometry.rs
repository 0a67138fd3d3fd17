use serde::{Deserialize, Serialize};

/// Integer point in level space (x right, y down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned integer rectangle. `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Center using floor-halved extents, so `set_center(c)` then
    /// `center()` returns `c` exactly.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn set_center(&mut self, center: Point) {
        self.x = center.x - self.width / 2;
        self.y = center.y - self.height / 2;
    }

    /// Strict overlap: rectangles that only share an edge do not collide,
    /// and empty rectangles never collide.
    pub fn collides(&self, other: &Rect) -> bool {
        self.width > 0
            && self.height > 0
            && other.width > 0
            && other.height > 0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Move inside `area`. A rectangle larger than `area` on an axis is
    /// centered on that axis instead.
    pub fn clamp_within(&mut self, area: &Rect) {
        if self.width >= area.width {
            self.x = area.x + area.width / 2 - self.width / 2;
        } else if self.x < area.x {
            self.x = area.x;
        } else if self.right() > area.right() {
            self.x = area.right() - self.width;
        }

        if self.height >= area.height {
            self.y = area.y + area.height / 2 - self.height / 2;
        } else if self.y < area.y {
            self.y = area.y;
        } else if self.bottom() > area.bottom() {
            self.y = area.bottom() - self.height;
        }
    }
}

/// Per-pixel occupancy bitmap, row-major, addressed in local coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: i32,
    height: i32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn empty(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Fully occupied mask, the shape of a rectangular player body.
    pub fn filled(width: i32, height: i32) -> Self {
        let mut mask = Self::empty(width, height);
        mask.bits.fill(true);
        mask
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        self.bits[self.index(x, y)]
    }

    pub(crate) fn set(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            let i = self.index(x, y);
            self.bits[i] = true;
        }
    }

    /// Row-major index of an in-bounds pixel.
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Whether `other`, placed at `offset` in this mask's local space,
    /// shares any occupied pixel with this mask.
    pub fn overlaps(&self, other: &Mask, offset: (i32, i32)) -> bool {
        let (ox, oy) = offset;
        let x_start = ox.max(0);
        let x_end = (ox + other.width).min(self.width);
        let y_start = oy.max(0);
        let y_end = (oy + other.height).min(self.height);

        for y in y_start..y_end {
            for x in x_start..x_end {
                if self.bits[self.index(x, y)] && other.get(x - ox, y - oy) {
                    return true;
                }
            }
        }
        false
    }
}
