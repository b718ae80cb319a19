use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// A point or offset in continuous world space. The y axis grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Vector2F {
    pub x: f32,
    pub y: f32,
}

impl Vector2F {
    pub const ZERO: Vector2F = Vector2F { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vector2F { x, y }
    }

    pub fn translated(&self, by: Vector2F) -> Self {
        *self + by
    }

    pub fn negated(&self) -> Self {
        -*self
    }

    pub fn x_distance(&self, other: &Vector2F) -> f32 {
        (self.x - other.x).abs()
    }

    pub fn y_distance(&self, other: &Vector2F) -> f32 {
        (self.y - other.y).abs()
    }

    pub fn distance_squared(&self, other: &Vector2F) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;

        dx * dx + dy * dy
    }

    pub fn euclidean_distance(&self, other: &Vector2F) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// The grid cell containing this point when cells are `cell_size` units wide.
    pub fn to_grid(&self, cell_size: f32) -> GridPoint {
        GridPoint::new(
            (self.x / cell_size).floor() as i32,
            (self.y / cell_size).floor() as i32,
        )
    }
}

impl Add for Vector2F {
    type Output = Vector2F;

    fn add(self, rhs: Vector2F) -> Vector2F {
        Vector2F::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2F {
    type Output = Vector2F;

    fn sub(self, rhs: Vector2F) -> Vector2F {
        Vector2F::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vector2F {
    type Output = Vector2F;

    fn neg(self) -> Vector2F {
        Vector2F::new(-self.x, -self.y)
    }
}

impl From<[f32; 2]> for Vector2F {
    fn from([x, y]: [f32; 2]) -> Self {
        Vector2F::new(x, y)
    }
}

/// Integer cell coordinate. Used as the key type wherever points index a map or graph.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        GridPoint { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        GridPoint::new(self.x + dx, self.y + dy)
    }

    pub fn below(&self) -> Self {
        self.offset(0, 1)
    }

    /// World-space center of this cell.
    pub fn center(&self, cell_size: f32) -> Vector2F {
        Vector2F::new(
            (self.x as f32 + 0.5) * cell_size,
            (self.y as f32 + 0.5) * cell_size,
        )
    }

    pub fn euclidean_distance(&self, other: &GridPoint) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;

        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle. `top <= bottom` and `left <= right` always hold.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Hitbox {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Hitbox {
    /// Bounds may be given in any order; they are normalized.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Hitbox {
            top: top.min(bottom),
            bottom: top.max(bottom),
            left: left.min(right),
            right: left.max(right),
        }
    }

    /// The box spanned by two opposite corners.
    pub fn from_corners(a: Vector2F, b: Vector2F) -> Self {
        Hitbox::new(a.x, a.y, b.x, b.y)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vector2F {
        Vector2F::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn top_left(&self) -> Vector2F {
        Vector2F::new(self.left, self.top)
    }

    pub fn translated(&self, by: Vector2F) -> Self {
        Hitbox {
            top: self.top + by.y,
            bottom: self.bottom + by.y,
            left: self.left + by.x,
            right: self.right + by.x,
        }
    }

    pub fn union(&self, other: &Hitbox) -> Self {
        Hitbox {
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
        }
    }

    pub fn contains_point(&self, p: &Vector2F) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// True iff `other` lies entirely within this box, edges included.
    pub fn contains(&self, other: &Hitbox) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Cheap conservative check. Touching boxes count as intersecting.
    pub fn quick_intersect(&self, other: &Hitbox) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// True iff the interiors overlap. Shared edges and corners are not an intersection.
    pub fn intersects(&self, other: &Hitbox) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// The bounding box of all `hitboxes`, or `None` if there are none.
pub fn bounding_hitbox<'a>(hitboxes: impl IntoIterator<Item = &'a Hitbox>) -> Option<Hitbox> {
    hitboxes
        .into_iter()
        .fold(None, |acc: Option<Hitbox>, h| match acc {
            Some(b) => Some(b.union(h)),
            None => Some(*h),
        })
}

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub start: Vector2F,
    pub end: Vector2F,
}

impl Line {
    pub fn new(start: Vector2F, end: Vector2F) -> Self {
        Line { start, end }
    }

    pub fn bounds(&self) -> Hitbox {
        Hitbox::from_corners(self.start, self.end)
    }

    /// Exact test of the segment against the closed rectangle, by Liang-Barsky clipping.
    pub fn intersects(&self, hitbox: &Hitbox) -> bool {
        let d = self.end - self.start;
        let clips = [
            (-d.x, self.start.x - hitbox.left),
            (d.x, hitbox.right - self.start.x),
            (-d.y, self.start.y - hitbox.top),
            (d.y, hitbox.bottom - self.start.y),
        ];

        let mut t_enter = 0.0f32;
        let mut t_exit = 1.0f32;
        for &(p, q) in clips.iter() {
            if p == 0.0 {
                // Parallel to this edge; reject if entirely outside of it.
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t > t_exit {
                    return false;
                }
                t_enter = t_enter.max(t);
            } else {
                if t < t_enter {
                    return false;
                }
                t_exit = t_exit.min(t);
            }
        }

        t_enter <= t_exit
    }

    /// Quick bounding test first, exact test only when that passes.
    pub fn crosses_any<'a>(&self, walls: impl IntoIterator<Item = &'a Hitbox>) -> bool {
        let bounds = self.bounds();
        walls
            .into_iter()
            .any(|w| w.quick_intersect(&bounds) && self.intersects(w))
    }
}
