use std::fmt::Display;
use std::ops::{Add, AddAssign, Neg, Sub};

use egui::{Pos2, Rect, Vec2, pos2, vec2};

/// A lattice point in grid units. Element positions and wire nodes live here.
#[derive(
    serde::Deserialize,
    serde::Serialize,
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_pixel(self, grid_size: f32) -> Pos2 {
        to_pixel(self, grid_size)
    }

    pub fn to_vec2(self) -> Vec2 {
        vec2(self.x as f32, self.y as f32)
    }
}

impl Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for GridPos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for GridPos {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for GridPos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for GridPos {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Unrotated rectangle in local grid units, anchored at the element origin.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl GridRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Local pixel rectangle, before the element transform is applied.
    pub fn to_local_pixels(self, grid_size: f32) -> Rect {
        Rect::from_min_size(
            pos2(self.x as f32 * grid_size, self.y as f32 * grid_size),
            vec2(self.w as f32 * grid_size, self.h as f32 * grid_size),
        )
    }
}

/// One of the four quarter-turn orientations of an element.
///
/// The discriminant is the number of `-90°` turns applied in screen space
/// (y grows downwards), so `North` turns the local +x axis to point up.
#[derive(
    serde::Deserialize, serde::Serialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum Facing {
    #[default]
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Facing {
    pub const ALL: [Self; 4] = [Self::East, Self::North, Self::West, Self::South];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// The next facing counter-clockwise on screen.
    pub fn turned(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::East => "East",
            Self::North => "North",
            Self::West => "West",
            Self::South => "South",
        }
    }

    /// Rotates a grid offset exactly.
    pub fn rotate(self, offset: GridPos) -> GridPos {
        let GridPos { x, y } = offset;
        match self {
            Self::East => GridPos::new(x, y),
            Self::North => GridPos::new(y, -x),
            Self::West => GridPos::new(-x, -y),
            Self::South => GridPos::new(-y, x),
        }
    }

    /// Same rotation as [`Self::rotate`], for pixel offsets.
    pub fn rotate_vec(self, v: Vec2) -> Vec2 {
        match self {
            Self::East => v,
            Self::North => vec2(v.y, -v.x),
            Self::West => vec2(-v.x, -v.y),
            Self::South => vec2(-v.y, v.x),
        }
    }
}

/// Snaps a widget-local pixel point to the nearest lattice point. Points
/// exactly half a cell between two lattice points go to the even one.
pub fn to_grid(pixel: Pos2, translation: Vec2, grid_size: f32) -> GridPos {
    let d = pixel - translation;
    GridPos::new(
        (d.x / grid_size).round_ties_even() as i32,
        (d.y / grid_size).round_ties_even() as i32,
    )
}

pub fn to_pixel(grid: GridPos, grid_size: f32) -> Pos2 {
    pos2(grid.x as f32 * grid_size, grid.y as f32 * grid_size)
}

/// Translate-then-rotate transform from element-local pixels to diagram pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementTransform {
    pub origin: Pos2,
    pub facing: Facing,
}

impl ElementTransform {
    pub fn new(position: GridPos, facing: Facing, grid_size: f32) -> Self {
        Self {
            origin: position.to_pixel(grid_size),
            facing,
        }
    }

    pub fn map_pos(&self, local: Pos2) -> Pos2 {
        self.origin + self.facing.rotate_vec(local.to_vec2())
    }

    /// Axis-aligned bounds of the rotated rectangle. Quarter turns keep it exact.
    pub fn map_rect(&self, local: Rect) -> Rect {
        Rect::from_two_pos(self.map_pos(local.min), self.map_pos(local.max))
    }
}

pub fn element_transform(position: GridPos, facing: Facing, grid_size: f32) -> ElementTransform {
    ElementTransform::new(position, facing, grid_size)
}
