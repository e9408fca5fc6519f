use serde::{Deserialize, Serialize};

use crate::foundation::math::lerp_f64;

/// Point in the plane.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// Point in space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Depth coordinate.
    pub z: f64,
}

/// Width and height.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Size2D {
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

/// Width, height and depth.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Size3D {
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
    /// Extent along z.
    pub depth: f64,
}

/// Component-wise interpolation for vector-like parameter values.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with factor `t`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for Point2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            x: lerp_f64(a.x, b.x, t),
            y: lerp_f64(a.y, b.y, t),
        }
    }
}

impl Lerp for Point3D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            x: lerp_f64(a.x, b.x, t),
            y: lerp_f64(a.y, b.y, t),
            z: lerp_f64(a.z, b.z, t),
        }
    }
}

impl Lerp for Size2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            width: lerp_f64(a.width, b.width, t),
            height: lerp_f64(a.height, b.height, t),
        }
    }
}

impl Lerp for Size3D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            width: lerp_f64(a.width, b.width, t),
            height: lerp_f64(a.height, b.height, t),
            depth: lerp_f64(a.depth, b.depth, t),
        }
    }
}

impl From<Point2D> for kurbo::Point {
    fn from(p: Point2D) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

impl From<kurbo::Point> for Point2D {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Size2D> for kurbo::Size {
    fn from(s: Size2D) -> Self {
        kurbo::Size::new(s.width, s.height)
    }
}
