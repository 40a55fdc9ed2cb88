//! Basic building blocks.

use std::{
    f64::consts::{PI, TAU},
    ops::{Add, AddAssign, Div, Mul, Neg, Sub},
};

/// Magnitudes below this are treated as having no usable direction.
pub const DIRECTION_EPSILON: f64 = 1e-3;

/// Wraps an angle in radians into `(-π, π]`.
pub fn wrap_angle(radians: f64) -> f64 {
    let wrapped = PI - (PI - radians).rem_euclid(TAU);
    // `rem_euclid` rounds up to `TAU` just above π.
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Vector2 {
    x: f64,
    y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_polar(radius: f64, angle: Angle) -> Self {
        Self::unit(angle) * radius
    }

    pub fn unit(angle: Angle) -> Self {
        let theta = angle.radians();
        Self::new(theta.cos(), theta.sin())
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn dot(&self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product, `x1 * y2 - y1 * x2`.
    pub fn cross(&self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: Self) -> f64 {
        (*self - other).magnitude()
    }

    /// Unit vector in the same direction. Vectors shorter than [`DIRECTION_EPSILON`] are
    /// returned unchanged.
    pub fn normalize(&self) -> Self {
        let magnitude = self.magnitude();
        if magnitude < DIRECTION_EPSILON {
            *self
        } else {
            *self / magnitude
        }
    }

    pub fn rescale(&self, magnitude: f64) -> Self {
        self.normalize() * magnitude
    }

    /// Counter-clockwise rotation.
    pub fn rotate(&self, angle: Angle) -> Self {
        let (sin, cos) = angle.radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn angle(&self) -> Angle {
        Angle::new(self.y.atan2(self.x))
    }

    /// Rotation by 90° counter-clockwise.
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }
}

impl From<Vector2> for (f32, f32) {
    fn from(value: Vector2) -> Self {
        (value.x as f32, value.y as f32)
    }
}

impl From<Vector2> for (f64, f64) {
    fn from(value: Vector2) -> Self {
        (value.x, value.y)
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Vector2> for nalgebra::Vector2<f64> {
    fn from(value: Vector2) -> Self {
        nalgebra::Vector2::new(value.x, value.y)
    }
}

impl From<nalgebra::Vector2<f64>> for Vector2 {
    fn from(value: nalgebra::Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

/// Accumulates in place, e.g. when summing several directional inputs before normalizing.
impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;

    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

/// Angle in radians, always kept within `(-π, π]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new(radians: f64) -> Self {
        Self(wrap_angle(radians))
    }

    pub fn from_deg(degree: f64) -> Self {
        Self::new(degree.to_radians())
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Degrees within `[0, 360)`.
    pub fn to_deg(self) -> f64 {
        self.0.to_degrees().rem_euclid(360.0)
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Angle::new(-self.0)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.0 - rhs.0)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

impl From<Angle> for f32 {
    fn from(value: Angle) -> Self {
        value.0 as f32
    }
}
