//! Collision detection between polygonal shapes.
//!
//! Shapes are defined in local coordinates around their own origin. Queries between two shapes
//! take the offset of the second shape's origin relative to the first one.

use std::borrow::Cow;

use thiserror::Error;

use super::{Angle, Vector2};

pub trait HasCollision {
    /// Overlap from both shapes' perspectives, see [`Shape::overlaps`].
    fn has_collision(&self, other: &dyn HasCollision) -> bool {
        self.shape()
            .overlaps(&other.shape(), other.position() - self.position())
    }

    fn shape(&self) -> Shape;

    fn position(&self) -> Vector2;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle centered on the origin.
    Rectangle(Rectangle),
    /// Closed vertex ring, not necessarily convex.
    Polygon(Edges),
    /// Segment without interior.
    Line { start: Vector2, end: Vector2 },
    /// Outline without interior.
    Edges(Edges),
}

impl Shape {
    pub fn rectangle(width: f64, height: f64) -> Result<Self, ShapeError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ShapeError::InvalidDimensions(width, height));
        }
        Ok(Shape::Rectangle(Rectangle { width, height }))
    }

    pub fn polygon(points: Vec<Vector2>) -> Result<Self, ShapeError> {
        Ok(Shape::Polygon(Edges::ring(points)?))
    }

    pub fn line(start: Vector2, end: Vector2) -> Self {
        Shape::Line { start, end }
    }

    /// Whether a point in local coordinates lies inside the shape.
    pub fn hit(&self, point: Vector2) -> bool {
        match self {
            Shape::Rectangle(rectangle) => {
                point.x().abs() <= rectangle.width() / 2.0
                    && point.y().abs() <= rectangle.height() / 2.0
            }
            Shape::Polygon(edges) => {
                let crossings = edges.segments().filter(|s| s.crosses_ray(point)).count();
                crossings % 2 == 1
            }
            Shape::Line { .. } | Shape::Edges(_) => false,
        }
    }

    pub fn edges(&self) -> Cow<'_, Edges> {
        match self {
            Shape::Rectangle(rectangle) => {
                let (x, y) = (rectangle.width() / 2.0, rectangle.height() / 2.0);
                Cow::Owned(Edges {
                    points: vec![
                        Vector2::new(-x, y),
                        Vector2::new(x, y),
                        Vector2::new(x, -y),
                        Vector2::new(-x, -y),
                    ],
                    closed: true,
                })
            }
            Shape::Polygon(edges) | Shape::Edges(edges) => Cow::Borrowed(edges),
            Shape::Line { start, end } => Cow::Owned(Edges {
                points: vec![*start, *end],
                closed: false,
            }),
        }
    }

    /// Whether `other`, with its origin at `offset` from this shape's origin, intersects this
    /// shape. True if the outlines cross or if this shape's origin lies inside `other`.
    ///
    /// Only this shape's origin is tested for containment, so a shape lying entirely inside
    /// this one without touching its outline is not detected. Use [`Shape::overlaps`] for the
    /// symmetric check.
    pub fn intersects(&self, other: &Shape, offset: Vector2) -> bool {
        self.edges().intersects(&other.edges(), offset) || other.hit(-offset)
    }

    /// Symmetric variant of [`Shape::intersects`] that also tests `other`'s origin against
    /// this shape.
    pub fn overlaps(&self, other: &Shape, offset: Vector2) -> bool {
        self.intersects(other, offset) || self.hit(offset)
    }

    /// Shape rotated counter-clockwise around its origin. Rotated rectangles become polygons.
    pub fn rotated(&self, angle: Angle) -> Shape {
        match self {
            Shape::Rectangle(_) if angle == Angle::ZERO => self.clone(),
            Shape::Rectangle(_) | Shape::Polygon(_) => {
                Shape::Polygon(self.edges().rotated(angle))
            }
            Shape::Line { start, end } => Shape::Line {
                start: start.rotate(angle),
                end: end.rotate(angle),
            },
            Shape::Edges(edges) => Shape::Edges(edges.rotated(angle)),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.edges().bounds()
    }
}

/// Dimensions of [`Shape::Rectangle`], only built through [`Shape::rectangle`].
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Rectangle {
    width: f64,
    height: f64,
}

impl Rectangle {
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Ordered vertex sequence. Consecutive vertices form the segments of the outline, including
/// the segment from the last vertex back to the first one if the ring is closed.
#[derive(Clone, Debug, PartialEq)]
pub struct Edges {
    points: Vec<Vector2>,
    closed: bool,
}

impl Edges {
    pub fn ring(points: Vec<Vector2>) -> Result<Self, ShapeError> {
        if points.len() < 3 {
            return Err(ShapeError::TooFewVertices {
                expected: 3,
                actual: points.len(),
            });
        }
        Self::checked(points, true)
    }

    pub fn polyline(points: Vec<Vector2>) -> Result<Self, ShapeError> {
        if points.len() < 2 {
            return Err(ShapeError::TooFewVertices {
                expected: 2,
                actual: points.len(),
            });
        }
        Self::checked(points, false)
    }

    fn checked(points: Vec<Vector2>, closed: bool) -> Result<Self, ShapeError> {
        if let Some(p) = points
            .iter()
            .find(|p| !(p.x().is_finite() && p.y().is_finite()))
        {
            return Err(ShapeError::NonFiniteVertex(*p));
        }
        Ok(Self { points, closed })
    }

    pub fn n(&self) -> usize {
        self.points.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn points(&self) -> &[Vector2] {
        &self.points
    }

    /// Vertex `i mod n`.
    pub fn point(&self, i: usize) -> Vector2 {
        self.points[i % self.points.len()]
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = if self.closed { self.n() } else { self.n() - 1 };
        (0..n).map(|i| Segment::new(self.point(i), self.point(i + 1)))
    }

    /// Whether any segment of this outline crosses any segment of `other`, with `other`
    /// shifted by `offset`. Checks all pairs.
    pub fn intersects(&self, other: &Edges, offset: Vector2) -> bool {
        self.segments().any(|s| {
            other
                .segments()
                .any(|o| s.intersects(&o.translated(offset)))
        })
    }

    pub fn rotated(&self, angle: Angle) -> Edges {
        Edges {
            points: self.points.iter().map(|p| p.rotate(angle)).collect(),
            closed: self.closed,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.points.iter().fold(
            Bounds {
                min: Vector2::new(f64::INFINITY, f64::INFINITY),
                max: Vector2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            },
            |b, p| Bounds {
                min: Vector2::new(b.min.x().min(p.x()), b.min.y().min(p.y())),
                max: Vector2::new(b.max.x().max(p.x()), b.max.y().max(p.y())),
            },
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Bounds {
    pub min: Vector2,
    pub max: Vector2,
}

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Segment {
    start: Vector2,
    end: Vector2,
}

impl Segment {
    pub fn new(start: Vector2, end: Vector2) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> Vector2 {
        self.start
    }

    pub fn end(&self) -> Vector2 {
        self.end
    }

    pub fn translated(&self, offset: Vector2) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    /// Whether both segments cross at a point strictly inside each of them.
    ///
    /// Solves `start + t * r = other.start + u * s` for `t` and `u`. Parallel and collinear
    /// segments have no unique solution and never intersect, even if they overlap. Touching
    /// at an endpoint does not count either.
    pub fn intersects(&self, other: &Segment) -> bool {
        let r = self.end - self.start;
        let s = other.end - other.start;
        let det = r.cross(s);
        if det == 0.0 {
            return false;
        }
        let d = other.start - self.start;
        let t = d.cross(s) / det;
        let u = d.cross(r) / det;
        (0.0 < t && t < 1.0) && (0.0 < u && u < 1.0)
    }

    /// Whether the ray from `point` towards positive x crosses this segment. An endpoint level
    /// with the ray counts as lying below it, so a ray through a vertex crosses exactly one of
    /// the two segments meeting there when they continue on opposite sides.
    fn crosses_ray(&self, point: Vector2) -> bool {
        let (a, b) = (self.start, self.end);
        if (a.y() > point.y()) == (b.y() > point.y()) {
            return false;
        }
        let x = a.x() + (point.y() - a.y()) * (b.x() - a.x()) / (b.y() - a.y());
        point.x() < x
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ShapeError {
    #[error("expected at least {expected} vertices, got {actual}")]
    TooFewVertices { expected: usize, actual: usize },
    #[error("non-finite vertex {0:?}")]
    NonFiniteVertex(Vector2),
    #[error("invalid dimensions {0} x {1}")]
    InvalidDimensions(f64, f64),
}
