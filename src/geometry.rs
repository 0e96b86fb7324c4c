//! Fundamental geometric types and intersection routines.
//!
//! Intersections are computed on unbounded lines and planes; callers decide whether a
//! parameter outside of `[0, 1]` is meaningful for their segment.

use nalgebra::{Point3, Vector3};

use crate::errors::GeometryError;

/// Position in three dimensional space in model units.
pub type Point = Point3<f64>;

/// Direction or offset in three dimensional space.
pub type Vector = Vector3<f64>;

/// Length below which vectors are treated as zero inside the kernel.
pub const KERNEL_EPSILON: f64 = 1.0e-9;

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use timberjoin::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// Convenience helper for creating [`Vector`] instances.
#[must_use]
pub fn vector(x: f64, y: f64, z: f64) -> Vector {
    Vector::new(x, y, z)
}

/// Normalize `v`, failing for vectors shorter than [`KERNEL_EPSILON`].
///
/// # Errors
///
/// Returns [`GeometryError::ZeroLengthVector`] for degenerate input.
pub fn unitized(v: &Vector) -> Result<Vector, GeometryError> {
    let length = v.norm();
    if length < KERNEL_EPSILON {
        return Err(GeometryError::ZeroLengthVector);
    }
    Ok(v / length)
}

/// Unsigned angle between two vectors in radians, in `[0, π]`.
#[must_use]
pub fn angle_vectors(u: &Vector, v: &Vector) -> f64 {
    u.angle(v)
}

/// Angle between two vectors in radians, signed by the orientation of `u × v` relative to
/// `normal`. The result lies in `[-π, π]`.
#[must_use]
pub fn angle_vectors_signed(u: &Vector, v: &Vector, normal: &Vector) -> f64 {
    let angle = u.angle(v);
    if u.cross(v).dot(normal) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Right-handed orthonormal coordinate frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Origin of the frame.
    pub origin: Point,
    /// Unit X axis.
    pub xaxis: Vector,
    /// Unit Y axis, perpendicular to [`Frame::xaxis`].
    pub yaxis: Vector,
}

impl Frame {
    /// Create a frame from an origin and two spanning vectors.
    ///
    /// The X axis keeps the direction of `xaxis`; the Y axis is re-orthogonalized so that it
    /// lies in the plane spanned by both inputs.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroLengthVector`] when the inputs are degenerate or parallel.
    pub fn new(origin: Point, xaxis: Vector, yaxis: Vector) -> Result<Self, GeometryError> {
        let x = unitized(&xaxis)?;
        let z = unitized(&x.cross(&yaxis))?;
        Ok(Self::from_orthonormal(origin, x, z.cross(&x)))
    }

    /// Create a frame from axes already known to be orthonormal.
    #[must_use]
    pub const fn from_orthonormal(origin: Point, xaxis: Vector, yaxis: Vector) -> Self {
        Self {
            origin,
            xaxis,
            yaxis,
        }
    }

    /// The global XY frame.
    #[must_use]
    pub fn world_xy() -> Self {
        Self::from_orthonormal(Point::origin(), Vector::x(), Vector::y())
    }

    /// Unit normal of the frame, `xaxis × yaxis`.
    #[must_use]
    pub fn normal(&self) -> Vector {
        self.xaxis.cross(&self.yaxis)
    }

    /// The same frame with X and Y swapped, which reverses the normal.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self::from_orthonormal(self.origin, self.yaxis, self.xaxis)
    }

    /// The frame moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: &Vector) -> Self {
        Self::from_orthonormal(self.origin + offset, self.xaxis, self.yaxis)
    }

    /// Plane through the origin with the frame normal.
    #[must_use]
    pub fn plane(&self) -> Plane {
        Plane {
            point: self.origin,
            normal: self.normal(),
        }
    }

    /// Coordinates of `p` expressed in this frame.
    #[must_use]
    pub fn to_local(&self, p: &Point) -> Vector {
        let offset = p - self.origin;
        Vector::new(
            offset.dot(&self.xaxis),
            offset.dot(&self.yaxis),
            offset.dot(&self.normal()),
        )
    }
}

/// Infinite plane given by a point and a unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Any point on the plane.
    pub point: Point,
    /// Unit normal.
    pub normal: Vector,
}

impl Plane {
    /// Create a plane, normalizing `normal`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroLengthVector`] for a zero normal.
    pub fn new(point: Point, normal: Vector) -> Result<Self, GeometryError> {
        Ok(Self {
            point,
            normal: unitized(&normal)?,
        })
    }

    /// Signed distance of `p` from the plane along its normal.
    #[must_use]
    pub fn signed_distance(&self, p: &Point) -> f64 {
        (p - self.point).dot(&self.normal)
    }
}

/// Line segment between two points; intersections treat it as an unbounded line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    /// Start point (parameter 0).
    pub start: Point,
    /// End point (parameter 1).
    pub end: Point,
}

impl Line {
    /// Create a line from two points.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Vector from start to end.
    #[must_use]
    pub fn vector(&self) -> Vector {
        self.end - self.start
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Unit direction from start to end.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroLengthVector`] for a zero-length segment.
    pub fn direction(&self) -> Result<Vector, GeometryError> {
        unitized(&self.vector())
    }

    /// Point at parameter `t`, where 0 is the start and 1 the end.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        self.start + self.vector() * t
    }

    /// Midpoint of the segment.
    #[must_use]
    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// The same segment moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: &Vector) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

/// Closest-approach result between two unbounded lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoints {
    /// Closest point on the first line.
    pub point_a: Point,
    /// Closest point on the second line.
    pub point_b: Point,
    /// Parameter of [`ClosestPoints::point_a`] on the first line.
    pub t_a: f64,
    /// Parameter of [`ClosestPoints::point_b`] on the second line.
    pub t_b: f64,
}

impl ClosestPoints {
    /// Length of the closest-approach segment.
    #[must_use]
    pub fn gap(&self) -> f64 {
        (self.point_b - self.point_a).norm()
    }

    /// Midpoint of the closest-approach segment.
    #[must_use]
    pub fn midpoint(&self) -> Point {
        nalgebra::center(&self.point_a, &self.point_b)
    }
}

/// Closest points of two unbounded lines; equals their intersection when they meet.
///
/// # Errors
///
/// Returns [`GeometryError::ParallelLines`] for parallel or degenerate lines.
pub fn intersection_line_line(a: &Line, b: &Line) -> Result<ClosestPoints, GeometryError> {
    let d1 = a.vector();
    let d2 = b.vector();
    let r = a.start - b.start;
    let aa = d1.dot(&d1);
    let bb = d1.dot(&d2);
    let ee = d2.dot(&d2);
    let c = d1.dot(&r);
    let f = d2.dot(&r);
    let denominator = aa * ee - bb * bb;
    if aa < KERNEL_EPSILON || ee < KERNEL_EPSILON || denominator <= KERNEL_EPSILON * aa * ee {
        return Err(GeometryError::ParallelLines);
    }
    let t_a = (bb * f - c * ee) / denominator;
    let t_b = (aa * f - bb * c) / denominator;
    Ok(ClosestPoints {
        point_a: a.point_at(t_a),
        point_b: b.point_at(t_b),
        t_a,
        t_b,
    })
}

/// Intersection of an unbounded line with a plane, with the parameter along the line.
///
/// # Errors
///
/// Returns [`GeometryError::LineParallelToPlane`] when no unique intersection exists.
pub fn intersection_line_plane(line: &Line, plane: &Plane) -> Result<(Point, f64), GeometryError> {
    let direction = line.vector();
    let denominator = plane.normal.dot(&direction);
    if denominator.abs() < KERNEL_EPSILON * direction.norm().max(1.0) {
        return Err(GeometryError::LineParallelToPlane);
    }
    let t = plane.normal.dot(&(plane.point - line.start)) / denominator;
    Ok((line.point_at(t), t))
}

/// Intersection line of two planes, returned as a unit-length segment.
///
/// # Errors
///
/// Returns [`GeometryError::ParallelPlanes`] when the planes do not meet in a line.
pub fn intersection_plane_plane(a: &Plane, b: &Plane) -> Result<Line, GeometryError> {
    let direction = a.normal.cross(&b.normal);
    if direction.norm() < KERNEL_EPSILON {
        return Err(GeometryError::ParallelPlanes);
    }
    let da = a.normal.dot(&a.point.coords);
    let db = b.normal.dot(&b.point.coords);
    let nn = a.normal.dot(&b.normal);
    let determinant = 1.0 - nn * nn;
    let coords = a.normal * ((da - db * nn) / determinant) + b.normal * ((db - da * nn) / determinant);
    let start = Point::from(coords);
    Ok(Line::new(start, start + direction.normalize()))
}
