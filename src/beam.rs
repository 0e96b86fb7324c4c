//! Rectangular timber beams and the features joints attach to them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::GeometryError;
use crate::geometry::{
    intersection_line_plane, unitized, Frame, Line, Point, Vector, KERNEL_EPSILON,
};
use crate::joints::JointKey;
use crate::volume::NegativeVolume;

/// Stable identifier of a beam inside an assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeamKey(pub u32);

impl fmt::Display for BeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "beam {}", self.0)
    }
}

/// One of the two ends of a beam centerline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamEnd {
    /// The centerline start point.
    Start,
    /// The centerline end point.
    End,
}

impl BeamEnd {
    /// Lower-case tag used in fabrication data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

impl fmt::Display for BeamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named subtractive volume milled out of a beam.
#[derive(Clone, Debug, PartialEq)]
pub struct MillVolume {
    /// Name the fabrication stage looks the volume up by.
    pub name: String,
    /// Closed polyhedron to remove.
    pub volume: NegativeVolume,
}

/// Geometry a joint removes from a beam.
#[derive(Clone, Debug, PartialEq)]
pub enum Feature {
    /// Planar trim; the frame normal points towards the material that is removed.
    Cut(Frame),
    /// Volume removal.
    Mill(MillVolume),
}

/// A feature together with the joint that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct BeamFeature {
    /// Joint that owns the feature.
    pub joint: JointKey,
    /// The feature geometry.
    pub feature: Feature,
}

/// Straight beam with a rectangular cross-section.
///
/// The local frame has its origin at the centerline start, its X axis along the centerline,
/// the width measured along Y and the height along Z.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    /// Key inside the owning assembly.
    key: BeamKey,
    /// Axis of the beam.
    centerline: Line,
    /// Local frame at the centerline start.
    frame: Frame,
    /// Cross-section size along the local Y axis.
    width: f64,
    /// Cross-section size along the local Z axis.
    height: f64,
    /// Features in the order they were applied.
    features: Vec<BeamFeature>,
    /// Blank extension `(start, end)` requested by each joint.
    blank_extensions: BTreeMap<JointKey, (f64, f64)>,
}

impl Beam {
    /// Create a beam from its centerline and cross-section.
    ///
    /// `z_vector` orients the cross-section; it defaults to the world Z axis and falls back to
    /// the world X axis when it is parallel to the centerline.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroLengthVector`] for a zero-length centerline.
    pub fn from_centerline(
        key: BeamKey,
        centerline: Line,
        width: f64,
        height: f64,
        z_vector: Option<Vector>,
    ) -> Result<Self, GeometryError> {
        let xaxis = centerline.direction()?;
        let yaxis = [z_vector, Some(Vector::z()), Some(Vector::x())]
            .into_iter()
            .flatten()
            .find_map(|z| unitized(&z.cross(&xaxis)).ok())
            .ok_or(GeometryError::ZeroLengthVector)?;
        Ok(Self {
            key,
            centerline,
            frame: Frame::from_orthonormal(centerline.start, xaxis, yaxis),
            width,
            height,
            features: Vec::new(),
            blank_extensions: BTreeMap::new(),
        })
    }

    /// Identifier of the beam.
    #[must_use]
    pub const fn key(&self) -> BeamKey {
        self.key
    }

    /// Centerline from start to end.
    #[must_use]
    pub const fn centerline(&self) -> &Line {
        &self.centerline
    }

    /// Local frame of the beam.
    #[must_use]
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Cross-section size along the local Y axis.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Cross-section size along the local Z axis.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Centerline length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.centerline.length()
    }

    /// Local Z axis of the cross-section.
    #[must_use]
    pub fn zaxis(&self) -> Vector {
        self.frame.normal()
    }

    /// The six face frames with outward normals.
    ///
    /// Indices 0 to 3 are the long faces with normals +Y, −Z, −Y and +Z; 4 is the start face
    /// and 5 the end face.
    #[must_use]
    pub fn faces(&self) -> [Frame; 6] {
        let [f0, f1, f2, f3] = self.long_faces();
        let y = self.frame.yaxis;
        let z = self.zaxis();
        [
            f0,
            f1,
            f2,
            f3,
            Frame::from_orthonormal(self.centerline.start, -y, z),
            Frame::from_orthonormal(self.centerline.end, y, z),
        ]
    }

    /// The four long faces, see [`Beam::faces`].
    #[must_use]
    pub fn long_faces(&self) -> [Frame; 4] {
        let origin = self.centerline.start;
        let x = self.frame.xaxis;
        let y = self.frame.yaxis;
        let z = self.zaxis();
        let half_w = 0.5 * self.width;
        let half_h = 0.5 * self.height;
        [
            Frame::from_orthonormal(origin + y * half_w, x, -z),
            Frame::from_orthonormal(origin - z * half_h, x, -y),
            Frame::from_orthonormal(origin - y * half_w, x, z),
            Frame::from_orthonormal(origin + z * half_h, x, y),
        ]
    }

    /// The four longitudinal edges, ordered counter-clockwise around the X axis.
    #[must_use]
    pub fn long_edges(&self) -> [Line; 4] {
        let y = self.frame.yaxis * (0.5 * self.width);
        let z = self.zaxis() * (0.5 * self.height);
        [y + z, -y + z, -y - z, y - z].map(|offset| self.centerline.translated(&offset))
    }

    /// The beam end closest to `p` and its distance; ties resolve to the start.
    #[must_use]
    pub fn endpoint_closest_to_point(&self, p: &Point) -> (BeamEnd, f64) {
        let to_start = (p - self.centerline.start).norm();
        let to_end = (p - self.centerline.end).norm();
        if to_start <= to_end {
            (BeamEnd::Start, to_start)
        } else {
            (BeamEnd::End, to_end)
        }
    }

    /// Unit direction pointing from `end` into the body of the beam.
    #[must_use]
    pub fn inward_direction(&self, end: BeamEnd) -> Vector {
        match end {
            BeamEnd::Start => self.frame.xaxis,
            BeamEnd::End => -self.frame.xaxis,
        }
    }

    /// Extensions `(start, end)` needed for the blank to reach a cutting plane.
    ///
    /// Only the end closer to the plane is extended; a negative value means the plane already
    /// cuts into the beam.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::LineParallelToPlane`] when the beam runs parallel to the plane.
    pub fn extension_to_plane(&self, plane: &Frame) -> Result<(f64, f64), GeometryError> {
        let plane = plane.plane();
        let mut params = Vec::with_capacity(4);
        for edge in self.long_edges() {
            params.push(intersection_line_plane(&edge, &plane)?.1);
        }
        let (hit, _) = intersection_line_plane(&self.centerline, &plane)?;
        let length = self.length();
        let (end, _) = self.endpoint_closest_to_point(&hit);
        Ok(match end {
            BeamEnd::Start => {
                let t_min = params.iter().copied().fold(f64::INFINITY, f64::min);
                (-t_min * length, 0.0)
            }
            BeamEnd::End => {
                let t_max = params.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (0.0, (t_max - 1.0) * length)
            }
        })
    }

    /// Register the blank extension requested by `joint`, replacing any earlier request.
    pub fn add_blank_extension(&mut self, start: f64, end: f64, joint: JointKey) {
        self.blank_extensions.insert(joint, (start, end));
    }

    /// Drop the blank extension requested by `joint`.
    pub fn remove_blank_extension(&mut self, joint: JointKey) {
        self.blank_extensions.remove(&joint);
    }

    /// Largest extension requested at the start; never negative.
    #[must_use]
    pub fn extension_start(&self) -> f64 {
        self.blank_extensions
            .values()
            .map(|(start, _)| *start)
            .fold(0.0, f64::max)
    }

    /// Largest extension requested at the end; never negative.
    #[must_use]
    pub fn extension_end(&self) -> f64 {
        self.blank_extensions
            .values()
            .map(|(_, end)| *end)
            .fold(0.0, f64::max)
    }

    /// Length of the stock including all blank extensions.
    #[must_use]
    pub fn blank_length(&self) -> f64 {
        self.length() + self.extension_start() + self.extension_end()
    }

    /// Frame at the lower corner of the blank from which reference sides are measured.
    #[must_use]
    pub fn blank_frame(&self) -> Frame {
        let origin = self.centerline.start
            - self.frame.yaxis * (0.5 * self.width)
            - self.zaxis() * (0.5 * self.height)
            - self.frame.xaxis * self.extension_start();
        Frame::from_orthonormal(origin, self.frame.xaxis, self.frame.yaxis)
    }

    /// Reference side `side` (1 to 4) of the blank.
    ///
    /// Sides run around the beam axis: 1 has normal −Y, 2 has −Z, 3 has +Y and 4 has +Z.
    /// Each frame has its origin at the blank start and its X axis along the beam.
    #[must_use]
    pub fn reference_side(&self, side: u8) -> Option<Frame> {
        let blank = self.blank_frame();
        let x = blank.xaxis;
        let y = blank.yaxis;
        let z = self.zaxis();
        let o = blank.origin;
        let frame = match side {
            1 => Frame::from_orthonormal(o, x, z),
            2 => Frame::from_orthonormal(o + y * self.width, x, -y),
            3 => Frame::from_orthonormal(o + y * self.width + z * self.height, x, -z),
            4 => Frame::from_orthonormal(o + z * self.height, x, y),
            _ => return None,
        };
        Some(frame)
    }

    /// Cross-section extent measured across reference side `side`.
    #[must_use]
    pub const fn reference_side_extent(&self, side: u8) -> f64 {
        if side % 2 == 1 {
            self.height
        } else {
            self.width
        }
    }

    /// Cross-section extent measured through reference side `side`, i.e. along its normal.
    #[must_use]
    pub const fn reference_side_depth(&self, side: u8) -> f64 {
        if side % 2 == 1 {
            self.width
        } else {
            self.height
        }
    }

    /// All features currently applied to the beam.
    #[must_use]
    pub fn features(&self) -> &[BeamFeature] {
        &self.features
    }

    /// Features produced by `joint`.
    pub fn features_of(&self, joint: JointKey) -> impl Iterator<Item = &Feature> + '_ {
        self.features
            .iter()
            .filter(move |f| f.joint == joint)
            .map(|f| &f.feature)
    }

    /// Milling volume produced by `joint` under `name`.
    #[must_use]
    pub fn mill_volume(&self, joint: JointKey, name: &str) -> Option<&NegativeVolume> {
        self.features_of(joint).find_map(|feature| match feature {
            Feature::Mill(mill) if mill.name == name => Some(&mill.volume),
            _ => None,
        })
    }

    /// Attach a feature produced by `joint`.
    pub fn add_feature(&mut self, joint: JointKey, feature: Feature) {
        self.features.push(BeamFeature { joint, feature });
    }

    /// Remove every feature and blank extension produced by `joint`.
    pub fn remove_joint_contributions(&mut self, joint: JointKey) {
        self.features.retain(|f| f.joint != joint);
        self.blank_extensions.remove(&joint);
    }

    /// Remove all features and blank extensions.
    pub fn reset(&mut self) {
        self.features.clear();
        self.blank_extensions.clear();
    }

    /// Whether `p` lies inside the beam's body, including its surface.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        let local = self.frame.to_local(p);
        let slack = KERNEL_EPSILON * self.length().max(1.0);
        local.x >= -slack
            && local.x <= self.length() + slack
            && local.y.abs() <= 0.5 * self.width + slack
            && local.z.abs() <= 0.5 * self.height + slack
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    fn beam_along_x() -> Beam {
        let centerline = Line::new(point(0.0, 0.0, 0.0), point(1000.0, 0.0, 0.0));
        Beam::from_centerline(BeamKey(0), centerline, 100.0, 200.0, None)
            .expect("beam construction succeeds")
    }

    #[test]
    fn frame_follows_centerline_and_world_z() {
        let beam = beam_along_x();
        assert_relative_eq!(beam.frame().xaxis, Vector::x());
        assert_relative_eq!(beam.frame().yaxis, Vector::y());
        assert_relative_eq!(beam.zaxis(), Vector::z());
    }

    #[test]
    fn vertical_beam_falls_back_to_world_x() {
        let centerline = Line::new(point(0.0, 0.0, 0.0), point(0.0, 0.0, 3000.0));
        let beam = Beam::from_centerline(BeamKey(1), centerline, 100.0, 100.0, None)
            .expect("beam construction succeeds");
        assert_relative_eq!(beam.frame().xaxis, Vector::z());
        assert_relative_eq!(beam.frame().xaxis.dot(&beam.frame().yaxis), 0.0);
    }

    #[test]
    fn long_faces_point_outward() {
        let beam = beam_along_x();
        let centroid = beam.centerline().midpoint();
        for face in beam.long_faces() {
            let outward = face.origin - Point::new(face.origin.x, 0.0, 0.0);
            assert!(face.normal().dot(&outward) > 0.0);
            assert!(beam.contains(&Point::new(centroid.x, face.origin.y, face.origin.z)));
        }
    }

    #[test]
    fn extension_reaches_plane_beyond_end() {
        let mut beam = beam_along_x();
        let plane = Frame::from_orthonormal(point(1050.0, 0.0, 0.0), Vector::y(), Vector::z());
        let (start, end) = beam.extension_to_plane(&plane).expect("plane crosses beam");
        assert_relative_eq!(start, 0.0);
        assert_relative_eq!(end, 50.0, epsilon = 1.0e-9);
        beam.add_blank_extension(start, end, JointKey(3));
        beam.add_blank_extension(0.0, 20.0, JointKey(4));
        assert_relative_eq!(beam.blank_length(), 1050.0, epsilon = 1.0e-9);
        beam.remove_blank_extension(JointKey(3));
        assert_relative_eq!(beam.blank_length(), 1020.0, epsilon = 1.0e-9);
    }

    #[test]
    fn reference_sides_cycle_around_the_beam() {
        let beam = beam_along_x();
        let normals = (1..=4)
            .map(|side| beam.reference_side(side).expect("side exists").normal())
            .collect::<Vec<_>>();
        assert_relative_eq!(normals[0], -Vector::y());
        assert_relative_eq!(normals[1], -Vector::z());
        assert_relative_eq!(normals[2], Vector::y());
        assert_relative_eq!(normals[3], Vector::z());
        assert!(beam.reference_side(5).is_none());
    }

    #[test]
    fn features_are_removed_per_joint() {
        let mut beam = beam_along_x();
        beam.add_feature(JointKey(0), Feature::Cut(Frame::world_xy()));
        beam.add_feature(JointKey(1), Feature::Cut(Frame::world_xy()));
        beam.remove_joint_contributions(JointKey(0));
        assert_eq!(beam.features().len(), 1);
        assert_eq!(beam.features()[0].joint, JointKey(1));
    }
}
