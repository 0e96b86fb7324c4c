//! Ordering of a beam's long faces as seen from another beam.

use crate::beam::Beam;
use crate::errors::GeometryError;
use crate::geometry::{angle_vectors, intersection_line_line, Frame, Vector};

/// Angle between an approaching beam and one long face of another beam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceIncidence {
    /// Angle in radians between the approach direction and the face normal.
    pub angle: f64,
    /// Index of the face in [`Beam::long_faces`].
    pub face_index: usize,
    /// The face frame, with outward normal.
    pub face: Frame,
}

/// Long faces of `other` sorted by the angle their normals make with the direction of
/// `beam` at the end nearest to `other`.
///
/// The vector runs along `beam` away from that end into its body, so the first entry is the
/// face `beam` approaches (near face) and the last is the opposite face (far face). Angles
/// equal up to rounding are ordered by face index.
///
/// # Errors
///
/// Returns [`GeometryError::ParallelLines`] when the centerlines are parallel.
pub fn beam_side_incidence(beam: &Beam, other: &Beam) -> Result<[FaceIncidence; 4], GeometryError> {
    let closest = intersection_line_line(beam.centerline(), other.centerline())?;
    let (end, _) = beam.endpoint_closest_to_point(&closest.point_a);
    Ok(faces_by_angle(other, &beam.inward_direction(end)))
}

/// Angle rounded to a nanoradian grid so that sorting is total and stable across noise.
#[allow(clippy::cast_possible_truncation)]
fn quantized(angle: f64) -> i64 {
    (angle * 1.0e9).round() as i64
}

/// Long faces of `beam` sorted by the angle their normals make with `direction`, with the
/// same tie-breaking as [`beam_side_incidence`].
#[must_use]
pub fn faces_by_angle(beam: &Beam, direction: &Vector) -> [FaceIncidence; 4] {
    let faces = beam.long_faces();
    let mut incidence = [0, 1, 2, 3].map(|face_index| FaceIncidence {
        angle: angle_vectors(direction, &faces[face_index].normal()),
        face_index,
        face: faces[face_index],
    });
    incidence.sort_by_key(|entry| (quantized(entry.angle), entry.face_index));
    incidence
}
