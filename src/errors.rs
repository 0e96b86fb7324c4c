//! Error types produced while classifying, joining and exporting beams.

use thiserror::Error;

use crate::beam::BeamKey;
use crate::joints::JointKey;
use crate::topology::Topology;

/// Error returned by the geometry kernel when a construction has no unique solution.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// Returned when two lines are parallel and have no unique closest points.
    #[error("lines are parallel")]
    ParallelLines,
    /// Returned when a line runs parallel to the plane it is intersected with.
    #[error("line is parallel to plane")]
    LineParallelToPlane,
    /// Returned when two planes are parallel and do not meet in a line.
    #[error("planes are parallel")]
    ParallelPlanes,
    /// Returned when a direction is requested from a zero-length vector.
    #[error("vector has zero length")]
    ZeroLengthVector,
}

/// Error returned when the topology of two beams cannot be determined.
///
/// Classification failures are fatal for the affected pair only; the remaining pairs of an
/// assembly are still processed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClassificationError {
    /// Returned when both centerlines are parallel without touching end to end.
    #[error("{a} and {b} are parallel and do not meet end to end")]
    ParallelBeams {
        /// First beam of the pair.
        a: BeamKey,
        /// Second beam of the pair.
        b: BeamKey,
    },
    /// Returned when the centerlines pass each other further apart than allowed.
    #[error("{a} and {b} are {gap} apart, more than the allowed {max_distance}")]
    TooFar {
        /// First beam of the pair.
        a: BeamKey,
        /// Second beam of the pair.
        b: BeamKey,
        /// Length of the closest-approach segment.
        gap: f64,
        /// Configured maximum distance.
        max_distance: f64,
    },
    /// Returned when a closest point lies beyond the reach of a beam's segment.
    #[error("closest approach of {a} and {b} lies outside of {outside}")]
    OutOfReach {
        /// First beam of the pair.
        a: BeamKey,
        /// Second beam of the pair.
        b: BeamKey,
        /// The beam whose segment does not reach the closest point.
        outside: BeamKey,
    },
    /// Returned when the detected topology does not match the requested joint kind.
    #[error("{joint} supports {expected} topology but {a} and {b} meet as {found}")]
    TopologyMismatch {
        /// Name of the requested joint kind.
        joint: &'static str,
        /// First beam of the pair.
        a: BeamKey,
        /// Second beam of the pair.
        b: BeamKey,
        /// Topology the joint kind supports.
        expected: Topology,
        /// Topology that was detected.
        found: Topology,
    },
}

/// Reason a joint could not compute its features.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum JoiningFailure {
    /// The centerlines have no closest points.
    #[error("beams are parallel")]
    ParallelBeams,
    /// A required line or plane intersection does not exist.
    #[error("no intersection")]
    NoIntersection,
    /// Two planes that must meet are parallel.
    #[error("singular plane intersection")]
    SingularPlanes,
    /// A negative volume could not be assembled.
    #[error("degenerate negative volume")]
    DegenerateVolume,
    /// The cut plane bias would cut through one of the beams.
    #[error("cut plane bias must lie strictly between 0 and 1")]
    InvalidBias,
    /// The joint requires beams of equal width.
    #[error("beam widths differ")]
    WidthMismatch,
    /// The lap faces are not one shallower-beam depth apart, so the notches cannot share it.
    #[error("lap faces do not span the shallower beam")]
    LapDepthMismatch,
}

/// Error raised when a joint fails to compute the features it applies to its beams.
///
/// No feature of a failed joint is left on any beam.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("failed to join {beams:?} with {joint}: {reason} ({debug_info})")]
pub struct JoiningError {
    /// The joint that was being resolved.
    pub joint: JointKey,
    /// The beams the joint was supposed to connect.
    pub beams: Vec<BeamKey>,
    /// Classified reason of the failure.
    pub reason: JoiningFailure,
    /// Free-form diagnostic context.
    pub debug_info: String,
}

/// Error returned when fabrication parameters cannot be derived for a beam.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParameterError {
    /// Returned when a feature the joint should have produced is missing.
    #[error("{beam} has no feature named {name:?} from {joint}")]
    MissingFeature {
        /// Beam being exported.
        beam: BeamKey,
        /// Joint responsible for the feature.
        joint: JointKey,
        /// Expected feature name.
        name: String,
    },
    /// Returned when a reference side outside of 1 to 4 is requested.
    #[error("{beam} has no reference side {side}")]
    UnknownReferenceSide {
        /// Beam being exported.
        beam: BeamKey,
        /// Requested side.
        side: u8,
    },
    /// Returned when no reference side carries the open face of a lap.
    #[error("no reference side of {beam} carries the lap from {joint}")]
    NoReferenceSide {
        /// Beam being exported.
        beam: BeamKey,
        /// Joint responsible for the lap.
        joint: JointKey,
    },
    /// Returned when the cut geometry is parallel to the reference geometry.
    #[error("cut geometry of {joint} is degenerate relative to {beam}")]
    DegenerateReference {
        /// Beam being exported.
        beam: BeamKey,
        /// Joint responsible for the cut.
        joint: JointKey,
    },
    /// Returned when a beam referenced by a joint is not part of the assembly.
    #[error("{0} does not exist in this assembly")]
    UnknownBeam(BeamKey),
}

/// Error returned when assembling a negative volume from points.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum VolumeError {
    /// Returned when the vertex count does not match the face table.
    #[error("expected {expected} vertices, received {found}")]
    VertexCount {
        /// Vertex count of the face table.
        expected: usize,
        /// Supplied vertex count.
        found: usize,
    },
    /// Returned when the enclosed volume vanishes.
    #[error("volume is degenerate")]
    Degenerate,
    /// Returned when the supplied vertex order yields inward facing loops.
    #[error("face loops wind inward (signed volume {volume})")]
    InwardWinding {
        /// Signed volume computed from the loops.
        volume: f64,
    },
}

/// Error returned when editing or resolving an [`Assembly`](crate::Assembly).
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Returned when a beam cannot be found in the assembly.
    #[error("{0} does not exist in this assembly")]
    UnknownBeam(BeamKey),
    /// Returned when a joint cannot be found in the assembly.
    #[error("{0} does not exist in this assembly")]
    UnknownJoint(JointKey),
    /// Returned when restored data lists the same beam key twice.
    #[error("{0} is listed more than once")]
    DuplicateBeam(BeamKey),
    /// Returned when restored data lists the same joint key twice.
    #[error("{0} is listed more than once")]
    DuplicateJoint(JointKey),
    /// Returned when a joint is requested between a beam and itself.
    #[error("{0} cannot be joined with itself")]
    SelfJoint(BeamKey),
    /// Returned when a beam cross-section is not strictly positive.
    #[error("cross-section must be positive (received {width} x {height})")]
    InvalidCrossSection {
        /// Rejected width.
        width: f64,
        /// Rejected height.
        height: f64,
    },
    /// Returned when beam geometry cannot be constructed.
    #[error("invalid beam geometry: {0}")]
    Geometry(#[from] GeometryError),
    /// Returned when the beams do not meet in a supported topology.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    /// Returned when the joint features cannot be computed.
    #[error(transparent)]
    Joining(#[from] JoiningError),
    /// Returned when serialized assembly data cannot be read or written.
    #[error("assembly serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
