//! Joint kinds and the features they compute for their beams.
//!
//! Every joint works on a classified pair of beams. Computing a joint never mutates the
//! beams; it returns a [`JointOutput`] that the [`Assembly`](crate::Assembly) applies once
//! all joints of a resolution pass succeeded or were rolled back.

mod butt;
pub mod dovetail;
mod french_ridge;
mod lap;
mod miter;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::beam::{Beam, BeamEnd, BeamKey, Feature};
use crate::config::Settings;
use crate::errors::{GeometryError, JoiningError, JoiningFailure, VolumeError};
use crate::geometry::{Frame, Point};
use crate::topology::Topology;

/// Name of the milling volume removed from the main beam of a lap joint.
pub const MAIN_LAP: &str = "Main Lap";
/// Name of the milling volume removed from the cross beam of a lap joint.
pub const CROSS_LAP: &str = "Cross Lap";
/// Name of the wedge volume removed from the main beam of a dovetail lap.
pub const DOVETAIL_WEDGE: &str = "Dovetail";

/// Stable identifier of a joint inside an assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JointKey(pub u32);

impl fmt::Display for JointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint {}", self.0)
    }
}

/// Supported joint kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    /// Main beam trimmed flush against the near face of the cross beam.
    Butt,
    /// Both beams trimmed on the bisector plane of a corner.
    Miter,
    /// Half lap where one beam ends on the other.
    HalfLapT,
    /// Half lap where both beams continue through the crossing.
    HalfLapX,
    /// Half lap at a corner, both beams trimmed flush.
    HalfLapL,
    /// Half lap with a dovetail wedge on the main beam.
    DovetailLap,
    /// Corner lap whose top faces meet on a ridge.
    FrenchRidgeLap,
}

impl JointKind {
    /// Every joint kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Butt,
        Self::Miter,
        Self::HalfLapT,
        Self::HalfLapX,
        Self::HalfLapL,
        Self::DovetailLap,
        Self::FrenchRidgeLap,
    ];

    /// Human-readable joint name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Butt => "T-Butt",
            Self::Miter => "L-Miter",
            Self::HalfLapT => "T-HalfLap",
            Self::HalfLapX => "X-HalfLap",
            Self::HalfLapL => "L-HalfLap",
            Self::DovetailLap => "T-HalfLap-Dovetail",
            Self::FrenchRidgeLap => "French-Ridge-Lap",
        }
    }

    /// The single topology this kind can join.
    #[must_use]
    pub const fn supported_topology(self) -> Topology {
        match self {
            Self::Butt | Self::HalfLapT | Self::DovetailLap => Topology::T,
            Self::Miter | Self::HalfLapL | Self::FrenchRidgeLap => Topology::L,
            Self::HalfLapX => Topology::X,
        }
    }

    /// Whether both beams receive a milled lap that fabrication must describe.
    #[must_use]
    pub const fn has_laps(self) -> bool {
        !matches!(self, Self::Butt | Self::Miter)
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-joint options.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointOptions {
    /// Swap which side of each beam is notched.
    pub flip_lap_side: bool,
    /// Position of the lap floor between the two beams, strictly between 0 and 1.
    /// 0.5 removes equal depth from both beams.
    pub cut_plane_bias: f64,
}

impl Default for JointOptions {
    fn default() -> Self {
        Self {
            flip_lap_side: false,
            cut_plane_bias: 0.5,
        }
    }
}

/// Lifecycle of a joint inside an assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointState {
    /// Registered but never resolved.
    Created,
    /// Features computed and waiting to be applied.
    FeaturesPending,
    /// Features applied to both beams.
    FeaturesApplied,
    /// Resolution failed; no features of this joint remain on any beam.
    JoiningFailed,
}

/// A joint between a main and a cross beam.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// Key inside the owning assembly.
    key: JointKey,
    /// Kind of joint.
    kind: JointKind,
    /// Beam whose end takes part in T joints, otherwise the first beam.
    main: BeamKey,
    /// The other beam.
    cross: BeamKey,
    /// User options.
    options: JointOptions,
    /// Lifecycle state.
    state: JointState,
}

/// Changes a joint requests for one beam.
#[derive(Clone, Debug, PartialEq)]
pub struct BeamUpdate {
    /// Target beam.
    pub beam: BeamKey,
    /// Features to add.
    pub features: Vec<Feature>,
    /// Blank extension `(start, end)` to register, if any.
    pub extension: Option<(f64, f64)>,
}

/// Everything a joint applies to its beams.
#[derive(Clone, Debug, PartialEq)]
pub struct JointOutput {
    /// Joint that produced the output.
    pub joint: JointKey,
    /// Per-beam changes.
    pub updates: Vec<BeamUpdate>,
}

impl Joint {
    /// Create a joint in the [`JointState::Created`] state.
    #[must_use]
    pub const fn new(
        key: JointKey,
        kind: JointKind,
        main: BeamKey,
        cross: BeamKey,
        options: JointOptions,
    ) -> Self {
        Self {
            key,
            kind,
            main,
            cross,
            options,
            state: JointState::Created,
        }
    }

    /// Identifier of the joint.
    #[must_use]
    pub const fn key(&self) -> JointKey {
        self.key
    }

    /// Kind of the joint.
    #[must_use]
    pub const fn kind(&self) -> JointKind {
        self.kind
    }

    /// Main beam.
    #[must_use]
    pub const fn main(&self) -> BeamKey {
        self.main
    }

    /// Cross beam.
    #[must_use]
    pub const fn cross(&self) -> BeamKey {
        self.cross
    }

    /// Both beams, main first.
    #[must_use]
    pub const fn beams(&self) -> [BeamKey; 2] {
        [self.main, self.cross]
    }

    /// Options the joint was created with.
    #[must_use]
    pub const fn options(&self) -> &JointOptions {
        &self.options
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> JointState {
        self.state
    }

    /// Move to a new lifecycle state.
    pub(crate) fn set_state(&mut self, state: JointState) {
        self.state = state;
    }

    /// The end of each beam that lies nearer to the other beam's endpoints.
    #[must_use]
    pub fn ends(&self, main: &Beam, cross: &Beam) -> BTreeMap<BeamKey, BeamEnd> {
        BTreeMap::from([
            (main.key(), self.end_of(main, cross)),
            (cross.key(), self.end_of(cross, main)),
        ])
    }

    /// The end of `beam` that lies nearer to the endpoints of `other`; ties resolve to the
    /// end.
    #[must_use]
    pub fn end_of(&self, beam: &Beam, other: &Beam) -> BeamEnd {
        debug_assert!(self.beams().contains(&beam.key()));
        end_towards(beam, other)
    }

    /// Compute the features of this joint without touching the beams.
    ///
    /// # Errors
    ///
    /// Returns a [`JoiningError`] when the joint geometry cannot be constructed.
    pub fn compute(
        &self,
        main: &Beam,
        cross: &Beam,
        settings: &Settings,
    ) -> Result<JointOutput, JoiningError> {
        let ctx = JointContext {
            joint: self,
            main,
            cross,
            settings,
        };
        match self.kind {
            JointKind::Butt => butt::t_butt(&ctx),
            JointKind::Miter => miter::l_miter(&ctx),
            JointKind::HalfLapT => lap::t_half_lap(&ctx),
            JointKind::HalfLapX => lap::x_half_lap(&ctx),
            JointKind::HalfLapL => lap::l_half_lap(&ctx),
            JointKind::DovetailLap => dovetail::t_dovetail_lap(&ctx),
            JointKind::FrenchRidgeLap => french_ridge::l_french_ridge_lap(&ctx),
        }
    }
}

/// The end of `beam` nearer to either endpoint of `other`.
fn end_towards(beam: &Beam, other: &Beam) -> BeamEnd {
    let line = beam.centerline();
    let other_line = other.centerline();
    let distance = |p: Point| {
        f64::min(
            (p - other_line.start).norm(),
            (p - other_line.end).norm(),
        )
    };
    if distance(line.start) < distance(line.end) {
        BeamEnd::Start
    } else {
        BeamEnd::End
    }
}

/// Inputs shared by the joint constructions.
pub(crate) struct JointContext<'a> {
    /// Joint being computed.
    pub joint: &'a Joint,
    /// Main beam in its unmodified state.
    pub main: &'a Beam,
    /// Cross beam in its unmodified state.
    pub cross: &'a Beam,
    /// Assembly tolerances.
    pub settings: &'a Settings,
}

impl JointContext<'_> {
    /// A joining error for this joint and its two beams.
    pub fn fail(&self, reason: JoiningFailure, debug_info: impl Into<String>) -> JoiningError {
        JoiningError {
            joint: self.joint.key,
            beams: vec![self.main.key(), self.cross.key()],
            reason,
            debug_info: debug_info.into(),
        }
    }

    /// Map a kernel error raised at `stage` into a joining error.
    pub fn geometry(&self, stage: &str) -> impl Fn(GeometryError) -> JoiningError + '_ {
        let stage = stage.to_owned();
        move |err| {
            let reason = match err {
                GeometryError::ParallelLines => JoiningFailure::ParallelBeams,
                GeometryError::ParallelPlanes => JoiningFailure::SingularPlanes,
                GeometryError::LineParallelToPlane | GeometryError::ZeroLengthVector => {
                    JoiningFailure::NoIntersection
                }
            };
            self.fail(reason, format!("{stage}: {err}"))
        }
    }

    /// Map a volume error for the volume `name` into a joining error.
    pub fn volume(&self, name: &str) -> impl Fn(VolumeError) -> JoiningError + '_ {
        let name = name.to_owned();
        move |err| self.fail(JoiningFailure::DegenerateVolume, format!("{name}: {err}"))
    }

    /// Blank extension of `beam` to `plane`, padded at the extended end.
    pub fn extension(
        &self,
        beam: &Beam,
        plane: &Frame,
    ) -> Result<(f64, f64), JoiningError> {
        let (start, end) = beam
            .extension_to_plane(plane)
            .map_err(self.geometry("blank extension"))?;
        let padding = self.settings.extension_tolerance;
        Ok(if start.abs() > end.abs() {
            (start + padding, end)
        } else {
            (start, end + padding)
        })
    }

    /// Wrap the per-beam updates of this joint.
    pub fn output(&self, updates: Vec<BeamUpdate>) -> JointOutput {
        JointOutput {
            joint: self.joint.key,
            updates,
        }
    }
}
