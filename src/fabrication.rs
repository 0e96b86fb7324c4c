//! Machining parameters in the BTLx style derived from applied joint features.
//!
//! Parameters are measured on one of the four reference sides of a beam's blank. Linear
//! values are in model units and angles in degrees; [`FabricationParameters::fields`]
//! renders them with the precision configured in [`Settings`].

use std::f64::consts::PI;

use serde::Serialize;
use tracing::{debug, info};

use crate::assembly::Assembly;
use crate::beam::{Beam, BeamEnd, BeamKey, Feature};
use crate::config::Settings;
use crate::errors::ParameterError;
use crate::geometry::{
    angle_vectors, angle_vectors_signed, intersection_line_plane, unitized, Frame, Line,
};
use crate::joints::{Joint, JointKey, JointState, CROSS_LAP, DOVETAIL_WEDGE, MAIN_LAP};
use crate::volume::NegativeVolume;

/// Lap process parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LapParameters {
    /// Beam end the process is oriented towards.
    pub orientation: BeamEnd,
    /// Start of the lap along the reference side.
    pub start_x: f64,
    /// Start of the lap across the reference side.
    pub start_y: f64,
    /// Angle between the reference edge and the lap.
    pub angle: f64,
    /// Inclination of the lap walls against the reference side.
    pub inclination: f64,
    /// Tilt of the lap floor against the reference side.
    pub slope: f64,
    /// Lap extent along the beam.
    pub length: f64,
    /// Lap extent across the reference side.
    pub width: f64,
    /// Depth measured from the reference side.
    pub depth: f64,
    /// Whether the lead angle is parallel to the beam axis.
    pub lead_angle_parallel: bool,
    /// Lead angle.
    pub lead_angle: f64,
    /// Whether the lead inclination is parallel to the beam axis.
    pub lead_inclination_parallel: bool,
    /// Lead inclination.
    pub lead_inclination: f64,
}

/// Jack cut process parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JackCutParameters {
    /// Beam end the process is oriented towards.
    pub orientation: BeamEnd,
    /// Where the cut meets the reference edge.
    pub start_x: f64,
    /// Offset across the reference side.
    pub start_y: f64,
    /// Offset below the reference side.
    pub start_depth: f64,
    /// Angle of the cut line on the reference side.
    pub angle: f64,
    /// Inclination of the cut plane against the reference side.
    pub inclination: f64,
}

/// A machining process.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Process {
    /// Pocket removed by a lap joint.
    Lap(LapParameters),
    /// Planar end cut.
    JackCut(JackCutParameters),
}

/// A process placed on a beam by a joint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FabricationParameters {
    /// Beam carrying the process.
    pub beam: BeamKey,
    /// Joint that produced it.
    pub joint: JointKey,
    /// Feature name.
    pub name: String,
    /// Reference side the parameters are measured on.
    pub reference_side: u8,
    /// Process data.
    pub process: Process,
}

impl FabricationParameters {
    /// Name of the process type.
    #[must_use]
    pub const fn process_name(&self) -> &'static str {
        match self.process {
            Process::Lap(_) => "Lap",
            Process::JackCut(_) => "JackCut",
        }
    }

    /// Header attributes of the process.
    #[must_use]
    pub fn header(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Process", "yes".to_owned()),
            ("Priority", "0".to_owned()),
            ("ProcessID", self.joint.0.to_string()),
            ("ReferencePlaneID", self.reference_side.to_string()),
        ]
    }

    /// Process parameters as text, in their fixed field order.
    #[must_use]
    pub fn fields(&self, settings: &Settings) -> Vec<(&'static str, String)> {
        let length = |v| settings.format_length(v);
        let angle = |v| settings.format_angle(v);
        let yes_no = |flag: bool| String::from(if flag { "yes" } else { "no" });
        match &self.process {
            Process::Lap(lap) => vec![
                ("Orientation", lap.orientation.to_string()),
                ("StartX", length(lap.start_x)),
                ("StartY", length(lap.start_y)),
                ("Angle", angle(lap.angle)),
                ("Inclination", angle(lap.inclination)),
                ("Slope", angle(lap.slope)),
                ("Length", length(lap.length)),
                ("Width", length(lap.width)),
                ("Depth", length(lap.depth)),
                ("LeadAngleParallel", yes_no(lap.lead_angle_parallel)),
                ("LeadAngle", angle(lap.lead_angle)),
                ("LeadInclinationParallel", yes_no(lap.lead_inclination_parallel)),
                ("LeadInclination", angle(lap.lead_inclination)),
            ],
            Process::JackCut(cut) => vec![
                ("Orientation", cut.orientation.to_string()),
                ("StartX", length(cut.start_x)),
                ("StartY", length(cut.start_y)),
                ("StartDepth", length(cut.start_depth)),
                ("Angle", angle(cut.angle)),
                ("Inclination", angle(cut.inclination)),
            ],
        }
    }
}

/// Frame of reference side `side`, or an error naming the beam.
fn reference_frame(beam: &Beam, side: u8) -> Result<Frame, ParameterError> {
    beam.reference_side(side)
        .ok_or(ParameterError::UnknownReferenceSide {
            beam: beam.key(),
            side,
        })
}

/// The reference side whose plane carries the open face of `volume`.
///
/// A side qualifies when at least three vertices lie on it, none lie outside of it and the
/// volume does not pass through to the opposite side.
fn lap_reference_side(
    beam: &Beam,
    joint: JointKey,
    volume: &NegativeVolume,
    tolerance: f64,
) -> Result<u8, ParameterError> {
    for side in 1..=4 {
        let plane = reference_frame(beam, side)?.plane();
        let distances: Vec<f64> = volume
            .vertices()
            .iter()
            .map(|v| plane.signed_distance(v))
            .collect();
        let highest = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let deepest = -distances.iter().copied().fold(f64::INFINITY, f64::min);
        let on_side = distances.iter().filter(|d| d.abs() <= tolerance).count();
        if highest <= tolerance
            && on_side >= 3
            && deepest < beam.reference_side_depth(side) - tolerance
        {
            return Ok(side);
        }
    }
    Err(ParameterError::NoReferenceSide { beam: beam.key(), joint })
}

/// Derive the lap parameters of the milling volume `name` that `joint` removed from `beam`.
///
/// `mate` is the other beam of the joint. Without an explicit `reference_side` the side
/// carrying the open face of the lap is used.
///
/// # Errors
///
/// Returns [`ParameterError::MissingFeature`] when the beam has no such volume,
/// [`ParameterError::NoReferenceSide`] when no side carries the lap and
/// [`ParameterError::DegenerateReference`] when the beams are parallel on that side.
pub fn lap_parameters(
    beam: &Beam,
    mate: &Beam,
    joint: &Joint,
    name: &str,
    reference_side: Option<u8>,
    settings: &Settings,
) -> Result<FabricationParameters, ParameterError> {
    let volume = beam
        .mill_volume(joint.key(), name)
        .ok_or_else(|| ParameterError::MissingFeature {
            beam: beam.key(),
            joint: joint.key(),
            name: name.to_owned(),
        })?;
    let tolerance = settings.tolerance;
    let side = match reference_side {
        Some(side) => side,
        None => lap_reference_side(beam, joint.key(), volume, tolerance)?,
    };
    let reference = reference_frame(beam, side)?;
    let normal = reference.normal();
    let degenerate = || ParameterError::DegenerateReference {
        beam: beam.key(),
        joint: joint.key(),
    };

    let local: Vec<_> = volume
        .vertices()
        .iter()
        .map(|v| reference.to_local(v))
        .collect();
    let top = local.iter().map(|v| v.z).fold(f64::NEG_INFINITY, f64::max);
    let depth = (-local.iter().map(|v| v.z).fold(f64::INFINITY, f64::min)).max(0.0);
    let outer: Vec<_> = local.iter().filter(|v| v.z >= top - tolerance).collect();
    let min_x = outer.iter().map(|v| v.x).fold(f64::INFINITY, f64::min);
    let max_x = outer.iter().map(|v| v.x).fold(f64::NEG_INFINITY, f64::max);
    let start_y = outer.iter().map(|v| v.y).fold(f64::INFINITY, f64::min);

    let mate_axis = mate.frame().xaxis;
    let projected = unitized(&(mate_axis - normal * mate_axis.dot(&normal)))
        .map_err(|_| degenerate())?;
    let signed = angle_vectors_signed(&reference.xaxis, &projected, &normal);
    let (angle, reference_edge) = if signed >= 0.0 {
        (signed, true)
    } else {
        (PI + signed, false)
    };
    if angle.sin() < tolerance {
        return Err(degenerate());
    }
    let width = beam.reference_side_extent(side);
    let correction = width / angle.tan().abs();
    let orientation = joint.end_of(beam, mate);
    let start_x = match orientation {
        BeamEnd::Start => min_x,
        BeamEnd::End if reference_edge => max_x - correction,
        BeamEnd::End => max_x + correction,
    };

    let (inclination, slope) = wall_angles(volume, &reference);
    debug!(beam = %beam.key(), joint = %joint.key(), side, depth, "derived lap parameters");
    Ok(FabricationParameters {
        beam: beam.key(),
        joint: joint.key(),
        name: name.to_owned(),
        reference_side: side,
        process: Process::Lap(LapParameters {
            orientation,
            start_x,
            start_y,
            angle: angle.to_degrees(),
            inclination,
            slope,
            length: mate.width(),
            width,
            depth,
            lead_angle_parallel: true,
            lead_angle: 90.0,
            lead_inclination_parallel: true,
            lead_inclination: 90.0,
        }),
    })
}

/// Inclination of the steepest wall and slope of the floor of `volume`, in degrees.
fn wall_angles(volume: &NegativeVolume, reference: &Frame) -> (f64, f64) {
    let normal = reference.normal();
    let mut inclination = 90.0;
    let mut best_alignment = f64::NEG_INFINITY;
    let mut slope = 0.0;
    let mut best_floor = f64::NEG_INFINITY;
    for index in 0..volume.faces().len() {
        let Ok(face_normal) = unitized(&volume.face_normal(index)) else {
            continue;
        };
        let alignment = face_normal.dot(&reference.xaxis).abs();
        if alignment > best_alignment {
            best_alignment = alignment;
            inclination = angle_vectors(&face_normal, &normal).to_degrees();
        }
        // The floor faces away from the open side.
        let floor = -face_normal.dot(&normal);
        if floor > best_floor {
            best_floor = floor;
            slope = angle_vectors(&-face_normal, &normal).to_degrees();
        }
    }
    (inclination, slope)
}

/// Derive the jack cut parameters of `cut` on `beam`, measured on `reference_side`
/// (side 1 when omitted).
///
/// # Errors
///
/// Returns [`ParameterError::UnknownReferenceSide`] for a side outside of 1 to 4 and
/// [`ParameterError::DegenerateReference`] when the cut is parallel to the reference edge
/// or side.
pub fn jack_cut_parameters(
    beam: &Beam,
    mate: &Beam,
    joint: &Joint,
    cut: &Frame,
    reference_side: Option<u8>,
) -> Result<FabricationParameters, ParameterError> {
    let side = reference_side.unwrap_or(1);
    let reference = reference_frame(beam, side)?;
    let degenerate = || ParameterError::DegenerateReference {
        beam: beam.key(),
        joint: joint.key(),
    };
    let edge = Line::new(reference.origin, reference.origin + reference.xaxis);
    let (_, start_x) = intersection_line_plane(&edge, &cut.plane()).map_err(|_| degenerate())?;
    let normal = reference.normal();
    let cut_normal = cut.normal();
    let direction = unitized(&normal.cross(&cut_normal)).map_err(|_| degenerate())?;
    let angle = PI - angle_vectors_signed(&reference.xaxis, &direction, &normal).abs();
    let inclination = PI - angle_vectors_signed(&normal, &cut_normal, &direction).abs();
    Ok(FabricationParameters {
        beam: beam.key(),
        joint: joint.key(),
        name: "Jack Cut".to_owned(),
        reference_side: side,
        process: Process::JackCut(JackCutParameters {
            orientation: joint.end_of(beam, mate),
            start_x,
            start_y: 0.0,
            start_depth: 0.0,
            angle: angle.to_degrees(),
            inclination: inclination.to_degrees(),
        }),
    })
}

/// Parameters and failures collected while exporting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportReport {
    /// Successfully derived processes, grouped by joint and beam.
    pub parameters: Vec<FabricationParameters>,
    /// Processes that could not be derived.
    pub failures: Vec<ParameterError>,
}

impl ExportReport {
    /// Processes placed on `beam`.
    pub fn for_beam(&self, beam: BeamKey) -> impl Iterator<Item = &FabricationParameters> + '_ {
        self.parameters.iter().filter(move |p| p.beam == beam)
    }
}

/// Derive the processes `joint` placed on its two beams.
///
/// Lap joints must have left a lap on both beams; every cut becomes a jack cut. The
/// dovetail wedge has no process of its own.
#[must_use]
pub fn joint_parameters(
    joint: &Joint,
    main: &Beam,
    cross: &Beam,
    settings: &Settings,
) -> ExportReport {
    let mut report = ExportReport::default();
    for (beam, mate, lap) in [(main, cross, MAIN_LAP), (cross, main, CROSS_LAP)] {
        if joint.kind().has_laps() {
            match lap_parameters(beam, mate, joint, lap, None, settings) {
                Ok(parameters) => report.parameters.push(parameters),
                Err(err) => report.failures.push(err),
            }
        }
        for feature in beam.features_of(joint.key()) {
            match feature {
                Feature::Cut(plane) => {
                    match jack_cut_parameters(beam, mate, joint, plane, None) {
                        Ok(parameters) => report.parameters.push(parameters),
                        Err(err) => report.failures.push(err),
                    }
                }
                Feature::Mill(mill) if mill.name == DOVETAIL_WEDGE => {
                    debug!(beam = %beam.key(), joint = %joint.key(), "wedge has no process");
                }
                Feature::Mill(_) => {}
            }
        }
    }
    report
}

/// Derive the processes of every applied joint of `assembly`, in joint key order.
///
/// Failures are collected per process; the export continues with the remaining beams.
#[must_use]
pub fn export(assembly: &Assembly) -> ExportReport {
    let mut report = ExportReport::default();
    for joint in assembly.joints() {
        if joint.state() != JointState::FeaturesApplied {
            continue;
        }
        let beams = (
            assembly.find_by_key(joint.main()),
            assembly.find_by_key(joint.cross()),
        );
        let (Ok(main), Ok(cross)) = beams else {
            report.failures.push(ParameterError::UnknownBeam(joint.main()));
            continue;
        };
        let joint_report = joint_parameters(joint, main, cross, assembly.settings());
        report.parameters.extend(joint_report.parameters);
        report.failures.extend(joint_report.failures);
    }
    info!(
        processes = report.parameters.len(),
        failures = report.failures.len(),
        "exported fabrication parameters"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap() -> FabricationParameters {
        FabricationParameters {
            beam: BeamKey(1),
            joint: JointKey(0),
            name: MAIN_LAP.to_owned(),
            reference_side: 2,
            process: Process::Lap(LapParameters {
                orientation: BeamEnd::End,
                start_x: 1050.0,
                start_y: -1.0e-12,
                angle: 90.0,
                inclination: 90.0,
                slope: 0.0,
                length: 100.0,
                width: 100.0,
                depth: 100.0,
                lead_angle_parallel: true,
                lead_angle: 90.0,
                lead_inclination_parallel: true,
                lead_inclination: 90.0,
            }),
        }
    }

    #[test]
    fn lap_fields_keep_their_order() {
        let fields = lap().fields(&Settings::default());
        let names: Vec<_> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "Orientation",
                "StartX",
                "StartY",
                "Angle",
                "Inclination",
                "Slope",
                "Length",
                "Width",
                "Depth",
                "LeadAngleParallel",
                "LeadAngle",
                "LeadInclinationParallel",
                "LeadInclination",
            ]
        );
        assert_eq!(fields[0].1, "end");
        assert_eq!(fields[1].1, "1050.000");
        assert_eq!(fields[2].1, "0.000");
        assert_eq!(fields[9].1, "yes");
    }

    #[test]
    fn precision_follows_settings() {
        let settings = Settings {
            point_precision: 1,
            angle_precision: 0,
            ..Settings::default()
        };
        let fields = lap().fields(&settings);
        assert_eq!(fields[1].1, "1050.0");
        assert_eq!(fields[3].1, "90");
    }

    #[test]
    fn header_names_reference_plane() {
        let header = lap().header();
        assert!(header.contains(&("ReferencePlaneID", "2".to_owned())));
        assert_eq!(lap().process_name(), "Lap");
    }
}
