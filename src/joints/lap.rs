//! Half-lap notches shared by the T, X, L and French ridge laps.

use tracing::debug;

use super::{BeamUpdate, JointContext, JointOutput, CROSS_LAP, MAIN_LAP};
use crate::beam::{Feature, MillVolume};
use crate::errors::{JoiningError, JoiningFailure};
use crate::geometry::{
    intersection_line_line, intersection_line_plane, intersection_plane_plane, unitized, Line,
    Point, Vector, KERNEL_EPSILON,
};
use crate::incidence::{beam_side_incidence, faces_by_angle};
use crate::volume::{NegativeVolume, VolumeShape};

/// The pair of notches cut into the main and cross beams.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct LapVolumes {
    /// Notch removed from the main beam.
    pub main: NegativeVolume,
    /// Notch removed from the cross beam.
    pub cross: NegativeVolume,
}

/// Compute both lap notches of the joint.
pub(super) fn lap_volumes(ctx: &JointContext<'_>) -> Result<LapVolumes, JoiningError> {
    let bias = ctx.joint.options().cut_plane_bias;
    if !(bias > 0.0 && bias < 1.0) {
        return Err(ctx.fail(JoiningFailure::InvalidBias, format!("bias {bias}")));
    }

    let closest = intersection_line_line(ctx.main.centerline(), ctx.cross.centerline())
        .map_err(ctx.geometry("centerline intersection"))?;
    let cut_point = closest.midpoint();
    let mut normal = unitized(
        &ctx.main
            .frame()
            .xaxis
            .cross(&ctx.cross.frame().xaxis),
    )
    .map_err(ctx.geometry("cut plane normal"))?;
    if normal.z > 0.0 {
        normal = -normal;
    }
    let mut towards_main = unitized(&(cut_point - closest.point_a)).unwrap_or(normal);
    let mut towards_cross = unitized(&(cut_point - closest.point_b)).unwrap_or(-normal);
    if ctx.joint.options().flip_lap_side {
        std::mem::swap(&mut towards_main, &mut towards_cross);
    }

    let planes_a = faces_by_angle(ctx.main, &towards_main).map(|f| f.face.plane());
    let planes_b = faces_by_angle(ctx.cross, &towards_cross).map(|f| f.face.plane());
    let pairs = [(1, 1), (1, 2), (2, 2), (2, 1)];
    let mut edges = Vec::with_capacity(4);
    for (a, b) in pairs {
        let line = intersection_plane_plane(&planes_a[a], &planes_b[b])
            .map_err(ctx.geometry("lap side planes"))?;
        let (start, _) = intersection_line_plane(&line, &planes_a[0])
            .map_err(ctx.geometry("main lap face"))?;
        let (end, _) = intersection_line_plane(&line, &planes_b[0])
            .map_err(ctx.geometry("cross lap face"))?;
        edges.push(Line::new(start, end));
    }

    // Each notch opens on its own lap face, so the two depths add up to the distance between
    // those faces. That distance must equal the depth of the shallower beam.
    let span = edges[0].length();
    let (_, main_back) = intersection_line_plane(&edges[0], &planes_a[3])
        .map_err(ctx.geometry("main back face"))?;
    let (_, cross_back) = intersection_line_plane(&edges[0], &planes_b[3])
        .map_err(ctx.geometry("cross back face"))?;
    let shallower = main_back.abs().min((1.0 - cross_back).abs()) * span;
    if (span - shallower).abs() > ctx.settings.tolerance {
        return Err(ctx.fail(
            JoiningFailure::LapDepthMismatch,
            format!("lap faces are {span} apart, the shallower beam is {shallower} deep"),
        ));
    }

    let main = notch(&edges, bias, |line| line.start)
        .ok_or_else(|| ctx.fail(JoiningFailure::DegenerateVolume, "main lap edges"))?;
    let cross = notch(&edges, bias, |line| line.end)
        .ok_or_else(|| ctx.fail(JoiningFailure::DegenerateVolume, "cross lap edges"))?;
    let main = NegativeVolume::build(&main, VolumeShape::Lap).map_err(ctx.volume(MAIN_LAP))?;
    let cross = NegativeVolume::build(&cross, VolumeShape::Lap).map_err(ctx.volume(CROSS_LAP))?;

    let main_depth = bias * shallower;
    let cross_depth = (1.0 - bias) * shallower;
    debug!(joint = %ctx.joint.key(), main_depth, cross_depth, "lap notches resolved");
    Ok(LapVolumes { main, cross })
}

/// Vertices of one notch: each edge contributes its outer point and its point at `bias`,
/// ordered so that the face loops wind outward.
fn notch(edges: &[Line], bias: f64, outer: impl Fn(&Line) -> Point) -> Option<Vec<Point>> {
    let mut points: Vec<Point> = edges
        .iter()
        .flat_map(|line| [outer(line), line.point_at(bias)])
        .collect();
    let layer_normal: Vector = (points[2] - points[0]).cross(&(points[6] - points[0]));
    let depth = points[1] - points[0];
    if layer_normal.norm() < KERNEL_EPSILON || depth.norm() < KERNEL_EPSILON {
        return None;
    }
    // The outer layer must wind away from the floor layer.
    if layer_normal.dot(&depth) > 0.0 {
        for pair in points.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
    }
    Some(points)
}

/// Wrap a notch volume into a named mill feature.
pub(super) fn mill(name: &str, volume: NegativeVolume) -> Feature {
    Feature::Mill(MillVolume {
        name: name.to_owned(),
        volume,
    })
}

/// Both beams notched; the main beam is also trimmed at the far face of the cross beam.
pub(super) fn t_half_lap(ctx: &JointContext<'_>) -> Result<JointOutput, JoiningError> {
    let volumes = lap_volumes(ctx)?;
    let far = beam_side_incidence(ctx.main, ctx.cross).map_err(ctx.geometry("side incidence"))?[3]
        .face;
    let extension = ctx.extension(ctx.main, &far)?;
    Ok(ctx.output(vec![
        BeamUpdate {
            beam: ctx.main.key(),
            features: vec![mill(MAIN_LAP, volumes.main), Feature::Cut(far)],
            extension: Some(extension),
        },
        BeamUpdate {
            beam: ctx.cross.key(),
            features: vec![mill(CROSS_LAP, volumes.cross)],
            extension: None,
        },
    ]))
}

/// Both beams notched and left at full length.
pub(super) fn x_half_lap(ctx: &JointContext<'_>) -> Result<JointOutput, JoiningError> {
    let volumes = lap_volumes(ctx)?;
    Ok(ctx.output(vec![
        BeamUpdate {
            beam: ctx.main.key(),
            features: vec![mill(MAIN_LAP, volumes.main)],
            extension: None,
        },
        BeamUpdate {
            beam: ctx.cross.key(),
            features: vec![mill(CROSS_LAP, volumes.cross)],
            extension: None,
        },
    ]))
}

/// Both beams notched and trimmed at the far face of the other beam.
pub(super) fn l_half_lap(ctx: &JointContext<'_>) -> Result<JointOutput, JoiningError> {
    let volumes = lap_volumes(ctx)?;
    let main_far = beam_side_incidence(ctx.main, ctx.cross)
        .map_err(ctx.geometry("side incidence"))?[3]
        .face;
    let cross_far = beam_side_incidence(ctx.cross, ctx.main)
        .map_err(ctx.geometry("side incidence"))?[3]
        .face;
    let main_extension = ctx.extension(ctx.main, &main_far)?;
    let cross_extension = ctx.extension(ctx.cross, &cross_far)?;
    Ok(ctx.output(vec![
        BeamUpdate {
            beam: ctx.main.key(),
            features: vec![mill(MAIN_LAP, volumes.main), Feature::Cut(main_far)],
            extension: Some(main_extension),
        },
        BeamUpdate {
            beam: ctx.cross.key(),
            features: vec![mill(CROSS_LAP, volumes.cross), Feature::Cut(cross_far)],
            extension: Some(cross_extension),
        },
    ]))
}
