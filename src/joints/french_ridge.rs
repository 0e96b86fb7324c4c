//! Lap joint of two rafters meeting at the ridge.

use tracing::debug;

use super::lap::{lap_volumes, mill};
use super::miter::away_from_joint;
use super::{BeamUpdate, JointContext, JointOutput, CROSS_LAP, MAIN_LAP};
use crate::beam::{Beam, Feature};
use crate::errors::{JoiningError, JoiningFailure};
use crate::geometry::{
    intersection_line_line, intersection_plane_plane, unitized, Frame, Vector,
};

/// Long face of `beam` whose normal is closest to `direction`.
fn facing(beam: &Beam, direction: &Vector) -> Frame {
    let faces = beam.long_faces();
    let mut best = faces[0];
    for face in &faces[1..] {
        if face.normal().dot(direction) > best.normal().dot(direction) {
            best = *face;
        }
    }
    best
}

/// Corner lap of two equally wide beams whose top faces are trimmed on a common ridge.
pub(super) fn l_french_ridge_lap(ctx: &JointContext<'_>) -> Result<JointOutput, JoiningError> {
    let (main_width, cross_width) = (ctx.main.width(), ctx.cross.width());
    if (main_width - cross_width).abs() > ctx.settings.tolerance {
        return Err(ctx.fail(
            JoiningFailure::WidthMismatch,
            format!("{main_width} != {cross_width}"),
        ));
    }
    let volumes = lap_volumes(ctx)?;

    let closest = intersection_line_line(ctx.main.centerline(), ctx.cross.centerline())
        .map_err(ctx.geometry("centerline intersection"))?;
    let va = away_from_joint(ctx.main, &closest.point_a);
    let vb = away_from_joint(ctx.cross, &closest.point_b);
    let up = -unitized(&(va + vb))
        .map_err(|_| ctx.fail(JoiningFailure::ParallelBeams, "beams are opposed"))?;
    let top_main = facing(ctx.main, &up);
    let top_cross = facing(ctx.cross, &up);

    let ridge = intersection_plane_plane(&top_main.plane(), &top_cross.plane())
        .map_err(ctx.geometry("ridge line"))?;
    let mut normal = unitized(&(top_main.normal() - top_cross.normal()))
        .map_err(|_| ctx.fail(JoiningFailure::SingularPlanes, "top faces are parallel"))?;
    // Main beam waste lies on the far side of the ridge.
    if normal.dot(&va) > 0.0 {
        normal = -normal;
    }
    let along = ridge.vector().normalize();
    let main_cut = Frame::from_orthonormal(ridge.start, along, normal.cross(&along));
    let cross_cut = main_cut.flipped();

    let main_extension = ctx.extension(ctx.main, &main_cut)?;
    let cross_extension = ctx.extension(ctx.cross, &cross_cut)?;
    debug!(joint = %ctx.joint.key(), "ridge plane resolved");
    Ok(ctx.output(vec![
        BeamUpdate {
            beam: ctx.main.key(),
            features: vec![mill(MAIN_LAP, volumes.main), Feature::Cut(main_cut)],
            extension: Some(main_extension),
        },
        BeamUpdate {
            beam: ctx.cross.key(),
            features: vec![mill(CROSS_LAP, volumes.cross), Feature::Cut(cross_cut)],
            extension: Some(cross_extension),
        },
    ]))
}
