//! Miter joint cutting both beams on the bisector plane.

use tracing::debug;

use super::{BeamUpdate, JointContext, JointOutput};
use crate::beam::{Beam, Feature};
use crate::errors::{JoiningError, JoiningFailure};
use crate::geometry::{intersection_line_line, unitized, Frame, Point, Vector};

/// Unit vector along `beam` pointing away from the joint at `joint_point`.
pub(super) fn away_from_joint(beam: &Beam, joint_point: &Point) -> Vector {
    let (end, _) = beam.endpoint_closest_to_point(joint_point);
    beam.inward_direction(end)
}

/// Trim both beams of a corner on the plane bisecting the angle between them.
pub(super) fn l_miter(ctx: &JointContext<'_>) -> Result<JointOutput, JoiningError> {
    let closest = intersection_line_line(ctx.main.centerline(), ctx.cross.centerline())
        .map_err(ctx.geometry("centerline intersection"))?;
    let origin = closest.midpoint();
    let va = away_from_joint(ctx.main, &closest.point_a);
    let vb = away_from_joint(ctx.cross, &closest.point_b);

    let normal = unitized(&(vb - va))
        .map_err(|_| ctx.fail(JoiningFailure::ParallelBeams, "beams are collinear"))?;
    let bisector = unitized(&(va + vb))
        .map_err(|_| ctx.fail(JoiningFailure::ParallelBeams, "beams are opposed"))?;
    // Main beam waste lies on the side of the cross beam.
    let main_cut = Frame::from_orthonormal(origin, bisector, normal.cross(&bisector));
    let cross_cut = main_cut.flipped();

    let main_extension = ctx.extension(ctx.main, &main_cut)?;
    let cross_extension = ctx.extension(ctx.cross, &cross_cut)?;
    debug!(joint = %ctx.joint.key(), "miter plane resolved");
    Ok(ctx.output(vec![
        BeamUpdate {
            beam: ctx.main.key(),
            features: vec![Feature::Cut(main_cut)],
            extension: Some(main_extension),
        },
        BeamUpdate {
            beam: ctx.cross.key(),
            features: vec![Feature::Cut(cross_cut)],
            extension: Some(cross_extension),
        },
    ]))
}
