//! Half lap with a dovetail wedge keeping the main beam from pulling out.

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use super::lap::mill;
use super::{BeamUpdate, JointContext, JointOutput, CROSS_LAP, DOVETAIL_WEDGE, MAIN_LAP};
use crate::beam::Feature;
use crate::errors::{JoiningError, JoiningFailure};
use crate::geometry::{
    angle_vectors, intersection_line_plane, intersection_plane_plane, unitized, Line, Plane, Point,
    KERNEL_EPSILON,
};
use crate::incidence::{beam_side_incidence, faces_by_angle};
use crate::volume::{NegativeVolume, VolumeShape};

/// Swap the points of each layer pair when the beams meet at an acute angle.
///
/// Returns the possibly reordered points and whether they were reordered. Beams meeting at
/// exactly a right angle keep their order.
#[must_use]
pub fn reorder_points(points: &[Point; 8], centerline_angle: f64) -> ([Point; 8], bool) {
    let mut points = *points;
    let reordered = centerline_angle < FRAC_PI_2 - KERNEL_EPSILON;
    if reordered {
        swap_pairs(&mut points);
    }
    (points, reordered)
}

/// Swap the two points of every pair in place.
fn swap_pairs(points: &mut [Point; 8]) {
    for pair in points.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}

/// Whether the first layer winds counter-clockwise when seen from the second layer.
fn is_canonical(points: &[Point; 8]) -> bool {
    let side = points[1] - points[0];
    let along = points[2] - points[0];
    side.cross(&along).dot(&(points[4] - points[0])) > 0.0
}

/// Lapped T joint whose main beam also loses a dovetail wedge.
pub(super) fn t_dovetail_lap(ctx: &JointContext<'_>) -> Result<JointOutput, JoiningError> {
    let bias = ctx.joint.options().cut_plane_bias;
    if !(bias > 0.0 && bias < 1.0) {
        return Err(ctx.fail(JoiningFailure::InvalidBias, format!("bias {bias}")));
    }
    let faces =
        beam_side_incidence(ctx.main, ctx.cross).map_err(ctx.geometry("cross beam faces"))?;
    let near = faces[0].face.plane();
    let far = faces[3].face;
    let far_plane = far.plane();
    let sides =
        beam_side_incidence(ctx.cross, ctx.main).map_err(ctx.geometry("main beam faces"))?;
    let (side_a, side_b) = (sides[0].face.plane(), sides[3].face.plane());

    let height = ctx.cross.height();
    let up = ctx.cross.zaxis();
    let top = Plane {
        point: ctx.cross.centerline().start + up * (0.5 * height),
        normal: up,
    };
    let mut corners = [Point::origin(); 4];
    for (corner, (face, side)) in corners.iter_mut().zip([
        (&near, &side_a),
        (&near, &side_b),
        (&far_plane, &side_a),
        (&far_plane, &side_b),
    ]) {
        let edge = intersection_plane_plane(face, side).map_err(ctx.geometry("notch edge"))?;
        *corner = intersection_line_plane(&edge, &top)
            .map_err(ctx.geometry("top face"))?
            .0;
    }

    // Both notches hang from the cross beam's top face down to the main beam's bottom face,
    // which must lie one shallower-beam depth below it.
    let main_faces = faces_by_angle(ctx.main, &-up);
    let plumb = Line::new(corners[0], corners[0] - up);
    let (_, span) = intersection_line_plane(&plumb, &main_faces[0].face.plane())
        .map_err(ctx.geometry("main bottom face"))?;
    let (_, main_top) = intersection_line_plane(&plumb, &main_faces[3].face.plane())
        .map_err(ctx.geometry("main top face"))?;
    let shallower = height.min((span - main_top).abs());
    if (span - shallower).abs() > ctx.settings.tolerance {
        return Err(ctx.fail(
            JoiningFailure::LapDepthMismatch,
            format!("lap faces are {span} apart, the shallower beam is {shallower} deep"),
        ));
    }

    let split = up * ((1.0 - bias) * span);
    let floor = up * span;
    let mut upper = [Point::origin(); 8];
    let mut lower = [Point::origin(); 8];
    for (i, corner) in corners.iter().enumerate() {
        upper[i] = corner - split;
        upper[i + 4] = *corner;
        lower[i] = corner - floor;
        lower[i + 4] = corner - split;
    }
    if !is_canonical(&upper) {
        swap_pairs(&mut upper);
        swap_pairs(&mut lower);
    }

    // The wedge sits on the first pair of the canonical layout at any angle; reordering only
    // changes how the notch faces are looped.
    let nudge = ctx.settings.dovetail_nudge;
    let lower_side = unitized(&(lower[1] - lower[0])).map_err(ctx.geometry("dovetail side"))?;
    let upper_side = unitized(&(lower[5] - lower[4])).map_err(ctx.geometry("dovetail side"))?;
    let wedge_origin = [upper[0], upper[4]];
    upper[0] += lower_side * nudge;
    upper[4] += upper_side * nudge;
    let wedge = [
        wedge_origin[0],
        upper[0],
        upper[2],
        wedge_origin[1],
        upper[4],
        upper[6],
    ];

    let angle = angle_vectors(&ctx.main.frame().xaxis, &ctx.cross.frame().xaxis);
    let (upper, reordered) = reorder_points(&upper, angle);
    let (lower, _) = reorder_points(&lower, angle);

    let layered = VolumeShape::Layered {
        mirrored: reordered,
    };
    let cross_notch = NegativeVolume::build(&upper, layered).map_err(ctx.volume(CROSS_LAP))?;
    let main_notch = NegativeVolume::build(&lower, layered).map_err(ctx.volume(MAIN_LAP))?;
    let wedge = NegativeVolume::build(&wedge, VolumeShape::Wedge { mirrored: false })
        .map_err(ctx.volume(DOVETAIL_WEDGE))?;

    let extension = ctx.extension(ctx.main, &far)?;
    debug!(joint = %ctx.joint.key(), reordered, angle, "dovetail lap resolved");
    Ok(ctx.output(vec![
        BeamUpdate {
            beam: ctx.main.key(),
            features: vec![
                mill(MAIN_LAP, main_notch),
                mill(DOVETAIL_WEDGE, wedge),
                Feature::Cut(far),
            ],
            extension: Some(extension),
        },
        BeamUpdate {
            beam: ctx.cross.key(),
            features: vec![mill(CROSS_LAP, cross_notch)],
            extension: None,
        },
    ]))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use super::*;
    use crate::geometry::point;

    fn grid() -> [Point; 8] {
        [
            point(0.0, 0.0, 0.0),
            point(1.0, 0.0, 0.0),
            point(0.0, 1.0, 0.0),
            point(1.0, 1.0, 0.0),
            point(0.0, 0.0, 1.0),
            point(1.0, 0.0, 1.0),
            point(0.0, 1.0, 1.0),
            point(1.0, 1.0, 1.0),
        ]
    }

    #[test]
    fn right_angle_keeps_order() {
        let (points, reordered) = reorder_points(&grid(), FRAC_PI_2);
        assert!(!reordered);
        assert_eq!(points, grid());
    }

    #[test]
    fn acute_angle_swaps_pairs() {
        let original = grid();
        let (points, reordered) = reorder_points(&original, FRAC_PI_4);
        assert!(reordered);
        assert_eq!(points[0], original[1]);
        assert_eq!(points[1], original[0]);
        assert_eq!(points[4], original[5]);
        assert_eq!(points[5], original[4]);
    }

    #[test]
    fn canonical_grid_is_detected() {
        let mut points = grid();
        assert!(is_canonical(&points));
        swap_pairs(&mut points);
        assert!(!is_canonical(&points));
    }
}
