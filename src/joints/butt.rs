//! Butt joint trimming the main beam on the near face of the cross beam.

use tracing::debug;

use super::{BeamUpdate, JointContext, JointOutput};
use crate::beam::Feature;
use crate::errors::JoiningError;
use crate::incidence::beam_side_incidence;

/// Trim the main beam flush against the face of the cross beam it runs into.
pub(super) fn t_butt(ctx: &JointContext<'_>) -> Result<JointOutput, JoiningError> {
    let incidence =
        beam_side_incidence(ctx.main, ctx.cross).map_err(ctx.geometry("side incidence"))?;
    // The near face normal points back at the main beam; the waste lies inside the cross beam.
    let cut = incidence[0].face.flipped();
    let extension = ctx.extension(ctx.main, &cut)?;
    debug!(joint = %ctx.joint.key(), face = incidence[0].face_index, "butt cut on near face");
    Ok(ctx.output(vec![BeamUpdate {
        beam: ctx.main.key(),
        features: vec![Feature::Cut(cut)],
        extension: Some(extension),
    }]))
}
