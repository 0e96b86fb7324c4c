use timberjoin::{point, Assembly, AssemblyError, JointKind, JointOptions, Line, Settings};

/// Cross-section width of the demo beams in millimetres.
pub const WIDTH: f64 = 100.0;
/// Cross-section height of the demo beams in millimetres.
pub const HEIGHT: f64 = 200.0;

/// Build a two metre cross beam with a one metre main beam ending on its middle, joined by a
/// half lap.
pub fn build_t_junction(settings: Settings) -> Result<Assembly, AssemblyError> {
    let mut assembly = Assembly::new(settings);
    let cross = assembly.add_beam(
        Line::new(point(0.0, -1000.0, 0.0), point(0.0, 1000.0, 0.0)),
        WIDTH,
        HEIGHT,
        None,
    )?;
    let main = assembly.add_beam(
        Line::new(point(-1000.0, 0.0, 0.0), point(0.0, 0.0, 0.0)),
        WIDTH,
        HEIGHT,
        None,
    )?;
    assembly.create_joint(JointKind::HalfLapT, main, cross, JointOptions::default())?;
    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_joint_between_two_beams() {
        let assembly = build_t_junction(Settings::default()).expect("demo builds");
        assert_eq!(assembly.beam_count(), 2);
        assert_eq!(assembly.joint_count(), 1);
    }
}
