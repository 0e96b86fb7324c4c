use timberjoin::{export, point, Assembly, JointKind, JointOptions, Line, Process, Settings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut assembly = Assembly::new(Settings::default());
    // A 100 mm deep cross beam under a 200 mm deep main beam, bottom faces flush.
    let cross = assembly.add_beam(
        Line::new(point(0.0, -1000.0, 0.0), point(0.0, 1000.0, 0.0)),
        100.0,
        100.0,
        None,
    )?;
    let main = assembly.add_beam(
        Line::new(point(-1000.0, 0.0, 50.0), point(0.0, 0.0, 50.0)),
        100.0,
        200.0,
        None,
    )?;
    let options = JointOptions {
        cut_plane_bias: 0.25,
        ..JointOptions::default()
    };
    assembly.create_joint(JointKind::HalfLapT, main, cross, options)?;

    for process in export(&assembly).parameters {
        if let Process::Lap(lap) = &process.process {
            println!("{}: lap depth {:.1} mm", process.beam, lap.depth);
        }
    }

    Ok(())
}
