use timberjoin::{export, point, Assembly, JointKind, JointOptions, Line, Settings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut assembly = Assembly::new(Settings::default());
    let cross = assembly.add_beam(
        Line::new(point(0.0, -1000.0, 0.0), point(0.0, 1000.0, 0.0)),
        100.0,
        200.0,
        None,
    )?;
    let main = assembly.add_beam(
        Line::new(point(-1000.0, 0.0, 0.0), point(0.0, 0.0, 0.0)),
        100.0,
        200.0,
        None,
    )?;

    assembly.create_joint(JointKind::HalfLapT, main, cross, JointOptions::default())?;

    let report = export(&assembly);
    for process in &report.parameters {
        println!(
            "{} on {} (side {})",
            process.process_name(),
            process.beam,
            process.reference_side
        );
        for (name, value) in process.fields(assembly.settings()) {
            println!("  {name} = {value}");
        }
    }

    Ok(())
}
