use std::fmt::Write;

use timberjoin::{Assembly, ExportReport};

/// Render the beams of `assembly` and the processes placed on them.
///
/// Each beam lists its blank length followed by one line per process with the process
/// fields in their fixed order.
#[must_use]
pub fn render_report(assembly: &Assembly, processes: &ExportReport) -> String {
    let settings = assembly.settings();
    let mut output = String::new();

    writeln!(
        &mut output,
        "{} beams, {} joints",
        assembly.beam_count(),
        assembly.joint_count()
    )
    .expect("writing to string cannot fail");

    for beam in assembly.beams() {
        writeln!(
            &mut output,
            "{}: {} x {}, blank length {}",
            beam.key(),
            settings.format_length(beam.width()),
            settings.format_length(beam.height()),
            settings.format_length(beam.blank_length())
        )
        .expect("writing to string cannot fail");
        for process in processes.for_beam(beam.key()) {
            let fields = process
                .fields(settings)
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(
                &mut output,
                "  {} \"{}\" (side {}, {}): {fields}",
                process.process_name(),
                process.name,
                process.reference_side,
                process.joint
            )
            .expect("writing to string cannot fail");
        }
    }

    // Failures do not abort the export; list them so nothing goes unnoticed.
    for failure in &processes.failures {
        writeln!(&mut output, "failed: {failure}").expect("writing to string cannot fail");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::build_t_junction;
    use timberjoin::{export, Settings};

    #[test]
    fn lists_beams_and_processes() {
        let assembly = build_t_junction(Settings::default()).expect("demo builds");
        let report = render_report(&assembly, &export(&assembly));
        assert!(report.starts_with("2 beams, 1 joints"));
        assert!(report.contains("Lap \"Main Lap\""));
        assert!(report.contains("Depth=100.000"));
        assert!(!report.contains("failed:"));
    }
}
