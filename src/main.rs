mod demo;
mod report;

use std::error::Error;
use std::fs;

use demo::build_t_junction;
use report::render_report;
use timberjoin::{export, Settings};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // An optional JSON file overrides the default tolerances and precision.
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_json(&fs::read_to_string(path)?)?,
        None => Settings::default(),
    };

    // A beam ending on the middle of another one, joined with a half lap.
    let assembly = build_t_junction(settings)?;

    // Fabrication data is derived purely from the resolved features.
    let processes = export(&assembly);
    println!("{}", render_report(&assembly, &processes));
    println!("{}", serde_json::to_string_pretty(&processes.parameters)?);
    println!("{}", assembly.to_json()?);

    Ok(())
}
