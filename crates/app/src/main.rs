mod scenario;

use std::path::PathBuf;

use electrical::LfpBattery;
use electrical::analysis::simulate_profile;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::scenario::Scenario;

/// Usage: `lfp-sim [scenario.json] [output.csv]`
fn main() -> Result<(), Box<dyn std::error::Error>> {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut args = std::env::args().skip(1);
    let mut scenario = match args.next() {
        Some(path) => {
            info!("Loading scenario from {}", path);
            Scenario::load(&PathBuf::from(path))?
        }
        None => Scenario::default(),
    };
    if let Some(output) = args.next() {
        scenario.output = PathBuf::from(output);
    }

    let mut battery = LfpBattery::from_config(scenario.model)?;

    info!(
        "Simulating {} s in {} segments at dt = {} s",
        scenario.profile.duration(),
        scenario.profile.segments.len(),
        scenario.dt
    );
    let trace = simulate_profile(&mut battery, &scenario.profile, scenario.dt)?;

    if let Some(summary) = trace.summary() {
        info!(
            "{} steps, voltage {:.4}..{:.4} V, final soc {:.4}, final h {:.4}",
            summary.steps,
            summary.min_voltage,
            summary.max_voltage,
            summary.final_soc,
            summary.final_hysteresis
        );
    }

    trace.save_csv(&scenario.output)?;
    info!("Wrote {}", scenario.output.display());
    Ok(())
}
