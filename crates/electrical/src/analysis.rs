//! Profile simulation and export.
//!
//! Drives a cell model through a piecewise-constant current/temperature
//! profile and collects the per-step trace for plotting or CSV export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use simcore::{CellInput, ElectricalModel, FixedTimestep};

use crate::battery::LfpBattery;
use crate::error::{BatteryError, Result};

/// Upper bound on the number of steps a single profile run may take.
pub const MAX_PROFILE_STEPS: usize = 50_000_000;

/// Samples pre-allocated up front; longer traces grow as they go.
const PREALLOCATED_SAMPLES: usize = 1 << 16;

fn default_temperature() -> f64 {
    25.0
}

/// Constant current and temperature held for `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSegment {
    /// Amperes, positive when discharging.
    pub current: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Seconds.
    pub duration: f64,
}

impl ProfileSegment {
    pub fn new(current: f64, temperature: f64, duration: f64) -> Self {
        ProfileSegment {
            current,
            temperature,
            duration,
        }
    }

    pub fn rest(temperature: f64, duration: f64) -> Self {
        Self::new(0.0, temperature, duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub segments: Vec<ProfileSegment>,
}

impl Profile {
    /// One hour of charging at `charge_current` amperes followed by one hour of rest.
    pub fn charge_then_rest(charge_current: f64, temperature: f64) -> Self {
        Profile {
            segments: vec![
                ProfileSegment::new(-charge_current.abs(), temperature, 3600.0),
                ProfileSegment::rest(temperature, 3600.0),
            ],
        }
    }

    pub fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::charge_then_rest(26.0, 25.0)
    }
}

/// Per-step samples, one entry per model step.
#[derive(Debug, Clone, Default)]
pub struct SimulationTrace {
    pub times: Vec<f64>,
    pub voltages: Vec<f64>,
    pub soc: Vec<f64>,
    pub hysteresis: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSummary {
    pub steps: usize,
    pub min_voltage: f64,
    pub max_voltage: f64,
    pub final_soc: f64,
    pub final_hysteresis: f64,
}

impl SimulationTrace {
    pub fn with_capacity(n: usize) -> Self {
        SimulationTrace {
            times: Vec::with_capacity(n),
            voltages: Vec::with_capacity(n),
            soc: Vec::with_capacity(n),
            hysteresis: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn push(&mut self, time: f64, voltage: f64, soc: f64, hysteresis: f64) {
        self.times.push(time);
        self.voltages.push(voltage);
        self.soc.push(soc);
        self.hysteresis.push(hysteresis);
    }

    pub fn summary(&self) -> Option<TraceSummary> {
        let (&final_soc, &final_hysteresis) = (self.soc.last()?, self.hysteresis.last()?);
        let min_voltage = self.voltages.iter().copied().fold(f64::INFINITY, f64::min);
        let max_voltage = self.voltages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(TraceSummary {
            steps: self.len(),
            min_voltage,
            max_voltage,
            final_soc,
            final_hysteresis,
        })
    }

    /// Writes `time,voltage,soc,hysteresis` with one row per step.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "time,voltage,soc,hysteresis")?;
        for i in 0..self.len() {
            writeln!(
                writer,
                "{},{:.6},{:.6},{:.6}",
                self.times[i], self.voltages[i], self.soc[i], self.hysteresis[i]
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))
    }
}

/// Runs `model` through `profile` with a fixed step of `dt` seconds.
///
/// Time is recorded at the start of each step, so the trace begins at 0.
/// A segment duration that is not a multiple of `dt` carries its remainder
/// into the next segment. Durations must be finite and non-negative.
pub fn simulate_profile<M: ElectricalModel>(
    model: &mut M,
    profile: &Profile,
    dt: f64,
) -> Result<SimulationTrace> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(BatteryError::InvalidTimestep(dt));
    }

    if let Some((index, segment)) = profile
        .segments
        .iter()
        .enumerate()
        .find(|(_, s)| !(s.duration.is_finite() && s.duration >= 0.0))
    {
        return Err(BatteryError::InvalidDuration {
            index,
            duration: segment.duration,
        });
    }

    let n_steps = (profile.duration() / dt).ceil();
    if !(n_steps <= MAX_PROFILE_STEPS as f64) {
        return Err(BatteryError::TooManySteps(n_steps));
    }
    let mut trace = SimulationTrace::with_capacity((n_steps as usize).min(PREALLOCATED_SAMPLES));
    let mut stepper = FixedTimestep::new(dt);

    for segment in &profile.segments {
        let input = CellInput {
            current: segment.current,
            temperature: segment.temperature,
        };
        stepper.advance(segment.duration, |ctx| {
            let voltage = model.step_electrical(ctx, input);
            let state = model.cell_state();
            trace.push(ctx.t, voltage, state.state_of_charge, state.hysteresis);
        });
    }

    Ok(trace)
}

/// Equilibrium voltage curve over SOC at one temperature.
#[derive(Debug, Clone)]
pub struct OcvCurve {
    pub soc: Vec<f64>,
    pub voltages: Vec<f64>,
}

/// Samples `n_points` of the OCV curve from empty to full, including the
/// model's present hysteresis offset.
pub fn ocv_curve(model: &LfpBattery, temperature: f64, n_points: usize) -> OcvCurve {
    let denominator = n_points.saturating_sub(1).max(1) as f64;
    let soc: Vec<f64> = (0..n_points).map(|i| i as f64 / denominator).collect();
    let voltages = soc
        .iter()
        .map(|&s| model.open_circuit_voltage(s, temperature))
        .collect();
    OcvCurve { soc, voltages }
}
