use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use simcore::{ForwardEuler, Integrator, Relaxation};

/// Hysteresis law of an LFP cell.
///
/// The hysteresis state `h` moves toward -1 while discharging and +1 while
/// charging, and decays toward 0 at rest. Its voltage contribution is
/// `h * magnitude(soc)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Time constant while current flows, seconds.
    pub tau_active: f64,
    /// Time constant at rest, seconds.
    pub tau_rest: f64,
    /// Peak of the voltage envelope, volts.
    pub peak_voltage: f64,
    /// SOC band (percent) outside which the envelope is zero.
    pub band_low_percent: f64,
    pub band_high_percent: f64,
    /// Currents at or below this magnitude count as rest, amperes.
    pub rest_current_threshold: f64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        HysteresisConfig {
            tau_active: 600.0,
            tau_rest: 3600.0,
            peak_voltage: 0.015,
            band_low_percent: 10.0,
            band_high_percent: 90.0,
            rest_current_threshold: 1e-6,
        }
    }
}

impl HysteresisConfig {
    /// Anything that is not clearly above the threshold, NaN included, is rest.
    pub fn is_rest(&self, current: f64) -> bool {
        !(current.abs() > self.rest_current_threshold)
    }

    /// Where `h` is heading under `current`.
    pub fn relaxation(&self, current: f64) -> Relaxation {
        if self.is_rest(current) {
            Relaxation::new(0.0, self.tau_rest)
        } else if current > 0.0 {
            // discharge
            Relaxation::new(-1.0, self.tau_active)
        } else {
            Relaxation::new(1.0, self.tau_active)
        }
    }

    /// Forward-Euler update of `h`, clamped to [-1, 1].
    pub fn advance(&self, h: f64, current: f64, dt: f64) -> f64 {
        ForwardEuler
            .advance(h, self.relaxation(current), dt)
            .clamp(-1.0, 1.0)
    }

    /// Envelope of the hysteresis voltage: a half-sine bump over the SOC band.
    pub fn magnitude(&self, soc: f64) -> f64 {
        let soc_percent = soc * 100.0;
        if soc_percent < self.band_low_percent || soc_percent > self.band_high_percent {
            return 0.0;
        }
        let width = self.band_high_percent - self.band_low_percent;
        self.peak_voltage * (PI * (soc_percent - self.band_low_percent) / width).sin()
    }

    pub fn voltage(&self, h: f64, soc: f64) -> f64 {
        h * self.magnitude(soc)
    }
}
