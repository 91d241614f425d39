//! Temperature-dependent equivalent-circuit parameters.

use serde::{Deserialize, Serialize};
use simcore::Relaxation;

use crate::ocv::TEMPERATURE_BREAKPOINTS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RCBranch {
    pub resistance: f64,
    pub capacitance: f64,
}

impl RCBranch {
    pub fn time_constant(&self) -> f64 {
        self.resistance * self.capacitance
    }

    /// Branch voltage dynamics under `current`: `dV/dt = -V/(R*C) + I/C`.
    pub fn relaxation(&self, current: f64) -> Relaxation {
        Relaxation::new(current * self.resistance, self.time_constant())
    }

    pub fn is_physical(&self) -> bool {
        self.resistance > 0.0 && self.capacitance > 0.0
    }
}

/// Circuit values at the reference temperature plus linear temperature coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceParameters {
    /// Series resistance, ohms.
    pub r0: f64,
    /// Fast, medium and slow polarization branches.
    pub branches: [RCBranch; 3],
    /// Fractional resistance change per °C.
    pub alpha_r: f64,
    /// Fractional capacitance change per °C.
    pub beta_c: f64,
}

impl Default for ReferenceParameters {
    fn default() -> Self {
        ReferenceParameters {
            r0: 0.002,
            branches: [
                RCBranch { resistance: 0.003, capacitance: 5000.0 },
                RCBranch { resistance: 0.008, capacitance: 1000.0 },
                RCBranch { resistance: 0.02, capacitance: 50000.0 },
            ],
            alpha_r: 0.01,
            beta_c: -0.005,
        }
    }
}

/// How the scaling temperature relates to the step temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperaturePolicy {
    /// Linear scaling at any temperature. Far from the reference this can
    /// produce zero or negative resistances and capacitances.
    #[default]
    Extrapolate,
    /// Clamp the scaling temperature to the calibrated range (-10 to 45 °C).
    ClampToTable,
}

impl TemperaturePolicy {
    pub fn scaling_temperature(&self, temperature: f64) -> f64 {
        match self {
            TemperaturePolicy::Extrapolate => temperature,
            TemperaturePolicy::ClampToTable => temperature.clamp(
                TEMPERATURE_BREAKPOINTS[0],
                TEMPERATURE_BREAKPOINTS[TEMPERATURE_BREAKPOINTS.len() - 1],
            ),
        }
    }
}

/// Circuit values at one temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitParameters {
    pub r0: f64,
    pub branches: [RCBranch; 3],
}

impl CircuitParameters {
    pub fn is_physical(&self) -> bool {
        self.r0 > 0.0 && self.branches.iter().all(RCBranch::is_physical)
    }
}

impl ReferenceParameters {
    pub fn at_temperature(&self, temperature: f64, reference_temperature: f64) -> CircuitParameters {
        let dt = temperature - reference_temperature;
        let r_scale = 1.0 + self.alpha_r * dt;
        let c_scale = 1.0 + self.beta_c * dt;

        CircuitParameters {
            r0: self.r0 * r_scale,
            branches: self.branches.map(|b| RCBranch {
                resistance: b.resistance * r_scale,
                capacitance: b.capacitance * c_scale,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_temperature_is_identity() {
        let reference = ReferenceParameters::default();
        let p = reference.at_temperature(25.0, 25.0);
        assert_eq!(p.r0, reference.r0);
        assert_eq!(p.branches, reference.branches);
    }

    #[test]
    fn test_cold_raises_resistance_and_capacitance() {
        let p = ReferenceParameters::default().at_temperature(5.0, 25.0);
        // dT = -20: R scale 0.8, C scale 1.1
        assert_relative_eq!(p.r0, 0.002 * 0.8, max_relative = 1e-12);
        assert_relative_eq!(p.branches[0].resistance, 0.003 * 0.8, max_relative = 1e-12);
        assert_relative_eq!(p.branches[2].capacitance, 50000.0 * 1.1, max_relative = 1e-12);
    }

    #[test]
    fn test_extreme_temperature_goes_non_physical() {
        // R scale reaches zero at dT = -100
        let p = ReferenceParameters::default().at_temperature(-80.0, 25.0);
        assert!(!p.is_physical());
        assert!(p.r0 < 0.0);
    }

    #[test]
    fn test_clamp_policy_bounds_scaling_temperature() {
        let policy = TemperaturePolicy::ClampToTable;
        assert_eq!(policy.scaling_temperature(-80.0), -10.0);
        assert_eq!(policy.scaling_temperature(90.0), 45.0);
        assert_eq!(policy.scaling_temperature(20.0), 20.0);
        let p = ReferenceParameters::default().at_temperature(policy.scaling_temperature(-80.0), 25.0);
        assert!(p.is_physical());
    }

    #[test]
    fn test_branch_relaxation_targets_steady_state_drop() {
        let branch = RCBranch { resistance: 0.003, capacitance: 5000.0 };
        let r = branch.relaxation(-26.0);
        assert_relative_eq!(r.target, -0.078, max_relative = 1e-12);
        assert_relative_eq!(r.time_constant, 15.0, max_relative = 1e-12);
    }
}
