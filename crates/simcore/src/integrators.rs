use serde::{Deserialize, Serialize};

use crate::SimContext;

/// A first-order linear relaxation `dx/dt = (target - x) / tau`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    pub target: f64,
    pub time_constant: f64,
}

impl Relaxation {
    pub fn new(target: f64, time_constant: f64) -> Self {
        Relaxation {
            target,
            time_constant,
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        (self.target - x) / self.time_constant
    }
}

/// A generic integration strategy trait.
pub trait Integrator {
    /// Advances `x` by one timestep under the given relaxation.
    fn advance(&self, x: f64, relaxation: Relaxation, dt: f64) -> f64;
}

/// Explicit (forward) Euler.
/// First-order accurate and only stable for `dt < 2 * tau`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn advance(&self, x: f64, relaxation: Relaxation, dt: f64) -> f64 {
        x + relaxation.derivative(x) * dt
    }
}

/// Exact solution of the relaxation with the target held constant over the step.
/// Unconditionally stable; matches forward Euler as `dt / tau -> 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactExponential;

impl Integrator for ExactExponential {
    fn advance(&self, x: f64, relaxation: Relaxation, dt: f64) -> f64 {
        let decay = (-dt / relaxation.time_constant).exp();
        decay * x + relaxation.target * (1.0 - decay)
    }
}

/// Selects the integration scheme by name, e.g. from a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    #[default]
    ForwardEuler,
    Exponential,
}

impl Integrator for IntegrationMethod {
    fn advance(&self, x: f64, relaxation: Relaxation, dt: f64) -> f64 {
        match self {
            IntegrationMethod::ForwardEuler => ForwardEuler.advance(x, relaxation, dt),
            IntegrationMethod::Exponential => ExactExponential.advance(x, relaxation, dt),
        }
    }
}

/// Fixed-timestep wrapper that accumulates time and
/// runs multiple sub-steps if needed.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    pub fixed_dt: f64,
    pub accumulator: f64,
    pub elapsed: f64,
}

impl FixedTimestep {
    pub fn new(fixed_dt: f64) -> Self {
        FixedTimestep {
            fixed_dt,
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Runs as many fixed-timestep sub-steps as fit into `dt`, calling `step` with
    /// the context of each one (`t` is the time at the start of the sub-step).
    /// Returns the remaining time that didn't fit into a full step.
    pub fn advance<F>(&mut self, dt: f64, mut step: F) -> f64
    where
        F: FnMut(SimContext),
    {
        self.accumulator += dt;

        // Tolerate rounding so that e.g. 3600 steps of 1.0 s fit into 3600.0 s.
        let epsilon = self.fixed_dt * 1e-9;
        while self.accumulator + epsilon >= self.fixed_dt {
            step(SimContext {
                dt: self.fixed_dt,
                t: self.elapsed,
            });
            self.accumulator -= self.fixed_dt;
            self.elapsed += self.fixed_dt;
        }
        if self.accumulator < 0.0 {
            self.accumulator = 0.0;
        }

        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_forward_euler_single_step() {
        let x = ForwardEuler.advance(0.0, Relaxation::new(1.0, 600.0), 1.0);
        assert_abs_diff_eq!(x, 1.0 / 600.0, epsilon = 1e-15);
    }

    #[test]
    fn test_forward_euler_decay_to_zero() {
        let x = ForwardEuler.advance(0.5, Relaxation::new(0.0, 3600.0), 1.0);
        assert_abs_diff_eq!(x, 0.5 - 0.5 / 3600.0, epsilon = 1e-15);
    }

    #[test]
    fn test_exponential_stable_for_large_steps() {
        // Forward Euler would oscillate and diverge with dt = 10 * tau
        let relaxation = Relaxation::new(2.0, 1.0);
        let mut x = 0.0;
        for _ in 0..5 {
            x = ExactExponential.advance(x, relaxation, 10.0);
            assert!(x <= 2.0 && x >= 0.0);
        }
        assert_abs_diff_eq!(x, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_methods_agree_for_small_steps() {
        let relaxation = Relaxation::new(-0.078, 15.0);
        let euler = IntegrationMethod::ForwardEuler.advance(0.0, relaxation, 1e-3);
        let exact = IntegrationMethod::Exponential.advance(0.0, relaxation, 1e-3);
        assert_abs_diff_eq!(euler, exact, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_timestep_accumulator() {
        let mut stepper = FixedTimestep::new(0.01);
        let mut count = 0;

        // Simulate 0.025s with fixed 0.01s steps
        let remaining = stepper.advance(0.025, |_| count += 1);

        // Should have done 2 steps, with 0.005s remaining
        assert_eq!(count, 2);
        assert_abs_diff_eq!(remaining, 0.005, epsilon = 1e-9);
        assert_abs_diff_eq!(stepper.elapsed, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_timestep_reports_start_time() {
        let mut stepper = FixedTimestep::new(1.0);
        let mut times = Vec::new();
        stepper.advance(3.0, |ctx| times.push(ctx.t));
        stepper.advance(2.0, |ctx| times.push(ctx.t));
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
