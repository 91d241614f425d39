use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use simcore::{CellInput, CellState, ElectricalModel, IntegrationMethod, Integrator, Model, SimContext};

use crate::error::{BatteryError, Result};
use crate::hysteresis::HysteresisConfig;
use crate::ocv::OcvTable;
use crate::parameters::{CircuitParameters, ReferenceParameters, TemperaturePolicy};

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Nominal capacity, ampere-hours.
    pub capacity_ah: f64,
    /// Temperature at which `circuit` holds, °C.
    pub reference_temperature: f64,
    pub hysteresis: HysteresisConfig,
    pub circuit: ReferenceParameters,
    pub temperature_policy: TemperaturePolicy,
    /// Scheme for the RC branch voltages. Hysteresis always uses forward Euler.
    pub rc_integration: IntegrationMethod,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            capacity_ah: 5.0,
            reference_temperature: 25.0,
            hysteresis: HysteresisConfig::default(),
            circuit: ReferenceParameters::default(),
            temperature_policy: TemperaturePolicy::default(),
            rc_integration: IntegrationMethod::default(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.capacity_ah.is_finite() && self.capacity_ah > 0.0) {
            return Err(BatteryError::InvalidCapacity(self.capacity_ah));
        }
        if !self.reference_temperature.is_finite() {
            return Err(BatteryError::InvalidTemperature(self.reference_temperature));
        }
        Ok(())
    }
}

/// Three-branch equivalent-circuit model of an LFP cell with OCV hysteresis.
///
/// Current is positive when discharging. Each call to [`LfpBattery::step`]
/// advances hysteresis, SOC and the RC branches by `dt` and returns the
/// terminal voltage `OCV + I*R0 + V1 + V2 + V3`.
#[derive(Debug, Clone)]
pub struct LfpBattery {
    config: ModelConfig,
    table: Arc<OcvTable>,
    state: CellState,
    warned_non_physical: bool,
}

impl Default for LfpBattery {
    fn default() -> Self {
        let config = ModelConfig::default();
        let mut battery = LfpBattery {
            config,
            table: OcvTable::lfp_reference(),
            state: CellState::fully_charged(),
            warned_non_physical: false,
        };
        battery.reset();
        battery
    }
}

impl LfpBattery {
    pub fn new(capacity_ah: f64, reference_temperature: f64) -> Result<Self> {
        Self::from_config(ModelConfig {
            capacity_ah,
            reference_temperature,
            ..ModelConfig::default()
        })
    }

    pub fn from_config(config: ModelConfig) -> Result<Self> {
        Self::with_table(config, OcvTable::lfp_reference())
    }

    /// Uses a caller-supplied OCV calibration instead of the reference LFP table.
    pub fn with_table(config: ModelConfig, table: Arc<OcvTable>) -> Result<Self> {
        config.validate()?;
        debug!(
            "LFP cell: {} Ah, reference {} °C, {:?} scaling",
            config.capacity_ah, config.reference_temperature, config.temperature_policy
        );

        let mut battery = LfpBattery {
            config,
            table,
            state: CellState::fully_charged(),
            warned_non_physical: false,
        };
        battery.reset();
        Ok(battery)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn table(&self) -> &OcvTable {
        &self.table
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = CellState::fully_charged();
        self.warned_non_physical = false;
    }

    /// Circuit parameters in effect at `temperature`.
    pub fn parameters_at(&self, temperature: f64) -> CircuitParameters {
        let scaling = self.config.temperature_policy.scaling_temperature(temperature);
        self.config
            .circuit
            .at_temperature(scaling, self.config.reference_temperature)
    }

    /// Equilibrium voltage at `soc` (0..1) including the present hysteresis offset.
    pub fn open_circuit_voltage(&self, soc: f64, temperature: f64) -> f64 {
        let soc = soc.clamp(0.0, 1.0);
        self.table.interpolate(soc * 100.0, temperature)
            + self.config.hysteresis.voltage(self.state.hysteresis, soc)
    }

    /// Advances the cell by `dt` seconds under `current` (A, positive = discharge)
    /// at `temperature` (°C) and returns the terminal voltage.
    pub fn step(&mut self, current: f64, temperature: f64, dt: f64) -> f64 {
        let hysteresis = &self.config.hysteresis;

        self.state.hysteresis = hysteresis.advance(self.state.hysteresis, current, dt);

        let d_soc = -current * dt / (self.config.capacity_ah * SECONDS_PER_HOUR);
        self.state.state_of_charge = (self.state.state_of_charge + d_soc).clamp(0.0, 1.0);

        let params = self.parameters_at(temperature);
        if !params.is_physical() && !self.warned_non_physical {
            warn!(
                "non-physical circuit parameters at {} °C (reference {} °C): {:?}",
                temperature, self.config.reference_temperature, params
            );
            self.warned_non_physical = true;
        }

        let method = self.config.rc_integration;
        for (v, branch) in self.state.rc_voltages.iter_mut().zip(&params.branches) {
            *v = method.advance(*v, branch.relaxation(current), dt);
        }

        let [v1, v2, v3] = self.state.rc_voltages;
        self.open_circuit_voltage(self.state.state_of_charge, temperature)
            + current * params.r0
            + v1
            + v2
            + v3
    }
}

impl Model for LfpBattery {
    fn reset(&mut self) {
        LfpBattery::reset(self);
    }
}

impl ElectricalModel for LfpBattery {
    fn step_electrical(&mut self, ctx: SimContext, input: CellInput) -> f64 {
        self.step(input.current, input.temperature, ctx.dt)
    }

    fn cell_state(&self) -> CellState {
        self.state
    }
}
