// Electrical Traits

/// Electrical state of a single cell.
///
/// Sign conventions follow the cell model: `hysteresis` is +1 after sustained
/// charging and -1 after sustained discharging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    pub state_of_charge: f64,
    pub hysteresis: f64,
    pub rc_voltages: [f64; 3],
}

impl CellState {
    /// Fully charged, relaxed cell.
    pub const fn fully_charged() -> Self {
        CellState {
            state_of_charge: 1.0,
            hysteresis: 0.0,
            rc_voltages: [0.0; 3],
        }
    }

    pub fn polarization_voltage(&self) -> f64 {
        self.rc_voltages.iter().sum()
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::fully_charged()
    }
}

/// Exogenous inputs applied to a cell over one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellInput {
    /// Amperes, positive when discharging.
    pub current: f64,
    /// Ambient temperature in degrees Celsius.
    pub temperature: f64,
}

// General Traits
#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    pub dt: f64,
    pub t: f64,
}

pub trait Model {
    fn reset(&mut self);
}

pub trait ElectricalModel: Model {
    /// Advances the model by `ctx.dt` and returns the terminal voltage.
    fn step_electrical(&mut self, ctx: SimContext, input: CellInput) -> f64;

    fn cell_state(&self) -> CellState;
}
