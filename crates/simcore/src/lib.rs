pub mod integrators;
pub mod traits;

pub use integrators::{
    ExactExponential, FixedTimestep, ForwardEuler, IntegrationMethod, Integrator, Relaxation,
};
pub use traits::{CellInput, CellState, ElectricalModel, Model, SimContext};
