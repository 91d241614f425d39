//! Equivalent-circuit electrical model of a lithium-iron-phosphate cell.
//!
//! [`LfpBattery`] combines a bilinear OCV table over SOC and temperature, a
//! directional hysteresis offset, a series resistance and three RC
//! polarization branches whose values scale linearly with temperature.

pub mod analysis;
pub mod battery;
pub mod error;
pub mod hysteresis;
pub mod ocv;
pub mod parameters;

pub use battery::{LfpBattery, ModelConfig};
pub use error::BatteryError;
pub use hysteresis::HysteresisConfig;
pub use ocv::OcvTable;
pub use parameters::{CircuitParameters, RCBranch, ReferenceParameters, TemperaturePolicy};
