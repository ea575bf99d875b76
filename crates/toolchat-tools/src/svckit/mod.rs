//! Host functions exposed to the model

mod counties;
mod weather;

pub use counties::{CountiesInStateTool, UNRECOGNIZED_STATE};
pub use weather::{CurrentTemperatureTool, Unit};
