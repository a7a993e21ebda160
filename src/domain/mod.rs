// Domain layer: point/tier models, ports (interfaces) and the four map/reduce services.
// No external dependencies beyond std/serde.

pub mod model;
pub mod ports;

pub mod services;
