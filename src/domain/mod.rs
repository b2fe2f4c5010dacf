// Domain layer: feed/plan models and ports. Adapters live under crate::adapters.

pub mod model;
pub mod plan;
pub mod ports;
