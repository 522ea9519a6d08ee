// Domain layer: records, summaries and the ports the pipeline is built on.

pub mod model;
pub mod ports;
