// Domain layer: vendor records, sync plans and reports, plus the ports the
// adapters implement.

pub mod model;
pub mod ports;
