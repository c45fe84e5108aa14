// Domain layer: the document model and the traits tag handlers implement.

pub mod model;
pub mod ports;
