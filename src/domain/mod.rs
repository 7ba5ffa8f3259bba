// Domain layer: summary models and ports. No decoding or file system code here.

pub mod model;
pub mod ports;
