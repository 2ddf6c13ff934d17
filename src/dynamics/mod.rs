pub mod compartment;
pub mod engine;
pub mod rates;
pub mod sampler;
pub mod snapshot;
