pub mod dynamics;
pub mod graph;
pub mod process;
pub mod sampling;

/// dimensional analysis types
pub type NodeId = usize;
pub type GroupIndex = usize;
pub type Time = f64;
pub type Rate = f64;
pub type Propensity = f64;

/// canonical generator seed before any explicit seeding
pub(crate) const DEFAULT_SEED: u64 = 42;

/// logarithmic bin ratio between the fastest and slowest
/// propensity admitted to the same rejection group
pub(crate) const DEFAULT_BASE: f64 = 2.0;

/// resolution of the precomputed -ln(u) lookup table
pub(crate) const LIFETIME_TABLE_SIZE: usize = 100_000;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}
