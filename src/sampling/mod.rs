pub mod binning;
pub mod groups;
pub mod lifetime;
pub mod tree;
