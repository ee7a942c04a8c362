pub mod artifact;
pub mod deployer;
pub mod fixture;
pub mod format;
pub mod interface;
pub mod shared;
