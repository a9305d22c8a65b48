pub mod fixture;
pub mod git;

pub use git::*;
