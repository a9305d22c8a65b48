pub mod args;
pub mod config;
pub mod runner;

pub use args::*;
pub use config::*;
pub use runner::*;
