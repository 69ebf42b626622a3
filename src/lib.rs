pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod level;
pub mod rng;
pub mod types;
