pub mod app;
pub mod config;
pub mod errors;
pub mod exchange;
pub mod pairs;
pub mod types;

pub use config::Config;
pub use types::*;
