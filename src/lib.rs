pub mod analysis;
pub mod audit;
pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
