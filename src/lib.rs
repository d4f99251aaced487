pub mod config;
pub mod quiz;
