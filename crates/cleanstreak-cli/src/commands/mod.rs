pub mod achievements;
pub mod config;
pub mod habit;
pub mod status;
