// Library root: re-exports all modules so the CLI and integration tests can
// reach the crate's public API.

pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod populate;
pub mod sportradar;
