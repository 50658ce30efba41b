// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod analysis;
pub mod app;
pub mod category;
pub mod config;
pub mod db;
pub mod league;
pub mod protocol;
pub mod stats;
pub mod tui;
