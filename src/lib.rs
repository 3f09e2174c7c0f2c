// src/lib.rs
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod inspector;
pub mod payload;
pub mod reporter;
pub mod runner;
pub mod tokens;
