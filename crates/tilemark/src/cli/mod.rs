//! Command implementations.

pub mod apply;
pub mod config;
