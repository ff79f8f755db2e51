//! CLI command implementations.

pub mod calculate;
pub mod common;
pub mod config;
pub mod indices;
pub mod info;
pub mod inspect;
pub mod noise;
pub mod segment;
