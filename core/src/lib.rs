pub mod action;
pub mod config;
pub mod error;
pub mod exec;
pub mod report;
pub mod style;
pub mod testing;

#[cfg(test)]
mod testutil;

pub use crate::config::Config;
pub use crate::error::{Error, Result};
