//! agent-starter - minimal single-agent orchestration loop
//!
//! This library wraps a local language-model backend with a bounded
//! Sense -> Plan -> Act -> Reflect cycle, one whitelisted tool, a short
//! FIFO memory, and a thin HTTP façade.

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod memory;
pub mod tools;

pub use error::{Error, Result};
