#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ReportGenError`)
//! - [`config`]: Generator configuration (`ReportGenConfig`)
//! - [`store`]: Append-only report storage (`ReportStore`)
//! - [`generator`]: DSR generation (`ReportGenerator`, `ReportRequest`)

pub mod config;
pub mod error;
pub mod generator;
pub mod store;

// --- Public API Re-exports ---

// Generator (main entry point)
pub use generator::{ReportGenerator, ReportRequest};

// Configuration
pub use config::ReportGenConfig;

// Error
pub use error::ReportGenError;

// Store
pub use store::ReportStore;
