#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`AuthGuardError`)
//! - [`config`]: Guard configuration (`AuthGuardConfig`, builder)
//! - [`directory`]: Seed account directory (`PrincipalDirectory`, `AccountRecord`)
//! - [`token`]: Session tokens (`SessionStore`, `IssuedToken`)
//! - [`guard`]: Main entry point (`AuthGuard`)

pub mod config;
pub mod directory;
pub mod error;
pub mod guard;
pub mod token;

// --- Public API Re-exports ---

// Guard (main entry point)
pub use guard::AuthGuard;

// Configuration
pub use config::{AuthGuardConfig, AuthGuardConfigBuilder};

// Error
pub use error::AuthGuardError;

// Directory
pub use directory::{AccountRecord, PrincipalDirectory};

// Tokens
pub use token::{IssuedToken, Session, SessionStore};
