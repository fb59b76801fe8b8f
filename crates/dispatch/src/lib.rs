#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`DispatchError`)
//! - [`config`]: Ledger configuration (`LedgerConfig`, builder)
//! - [`ledger`]: Bill/delivery store (`DispatchLedger`)
//! - [`assign`]: Batch assignment (`AssignmentEngine`)
//! - [`tracker`]: Tracking view and proof submission (`DeliveryTracker`)
//! - [`verify`]: Terminal decisions (`VerificationStep`)
//!
//! # Architecture
//!
//! ```text
//! create_bills/list_bills ──> DispatchLedger (single RwLock)
//! AssignmentEngine.assign ──> assign_batch   (all-or-nothing)
//! DeliveryTracker.submit_proof ──> apply_proof    (CAS)
//! VerificationStep.verify ──> apply_decision (CAS, terminal)
//!          |
//!          `── DeliveryEvent ──mpsc──> daemon audit logger
//! ```

pub mod assign;
pub mod config;
pub mod error;
pub mod ledger;
pub mod tracker;
pub mod verify;

// --- Public API Re-exports ---

// Ledger (bill store + delivery store)
pub use ledger::DispatchLedger;

// Configuration
pub use config::{LedgerConfig, LedgerConfigBuilder};

// Error
pub use error::DispatchError;

// Assignment
pub use assign::AssignmentEngine;

// Tracking
pub use tracker::{DeliveryTracker, TrackingEntry, TrackingFilter};

// Verification
pub use verify::VerificationStep;
