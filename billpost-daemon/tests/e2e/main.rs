//! End-to-end scenario suite for the composed billpost service.
//!
//! Each scenario drives the [`BillpostService`] facade the way an external
//! client would: authenticate, then operate with bearer tokens. Scenarios
//! live in `scenarios/`, shared fixtures in `helpers/`.

mod helpers;
mod scenarios;
