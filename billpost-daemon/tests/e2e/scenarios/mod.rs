//! E2E scenarios.

mod batch_atomicity;
mod delivery_flow;
mod proof_lifecycle;
mod report_flow;
mod role_enforcement;
