//! # Workflows Module
//!
//! High-level entry points that drive a complete reaction simulation.
//!
//! A workflow owns no state of its own: it borrows a [`PolymerPool`](crate::core::pool::PolymerPool),
//! reads a validated [`SimulationConfig`](crate::engine::config::SimulationConfig),
//! and runs the pool → growth → selection → binning pipeline, reporting
//! progress through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and honouring a [`CancellationToken`](crate::engine::cancel::CancellationToken).
//!
//! - **Simulation Workflow** ([`simulate`]) - grows a batch of molecules into one
//!   distribution and returns a [`SimulationReport`](simulate::SimulationReport)
//!   describing how many were made and why the batch stopped.

pub mod simulate;
