//! # Engine Module
//!
//! This module implements the Monte-Carlo growth engine that builds branched
//! polymer molecules and the statistics computed over the resulting populations.
//!
//! ## Overview
//!
//! Each molecule is grown independently from a randomly chosen monomer unit by
//! drawing exponential waiting lengths for chain ends, long-chain branch points
//! and scission points, with rates supplied by a kinetic model. Finished
//! molecules are normalized, measured, selected for BoB export, and binned into
//! molecular weight distributions.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Simulation parameters, TOML loading and validation
//! - **Kinetics** ([`kinetics`]) - Batch and CSTR rate laws behind the [`kinetics::Kinetics`] trait
//! - **Growth** ([`growth`]) - Stack-driven stochastic tree growth with a gelation ceiling
//! - **Normalization** ([`cleanup`], [`mass_rg`]) - Joint merging, arm numbering, mass and g-factor
//! - **Statistics** ([`binning`], [`bob_select`]) - MWD histograms and size-stratified selection
//! - **Control** ([`cancel`], [`progress`]) - Cooperative cancellation and progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error aggregation

pub mod binning;
pub mod bob_select;
pub mod cancel;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod growth;
pub mod kinetics;
pub mod mass_rg;
pub mod progress;
