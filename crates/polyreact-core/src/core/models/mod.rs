//! # Core Models Module
//!
//! This module contains the record types that make up a simulated polymer population.
//!
//! ## Overview
//!
//! A population is stored as three kinds of records, each living in its own
//! fixed-capacity table inside the [`PolymerPool`](crate::core::pool::PolymerPool):
//!
//! - [`arm`] - Linear backbone segments with typed links to neighbouring arm ends
//! - [`polymer`] - Branched molecules, each owning a closed ring of arms
//! - [`distribution`] - Populations of polymers plus their MWD and BoB-bin results
//! - [`ids`] - Typed indices so that the three index spaces can never be mixed
//!
//! Records reference each other only through these indices; ownership is
//! transferred explicitly by requesting and returning slots from the pool.

pub mod arm;
pub mod distribution;
pub mod ids;
pub mod polymer;
