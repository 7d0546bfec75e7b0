//! # Core Module
//!
//! This module provides the data layer of the polymerization engine: the
//! records that describe a simulated population, the arena that owns them,
//! and the writers that export them.
//!
//! ## Overview
//!
//! A population is a set of branched molecules built from linear arms. The
//! core module stores those molecules in fixed-capacity tables addressed by
//! typed indices and knows nothing about how they are grown; stochastic growth
//! and statistics live in the [`engine`](crate::engine).
//!
//! ## Architecture
//!
//! - **Records** ([`models`]) - Arms, polymers, distributions and their typed ids
//! - **Arena** ([`pool`]) - Request/return ownership protocol with free-list recycling
//! - **File I/O** ([`io`]) - BoB polymer-configuration and MWD CSV writers

pub mod io;
pub mod models;
pub mod pool;
