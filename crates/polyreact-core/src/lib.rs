//! # polyreact
//!
//! A Monte-Carlo engine for branched polymers made by free-radical
//! polymerization. Molecules are grown one at a time as random arm trees
//! from reaction kinetics, binned into a molecular-weight distribution, and
//! optionally sampled into configuration files for the BoB rheology
//! predictor.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Plain data records (arms, polymers,
//!   distributions), the [`PolymerPool`](core::pool::PolymerPool) arena that
//!   hands them out, and writers for the BoB and MWD file formats.
//!
//! - **[`engine`]: The Logic Core.** Kinetic models, stochastic tree growth,
//!   topology clean-up, mass and radius-of-gyration measurement, binning, and
//!   BoB selection, together with configuration, error and progress types.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into
//!   a complete simulation run.

pub mod core;
pub mod engine;
pub mod workflows;
