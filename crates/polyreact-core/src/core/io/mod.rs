//! Export of simulation results.
//!
//! Writers borrow the pool and stream a distribution (or a weighted mixture of
//! distributions) into a text format through the shared [`traits::DistributionWriter`]
//! interface: the BoB polymer-configuration format and a CSV rendition of the
//! molecular weight distribution.

pub mod bob;
pub mod format;
pub mod mwd;
pub mod traits;
