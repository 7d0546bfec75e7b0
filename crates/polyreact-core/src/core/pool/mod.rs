//! Arena storage for arms, polymers and distributions.
//!
//! Each record kind lives in a [`table::RecordTable`]: a contiguous array with
//! an intrusive free list and an explicit, index-preserving growth path.
//! [`PolymerPool`] bundles the three tables and implements the request/return
//! protocol used by the growth engine and the reaction workflows.

pub mod error;
mod polymer_pool;
pub mod table;

pub use error::PoolError;
pub use polymer_pool::{
    DEFAULT_ARM_CAPACITY, DEFAULT_DISTRIBUTION_CAPACITY, DEFAULT_POLYMER_CAPACITY, PolymerIter,
    PolymerPool, RingIter,
};
