use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Failed to allocate backing storage for {requested} records")]
    Allocation { requested: usize },

    #[error("New capacity {requested} does not exceed current capacity {current}")]
    CapacityNotIncreased { current: usize, requested: usize },

    #[error("Slot {index} is not currently issued")]
    NotLive { index: usize },

    #[error("No distribution slots available")]
    DistributionsExhausted,
}
