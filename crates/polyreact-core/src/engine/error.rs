use thiserror::Error;

use super::binning::BinningError;
use super::config::ConfigError;
use super::growth::GrowthError;
use crate::core::models::ids::DistributionId;
use crate::core::pool::PoolError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Pool operation failed: {source}")]
    Pool {
        #[from]
        source: PoolError,
    },

    #[error("Polymer growth failed: {source}")]
    Growth {
        #[from]
        source: GrowthError,
    },

    #[error("Binning failed: {source}")]
    Binning {
        #[from]
        source: BinningError,
    },

    #[error("Distribution {0} is not in use")]
    UnknownDistribution(DistributionId),
}
