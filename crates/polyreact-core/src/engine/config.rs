use super::kinetics::{BatchKinetics, CstrKinetics};
use crate::core::models::distribution::{
    DEFAULT_ENTANGLEMENT_MASS, DEFAULT_MONOMER_MASS, DEFAULT_MWD_BINS,
};
use crate::core::pool::{
    DEFAULT_ARM_CAPACITY, DEFAULT_DISTRIBUTION_CAPACITY, DEFAULT_POLYMER_CAPACITY, PolymerPool,
};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SEED: u64 = 0x5EED_0F_B0B;
pub const DEFAULT_MAX_DEPTH: usize = 5000;
pub const DEFAULT_MAX_ARM_CAPACITY: usize = 16 * DEFAULT_ARM_CAPACITY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },

    #[error("Failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse configuration {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Reaction kinetics, selected by the `model` key.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum KineticsConfig {
    Batch(BatchKinetics),
    Cstr(CstrKinetics),
}

impl KineticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            KineticsConfig::Batch(k) => k.validate(),
            KineticsConfig::Cstr(k) => k.validate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MaterialConfig {
    pub monomer_mass: f64,
    pub entanglement_mass: f64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            monomer_mass: DEFAULT_MONOMER_MASS,
            entanglement_mass: DEFAULT_ENTANGLEMENT_MASS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GrowthConfig {
    /// Depth ceiling of the growth stack; exceeding it counts as gelation.
    pub max_depth: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MwdConfig {
    pub num_bins: usize,
}

impl Default for MwdConfig {
    fn default() -> Self {
        Self {
            num_bins: DEFAULT_MWD_BINS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BobBinConfig {
    pub num_bins: usize,
    /// Polymers kept per bin before further ones are discarded.
    pub bin_max: usize,
    pub lg_min: f64,
    pub lg_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PoolConfig {
    pub arm_capacity: usize,
    pub polymer_capacity: usize,
    pub distribution_capacity: usize,
    /// Enlarge the arm table and retry a molecule that ran out of arms.
    pub grow_on_exhaustion: bool,
    pub max_arm_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            arm_capacity: DEFAULT_ARM_CAPACITY,
            polymer_capacity: DEFAULT_POLYMER_CAPACITY,
            distribution_capacity: DEFAULT_DISTRIBUTION_CAPACITY,
            grow_on_exhaustion: true,
            max_arm_capacity: DEFAULT_MAX_ARM_CAPACITY,
        }
    }
}

impl PoolConfig {
    pub fn build_pool(&self) -> PolymerPool {
        PolymerPool::new(
            self.arm_capacity,
            self.polymer_capacity,
            self.distribution_capacity,
        )
    }
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SimulationConfig {
    pub kinetics: KineticsConfig,
    #[serde(default)]
    pub material: MaterialConfig,
    pub num_polymers: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub mwd: MwdConfig,
    #[serde(default)]
    pub bob: Option<BobBinConfig>,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline>"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kinetics.validate()?;

        positive("material.monomer-mass", self.material.monomer_mass)?;
        positive("material.entanglement-mass", self.material.entanglement_mass)?;
        nonzero("num-polymers", self.num_polymers)?;
        nonzero("growth.max-depth", self.growth.max_depth)?;
        nonzero("mwd.num-bins", self.mwd.num_bins)?;

        if let Some(bob) = &self.bob {
            nonzero("bob.num-bins", bob.num_bins)?;
            nonzero("bob.bin-max", bob.bin_max)?;
            if !(bob.lg_min.is_finite() && bob.lg_max.is_finite() && bob.lg_min < bob.lg_max) {
                return Err(ConfigError::Invalid {
                    parameter: "bob.lg-min",
                    reason: format!(
                        "bin range [{}, {}] must be finite and non-empty",
                        bob.lg_min, bob.lg_max
                    ),
                });
            }
        }

        nonzero("pool.arm-capacity", self.pool.arm_capacity)?;
        nonzero("pool.polymer-capacity", self.pool.polymer_capacity)?;
        nonzero("pool.distribution-capacity", self.pool.distribution_capacity)?;
        if self.pool.max_arm_capacity < self.pool.arm_capacity {
            return Err(ConfigError::Invalid {
                parameter: "pool.max-arm-capacity",
                reason: format!(
                    "{} is below the initial arm capacity {}",
                    self.pool.max_arm_capacity, self.pool.arm_capacity
                ),
            });
        }
        Ok(())
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            parameter,
            reason: format!("must be a finite positive number, got {}", value),
        })
    }
}

fn nonzero(parameter: &'static str, value: usize) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            parameter,
            reason: "must be greater than zero".to_string(),
        })
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    kinetics: Option<KineticsConfig>,
    num_polymers: Option<usize>,
    material: MaterialConfig,
    seed: Option<u64>,
    growth: GrowthConfig,
    mwd: MwdConfig,
    bob: Option<BobBinConfig>,
    pool: PoolConfig,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinetics(mut self, kinetics: KineticsConfig) -> Self {
        self.kinetics = Some(kinetics);
        self
    }
    pub fn batch(self, kinetics: BatchKinetics) -> Self {
        self.kinetics(KineticsConfig::Batch(kinetics))
    }
    pub fn cstr(self, kinetics: CstrKinetics) -> Self {
        self.kinetics(KineticsConfig::Cstr(kinetics))
    }
    pub fn num_polymers(mut self, n: usize) -> Self {
        self.num_polymers = Some(n);
        self
    }
    pub fn monomer_mass(mut self, mass: f64) -> Self {
        self.material.monomer_mass = mass;
        self
    }
    pub fn entanglement_mass(mut self, mass: f64) -> Self {
        self.material.entanglement_mass = mass;
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.growth.max_depth = depth;
        self
    }
    pub fn mwd_bins(mut self, bins: usize) -> Self {
        self.mwd.num_bins = bins;
        self
    }
    pub fn bob_bins(mut self, bins: BobBinConfig) -> Self {
        self.bob = Some(bins);
        self
    }
    pub fn arm_capacity(mut self, capacity: usize) -> Self {
        self.pool.arm_capacity = capacity;
        self
    }
    pub fn polymer_capacity(mut self, capacity: usize) -> Self {
        self.pool.polymer_capacity = capacity;
        self
    }
    pub fn grow_on_exhaustion(mut self, grow: bool, max_arm_capacity: usize) -> Self {
        self.pool.grow_on_exhaustion = grow;
        self.pool.max_arm_capacity = max_arm_capacity;
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let config = SimulationConfig {
            kinetics: self
                .kinetics
                .ok_or(ConfigError::MissingParameter("kinetics"))?,
            material: self.material,
            num_polymers: self
                .num_polymers
                .ok_or(ConfigError::MissingParameter("num_polymers"))?,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            growth: self.growth,
            mwd: self.mwd,
            bob: self.bob,
            pool: self.pool,
        };
        config.validate()?;
        Ok(config)
    }
}
