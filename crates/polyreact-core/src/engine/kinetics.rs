//! Kinetic models driving the stochastic growth.
//!
//! A model describes, for a chain whose monomers were added at a given
//! reaction coordinate (conversion for a batch reactor, dimensionless residence
//! age for a CSTR), the rates of the events that end or interrupt an arm and
//! the laws for the reaction coordinate of neighbouring chains.

use super::config::ConfigError;
use rand::Rng;
use serde::Deserialize;

/// Event rates and reaction-coordinate sampling laws for one reactor type.
pub trait Kinetics {
    /// Reaction coordinate of a randomly chosen monomer unit.
    fn initial_conversion(&self, rng: &mut impl Rng) -> f64;

    /// Probability per added monomer that the growing radical stops.
    fn chain_end_rate(&self, conv: f64) -> f64;

    /// Branch points per monomer unit accumulated by the end of the reaction.
    fn branch_density(&self, conv: f64) -> f64;

    /// Scission points per monomer unit accumulated by the end of the reaction.
    fn scission_density(&self, conv: f64) -> f64;

    /// Fraction of radical chain ends that terminate by combination.
    fn combination_probability(&self, conv: f64) -> f64;

    /// Fraction of chain heads that started on an existing backbone.
    fn backbone_attach_probability(&self, conv: f64) -> f64;

    /// Reaction coordinate of a chain that grew from this one later on.
    fn later_conversion(&self, conv: f64, rng: &mut impl Rng) -> f64;

    /// Reaction coordinate of the older backbone a chain head attached to.
    fn earlier_conversion(&self, conv: f64, rng: &mut impl Rng) -> f64;
}

/// Exponential waiting length for a Poisson process of the given rate.
///
/// A non-positive rate never fires and yields infinity.
pub fn exponential_length(rate: f64, rng: &mut impl Rng) -> f64 {
    if rate <= 0.0 {
        return f64::INFINITY;
    }
    let u: f64 = rng.gen_range(0.0..1.0);
    -(1.0 - u).ln() / rate
}

fn check_rate(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            parameter,
            reason: format!("must be a finite non-negative number, got {}", value),
        })
    }
}

/// Free-radical polymerization in a batch reactor (Tobita's formulation).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BatchKinetics {
    /// Transfer-to-small-molecule plus disproportionation, per propagation step.
    pub tau: f64,
    /// Termination by combination, per propagation step.
    pub beta: f64,
    /// Transfer-to-polymer (long-chain branching) constant.
    pub cb: f64,
    /// Chain scission constant.
    pub cs: f64,
    /// Final conversion reached by the batch.
    pub conversion: f64,
}

impl BatchKinetics {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("kinetics.tau", self.tau)?;
        check_rate("kinetics.beta", self.beta)?;
        check_rate("kinetics.cb", self.cb)?;
        check_rate("kinetics.cs", self.cs)?;
        if self.tau + self.beta <= 0.0 {
            return Err(ConfigError::Invalid {
                parameter: "kinetics.tau",
                reason: "tau + beta must be positive for chains to terminate".to_string(),
            });
        }
        if !(self.conversion > 0.0 && self.conversion < 1.0) {
            return Err(ConfigError::Invalid {
                parameter: "kinetics.conversion",
                reason: format!("must lie strictly between 0 and 1, got {}", self.conversion),
            });
        }
        Ok(())
    }

    fn transfer_to_polymer(&self, conv: f64) -> f64 {
        self.cb * conv / (1.0 - conv)
    }

    /// `ln((1-θ)/(1-X))`: exposure of units formed at θ to later reactions.
    fn exposure(&self, conv: f64) -> f64 {
        ((1.0 - conv) / (1.0 - self.conversion)).ln().max(0.0)
    }
}

impl Kinetics for BatchKinetics {
    fn initial_conversion(&self, rng: &mut impl Rng) -> f64 {
        self.conversion * rng.gen_range(0.0..1.0)
    }

    fn chain_end_rate(&self, conv: f64) -> f64 {
        self.tau + self.beta + self.transfer_to_polymer(conv)
    }

    fn branch_density(&self, conv: f64) -> f64 {
        self.cb * self.exposure(conv)
    }

    fn scission_density(&self, conv: f64) -> f64 {
        self.cs * self.exposure(conv)
    }

    fn combination_probability(&self, conv: f64) -> f64 {
        self.beta / self.chain_end_rate(conv)
    }

    fn backbone_attach_probability(&self, conv: f64) -> f64 {
        self.transfer_to_polymer(conv) / self.chain_end_rate(conv)
    }

    /// Branches attach with density proportional to `1/(1-θ')` over `[θ, X]`;
    /// this inverts that cumulative law.
    fn later_conversion(&self, conv: f64, rng: &mut impl Rng) -> f64 {
        let u: f64 = rng.gen_range(0.0..1.0);
        let ratio = (1.0 - self.conversion) / (1.0 - conv);
        1.0 - (1.0 - conv) * ratio.powf(u)
    }

    /// Backbone units are laid down uniformly in conversion.
    fn earlier_conversion(&self, conv: f64, rng: &mut impl Rng) -> f64 {
        conv * rng.gen_range(0.0..1.0)
    }
}

/// Free-radical polymerization in a continuous stirred-tank reactor.
///
/// The reaction coordinate is the residence age of a unit, in units of the
/// mean residence time, so rates are constant and branch exposure grows
/// linearly with age.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CstrKinetics {
    pub tau: f64,
    pub beta: f64,
    /// Transfer-to-polymer events per propagation step.
    pub sigma: f64,
    /// Scission events per monomer unit per mean residence time.
    pub lambda: f64,
}

impl CstrKinetics {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("kinetics.tau", self.tau)?;
        check_rate("kinetics.beta", self.beta)?;
        check_rate("kinetics.sigma", self.sigma)?;
        check_rate("kinetics.lambda", self.lambda)?;
        if self.tau + self.beta <= 0.0 {
            return Err(ConfigError::Invalid {
                parameter: "kinetics.tau",
                reason: "tau + beta must be positive for chains to terminate".to_string(),
            });
        }
        Ok(())
    }
}

impl Kinetics for CstrKinetics {
    fn initial_conversion(&self, rng: &mut impl Rng) -> f64 {
        exponential_length(1.0, rng)
    }

    fn chain_end_rate(&self, _conv: f64) -> f64 {
        self.tau + self.beta + self.sigma
    }

    fn branch_density(&self, age: f64) -> f64 {
        self.sigma * age
    }

    fn scission_density(&self, age: f64) -> f64 {
        self.lambda * age
    }

    fn combination_probability(&self, conv: f64) -> f64 {
        self.beta / self.chain_end_rate(conv)
    }

    fn backbone_attach_probability(&self, conv: f64) -> f64 {
        self.sigma / self.chain_end_rate(conv)
    }

    fn later_conversion(&self, age: f64, rng: &mut impl Rng) -> f64 {
        age * rng.gen_range(0.0..1.0)
    }

    fn earlier_conversion(&self, age: f64, rng: &mut impl Rng) -> f64 {
        age + exponential_length(1.0, rng)
    }
}
