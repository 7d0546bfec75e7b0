use super::format::format_significant;
use super::traits::DistributionWriter;
use crate::core::models::arm::Link;
use crate::core::models::distribution::MAX_MIXTURE_DISTRIBUTIONS;
use crate::core::models::ids::{ArmId, DistributionId, PolymerId};
use crate::core::pool::PolymerPool;
use std::collections::HashMap;
use std::io::{self, Write};
use thiserror::Error;

const SINGLE_TAG: &str = "reactpol";
const MIXTURE_TAG: &str = "reactmix";

#[derive(Debug, Error)]
pub enum BobWriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("A mixture needs at least one distribution")]
    EmptyMixture,
    #[error("A mixture holds at most {max} distributions, got {count}")]
    TooManyDistributions { count: usize, max: usize },
    #[error("Distribution {0} is not in use")]
    UnknownDistribution(DistributionId),
    #[error("Invalid mixture weight {weight} for distribution {dist}")]
    InvalidWeight { dist: DistributionId, weight: f64 },
}

/// Polymer-configuration file for the BoB rheology predictor.
///
/// Only polymers marked `saved` are written. Each arm line carries the
/// numbers of the arms joined at its two ends (`-1` for an empty slot), the
/// arm length in entanglement lengths, and the arm's share of the total
/// exported mass.
#[derive(Debug, Clone)]
pub struct BobConfigFile<'a> {
    pool: &'a PolymerPool,
    components: Vec<(DistributionId, f64)>,
    mixture: bool,
}

impl<'a> BobConfigFile<'a> {
    pub fn single(pool: &'a PolymerPool, dist: DistributionId) -> Result<Self, BobWriteError> {
        if !pool.is_distribution_live(dist) {
            return Err(BobWriteError::UnknownDistribution(dist));
        }
        Ok(Self {
            pool,
            components: vec![(dist, 1.0)],
            mixture: false,
        })
    }

    /// Blends several distributions; weights are normalized to sum to one.
    pub fn mixture(
        pool: &'a PolymerPool,
        components: &[(DistributionId, f64)],
    ) -> Result<Self, BobWriteError> {
        if components.is_empty() {
            return Err(BobWriteError::EmptyMixture);
        }
        if components.len() > MAX_MIXTURE_DISTRIBUTIONS {
            return Err(BobWriteError::TooManyDistributions {
                count: components.len(),
                max: MAX_MIXTURE_DISTRIBUTIONS,
            });
        }
        for &(dist, weight) in components {
            if !pool.is_distribution_live(dist) {
                return Err(BobWriteError::UnknownDistribution(dist));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(BobWriteError::InvalidWeight { dist, weight });
            }
        }
        let total: f64 = components.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(BobWriteError::EmptyMixture);
        }
        Ok(Self {
            pool,
            components: components
                .iter()
                .map(|&(dist, weight)| (dist, weight / total))
                .collect(),
            mixture: true,
        })
    }

    fn saved_polymers(&self, dist: DistributionId) -> impl Iterator<Item = PolymerId> + '_ {
        self.pool
            .polymers_of(dist)
            .filter(|(_, p)| p.saved && p.first_end.is_some())
            .map(|(id, _)| id)
    }

    fn saved_count(&self) -> usize {
        self.components
            .iter()
            .map(|&(dist, _)| self.saved_polymers(dist).count())
            .sum()
    }

    fn write_polymer(
        &self,
        writer: &mut impl Write,
        poly: PolymerId,
        n_e: f64,
        weight_scale: f64,
    ) -> io::Result<()> {
        let polymer = self.pool.polymer(poly);
        let Some(first) = polymer.first_end else {
            return Ok(());
        };
        if polymer.tot_len <= 0.0 {
            return Ok(());
        }
        let arms = self.pool.ring_ids(first);
        let numbers: HashMap<ArmId, usize> =
            arms.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let number = |link: Option<Link>| -> i64 {
            link.and_then(|l| numbers.get(&l.arm))
                .map_or(-1, |&n| n as i64)
        };

        writeln!(writer, "{}", arms.len())?;
        for &id in &arms {
            let arm = self.pool.arm(id);
            let armz = arm.arm_len / n_e;
            let armwt = weight_scale * polymer.enrich * arm.arm_len / polymer.tot_len;
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                number(arm.l1),
                number(arm.l2),
                number(arm.r1),
                number(arm.r2),
                format_significant(armz, 12),
                format_significant(armwt, 15)
            )?;
        }
        Ok(())
    }
}

impl DistributionWriter for BobConfigFile<'_> {
    type Error = BobWriteError;

    fn write_to(&self, writer: &mut impl Write) -> Result<(), BobWriteError> {
        let Some(&(lead, _)) = self.components.first() else {
            return Err(BobWriteError::EmptyMixture);
        };
        let n_e = self.pool.distribution(lead).n_e();

        writeln!(writer, "{}", if self.mixture { MIXTURE_TAG } else { SINGLE_TAG })?;
        writeln!(writer, "{:.12}", n_e)?;
        writeln!(writer, "{}", self.saved_count())?;

        for &(dist, fraction) in &self.components {
            // Each saved polymer stands for an equal share of the mass,
            // scaled by its enrichment.
            let saved_enrich: f64 = self
                .saved_polymers(dist)
                .map(|id| self.pool.polymer(id).enrich)
                .sum();
            if saved_enrich <= 0.0 {
                continue;
            }
            let dist_n_e = self.pool.distribution(dist).n_e();
            for poly in self.saved_polymers(dist) {
                self.write_polymer(writer, poly, dist_n_e, fraction / saved_enrich)?;
            }
        }
        Ok(())
    }
}

/// Writes the saved polymers of one distribution in `reactpol` format.
pub fn polyconfwrite(
    pool: &PolymerPool,
    dist: DistributionId,
    writer: &mut impl Write,
) -> Result<(), BobWriteError> {
    BobConfigFile::single(pool, dist)?.write_to(writer)
}

/// Writes the saved polymers of a weighted blend in `reactmix` format.
pub fn multipolyconfwrite(
    pool: &PolymerPool,
    components: &[(DistributionId, f64)],
    writer: &mut impl Write,
) -> Result<(), BobWriteError> {
    BobConfigFile::mixture(pool, components)?.write_to(writer)
}
