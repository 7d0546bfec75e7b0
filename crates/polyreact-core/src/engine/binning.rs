//! Molecular weight distribution histograms and summary moments.
//!
//! Both entry points make two passes over the polymer records: one to find
//! the mass range and lay out a logarithmic grid padded by 1% on each side,
//! one to accumulate each polymer into its bin.
//!
//! Growth starts every molecule from a randomly chosen monomer unit, so the
//! population is already sampled in proportion to mass. Each polymer therefore
//! counts once (times its mixture factor), the normalized `wt` column is the
//! weight fraction per unit `log10(M)`, and the number average comes from the
//! reciprocal-mass sum. Polymers whose mass falls outside the grid are dropped
//! from the bins but still count towards the normalization total.

use crate::core::models::distribution::{MAX_MIXTURE_DISTRIBUTIONS, MAX_MWD_BINS, MwdBin};
use crate::core::models::ids::DistributionId;
use crate::core::pool::PolymerPool;
use itertools::{Itertools, MinMaxResult};
use thiserror::Error;
use tracing::{debug, instrument, warn};

const EMPTY_BIN_GUARD: f64 = 1e-80;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BinningError {
    #[error("Distribution {0} is not in use")]
    UnknownDistribution(DistributionId),

    #[error("A mixture needs at least one distribution")]
    EmptyMixture,

    #[error("A mixture holds at most {max} distributions, got {count}")]
    TooManyDistributions { count: usize, max: usize },

    #[error("Invalid mixture weight {weight} for distribution {dist}")]
    InvalidWeight { dist: DistributionId, weight: f64 },
}

/// Binned MWD of a weighted blend of distributions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixtureMwd {
    pub bins: Vec<MwdBin>,
    pub lgmin: f64,
    pub lgmax: f64,
    pub m_w: f64,
    pub m_n: f64,
    pub brav: f64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    mass: f64,
    factor: f64,
    num_br: f64,
    tot_len: f64,
    gfactor: f64,
}

fn clamp_bins(requested: usize) -> usize {
    if requested > MAX_MWD_BINS {
        warn!(
            "Requested {} MWD bins; clamping to {}.",
            requested, MAX_MWD_BINS
        );
    }
    requested.clamp(1, MAX_MWD_BINS)
}

fn collect_samples(pool: &PolymerPool, dist: DistributionId, factor: f64, out: &mut Vec<Sample>) {
    let monmass = pool.distribution(dist).monmass;
    out.extend(pool.polymers_of(dist).map(|(_, p)| Sample {
        mass: p.mass(monmass),
        factor,
        num_br: p.num_br as f64,
        tot_len: p.tot_len,
        gfactor: p.gfactor,
    }));
}

fn bin_samples(samples: &[Sample], nbins: usize) -> MixtureMwd {
    let range = samples
        .iter()
        .map(|s| s.mass)
        .filter(|m| *m > 0.0 && m.is_finite())
        .minmax();
    let (min, max) = match range {
        MinMaxResult::NoElements => return MixtureMwd::default(),
        MinMaxResult::OneElement(m) => (m, m),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let lgmin = (min * 0.99).log10();
    let lgmax = (max * 1.01).log10();
    let width = (lgmax - lgmin) / nbins as f64;

    let mut bins = vec![MwdBin::default(); nbins];
    let mut wttot = 0.0;
    let mut mass_sum = 0.0;
    let mut reciprocal_sum = 0.0;
    let mut branch_density = 0.0;

    for s in samples {
        wttot += s.factor;
        mass_sum += s.factor * s.mass;
        if s.mass > 0.0 {
            reciprocal_sum += s.factor / s.mass;
        }
        if s.tot_len > 0.0 {
            branch_density += s.factor * s.num_br / s.tot_len;
        }

        let position = ((s.mass.log10() - lgmin) / width).floor();
        if position >= 0.0 && position < nbins as f64 {
            let bin = &mut bins[position as usize];
            bin.wt += s.factor;
            bin.avbr += s.factor * s.num_br;
            bin.avg += s.factor * s.gfactor;
            bin.wmass += s.factor;
        }
    }

    for (i, bin) in bins.iter_mut().enumerate() {
        bin.avbr /= bin.wmass + EMPTY_BIN_GUARD;
        bin.avg /= bin.wmass + EMPTY_BIN_GUARD;
        bin.wt /= wttot * width;
        bin.lgmid = lgmin + (i as f64 + 0.5) * width;
    }

    MixtureMwd {
        bins,
        lgmin,
        lgmax,
        m_w: if wttot > 0.0 { mass_sum / wttot } else { 0.0 },
        m_n: if reciprocal_sum > 0.0 { wttot / reciprocal_sum } else { 0.0 },
        brav: if wttot > 0.0 { 1000.0 * branch_density / wttot } else { 0.0 },
    }
}

/// Bins one distribution's polymers and stores the MWD and moments on it.
#[instrument(skip_all, name = "molbin_task")]
pub fn molbin(pool: &mut PolymerPool, dist: DistributionId) -> Result<(), BinningError> {
    if !pool.is_distribution_live(dist) {
        return Err(BinningError::UnknownDistribution(dist));
    }
    let nbins = clamp_bins(pool.distribution(dist).nummwdbins);
    let mut samples = Vec::with_capacity(pool.distribution(dist).npoly);
    collect_samples(pool, dist, 1.0, &mut samples);
    if samples.is_empty() {
        warn!("Distribution {} has no polymers to bin.", dist);
    }
    let result = bin_samples(&samples, nbins);

    let d = pool.distribution_mut(dist);
    d.mwd = result.bins;
    d.lgmin = result.lgmin;
    d.lgmax = result.lgmax;
    d.m_w = result.m_w;
    d.m_n = result.m_n;
    d.brav = result.brav;
    debug!(
        "Distribution {}: {} polymers, Mw = {:.4e}, Mn = {:.4e}, {:.4} branches per 1000 monomers.",
        dist, d.npoly, d.m_w, d.m_n, d.brav
    );
    Ok(())
}

/// Bins a weighted blend of up to [`MAX_MIXTURE_DISTRIBUTIONS`] distributions on one grid.
///
/// Each polymer of distribution `d` contributes with factor `w_d / npoly_d`;
/// distributions with zero weight or no polymers are left out of the grid.
#[instrument(skip_all, name = "multimolbin_task")]
pub fn multimolbin(
    pool: &PolymerPool,
    components: &[(DistributionId, f64)],
    nbins: usize,
) -> Result<MixtureMwd, BinningError> {
    if components.is_empty() {
        return Err(BinningError::EmptyMixture);
    }
    if components.len() > MAX_MIXTURE_DISTRIBUTIONS {
        return Err(BinningError::TooManyDistributions {
            count: components.len(),
            max: MAX_MIXTURE_DISTRIBUTIONS,
        });
    }
    for &(dist, weight) in components {
        if !pool.is_distribution_live(dist) {
            return Err(BinningError::UnknownDistribution(dist));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(BinningError::InvalidWeight { dist, weight });
        }
    }

    let mut samples = Vec::new();
    for &(dist, weight) in components {
        let npoly = pool.distribution(dist).npoly;
        if weight > 0.0 && npoly > 0 {
            collect_samples(pool, dist, weight / npoly as f64, &mut samples);
        }
    }
    Ok(bin_samples(&samples, clamp_bins(nbins)))
}
