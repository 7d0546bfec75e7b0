use super::ids::{DistributionId, PolymerId};
use serde::Serialize;

/// Upper bound on the number of MWD bins a distribution can hold.
pub const MAX_MWD_BINS: usize = 1000;
/// Upper bound on the number of BoB selection bins.
pub const MAX_BOB_BINS: usize = 1000;
/// Upper bound on the number of distributions blended into one mixture.
pub const MAX_MIXTURE_DISTRIBUTIONS: usize = 10;

pub const DEFAULT_MONOMER_MASS: f64 = 28.0;
pub const DEFAULT_ENTANGLEMENT_MASS: f64 = 1120.0;
pub const DEFAULT_MWD_BINS: usize = 50;

/// One bin of a molecular weight distribution histogram on a log10(mass) axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MwdBin {
    /// log10 of the bin's centre mass.
    pub lgmid: f64,
    /// Weight fraction density per unit log10(mass).
    pub wt: f64,
    /// Weight-averaged number of branch points.
    pub avbr: f64,
    /// Weight-averaged g-factor.
    pub avg: f64,
    /// Total (weighted) mass collected in the bin.
    pub wmass: f64,
}

/// Size-stratified selection settings and occupancy for BoB export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BobBins {
    pub numbobbins: usize,
    pub bobbinmax: usize,
    pub boblgmin: f64,
    pub boblgmax: f64,
    pub numinbin: Vec<usize>,
}

impl BobBins {
    pub fn is_enabled(&self) -> bool {
        self.numbobbins > 0 && self.bobbinmax > 0 && self.boblgmax > self.boblgmin
    }

    pub fn bin_width(&self) -> f64 {
        (self.boblgmax - self.boblgmin) / self.numbobbins as f64
    }

    /// Bin index for a log10 mass, or `None` when it falls outside the bin range.
    pub fn bin_for(&self, lgmass: f64) -> Option<usize> {
        if !self.is_enabled() {
            return None;
        }
        let position = (lgmass - self.boblgmin) / self.bin_width();
        if position >= 0.0 && position < self.numbobbins as f64 {
            Some(position as usize)
        } else {
            None
        }
    }
}

/// A population of polymers grown under one set of reaction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    /// Head of the polymer list; the most recently linked polymer comes first.
    pub first_poly: Option<PolymerId>,
    pub npoly: usize,
    pub nsaved: usize,
    pub monmass: f64,
    pub m_e: f64,
    pub nummwdbins: usize,
    pub mwd: Vec<MwdBin>,
    /// log10 mass bounds of the MWD grid from the last binning pass.
    pub lgmin: f64,
    pub lgmax: f64,
    pub bob: BobBins,
    pub m_w: f64,
    pub m_n: f64,
    /// Branch points per 1000 monomer units.
    pub brav: f64,
    /// Incremented every time the distribution is reset for a new simulation.
    pub simnumber: u64,
    pub(crate) next: Option<DistributionId>,
}

impl Default for Distribution {
    fn default() -> Self {
        Self {
            first_poly: None,
            npoly: 0,
            nsaved: 0,
            monmass: DEFAULT_MONOMER_MASS,
            m_e: DEFAULT_ENTANGLEMENT_MASS,
            nummwdbins: DEFAULT_MWD_BINS,
            mwd: Vec::new(),
            lgmin: 0.0,
            lgmax: 0.0,
            bob: BobBins::default(),
            m_w: 0.0,
            m_n: 0.0,
            brav: 0.0,
            simnumber: 0,
            next: None,
        }
    }
}

impl Distribution {
    /// Entanglement length in monomer units.
    pub fn n_e(&self) -> f64 {
        self.m_e / self.monmass
    }

    pub fn mwd_bin_width(&self) -> f64 {
        if self.mwd.is_empty() {
            0.0
        } else {
            (self.lgmax - self.lgmin) / self.mwd.len() as f64
        }
    }

    /// Clears polymer bookkeeping and statistics, keeping material and bin settings.
    pub(crate) fn clear_population(&mut self) {
        self.first_poly = None;
        self.npoly = 0;
        self.nsaved = 0;
        self.mwd.clear();
        self.m_w = 0.0;
        self.m_n = 0.0;
        self.brav = 0.0;
        self.bob.numinbin.iter_mut().for_each(|n| *n = 0);
    }
}
