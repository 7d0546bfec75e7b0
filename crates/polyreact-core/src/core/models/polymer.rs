use super::ids::{ArmId, PolymerId};

/// One branched molecule, stored as a ring of arms.
#[derive(Debug, Clone, PartialEq)]
pub struct Polymer {
    /// Entry point into the arm ring; `None` once the arms have been returned.
    pub first_end: Option<ArmId>,
    pub num_br: usize,
    pub num_arms: usize,
    /// Total length in monomer units.
    pub tot_len: f64,
    /// Radius-of-gyration contraction relative to a linear chain of equal length.
    pub gfactor: f64,
    /// BoB bin the polymer was classified into.
    pub bin: Option<usize>,
    /// Retained for BoB export.
    pub saved: bool,
    /// Statistical weight correction for undersampled BoB bins.
    pub enrich: f64,
    pub(crate) next_poly: Option<PolymerId>,
}

impl Default for Polymer {
    fn default() -> Self {
        Self {
            first_end: None,
            num_br: 0,
            num_arms: 0,
            tot_len: 0.0,
            gfactor: 1.0,
            bin: None,
            saved: false,
            enrich: 1.0,
            next_poly: None,
        }
    }
}

impl Polymer {
    pub fn is_linear(&self) -> bool {
        self.num_br == 0
    }

    /// Molar mass of the molecule for a given monomer mass.
    pub fn mass(&self, monomer_mass: f64) -> f64 {
        self.tot_len * monomer_mass
    }

    pub fn next(&self) -> Option<PolymerId> {
        self.next_poly
    }
}
