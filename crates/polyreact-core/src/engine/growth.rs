//! Stochastic tree growth of a single molecule.
//!
//! A molecule is grown outward from a randomly chosen monomer unit. Every arm
//! is grown by drawing exponential waiting lengths for the three events that
//! can interrupt it (chain end, branch point, scission point); the shortest
//! draw decides the arm length and which arms are attached at its growing end.
//! Pending arms are kept on an explicit work stack, each tagged with its depth
//! below the seed so that runaway branching is caught as gelation instead of
//! exhausting memory.

use super::cleanup;
use super::kinetics::{Kinetics, exponential_length};
use super::mass_rg;
use crate::core::models::arm::ArmEnd;
use crate::core::models::ids::{ArmId, PolymerId};
use crate::core::pool::{PolymerPool, PoolError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrowthError {
    #[error("Arm pool exhausted while growing a molecule")]
    ArmsExhausted,

    #[error("Molecule gelled: growth depth exceeded {depth}")]
    Gelation { depth: usize },

    #[error("Polymer {0} does not hold a valid arm tree")]
    InvalidPolymer(PolymerId),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Direction in reaction time along the chain an arm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the radical end, where the chain stopped growing.
    Forward,
    /// Toward the chain head, where the chain started.
    Backward,
}

#[derive(Debug, Clone, Copy)]
struct GrowthTask {
    arm: ArmId,
    direction: Direction,
    conv: f64,
    depth: usize,
}

pub struct GrowthEngine<K: Kinetics> {
    kinetics: K,
    max_depth: usize,
    seed: u64,
    gelled: bool,
}

impl<K: Kinetics> GrowthEngine<K> {
    pub fn new(kinetics: K, max_depth: usize, seed: u64) -> Self {
        Self {
            kinetics,
            max_depth,
            seed,
            gelled: false,
        }
    }

    pub fn kinetics(&self) -> &K {
        &self.kinetics
    }

    /// Sticky: set once any molecule has exceeded the depth ceiling.
    pub fn is_gelled(&self) -> bool {
        self.gelled
    }

    pub fn clear_gelation(&mut self) {
        self.gelled = false;
    }

    /// Random stream for one molecule, independent of the molecules grown before it.
    pub fn molecule_rng(&self, molecule: u64) -> StdRng {
        StdRng::seed_from_u64(mix_seed(self.seed, molecule))
    }

    /// Grows, cleans up and measures one molecule into `poly`.
    ///
    /// On error the arms built so far are left on the polymer's ring so the
    /// caller can return them with `return_poly` or `return_poly_arms`.
    pub fn grow_polymer(
        &mut self,
        pool: &mut PolymerPool,
        poly: PolymerId,
        molecule: u64,
    ) -> Result<(), GrowthError> {
        let mut rng = self.molecule_rng(molecule);
        self.grow_topology(pool, poly, &mut rng)?;
        cleanup::clean_up(pool, poly)?;
        mass_rg::measure(pool, poly)?;
        trace!(
            molecule,
            arms = pool.polymer(poly).num_arms,
            branches = pool.polymer(poly).num_br,
            "Molecule grown."
        );
        Ok(())
    }

    /// Builds the raw arm tree of a molecule without cleanup.
    pub fn grow_topology(
        &mut self,
        pool: &mut PolymerPool,
        poly: PolymerId,
        rng: &mut impl Rng,
    ) -> Result<(), GrowthError> {
        if !pool.arms_available() {
            return Err(GrowthError::ArmsExhausted);
        }
        let conv = self.kinetics.initial_conversion(rng);

        let first = pool.request_arm().ok_or(GrowthError::ArmsExhausted)?;
        pool.start_ring(first);
        pool.polymer_mut(poly).first_end = Some(first);
        pool.arm_mut(first).arm_conv = conv;

        // The seed monomer splits its chain into a part grown later (first)
        // and a part grown earlier (second); both start at the seed.
        let second = new_arm(pool, first, conv)?;
        pool.connect(first, ArmEnd::Left, second, ArmEnd::Left);

        let mut stack = vec![
            GrowthTask {
                arm: second,
                direction: Direction::Backward,
                conv,
                depth: 1,
            },
            GrowthTask {
                arm: first,
                direction: Direction::Forward,
                conv,
                depth: 1,
            },
        ];
        while let Some(task) = stack.pop() {
            if task.depth > self.max_depth {
                self.gelled = true;
                return Err(GrowthError::Gelation { depth: task.depth });
            }
            if !pool.arms_available() {
                return Err(GrowthError::ArmsExhausted);
            }
            self.extend(pool, task, rng, &mut stack)?;
        }
        Ok(())
    }

    fn extend(
        &mut self,
        pool: &mut PolymerPool,
        task: GrowthTask,
        rng: &mut impl Rng,
        stack: &mut Vec<GrowthTask>,
    ) -> Result<(), GrowthError> {
        let GrowthTask {
            arm,
            direction,
            conv,
            depth,
        } = task;
        let k = &self.kinetics;

        let end_len = exponential_length(k.chain_end_rate(conv), rng);
        if !end_len.is_finite() {
            // A chain that never ends is an infinite molecule.
            self.gelled = true;
            return Err(GrowthError::Gelation { depth });
        }
        let branch_len = exponential_length(k.branch_density(conv), rng);
        let scission_len = exponential_length(k.scission_density(conv), rng);

        let child = |arm, direction, conv| GrowthTask {
            arm,
            direction,
            conv,
            depth: depth + 1,
        };

        if branch_len < end_len && branch_len <= scission_len {
            set_length(pool, arm, branch_len);
            let branch_conv = k.later_conversion(conv, rng);
            let continuation = new_arm(pool, arm, conv)?;
            let branch = new_arm(pool, continuation, branch_conv)?;
            join_y(pool, arm, continuation, branch);
            stack.push(child(branch, Direction::Forward, branch_conv));
            stack.push(child(continuation, direction, conv));
        } else if scission_len < end_len {
            set_length(pool, arm, scission_len);
            pool.arm_mut(arm).scission = true;
            if rng.gen_bool(0.5) {
                let regrow_conv = k.later_conversion(conv, rng);
                let fragment = new_arm(pool, arm, regrow_conv)?;
                pool.connect(arm, ArmEnd::Right, fragment, ArmEnd::Left);
                stack.push(child(fragment, Direction::Forward, regrow_conv));
            } else {
                pool.arm_mut(arm).endfin = true;
            }
        } else {
            set_length(pool, arm, end_len);
            match direction {
                Direction::Forward => {
                    if rng.gen_bool(probability(k.combination_probability(conv))) {
                        let mirrored = new_arm(pool, arm, conv)?;
                        pool.connect(arm, ArmEnd::Right, mirrored, ArmEnd::Left);
                        stack.push(child(mirrored, Direction::Backward, conv));
                    } else {
                        pool.arm_mut(arm).endfin = true;
                    }
                }
                Direction::Backward => {
                    if rng.gen_bool(probability(k.backbone_attach_probability(conv))) {
                        let backbone_conv = k.earlier_conversion(conv, rng);
                        let later = new_arm(pool, arm, backbone_conv)?;
                        let earlier = new_arm(pool, later, backbone_conv)?;
                        join_y(pool, arm, later, earlier);
                        stack.push(child(earlier, Direction::Backward, backbone_conv));
                        stack.push(child(later, Direction::Forward, backbone_conv));
                    } else {
                        pool.arm_mut(arm).endfin = true;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Requests an arm and puts it on the ring straight away, so that an abort
/// further down still returns it with the polymer.
fn new_arm(pool: &mut PolymerPool, anchor: ArmId, conv: f64) -> Result<ArmId, GrowthError> {
    let arm = pool.request_arm().ok_or(GrowthError::ArmsExhausted)?;
    pool.insert_after(anchor, arm);
    pool.arm_mut(arm).arm_conv = conv;
    Ok(arm)
}

fn set_length(pool: &mut PolymerPool, arm: ArmId, len: f64) {
    let record = pool.arm_mut(arm);
    record.arm_len = len;
    record.ended = true;
}

/// Joins the growing end of `parent` to the origins of `a` and `b`.
fn join_y(pool: &mut PolymerPool, parent: ArmId, a: ArmId, b: ArmId) {
    pool.connect(parent, ArmEnd::Right, a, ArmEnd::Left);
    pool.connect(parent, ArmEnd::Right, b, ArmEnd::Left);
    pool.connect(a, ArmEnd::Left, b, ArmEnd::Left);
}

fn probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// SplitMix64 finalizer over the run seed and the molecule index.
fn mix_seed(seed: u64, molecule: u64) -> u64 {
    let mut z = seed ^ molecule.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
