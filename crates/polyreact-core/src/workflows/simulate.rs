use crate::core::models::distribution::BobBins;
use crate::core::models::ids::{DistributionId, PolymerId};
use crate::core::pool::{PolymerPool, PoolError};
use crate::engine::binning;
use crate::engine::bob_select;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::{KineticsConfig, PoolConfig, SimulationConfig};
use crate::engine::error::EngineError;
use crate::engine::growth::{GrowthEngine, GrowthError};
use crate::engine::kinetics::Kinetics;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, trace, warn};

/// Why the molecule loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    Cancelled,
    /// A molecule exceeded the growth depth ceiling.
    Gelation,
    /// The arm table ran dry and could not (or may not) be enlarged.
    ArmsExhausted,
    PolymersExhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub requested: usize,
    pub made: usize,
    pub gelled: usize,
    pub saved: usize,
    pub stopped: StopReason,
    pub m_w: f64,
    pub m_n: f64,
    pub brav: f64,
    pub simnumber: u64,
}

impl SimulationReport {
    pub fn is_complete(&self) -> bool {
        self.stopped == StopReason::Completed
    }
}

/// Grows a fresh population into `dist` and bins it.
///
/// Any polymers already on the distribution are returned first. The batch
/// stops early on cancellation, gelation, or pool exhaustion; whatever was
/// completed up to that point stays on the distribution and is binned.
#[instrument(skip_all, name = "simulation_workflow")]
pub fn run(
    pool: &mut PolymerPool,
    dist: DistributionId,
    config: &SimulationConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<SimulationReport, EngineError> {
    config.validate()?;
    if !pool.is_distribution_live(dist) {
        return Err(EngineError::UnknownDistribution(dist));
    }
    match config.kinetics {
        KineticsConfig::Batch(kinetics) => run_with(pool, dist, kinetics, config, reporter, cancel),
        KineticsConfig::Cstr(kinetics) => run_with(pool, dist, kinetics, config, reporter, cancel),
    }
}

/// Requests a new distribution slot and runs a simulation into it.
pub fn run_new(
    pool: &mut PolymerPool,
    config: &SimulationConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<(DistributionId, SimulationReport), EngineError> {
    let dist = pool
        .request_dist()
        .ok_or(PoolError::DistributionsExhausted)?;
    let report = run(pool, dist, config, reporter, cancel)?;
    Ok((dist, report))
}

fn run_with<K: Kinetics>(
    pool: &mut PolymerPool,
    dist: DistributionId,
    kinetics: K,
    config: &SimulationConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<SimulationReport, EngineError> {
    // === Phase 0: Reset the distribution ===
    reporter.report(Progress::PhaseStart { name: "Setup" });
    pool.return_dist_polys(dist)?;
    prepare_distribution(pool, dist, config);
    bob_select::bobinit(pool, dist)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Grow molecules ===
    let requested = config.num_polymers;
    info!(
        "Growing {} polymers (simulation {}).",
        requested,
        pool.distribution(dist).simnumber
    );
    reporter.report(Progress::PhaseStart { name: "Growth" });
    reporter.report(Progress::TaskStart {
        total_steps: requested as u64,
    });

    let mut engine = GrowthEngine::new(kinetics, config.growth.max_depth, config.seed);
    let mut made = 0;
    let mut gelled = 0;
    let mut stopped = StopReason::Completed;

    'molecules: for molecule in 0..requested {
        if cancel.is_cancelled() {
            warn!("Simulation cancelled after {} of {} polymers.", made, requested);
            stopped = StopReason::Cancelled;
            break;
        }
        let Some(poly) = pool.request_poly() else {
            warn!("Polymer pool exhausted after {} of {} polymers.", made, requested);
            stopped = StopReason::PolymersExhausted;
            break;
        };

        loop {
            match engine.grow_polymer(pool, poly, molecule as u64) {
                Ok(()) => {
                    pool.link_polymer(dist, poly);
                    let kept = bob_select::bobcount(pool, dist, poly)?;
                    trace!(molecule, kept, "Polymer accepted.");
                    made += 1;
                    reporter.report(Progress::TaskIncrement);
                    break;
                }
                Err(GrowthError::ArmsExhausted) => {
                    pool.return_poly_arms(poly)?;
                    if let Some(capacity) = next_arm_capacity(pool, &config.pool) {
                        grow_arms_or_discard(pool, poly, capacity)?;
                        reporter.report(Progress::CapacityGrown { arms: capacity });
                        continue;
                    }
                    discard(pool, poly)?;
                    warn!(
                        "Arm pool exhausted at {} records after {} of {} polymers.",
                        pool.arm_capacity(),
                        made,
                        requested
                    );
                    stopped = StopReason::ArmsExhausted;
                    break 'molecules;
                }
                Err(GrowthError::Gelation { depth }) => {
                    discard(pool, poly)?;
                    gelled += 1;
                    warn!(
                        "Molecule {} gelled at growth depth {}; stopping after {} of {} polymers.",
                        molecule, depth, made, requested
                    );
                    reporter.report(Progress::MoleculeGelled { molecule });
                    stopped = StopReason::Gelation;
                    break 'molecules;
                }
                Err(other) => {
                    discard(pool, poly)?;
                    return Err(other.into());
                }
            }
        }
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Enrichment and binning ===
    reporter.report(Progress::PhaseStart { name: "Binning" });
    bob_select::finalize_enrichment(pool, dist);
    binning::molbin(pool, dist)?;
    reporter.report(Progress::PhaseFinish);

    let d = pool.distribution(dist);
    let report = SimulationReport {
        requested,
        made,
        gelled,
        saved: d.nsaved,
        stopped,
        m_w: d.m_w,
        m_n: d.m_n,
        brav: d.brav,
        simnumber: d.simnumber,
    };
    info!(
        "Made {} of {} requested polymers ({} saved); Mw = {:.4e}, Mn = {:.4e}.",
        report.made, report.requested, report.saved, report.m_w, report.m_n
    );
    reporter.report(Progress::Message(format!(
        "Made {} of {} requested polymers",
        report.made, report.requested
    )));
    Ok(report)
}

fn prepare_distribution(pool: &mut PolymerPool, dist: DistributionId, config: &SimulationConfig) {
    let d = pool.distribution_mut(dist);
    d.monmass = config.material.monomer_mass;
    d.m_e = config.material.entanglement_mass;
    d.nummwdbins = config.mwd.num_bins;
    d.bob = match &config.bob {
        Some(bob) => BobBins {
            numbobbins: bob.num_bins,
            bobbinmax: bob.bin_max,
            boblgmin: bob.lg_min,
            boblgmax: bob.lg_max,
            numinbin: Vec::new(),
        },
        None => BobBins::default(),
    };
}

fn discard(pool: &mut PolymerPool, poly: PolymerId) -> Result<(), PoolError> {
    pool.return_poly(poly)
}

/// Enlarges the arm table, returning `poly` to the pool if that fails.
fn grow_arms_or_discard(
    pool: &mut PolymerPool,
    poly: PolymerId,
    capacity: usize,
) -> Result<(), PoolError> {
    if let Err(err) = pool.grow_arm_capacity(capacity) {
        discard(pool, poly)?;
        return Err(err);
    }
    Ok(())
}

/// Doubles the arm table, capped by the configured maximum.
fn next_arm_capacity(pool: &PolymerPool, config: &PoolConfig) -> Option<usize> {
    let current = pool.arm_capacity();
    if !config.grow_on_exhaustion || current >= config.max_arm_capacity {
        return None;
    }
    Some(current.saturating_mul(2).max(1).min(config.max_arm_capacity))
}
