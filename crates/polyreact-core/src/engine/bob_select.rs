use super::binning::BinningError;
use crate::core::models::distribution::MAX_BOB_BINS;
use crate::core::models::ids::{DistributionId, PolymerId};
use crate::core::pool::{PolymerPool, PoolError};
use tracing::warn;

/// Resets BoB bin occupancy and the saved count before a new simulation.
///
/// Bin settings are read from the distribution; an over-large bin count is
/// clamped to [`MAX_BOB_BINS`].
pub fn bobinit(pool: &mut PolymerPool, dist: DistributionId) -> Result<(), BinningError> {
    if !pool.is_distribution_live(dist) {
        return Err(BinningError::UnknownDistribution(dist));
    }
    let d = pool.distribution_mut(dist);
    if d.bob.numbobbins > MAX_BOB_BINS {
        warn!(
            "Requested {} BoB bins; clamping to {}.",
            d.bob.numbobbins, MAX_BOB_BINS
        );
        d.bob.numbobbins = MAX_BOB_BINS;
    }
    d.bob.numinbin = vec![0; d.bob.numbobbins];
    d.nsaved = 0;
    Ok(())
}

/// Classifies a finished polymer and decides whether it is kept for export.
///
/// A polymer is kept while its bin holds no more than `bobbinmax` polymers;
/// polymers landing in a full bin or outside the bin range have their arms
/// returned to the pool immediately. The polymer record itself stays on the
/// distribution so binning still sees it. When BoB selection is not
/// configured every polymer is kept. Returns whether the polymer was kept.
pub fn bobcount(
    pool: &mut PolymerPool,
    dist: DistributionId,
    poly: PolymerId,
) -> Result<bool, PoolError> {
    let mass = pool.polymer(poly).mass(pool.distribution(dist).monmass);
    let d = pool.distribution_mut(dist);

    let keep = if d.bob.is_enabled() {
        match d.bob.bin_for(mass.log10()) {
            Some(bin) => match d.bob.numinbin.get_mut(bin) {
                Some(count) => {
                    *count += 1;
                    let keep = *count <= d.bob.bobbinmax;
                    pool.polymer_mut(poly).bin = Some(bin);
                    keep
                }
                None => false,
            },
            None => false,
        }
    } else {
        true
    };

    if keep {
        pool.distribution_mut(dist).nsaved += 1;
        pool.polymer_mut(poly).saved = true;
    } else {
        pool.polymer_mut(poly).saved = false;
        pool.return_poly_arms(poly)?;
    }
    Ok(keep)
}

/// Sets each kept polymer's enrichment to the occupancy-to-cap ratio of its bin.
pub fn finalize_enrichment(pool: &mut PolymerPool, dist: DistributionId) {
    let d = pool.distribution(dist);
    let cap = d.bob.bobbinmax.max(1) as f64;
    let enrichments: Vec<(PolymerId, f64)> = pool
        .polymers_of(dist)
        .filter(|(_, p)| p.saved)
        .map(|(id, p)| {
            let occupancy = p
                .bin
                .and_then(|b| d.bob.numinbin.get(b))
                .map_or(0, |&n| n);
            (id, (occupancy as f64 / cap).max(1.0))
        })
        .collect();
    for (id, enrich) in enrichments {
        pool.polymer_mut(id).enrich = enrich;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::distribution::BobBins;

    fn setup() -> (PolymerPool, DistributionId) {
        let mut pool = PolymerPool::new(256, 64, 2);
        let dist = pool.request_dist().unwrap();
        let d = pool.distribution_mut(dist);
        d.monmass = 10.0;
        d.bob = BobBins {
            numbobbins: 2,
            bobbinmax: 3,
            boblgmin: 2.0,
            boblgmax: 4.0,
            numinbin: Vec::new(),
        };
        bobinit(&mut pool, dist).unwrap();
        (pool, dist)
    }

    /// A two-arm polymer of total length `len`, linked to `dist`.
    fn grown(pool: &mut PolymerPool, dist: DistributionId, len: f64) -> PolymerId {
        let poly = pool.request_poly().unwrap();
        let a = pool.request_arm().unwrap();
        let b = pool.request_arm().unwrap();
        pool.start_ring(a);
        pool.insert_after(a, b);
        pool.arm_mut(a).arm_len = len / 2.0;
        pool.arm_mut(b).arm_len = len / 2.0;
        let p = pool.polymer_mut(poly);
        p.first_end = Some(a);
        p.tot_len = len;
        pool.link_polymer(dist, poly);
        poly
    }

    #[test]
    fn bins_are_capped_and_discards_return_their_arms() {
        let (mut pool, dist) = setup();
        let mut kept = 0;
        for _ in 0..5 {
            let poly = grown(&mut pool, dist, 50.0);
            if bobcount(&mut pool, dist, poly).unwrap() {
                kept += 1;
            } else {
                assert_eq!(pool.polymer(poly).first_end, None);
            }
        }
        assert_eq!(kept, 3);
        let d = pool.distribution(dist);
        assert_eq!(d.bob.numinbin, vec![5, 0]);
        assert_eq!(d.nsaved, 3);
        assert_eq!(d.npoly, 5);
        assert_eq!(pool.arms_in_use(), 6);
    }

    #[test]
    fn out_of_range_polymers_are_discarded() {
        let (mut pool, dist) = setup();
        let tiny = grown(&mut pool, dist, 2.0);
        let huge = grown(&mut pool, dist, 5000.0);
        assert!(!bobcount(&mut pool, dist, tiny).unwrap());
        assert!(!bobcount(&mut pool, dist, huge).unwrap());
        assert_eq!(pool.polymer(tiny).bin, None);
        assert_eq!(pool.arms_in_use(), 0);
        assert_eq!(pool.distribution(dist).bob.numinbin, vec![0, 0]);
    }

    #[test]
    fn enrichment_reflects_bin_overflow() {
        let (mut pool, dist) = setup();
        let mut polys = Vec::new();
        for _ in 0..6 {
            let poly = grown(&mut pool, dist, 50.0);
            bobcount(&mut pool, dist, poly).unwrap();
            polys.push(poly);
        }
        let sparse = grown(&mut pool, dist, 500.0);
        bobcount(&mut pool, dist, sparse).unwrap();
        finalize_enrichment(&mut pool, dist);

        assert_eq!(pool.polymer(polys[0]).enrich, 2.0);
        assert_eq!(pool.polymer(sparse).enrich, 1.0);
        assert!(!pool.polymer(polys[5]).saved);
    }

    #[test]
    fn disabled_selection_keeps_everything() {
        let mut pool = PolymerPool::new(64, 8, 1);
        let dist = pool.request_dist().unwrap();
        bobinit(&mut pool, dist).unwrap();
        for _ in 0..4 {
            let poly = grown(&mut pool, dist, 40.0);
            assert!(bobcount(&mut pool, dist, poly).unwrap());
        }
        finalize_enrichment(&mut pool, dist);
        assert_eq!(pool.distribution(dist).nsaved, 4);
        assert!(pool.polymers_of(dist).all(|(_, p)| p.enrich == 1.0));
    }

    #[test]
    fn bobinit_clamps_and_resets() {
        let (mut pool, dist) = setup();
        let poly = grown(&mut pool, dist, 50.0);
        bobcount(&mut pool, dist, poly).unwrap();
        pool.distribution_mut(dist).bob.numbobbins = MAX_BOB_BINS + 1;
        bobinit(&mut pool, dist).unwrap();
        let d = pool.distribution(dist);
        assert_eq!(d.bob.numbobbins, MAX_BOB_BINS);
        assert_eq!(d.bob.numinbin.len(), MAX_BOB_BINS);
        assert!(d.bob.numinbin.iter().all(|&n| n == 0));
        assert_eq!(d.nsaved, 0);
    }
}
