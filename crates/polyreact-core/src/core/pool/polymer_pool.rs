use super::error::PoolError;
use super::table::RecordTable;
use crate::core::models::arm::{Arm, ArmEnd, Link};
use crate::core::models::distribution::Distribution;
use crate::core::models::ids::{ArmId, DistributionId, PolymerId};
use crate::core::models::polymer::Polymer;
use tracing::{debug, info};

pub const DEFAULT_ARM_CAPACITY: usize = 1_000_000;
pub const DEFAULT_POLYMER_CAPACITY: usize = 100_000;
pub const DEFAULT_DISTRIBUTION_CAPACITY: usize = 11;

/// Owns every arm, polymer and distribution record of a simulation.
///
/// Records are handed out by `request_*` and taken back by `return_*`; the
/// caller owns a slot between the two calls. Returning a polymer returns its
/// arms, and returning a distribution returns its polymers.
#[derive(Debug, Clone)]
pub struct PolymerPool {
    arms: RecordTable<Arm>,
    polymers: RecordTable<Polymer>,
    distributions: RecordTable<Distribution>,
}

impl Default for PolymerPool {
    fn default() -> Self {
        Self::new(
            DEFAULT_ARM_CAPACITY,
            DEFAULT_POLYMER_CAPACITY,
            DEFAULT_DISTRIBUTION_CAPACITY,
        )
    }
}

impl PolymerPool {
    pub fn new(arm_capacity: usize, polymer_capacity: usize, distribution_capacity: usize) -> Self {
        Self {
            arms: RecordTable::with_capacity(arm_capacity),
            polymers: RecordTable::with_capacity(polymer_capacity),
            distributions: RecordTable::with_capacity(distribution_capacity),
        }
    }

    // --- Record access ---

    pub fn arm(&self, id: ArmId) -> &Arm {
        self.arms.get(id)
    }

    pub fn arm_mut(&mut self, id: ArmId) -> &mut Arm {
        self.arms.get_mut(id)
    }

    pub fn polymer(&self, id: PolymerId) -> &Polymer {
        self.polymers.get(id)
    }

    pub fn polymer_mut(&mut self, id: PolymerId) -> &mut Polymer {
        self.polymers.get_mut(id)
    }

    pub fn distribution(&self, id: DistributionId) -> &Distribution {
        self.distributions.get(id)
    }

    pub fn distribution_mut(&mut self, id: DistributionId) -> &mut Distribution {
        self.distributions.get_mut(id)
    }

    pub fn is_distribution_live(&self, id: DistributionId) -> bool {
        self.distributions.is_live(id)
    }

    // --- Availability and accounting ---

    pub fn arms_available(&self) -> bool {
        self.arms.is_available()
    }

    pub fn polymers_available(&self) -> bool {
        self.polymers.is_available()
    }

    pub fn distributions_available(&self) -> bool {
        self.distributions.is_available()
    }

    pub fn arm_capacity(&self) -> usize {
        self.arms.capacity()
    }

    pub fn polymer_capacity(&self) -> usize {
        self.polymers.capacity()
    }

    pub fn distribution_capacity(&self) -> usize {
        self.distributions.capacity()
    }

    pub fn arms_in_use(&self) -> usize {
        self.arms.live_count()
    }

    pub fn polymers_in_use(&self) -> usize {
        self.polymers.live_count()
    }

    pub fn distributions_in_use(&self) -> usize {
        self.distributions.live_count()
    }

    pub fn free_arm_count(&self) -> usize {
        self.arms.free_len()
    }

    pub fn free_polymer_count(&self) -> usize {
        self.polymers.free_len()
    }

    // --- Arms ---

    pub fn request_arm(&mut self) -> Option<ArmId> {
        self.arms.request()
    }

    pub fn return_arm(&mut self, id: ArmId) -> Result<(), PoolError> {
        self.arms.release(id)
    }

    pub fn grow_arm_capacity(&mut self, new_max: usize) -> Result<(), PoolError> {
        self.arms.grow(new_max)?;
        info!("Arm pool grown to {} records.", new_max);
        Ok(())
    }

    // --- Polymers ---

    pub fn request_poly(&mut self) -> Option<PolymerId> {
        self.polymers.request()
    }

    /// Returns every arm on the polymer's ring and detaches the ring from it.
    ///
    /// The polymer record itself stays issued, keeping its statistics.
    pub fn return_poly_arms(&mut self, id: PolymerId) -> Result<(), PoolError> {
        let Some(first) = self.polymers.get_mut(id).first_end.take() else {
            return Ok(());
        };
        for arm in self.ring_ids(first) {
            self.arms.release(arm)?;
        }
        Ok(())
    }

    pub fn return_poly(&mut self, id: PolymerId) -> Result<(), PoolError> {
        self.return_poly_arms(id)?;
        self.polymers.release(id)
    }

    pub fn grow_polymer_capacity(&mut self, new_max: usize) -> Result<(), PoolError> {
        self.polymers.grow(new_max)?;
        info!("Polymer pool grown to {} records.", new_max);
        Ok(())
    }

    // --- Distributions ---

    pub fn request_dist(&mut self) -> Option<DistributionId> {
        self.distributions.request()
    }

    /// Returns the polymers (and their arms) of a distribution while keeping
    /// the distribution slot and its settings, ready for another simulation.
    pub fn return_dist_polys(&mut self, id: DistributionId) -> Result<(), PoolError> {
        let mut cursor = self.distributions.get(id).first_poly;
        while let Some(poly) = cursor {
            cursor = self.polymers.get(poly).next_poly;
            self.return_poly(poly)?;
        }
        let dist = self.distributions.get_mut(id);
        dist.clear_population();
        dist.simnumber += 1;
        debug!(
            "Distribution {} reset for simulation {}.",
            id, dist.simnumber
        );
        Ok(())
    }

    pub fn return_dist(&mut self, id: DistributionId) -> Result<(), PoolError> {
        self.return_dist_polys(id)?;
        self.distributions.release(id)
    }

    pub fn grow_distribution_capacity(&mut self, new_max: usize) -> Result<(), PoolError> {
        self.distributions.grow(new_max)
    }

    /// Returns every outstanding distribution, leaving the pool fully free
    /// except for polymers and arms never linked into a distribution.
    pub fn teardown(&mut self) -> Result<(), PoolError> {
        let live: Vec<DistributionId> = self.distributions.live_ids().collect();
        for id in live {
            self.return_dist(id)?;
        }
        Ok(())
    }

    /// Pushes `poly` onto the front of the distribution's polymer list.
    pub fn link_polymer(&mut self, dist: DistributionId, poly: PolymerId) {
        let head = self.distributions.get(dist).first_poly;
        self.polymers.get_mut(poly).next_poly = head;
        let dist = self.distributions.get_mut(dist);
        dist.first_poly = Some(poly);
        dist.npoly += 1;
    }

    pub fn polymers_of(&self, dist: DistributionId) -> PolymerIter<'_> {
        PolymerIter {
            pool: self,
            cursor: self.distributions.get(dist).first_poly,
        }
    }

    // --- Arm ring and topology ---

    /// Makes `arm` a ring of size one.
    pub fn start_ring(&mut self, arm: ArmId) {
        let record = self.arms.get_mut(arm);
        record.up = Some(arm);
        record.down = Some(arm);
    }

    /// Inserts `arm` into the ring directly below `anchor`.
    pub fn insert_after(&mut self, anchor: ArmId, arm: ArmId) {
        let below = self.arms.get(anchor).down.unwrap_or(anchor);
        self.arms.get_mut(arm).up = Some(anchor);
        self.arms.get_mut(arm).down = Some(below);
        self.arms.get_mut(anchor).down = Some(arm);
        self.arms.get_mut(below).up = Some(arm);
    }

    /// Removes `arm` from its ring and returns the arm that followed it, if any remain.
    pub fn unlink_from_ring(&mut self, arm: ArmId) -> Option<ArmId> {
        let (up, down) = {
            let record = self.arms.get(arm);
            (record.up, record.down)
        };
        let record = self.arms.get_mut(arm);
        record.up = None;
        record.down = None;
        match (up, down) {
            (Some(up), Some(down)) if up != arm => {
                self.arms.get_mut(up).down = Some(down);
                self.arms.get_mut(down).up = Some(up);
                Some(down)
            }
            _ => None,
        }
    }

    pub fn ring(&self, first: ArmId) -> RingIter<'_> {
        RingIter {
            pool: self,
            first,
            cursor: Some(first),
        }
    }

    pub fn ring_ids(&self, first: ArmId) -> Vec<ArmId> {
        self.ring(first).collect()
    }

    /// Joins end `a_end` of arm `a` to end `b_end` of arm `b`, in both directions.
    ///
    /// Returns `false` if either end already holds two links.
    pub fn connect(&mut self, a: ArmId, a_end: ArmEnd, b: ArmId, b_end: ArmEnd) -> bool {
        let forward = self.arms.get_mut(a).attach(a_end, Link::new(b, b_end));
        let backward = self.arms.get_mut(b).attach(b_end, Link::new(a, a_end));
        forward && backward
    }
}

/// Walks a polymer ring by following `down` until it returns to the start.
pub struct RingIter<'a> {
    pool: &'a PolymerPool,
    first: ArmId,
    cursor: Option<ArmId>,
}

impl Iterator for RingIter<'_> {
    type Item = ArmId;

    fn next(&mut self) -> Option<ArmId> {
        let current = self.cursor?;
        self.cursor = self
            .pool
            .arm(current)
            .down
            .filter(|&next| next != self.first);
        Some(current)
    }
}

/// Walks a distribution's polymer list, newest first.
pub struct PolymerIter<'a> {
    pool: &'a PolymerPool,
    cursor: Option<PolymerId>,
}

impl<'a> Iterator for PolymerIter<'a> {
    type Item = (PolymerId, &'a Polymer);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let polymer = self.pool.polymer(id);
        self.cursor = polymer.next_poly;
        Some((id, polymer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PolymerPool {
        PolymerPool::new(32, 8, 3)
    }

    fn build_ring(pool: &mut PolymerPool, poly: PolymerId, n: usize) -> Vec<ArmId> {
        let first = pool.request_arm().unwrap();
        pool.start_ring(first);
        pool.polymer_mut(poly).first_end = Some(first);
        let mut arms = vec![first];
        let mut last = first;
        for _ in 1..n {
            let arm = pool.request_arm().unwrap();
            pool.insert_after(last, arm);
            arms.push(arm);
            last = arm;
        }
        arms
    }

    #[test]
    fn ring_iteration_visits_each_arm_once_in_insertion_order() {
        let mut pool = pool();
        let poly = pool.request_poly().unwrap();
        let arms = build_ring(&mut pool, poly, 5);
        assert_eq!(pool.ring_ids(arms[0]), arms);

        let mut cursor = arms[0];
        for _ in 0..arms.len() {
            cursor = pool.arm(cursor).down.unwrap();
        }
        assert_eq!(cursor, arms[0]);
    }

    #[test]
    fn unlink_from_ring_closes_the_gap() {
        let mut pool = pool();
        let poly = pool.request_poly().unwrap();
        let arms = build_ring(&mut pool, poly, 3);
        assert_eq!(pool.unlink_from_ring(arms[1]), Some(arms[2]));
        assert_eq!(pool.ring_ids(arms[0]), vec![arms[0], arms[2]]);
        assert_eq!(pool.arm(arms[2]).up, Some(arms[0]));
    }

    #[test]
    fn unlink_last_arm_reports_empty_ring() {
        let mut pool = pool();
        let poly = pool.request_poly().unwrap();
        let arms = build_ring(&mut pool, poly, 1);
        assert_eq!(pool.unlink_from_ring(arms[0]), None);
    }

    #[test]
    fn return_poly_returns_all_ring_arms() {
        let mut pool = pool();
        let poly = pool.request_poly().unwrap();
        build_ring(&mut pool, poly, 7);
        assert_eq!(pool.arms_in_use(), 7);
        pool.return_poly(poly).unwrap();
        assert_eq!(pool.arms_in_use(), 0);
        assert_eq!(pool.polymers_in_use(), 0);
        assert_eq!(pool.free_arm_count(), pool.arm_capacity());
    }

    #[test]
    fn return_poly_arms_keeps_polymer_statistics() {
        let mut pool = pool();
        let poly = pool.request_poly().unwrap();
        build_ring(&mut pool, poly, 4);
        pool.polymer_mut(poly).tot_len = 250.0;
        pool.return_poly_arms(poly).unwrap();
        assert_eq!(pool.arms_in_use(), 0);
        assert_eq!(pool.polymers_in_use(), 1);
        assert_eq!(pool.polymer(poly).first_end, None);
        assert_eq!(pool.polymer(poly).tot_len, 250.0);
        pool.return_poly_arms(poly).unwrap();
    }

    #[test]
    fn linked_polymers_are_listed_newest_first() {
        let mut pool = pool();
        let dist = pool.request_dist().unwrap();
        let ids: Vec<PolymerId> = (0..3).map(|_| pool.request_poly().unwrap()).collect();
        for &id in &ids {
            pool.link_polymer(dist, id);
        }
        let listed: Vec<PolymerId> = pool.polymers_of(dist).map(|(id, _)| id).collect();
        assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);
        assert_eq!(pool.distribution(dist).npoly, 3);
    }

    #[test]
    fn return_dist_polys_frees_everything_but_the_distribution() {
        let mut pool = pool();
        let dist = pool.request_dist().unwrap();
        pool.distribution_mut(dist).monmass = 42.0;
        for _ in 0..3 {
            let poly = pool.request_poly().unwrap();
            build_ring(&mut pool, poly, 4);
            pool.link_polymer(dist, poly);
        }
        pool.return_dist_polys(dist).unwrap();

        assert_eq!(pool.arms_in_use(), 0);
        assert_eq!(pool.polymers_in_use(), 0);
        assert_eq!(pool.distributions_in_use(), 1);
        let d = pool.distribution(dist);
        assert_eq!(d.npoly, 0);
        assert_eq!(d.first_poly, None);
        assert_eq!(d.monmass, 42.0);
        assert_eq!(d.simnumber, 1);
    }

    #[test]
    fn return_dist_releases_the_slot() {
        let mut pool = pool();
        let dist = pool.request_dist().unwrap();
        let poly = pool.request_poly().unwrap();
        build_ring(&mut pool, poly, 2);
        pool.link_polymer(dist, poly);
        pool.return_dist(dist).unwrap();
        assert_eq!(pool.distributions_in_use(), 0);
        assert!(!pool.is_distribution_live(dist));
        assert_eq!(pool.arms_in_use(), 0);
    }

    #[test]
    fn distribution_pool_exhaustion_is_sticky_until_return() {
        let mut pool = pool();
        let ids: Vec<_> = (0..3).map(|_| pool.request_dist().unwrap()).collect();
        assert!(pool.request_dist().is_none());
        assert!(!pool.distributions_available());
        pool.return_dist(ids[0]).unwrap();
        assert!(pool.distributions_available());
    }

    #[test]
    fn teardown_returns_every_distribution() {
        let mut pool = pool();
        for _ in 0..2 {
            let dist = pool.request_dist().unwrap();
            let poly = pool.request_poly().unwrap();
            build_ring(&mut pool, poly, 3);
            pool.link_polymer(dist, poly);
        }
        pool.teardown().unwrap();
        assert_eq!(pool.distributions_in_use(), 0);
        assert_eq!(pool.polymers_in_use(), 0);
        assert_eq!(pool.arms_in_use(), 0);
    }

    #[test]
    fn connect_links_both_arms() {
        let mut pool = pool();
        let a = pool.request_arm().unwrap();
        let b = pool.request_arm().unwrap();
        assert!(pool.connect(a, ArmEnd::Right, b, ArmEnd::Left));
        assert_eq!(pool.arm(a).r1, Some(Link::new(b, ArmEnd::Left)));
        assert_eq!(pool.arm(b).l1, Some(Link::new(a, ArmEnd::Right)));
    }

    #[test]
    fn arm_pool_growth_preserves_live_arms() {
        let mut pool = PolymerPool::new(10, 2, 1);
        let issued: Vec<ArmId> = (0..10).map(|_| pool.request_arm().unwrap()).collect();
        assert!(pool.request_arm().is_none());
        assert!(!pool.arms_available());
        pool.grow_arm_capacity(20).unwrap();
        assert!(pool.arms_available());
        let fresh = pool.request_arm().unwrap();
        assert!((10..20).contains(&fresh.index()));
        assert_eq!(pool.arms_in_use(), 11);
        assert!(issued.iter().all(|id| id.index() < 10));
    }
}
