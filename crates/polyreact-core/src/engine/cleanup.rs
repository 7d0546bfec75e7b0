use super::growth::GrowthError;
use crate::core::models::arm::{ArmEnd, Link};
use crate::core::models::ids::{ArmId, PolymerId};
use crate::core::pool::PolymerPool;
use std::collections::HashSet;

/// Normalizes a freshly grown arm tree for export and measurement.
///
/// Zero-length dangling arms are dropped, every joint where exactly two arm
/// ends meet is merged into a single arm, and the surviving arms are numbered
/// along the ring. A linear molecule is merged down to two arms only.
pub fn clean_up(pool: &mut PolymerPool, poly: PolymerId) -> Result<(), GrowthError> {
    let first = pool
        .polymer(poly)
        .first_end
        .ok_or(GrowthError::InvalidPolymer(poly))?;
    let mut count = pool.ring(first).count();

    for arm in pool.ring_ids(first) {
        if count <= 2 {
            break;
        }
        let record = pool.arm(arm);
        if record.arm_len == 0.0 && record.is_leaf() {
            remove_arm(pool, poly, arm)?;
            count -= 1;
        }
    }

    let first = pool
        .polymer(poly)
        .first_end
        .ok_or(GrowthError::InvalidPolymer(poly))?;
    let branched = pool.ring(first).any(|id| {
        let arm = pool.arm(id);
        arm.degree(ArmEnd::Left) == 2 || arm.degree(ArmEnd::Right) == 2
    });

    let mut merged: HashSet<ArmId> = HashSet::new();
    for arm in pool.ring_ids(first) {
        if merged.contains(&arm) {
            continue;
        }
        while branched || count > 2 {
            let Some((end, other)) = find_joint(pool, arm) else {
                break;
            };
            absorb(pool, poly, arm, end, other)?;
            merged.insert(other.arm);
            count -= 1;
        }
    }

    renumber(pool, poly)
}

/// Detaches a leaf arm from its neighbours, unlinks it from the ring and
/// returns it to the pool.
fn remove_arm(pool: &mut PolymerPool, poly: PolymerId, arm: ArmId) -> Result<(), GrowthError> {
    for end in [ArmEnd::Left, ArmEnd::Right] {
        for link in pool.arm(arm).neighbours(end) {
            pool.arm_mut(link.arm).detach(link.end, Link::new(arm, end));
        }
        pool.arm_mut(arm).clear_end(end);
    }
    unlink(pool, poly, arm);
    pool.return_arm(arm)?;
    Ok(())
}

fn unlink(pool: &mut PolymerPool, poly: PolymerId, arm: ArmId) {
    let next = pool.unlink_from_ring(arm);
    let polymer = pool.polymer_mut(poly);
    if polymer.first_end == Some(arm) {
        polymer.first_end = next;
    }
}

/// An end of `arm` that touches exactly one other arm end, itself touching nothing else.
fn find_joint(pool: &PolymerPool, arm: ArmId) -> Option<(ArmEnd, Link)> {
    let record = pool.arm(arm);
    [ArmEnd::Right, ArmEnd::Left].into_iter().find_map(|end| {
        if record.degree(end) != 1 {
            return None;
        }
        let other = record.neighbours(end).next()?;
        (other.arm != arm && pool.arm(other.arm).degree(other.end) == 1).then_some((end, other))
    })
}

/// Extends `arm` through its `end` by the arm joined there, then returns the
/// absorbed arm to the pool.
fn absorb(
    pool: &mut PolymerPool,
    poly: PolymerId,
    arm: ArmId,
    end: ArmEnd,
    joint: Link,
) -> Result<(), GrowthError> {
    let other = joint.arm;
    let far = joint.end.opposite();
    let absorbed = pool.arm(other).clone();
    let far_links: Vec<Link> = absorbed.neighbours(far).collect();

    let record = pool.arm_mut(arm);
    record.arm_len += absorbed.arm_len;
    record.clear_end(end);
    for &link in &far_links {
        record.attach(end, link);
    }
    if end == ArmEnd::Right {
        record.ended = absorbed.ended;
        record.endfin = absorbed.endfin;
        record.scission = absorbed.scission;
    }
    for link in far_links {
        pool.arm_mut(link.arm)
            .replace(link.end, Link::new(other, far), Link::new(arm, end));
    }

    let cleared = pool.arm_mut(other);
    cleared.clear_end(ArmEnd::Left);
    cleared.clear_end(ArmEnd::Right);
    unlink(pool, poly, other);
    if pool.polymer(poly).first_end.is_none() {
        pool.polymer_mut(poly).first_end = Some(arm);
    }
    pool.return_arm(other)?;
    Ok(())
}

/// Numbers the arms 0..k in ring order and records the arm count.
fn renumber(pool: &mut PolymerPool, poly: PolymerId) -> Result<(), GrowthError> {
    let first = pool
        .polymer(poly)
        .first_end
        .ok_or(GrowthError::InvalidPolymer(poly))?;
    let arms = pool.ring_ids(first);
    for (i, &arm) in arms.iter().enumerate() {
        pool.arm_mut(arm).armnum = i;
    }
    pool.polymer_mut(poly).num_arms = arms.len();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Builder {
        pool: PolymerPool,
        poly: PolymerId,
        last: Option<ArmId>,
    }

    impl Builder {
        fn new() -> Self {
            let mut pool = PolymerPool::new(64, 4, 1);
            let poly = pool.request_poly().unwrap();
            Self {
                pool,
                poly,
                last: None,
            }
        }

        fn arm(&mut self, len: f64) -> ArmId {
            let id = self.pool.request_arm().unwrap();
            match self.last {
                Some(last) => self.pool.insert_after(last, id),
                None => {
                    self.pool.start_ring(id);
                    self.pool.polymer_mut(self.poly).first_end = Some(id);
                }
            }
            self.pool.arm_mut(id).arm_len = len;
            self.last = Some(id);
            id
        }

        fn join(&mut self, a: ArmId, a_end: ArmEnd, b: ArmId, b_end: ArmEnd) {
            assert!(self.pool.connect(a, a_end, b, b_end));
        }

        fn lengths(&self) -> Vec<f64> {
            let first = self.pool.polymer(self.poly).first_end.unwrap();
            self.pool
                .ring(first)
                .map(|a| self.pool.arm(a).arm_len)
                .collect()
        }
    }

    #[test]
    fn linear_chain_with_combination_joint_keeps_two_arms() {
        let mut b = Builder::new();
        let first = b.arm(10.0);
        let second = b.arm(5.0);
        let mirrored = b.arm(7.0);
        b.join(first, ArmEnd::Left, second, ArmEnd::Left);
        b.join(first, ArmEnd::Right, mirrored, ArmEnd::Left);

        clean_up(&mut b.pool, b.poly).unwrap();
        let p = b.pool.polymer(b.poly);
        assert_eq!(p.num_arms, 2);
        let total: f64 = b.lengths().iter().sum();
        assert_eq!(total, 22.0);
        assert_eq!(b.pool.arms_in_use(), 2);
    }

    #[test]
    fn two_arm_chain_is_left_untouched() {
        let mut b = Builder::new();
        let first = b.arm(3.0);
        let second = b.arm(4.0);
        b.join(first, ArmEnd::Left, second, ArmEnd::Left);
        clean_up(&mut b.pool, b.poly).unwrap();
        assert_eq!(b.lengths(), vec![3.0, 4.0]);
        assert_eq!(b.pool.arm(first).armnum, 0);
        assert_eq!(b.pool.arm(second).armnum, 1);
    }

    #[test]
    fn branched_molecule_merges_every_two_arm_joint() {
        // seed: first.L - second.L, then a Y at first.R and a scission
        // regrowth at the continuation's right end.
        let mut b = Builder::new();
        let first = b.arm(10.0);
        let second = b.arm(6.0);
        let cont = b.arm(4.0);
        let branch = b.arm(8.0);
        let regrown = b.arm(2.0);
        b.join(first, ArmEnd::Left, second, ArmEnd::Left);
        b.join(first, ArmEnd::Right, cont, ArmEnd::Left);
        b.join(first, ArmEnd::Right, branch, ArmEnd::Left);
        b.join(cont, ArmEnd::Left, branch, ArmEnd::Left);
        b.join(cont, ArmEnd::Right, regrown, ArmEnd::Left);
        b.pool.arm_mut(regrown).endfin = true;

        clean_up(&mut b.pool, b.poly).unwrap();
        assert_eq!(b.pool.polymer(b.poly).num_arms, 3);
        let mut lengths = b.lengths();
        lengths.sort_by(f64::total_cmp);
        assert_eq!(lengths, vec![6.0, 8.0, 16.0]);

        // The merged continuation now ends where the regrown arm ended.
        assert!(b.pool.arm(cont).endfin);
        assert_eq!(b.pool.arm(cont).arm_len, 6.0);
        assert_eq!(b.pool.arm(cont).degree(ArmEnd::Right), 0);
        assert_eq!(b.pool.arms_in_use(), 3);

        // Neighbour links of the Y point at the surviving arm.
        let first_survivor = b.pool.polymer(b.poly).first_end.unwrap();
        let y_links: Vec<Link> = b.pool.arm(branch).neighbours(ArmEnd::Left).collect();
        assert!(y_links.contains(&Link::new(cont, ArmEnd::Left)));
        assert!(b.pool.ring_ids(first_survivor).contains(&branch));
    }

    #[test]
    fn zero_length_dangling_arm_is_dropped() {
        let mut b = Builder::new();
        let first = b.arm(10.0);
        let second = b.arm(6.0);
        let cont = b.arm(4.0);
        let stub = b.arm(0.0);
        b.join(first, ArmEnd::Left, second, ArmEnd::Left);
        b.join(first, ArmEnd::Right, cont, ArmEnd::Left);
        b.join(first, ArmEnd::Right, stub, ArmEnd::Left);
        b.join(cont, ArmEnd::Left, stub, ArmEnd::Left);

        clean_up(&mut b.pool, b.poly).unwrap();
        assert_eq!(b.pool.polymer(b.poly).num_arms, 2);
        let total: f64 = b.lengths().iter().sum();
        assert_eq!(total, 20.0);
        assert_eq!(b.pool.arms_in_use(), 2);
    }

    #[test]
    fn merged_far_links_are_retargeted_to_the_survivor() {
        let mut b = Builder::new();
        let first = b.arm(1.0);
        let second = b.arm(2.0);
        let third = b.arm(3.0);
        b.join(first, ArmEnd::Left, second, ArmEnd::Left);
        b.join(second, ArmEnd::Right, third, ArmEnd::Left);

        clean_up(&mut b.pool, b.poly).unwrap();
        let entry = b.pool.polymer(b.poly).first_end.unwrap();
        assert_eq!(entry, first);
        assert_eq!(b.pool.arm(first).arm_len, 3.0);
        assert_eq!(b.pool.arm(first).l1, Some(Link::new(third, ArmEnd::Left)));
        assert_eq!(b.pool.arm(third).l1, Some(Link::new(first, ArmEnd::Left)));
        assert_eq!(b.pool.ring(entry).count(), 2);
    }

    #[test]
    fn removing_the_ring_entry_moves_it_to_the_next_arm() {
        let mut b = Builder::new();
        let stub = b.arm(0.0);
        let left = b.arm(5.0);
        let right = b.arm(6.0);
        b.join(left, ArmEnd::Left, right, ArmEnd::Left);
        b.join(left, ArmEnd::Right, stub, ArmEnd::Left);

        clean_up(&mut b.pool, b.poly).unwrap();
        assert_eq!(b.pool.polymer(b.poly).first_end, Some(left));
        assert_eq!(b.lengths(), vec![5.0, 6.0]);
        assert_eq!(b.pool.arm(left).degree(ArmEnd::Right), 0);
    }

    #[test]
    fn polymer_without_arms_is_rejected() {
        let mut pool = PolymerPool::new(4, 2, 1);
        let poly = pool.request_poly().unwrap();
        assert_eq!(
            clean_up(&mut pool, poly),
            Err(GrowthError::InvalidPolymer(poly))
        );
    }
}
