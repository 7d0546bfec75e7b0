use super::growth::GrowthError;
use crate::core::models::arm::ArmEnd;
use crate::core::models::ids::{ArmId, PolymerId};
use crate::core::pool::PolymerPool;

struct Node {
    arm: ArmId,
    len: f64,
    /// End of this arm that touches its parent; `None` for the root.
    entry: Option<ArmEnd>,
    /// Index of the parent node and the parent end this arm hangs from.
    parent: Option<(usize, ArmEnd)>,
}

/// Computes `tot_len`, `num_br` and `gfactor` of a cleaned-up polymer.
///
/// The g-factor is the ratio of the Gaussian radius of gyration of the arm
/// tree to that of a linear chain of equal total length. For a tree the sum
/// of all pairwise path lengths is `Σ_arms (Ma·Mb·ℓ + (Ma+Mb)·ℓ²/2 + ℓ³/6)`,
/// where `Ma` and `Mb` are the masses hanging off either end of an arm of
/// length `ℓ`; a linear chain of length `N` gives `N³/6`.
pub fn measure(pool: &mut PolymerPool, poly: PolymerId) -> Result<(), GrowthError> {
    let first = pool
        .polymer(poly)
        .first_end
        .ok_or(GrowthError::InvalidPolymer(poly))?;
    let arms = pool.ring_ids(first);

    let tot_len: f64 = arms.iter().map(|&a| pool.arm(a).arm_len).sum();
    let junction_ends = arms
        .iter()
        .flat_map(|&a| [ArmEnd::Left, ArmEnd::Right].map(|e| pool.arm(a).degree(e)))
        .filter(|&d| d == 2)
        .count();
    let num_br = junction_ends / 3;

    let gfactor = if num_br == 0 || tot_len <= 0.0 {
        1.0
    } else {
        let pair_sum = pair_distance_sum(pool, first, arms.len(), tot_len)
            .ok_or(GrowthError::InvalidPolymer(poly))?;
        pair_sum / (tot_len.powi(3) / 6.0)
    };

    let polymer = pool.polymer_mut(poly);
    polymer.tot_len = tot_len;
    polymer.num_br = num_br;
    polymer.gfactor = gfactor;
    Ok(())
}

/// Sum of path lengths over all pairs of monomers, or `None` if the arms
/// reachable from `root` do not form a tree of `expected` arms.
fn pair_distance_sum(pool: &PolymerPool, root: ArmId, expected: usize, total: f64) -> Option<f64> {
    let mut nodes = vec![Node {
        arm: root,
        len: pool.arm(root).arm_len,
        entry: None,
        parent: None,
    }];
    let mut cursor = 0;
    while cursor < nodes.len() {
        let arm = nodes[cursor].arm;
        let child_ends = match nodes[cursor].entry {
            None => vec![ArmEnd::Left, ArmEnd::Right],
            Some(entry) => vec![entry.opposite()],
        };
        for end in child_ends {
            for link in pool.arm(arm).neighbours(end) {
                nodes.push(Node {
                    arm: link.arm,
                    len: pool.arm(link.arm).arm_len,
                    entry: Some(link.end),
                    parent: Some((cursor, end)),
                });
                if nodes.len() > expected {
                    return None;
                }
            }
        }
        cursor += 1;
    }
    if nodes.len() != expected {
        return None;
    }

    let mut beyond: Vec<f64> = nodes.iter().map(|n| n.len).collect();
    for i in (1..nodes.len()).rev() {
        if let Some((parent, _)) = nodes[i].parent {
            beyond[parent] += beyond[i];
        }
    }

    let (mut root_left, mut root_right) = (0.0, 0.0);
    for (i, node) in nodes.iter().enumerate() {
        match node.parent {
            Some((0, ArmEnd::Left)) => root_left += beyond[i],
            Some((0, ArmEnd::Right)) => root_right += beyond[i],
            _ => {}
        }
    }

    let sum = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let l = node.len;
            let (ma, mb) = match node.parent {
                None => (root_left, root_right),
                Some(_) => (total - beyond[i], beyond[i] - l),
            };
            ma * mb * l + (ma + mb) * l * l / 2.0 + l.powi(3) / 6.0
        })
        .sum();
    Some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_of(pool: &mut PolymerPool, poly: PolymerId, lengths: &[f64]) -> Vec<ArmId> {
        let mut arms: Vec<ArmId> = Vec::new();
        for &len in lengths {
            let id = pool.request_arm().unwrap();
            match arms.last() {
                Some(&last) => pool.insert_after(last, id),
                None => {
                    pool.start_ring(id);
                    pool.polymer_mut(poly).first_end = Some(id);
                }
            }
            pool.arm_mut(id).arm_len = len;
            arms.push(id);
        }
        arms
    }

    fn junction(pool: &mut PolymerPool, ends: [(ArmId, ArmEnd); 3]) {
        let [a, b, c] = ends;
        pool.connect(a.0, a.1, b.0, b.1);
        pool.connect(a.0, a.1, c.0, c.1);
        pool.connect(b.0, b.1, c.0, c.1);
    }

    fn setup() -> (PolymerPool, PolymerId) {
        let mut pool = PolymerPool::new(16, 2, 1);
        let poly = pool.request_poly().unwrap();
        (pool, poly)
    }

    #[test]
    fn linear_chain_has_unit_gfactor() {
        let (mut pool, poly) = setup();
        let arms = ring_of(&mut pool, poly, &[3.0, 4.5]);
        pool.connect(arms[0], ArmEnd::Left, arms[1], ArmEnd::Left);
        measure(&mut pool, poly).unwrap();
        let p = pool.polymer(poly);
        assert_eq!(p.num_br, 0);
        assert_eq!(p.gfactor, 1.0);
        assert_eq!(p.tot_len, 7.5);
    }

    #[test]
    fn symmetric_three_arm_star_has_gfactor_seven_ninths() {
        let (mut pool, poly) = setup();
        let arms = ring_of(&mut pool, poly, &[1.0, 1.0, 1.0]);
        junction(
            &mut pool,
            [
                (arms[0], ArmEnd::Right),
                (arms[1], ArmEnd::Left),
                (arms[2], ArmEnd::Left),
            ],
        );
        measure(&mut pool, poly).unwrap();
        let p = pool.polymer(poly);
        assert_eq!(p.num_br, 1);
        assert!((p.gfactor - 7.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn asymmetric_star_matches_closed_form() {
        let (mut pool, poly) = setup();
        let arms = ring_of(&mut pool, poly, &[1.0, 2.0, 3.0]);
        junction(
            &mut pool,
            [
                (arms[0], ArmEnd::Left),
                (arms[1], ArmEnd::Left),
                (arms[2], ArmEnd::Right),
            ],
        );
        measure(&mut pool, poly).unwrap();
        assert!((pool.polymer(poly).gfactor - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn h_shaped_molecule_counts_two_branch_points() {
        let (mut pool, poly) = setup();
        let arms = ring_of(&mut pool, poly, &[1.0; 5]);
        let (a, b, c, d, e) = (arms[0], arms[1], arms[2], arms[3], arms[4]);
        junction(
            &mut pool,
            [(c, ArmEnd::Left), (a, ArmEnd::Left), (b, ArmEnd::Left)],
        );
        junction(
            &mut pool,
            [(c, ArmEnd::Right), (d, ArmEnd::Left), (e, ArmEnd::Left)],
        );
        measure(&mut pool, poly).unwrap();
        let p = pool.polymer(poly);
        assert_eq!(p.num_br, 2);
        assert_eq!(p.tot_len, 5.0);
        assert!((p.gfactor - 89.0 / 125.0).abs() < 1e-12);
    }

    #[test]
    fn disconnected_ring_is_rejected() {
        let (mut pool, poly) = setup();
        let arms = ring_of(&mut pool, poly, &[1.0, 1.0, 1.0, 1.0]);
        junction(
            &mut pool,
            [
                (arms[0], ArmEnd::Right),
                (arms[1], ArmEnd::Left),
                (arms[2], ArmEnd::Left),
            ],
        );
        assert_eq!(
            measure(&mut pool, poly),
            Err(GrowthError::InvalidPolymer(poly))
        );
    }
}
