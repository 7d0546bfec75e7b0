use super::ids::ArmId;

/// One of the two ends of an arm.
///
/// Arms are oriented: the `Left` end is the point the arm was grown from and
/// the `Right` end is its growing tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmEnd {
    Left,
    Right,
}

impl ArmEnd {
    pub fn opposite(self) -> Self {
        match self {
            ArmEnd::Left => ArmEnd::Right,
            ArmEnd::Right => ArmEnd::Left,
        }
    }
}

/// A topological connection to a specific end of a neighbouring arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub arm: ArmId,
    pub end: ArmEnd,
}

impl Link {
    pub fn new(arm: ArmId, end: ArmEnd) -> Self {
        Self { arm, end }
    }
}

/// A linear backbone segment between two topological events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arm {
    /// Length in monomer units.
    pub arm_len: f64,
    /// Conversion (or residence age for continuous reactors) at which the
    /// segment's monomers were added.
    pub arm_conv: f64,
    pub l1: Option<Link>,
    pub l2: Option<Link>,
    pub r1: Option<Link>,
    pub r2: Option<Link>,
    /// Ring of all arms in the owning polymer.
    pub up: Option<ArmId>,
    pub down: Option<ArmId>,
    /// Export numbering, assigned when the polymer is cleaned up.
    pub armnum: usize,
    /// The growth event at the right end has been resolved.
    pub ended: bool,
    /// The right end is a free chain end.
    pub endfin: bool,
    /// The right end was produced by chain scission.
    pub scission: bool,
    pub(crate) next_free: Option<ArmId>,
}

impl Arm {
    pub fn slots(&self, end: ArmEnd) -> [Option<Link>; 2] {
        match end {
            ArmEnd::Left => [self.l1, self.l2],
            ArmEnd::Right => [self.r1, self.r2],
        }
    }

    fn slots_mut(&mut self, end: ArmEnd) -> (&mut Option<Link>, &mut Option<Link>) {
        match end {
            ArmEnd::Left => (&mut self.l1, &mut self.l2),
            ArmEnd::Right => (&mut self.r1, &mut self.r2),
        }
    }

    pub fn neighbours(&self, end: ArmEnd) -> impl Iterator<Item = Link> + use<> {
        self.slots(end).into_iter().flatten()
    }

    pub fn degree(&self, end: ArmEnd) -> usize {
        self.slots(end).iter().filter(|s| s.is_some()).count()
    }

    pub fn is_leaf(&self) -> bool {
        self.degree(ArmEnd::Left) == 0 || self.degree(ArmEnd::Right) == 0
    }

    /// Stores `link` in the first free slot at `end`.
    ///
    /// Returns `false` when both slots are already occupied.
    pub fn attach(&mut self, end: ArmEnd, link: Link) -> bool {
        let (first, second) = self.slots_mut(end);
        if first.is_none() {
            *first = Some(link);
            true
        } else if second.is_none() {
            *second = Some(link);
            true
        } else {
            false
        }
    }

    /// Removes `link` from `end`, keeping any remaining link in the first slot.
    pub fn detach(&mut self, end: ArmEnd, link: Link) -> bool {
        let (first, second) = self.slots_mut(end);
        if *first == Some(link) {
            *first = second.take();
            true
        } else if *second == Some(link) {
            *second = None;
            true
        } else {
            false
        }
    }

    pub fn replace(&mut self, end: ArmEnd, old: Link, new: Link) -> bool {
        let (first, second) = self.slots_mut(end);
        if *first == Some(old) {
            *first = Some(new);
            true
        } else if *second == Some(old) {
            *second = Some(new);
            true
        } else {
            false
        }
    }

    pub fn clear_end(&mut self, end: ArmEnd) {
        let (first, second) = self.slots_mut(end);
        *first = None;
        *second = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::RecordId;

    fn link(i: usize, end: ArmEnd) -> Link {
        Link::new(ArmId::from_index(i), end)
    }

    #[test]
    fn attach_fills_slots_in_order_and_rejects_third_link() {
        let mut arm = Arm::default();
        assert!(arm.attach(ArmEnd::Right, link(1, ArmEnd::Left)));
        assert!(arm.attach(ArmEnd::Right, link(2, ArmEnd::Left)));
        assert!(!arm.attach(ArmEnd::Right, link(3, ArmEnd::Left)));
        assert_eq!(arm.r1, Some(link(1, ArmEnd::Left)));
        assert_eq!(arm.r2, Some(link(2, ArmEnd::Left)));
        assert_eq!(arm.degree(ArmEnd::Right), 2);
        assert_eq!(arm.degree(ArmEnd::Left), 0);
    }

    #[test]
    fn detach_compacts_remaining_link_into_first_slot() {
        let mut arm = Arm::default();
        arm.attach(ArmEnd::Left, link(1, ArmEnd::Right));
        arm.attach(ArmEnd::Left, link(2, ArmEnd::Left));
        assert!(arm.detach(ArmEnd::Left, link(1, ArmEnd::Right)));
        assert_eq!(arm.l1, Some(link(2, ArmEnd::Left)));
        assert_eq!(arm.l2, None);
        assert!(!arm.detach(ArmEnd::Left, link(9, ArmEnd::Left)));
    }

    #[test]
    fn replace_swaps_only_the_matching_link() {
        let mut arm = Arm::default();
        arm.attach(ArmEnd::Right, link(1, ArmEnd::Left));
        arm.attach(ArmEnd::Right, link(2, ArmEnd::Left));
        assert!(arm.replace(ArmEnd::Right, link(2, ArmEnd::Left), link(5, ArmEnd::Right)));
        assert_eq!(
            arm.neighbours(ArmEnd::Right).collect::<Vec<_>>(),
            vec![link(1, ArmEnd::Left), link(5, ArmEnd::Right)]
        );
    }

    #[test]
    fn fresh_arm_is_a_leaf_at_both_ends() {
        let arm = Arm::default();
        assert!(arm.is_leaf());
        assert_eq!(ArmEnd::Left.opposite(), ArmEnd::Right);
    }
}
