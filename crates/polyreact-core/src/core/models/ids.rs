use std::fmt;

/// Converts between a typed record index and its raw slot position.
///
/// Every record table in the pool is addressed by its own id type so that an
/// arm index can never be used to look up a polymer, or the reverse.
pub trait RecordId: Copy + Eq + fmt::Debug {
    fn index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

macro_rules! record_ids {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident;)*) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl RecordId for $name {
            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    )*};
}

record_ids! {
    /// Index of an [`Arm`](super::arm::Arm) slot in the arm table.
    pub struct ArmId;
    /// Index of a [`Polymer`](super::polymer::Polymer) slot in the polymer table.
    pub struct PolymerId;
    /// Index of a [`Distribution`](super::distribution::Distribution) slot.
    pub struct DistributionId;
}
