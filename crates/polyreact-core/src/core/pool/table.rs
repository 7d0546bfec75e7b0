use super::error::PoolError;
use crate::core::models::arm::Arm;
use crate::core::models::distribution::Distribution;
use crate::core::models::ids::{ArmId, DistributionId, PolymerId, RecordId};
use crate::core::models::polymer::Polymer;

/// A record that can live in a [`RecordTable`].
///
/// Free slots are chained through a next-pointer stored inside the record
/// itself, so the free list needs no storage of its own.
pub trait PoolRecord: Default {
    type Id: RecordId;

    fn next_free(&self) -> Option<Self::Id>;
    fn set_next_free(&mut self, next: Option<Self::Id>);
}

impl PoolRecord for Arm {
    type Id = ArmId;

    fn next_free(&self) -> Option<ArmId> {
        self.next_free
    }
    fn set_next_free(&mut self, next: Option<ArmId>) {
        self.next_free = next;
    }
}

impl PoolRecord for Polymer {
    type Id = PolymerId;

    fn next_free(&self) -> Option<PolymerId> {
        self.next_poly
    }
    fn set_next_free(&mut self, next: Option<PolymerId>) {
        self.next_poly = next;
    }
}

impl PoolRecord for Distribution {
    type Id = DistributionId;

    fn next_free(&self) -> Option<DistributionId> {
        self.next
    }
    fn set_next_free(&mut self, next: Option<DistributionId>) {
        self.next = next;
    }
}

/// Fixed-capacity array of records with an intrusive free list.
///
/// Slots are never moved once created, so an issued id stays valid across
/// [`grow`](RecordTable::grow).
#[derive(Debug, Clone)]
pub struct RecordTable<R: PoolRecord> {
    records: Vec<R>,
    live: Vec<bool>,
    first_free: Option<R::Id>,
    live_count: usize,
    available: bool,
}

impl<R: PoolRecord> RecordTable<R> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut table = Self {
            records: Vec::new(),
            live: Vec::new(),
            first_free: None,
            live_count: 0,
            available: true,
        };
        table.extend_free_slots(capacity);
        table.first_free = (capacity > 0).then(|| R::Id::from_index(0));
        table
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Sticky flag: cleared when a request fails, set again when a slot is returned.
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_live(&self, id: R::Id) -> bool {
        self.live.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of slots on the free list, found by walking it.
    pub fn free_len(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.first_free;
        while let Some(id) = cursor {
            count += 1;
            cursor = self.records[id.index()].next_free();
        }
        count
    }

    pub fn live_ids(&self) -> impl Iterator<Item = R::Id> + '_ {
        self.live
            .iter()
            .enumerate()
            .filter(|(_, live)| **live)
            .map(|(i, _)| R::Id::from_index(i))
    }

    pub fn request(&mut self) -> Option<R::Id> {
        let Some(id) = self.first_free else {
            self.available = false;
            return None;
        };
        let record = &mut self.records[id.index()];
        self.first_free = record.next_free();
        *record = R::default();
        self.live[id.index()] = true;
        self.live_count += 1;
        Some(id)
    }

    pub fn release(&mut self, id: R::Id) -> Result<(), PoolError> {
        if !self.is_live(id) {
            return Err(PoolError::NotLive {
                index: id.index(),
            });
        }
        let record = &mut self.records[id.index()];
        *record = R::default();
        record.set_next_free(self.first_free);
        self.first_free = Some(id);
        self.live[id.index()] = false;
        self.live_count -= 1;
        self.available = true;
        Ok(())
    }

    /// Enlarges the table to `new_capacity` slots and appends the new slots
    /// to the tail of the existing free list.
    pub fn grow(&mut self, new_capacity: usize) -> Result<(), PoolError> {
        let current = self.capacity();
        if new_capacity <= current {
            return Err(PoolError::CapacityNotIncreased {
                current,
                requested: new_capacity,
            });
        }
        let additional = new_capacity - current;
        self.records
            .try_reserve_exact(additional)
            .and_then(|_| self.live.try_reserve_exact(additional))
            .map_err(|_| PoolError::Allocation {
                requested: new_capacity,
            })?;

        let tail = self.free_tail();
        self.extend_free_slots(additional);
        let first_new = Some(R::Id::from_index(current));
        match tail {
            Some(tail) => self.records[tail.index()].set_next_free(first_new),
            None => self.first_free = first_new,
        }
        self.available = true;
        Ok(())
    }

    pub fn get(&self, id: R::Id) -> &R {
        &self.records[id.index()]
    }

    pub fn get_mut(&mut self, id: R::Id) -> &mut R {
        &mut self.records[id.index()]
    }

    fn free_tail(&self) -> Option<R::Id> {
        let mut tail = None;
        let mut cursor = self.first_free;
        while let Some(id) = cursor {
            tail = Some(id);
            cursor = self.records[id.index()].next_free();
        }
        tail
    }

    /// Pushes `count` fresh slots, each chained to the next; the last one ends the chain.
    fn extend_free_slots(&mut self, count: usize) {
        let start = self.records.len();
        let end = start + count;
        for i in start..end {
            let mut record = R::default();
            let next = (i + 1 < end).then(|| R::Id::from_index(i + 1));
            record.set_next_free(next);
            self.records.push(record);
            self.live.push(false);
        }
    }
}
