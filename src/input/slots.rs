//! Multi-Touch Slot Allocation
//!
//! Hands out device slots and tracking IDs for new contacts.
//!
//! - The lowest free slot is reused first.
//! - With every slot taken, slot 0 is shared as a fallback. Holders are
//!   counted, so a slot only becomes free when its last holder leaves.
//! - Tracking IDs count up from 1 and wrap after [`MAX_TRACKING_ID`] back to
//!   1, skipping any ID a live contact still carries.

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, trace};

use crate::device::{MAX_SLOTS, MAX_TRACKING_ID};

/// Slot and tracking ID given to one contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotAssignment {
    /// Device slot
    pub slot: u8,
    /// Tracking ID reported with ABS_MT_TRACKING_ID
    pub tracking_id: u16,
}

/// Slot and tracking ID bookkeeping
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    free: BTreeSet<u8>,
    holders: [u16; MAX_SLOTS],
    live_ids: HashSet<u16>,
    next_tracking_id: u16,
}

impl SlotAllocator {
    /// All slots free, next tracking ID 1
    pub fn new() -> Self {
        Self {
            free: (0..MAX_SLOTS as u8).collect(),
            holders: [0; MAX_SLOTS],
            live_ids: HashSet::new(),
            next_tracking_id: 1,
        }
    }

    /// Assign a slot and a fresh tracking ID
    pub fn allocate(&mut self) -> SlotAssignment {
        let slot = match self.free.pop_first() {
            Some(slot) => slot,
            None => {
                debug!("All {} slots in use, sharing slot 0", MAX_SLOTS);
                0
            }
        };
        self.holders[slot as usize] += 1;

        let tracking_id = self.next_free_tracking_id();
        self.live_ids.insert(tracking_id);

        trace!("Allocated slot {} tracking id {}", slot, tracking_id);
        SlotAssignment { slot, tracking_id }
    }

    /// Give back an assignment
    ///
    /// Returns true when the slot became free again. Releasing an assignment
    /// that is not live does nothing.
    pub fn release(&mut self, assignment: SlotAssignment) -> bool {
        if !self.live_ids.remove(&assignment.tracking_id) {
            trace!("Ignoring release of unknown tracking id {}", assignment.tracking_id);
            return false;
        }

        let holders = &mut self.holders[assignment.slot as usize];
        *holders = holders.saturating_sub(1);
        if *holders == 0 {
            self.free.insert(assignment.slot);
            true
        } else {
            false
        }
    }

    /// Free every slot; the tracking ID sequence keeps counting
    pub fn reset(&mut self) {
        self.free = (0..MAX_SLOTS as u8).collect();
        self.holders = [0; MAX_SLOTS];
        self.live_ids.clear();
    }

    /// Number of live assignments
    pub fn live_count(&self) -> usize {
        self.live_ids.len()
    }

    /// Number of free slots
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Lowest free slot, if any
    pub fn lowest_free(&self) -> Option<u8> {
        self.free.first().copied()
    }

    fn next_free_tracking_id(&mut self) -> u16 {
        let first = self.next_tracking_id;
        for _ in 0..MAX_TRACKING_ID {
            let candidate = self.advance_tracking_id();
            if !self.live_ids.contains(&candidate) {
                return candidate;
            }
        }
        // Every ID is live; reuse the oldest position in the sequence
        debug!("All tracking ids live, reusing {}", first);
        self.next_tracking_id = first;
        self.advance_tracking_id()
    }

    fn advance_tracking_id(&mut self) -> u16 {
        let candidate = self.next_tracking_id;
        self.next_tracking_id = if candidate >= MAX_TRACKING_ID {
            1
        } else {
            candidate + 1
        };
        candidate
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lowest_slot_reused_first() {
        let mut slots = SlotAllocator::new();
        let a = slots.allocate();
        let b = slots.allocate();
        let c = slots.allocate();
        assert_eq!((a.slot, b.slot, c.slot), (0, 1, 2));

        slots.release(b);
        slots.release(a);
        assert_eq!(slots.allocate().slot, 0);
        assert_eq!(slots.allocate().slot, 1);
        assert_eq!(slots.allocate().slot, 3);
    }

    #[test]
    fn test_exhausted_slots_fall_back_to_zero() {
        let mut slots = SlotAllocator::new();
        let all: Vec<_> = (0..MAX_SLOTS).map(|_| slots.allocate()).collect();
        assert_eq!(slots.free_count(), 0);

        let extra = slots.allocate();
        assert_eq!(extra.slot, 0);

        // Slot 0 stays held by the first contact
        assert!(!slots.release(extra));
        assert_eq!(slots.lowest_free(), None);
        assert!(slots.release(all[0]));
        assert_eq!(slots.lowest_free(), Some(0));
    }

    #[test]
    fn test_tracking_ids_start_at_one_and_increase() {
        let mut slots = SlotAllocator::new();
        let ids: Vec<_> = (0..5)
            .map(|_| {
                let a = slots.allocate();
                slots.release(a);
                a.tracking_id
            })
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_tracking_id_wraps_to_one_skipping_live() {
        let mut slots = SlotAllocator::new();
        let held = slots.allocate();
        assert_eq!(held.tracking_id, 1);

        slots.next_tracking_id = MAX_TRACKING_ID;
        let last = slots.allocate();
        assert_eq!(last.tracking_id, MAX_TRACKING_ID);

        // 1 is still live, so the wrap lands on 2
        let wrapped = slots.allocate();
        assert_eq!(wrapped.tracking_id, 2);
    }

    #[test]
    fn test_tracking_id_search_ends_when_every_id_is_live() {
        let mut slots = SlotAllocator::new();
        slots.live_ids = (1..=MAX_TRACKING_ID).collect();
        slots.next_tracking_id = 40;

        let assignment = slots.allocate();
        assert_eq!(assignment.tracking_id, 40);
        assert_eq!(slots.next_tracking_id, 41);
    }

    #[test]
    fn test_double_release_is_ignored() {
        let mut slots = SlotAllocator::new();
        let a = slots.allocate();
        let b = slots.allocate();
        assert!(slots.release(a));
        assert!(!slots.release(a));
        assert_eq!(slots.live_count(), 1);
        assert_eq!(slots.allocate().slot, 0);
        slots.release(b);
    }

    #[test]
    fn test_reset_frees_everything() {
        let mut slots = SlotAllocator::new();
        for _ in 0..12 {
            slots.allocate();
        }
        slots.reset();
        assert_eq!(slots.free_count(), MAX_SLOTS);
        assert_eq!(slots.live_count(), 0);
        assert_eq!(slots.allocate().slot, 0);
    }

    proptest! {
        #[test]
        fn prop_live_slots_unique_while_available(ops in proptest::collection::vec(any::<(bool, usize)>(), 1..200)) {
            let mut slots = SlotAllocator::new();
            let mut live: Vec<SlotAssignment> = Vec::new();

            for (allocate, pick) in ops {
                if allocate || live.is_empty() {
                    if live.len() >= MAX_SLOTS {
                        continue;
                    }
                    live.push(slots.allocate());
                } else {
                    let released = live.remove(pick % live.len());
                    slots.release(released);
                }

                let distinct: HashSet<u8> = live.iter().map(|a| a.slot).collect();
                prop_assert_eq!(distinct.len(), live.len());
                prop_assert_eq!(slots.free_count(), MAX_SLOTS - live.len());
            }
        }

        #[test]
        fn prop_live_tracking_ids_unique(ops in proptest::collection::vec(any::<(bool, usize)>(), 1..300), start in 1u16..=MAX_TRACKING_ID) {
            let mut slots = SlotAllocator::new();
            slots.next_tracking_id = start;
            let mut live: Vec<SlotAssignment> = Vec::new();

            for (allocate, pick) in ops {
                if allocate || live.is_empty() {
                    let assignment = slots.allocate();
                    prop_assert!(assignment.tracking_id >= 1);
                    live.push(assignment);
                } else {
                    let released = live.remove(pick % live.len());
                    slots.release(released);
                }

                let distinct: HashSet<u16> = live.iter().map(|a| a.tracking_id).collect();
                prop_assert_eq!(distinct.len(), live.len());
            }
        }
    }
}
