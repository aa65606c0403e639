//! Slot allocator for the object heap
//!
//! Objects live in a vector of slots. Freed slots go on a free list and are
//! reused; every reuse bumps the slot generation so that ids handed out for
//! the previous occupant stop resolving.
//!
//! The heap has a fixed capacity chosen at context creation. Allocation fails
//! instead of growing past it.

use crate::error::{EngineError, EngineResult};
use crate::runtime::JSObject;
use crate::value::ObjectId;

struct Slot {
    generation: u32,
    object: Option<JSObject>,
}

/// The object heap
pub struct Heap {
    slots: Vec<Slot>,
    /// Indices of empty slots
    free: Vec<u32>,
    capacity: usize,
    live: usize,
    /// Total allocations over the heap lifetime
    allocated: u64,
    /// Total frees over the heap lifetime
    freed: u64,
}

impl Heap {
    /// Create a heap holding at most `capacity` objects
    pub fn new(capacity: usize) -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
            live: 0,
            allocated: 0,
            freed: 0,
        }
    }

    /// Number of live objects
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocate a slot for an object
    pub fn alloc(&mut self, object: JSObject) -> EngineResult<ObjectId> {
        if self.live >= self.capacity {
            return Err(EngineError::HeapExhausted {
                capacity: self.capacity,
            });
        }

        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.object = Some(object);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    object: Some(object),
                });
                (self.slots.len() - 1) as u32
            }
        };

        self.live += 1;
        self.allocated += 1;
        Ok(ObjectId::new(index, self.slots[index as usize].generation))
    }

    /// Check that an id still refers to its object
    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ObjectId) -> Option<&JSObject> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut JSObject> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.object.as_mut())
    }

    /// Release a slot, returning its object
    pub fn free(&mut self, id: ObjectId) -> Option<JSObject> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        self.freed += 1;
        Some(object)
    }

    /// Ids of all live objects, in slot order
    pub fn ids(&self) -> Vec<ObjectId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.object.is_some())
            .map(|(i, slot)| ObjectId::new(i as u32, slot.generation))
            .collect()
    }

    /// Iterate over live objects mutably
    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut JSObject> {
        self.slots.iter_mut().filter_map(|slot| slot.object.as_mut())
    }

    /// Free every object, returning them in slot order
    pub fn drain(&mut self) -> Vec<JSObject> {
        let ids = self.ids();
        ids.into_iter().filter_map(|id| self.free(id)).collect()
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            capacity: self.capacity,
            live: self.live,
            allocated: self.allocated,
            freed: self.freed,
        }
    }
}

/// Heap usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Maximum number of live objects
    pub capacity: usize,
    /// Currently live objects
    pub live: usize,
    /// Objects allocated since creation
    pub allocated: u64,
    /// Objects freed since creation
    pub freed: u64,
}
