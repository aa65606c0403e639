//! Property table and operations
//!
//! JavaScript objects store properties in a hash table for fast lookup.
//! Keys are interned atoms; a slot holds either a data value or a
//! getter/setter pair of native callbacks.

use crate::engine::NativeFn;
use crate::runtime::string::Atom;
use crate::value::Value;

/// Property type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// Normal property with value
    Normal,
    /// Getter/setter property
    GetSet,
}

/// Property payload
#[derive(Clone)]
pub enum PropertySlot {
    Value(Value),
    Accessor {
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
    },
}

impl PropertySlot {
    #[inline]
    pub fn prop_type(&self) -> PropertyType {
        match self {
            PropertySlot::Value(_) => PropertyType::Normal,
            PropertySlot::Accessor { .. } => PropertyType::GetSet,
        }
    }
}

/// A property in an object's property table
#[derive(Clone)]
pub struct Property {
    /// None marks a deleted entry sitting on the free list
    key: Option<Atom>,
    pub slot: PropertySlot,
    /// Hash chain next (index + 1, 0 = end of chain)
    hash_next: u32,
}

impl Property {
    #[inline]
    pub fn key(&self) -> Option<Atom> {
        self.key
    }

    #[inline]
    pub fn prop_type(&self) -> PropertyType {
        self.slot.prop_type()
    }
}

/// Property table structure
///
/// - hash_table[hash_size]: indices into props (0 = end of list)
/// - properties[]: entries, deleted ones chained through `first_free`
pub struct PropertyTable {
    /// Number of active properties
    prop_count: u32,
    /// Hash table mask (size - 1)
    hash_mask: u32,
    properties: Vec<Property>,
    hash_table: Vec<u32>,
    /// First free slot in properties (for reuse of deleted slots)
    first_free: u32,
}

impl PropertyTable {
    /// Minimum hash table size
    const MIN_HASH_SIZE: usize = 4;

    /// Maximum load factor before resize
    const MAX_LOAD_FACTOR: f64 = 0.75;

    /// Create a new empty property table
    pub fn new() -> Self {
        PropertyTable {
            prop_count: 0,
            hash_mask: (Self::MIN_HASH_SIZE - 1) as u32,
            properties: Vec::new(),
            hash_table: vec![0; Self::MIN_HASH_SIZE],
            first_free: 0,
        }
    }

    /// Get the number of properties
    #[inline]
    pub fn len(&self) -> usize {
        self.prop_count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prop_count == 0
    }

    #[inline]
    fn hash_key(key: Atom) -> u32 {
        // Mix bits for better distribution
        let mut h = key.index();
        h ^= h >> 16;
        h = h.wrapping_mul(0x85ebca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2ae35);
        h ^= h >> 16;
        h
    }

    /// Find a property by key, returns its index
    pub fn find(&self, key: Atom) -> Option<usize> {
        if self.prop_count == 0 {
            return None;
        }

        let hash = Self::hash_key(key);
        let mut idx = self.hash_table[(hash & self.hash_mask) as usize];

        while idx != 0 {
            let prop_idx = (idx - 1) as usize;
            let prop = &self.properties[prop_idx];
            if prop.key == Some(key) {
                return Some(prop_idx);
            }
            idx = prop.hash_next;
        }

        None
    }

    pub fn get(&self, key: Atom) -> Option<&PropertySlot> {
        self.find(key).map(|idx| &self.properties[idx].slot)
    }

    pub fn get_mut(&mut self, key: Atom) -> Option<&mut PropertySlot> {
        self.find(key).map(move |idx| &mut self.properties[idx].slot)
    }

    /// Insert or replace a slot
    ///
    /// Returns true if this was a new property, false if replaced.
    pub fn set_slot(&mut self, key: Atom, slot: PropertySlot) -> bool {
        if let Some(idx) = self.find(key) {
            self.properties[idx].slot = slot;
            return false;
        }

        let load = (self.prop_count + 1) as f64 / (self.hash_mask + 1) as f64;
        if load > Self::MAX_LOAD_FACTOR {
            self.resize();
        }

        let bucket = (Self::hash_key(key) & self.hash_mask) as usize;
        let prop = Property {
            key: Some(key),
            slot,
            hash_next: self.hash_table[bucket],
        };

        // Reuse deleted slot or append
        let prop_idx = if self.first_free != 0 {
            let idx = (self.first_free - 1) as usize;
            self.first_free = self.properties[idx].hash_next;
            self.properties[idx] = prop;
            idx
        } else {
            self.properties.push(prop);
            self.properties.len() - 1
        };

        self.hash_table[bucket] = (prop_idx + 1) as u32;
        self.prop_count += 1;
        true
    }

    /// Insert or update a data property
    pub fn set(&mut self, key: Atom, value: Value) -> bool {
        self.set_slot(key, PropertySlot::Value(value))
    }

    /// Define a property with getter/setter
    pub fn define_accessor(&mut self, key: Atom, getter: Option<NativeFn>, setter: Option<NativeFn>) -> bool {
        self.set_slot(key, PropertySlot::Accessor { getter, setter })
    }

    /// Delete a property by key
    ///
    /// Returns true if the property existed.
    pub fn delete(&mut self, key: Atom) -> bool {
        if self.prop_count == 0 {
            return false;
        }

        let bucket = (Self::hash_key(key) & self.hash_mask) as usize;
        let mut prev_idx: Option<usize> = None;
        let mut idx = self.hash_table[bucket];

        while idx != 0 {
            let prop_idx = (idx - 1) as usize;
            let next = self.properties[prop_idx].hash_next;

            if self.properties[prop_idx].key == Some(key) {
                match prev_idx {
                    Some(prev) => self.properties[prev].hash_next = next,
                    None => self.hash_table[bucket] = next,
                }

                let prop = &mut self.properties[prop_idx];
                prop.key = None;
                prop.slot = PropertySlot::Value(Value::undefined());
                prop.hash_next = self.first_free;
                self.first_free = (prop_idx + 1) as u32;

                self.prop_count -= 1;
                return true;
            }

            prev_idx = Some(prop_idx);
            idx = next;
        }

        false
    }

    fn resize(&mut self) {
        let new_size = ((self.hash_mask + 1) * 2) as usize;
        self.hash_mask = (new_size - 1) as u32;
        self.hash_table = vec![0; new_size];

        for i in 0..self.properties.len() {
            let Some(key) = self.properties[i].key else {
                continue;
            };
            let bucket = (Self::hash_key(key) & self.hash_mask) as usize;
            self.properties[i].hash_next = self.hash_table[bucket];
            self.hash_table[bucket] = (i + 1) as u32;
        }
    }

    /// Iterate over live properties as (key, slot)
    pub fn iter(&self) -> impl Iterator<Item = (Atom, &PropertySlot)> {
        self.properties.iter().filter_map(|p| p.key.map(|k| (k, &p.slot)))
    }

    pub fn keys(&self) -> impl Iterator<Item = Atom> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Data values stored in the table (accessor callbacks excluded)
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.iter().filter_map(|(_, slot)| match slot {
            PropertySlot::Value(v) => Some(*v),
            PropertySlot::Accessor { .. } => None,
        })
    }

    #[inline]
    pub fn has(&self, key: Atom) -> bool {
        self.find(key).is_some()
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::native_fn;
    use crate::runtime::string::StringTable;

    fn atoms(n: usize) -> (StringTable, Vec<Atom>) {
        let mut table = StringTable::new();
        let atoms = (0..n).map(|i| table.intern(&format!("p{}", i))).collect();
        (table, atoms)
    }

    fn value_of(table: &PropertyTable, key: Atom) -> Option<Value> {
        match table.get(key) {
            Some(PropertySlot::Value(v)) => Some(*v),
            _ => None,
        }
    }

    #[test]
    fn test_empty_table() {
        let (_, keys) = atoms(1);
        let table = PropertyTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(table.get(keys[0]).is_none());
    }

    #[test]
    fn test_set_get_update() {
        let (_, keys) = atoms(1);
        let mut table = PropertyTable::new();

        assert!(table.set(keys[0], Value::int(10)));
        assert!(!table.set(keys[0], Value::int(20)));

        assert_eq!(table.len(), 1);
        assert_eq!(value_of(&table, keys[0]), Some(Value::int(20)));
    }

    #[test]
    fn test_accessor() {
        let (_, keys) = atoms(1);
        let mut table = PropertyTable::new();

        table.define_accessor(keys[0], Some(native_fn(|_, _| Ok(Value::int(1)))), None);
        let slot = table.get(keys[0]).unwrap();
        assert_eq!(slot.prop_type(), PropertyType::GetSet);
        assert!(matches!(slot, PropertySlot::Accessor { getter: Some(_), setter: None }));
        assert_eq!(table.values().count(), 0);
    }

    #[test]
    fn test_delete_and_reuse() {
        let (_, keys) = atoms(4);
        let mut table = PropertyTable::new();

        table.set(keys[0], Value::int(10));
        table.set(keys[1], Value::int(20));
        table.set(keys[2], Value::int(30));

        assert!(table.delete(keys[1]));
        assert!(!table.delete(keys[1]));
        assert_eq!(table.len(), 2);

        table.set(keys[3], Value::int(40));
        assert_eq!(table.len(), 3);
        assert!(table.has(keys[0]));
        assert!(!table.has(keys[1]));
        assert!(table.has(keys[2]));
        assert_eq!(value_of(&table, keys[3]), Some(Value::int(40)));
    }

    #[test]
    fn test_resize() {
        let (_, keys) = atoms(100);
        let mut table = PropertyTable::new();

        for (i, key) in keys.iter().enumerate() {
            table.set(*key, Value::int(i as i32 * 2));
        }

        assert_eq!(table.len(), 100);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(value_of(&table, *key), Some(Value::int(i as i32 * 2)));
        }
    }

    #[test]
    fn test_iteration_order() {
        let (_, keys) = atoms(3);
        let mut table = PropertyTable::new();

        for key in &keys {
            table.set(*key, Value::null());
        }

        let order: Vec<_> = table.keys().collect();
        assert_eq!(order, keys);
    }
}
