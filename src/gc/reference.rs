//! Persistent references
//!
//! Native code holds engine objects through references. Each reference has a
//! count; every reference with a non-zero count is a GC root. A zero count
//! keeps the entry (it can be re-incremented) without keeping the object alive.

use crate::engine::Reference;
use crate::error::{EngineError, EngineResult};
use crate::value::Value;

struct Entry {
    value: Value,
    count: u32,
}

/// Table of persistent references
#[derive(Default)]
pub struct ReferenceTable {
    entries: Vec<Option<Entry>>,
    free: Vec<u32>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, value: Value, count: u32) -> Reference {
        let entry = Some(Entry { value, count });
        match self.free.pop() {
            Some(id) => {
                self.entries[id as usize] = entry;
                Reference(id)
            }
            None => {
                self.entries.push(entry);
                Reference((self.entries.len() - 1) as u32)
            }
        }
    }

    fn entry(&self, reference: Reference) -> EngineResult<&Entry> {
        self.entries
            .get(reference.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(EngineError::InvalidReference(reference.0))
    }

    fn entry_mut(&mut self, reference: Reference) -> EngineResult<&mut Entry> {
        self.entries
            .get_mut(reference.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(EngineError::InvalidReference(reference.0))
    }

    /// Stored value (not checked for liveness)
    pub fn value(&self, reference: Reference) -> EngineResult<Value> {
        self.entry(reference).map(|e| e.value)
    }

    pub fn count(&self, reference: Reference) -> EngineResult<u32> {
        self.entry(reference).map(|e| e.count)
    }

    pub fn inc(&mut self, reference: Reference) -> EngineResult<u32> {
        let entry = self.entry_mut(reference)?;
        entry.count += 1;
        Ok(entry.count)
    }

    /// Decrement; unref at zero is an error
    pub fn dec(&mut self, reference: Reference) -> EngineResult<u32> {
        let entry = self.entry_mut(reference)?;
        if entry.count == 0 {
            return Err(EngineError::InvalidReference(reference.0));
        }
        entry.count -= 1;
        Ok(entry.count)
    }

    pub fn delete(&mut self, reference: Reference) -> EngineResult<()> {
        self.entry(reference)?;
        self.entries[reference.0 as usize] = None;
        self.free.push(reference.0);
        Ok(())
    }

    /// Values of every reference with a non-zero count
    pub fn roots(&self) -> impl Iterator<Item = Value> + '_ {
        self.entries
            .iter()
            .flatten()
            .filter(|e| e.count > 0)
            .map(|e| e.value)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let mut refs = ReferenceTable::new();
        let r = refs.create(Value::int(1), 0);

        assert_eq!(refs.inc(r), Ok(1));
        assert_eq!(refs.inc(r), Ok(2));
        assert_eq!(refs.dec(r), Ok(1));
        assert_eq!(refs.dec(r), Ok(0));
        assert_eq!(refs.dec(r), Err(EngineError::InvalidReference(r.id())));
        assert_eq!(refs.value(r), Ok(Value::int(1)));
    }

    #[test]
    fn test_roots_only_counted() {
        let mut refs = ReferenceTable::new();
        refs.create(Value::int(1), 0);
        refs.create(Value::int(2), 1);

        let roots: Vec<_> = refs.roots().collect();
        assert_eq!(roots, vec![Value::int(2)]);
    }

    #[test]
    fn test_delete_and_reuse() {
        let mut refs = ReferenceTable::new();
        let a = refs.create(Value::int(1), 1);
        refs.delete(a).unwrap();

        assert_eq!(refs.value(a), Err(EngineError::InvalidReference(a.id())));
        assert!(refs.delete(a).is_err());
        assert!(refs.is_empty());

        let b = refs.create(Value::int(2), 0);
        assert_eq!(a.id(), b.id());
        assert_eq!(refs.len(), 1);
    }
}
