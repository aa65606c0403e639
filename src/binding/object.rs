//! Native handles onto engine objects
//!
//! An [`ObjectRef`] is backed by one engine persistent reference. Clones share
//! that reference, so the count the engine sees is the number of outstanding
//! `inc_ref`s across every holder; the object stops being rooted only when the
//! last holder released it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::engine::{Engine, Reference};
use crate::error::EngineResult;
use crate::value::Value;

struct Handle {
    reference: Reference,
    /// Set while this handle holds its own root on the object
    rooted: Cell<bool>,
}

/// Shared, reference-counted handle to an engine object
#[derive(Clone)]
pub struct ObjectRef {
    handle: Rc<Handle>,
}

impl ObjectRef {
    /// Create a weak handle (count 0) onto an object
    pub fn new(engine: &mut dyn Engine, value: Value) -> EngineResult<Self> {
        let reference = engine.create_reference(value, 0)?;
        Ok(ObjectRef {
            handle: Rc::new(Handle {
                reference,
                rooted: Cell::new(false),
            }),
        })
    }

    /// Handle onto the global object
    pub fn global(engine: &mut dyn Engine) -> EngineResult<Self> {
        let global = engine.global();
        Self::new(engine, global)
    }

    #[inline]
    pub fn reference(&self) -> Reference {
        self.handle.reference
    }

    /// Current value; undefined once the object was collected
    pub fn resolve(&self, engine: &dyn Engine) -> EngineResult<Value> {
        engine.reference_value(self.handle.reference)
    }

    pub fn ref_count(&self, engine: &dyn Engine) -> EngineResult<u32> {
        engine.reference_count(self.handle.reference)
    }

    /// Acquire a share, returns the new count
    pub fn inc_ref(&self, engine: &mut dyn Engine) -> EngineResult<u32> {
        engine.reference_ref(self.handle.reference)
    }

    /// Release a share, returns the new count
    pub fn dec_ref(&self, engine: &mut dyn Engine) -> EngineResult<u32> {
        engine.reference_unref(self.handle.reference)
    }

    /// Protect the object from collection; rooting twice holds one share
    pub fn root(&self, engine: &mut dyn Engine) -> EngineResult<()> {
        if !self.handle.rooted.get() {
            self.inc_ref(engine)?;
            self.handle.rooted.set(true);
        }
        Ok(())
    }

    pub fn unroot(&self, engine: &mut dyn Engine) -> EngineResult<()> {
        if self.handle.rooted.get() {
            self.dec_ref(engine)?;
            self.handle.rooted.set(false);
        }
        Ok(())
    }

    #[inline]
    pub fn is_rooted(&self) -> bool {
        self.handle.rooted.get()
    }

    /// Check whether two handles share the same engine reference
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.handle.reference == other.handle.reference
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("reference", &self.handle.reference.id())
            .field("rooted", &self.handle.rooted.get())
            .finish()
    }
}
