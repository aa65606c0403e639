//! Garbage collector module
//!
//! The reference engine uses a tracing mark-sweep collector over a slot heap.
//! Native code keeps objects alive through counted persistent references;
//! everything else survives only while reachable from the global object.

mod allocator;
mod collector;
mod reference;

pub use allocator::{Heap, HeapStats};
pub use collector::{Collection, GcStats};
pub use reference::ReferenceTable;

use crate::value::Value;

impl Heap {
    /// Run garbage collection
    pub fn collect(&mut self, roots: &[Value]) -> Collection {
        collector::collect(self, roots)
    }
}
