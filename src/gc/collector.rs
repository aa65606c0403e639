//! Mark-sweep garbage collector
//!
//! The GC works in two phases:
//! 1. Mark: Traverse all reachable objects starting from roots, set mark bit
//! 2. Sweep: Free every unmarked object
//!
//! Swept objects are handed back to the caller instead of being dropped, so
//! the context can run class finalizers on their native data once the heap is
//! consistent again.

use super::allocator::Heap;
use crate::runtime::JSObject;
use crate::value::Value;

/// Statistics about a GC run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Number of objects before collection
    pub objects_before: usize,
    /// Number of objects after collection
    pub objects_after: usize,
}

impl GcStats {
    #[inline]
    pub fn freed(&self) -> usize {
        self.objects_before - self.objects_after
    }
}

/// Result of a collection
pub struct Collection {
    pub stats: GcStats,
    /// Objects that were unreachable
    pub swept: Vec<JSObject>,
}

/// Run garbage collection on the heap
pub fn collect(heap: &mut Heap, roots: &[Value]) -> Collection {
    let objects_before = heap.live();

    clear_marks(heap);
    mark(heap, roots);
    let swept = sweep(heap);

    Collection {
        stats: GcStats {
            objects_before,
            objects_after: heap.live(),
        },
        swept,
    }
}

fn clear_marks(heap: &mut Heap) {
    for object in heap.objects_mut() {
        object.set_marked(false);
    }
}

/// Mark everything reachable from the roots
///
/// Uses an explicit worklist; prototype chains and property graphs can be
/// arbitrarily deep.
fn mark(heap: &mut Heap, roots: &[Value]) {
    let mut worklist: Vec<Value> = roots.to_vec();

    while let Some(value) = worklist.pop() {
        let Some(id) = value.to_object() else {
            continue;
        };
        let Some(object) = heap.get_mut(id) else {
            continue;
        };
        if object.is_marked() {
            continue;
        }
        object.set_marked(true);

        worklist.push(object.proto);
        worklist.extend(object.props.values());
    }
}

fn sweep(heap: &mut Heap) -> Vec<JSObject> {
    let dead: Vec<_> = heap
        .ids()
        .into_iter()
        .filter(|id| heap.get(*id).is_some_and(|object| !object.is_marked()))
        .collect();

    dead.into_iter().filter_map(|id| heap.free(id)).collect()
}
