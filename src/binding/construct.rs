//! Constructor suppression
//!
//! Native-initiated construction goes through the engine's generic `new`,
//! which always runs the class constructor hook. The [`ConstructGate`] tells
//! hooks whether to perform native-side initialization; it is engaged for the
//! duration of a [`SuppressGuard`].
//!
//! The gate is a single switch shared by every class of a registry. It is not
//! reentrant: any class constructed while a guard is alive, including classes
//! constructed from inside a hook, sees the suppressed state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared construction flag
#[derive(Clone)]
pub struct ConstructGate {
    need_call: Rc<Cell<bool>>,
}

impl ConstructGate {
    pub fn new() -> Self {
        ConstructGate {
            need_call: Rc::new(Cell::new(true)),
        }
    }

    /// Whether constructor hooks should run native initialization
    #[inline]
    pub fn need_call_constructor(&self) -> bool {
        self.need_call.get()
    }

    #[inline]
    pub fn set_need_call_constructor(&self, need_call: bool) {
        self.need_call.set(need_call);
    }

    /// Suppress constructor hooks until the guard is dropped
    pub fn suppress(&self) -> SuppressGuard {
        let previous = self.need_call.replace(false);
        SuppressGuard {
            gate: self.clone(),
            previous,
        }
    }

    /// Check whether two gates are the same switch
    #[inline]
    pub fn ptr_eq(&self, other: &ConstructGate) -> bool {
        Rc::ptr_eq(&self.need_call, &other.need_call)
    }
}

impl Default for ConstructGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConstructGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructGate")
            .field("need_call_constructor", &self.need_call.get())
            .finish()
    }
}

/// Restores the gate to its previous value on drop
#[must_use = "constructors are only suppressed while the guard is alive"]
pub struct SuppressGuard {
    gate: ConstructGate,
    previous: bool,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.gate.set_need_call_constructor(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores() {
        let gate = ConstructGate::new();
        assert!(gate.need_call_constructor());
        {
            let _guard = gate.suppress();
            assert!(!gate.need_call_constructor());
        }
        assert!(gate.need_call_constructor());
    }

    #[test]
    fn test_nested_guards_restore_previous() {
        let gate = ConstructGate::new();
        let outer = gate.suppress();
        let inner = gate.suppress();
        drop(inner);
        // Inner guard restores the suppressed state of the outer window
        assert!(!gate.need_call_constructor());
        drop(outer);
        assert!(gate.need_call_constructor());
    }

    #[test]
    fn test_clones_share_state() {
        let gate = ConstructGate::new();
        let hook_view = gate.clone();
        let _guard = gate.suppress();
        assert!(!hook_view.need_call_constructor());
        assert!(hook_view.ptr_eq(&gate));
        assert!(!ConstructGate::new().ptr_eq(&gate));
    }

    #[test]
    fn test_guard_restores_on_unwind() {
        let gate = ConstructGate::new();
        let inner = gate.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.suppress();
            panic!("constructor failed");
        }));
        assert!(result.is_err());
        assert!(gate.need_call_constructor());
    }
}
