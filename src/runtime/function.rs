//! Native function objects
//!
//! Every callable in the engine is a native function: class constructors,
//! methods, and the builtins. Accessor callbacks are not function objects;
//! they live directly in the property slot.

use std::fmt;

use crate::engine::NativeFn;
use crate::runtime::object::ClassId;

/// Function kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Plain function
    Normal,
    /// Method installed from a class member table
    Method,
    /// Class constructor
    Constructor,
}

impl FunctionKind {
    /// Check if this function can be used with 'new'
    pub fn is_constructor(self) -> bool {
        matches!(self, FunctionKind::Constructor)
    }
}

/// Callable payload of a function object
#[derive(Clone)]
pub struct NativeFunction {
    /// Function name (for diagnostics)
    pub name: String,
    pub callback: NativeFn,
    pub kind: FunctionKind,
    /// Class id given to instances built by this constructor
    pub instance_class: Option<ClassId>,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, callback: NativeFn, kind: FunctionKind) -> Self {
        NativeFunction {
            name: name.into(),
            callback,
            kind,
            instance_class: None,
        }
    }

    /// Create a constructor building instances of `class_id`
    pub fn constructor(name: impl Into<String>, callback: NativeFn, class_id: ClassId) -> Self {
        NativeFunction {
            name: name.into(),
            callback,
            kind: FunctionKind::Constructor,
            instance_class: Some(class_id),
        }
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.kind.is_constructor()
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("instance_class", &self.instance_class)
            .finish()
    }
}
