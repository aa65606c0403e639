//! JavaScript object representation
//!
//! This module implements the JSObject struct and related types for
//! representing JavaScript objects in the engine.

use std::any::Any;
use std::fmt;

use crate::runtime::function::NativeFunction;
use crate::runtime::property::PropertyTable;
use crate::value::Value;

/// JavaScript class IDs
///
/// These identify the type of a JavaScript object. Classes defined through
/// `define_class` get a `User` id; finalizers are looked up by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    /// Plain object
    Object,
    /// Native function
    Function,
    /// User-defined class (index into the engine's class records)
    User(u32),
}

impl ClassId {
    #[inline]
    pub fn is_user(self) -> bool {
        matches!(self, ClassId::User(_))
    }
}

/// JavaScript object
///
/// All objects (plain objects, functions, class instances) use this
/// structure; the optional parts say which kind it is.
pub struct JSObject {
    pub class_id: ClassId,
    /// Prototype of this object (object value or null)
    pub proto: Value,
    pub props: PropertyTable,
    /// Present on function objects
    pub function: Option<NativeFunction>,
    /// Native data attached with `wrap`
    pub opaque: Option<Box<dyn Any>>,
    /// GC mark bit
    marked: bool,
}

impl JSObject {
    /// Create an ordinary object
    pub fn new(class_id: ClassId, proto: Value) -> Self {
        JSObject {
            class_id,
            proto,
            props: PropertyTable::new(),
            function: None,
            opaque: None,
            marked: false,
        }
    }

    /// Create a function object
    pub fn function(function: NativeFunction, proto: Value) -> Self {
        JSObject {
            function: Some(function),
            ..JSObject::new(ClassId::Function, proto)
        }
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.function.is_some()
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.function.as_ref().is_some_and(NativeFunction::is_constructor)
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    #[inline]
    pub fn set_marked(&mut self, marked: bool) {
        self.marked = marked;
    }
}

impl fmt::Debug for JSObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JSObject")
            .field("class_id", &self.class_id)
            .field("proto", &self.proto)
            .field("props", &self.props.len())
            .field("function", &self.function)
            .field("wrapped", &self.opaque.is_some())
            .finish()
    }
}
