//! Script value representation
//!
//! Values crossing the native/script boundary are small `Copy` handles.
//! Primitives are stored inline; objects are referenced through an
//! [`ObjectId`] that indexes the engine heap.
//!
//! # Object ids
//! An id is a slot index plus the generation the slot had when the object was
//! allocated. Once the collector reclaims the slot its generation is bumped, so
//! stale ids held by native code fail lookup instead of aliasing a new object.

use std::fmt;

/// Handle to a heap object
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    /// Create an id from a slot index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        ObjectId { index, generation }
    }

    /// Slot index in the heap
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at allocation time
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Script value
#[derive(Clone, Copy, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    Object(ObjectId),
}

impl Value {
    // Constructors

    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create an undefined value
    #[inline]
    pub const fn undefined() -> Self {
        Value::Undefined
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an integer value
    #[inline]
    pub const fn int(val: i32) -> Self {
        Value::Int(val)
    }

    /// Create a float value
    #[inline]
    pub const fn float(val: f64) -> Self {
        Value::Float(val)
    }

    /// Create an object value
    #[inline]
    pub const fn object(id: ObjectId) -> Self {
        Value::Object(id)
    }

    // Type checking

    #[inline]
    pub const fn is_null(self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub const fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this is nullish (null or undefined)
    #[inline]
    pub const fn is_nullish(self) -> bool {
        self.is_null() || self.is_undefined()
    }

    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    pub const fn is_int(self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// Check if this is an int or a float
    #[inline]
    pub const fn is_number(self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    #[inline]
    pub const fn is_object(self) -> bool {
        matches!(self, Value::Object(_))
    }

    // Value extraction

    /// Get boolean value, returns None if not a boolean
    #[inline]
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Get integer value, returns None if not an integer
    #[inline]
    pub const fn to_i32(self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Get numeric value, widening integers
    #[inline]
    pub const fn to_f64(self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(i as f64),
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Get object id, returns None if not an object
    #[inline]
    pub const fn to_object(self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(id),
            _ => None,
        }
    }

    /// `typeof`-style name of the value kind
    pub const fn type_name(self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Object(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Object(id) => write!(f, "Object({:?})", id),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Object(_) => write!(f, "[object]"),
        }
    }
}
