//! Runtime support
//!
//! This module contains the core runtime types of the reference engine:
//! - Object representation (JSObject, class ids)
//! - Property tables (data and accessor slots)
//! - Native function objects
//! - Property name interning

pub mod function;
pub mod object;
pub mod property;
pub mod string;

pub use function::{FunctionKind, NativeFunction};
pub use object::{ClassId, JSObject};
pub use property::{Property, PropertySlot, PropertyTable, PropertyType};
pub use string::{Atom, StringTable};
