//! Native class bindings
//!
//! Registers native classes with a script engine and manages their lifetime:
//! - [`ClassRegistry`]: creates classes and drives shutdown
//! - [`Class`]: member table, hooks and the install protocol
//! - [`ObjectRef`]: shared, counted handles onto engine objects
//! - [`ConstructGate`]: constructor suppression for native-initiated instances

pub mod class;
pub mod construct;
pub mod object;
pub mod registry;

pub use class::{Class, ClassPhase};
pub use construct::{ConstructGate, SuppressGuard};
pub use object::ObjectRef;
pub use registry::{BindingOptions, ClassRegistry, RegistryPhase};
