//! jsbind - native class bindings for an embedded script engine
//!
//! Native code registers classes, constructs instances and keeps ownership of
//! the objects it exposes, while the engine's collector owns the script side.
//!
//! # Features
//! - Class registration with inheritance through the engine's own
//!   `Object.setPrototypeOf`
//! - Degraded-success installs instead of hard failures
//! - Native-initiated construction with constructor suppression
//! - Two-phase shutdown tied to engine teardown
//! - A small reference engine with a mark-sweep collector
//!
//! # Example
//! ```
//! use jsbind::{native_fn, ClassRegistry, Context, ContextOptions, Engine, ObjectRef, Value};
//!
//! let mut ctx = Context::new(ContextOptions::default()).unwrap();
//! let registry = ClassRegistry::new();
//! let global = ObjectRef::global(&mut ctx).unwrap();
//!
//! let point = registry.create_class(&mut ctx, "Point", Some(&global), None, None).unwrap();
//! point.define_static_function("origin", native_fn(|_, _| Ok(Value::int(0)))).unwrap();
//! assert!(point.install(&mut ctx).unwrap().is_complete());
//!
//! let global_obj = ctx.global();
//! let ctor = ctx.get_named_property(global_obj, "Point").unwrap();
//! let origin = ctx.get_named_property(ctor, "origin").unwrap();
//! assert!(ctx.is_callable(origin));
//!
//! registry.cleanup_all(&mut ctx);
//! ctx.teardown();
//! assert!(registry.is_empty());
//! ```

// Core modules
pub mod value;
pub mod engine;
pub mod error;
pub mod context;

// Garbage collector
pub mod gc;

// Built-in objects
pub mod builtins;

// Runtime support
pub mod runtime;

// Class bindings
pub mod binding;

// Re-export main types
pub use binding::{BindingOptions, Class, ClassPhase, ClassRegistry, ConstructGate, ObjectRef, RegistryPhase};
pub use context::{Context, ContextOptions};
pub use engine::{finalizer, native_fn, CallInfo, Engine, Finalizer, NativeFn, Placement, PropertyDescriptor};
pub use error::{BindError, BindResult, EngineError, EngineResult, InstallIssue, InstallStatus, InstallStep};
pub use value::Value;
