//! Script engine boundary
//!
//! The binding layer never touches engine internals. Everything it needs is
//! expressed by the [`Engine`] trait: class definition, property access,
//! persistent references, prototype mutation, construction, native data
//! attachment and teardown hooks. [`crate::Context`] is the in-crate
//! implementation; embedders can put any runtime behind the same trait.
//!
//! All callbacks receive the engine as `&mut dyn Engine` and run
//! synchronously on the thread that owns it.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::EngineResult;
use crate::value::Value;

/// Native function callback (methods, getters, setters, constructors)
pub type NativeFn = Rc<dyn Fn(&mut dyn Engine, &CallInfo) -> EngineResult<Value>>;

/// Finalizer callback, receives the native data of a reclaimed instance
pub type Finalizer = Rc<dyn Fn(&mut dyn Engine, Box<dyn Any>)>;

/// Hook run once the engine has finished tearing down
pub type TeardownHook = Box<dyn FnOnce()>;

/// Wrap a closure as a [`NativeFn`]
pub fn native_fn<F>(f: F) -> NativeFn
where
    F: Fn(&mut dyn Engine, &CallInfo) -> EngineResult<Value> + 'static,
{
    Rc::new(f)
}

/// Wrap a closure as a [`Finalizer`]
pub fn finalizer<F>(f: F) -> Finalizer
where
    F: Fn(&mut dyn Engine, Box<dyn Any>) + 'static,
{
    Rc::new(f)
}

/// Arguments of a native call
#[derive(Debug, Clone, Default)]
pub struct CallInfo {
    /// Receiver (the new instance for constructor calls)
    pub this: Value,
    /// Call arguments
    pub args: Vec<Value>,
    /// Constructor invoked with `new`, undefined for plain calls
    pub new_target: Value,
}

impl CallInfo {
    pub fn new(this: Value, args: &[Value]) -> Self {
        CallInfo {
            this,
            args: args.to_vec(),
            new_target: Value::undefined(),
        }
    }

    /// Get an argument, undefined when missing
    #[inline]
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).copied().unwrap_or_default()
    }

    /// Check if this call was made through `new`
    #[inline]
    pub fn is_construct_call(&self) -> bool {
        !self.new_target.is_undefined()
    }
}

/// Persistent reference to an engine object
///
/// A reference with a count above zero keeps its object alive. At zero it is
/// weak: it still resolves while the object lives and resolves to undefined
/// once the collector reclaimed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference(pub(crate) u32);

impl Reference {
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Where a class member is defined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// On the class prototype, shared by instances
    Instance,
    /// On the constructor itself
    Static,
}

/// One entry of a class member table
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub method: Option<NativeFn>,
    pub getter: Option<NativeFn>,
    pub setter: Option<NativeFn>,
    pub placement: Placement,
}

impl PropertyDescriptor {
    /// Accessor property entry
    pub fn accessor(
        name: impl Into<String>,
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
        placement: Placement,
    ) -> Self {
        PropertyDescriptor {
            name: name.into(),
            method: None,
            getter,
            setter,
            placement,
        }
    }

    /// Method entry
    pub fn method(name: impl Into<String>, method: NativeFn, placement: Placement) -> Self {
        PropertyDescriptor {
            name: name.into(),
            method: Some(method),
            getter: None,
            setter: None,
            placement,
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.placement == Placement::Static
    }

    #[inline]
    pub fn is_method(&self) -> bool {
        self.method.is_some()
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("method", &self.method.is_some())
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("placement", &self.placement)
            .finish()
    }
}

/// Everything the engine needs to lay out a class
pub struct ClassDefinition<'a> {
    pub name: &'a str,
    pub constructor: NativeFn,
    pub finalizer: Option<Finalizer>,
    pub properties: &'a [PropertyDescriptor],
}

/// Capabilities of a script engine
pub trait Engine {
    /// The global object
    fn global(&self) -> Value;

    /// Create an empty plain object
    fn create_object(&mut self) -> EngineResult<Value>;

    /// Define a class: constructor function plus prototype carrying the
    /// instance members; static members go on the constructor.
    fn define_class(&mut self, def: ClassDefinition<'_>) -> EngineResult<Value>;

    /// Create a persistent reference with an initial count
    fn create_reference(&mut self, value: Value, initial_count: u32) -> EngineResult<Reference>;

    /// Resolve a reference (undefined if the object was collected)
    fn reference_value(&self, reference: Reference) -> EngineResult<Value>;

    /// Increment a reference count, returns the new count
    fn reference_ref(&mut self, reference: Reference) -> EngineResult<u32>;

    /// Decrement a reference count, returns the new count
    fn reference_unref(&mut self, reference: Reference) -> EngineResult<u32>;

    /// Current reference count
    fn reference_count(&self, reference: Reference) -> EngineResult<u32>;

    fn delete_reference(&mut self, reference: Reference) -> EngineResult<()>;

    /// Read a property, walking the prototype chain
    fn get_named_property(&mut self, object: Value, name: &str) -> EngineResult<Value>;

    /// Write a property, invoking setters found on the chain
    fn set_named_property(&mut self, object: Value, name: &str, value: Value) -> EngineResult<()>;

    /// Remove an own property, returns whether it existed
    fn delete_named_property(&mut self, object: Value, name: &str) -> EngineResult<bool>;

    /// Reassign the prototype link of an object (null allowed)
    fn set_prototype_of(&mut self, object: Value, proto: Value) -> EngineResult<()>;

    fn get_prototype_of(&self, object: Value) -> EngineResult<Value>;

    fn is_callable(&self, value: Value) -> bool;

    fn call_function(&mut self, this: Value, func: Value, args: &[Value]) -> EngineResult<Value>;

    /// Construct an instance, invoking the constructor callback
    fn new_instance(&mut self, constructor: Value, args: &[Value]) -> EngineResult<Value>;

    /// Attach native data to an object
    fn wrap(&mut self, object: Value, data: Box<dyn Any>) -> EngineResult<()>;

    fn unwrap(&self, object: Value) -> EngineResult<Option<&dyn Any>>;

    fn unwrap_mut(&mut self, object: Value) -> EngineResult<Option<&mut dyn Any>>;

    /// Detach native data from an object; its finalizer will no longer run
    fn remove_wrap(&mut self, object: Value) -> EngineResult<Option<Box<dyn Any>>>;

    /// Register a hook to run after the engine's own teardown
    fn add_after_teardown_hook(&mut self, hook: TeardownHook);

    /// Check if `proto` appears anywhere on the prototype chain of `object`
    fn has_in_prototype_chain(&self, object: Value, proto: Value) -> EngineResult<bool> {
        let mut current = self.get_prototype_of(object)?;
        while current.is_object() {
            if current == proto {
                return Ok(true);
            }
            current = self.get_prototype_of(current)?;
        }
        Ok(false)
    }
}
