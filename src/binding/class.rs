//! Bindable classes
//!
//! A [`Class`] describes one native class for the script side: its name, the
//! namespace it is published on, an optional parent prototype, the member
//! table and the constructor/finalizer hooks. [`Class::install`] turns it into
//! a live class:
//!
//! 1. define the class on the engine (the only step whose failure aborts)
//! 2. point the class prototype at the parent prototype through the engine's
//!    own `Object.setPrototypeOf`
//! 3. keep a persistent reference to the constructor
//! 4. publish the constructor on the parent namespace
//! 5. fetch the prototype and root it
//!
//! Steps 2 to 5 are not transactional. A failure is logged, recorded as an
//! [`InstallIssue`] and the remaining steps still run.
//!
//! Classes are created through a [`ClassRegistry`](super::ClassRegistry),
//! which owns them until the engine has torn down.

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, warn};

use super::construct::ConstructGate;
use super::object::ObjectRef;
use super::registry::BindingOptions;
use crate::engine::{
    native_fn, ClassDefinition, Engine, Finalizer, NativeFn, Placement, PropertyDescriptor, Reference,
};
use crate::error::{BindError, BindResult, EngineError, EngineResult, InstallIssue, InstallStatus, InstallStep};
use crate::runtime::string::is_identifier;
use crate::value::Value;

/// Lifecycle of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassPhase {
    /// Members may still be declared
    Configured,
    /// Live on the engine, members frozen
    Installed,
    /// Handles released
    Destroyed,
}

struct ClassState {
    parent: Option<ObjectRef>,
    parent_proto: Option<ObjectRef>,
    constructor: NativeFn,
    finalizer: Option<Finalizer>,
    properties: Vec<PropertyDescriptor>,
    ctor_ref: Option<Reference>,
    proto: Option<ObjectRef>,
    phase: ClassPhase,
}

struct ClassInner {
    name: String,
    gate: ConstructGate,
    options: BindingOptions,
    state: RefCell<ClassState>,
}

/// Handle to a bindable class
///
/// Clones refer to the same class. No borrow of the class state is held
/// while the engine runs, so hooks may query the class they belong to.
#[derive(Clone)]
pub struct Class {
    inner: Rc<ClassInner>,
}

impl Class {
    /// Validate arguments and acquire the parent handles
    pub(crate) fn create(
        engine: &mut dyn Engine,
        name: &str,
        parent: Option<&ObjectRef>,
        parent_proto: Option<&ObjectRef>,
        constructor: Option<NativeFn>,
        gate: ConstructGate,
        options: BindingOptions,
    ) -> BindResult<Class> {
        if !is_identifier(name) {
            return Err(BindError::InvalidName(name.to_string()));
        }

        if let Some(parent) = parent {
            parent.inc_ref(engine)?;
        }
        if let Some(parent_proto) = parent_proto {
            if let Err(err) = parent_proto.inc_ref(engine) {
                if let Some(parent) = parent {
                    release(engine, name, "parent", parent, ObjectRef::dec_ref);
                }
                return Err(err.into());
            }
        }

        let constructor = constructor.unwrap_or_else(|| default_ctor(name));
        debug!(target: "jsbind::class", class = name, "class created");

        Ok(Class {
            inner: Rc::new(ClassInner {
                name: name.to_string(),
                gate,
                options,
                state: RefCell::new(ClassState {
                    parent: parent.cloned(),
                    parent_proto: parent_proto.cloned(),
                    constructor,
                    finalizer: None,
                    properties: Vec::new(),
                    ctor_ref: None,
                    proto: None,
                    phase: ClassPhase::Configured,
                }),
            }),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn phase(&self) -> ClassPhase {
        self.inner.state.borrow().phase
    }

    pub fn is_installed(&self) -> bool {
        self.phase() == ClassPhase::Installed
    }

    /// The gate this class's constructor hook should consult
    pub fn construct_gate(&self) -> &ConstructGate {
        &self.inner.gate
    }

    pub fn parent(&self) -> Option<ObjectRef> {
        self.inner.state.borrow().parent.clone()
    }

    pub fn parent_proto(&self) -> Option<ObjectRef> {
        self.inner.state.borrow().parent_proto.clone()
    }

    /// Member table in declaration order
    pub fn members(&self) -> Vec<PropertyDescriptor> {
        self.inner.state.borrow().properties.clone()
    }

    /// Declare an instance accessor on the prototype
    pub fn define_property(&self, name: &str, getter: Option<NativeFn>, setter: Option<NativeFn>) -> BindResult<()> {
        self.push_accessor(name, getter, setter, Placement::Instance)
    }

    /// Declare an accessor on the constructor
    pub fn define_static_property(
        &self,
        name: &str,
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
    ) -> BindResult<()> {
        self.push_accessor(name, getter, setter, Placement::Static)
    }

    /// Declare an instance method on the prototype
    pub fn define_function(&self, name: &str, func: NativeFn) -> BindResult<()> {
        self.push_member(PropertyDescriptor::method(name, func, Placement::Instance))
    }

    /// Declare a method on the constructor
    pub fn define_static_function(&self, name: &str, func: NativeFn) -> BindResult<()> {
        self.push_member(PropertyDescriptor::method(name, func, Placement::Static))
    }

    /// Set the finalizer run for reclaimed instances. Can be set once.
    pub fn define_finalize_function(&self, finalizer: Finalizer) -> BindResult<()> {
        let mut state = self.configurable()?;
        if state.finalizer.is_some() {
            return Err(BindError::FinalizerAlreadySet(self.inner.name.clone()));
        }
        state.finalizer = Some(finalizer);
        Ok(())
    }

    pub fn finalizer(&self) -> Option<Finalizer> {
        self.inner.state.borrow().finalizer.clone()
    }

    fn push_accessor(
        &self,
        name: &str,
        getter: Option<NativeFn>,
        setter: Option<NativeFn>,
        placement: Placement,
    ) -> BindResult<()> {
        if getter.is_none() && setter.is_none() {
            return Err(BindError::EmptyAccessor(name.to_string()));
        }
        self.push_member(PropertyDescriptor::accessor(name, getter, setter, placement))
    }

    fn push_member(&self, member: PropertyDescriptor) -> BindResult<()> {
        if !is_identifier(&member.name) {
            return Err(BindError::InvalidName(member.name));
        }
        self.configurable()?.properties.push(member);
        Ok(())
    }

    fn configurable(&self) -> BindResult<RefMut<'_, ClassState>> {
        let state = self.inner.state.borrow_mut();
        match state.phase {
            ClassPhase::Configured => Ok(state),
            ClassPhase::Installed => Err(BindError::MembersFrozen(self.inner.name.clone())),
            ClassPhase::Destroyed => Err(BindError::Destroyed(self.inner.name.clone())),
        }
    }

    /// Make the class live on the engine
    ///
    /// Returns [`InstallStatus::Degraded`] when some step after the class
    /// definition failed; the class is installed either way. With
    /// `strict_install` a degraded install is reported as
    /// [`BindError::Incomplete`] instead.
    pub fn install(&self, engine: &mut dyn Engine) -> BindResult<InstallStatus> {
        let name = self.inner.name.as_str();
        let (constructor, finalizer, properties, parent, parent_proto) = {
            let state = self.inner.state.borrow();
            match state.phase {
                ClassPhase::Configured => {}
                ClassPhase::Installed => return Err(BindError::AlreadyInstalled(name.to_string())),
                ClassPhase::Destroyed => return Err(BindError::Destroyed(name.to_string())),
            }
            (
                state.constructor.clone(),
                state.finalizer.clone(),
                state.properties.clone(),
                state.parent.clone(),
                state.parent_proto.clone(),
            )
        };

        let super_proto = match &parent_proto {
            Some(handle) => {
                let value = handle.resolve(engine)?;
                if !value.is_object() {
                    return Err(BindError::ParentNotInstalled(name.to_string()));
                }
                Some(value)
            }
            None => None,
        };

        debug!(target: "jsbind::class", class = name, members = properties.len(), "install begin");

        let ctor = engine
            .define_class(ClassDefinition {
                name,
                constructor,
                finalizer,
                properties: &properties,
            })
            .inspect_err(|err| error!(target: "jsbind::class", class = name, %err, "define class failed"))?;

        let mut issues = Vec::new();

        if let Some(super_proto) = super_proto {
            if let Err(err) = inherit(engine, ctor, super_proto) {
                record(&mut issues, name, InstallStep::Inherit, err);
            }
        }

        let ctor_ref = match engine.create_reference(ctor, 1) {
            Ok(reference) => Some(reference),
            Err(err) => {
                record(&mut issues, name, InstallStep::ConstructorReference, err);
                None
            }
        };

        if let Some(parent) = &parent {
            let published = parent
                .resolve(engine)
                .and_then(|namespace| engine.set_named_property(namespace, name, ctor));
            if let Err(err) = published {
                record(&mut issues, name, InstallStep::Publish, err);
            }
        }

        let proto = match rooted_prototype(engine, ctor) {
            Ok(proto) => Some(proto),
            Err(err) => {
                record(&mut issues, name, InstallStep::Prototype, err);
                None
            }
        };

        {
            let mut state = self.inner.state.borrow_mut();
            state.ctor_ref = ctor_ref;
            state.proto = proto;
            state.phase = ClassPhase::Installed;
        }

        debug!(target: "jsbind::class", class = name, issues = issues.len(), "install end");

        if issues.is_empty() {
            return Ok(InstallStatus::Complete);
        }
        if self.inner.options.strict_install {
            return Err(BindError::Incomplete {
                class: name.to_string(),
                issues,
            });
        }
        warn!(target: "jsbind::class", class = name, issues = issues.len(), "class installed in degraded state");
        Ok(InstallStatus::Degraded(issues))
    }

    /// Persistent reference to the constructor
    pub fn ctor_ref(&self) -> BindResult<Reference> {
        let state = self.inner.state.borrow();
        match state.phase {
            ClassPhase::Configured => Err(BindError::NotInstalled(self.inner.name.clone())),
            ClassPhase::Destroyed => Err(BindError::Destroyed(self.inner.name.clone())),
            ClassPhase::Installed => state
                .ctor_ref
                .ok_or_else(|| BindError::NoConstructor(self.inner.name.clone())),
        }
    }

    /// Resolve the constructor function
    pub fn ctor_func(&self, engine: &dyn Engine) -> BindResult<Value> {
        let reference = self.ctor_ref()?;
        Ok(engine.reference_value(reference)?)
    }

    /// Rooted prototype handle captured at installation
    pub fn proto(&self) -> Option<ObjectRef> {
        self.inner.state.borrow().proto.clone()
    }

    /// Create an instance from native code with constructor hooks suppressed
    ///
    /// The gate is restored to its previous value when construction returns,
    /// whether it succeeded or not.
    pub fn create_instance(&self, engine: &mut dyn Engine) -> BindResult<Value> {
        let ctor = self
            .ctor_func(engine)
            .inspect_err(|err| error!(target: "jsbind::class", class = self.name(), %err, "get ctor func err"))?;

        let _guard = self.inner.gate.suppress();
        let instance = engine
            .new_instance(ctor, &[])
            .inspect_err(|err| error!(target: "jsbind::class", class = self.name(), %err, "new instance failed"))?;
        Ok(instance)
    }

    /// Create an instance the way script `new` would, hooks included
    pub fn new_instance(&self, engine: &mut dyn Engine, args: &[Value]) -> BindResult<Value> {
        let ctor = self.ctor_func(engine)?;
        Ok(engine.new_instance(ctor, args)?)
    }

    /// Check whether a value is an instance of this class
    pub fn is_instance(&self, engine: &dyn Engine, value: Value) -> BindResult<bool> {
        let Some(proto) = self.proto() else {
            return Ok(false);
        };
        if !value.is_object() {
            return Ok(false);
        }
        let proto = proto.resolve(engine)?;
        Ok(engine.has_in_prototype_chain(value, proto)?)
    }

    /// Release the parent, prototype and parent prototype handles
    ///
    /// Every handle is released once; calling this again does nothing. The
    /// constructor reference stays alive until the engine tears down.
    pub fn destroy(&self, engine: &mut dyn Engine) {
        let (parent, proto, parent_proto) = {
            let mut state = self.inner.state.borrow_mut();
            if state.phase == ClassPhase::Destroyed {
                return;
            }
            state.phase = ClassPhase::Destroyed;
            (state.parent.take(), state.proto.take(), state.parent_proto.take())
        };

        let name = self.inner.name.as_str();
        if let Some(parent) = &parent {
            release(engine, name, "parent", parent, ObjectRef::dec_ref);
        }
        if let Some(proto) = &proto {
            release(engine, name, "prototype", proto, ObjectRef::unroot);
        }
        if let Some(parent_proto) = &parent_proto {
            release(engine, name, "parent prototype", parent_proto, ObjectRef::dec_ref);
        }
        debug!(target: "jsbind::class", class = name, "class destroyed");
    }

    /// Drop the member table and hooks
    pub(crate) fn release(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.properties.clear();
        state.finalizer = None;
        state.constructor = default_ctor(&self.inner.name);
    }

    /// Check whether two handles refer to the same class
    #[inline]
    pub fn ptr_eq(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("phase", &state.phase)
            .field("members", &state.properties.len())
            .field("finalizer", &state.finalizer.is_some())
            .finish()
    }
}

/// Constructor used when a class was created without a hook
fn default_ctor(class: &str) -> NativeFn {
    let class = class.to_string();
    native_fn(move |_, _| {
        error!(target: "jsbind::class", class = %class, "check default ctor called");
        Ok(Value::undefined())
    })
}

fn record(issues: &mut Vec<InstallIssue>, class: &str, step: InstallStep, error: EngineError) {
    error!(target: "jsbind::class", class, %step, %error, "install step failed");
    issues.push(InstallIssue { step, error });
}

fn release<T, F>(engine: &mut dyn Engine, class: &str, what: &str, handle: &ObjectRef, op: F)
where
    F: FnOnce(&ObjectRef, &mut dyn Engine) -> EngineResult<T>,
{
    if let Err(err) = op(handle, engine) {
        error!(target: "jsbind::class", class, handle = what, %err, "failed to release handle");
    }
}

/// `Object.setPrototypeOf(class.prototype, super_proto)`
fn inherit(engine: &mut dyn Engine, class: Value, super_proto: Value) -> EngineResult<()> {
    debug!(target: "jsbind::class", "inherit begin");
    let global = engine.global();
    let object_class = engine.get_named_property(global, "Object")?;
    let set_proto = engine.get_named_property(object_class, "setPrototypeOf")?;
    if !engine.is_callable(set_proto) {
        return Err(EngineError::NotAFunction(set_proto));
    }
    let proto = engine.get_named_property(class, "prototype")?;
    engine.call_function(object_class, set_proto, &[proto, super_proto])?;
    debug!(target: "jsbind::class", "inherit end");
    Ok(())
}

fn rooted_prototype(engine: &mut dyn Engine, ctor: Value) -> EngineResult<ObjectRef> {
    let proto = engine.get_named_property(ctor, "prototype")?;
    let handle = ObjectRef::new(engine, proto)?;
    handle.root(engine)?;
    Ok(handle)
}
