//! Class registry and shutdown
//!
//! Every class is created through a [`ClassRegistry`] and stays registered
//! until the engine has torn down. Shutdown runs in two phases:
//!
//! 1. [`ClassRegistry::cleanup_all`] destroys every class in registration
//!    order, releasing the engine references they hold. This must happen
//!    while the engine is still alive.
//! 2. An after-teardown hook registered by `cleanup_all` drops the member
//!    tables and hooks of every class and empties the registry once the
//!    engine reports its own teardown finished.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

use tracing::{debug, trace};

use super::class::Class;
use super::construct::ConstructGate;
use super::object::ObjectRef;
use crate::engine::{Engine, NativeFn};
use crate::error::{BindError, BindResult};

/// Registry configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingOptions {
    /// Report degraded installs as errors
    pub strict_install: bool,
}

impl BindingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_install(mut self, strict: bool) -> Self {
        self.strict_install = strict;
        self
    }
}

/// Registry lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    /// Accepting new classes
    Open,
    /// Classes destroyed, waiting for engine teardown
    CleanedUp,
    /// Classes dropped, registry empty
    Drained,
}

struct RegistryInner {
    classes: RefCell<Vec<Class>>,
    gate: ConstructGate,
    options: BindingOptions,
    phase: Cell<RegistryPhase>,
}

/// Ordered set of every class created for an engine
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct ClassRegistry {
    inner: Rc<RegistryInner>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::with_options(BindingOptions::default())
    }

    pub fn with_options(options: BindingOptions) -> Self {
        ClassRegistry {
            inner: Rc::new(RegistryInner {
                classes: RefCell::new(Vec::new()),
                gate: ConstructGate::new(),
                options,
                phase: Cell::new(RegistryPhase::Open),
            }),
        }
    }

    #[inline]
    pub fn options(&self) -> BindingOptions {
        self.inner.options
    }

    /// Gate shared by every class of this registry
    pub fn construct_gate(&self) -> ConstructGate {
        self.inner.gate.clone()
    }

    #[inline]
    pub fn phase(&self) -> RegistryPhase {
        self.inner.phase.get()
    }

    /// Create and register a class
    ///
    /// `parent` is the namespace the class is published on at install,
    /// `parent_proto` the prototype its instances inherit from. Both handles
    /// gain a share for the lifetime of the class. Without a constructor hook
    /// the class gets a default constructor that only logs.
    pub fn create_class(
        &self,
        engine: &mut dyn Engine,
        name: &str,
        parent: Option<&ObjectRef>,
        parent_proto: Option<&ObjectRef>,
        constructor: Option<NativeFn>,
    ) -> BindResult<Class> {
        if self.phase() != RegistryPhase::Open {
            return Err(BindError::RegistryShutDown);
        }
        let class = Class::create(
            engine,
            name,
            parent,
            parent_proto,
            constructor,
            self.inner.gate.clone(),
            self.inner.options,
        )?;
        self.inner.classes.borrow_mut().push(class.clone());
        trace!(target: "jsbind::registry", class = name, count = self.len(), "class registered");
        Ok(class)
    }

    pub fn len(&self) -> usize {
        self.inner.classes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered classes in creation order
    pub fn classes(&self) -> Vec<Class> {
        self.inner.classes.borrow().clone()
    }

    /// First class registered under a name
    pub fn find(&self, name: &str) -> Option<Class> {
        self.inner
            .classes
            .borrow()
            .iter()
            .find(|class| class.name() == name)
            .cloned()
    }

    /// Destroy every class, then drop them all once the engine tore down
    ///
    /// Only the first call has an effect.
    pub fn cleanup_all(&self, engine: &mut dyn Engine) {
        if self.phase() != RegistryPhase::Open {
            debug!(target: "jsbind::registry", "cleanup already scheduled");
            return;
        }

        let classes = self.classes();
        debug!(target: "jsbind::registry", count = classes.len(), "destroying classes");
        for class in &classes {
            class.destroy(engine);
        }
        self.inner.phase.set(RegistryPhase::CleanedUp);

        let inner = Rc::clone(&self.inner);
        engine.add_after_teardown_hook(Box::new(move || {
            let classes = mem::take(&mut *inner.classes.borrow_mut());
            debug!(target: "jsbind::registry", count = classes.len(), "releasing classes");
            for class in &classes {
                class.release();
            }
            inner.phase.set(RegistryPhase::Drained);
        }));
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}
