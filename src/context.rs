//! Reference script engine
//!
//! The Context owns the object heap, the persistent reference table and the
//! class records, and implements [`Engine`] on top of them. It has no parser
//! or interpreter: script-visible behavior is whatever native callbacks do.
//!
//! Roots for collection are the builtin objects (global, `Object`,
//! `Object.prototype`, `Function.prototype`), every reference with a non-zero
//! count, and the receiver/arguments of native calls currently on the stack.

use std::any::Any;
use std::mem;

use tracing::{debug, trace};

use crate::builtins;
use crate::engine::{CallInfo, ClassDefinition, Engine, Finalizer, NativeFn, Reference, TeardownHook};
use crate::error::{EngineError, EngineResult};
use crate::gc::{GcStats, Heap, HeapStats, ReferenceTable};
use crate::runtime::{ClassId, FunctionKind, JSObject, NativeFunction, PropertySlot, StringTable};
use crate::value::Value;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Maximum number of live heap objects
    pub max_objects: usize,
}

impl ContextOptions {
    /// Smallest heap that fits the builtins with room to spare
    pub const MIN_OBJECTS: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            max_objects: 64 * 1024,
        }
    }
}

/// Runtime record of a defined class
struct ClassRecord {
    name: String,
    finalizer: Option<Finalizer>,
}

/// Script engine context
pub struct Context {
    heap: Heap,
    atoms: StringTable,
    references: ReferenceTable,
    /// Indexed by `ClassId::User`
    classes: Vec<ClassRecord>,

    global: Value,
    object_prototype: Value,
    function_prototype: Value,
    object_constructor: Value,

    /// Values kept alive while native callbacks run
    stack_roots: Vec<Value>,

    after_teardown: Vec<TeardownHook>,
    torn_down: bool,
}

impl Context {
    /// Create a context with the builtins installed
    ///
    /// # Panics
    /// Panics if `options.max_objects` is below [`ContextOptions::MIN_OBJECTS`]
    pub fn new(options: ContextOptions) -> EngineResult<Self> {
        assert!(
            options.max_objects >= ContextOptions::MIN_OBJECTS,
            "Heap must hold at least {} objects",
            ContextOptions::MIN_OBJECTS
        );

        let mut heap = Heap::new(options.max_objects);
        let object_prototype = Value::object(heap.alloc(JSObject::new(ClassId::Object, Value::null()))?);
        let function_prototype = Value::object(heap.alloc(JSObject::new(ClassId::Object, object_prototype))?);
        let global = Value::object(heap.alloc(JSObject::new(ClassId::Object, object_prototype))?);

        let mut ctx = Context {
            heap,
            atoms: StringTable::new(),
            references: ReferenceTable::new(),
            classes: Vec::new(),
            global,
            object_prototype,
            function_prototype,
            object_constructor: Value::undefined(),
            stack_roots: Vec::new(),
            after_teardown: Vec::new(),
            torn_down: false,
        };
        ctx.object_constructor = builtins::object::install(&mut ctx)?;
        Ok(ctx)
    }

    /// `Object.prototype`
    #[inline]
    pub fn object_prototype(&self) -> Value {
        self.object_prototype
    }

    /// `Function.prototype`
    #[inline]
    pub fn function_prototype(&self) -> Value {
        self.function_prototype
    }

    /// Class id of an object
    pub fn class_of(&self, value: Value) -> EngineResult<ClassId> {
        self.object(value).map(|obj| obj.class_id)
    }

    /// Name a user class was defined with
    pub fn class_name(&self, class_id: ClassId) -> Option<&str> {
        match class_id {
            ClassId::User(idx) => self.classes.get(idx as usize).map(|c| c.name.as_str()),
            _ => None,
        }
    }

    /// Check whether an object value is still live
    #[inline]
    pub fn is_live(&self, value: Value) -> bool {
        self.object(value).is_ok()
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Get heap usage statistics
    pub fn memory_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    fn object(&self, value: Value) -> EngineResult<&JSObject> {
        value
            .to_object()
            .and_then(|id| self.heap.get(id))
            .ok_or(EngineError::InvalidObject(value))
    }

    fn object_mut(&mut self, value: Value) -> EngineResult<&mut JSObject> {
        value
            .to_object()
            .and_then(|id| self.heap.get_mut(id))
            .ok_or(EngineError::InvalidObject(value))
    }

    fn alloc(&mut self, object: JSObject) -> EngineResult<Value> {
        if self.torn_down {
            return Err(EngineError::TornDown);
        }
        self.heap.alloc(object).map(Value::object)
    }

    /// Allocate a function object
    pub(crate) fn new_function(&mut self, function: NativeFunction) -> EngineResult<Value> {
        let proto = self.function_prototype;
        self.alloc(JSObject::function(function, proto))
    }

    /// Define an own data property, bypassing setters
    pub(crate) fn define_value(&mut self, object: Value, name: &str, value: Value) -> EngineResult<()> {
        let atom = self.atoms.intern(name);
        self.object_mut(object)?.props.set(atom, value);
        Ok(())
    }

    /// Run a native callback with its receiver and arguments rooted
    fn invoke(&mut self, callback: NativeFn, call: CallInfo) -> EngineResult<Value> {
        let depth = self.stack_roots.len();
        self.stack_roots.push(call.this);
        self.stack_roots.push(call.new_target);
        self.stack_roots.extend_from_slice(&call.args);

        let engine: &mut dyn Engine = &mut *self;
        let result = callback(engine, &call);

        self.stack_roots.truncate(depth);
        result
    }

    /// Collect unreachable objects and run finalizers for them
    pub fn gc(&mut self) -> GcStats {
        let mut roots = vec![
            self.global,
            self.object_prototype,
            self.function_prototype,
            self.object_constructor,
        ];
        roots.extend(self.references.roots());
        roots.extend_from_slice(&self.stack_roots);

        let collection = self.heap.collect(&roots);
        let finalized = self.finalize(collection.swept);
        debug!(
            target: "jsbind::gc",
            before = collection.stats.objects_before,
            after = collection.stats.objects_after,
            finalized,
            "collection finished"
        );
        collection.stats
    }

    /// Run class finalizers on reclaimed objects, returns how many ran
    fn finalize(&mut self, objects: Vec<JSObject>) -> usize {
        let mut finalized = 0;
        for object in objects {
            let ClassId::User(idx) = object.class_id else {
                continue;
            };
            let Some(data) = object.opaque else {
                continue;
            };
            let Some(finalizer) = self.classes.get(idx as usize).and_then(|c| c.finalizer.clone()) else {
                continue;
            };
            trace!(target: "jsbind::gc", class = %self.classes[idx as usize].name, "finalizing instance");
            let engine: &mut dyn Engine = &mut *self;
            finalizer(engine, data);
            finalized += 1;
        }
        finalized
    }

    /// Tear the engine down
    ///
    /// Finalizes every remaining instance, drops the heap and all references,
    /// then runs the after-teardown hooks in registration order. Runs once;
    /// later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let objects = self.heap.drain();
        let count = objects.len();
        let finalized = self.finalize(objects);
        self.references.clear();
        self.stack_roots.clear();
        debug!(target: "jsbind::gc", objects = count, finalized, "engine torn down");

        for hook in mem::take(&mut self.after_teardown) {
            hook();
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Engine for Context {
    fn global(&self) -> Value {
        self.global
    }

    fn create_object(&mut self) -> EngineResult<Value> {
        let proto = self.object_prototype;
        self.alloc(JSObject::new(ClassId::Object, proto))
    }

    fn define_class(&mut self, def: ClassDefinition<'_>) -> EngineResult<Value> {
        let class_id = ClassId::User(self.classes.len() as u32);

        let proto = self.create_object()?;
        let ctor = self.new_function(NativeFunction::constructor(def.name, def.constructor.clone(), class_id))?;
        self.define_value(ctor, "prototype", proto)?;
        self.define_value(proto, "constructor", ctor)?;

        for prop in def.properties {
            let target = if prop.is_static() { ctor } else { proto };
            if let Some(method) = &prop.method {
                let func = self.new_function(NativeFunction::new(&prop.name, method.clone(), FunctionKind::Method))?;
                self.define_value(target, &prop.name, func)?;
            } else if prop.getter.is_some() || prop.setter.is_some() {
                let atom = self.atoms.intern(&prop.name);
                self.object_mut(target)?
                    .props
                    .define_accessor(atom, prop.getter.clone(), prop.setter.clone());
            } else {
                return Err(EngineError::TypeError(format!(
                    "property '{}' has neither method nor accessor",
                    prop.name
                )));
            }
        }

        self.classes.push(ClassRecord {
            name: def.name.to_string(),
            finalizer: def.finalizer,
        });
        Ok(ctor)
    }

    fn create_reference(&mut self, value: Value, initial_count: u32) -> EngineResult<Reference> {
        self.object(value)?;
        Ok(self.references.create(value, initial_count))
    }

    fn reference_value(&self, reference: Reference) -> EngineResult<Value> {
        let value = self.references.value(reference)?;
        if self.is_live(value) {
            Ok(value)
        } else {
            Ok(Value::undefined())
        }
    }

    fn reference_ref(&mut self, reference: Reference) -> EngineResult<u32> {
        self.references.inc(reference)
    }

    fn reference_unref(&mut self, reference: Reference) -> EngineResult<u32> {
        self.references.dec(reference)
    }

    fn reference_count(&self, reference: Reference) -> EngineResult<u32> {
        self.references.count(reference)
    }

    fn delete_reference(&mut self, reference: Reference) -> EngineResult<()> {
        self.references.delete(reference)
    }

    fn get_named_property(&mut self, object: Value, name: &str) -> EngineResult<Value> {
        let Some(atom) = self.atoms.lookup(name) else {
            // Never interned, so no object can have it
            self.object(object)?;
            return Ok(Value::undefined());
        };

        let mut current = object;
        loop {
            let obj = self.object(current)?;
            let slot = obj.props.get(atom).cloned();
            let proto = obj.proto;

            match slot {
                Some(PropertySlot::Value(value)) => return Ok(value),
                Some(PropertySlot::Accessor { getter: Some(getter), .. }) => {
                    return self.invoke(getter, CallInfo::new(object, &[]));
                }
                Some(PropertySlot::Accessor { getter: None, .. }) => return Ok(Value::undefined()),
                None if proto.is_object() => current = proto,
                None => return Ok(Value::undefined()),
            }
        }
    }

    fn set_named_property(&mut self, object: Value, name: &str, value: Value) -> EngineResult<()> {
        let atom = self.atoms.intern(name);

        let mut current = object;
        loop {
            let obj = self.object(current)?;
            let slot = obj.props.get(atom).cloned();
            let proto = obj.proto;

            match slot {
                Some(PropertySlot::Accessor { setter: Some(setter), .. }) => {
                    self.invoke(setter, CallInfo::new(object, &[value]))?;
                    return Ok(());
                }
                Some(PropertySlot::Accessor { setter: None, .. }) => {
                    return Err(EngineError::ReadOnlyProperty(name.to_string()));
                }
                Some(PropertySlot::Value(_)) => break,
                None if proto.is_object() => current = proto,
                None => break,
            }
        }

        // Own data property, shadowing any inherited one
        self.object_mut(object)?.props.set(atom, value);
        Ok(())
    }

    fn delete_named_property(&mut self, object: Value, name: &str) -> EngineResult<bool> {
        let Some(atom) = self.atoms.lookup(name) else {
            self.object(object)?;
            return Ok(false);
        };
        Ok(self.object_mut(object)?.props.delete(atom))
    }

    fn set_prototype_of(&mut self, object: Value, proto: Value) -> EngineResult<()> {
        self.object(object)?;
        if !proto.is_null() && !proto.is_object() {
            return Err(EngineError::TypeError(
                "Object prototype may only be an Object or null".to_string(),
            ));
        }

        let mut current = proto;
        while current.is_object() {
            if current == object {
                return Err(EngineError::PrototypeCycle);
            }
            current = self.object(current)?.proto;
        }

        self.object_mut(object)?.proto = proto;
        Ok(())
    }

    fn get_prototype_of(&self, object: Value) -> EngineResult<Value> {
        self.object(object).map(|obj| obj.proto)
    }

    fn is_callable(&self, value: Value) -> bool {
        self.object(value).is_ok_and(JSObject::is_function)
    }

    fn call_function(&mut self, this: Value, func: Value, args: &[Value]) -> EngineResult<Value> {
        let callback = self
            .object(func)?
            .function
            .as_ref()
            .map(|f| f.callback.clone())
            .ok_or(EngineError::NotAFunction(func))?;
        self.invoke(callback, CallInfo::new(this, args))
    }

    fn new_instance(&mut self, constructor: Value, args: &[Value]) -> EngineResult<Value> {
        let (callback, class_id) = self
            .object(constructor)?
            .function
            .as_ref()
            .filter(|f| f.is_constructor())
            .map(|f| (f.callback.clone(), f.instance_class.unwrap_or(ClassId::Object)))
            .ok_or(EngineError::NotAConstructor(constructor))?;

        let proto = match self.get_named_property(constructor, "prototype")? {
            proto if proto.is_object() => proto,
            _ => self.object_prototype,
        };
        let instance = self.alloc(JSObject::new(class_id, proto))?;

        let call = CallInfo {
            this: instance,
            args: args.to_vec(),
            new_target: constructor,
        };
        let result = self.invoke(callback, call)?;
        Ok(if result.is_object() { result } else { instance })
    }

    fn wrap(&mut self, object: Value, data: Box<dyn Any>) -> EngineResult<()> {
        let obj = self.object_mut(object)?;
        if obj.opaque.is_some() {
            return Err(EngineError::AlreadyWrapped);
        }
        obj.opaque = Some(data);
        Ok(())
    }

    fn unwrap(&self, object: Value) -> EngineResult<Option<&dyn Any>> {
        Ok(self.object(object)?.opaque.as_deref())
    }

    fn unwrap_mut(&mut self, object: Value) -> EngineResult<Option<&mut dyn Any>> {
        Ok(self.object_mut(object)?.opaque.as_deref_mut())
    }

    fn remove_wrap(&mut self, object: Value) -> EngineResult<Option<Box<dyn Any>>> {
        Ok(self.object_mut(object)?.opaque.take())
    }

    fn add_after_teardown_hook(&mut self, hook: TeardownHook) {
        if self.torn_down {
            debug!(target: "jsbind::gc", "engine already torn down, running hook now");
            hook();
            return;
        }
        self.after_teardown.push(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{finalizer, native_fn, Placement, PropertyDescriptor};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn context() -> Context {
        Context::new(ContextOptions::default()).unwrap()
    }

    fn empty_ctor() -> NativeFn {
        native_fn(|_, _| Ok(Value::undefined()))
    }

    fn define(ctx: &mut Context, name: &str, properties: &[PropertyDescriptor]) -> Value {
        ctx.define_class(ClassDefinition {
            name,
            constructor: empty_ctor(),
            finalizer: None,
            properties,
        })
        .unwrap()
    }

    #[test]
    fn test_create_context() {
        let ctx = context();
        let stats = ctx.memory_stats();
        assert_eq!(stats.capacity, 64 * 1024);
        assert!(stats.live >= 4);
        assert!(!ctx.is_torn_down());
    }

    #[test]
    #[should_panic(expected = "Heap must hold at least")]
    fn test_heap_too_small() {
        let _ = Context::new(ContextOptions::new().max_objects(8));
    }

    #[test]
    fn test_builtin_object() {
        let mut ctx = context();
        let global = ctx.global();
        let object = ctx.get_named_property(global, "Object").unwrap();

        assert!(ctx.is_callable(object));
        let set_proto = ctx.get_named_property(object, "setPrototypeOf").unwrap();
        assert!(ctx.is_callable(set_proto));
        assert_eq!(ctx.get_named_property(object, "prototype").unwrap(), ctx.object_prototype());
        assert_eq!(ctx.get_prototype_of(global).unwrap(), ctx.object_prototype());
        assert!(ctx.get_prototype_of(ctx.object_prototype()).unwrap().is_null());
    }

    #[test]
    fn test_plain_properties() {
        let mut ctx = context();
        let obj = ctx.create_object().unwrap();

        assert!(ctx.get_named_property(obj, "x").unwrap().is_undefined());
        ctx.set_named_property(obj, "x", Value::int(3)).unwrap();
        assert_eq!(ctx.get_named_property(obj, "x").unwrap(), Value::int(3));

        assert!(ctx.delete_named_property(obj, "x").unwrap());
        assert!(!ctx.delete_named_property(obj, "x").unwrap());
        assert!(ctx.get_named_property(obj, "x").unwrap().is_undefined());
    }

    #[test]
    fn test_invalid_object() {
        let mut ctx = context();
        assert_eq!(
            ctx.get_named_property(Value::int(1), "x"),
            Err(EngineError::InvalidObject(Value::int(1)))
        );
        assert!(ctx.set_named_property(Value::null(), "x", Value::int(1)).is_err());
    }

    #[test]
    fn test_define_class_layout() {
        let mut ctx = context();
        let props = [
            PropertyDescriptor::method("area", native_fn(|_, _| Ok(Value::int(4))), Placement::Instance),
            PropertyDescriptor::method("unit", native_fn(|_, _| Ok(Value::int(1))), Placement::Static),
        ];
        let ctor = define(&mut ctx, "Square", &props);
        let proto = ctx.get_named_property(ctor, "prototype").unwrap();

        assert_eq!(ctx.get_named_property(proto, "constructor").unwrap(), ctor);
        let area = ctx.get_named_property(proto, "area").unwrap();
        assert!(ctx.is_callable(area));
        assert!(ctx.get_named_property(proto, "unit").unwrap().is_undefined());

        let unit = ctx.get_named_property(ctor, "unit").unwrap();
        assert_eq!(ctx.call_function(ctor, unit, &[]).unwrap(), Value::int(1));
        assert_eq!(ctx.get_prototype_of(proto).unwrap(), ctx.object_prototype());
    }

    #[test]
    fn test_define_class_rejects_empty_entry() {
        let mut ctx = context();
        let props = [PropertyDescriptor::accessor("x", None, None, Placement::Instance)];
        let result = ctx.define_class(ClassDefinition {
            name: "Broken",
            constructor: empty_ctor(),
            finalizer: None,
            properties: &props,
        });
        assert!(matches!(result, Err(EngineError::TypeError(_))));
    }

    #[test]
    fn test_accessors_and_read_only() {
        let mut ctx = context();
        let stored = Rc::new(Cell::new(0));
        let setter_calls = Rc::new(Cell::new(0));

        let get = {
            let stored = stored.clone();
            native_fn(move |_, _| Ok(Value::int(stored.get())))
        };
        let set = {
            let stored = stored.clone();
            let setter_calls = setter_calls.clone();
            native_fn(move |_, call| {
                setter_calls.set(setter_calls.get() + 1);
                stored.set(call.arg(0).to_i32().unwrap_or(0));
                Ok(Value::undefined())
            })
        };
        let props = [
            PropertyDescriptor::accessor("x", Some(get.clone()), Some(set), Placement::Instance),
            PropertyDescriptor::accessor("readonly", Some(get), None, Placement::Instance),
        ];
        let ctor = define(&mut ctx, "Cell", &props);
        let obj = ctx.new_instance(ctor, &[]).unwrap();

        ctx.set_named_property(obj, "x", Value::int(9)).unwrap();
        assert_eq!(ctx.get_named_property(obj, "x").unwrap(), Value::int(9));
        assert_eq!(setter_calls.get(), 1);

        assert_eq!(
            ctx.set_named_property(obj, "readonly", Value::int(1)),
            Err(EngineError::ReadOnlyProperty("readonly".to_string()))
        );
        assert_eq!(setter_calls.get(), 1);
        assert_eq!(ctx.get_named_property(obj, "readonly").unwrap(), Value::int(9));
    }

    #[test]
    fn test_new_instance() {
        let mut ctx = context();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let ctor_fn = {
            let seen = seen.clone();
            native_fn(move |_, call| {
                seen.borrow_mut().push((call.this, call.arg(0), call.is_construct_call()));
                Ok(Value::undefined())
            })
        };
        let ctor = ctx
            .define_class(ClassDefinition {
                name: "Thing",
                constructor: ctor_fn,
                finalizer: None,
                properties: &[],
            })
            .unwrap();

        let obj = ctx.new_instance(ctor, &[Value::int(5)]).unwrap();
        let proto = ctx.get_named_property(ctor, "prototype").unwrap();

        assert_eq!(ctx.get_prototype_of(obj).unwrap(), proto);
        assert_eq!(seen.borrow().as_slice(), &[(obj, Value::int(5), true)]);
        assert_eq!(ctx.class_name(ctx.class_of(obj).unwrap()), Some("Thing"));
    }

    #[test]
    fn test_new_instance_requires_constructor() {
        let mut ctx = context();
        let obj = ctx.create_object().unwrap();
        assert_eq!(ctx.new_instance(obj, &[]), Err(EngineError::NotAConstructor(obj)));

        let props = [PropertyDescriptor::method("m", empty_ctor(), Placement::Static)];
        let ctor = define(&mut ctx, "HasMethod", &props);
        let method = ctx.get_named_property(ctor, "m").unwrap();
        assert_eq!(ctx.new_instance(method, &[]), Err(EngineError::NotAConstructor(method)));
        assert_eq!(ctx.call_function(Value::undefined(), obj, &[]), Err(EngineError::NotAFunction(obj)));
    }

    #[test]
    fn test_set_prototype_of() {
        let mut ctx = context();
        let a = ctx.create_object().unwrap();
        let b = ctx.create_object().unwrap();

        ctx.set_prototype_of(b, a).unwrap();
        assert_eq!(ctx.get_prototype_of(b).unwrap(), a);
        assert!(ctx.has_in_prototype_chain(b, ctx.object_prototype()).unwrap());

        assert_eq!(ctx.set_prototype_of(a, b), Err(EngineError::PrototypeCycle));
        assert_eq!(ctx.set_prototype_of(a, a), Err(EngineError::PrototypeCycle));
        assert!(matches!(ctx.set_prototype_of(a, Value::int(1)), Err(EngineError::TypeError(_))));

        ctx.set_prototype_of(a, Value::null()).unwrap();
        assert!(!ctx.has_in_prototype_chain(b, ctx.object_prototype()).unwrap());
    }

    #[test]
    fn test_references_root_objects() {
        let mut ctx = context();
        let kept = ctx.create_object().unwrap();
        let weak = ctx.create_object().unwrap();

        let strong_ref = ctx.create_reference(kept, 1).unwrap();
        let weak_ref = ctx.create_reference(weak, 0).unwrap();

        let stats = ctx.gc();
        assert_eq!(stats.freed(), 1);
        assert_eq!(ctx.reference_value(strong_ref).unwrap(), kept);
        assert!(ctx.reference_value(weak_ref).unwrap().is_undefined());

        assert_eq!(ctx.reference_unref(strong_ref), Ok(0));
        ctx.gc();
        assert!(ctx.reference_value(strong_ref).unwrap().is_undefined());
        assert!(ctx.create_reference(Value::int(1), 1).is_err());
    }

    #[test]
    fn test_finalizer_runs_on_collection() {
        let mut ctx = context();
        let finalized = Rc::new(RefCell::new(Vec::new()));
        let fin = {
            let finalized = finalized.clone();
            finalizer(move |_, data| {
                if let Ok(n) = data.downcast::<i32>() {
                    finalized.borrow_mut().push(*n);
                }
            })
        };
        let ctor = ctx
            .define_class(ClassDefinition {
                name: "Boxed",
                constructor: native_fn(|engine, call| {
                    engine.wrap(call.this, Box::new(call.arg(0).to_i32().unwrap_or(0)))?;
                    Ok(Value::undefined())
                }),
                finalizer: Some(fin),
                properties: &[],
            })
            .unwrap();
        let ctor_ref = ctx.create_reference(ctor, 1).unwrap();

        let kept = ctx.new_instance(ctor, &[Value::int(1)]).unwrap();
        ctx.new_instance(ctor, &[Value::int(2)]).unwrap();
        let _kept_ref = ctx.create_reference(kept, 1).unwrap();

        ctx.gc();
        assert_eq!(finalized.borrow().as_slice(), &[2]);

        // Survivors are finalized at teardown, exactly once
        ctx.teardown();
        assert_eq!(finalized.borrow().as_slice(), &[2, 1]);
        ctx.teardown();
        assert_eq!(finalized.borrow().len(), 2);
        assert!(ctx.reference_value(ctor_ref).is_err());
    }

    #[test]
    fn test_wrap() {
        let mut ctx = context();
        let obj = ctx.create_object().unwrap();

        assert!(ctx.unwrap(obj).unwrap().is_none());
        ctx.wrap(obj, Box::new(7u8)).unwrap();
        assert_eq!(ctx.wrap(obj, Box::new(8u8)), Err(EngineError::AlreadyWrapped));

        if let Some(n) = ctx.unwrap_mut(obj).unwrap().and_then(|d| d.downcast_mut::<u8>()) {
            *n += 1;
        }
        assert_eq!(ctx.unwrap(obj).unwrap().and_then(|d| d.downcast_ref::<u8>()), Some(&8));

        let data = ctx.remove_wrap(obj).unwrap().unwrap();
        assert_eq!(data.downcast_ref::<u8>(), Some(&8));
        assert!(ctx.unwrap(obj).unwrap().is_none());
    }

    #[test]
    fn test_teardown_hooks_run_in_order_once() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = context();
        for i in 0..3 {
            let order = order.clone();
            ctx.add_after_teardown_hook(Box::new(move || order.borrow_mut().push(i)));
        }

        assert!(order.borrow().is_empty());
        ctx.teardown();
        assert_eq!(order.borrow().as_slice(), &[0, 1, 2]);
        assert!(ctx.is_torn_down());
        assert_eq!(ctx.create_object(), Err(EngineError::TornDown));

        drop(ctx);
        assert_eq!(order.borrow().len(), 3);
    }

    #[test]
    fn test_drop_runs_teardown() {
        let ran = Rc::new(Cell::new(false));
        {
            let mut ctx = context();
            let ran = ran.clone();
            ctx.add_after_teardown_hook(Box::new(move || ran.set(true)));
        }
        assert!(ran.get());
    }

    #[test]
    fn test_callback_receives_this() {
        let mut ctx = context();
        let props = [PropertyDescriptor::method(
            "attach",
            native_fn(|engine, call| {
                let probe = engine.create_object()?;
                engine.set_named_property(call.this, "probe", probe)?;
                Ok(probe)
            }),
            Placement::Static,
        )];
        let ctor = define(&mut ctx, "Holder", &props);
        let method = ctx.get_named_property(ctor, "attach").unwrap();
        let holder = ctx.create_object().unwrap();

        let probe = ctx.call_function(holder, method, &[]).unwrap();
        assert!(ctx.is_live(probe));
        assert_eq!(ctx.get_named_property(holder, "probe").unwrap(), probe);
    }
}
