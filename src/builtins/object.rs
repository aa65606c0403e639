//! Object constructor and its static helpers

use crate::context::Context;
use crate::engine::{native_fn, CallInfo, Engine};
use crate::error::EngineResult;
use crate::runtime::{ClassId, FunctionKind, NativeFunction};
use crate::value::Value;

/// Create `Object`, wire it to `Object.prototype` and publish it on the
/// global object. Returns the constructor.
pub(crate) fn install(ctx: &mut Context) -> EngineResult<Value> {
    let ctor = ctx.new_function(NativeFunction::constructor(
        "Object",
        native_fn(|_, _| Ok(Value::undefined())),
        ClassId::Object,
    ))?;

    let proto = ctx.object_prototype();
    ctx.define_value(ctor, "prototype", proto)?;
    ctx.define_value(proto, "constructor", ctor)?;

    let set_prototype_of = ctx.new_function(NativeFunction::new(
        "setPrototypeOf",
        native_fn(set_prototype_of),
        FunctionKind::Method,
    ))?;
    ctx.define_value(ctor, "setPrototypeOf", set_prototype_of)?;

    let get_prototype_of = ctx.new_function(NativeFunction::new(
        "getPrototypeOf",
        native_fn(|engine, call| engine.get_prototype_of(call.arg(0))),
        FunctionKind::Method,
    ))?;
    ctx.define_value(ctor, "getPrototypeOf", get_prototype_of)?;

    let global = ctx.global();
    ctx.define_value(global, "Object", ctor)?;
    Ok(ctor)
}

/// `Object.setPrototypeOf(obj, proto)`, returns `obj`
fn set_prototype_of(engine: &mut dyn Engine, call: &CallInfo) -> EngineResult<Value> {
    let target = call.arg(0);
    engine.set_prototype_of(target, call.arg(1))?;
    Ok(target)
}
