use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsbind::{native_fn, ClassRegistry, Context, ContextOptions, Engine, ObjectRef, Value};

fn bench_install(c: &mut Criterion) {
    c.bench_function("install 100 classes", |b| {
        b.iter(|| {
            let mut ctx = Context::new(ContextOptions::default()).unwrap();
            let registry = ClassRegistry::new();
            let global = ObjectRef::global(&mut ctx).unwrap();
            for i in 0..100 {
                let cls = registry
                    .create_class(&mut ctx, &format!("Class{}", i), Some(&global), None, None)
                    .unwrap();
                cls.define_function("update", native_fn(|_, _| Ok(Value::undefined())))
                    .unwrap();
                cls.define_property("x", Some(native_fn(|_, _| Ok(Value::int(0)))), None)
                    .unwrap();
                black_box(cls.install(&mut ctx).unwrap());
            }
            registry.cleanup_all(&mut ctx);
        })
    });
}

fn bench_inherit(c: &mut Criterion) {
    c.bench_function("install chain of 50", |b| {
        b.iter(|| {
            let mut ctx = Context::new(ContextOptions::default()).unwrap();
            let registry = ClassRegistry::new();
            let global = ObjectRef::global(&mut ctx).unwrap();
            let mut parent: Option<ObjectRef> = None;
            for i in 0..50 {
                let cls = registry
                    .create_class(&mut ctx, &format!("Level{}", i), Some(&global), parent.as_ref(), None)
                    .unwrap();
                black_box(cls.install(&mut ctx).unwrap());
                parent = cls.proto();
            }
        })
    });
}

fn bench_create_instance(c: &mut Criterion) {
    let mut ctx = Context::new(ContextOptions::default()).unwrap();
    let registry = ClassRegistry::new();
    let global = ObjectRef::global(&mut ctx).unwrap();
    let gate = registry.construct_gate();
    let ctor = native_fn(move |engine, call| {
        if gate.need_call_constructor() {
            engine.wrap(call.this, Box::new(0u64))?;
        }
        Ok(Value::undefined())
    });
    let cls = registry
        .create_class(&mut ctx, "Node", Some(&global), None, Some(ctor))
        .unwrap();
    cls.install(&mut ctx).unwrap();

    c.bench_function("create_instance 1k", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(cls.create_instance(&mut ctx).unwrap());
            }
            ctx.gc();
        })
    });

    c.bench_function("new_instance 1k", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(cls.new_instance(&mut ctx, &[]).unwrap());
            }
            ctx.gc();
        })
    });
}

fn bench_accessor(c: &mut Criterion) {
    let mut ctx = Context::new(ContextOptions::default()).unwrap();
    let registry = ClassRegistry::new();
    let cls = registry.create_class(&mut ctx, "Vec2", None, None, None).unwrap();
    cls.define_property("x", Some(native_fn(|_, _| Ok(Value::int(1)))), None)
        .unwrap();
    cls.install(&mut ctx).unwrap();
    let obj = cls.create_instance(&mut ctx).unwrap();

    c.bench_function("getter 10k", |b| {
        b.iter(|| {
            for _ in 0..10000 {
                black_box(ctx.get_named_property(obj, "x").unwrap());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_install,
    bench_inherit,
    bench_create_instance,
    bench_accessor,
);
criterion_main!(benches);
