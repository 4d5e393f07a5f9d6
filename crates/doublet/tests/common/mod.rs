//! Shared fixtures for integration tests.

#![allow(dead_code)]

use doublet::prelude::*;

/// `Subject` with `foo`, `bar`, `baz(value)` and a class-level `foo`
pub fn subject_class() -> Class {
    doublet::logging::init_test_logging();
    let class = Class::new("Subject");
    class
        .define("foo", Arity::Exact(0), |_, _| Ok(Value::from("foo")))
        .define("bar", Arity::Exact(0), |_, _| Ok(Value::from("bar")))
        .define("baz", Arity::Exact(1), |_, args| Ok(args[0].clone()))
        .define_class_method("foo", Arity::Exact(0), |_, _| Ok(Value::from("foo")));
    class
}

/// A fresh `Subject` instance
pub fn subject() -> Object {
    subject_class().new_instance()
}

/// Call a zero-argument method, panicking on error
pub fn call0(target: &Object, method: &str) -> Value {
    target
        .call(method, &[])
        .unwrap_or_else(|e| panic!("{method} failed: {e}"))
}
