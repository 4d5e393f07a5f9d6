//! Patchable Objects
//!
//! Rust cannot rebind methods on a live value, so targets are accessed
//! through an [`Object`] handle whose calls go through a method table.
//! Instances and class-level receivers are both plain `Object`s; a
//! [`Class`] only wires their parent chains together.
//!
//! ## Resolution Order
//!
//! ```text
//! receiver: patch stack top -> own definition
//!     └── parent: patch stack top -> own definition
//!             └── ...
//! ```

use crate::registry::MethodTable;
use crate::result::{DoubleError, DoubleResult};
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`Object`]; patches are keyed by it, never by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Number of positional arguments a method accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments
    Exact(usize),
    /// `n` or more arguments
    AtLeast(usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    /// Check whether `given` arguments are acceptable
    #[must_use]
    pub const fn accepts(self, given: usize) -> bool {
        match self {
            Self::Exact(n) => given == n,
            Self::AtLeast(n) => given >= n,
            Self::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "{n}+"),
            Self::Any => f.write_str("any"),
        }
    }
}

type MethodBody = dyn Fn(&Object, &[Value]) -> DoubleResult<Value>;

/// A callable method implementation
///
/// Cloning is cheap; clones share the same body, which is how a captured
/// original stays callable after it has been shadowed by a patch.
#[derive(Clone)]
pub struct Method {
    arity: Arity,
    body: Rc<MethodBody>,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("arity", &self.arity)
            .field("body", &Rc::as_ptr(&self.body).cast::<()>())
            .finish()
    }
}

impl Method {
    /// Create a method with a declared arity
    pub fn new<F>(arity: Arity, body: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> DoubleResult<Value> + 'static,
    {
        Self {
            arity,
            body: Rc::new(body),
        }
    }

    /// Create a method accepting any number of arguments
    pub fn variadic<F>(body: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> DoubleResult<Value> + 'static,
    {
        Self::new(Arity::Any, body)
    }

    /// Create a zero-argument method returning a constant
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(Arity::Exact(0), move |_, _| Ok(value.clone()))
    }

    /// Declared arity
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Whether two handles share the same body
    #[must_use]
    pub fn same_body(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }

    /// Invoke with `receiver` bound as `self`
    pub fn invoke(&self, name: &str, receiver: &Object, args: &[Value]) -> DoubleResult<Value> {
        if !self.arity.accepts(args.len()) {
            return Err(DoubleError::Arity {
                method: name.to_string(),
                expected: self.arity,
                given: args.len(),
            });
        }
        (self.body)(receiver, args)
    }
}

struct ObjectInner {
    id: ObjectId,
    label: String,
    table: RefCell<MethodTable>,
    parent: Option<Object>,
}

/// A patchable handle to an object with a method table
///
/// Clones refer to the same object. Equality is identity.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.table.borrow();
        f.debug_struct("Object")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("methods", &table.defined_names())
            .field("patched", &table.patched_names())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Object {}

impl Object {
    /// Create a standalone object
    pub fn new(label: impl Into<String>) -> Self {
        Self::build(label.into(), None)
    }

    /// Create an object that falls back to `parent` for unresolved methods
    pub fn with_parent(label: impl Into<String>, parent: &Object) -> Self {
        Self::build(label.into(), Some(parent.clone()))
    }

    fn build(label: String, parent: Option<Object>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: ObjectId::next(),
                label,
                table: RefCell::new(MethodTable::default()),
                parent,
            }),
        }
    }

    /// Identity of this object
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    /// Label used in diagnostics
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Parent object, if any
    #[must_use]
    pub fn parent(&self) -> Option<&Object> {
        self.inner.parent.as_ref()
    }

    /// Define (or redefine) a method on this object
    pub fn define(&self, name: impl Into<String>, method: Method) -> &Self {
        self.inner.table.borrow_mut().define(name.into(), method);
        self
    }

    /// Define a method from a closure with the given arity
    pub fn define_fn<F>(&self, name: impl Into<String>, arity: Arity, body: F) -> &Self
    where
        F: Fn(&Object, &[Value]) -> DoubleResult<Value> + 'static,
    {
        self.define(name, Method::new(arity, body))
    }

    /// Resolve the implementation a call to `name` would run
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Method> {
        let mut current = Some(self);
        while let Some(object) = current {
            if let Some(method) = object.inner.table.borrow().lookup(name) {
                return Some(method);
            }
            current = object.parent();
        }
        None
    }

    /// Whether `name` resolves on this object or its ancestors
    #[must_use]
    pub fn responds_to(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Call a method by name
    ///
    /// The method table is not borrowed while the body runs, so bodies may
    /// freely call back into this object or patch it.
    pub fn call(&self, name: &str, args: &[Value]) -> DoubleResult<Value> {
        let method = self
            .resolve(name)
            .ok_or_else(|| DoubleError::UnknownMethod {
                target: self.label().to_string(),
                method: name.to_string(),
            })?;
        method.invoke(name, self, args)
    }

    /// Whether this object has an active patch for `name`
    #[must_use]
    pub fn is_patched(&self, name: &str) -> bool {
        self.patch_depth(name) > 0
    }

    /// Number of stacked patches for `name` on this object
    #[must_use]
    pub fn patch_depth(&self, name: &str) -> usize {
        self.inner.table.borrow().patch_depth(name)
    }

    /// Names of methods defined directly on this object
    #[must_use]
    pub fn method_names(&self) -> Vec<String> {
        self.inner.table.borrow().defined_names()
    }

    pub(crate) fn table(&self) -> &RefCell<MethodTable> {
        &self.inner.table
    }
}

/// A named type with class-level and instance-level method tables
///
/// `object()` receives class-level calls; `prototype()` holds the instance
/// methods shared by every `new_instance()`. Subclasses chain both.
#[derive(Debug, Clone)]
pub struct Class {
    name: String,
    object: Object,
    prototype: Object,
}

impl Class {
    /// Create a root class
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            object: Object::new(name.clone()),
            prototype: Object::new(format!("{name}#prototype")),
            name,
        }
    }

    /// Create a class inheriting from this one
    #[must_use]
    pub fn subclass(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            object: Object::with_parent(name.clone(), &self.object),
            prototype: Object::with_parent(format!("{name}#prototype"), &self.prototype),
            name,
        }
    }

    /// Class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class-level receiver
    #[must_use]
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Shared instance method table
    #[must_use]
    pub fn prototype(&self) -> &Object {
        &self.prototype
    }

    /// Define an instance method
    pub fn define<F>(&self, name: &str, arity: Arity, body: F) -> &Self
    where
        F: Fn(&Object, &[Value]) -> DoubleResult<Value> + 'static,
    {
        self.prototype.define_fn(name, arity, body);
        self
    }

    /// Define a class-level method
    pub fn define_class_method<F>(&self, name: &str, arity: Arity, body: F) -> &Self
    where
        F: Fn(&Object, &[Value]) -> DoubleResult<Value> + 'static,
    {
        self.object.define_fn(name, arity, body);
        self
    }

    /// Create a new instance
    #[must_use]
    pub fn new_instance(&self) -> Object {
        Object::with_parent(format!("#<{}>", self.name), &self.prototype)
    }
}
