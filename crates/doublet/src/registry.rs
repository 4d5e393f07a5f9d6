//! Method Registry
//!
//! Captures, installs and restores method implementations keyed by
//! (object identity, method name). Each key owns an explicit stack of
//! patches; a call resolves to the top of the stack, so nested patches
//! chain and removing one reveals the one below it.

use crate::object::{Method, Object};
use crate::result::{DoubleError, DoubleResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one installed patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(u64);

impl PatchId {
    fn next() -> Self {
        Self(NEXT_PATCH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for PatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "patch#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Patch {
    id: PatchId,
    implementation: Method,
}

/// Per-object method storage: own definitions plus patch stacks
#[derive(Debug, Default)]
pub(crate) struct MethodTable {
    definitions: BTreeMap<String, Method>,
    patches: BTreeMap<String, Vec<Patch>>,
}

impl MethodTable {
    pub(crate) fn define(&mut self, name: String, method: Method) {
        self.definitions.insert(name, method);
    }

    /// Top patch if any, else own definition
    pub(crate) fn lookup(&self, name: &str) -> Option<Method> {
        self.patches
            .get(name)
            .and_then(|stack| stack.last())
            .map(|patch| patch.implementation.clone())
            .or_else(|| self.definitions.get(name).cloned())
    }

    fn push_patch(&mut self, name: &str, implementation: Method) -> PatchId {
        let id = PatchId::next();
        self.patches
            .entry(name.to_string())
            .or_default()
            .push(Patch { id, implementation });
        id
    }

    fn remove_patch(&mut self, name: &str, id: PatchId) -> bool {
        let Some(stack) = self.patches.get_mut(name) else {
            return false;
        };
        let Some(pos) = stack.iter().position(|patch| patch.id == id) else {
            return false;
        };
        stack.remove(pos);
        if stack.is_empty() {
            self.patches.remove(name);
        }
        true
    }

    fn latest_patch(&self, name: &str) -> Option<PatchId> {
        self.patches
            .get(name)
            .and_then(|stack| stack.last())
            .map(|patch| patch.id)
    }

    pub(crate) fn contains_patch(&self, name: &str, id: PatchId) -> bool {
        self.patches
            .get(name)
            .is_some_and(|stack| stack.iter().any(|patch| patch.id == id))
    }

    pub(crate) fn patch_depth(&self, name: &str) -> usize {
        self.patches.get(name).map_or(0, Vec::len)
    }

    pub(crate) fn defined_names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    pub(crate) fn patched_names(&self) -> Vec<String> {
        self.patches.keys().cloned().collect()
    }
}

/// Engine-facing operations over object method tables
#[derive(Debug)]
pub struct MethodRegistry;

impl MethodRegistry {
    /// Capture the implementation a call to `method` would run right now
    ///
    /// Covers own, inherited and class-level definitions, and returns the
    /// innermost active patch when the method is already stubbed.
    pub fn capture(target: &Object, method: &str) -> DoubleResult<Method> {
        target
            .resolve(method)
            .ok_or_else(|| DoubleError::UnknownMethod {
                target: target.label().to_string(),
                method: method.to_string(),
            })
    }

    /// Install `implementation` as the top patch for `method` on `target`
    ///
    /// The patch lives on `target` itself, so other objects sharing the
    /// same parent are unaffected.
    pub fn install(target: &Object, method: &str, implementation: Method) -> PatchId {
        let id = target.table().borrow_mut().push_patch(method, implementation);
        tracing::debug!(object = %target.label(), method, patch = %id, "patch installed");
        id
    }

    /// Remove the patch `id`; returns `false` if it was already gone
    pub fn restore(target: &Object, method: &str, id: PatchId) -> bool {
        let removed = target.table().borrow_mut().remove_patch(method, id);
        if removed {
            tracing::debug!(object = %target.label(), method, patch = %id, "patch restored");
        } else {
            tracing::debug!(
                object = %target.label(),
                method,
                patch = %id,
                "patch already removed"
            );
        }
        removed
    }

    /// Most recently installed patch for `method` on `target`
    #[must_use]
    pub fn latest(target: &Object, method: &str) -> Option<PatchId> {
        target.table().borrow().latest_patch(method)
    }
}
