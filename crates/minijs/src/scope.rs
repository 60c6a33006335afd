//! Parent-linked lexical environments.
//!
//! A [`Scope`] maps identifier names to values and optionally points at a
//! parent scope; the chain reachable from a frame is its scope chain. Scopes
//! are shared by reference: every closure holds the scope that was active at
//! its creation, so scopes stay alive as long as any closure (or running
//! frame) can still see them. A closure stored into its own capturing scope
//! forms an `Rc` cycle and is never collected — an accepted cost of not
//! running a cycle collector.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::Value;

/// The embedder-supplied ambient environment backing the global scope.
///
/// The global scope consults it on every lookup miss and creates bindings in
/// it on every assignment miss, so host-installed globals and guest-created
/// implicit globals live side by side and persist across runs.
pub type GlobalEnv = Rc<RefCell<HashMap<String, Value>>>;

/// One environment in a scope chain.
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
    /// Present only on the global scope.
    ambient: Option<GlobalEnv>,
}

impl Scope {
    /// Create the global scope on top of an ambient environment.
    pub fn global(ambient: GlobalEnv) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: None,
            ambient: Some(ambient),
        })
    }

    /// Create a child scope whose lookups fall through to `parent`.
    pub fn child(parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
            ambient: None,
        })
    }

    /// Declare `name` in this scope, bound to `undefined`.
    ///
    /// Declaring an already-bound name is a no-op: hoisted re-declarations
    /// and parameters sharing a name keep whatever value is already there.
    pub fn declare(&self, name: &str) {
        self.vars
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(Value::Undefined);
    }

    /// Declare `name` bound to `value` if it is not already bound here.
    ///
    /// Used for the implicit `this` binding and a named function
    /// expression's self-reference.
    pub fn declare_with(&self, name: &str, value: Value) {
        self.vars
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(value);
    }

    /// Look `name` up through the scope chain.
    ///
    /// The global scope falls back to the ambient environment and finally to
    /// `undefined` (the ambient environment behaves like a host object, so an
    /// absent global reads as `undefined` rather than failing — which is also
    /// what makes `typeof` usable on undeclared names). A chain that does not
    /// end in a global scope fails with an unresolved-reference error.
    pub fn load(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Ok(value.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.load(name);
        }
        match &self.ambient {
            Some(ambient) => Ok(ambient
                .borrow()
                .get(name)
                .cloned()
                .unwrap_or(Value::Undefined)),
            None => Err(Error::UnresolvedReference(name.to_string())),
        }
    }

    /// Assign `name` through the scope chain.
    ///
    /// Walks parents to the owning scope. The global scope silently creates
    /// a binding in the ambient environment when nothing in the chain owns
    /// the name; a chain without a global scope fails instead.
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        {
            let mut vars = self.vars.borrow_mut();
            if let Some(slot) = vars.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        if let Some(parent) = &self.parent {
            return parent.assign(name, value);
        }
        match &self.ambient {
            Some(ambient) => {
                ambient.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            None => Err(Error::UnresolvedReference(name.to_string())),
        }
    }
}
