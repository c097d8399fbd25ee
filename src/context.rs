//! Rendering context: a stack of variable scopes for one render call
//!
//! The context owns everything that must live for the whole render: the
//! root scope (globals), the component registry and the sequential id
//! counters. Scopes pushed on top of the root are released through
//! [`ScopeGuard`], which pops on drop so every exit path restores the stack.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use crate::component::ComponentRegistry;
use crate::renderer::RenderConfig;
use crate::value::Value;

/// One mapping layer of the context
pub type Scope = HashMap<String, Value>;

/// Mutable state for a single, sequential render
#[derive(Debug)]
pub struct Context<'t> {
    /// `scopes[0]` is the root scope and is never popped
    scopes: Vec<Scope>,
    registry: ComponentRegistry<'t>,
    id_counters: HashMap<String, u64>,
    autoescape: bool,
}

impl Default for Context<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t> Context<'t> {
    /// Create a context with an empty root scope and autoescaping on
    pub fn new() -> Self {
        Self::with_globals(Scope::new())
    }

    /// Create a context whose root scope holds `globals`
    pub fn with_globals(globals: Scope) -> Self {
        Self {
            scopes: vec![globals],
            registry: ComponentRegistry::new(),
            id_counters: HashMap::new(),
            autoescape: true,
        }
    }

    /// Create a context from render configuration
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::with_globals(config.globals.clone()).with_autoescape(config.autoescape)
    }

    /// Enable or disable escaping of `{{ }}` output
    pub fn with_autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }

    pub fn autoescape(&self) -> bool {
        self.autoescape
    }

    /// Push a scope; prefer [`Context::scoped`] so the pop cannot be missed
    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Pop the innermost scope. The root scope is never removed.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Push `scope` and return a guard that pops it when dropped
    pub fn scoped(&mut self, scope: Scope) -> ScopeGuard<'_, 't> {
        self.push(scope);
        ScopeGuard { context: self }
    }

    /// Number of scopes on the stack, root included
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Look up a name, innermost scope first
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Bind a name in the innermost scope
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    pub fn registry(&self) -> &ComponentRegistry<'t> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry<'t> {
        &mut self.registry
    }

    /// Next id for `prefix`: `prefix-1`, `prefix-2`, ...
    pub fn next_id(&mut self, prefix: &str) -> String {
        let counter = self.id_counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{}-{}", prefix, counter)
    }
}

/// A pushed scope that is popped when the guard goes out of scope
pub struct ScopeGuard<'c, 't> {
    context: &'c mut Context<'t>,
}

impl<'t> Deref for ScopeGuard<'_, 't> {
    type Target = Context<'t>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for ScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.context.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, Value)]) -> Scope {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_innermost_wins() {
        let mut ctx = Context::with_globals(scope(&[("a", Value::from("root"))]));
        assert_eq!(ctx.get("a"), Some(&Value::from("root")));

        ctx.push(scope(&[("a", Value::from("inner"))]));
        assert_eq!(ctx.get("a"), Some(&Value::from("inner")));

        ctx.pop();
        assert_eq!(ctx.get("a"), Some(&Value::from("root")));
    }

    #[test]
    fn test_root_is_never_popped() {
        let mut ctx = Context::new();
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.pop().is_none());
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let mut ctx = Context::new();
        {
            let mut guard = ctx.scoped(scope(&[("x", Value::Bool(true))]));
            assert_eq!(guard.depth(), 2);
            guard.set("y", Value::from("set"));
            assert_eq!(guard.get("y"), Some(&Value::from("set")));
        }
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.get("x"), None);
        assert_eq!(ctx.get("y"), None);
    }

    #[test]
    fn test_guard_pops_on_early_return() {
        fn fails(ctx: &mut Context<'_>) -> Result<(), ()> {
            let guard = ctx.scoped(Scope::new());
            if guard.depth() > 1 {
                return Err(());
            }
            Ok(())
        }

        let mut ctx = Context::new();
        assert!(fails(&mut ctx).is_err());
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_id_counters_per_prefix() {
        let mut ctx = Context::new();
        assert_eq!(ctx.next_id("input"), "input-1");
        assert_eq!(ctx.next_id("input"), "input-2");
        assert_eq!(ctx.next_id("label"), "label-1");
    }
}
