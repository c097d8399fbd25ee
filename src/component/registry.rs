//! Component registry for storing and retrieving component definitions

use std::collections::HashMap;

use thiserror::Error;

use crate::context::Context;
use crate::error::report;
use crate::parser::ast::{
    collect_kind, ComponentDefine, Node, NodeKind, SlotDeclare, Span, Spanned,
};
use crate::renderer::resolve_params;
use crate::value::Value;

/// Errors that can occur while instantiating components
#[derive(Debug, Error)]
pub enum ComponentError {
    /// Use site names a component that has not been registered (yet)
    #[error("no such component: {name}")]
    UndefinedComponent { name: String, span: Span },

    /// Fill block names a slot the component does not declare
    #[error("unexpected slot '{slot}' for component '{component}'")]
    UnknownSlot {
        slot: String,
        component: String,
        span: Span,
    },
}

impl ComponentError {
    /// Source location of the offending tag
    pub fn span(&self) -> &Span {
        match self {
            ComponentError::UndefinedComponent { span, .. }
            | ComponentError::UnknownSlot { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let label = match self {
            ComponentError::UndefinedComponent { .. } => {
                "used before any matching definecomponent was rendered".to_string()
            }
            ComponentError::UnknownSlot { component, .. } => {
                format!("'{}' declares no slot with this name", component)
            }
        };
        report(source, filename, self.span(), &self.to_string(), &label)
    }
}

/// Slot declarations of one definition, keyed by slot name
#[derive(Debug, Clone, Default)]
pub struct SlotIndex<'t> {
    slots: HashMap<String, &'t SlotDeclare>,
}

impl<'t> SlotIndex<'t> {
    /// Scan a definition body for slot declarations.
    ///
    /// Slots nested in conditionals, loops, use blocks or other slots are
    /// found; slots inside a nested definition belong to that definition.
    /// A repeated name keeps the last declaration.
    pub fn collect(body: &'t [Spanned<Node>]) -> Self {
        let slots = collect_kind(body, NodeKind::SlotDeclare, Some(NodeKind::ComponentDefine))
            .into_iter()
            .filter_map(|node| match &node.node {
                Node::SlotDeclare(slot) => Some((slot.name.node.0.clone(), slot)),
                _ => None,
            })
            .collect();
        Self { slots }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// A registered component definition
#[derive(Debug, Clone)]
pub struct ComponentDefinition<'t> {
    /// Component name
    pub name: String,
    /// Body rendered on every use
    pub body: &'t [Spanned<Node>],
    /// Default parameters, already evaluated at definition time
    pub default_params: Vec<(String, Value)>,
    /// Declared slots
    pub slots: SlotIndex<'t>,
}

impl<'t> ComponentDefinition<'t> {
    /// Build a definition from its node, evaluating defaults against `context`
    pub fn from_node(node: &'t ComponentDefine, context: &Context<'t>) -> Self {
        Self {
            name: node.name.node.0.clone(),
            body: &node.body,
            default_params: resolve_params(&node.params, context),
            slots: SlotIndex::collect(&node.body),
        }
    }

    /// Check if this component declares a default for `name`
    pub fn has_parameter(&self, name: &str) -> bool {
        self.default_params.iter().any(|(key, _)| key == name)
    }

    /// Get the default value for a parameter
    pub fn get_default(&self, name: &str) -> Option<&Value> {
        self.default_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Registry for storing component definitions during one render
#[derive(Debug, Default)]
pub struct ComponentRegistry<'t> {
    components: HashMap<String, ComponentDefinition<'t>>,
}

impl<'t> ComponentRegistry<'t> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition; an existing one with the same name is replaced
    pub fn register(&mut self, definition: ComponentDefinition<'t>) {
        let name = definition.name.clone();
        if self.components.insert(name.clone(), definition).is_some() {
            tracing::debug!(component = %name, "redefined component");
        } else {
            tracing::debug!(component = %name, "registered component");
        }
    }

    /// Get a component by name, failing if it was never registered
    pub fn lookup(
        &self,
        name: &str,
        span: &Span,
    ) -> Result<&ComponentDefinition<'t>, ComponentError> {
        self.components
            .get(name)
            .ok_or_else(|| ComponentError::UndefinedComponent {
                name: name.to_string(),
                span: span.clone(),
            })
    }

    /// Check if a component exists
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
